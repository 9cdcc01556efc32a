use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for people appearing anywhere in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for leave and swap requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Roles recognized by the approval chain. The identity provider resolves
/// these; the engine only evaluates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Agent,
    TeamLead,
    WorkforceManager,
}

impl ActorRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::TeamLead => "team_lead",
            Self::WorkforceManager => "workforce_manager",
        }
    }
}

/// The acting user behind a lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: ActorRole,
}

/// Leave categories are an open, configurable set, so they stay a normalized
/// string rather than a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaveType(pub String);

impl LeaveType {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_lowercase())
    }
}

impl fmt::Display for LeaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Workflow status shared by leave and swap requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    PendingAcceptance,
    PendingTl,
    PendingWfm,
    Approved,
    Rejected,
    Denied,
}

impl RequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::PendingAcceptance => "pending_acceptance",
            Self::PendingTl => "pending_tl",
            Self::PendingWfm => "pending_wfm",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Denied => "denied",
        }
    }

    /// Approved and rejected requests never transition again. A denied
    /// request may still re-enter the chain through an exception request.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Statuses that block another leave request over the same dates.
    pub const fn holds_dates(self) -> bool {
        matches!(self, Self::Approved | Self::PendingTl | Self::PendingWfm)
    }
}

/// Actions a caller can take against an existing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestAction {
    Accept,
    Approve,
    Reject,
    Cancel,
    AskException,
}

impl RequestAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Cancel => "cancel",
            Self::AskException => "ask_exception",
        }
    }
}

/// Notes are bounded so a request row stays a request row, not a document.
pub const MAX_NOTE_LEN: usize = 500;

pub(crate) fn clamp_note(note: Option<String>) -> Option<String> {
    note.map(|text| {
        if text.len() > MAX_NOTE_LEN {
            let mut cut = MAX_NOTE_LEN;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text[..cut].to_string()
        } else {
            text
        }
    })
}

/// A paid-leave request moving through the two-tier approval chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: RequestId,
    pub requester: UserId,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: RequestStatus,
    pub tl_approved_at: Option<DateTime<Utc>>,
    pub wfm_approved_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// Inclusive interval intersection against another date range.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }
}

/// Shift categories on the roster grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftType {
    Morning,
    Afternoon,
    Between,
    DayOff,
}

impl ShiftType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Between => "between",
            Self::DayOff => "day_off",
        }
    }

    /// Parse a roster token as it appears in bulk imports.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "morning" => Some(Self::Morning),
            "afternoon" => Some(Self::Afternoon),
            "between" => Some(Self::Between),
            "day_off" | "dayoff" | "off" => Some(Self::DayOff),
            _ => None,
        }
    }
}

/// Key of a roster slot; (user, date) is unique in the shift store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftRef {
    pub user: UserId,
    pub date: NaiveDate,
}

/// One roster slot. `swapped_with` is a display-only back-reference to the
/// counterpart of an executed swap; it carries no ownership semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    pub user: UserId,
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    pub swapped_with: Option<UserId>,
}

/// The four assignments captured when a swap is filed. Written once and
/// never re-derived from live rows; the exchange keys off these values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapSnapshot {
    pub requester_shift: ShiftType,
    pub target_shift: ShiftType,
    pub requester_on_target_date: Option<ShiftType>,
    pub target_on_requester_date: Option<ShiftType>,
}

/// A shift-swap request between two roster slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub id: RequestId,
    pub requester: UserId,
    pub target: UserId,
    pub requester_shift: ShiftRef,
    pub target_shift: ShiftRef,
    pub snapshot: SwapSnapshot,
    pub status: RequestStatus,
    pub tl_approved_at: Option<DateTime<Utc>>,
    pub wfm_approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Discriminant for the two request kinds sharing the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Leave,
    Swap,
}

impl RequestKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Leave => "leave",
            Self::Swap => "swap",
        }
    }
}

/// The persisted record: one sum type so both request kinds run through the
/// same store, state machine, and concurrency control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestRecord {
    Leave(LeaveRequest),
    Swap(SwapRequest),
}

impl RequestRecord {
    pub fn id(&self) -> &RequestId {
        match self {
            Self::Leave(leave) => &leave.id,
            Self::Swap(swap) => &swap.id,
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Leave(_) => RequestKind::Leave,
            Self::Swap(_) => RequestKind::Swap,
        }
    }

    pub fn status(&self) -> RequestStatus {
        match self {
            Self::Leave(leave) => leave.status,
            Self::Swap(swap) => swap.status,
        }
    }

    pub fn requester(&self) -> &UserId {
        match self {
            Self::Leave(leave) => &leave.requester,
            Self::Swap(swap) => &swap.requester,
        }
    }

    /// The swap target, where the record has one.
    pub fn swap_target(&self) -> Option<&UserId> {
        match self {
            Self::Leave(_) => None,
            Self::Swap(swap) => Some(&swap.target),
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Leave(leave) => leave.created_at,
            Self::Swap(swap) => swap.created_at,
        }
    }

    pub fn tl_approved_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Leave(leave) => leave.tl_approved_at,
            Self::Swap(swap) => swap.tl_approved_at,
        }
    }

    pub fn wfm_approved_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Leave(leave) => leave.wfm_approved_at,
            Self::Swap(swap) => swap.wfm_approved_at,
        }
    }

    pub(crate) fn set_status(&mut self, status: RequestStatus) {
        match self {
            Self::Leave(leave) => leave.status = status,
            Self::Swap(swap) => swap.status = status,
        }
    }

    pub(crate) fn set_tl_approved_at(&mut self, at: DateTime<Utc>) {
        match self {
            Self::Leave(leave) => leave.tl_approved_at = Some(at),
            Self::Swap(swap) => swap.tl_approved_at = Some(at),
        }
    }

    pub(crate) fn set_wfm_approved_at(&mut self, at: DateTime<Utc>) {
        match self {
            Self::Leave(leave) => leave.wfm_approved_at = Some(at),
            Self::Swap(swap) => swap.wfm_approved_at = Some(at),
        }
    }

    pub fn as_leave(&self) -> Option<&LeaveRequest> {
        match self {
            Self::Leave(leave) => Some(leave),
            Self::Swap(_) => None,
        }
    }

    pub fn as_swap(&self) -> Option<&SwapRequest> {
        match self {
            Self::Leave(_) => None,
            Self::Swap(swap) => Some(swap),
        }
    }
}

/// Remaining leave allowance for one (user, leave type) pair. Fractional
/// days are allowed (half-day accruals exist in the wild).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveBalance {
    pub user: UserId,
    pub leave_type: LeaveType,
    pub days: f32,
    pub updated_at: DateTime<Utc>,
}

/// Approval-chain flags. Loaded per decision by the caller and handed in,
/// never cached inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApprovalSettings {
    pub auto_approve_on_tl: bool,
    pub allow_leave_exceptions: bool,
}
