use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ApprovalSettings, LeaveBalance, LeaveRequest, LeaveType, RequestId, RequestKind,
    RequestRecord, RequestStatus, Shift, UserId,
};

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("status changed underneath the update (expected {expected:?}, found {actual:?})")]
    StatusConflict {
        expected: RequestStatus,
        actual: RequestStatus,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence contract for request records.
///
/// `update_if_status` is the engine's one atomic primitive: a conditional
/// update keyed on (id, current status). Implementations must perform the
/// compare and the write as a single operation, not a read followed by a
/// write, and answer a mismatch with `StoreError::StatusConflict`.
pub trait RequestStore: Send + Sync {
    fn insert(&self, record: RequestRecord) -> Result<RequestRecord, StoreError>;
    fn fetch(&self, id: &RequestId) -> Result<Option<RequestRecord>, StoreError>;
    fn update_if_status(
        &self,
        expected: RequestStatus,
        record: RequestRecord,
    ) -> Result<(), StoreError>;
    /// The requester's leave requests whose date range intersects
    /// [start, end], any status; the validator filters further.
    fn leave_requests_overlapping(
        &self,
        user: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LeaveRequest>, StoreError>;
}

/// Read access to leave balances plus the approval-time decrement. All
/// other balance mutation (accrual, manual adjustment) happens outside the
/// engine and must be serialized per (user, leave type) by the store.
pub trait BalanceStore: Send + Sync {
    fn balance(
        &self,
        user: &UserId,
        leave_type: &LeaveType,
    ) -> Result<Option<LeaveBalance>, StoreError>;
    fn debit(&self, user: &UserId, leave_type: &LeaveType, days: f32) -> Result<(), StoreError>;
}

/// Roster slot storage. `exchange` applies a batch of writes all-or-nothing;
/// a failure must leave every slot untouched. `upsert` carries the bulk
/// import's merge semantics: it replaces one (user, date) slot and nothing
/// else.
pub trait ShiftStore: Send + Sync {
    fn shift(&self, user: &UserId, date: NaiveDate) -> Result<Option<Shift>, StoreError>;
    fn upsert(&self, shift: Shift) -> Result<(), StoreError>;
    fn exchange(&self, writes: Vec<Shift>) -> Result<(), StoreError>;
}

/// One immutable, system-authored note per transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditNote {
    pub request: RequestId,
    pub actor: UserId,
    pub from: Option<RequestStatus>,
    pub to: RequestStatus,
    pub message: String,
    pub is_system: bool,
    pub at: DateTime<Utc>,
}

/// Audit dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Trait describing the audit trail consumer. Writes are best-effort: the
/// service logs a failure and moves on, it never rolls a transition back.
pub trait AuditSink: Send + Sync {
    fn record(&self, note: AuditNote) -> Result<(), AuditError>;
}

/// Resolves the approval flags for one decision. The edge implements this
/// against configuration; the engine never caches the values.
pub trait SettingsProvider: Send + Sync {
    fn approval_settings(&self) -> ApprovalSettings;
}

/// Sanitized representation of a request's exposed status.
#[derive(Debug, Clone, Serialize)]
pub struct RequestStatusView {
    pub id: RequestId,
    pub kind: RequestKind,
    pub status: &'static str,
    pub tl_approved_at: Option<DateTime<Utc>>,
    pub wfm_approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RequestRecord {
    pub fn status_view(&self) -> RequestStatusView {
        RequestStatusView {
            id: self.id().clone(),
            kind: self.kind(),
            status: self.status().label(),
            tl_approved_at: self.tl_approved_at(),
            wfm_approved_at: self.wfm_approved_at(),
            created_at: self.created_at(),
        }
    }
}
