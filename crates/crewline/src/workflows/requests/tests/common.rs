use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};

use crate::workflows::requests::domain::{
    Actor, ActorRole, ApprovalSettings, LeaveBalance, LeaveRequest, LeaveType, RequestId,
    RequestRecord, RequestStatus, Shift, ShiftRef, ShiftType, SwapRequest, SwapSnapshot, UserId,
};
use crate::workflows::requests::repository::{
    AuditError, AuditNote, AuditSink, BalanceStore, RequestStore, SettingsProvider, ShiftStore,
    StoreError,
};
use crate::workflows::requests::service::{
    LeaveSubmission, RequestLifecycleService, SwapSubmission,
};

pub(super) fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
}

pub(super) fn user(raw: &str) -> UserId {
    UserId(raw.to_string())
}

pub(super) fn annual() -> LeaveType {
    LeaveType::new("annual")
}

pub(super) fn agent(raw: &str) -> Actor {
    Actor {
        id: user(raw),
        role: ActorRole::Agent,
    }
}

pub(super) fn team_lead() -> Actor {
    Actor {
        id: user("lead-1"),
        role: ActorRole::TeamLead,
    }
}

pub(super) fn wfm() -> Actor {
    Actor {
        id: user("wfm-1"),
        role: ActorRole::WorkforceManager,
    }
}

pub(super) fn default_settings() -> ApprovalSettings {
    ApprovalSettings {
        auto_approve_on_tl: false,
        allow_leave_exceptions: true,
    }
}

pub(super) fn leave_submission(requester: &str) -> LeaveSubmission {
    LeaveSubmission {
        requester: user(requester),
        leave_type: annual(),
        // Mon 2024-01-08 through Fri 2024-01-12: five business days.
        start_date: date("2024-01-08"),
        end_date: date("2024-01-12"),
        notes: None,
    }
}

pub(super) fn swap_submission(requester: &str, target: &str, day: &str) -> SwapSubmission {
    SwapSubmission {
        requester: user(requester),
        target: user(target),
        requester_date: date(day),
        target_date: date(day),
    }
}

pub(super) fn leave_record(id: &str, requester: &str, status: RequestStatus) -> RequestRecord {
    RequestRecord::Leave(LeaveRequest {
        id: RequestId(id.to_string()),
        requester: user(requester),
        leave_type: annual(),
        start_date: date("2024-01-08"),
        end_date: date("2024-01-12"),
        status,
        tl_approved_at: None,
        wfm_approved_at: None,
        notes: None,
        created_at: Utc::now(),
    })
}

pub(super) fn swap_record(
    id: &str,
    requester: &str,
    target: &str,
    status: RequestStatus,
) -> RequestRecord {
    RequestRecord::Swap(SwapRequest {
        id: RequestId(id.to_string()),
        requester: user(requester),
        target: user(target),
        requester_shift: ShiftRef {
            user: user(requester),
            date: date("2024-01-08"),
        },
        target_shift: ShiftRef {
            user: user(target),
            date: date("2024-01-08"),
        },
        snapshot: SwapSnapshot {
            requester_shift: ShiftType::Morning,
            target_shift: ShiftType::Afternoon,
            requester_on_target_date: None,
            target_on_requester_date: None,
        },
        status,
        tl_approved_at: None,
        wfm_approved_at: None,
        created_at: Utc::now(),
    })
}

#[derive(Default)]
pub(super) struct MemoryRequests {
    pub(super) records: Mutex<HashMap<RequestId, RequestRecord>>,
}

impl RequestStore for MemoryRequests {
    fn insert(&self, record: RequestRecord) -> Result<RequestRecord, StoreError> {
        let mut guard = self.records.lock().expect("request mutex poisoned");
        if guard.contains_key(record.id()) {
            return Err(StoreError::Conflict);
        }
        guard.insert(record.id().clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &RequestId) -> Result<Option<RequestRecord>, StoreError> {
        let guard = self.records.lock().expect("request mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update_if_status(
        &self,
        expected: RequestStatus,
        record: RequestRecord,
    ) -> Result<(), StoreError> {
        // Compare and write under one lock; this is the primitive the
        // engine's correctness rests on.
        let mut guard = self.records.lock().expect("request mutex poisoned");
        let current = guard.get(record.id()).ok_or(StoreError::NotFound)?;
        let actual = current.status();
        if actual != expected {
            return Err(StoreError::StatusConflict { expected, actual });
        }
        guard.insert(record.id().clone(), record);
        Ok(())
    }

    fn leave_requests_overlapping(
        &self,
        user: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let guard = self.records.lock().expect("request mutex poisoned");
        Ok(guard
            .values()
            .filter_map(RequestRecord::as_leave)
            .filter(|leave| &leave.requester == user && leave.overlaps(start, end))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryShifts {
    pub(super) rows: Mutex<HashMap<(UserId, NaiveDate), Shift>>,
}

impl MemoryShifts {
    pub(super) fn seed(&self, user: UserId, date: NaiveDate, shift_type: ShiftType) {
        self.rows
            .lock()
            .expect("shift mutex poisoned")
            .insert(
                (user.clone(), date),
                Shift {
                    user,
                    date,
                    shift_type,
                    swapped_with: None,
                },
            );
    }
}

impl ShiftStore for MemoryShifts {
    fn shift(&self, user: &UserId, date: NaiveDate) -> Result<Option<Shift>, StoreError> {
        let rows = self.rows.lock().expect("shift mutex poisoned");
        Ok(rows.get(&(user.clone(), date)).cloned())
    }

    fn upsert(&self, shift: Shift) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().expect("shift mutex poisoned");
        rows.insert((shift.user.clone(), shift.date), shift);
        Ok(())
    }

    fn exchange(&self, writes: Vec<Shift>) -> Result<(), StoreError> {
        // One lock for the whole batch keeps this all-or-nothing.
        let mut rows = self.rows.lock().expect("shift mutex poisoned");
        for shift in writes {
            rows.insert((shift.user.clone(), shift.date), shift);
        }
        Ok(())
    }
}

/// Shift store whose batch write always fails, for settlement rollbacks.
#[derive(Default)]
pub(super) struct BrokenExchangeShifts {
    pub(super) inner: MemoryShifts,
}

impl ShiftStore for BrokenExchangeShifts {
    fn shift(&self, user: &UserId, date: NaiveDate) -> Result<Option<Shift>, StoreError> {
        self.inner.shift(user, date)
    }

    fn upsert(&self, shift: Shift) -> Result<(), StoreError> {
        self.inner.upsert(shift)
    }

    fn exchange(&self, _writes: Vec<Shift>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("exchange offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryBalances {
    pub(super) rows: Mutex<HashMap<(UserId, LeaveType), f32>>,
}

impl MemoryBalances {
    pub(super) fn seed(&self, user: UserId, leave_type: LeaveType, days: f32) {
        self.rows
            .lock()
            .expect("balance mutex poisoned")
            .insert((user, leave_type), days);
    }

    pub(super) fn days(&self, user: &UserId, leave_type: &LeaveType) -> Option<f32> {
        self.rows
            .lock()
            .expect("balance mutex poisoned")
            .get(&(user.clone(), leave_type.clone()))
            .copied()
    }
}

impl BalanceStore for MemoryBalances {
    fn balance(
        &self,
        user: &UserId,
        leave_type: &LeaveType,
    ) -> Result<Option<LeaveBalance>, StoreError> {
        let rows = self.rows.lock().expect("balance mutex poisoned");
        Ok(rows
            .get(&(user.clone(), leave_type.clone()))
            .map(|days| LeaveBalance {
                user: user.clone(),
                leave_type: leave_type.clone(),
                days: *days,
                updated_at: Utc::now(),
            }))
    }

    fn debit(&self, user: &UserId, leave_type: &LeaveType, days: f32) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().expect("balance mutex poisoned");
        let entry = rows
            .get_mut(&(user.clone(), leave_type.clone()))
            .ok_or(StoreError::NotFound)?;
        *entry -= days;
        Ok(())
    }
}

/// Balance store whose debit always fails, for approval rollbacks.
#[derive(Default)]
pub(super) struct BrokenDebitBalances {
    pub(super) inner: MemoryBalances,
}

impl BalanceStore for BrokenDebitBalances {
    fn balance(
        &self,
        user: &UserId,
        leave_type: &LeaveType,
    ) -> Result<Option<LeaveBalance>, StoreError> {
        self.inner.balance(user, leave_type)
    }

    fn debit(&self, _user: &UserId, _leave_type: &LeaveType, _days: f32) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("balances offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryAudit {
    notes: Mutex<Vec<AuditNote>>,
}

impl MemoryAudit {
    pub(super) fn notes(&self) -> Vec<AuditNote> {
        self.notes.lock().expect("audit mutex poisoned").clone()
    }
}

impl AuditSink for MemoryAudit {
    fn record(&self, note: AuditNote) -> Result<(), AuditError> {
        self.notes.lock().expect("audit mutex poisoned").push(note);
        Ok(())
    }
}

/// Audit sink that always fails; transitions must shrug it off.
pub(super) struct UnavailableAudit;

impl AuditSink for UnavailableAudit {
    fn record(&self, _note: AuditNote) -> Result<(), AuditError> {
        Err(AuditError::Unavailable("audit log offline".to_string()))
    }
}

/// Settings source pinned to a fixed value, standing in for configuration.
pub(super) struct FixedSettings(pub(super) ApprovalSettings);

impl SettingsProvider for FixedSettings {
    fn approval_settings(&self) -> ApprovalSettings {
        self.0
    }
}

pub(super) type MemoryService =
    RequestLifecycleService<MemoryRequests, MemoryShifts, MemoryBalances, MemoryAudit>;

pub(super) struct Harness {
    pub(super) service: Arc<MemoryService>,
    pub(super) requests: Arc<MemoryRequests>,
    pub(super) shifts: Arc<MemoryShifts>,
    pub(super) balances: Arc<MemoryBalances>,
    pub(super) audit: Arc<MemoryAudit>,
}

pub(super) fn build_harness() -> Harness {
    let requests = Arc::new(MemoryRequests::default());
    let shifts = Arc::new(MemoryShifts::default());
    let balances = Arc::new(MemoryBalances::default());
    let audit = Arc::new(MemoryAudit::default());
    let service = Arc::new(RequestLifecycleService::new(
        requests.clone(),
        shifts.clone(),
        balances.clone(),
        audit.clone(),
    ));
    Harness {
        service,
        requests,
        shifts,
        balances,
        audit,
    }
}
