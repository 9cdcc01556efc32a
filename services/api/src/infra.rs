use chrono::{NaiveDate, Utc};
use crewline::workflows::requests::{
    ApprovalSettings, AuditError, AuditNote, AuditSink, BalanceStore, LeaveBalance, LeaveRequest,
    LeaveType, RequestId, RequestRecord, RequestStatus, RequestStore, SettingsProvider, Shift,
    ShiftStore, ShiftType, StoreError, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryRequestStore {
    records: Arc<Mutex<HashMap<RequestId, RequestRecord>>>,
}

impl RequestStore for InMemoryRequestStore {
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
        // The compare and the write share one lock acquisition; callers get
        // at most one winner per logical state.
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryShiftStore {
    rows: Arc<Mutex<HashMap<(UserId, NaiveDate), Shift>>>,
}

impl InMemoryShiftStore {
    pub(crate) fn seed(&self, user: UserId, date: NaiveDate, shift_type: ShiftType) {
        self.rows.lock().expect("shift mutex poisoned").insert(
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

impl ShiftStore for InMemoryShiftStore {
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
        let mut rows = self.rows.lock().expect("shift mutex poisoned");
        for shift in writes {
            rows.insert((shift.user.clone(), shift.date), shift);
        }
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryBalanceStore {
    rows: Arc<Mutex<HashMap<(UserId, LeaveType), f32>>>,
}

impl InMemoryBalanceStore {
    pub(crate) fn seed(&self, user: UserId, leave_type: LeaveType, days: f32) {
        self.rows
            .lock()
            .expect("balance mutex poisoned")
            .insert((user, leave_type), days);
    }
}

impl BalanceStore for InMemoryBalanceStore {
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

/// Keeps the trail in memory and mirrors it onto the log stream.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAuditLog {
    notes: Arc<Mutex<Vec<AuditNote>>>,
}

impl InMemoryAuditLog {
    pub(crate) fn notes(&self) -> Vec<AuditNote> {
        self.notes.lock().expect("audit mutex poisoned").clone()
    }
}

impl AuditSink for InMemoryAuditLog {
    fn record(&self, note: AuditNote) -> Result<(), AuditError> {
        tracing::info!(
            request = %note.request,
            actor = %note.actor,
            to = note.to.label(),
            "{}",
            note.message
        );
        self.notes.lock().expect("audit mutex poisoned").push(note);
        Ok(())
    }
}

/// Settings provider backed by the loaded configuration.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConfigSettings(pub(crate) ApprovalSettings);

impl SettingsProvider for ConfigSettings {
    fn approval_settings(&self) -> ApprovalSettings {
        self.0
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
