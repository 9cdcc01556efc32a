use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use super::domain::{
    clamp_note, Actor, ApprovalSettings, LeaveRequest, LeaveType, RequestAction, RequestId,
    RequestRecord, RequestStatus, ShiftRef, SwapRequest, SwapSnapshot, UserId,
};
use super::exchange::{self, ExchangeError};
use super::repository::{
    AuditNote, AuditSink, BalanceStore, RequestStore, ShiftStore, StoreError,
};
use super::transitions::{TransitionEngine, TransitionError};
use super::validation::{business_days, LeaveValidator, ValidationError};

/// Inbound payload for a new leave request.
#[derive(Debug, Clone, Deserialize)]
pub struct LeaveSubmission {
    pub requester: UserId,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Inbound payload for a new swap request. The two slots are
/// (requester, requester_date) and (target, target_date).
#[derive(Debug, Clone, Deserialize)]
pub struct SwapSubmission {
    pub requester: UserId,
    pub target: UserId,
    pub requester_date: NaiveDate,
    pub target_date: NaiveDate,
}

/// Error raised by the lifecycle service.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("request status changed underneath this action (expected {expected:?}, found {actual:?})")]
    Concurrency {
        expected: RequestStatus,
        actual: RequestStatus,
    },
    #[error("shift exchange failed: {0}")]
    Exchange(#[from] ExchangeError),
    #[error("failed to debit the leave balance after approval: {0}")]
    Debit(StoreError),
    #[error("a swap needs two different people")]
    SelfSwap,
    #[error("no shift scheduled for {user} on {date}")]
    ShiftMissing { user: UserId, date: NaiveDate },
}

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> RequestId {
    let id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RequestId(format!("req-{id:06}"))
}

/// Service composing the validator, the state machine, the conditional
/// update discipline, the swap exchange, and the audit trail.
pub struct RequestLifecycleService<R, S, B, A> {
    requests: Arc<R>,
    shifts: Arc<S>,
    balances: Arc<B>,
    audit: Arc<A>,
    validator: LeaveValidator,
    engine: TransitionEngine,
}

impl<R, S, B, A> RequestLifecycleService<R, S, B, A>
where
    R: RequestStore + 'static,
    S: ShiftStore + 'static,
    B: BalanceStore + 'static,
    A: AuditSink + 'static,
{
    pub fn new(requests: Arc<R>, shifts: Arc<S>, balances: Arc<B>, audit: Arc<A>) -> Self {
        Self {
            requests,
            shifts,
            balances,
            audit,
            validator: LeaveValidator,
            engine: TransitionEngine,
        }
    }

    /// File a leave request. An insufficient balance does not reject the
    /// submission: the request is stored auto-denied so the requester can
    /// still ask for an exception. Every other validation failure bounces
    /// the submission.
    pub fn create_leave(
        &self,
        submission: LeaveSubmission,
    ) -> Result<RequestRecord, EngineError> {
        let balance = self
            .balances
            .balance(&submission.requester, &submission.leave_type)?;
        let existing = self.requests.leave_requests_overlapping(
            &submission.requester,
            submission.start_date,
            submission.end_date,
        )?;

        let outcome = self.validator.validate(
            &submission.leave_type,
            submission.start_date,
            submission.end_date,
            None,
            balance.as_ref(),
            &existing,
        );

        let (status, audit_message) = match outcome {
            Ok(assessment) => (
                RequestStatus::PendingTl,
                format!("filed for {} business day(s)", assessment.requested_days),
            ),
            Err(ValidationError::InsufficientBalance {
                requested,
                available,
            }) => (
                RequestStatus::Denied,
                format!("auto-denied: requested {requested} day(s), {available} available"),
            ),
            Err(err) => return Err(err.into()),
        };

        let now = Utc::now();
        let record = RequestRecord::Leave(LeaveRequest {
            id: next_request_id(),
            requester: submission.requester,
            leave_type: submission.leave_type,
            start_date: submission.start_date,
            end_date: submission.end_date,
            status,
            tl_approved_at: None,
            wfm_approved_at: None,
            notes: clamp_note(submission.notes),
            created_at: now,
        });

        let stored = self.requests.insert(record)?;
        self.audit_best_effort(AuditNote {
            request: stored.id().clone(),
            actor: stored.requester().clone(),
            from: None,
            to: status,
            message: audit_message,
            is_system: true,
            at: now,
        });
        Ok(stored)
    }

    /// File a swap request. The four-way assignment snapshot is captured
    /// here, from the live roster, and never rewritten afterwards.
    pub fn create_swap(&self, submission: SwapSubmission) -> Result<RequestRecord, EngineError> {
        if submission.requester == submission.target {
            return Err(EngineError::SelfSwap);
        }

        let requester_shift = self
            .shifts
            .shift(&submission.requester, submission.requester_date)?
            .ok_or_else(|| EngineError::ShiftMissing {
                user: submission.requester.clone(),
                date: submission.requester_date,
            })?;
        let target_shift = self
            .shifts
            .shift(&submission.target, submission.target_date)?
            .ok_or_else(|| EngineError::ShiftMissing {
                user: submission.target.clone(),
                date: submission.target_date,
            })?;

        let requester_on_target_date = self
            .shifts
            .shift(&submission.requester, submission.target_date)?
            .map(|shift| shift.shift_type);
        let target_on_requester_date = self
            .shifts
            .shift(&submission.target, submission.requester_date)?
            .map(|shift| shift.shift_type);

        let now = Utc::now();
        let record = RequestRecord::Swap(SwapRequest {
            id: next_request_id(),
            requester: submission.requester.clone(),
            target: submission.target.clone(),
            requester_shift: ShiftRef {
                user: submission.requester,
                date: submission.requester_date,
            },
            target_shift: ShiftRef {
                user: submission.target,
                date: submission.target_date,
            },
            snapshot: SwapSnapshot {
                requester_shift: requester_shift.shift_type,
                target_shift: target_shift.shift_type,
                requester_on_target_date,
                target_on_requester_date,
            },
            status: RequestStatus::PendingAcceptance,
            tl_approved_at: None,
            wfm_approved_at: None,
            created_at: now,
        });

        let stored = self.requests.insert(record)?;
        self.audit_best_effort(AuditNote {
            request: stored.id().clone(),
            actor: stored.requester().clone(),
            from: None,
            to: RequestStatus::PendingAcceptance,
            message: "swap filed, waiting on counterpart".to_string(),
            is_system: true,
            at: now,
        });
        Ok(stored)
    }

    /// Drive one transition under optimistic concurrency. `expected` is the
    /// status the caller last saw; if the record has moved on since, the
    /// call fails with `Concurrency` and nothing is written. At most one
    /// caller wins any given logical state.
    pub fn transition(
        &self,
        id: &RequestId,
        expected: RequestStatus,
        action: RequestAction,
        actor: &Actor,
        settings: ApprovalSettings,
    ) -> Result<RequestRecord, EngineError> {
        let record = self.requests.fetch(id)?.ok_or(StoreError::NotFound)?;

        // Fast-path check; the store's conditional update below is what
        // actually closes the race.
        let actual = record.status();
        if actual != expected {
            return Err(EngineError::Concurrency { expected, actual });
        }

        let transition = self.engine.evaluate(&record, action, actor, settings)?;
        let now = Utc::now();
        let mut updated = record.clone();
        transition.apply(&mut updated, now);

        match self.requests.update_if_status(expected, updated.clone()) {
            Ok(()) => {}
            Err(StoreError::StatusConflict { expected, actual }) => {
                return Err(EngineError::Concurrency { expected, actual });
            }
            Err(other) => return Err(other.into()),
        }

        if transition.to == RequestStatus::Approved {
            if let Err(err) = self.settle_approval(&updated) {
                self.revert_commit(&record, &updated);
                return Err(err);
            }
        }

        self.audit_best_effort(AuditNote {
            request: updated.id().clone(),
            actor: actor.id.clone(),
            from: Some(transition.from),
            to: transition.to,
            message: format!(
                "{} moved {} -> {}",
                action.label(),
                transition.from.label(),
                transition.to.label()
            ),
            is_system: true,
            at: now,
        });

        Ok(updated)
    }

    pub fn get(&self, id: &RequestId) -> Result<RequestRecord, EngineError> {
        let record = self.requests.fetch(id)?.ok_or(StoreError::NotFound)?;
        Ok(record)
    }

    /// Side effects owed once a request lands on approved: the leave
    /// balance decrement, or the shift exchange. Runs after the conditional
    /// update, so only the caller that won the race gets here.
    fn settle_approval(&self, updated: &RequestRecord) -> Result<(), EngineError> {
        match updated {
            RequestRecord::Leave(leave) => {
                let days = business_days(leave.start_date, leave.end_date);
                self.balances
                    .debit(&leave.requester, &leave.leave_type, days as f32)
                    .map_err(EngineError::Debit)
            }
            RequestRecord::Swap(swap) => {
                let report = exchange::execute(self.shifts.as_ref(), swap)?;
                if report.already_applied {
                    tracing::warn!(
                        request = %swap.id,
                        "exchange already applied, treating as replay"
                    );
                }
                Ok(())
            }
        }
    }

    /// Compensating conditional update after a failed settlement: put the
    /// pre-transition record back, keyed on the status we just committed so
    /// we never clobber someone else's later write.
    fn revert_commit(&self, before: &RequestRecord, updated: &RequestRecord) {
        if let Err(err) = self
            .requests
            .update_if_status(updated.status(), before.clone())
        {
            tracing::error!(
                request = %before.id(),
                error = %err,
                "failed to roll back an approval after settlement failure; manual reconciliation needed"
            );
        }
    }

    fn audit_best_effort(&self, note: AuditNote) {
        if let Err(err) = self.audit.record(note) {
            tracing::warn!(error = %err, "audit note dropped");
        }
    }
}
