//! Request lifecycle engine: leave and swap intake, the shared approval
//! state machine, optimistic concurrency over status transitions, swap
//! execution, and the audit trail.

pub mod domain;
pub mod exchange;
pub mod repository;
pub mod router;
pub mod service;
pub(crate) mod transitions;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    Actor, ActorRole, ApprovalSettings, LeaveBalance, LeaveRequest, LeaveType, RequestAction,
    RequestId, RequestKind, RequestRecord, RequestStatus, Shift, ShiftRef, ShiftType,
    SwapRequest, SwapSnapshot, UserId,
};
pub use exchange::{ExchangeError, ExchangeReport};
pub use repository::{
    AuditError, AuditNote, AuditSink, BalanceStore, RequestStatusView, RequestStore,
    SettingsProvider, ShiftStore, StoreError,
};
pub use router::{request_router, TransitionBody};
pub use service::{EngineError, LeaveSubmission, RequestLifecycleService, SwapSubmission};
pub use transitions::{Transition, TransitionEngine, TransitionError};
pub use validation::{business_days, LeaveAssessment, LeaveValidator, ValidationError};
