use std::sync::Arc;

use super::common::*;
use crate::workflows::requests::domain::{RequestAction, RequestStatus, ShiftType};
use crate::workflows::requests::repository::{RequestStore, ShiftStore, StoreError};
use crate::workflows::requests::service::{EngineError, RequestLifecycleService};
use crate::workflows::requests::validation::ValidationError;

#[test]
fn create_leave_enters_the_chain_pending_tl() {
    let harness = build_harness();
    harness.balances.seed(user("kara"), annual(), 10.0);

    let record = harness
        .service
        .create_leave(leave_submission("kara"))
        .expect("submission accepted");

    assert_eq!(record.status(), RequestStatus::PendingTl);
    let stored = harness
        .requests
        .fetch(record.id())
        .expect("fetch")
        .expect("record present");
    assert_eq!(stored.status(), RequestStatus::PendingTl);

    let notes = harness.audit.notes();
    assert_eq!(notes.len(), 1);
    assert!(notes[0].is_system);
    assert_eq!(notes[0].to, RequestStatus::PendingTl);
}

#[test]
fn insufficient_balance_stores_an_auto_denied_request() {
    let harness = build_harness();
    harness.balances.seed(user("kara"), annual(), 3.0);

    let record = harness
        .service
        .create_leave(leave_submission("kara"))
        .expect("auto-denial is not a submission failure");

    assert_eq!(record.status(), RequestStatus::Denied);
    let notes = harness.audit.notes();
    assert!(notes[0].message.contains("auto-denied"));
    // The balance is only consumed at approval, never at filing.
    assert_eq!(harness.balances.days(&user("kara"), &annual()), Some(3.0));
}

#[test]
fn unknown_leave_type_bounces_the_submission() {
    let harness = build_harness();
    match harness.service.create_leave(leave_submission("kara")) {
        Err(EngineError::Validation(ValidationError::UnknownLeaveType(_))) => {}
        other => panic!("expected unknown leave type, got {other:?}"),
    }
}

#[test]
fn overlapping_request_bounces_the_submission() {
    let harness = build_harness();
    harness.balances.seed(user("kara"), annual(), 20.0);
    harness
        .service
        .create_leave(leave_submission("kara"))
        .expect("first submission accepted");

    match harness.service.create_leave(leave_submission("kara")) {
        Err(EngineError::Validation(ValidationError::OverlappingRequest { .. })) => {}
        other => panic!("expected overlap rejection, got {other:?}"),
    }
}

#[test]
fn full_leave_approval_chain_debits_the_balance() {
    let harness = build_harness();
    harness.balances.seed(user("kara"), annual(), 10.0);

    let record = harness
        .service
        .create_leave(leave_submission("kara"))
        .expect("submission accepted");
    let id = record.id().clone();

    let after_tl = harness
        .service
        .transition(
            &id,
            RequestStatus::PendingTl,
            RequestAction::Approve,
            &team_lead(),
            default_settings(),
        )
        .expect("team lead approves");
    assert_eq!(after_tl.status(), RequestStatus::PendingWfm);
    assert!(after_tl.tl_approved_at().is_some());
    assert!(after_tl.wfm_approved_at().is_none());
    assert_eq!(harness.balances.days(&user("kara"), &annual()), Some(10.0));

    let approved = harness
        .service
        .transition(
            &id,
            RequestStatus::PendingWfm,
            RequestAction::Approve,
            &wfm(),
            default_settings(),
        )
        .expect("manager approves");
    assert_eq!(approved.status(), RequestStatus::Approved);
    assert!(approved.wfm_approved_at().is_some());
    assert_eq!(harness.balances.days(&user("kara"), &annual()), Some(5.0));

    // created + two transitions.
    assert_eq!(harness.audit.notes().len(), 3);
}

#[test]
fn failed_debit_rolls_the_approval_back() {
    let requests = Arc::new(MemoryRequests::default());
    let shifts = Arc::new(MemoryShifts::default());
    let balances = Arc::new(BrokenDebitBalances::default());
    let audit = Arc::new(MemoryAudit::default());
    balances.inner.seed(user("kara"), annual(), 10.0);
    let service = RequestLifecycleService::new(
        requests.clone(),
        shifts,
        balances,
        audit,
    );

    let record = service
        .create_leave(leave_submission("kara"))
        .expect("submission accepted");
    let id = record.id().clone();
    service
        .transition(
            &id,
            RequestStatus::PendingTl,
            RequestAction::Approve,
            &team_lead(),
            default_settings(),
        )
        .expect("team lead approves");

    match service.transition(
        &id,
        RequestStatus::PendingWfm,
        RequestAction::Approve,
        &wfm(),
        default_settings(),
    ) {
        Err(EngineError::Debit(_)) => {}
        other => panic!("expected debit failure, got {other:?}"),
    }

    let stored = requests.fetch(&id).expect("fetch").expect("record present");
    assert_eq!(
        stored.status(),
        RequestStatus::PendingWfm,
        "failed settlement must not leave the request approved"
    );
}

#[test]
fn denied_leave_can_ask_for_an_exception() {
    let harness = build_harness();
    harness.balances.seed(user("kara"), annual(), 1.0);

    let record = harness
        .service
        .create_leave(leave_submission("kara"))
        .expect("stored auto-denied");
    assert_eq!(record.status(), RequestStatus::Denied);

    let reentered = harness
        .service
        .transition(
            record.id(),
            RequestStatus::Denied,
            RequestAction::AskException,
            &agent("kara"),
            default_settings(),
        )
        .expect("exception re-enters the chain");
    assert_eq!(reentered.status(), RequestStatus::PendingTl);
}

#[test]
fn create_swap_captures_the_snapshot() {
    let harness = build_harness();
    harness
        .shifts
        .seed(user("kara"), date("2024-01-08"), ShiftType::Morning);
    harness
        .shifts
        .seed(user("noel"), date("2024-01-08"), ShiftType::Afternoon);

    let record = harness
        .service
        .create_swap(swap_submission("kara", "noel", "2024-01-08"))
        .expect("swap filed");

    assert_eq!(record.status(), RequestStatus::PendingAcceptance);
    let swap = record.as_swap().expect("swap record");
    assert_eq!(swap.snapshot.requester_shift, ShiftType::Morning);
    assert_eq!(swap.snapshot.target_shift, ShiftType::Afternoon);
    // Same-day swap: the cross-date lookups land on the primary slots.
    assert_eq!(
        swap.snapshot.requester_on_target_date,
        Some(ShiftType::Morning)
    );
    assert_eq!(
        swap.snapshot.target_on_requester_date,
        Some(ShiftType::Afternoon)
    );
}

#[test]
fn swap_with_self_is_rejected() {
    let harness = build_harness();
    match harness
        .service
        .create_swap(swap_submission("kara", "kara", "2024-01-08"))
    {
        Err(EngineError::SelfSwap) => {}
        other => panic!("expected self-swap rejection, got {other:?}"),
    }
}

#[test]
fn swap_requires_both_shifts_to_exist() {
    let harness = build_harness();
    harness
        .shifts
        .seed(user("kara"), date("2024-01-08"), ShiftType::Morning);

    match harness
        .service
        .create_swap(swap_submission("kara", "noel", "2024-01-08"))
    {
        Err(EngineError::ShiftMissing { user: missing, .. }) => {
            assert_eq!(missing, user("noel"));
        }
        other => panic!("expected missing shift, got {other:?}"),
    }
}

#[test]
fn approved_swap_executes_the_exchange() {
    let harness = build_harness();
    harness
        .shifts
        .seed(user("kara"), date("2024-01-08"), ShiftType::Morning);
    harness
        .shifts
        .seed(user("noel"), date("2024-01-08"), ShiftType::Afternoon);

    let record = harness
        .service
        .create_swap(swap_submission("kara", "noel", "2024-01-08"))
        .expect("swap filed");
    let id = record.id().clone();

    harness
        .service
        .transition(
            &id,
            RequestStatus::PendingAcceptance,
            RequestAction::Accept,
            &agent("noel"),
            default_settings(),
        )
        .expect("target accepts");
    harness
        .service
        .transition(
            &id,
            RequestStatus::PendingTl,
            RequestAction::Approve,
            &team_lead(),
            default_settings(),
        )
        .expect("team lead approves");
    let approved = harness
        .service
        .transition(
            &id,
            RequestStatus::PendingWfm,
            RequestAction::Approve,
            &wfm(),
            default_settings(),
        )
        .expect("manager approves");
    assert_eq!(approved.status(), RequestStatus::Approved);

    let kara_shift = harness
        .shifts
        .shift(&user("kara"), date("2024-01-08"))
        .expect("fetch")
        .expect("row present");
    let noel_shift = harness
        .shifts
        .shift(&user("noel"), date("2024-01-08"))
        .expect("fetch")
        .expect("row present");
    assert_eq!(kara_shift.shift_type, ShiftType::Afternoon);
    assert_eq!(noel_shift.shift_type, ShiftType::Morning);
    assert_eq!(kara_shift.swapped_with, Some(user("noel")));
    assert_eq!(noel_shift.swapped_with, Some(user("kara")));
}

#[test]
fn failed_exchange_rolls_the_approval_back() {
    let requests = Arc::new(MemoryRequests::default());
    let shifts = Arc::new(BrokenExchangeShifts::default());
    let balances = Arc::new(MemoryBalances::default());
    let audit = Arc::new(MemoryAudit::default());
    shifts
        .inner
        .seed(user("kara"), date("2024-01-08"), ShiftType::Morning);
    shifts
        .inner
        .seed(user("noel"), date("2024-01-08"), ShiftType::Afternoon);
    let service = RequestLifecycleService::new(requests.clone(), shifts.clone(), balances, audit);

    let record = service
        .create_swap(swap_submission("kara", "noel", "2024-01-08"))
        .expect("swap filed");
    let id = record.id().clone();
    service
        .transition(
            &id,
            RequestStatus::PendingAcceptance,
            RequestAction::Accept,
            &agent("noel"),
            default_settings(),
        )
        .expect("target accepts");
    service
        .transition(
            &id,
            RequestStatus::PendingTl,
            RequestAction::Approve,
            &team_lead(),
            default_settings(),
        )
        .expect("team lead approves");

    match service.transition(
        &id,
        RequestStatus::PendingWfm,
        RequestAction::Approve,
        &wfm(),
        default_settings(),
    ) {
        Err(EngineError::Exchange(_)) => {}
        other => panic!("expected exchange failure, got {other:?}"),
    }

    let stored = requests.fetch(&id).expect("fetch").expect("record present");
    assert_eq!(stored.status(), RequestStatus::PendingWfm);
    // No partial shift writes either.
    let kara_shift = shifts
        .shift(&user("kara"), date("2024-01-08"))
        .expect("fetch")
        .expect("row present");
    assert_eq!(kara_shift.shift_type, ShiftType::Morning);
}

#[test]
fn audit_outage_never_blocks_a_transition() {
    let requests = Arc::new(MemoryRequests::default());
    let shifts = Arc::new(MemoryShifts::default());
    let balances = Arc::new(MemoryBalances::default());
    balances.seed(user("kara"), annual(), 10.0);
    let service = RequestLifecycleService::new(
        requests,
        shifts,
        balances,
        Arc::new(UnavailableAudit),
    );

    let record = service
        .create_leave(leave_submission("kara"))
        .expect("audit outage does not block filing");
    let after = service
        .transition(
            record.id(),
            RequestStatus::PendingTl,
            RequestAction::Approve,
            &team_lead(),
            default_settings(),
        )
        .expect("audit outage does not block the transition");
    assert_eq!(after.status(), RequestStatus::PendingWfm);
}

#[test]
fn get_propagates_not_found() {
    let harness = build_harness();
    match harness
        .service
        .get(&crate::workflows::requests::domain::RequestId("missing".to_string()))
    {
        Err(EngineError::Store(StoreError::NotFound)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}
