use crate::infra::{
    InMemoryAuditLog, InMemoryBalanceStore, InMemoryRequestStore, InMemoryShiftStore,
};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use crewline::error::AppError;
use crewline::workflows::requests::{
    Actor, ActorRole, ApprovalSettings, EngineError, LeaveSubmission, LeaveType, RequestAction,
    RequestLifecycleService, RequestRecord, RequestStatus, ShiftStore, ShiftType, SwapSubmission,
    UserId,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Roster day for the demo swap (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) day: Option<NaiveDate>,
    /// Collapse team-lead approvals straight into final approval.
    #[arg(long)]
    pub(crate) auto_approve: bool,
}

fn user(raw: &str) -> UserId {
    UserId(raw.to_string())
}

fn actor(raw: &str, role: ActorRole) -> Actor {
    Actor {
        id: user(raw),
        role,
    }
}

fn print_view(stage: &str, record: &RequestRecord) {
    let view = record.status_view();
    println!(
        "{stage:<20} {} [{}] -> {}",
        view.id.0,
        view.kind.label(),
        view.status
    );
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let day = args.day.unwrap_or_else(|| Local::now().date_naive());
    let settings = ApprovalSettings {
        auto_approve_on_tl: args.auto_approve,
        allow_leave_exceptions: true,
    };

    let requests = Arc::new(InMemoryRequestStore::default());
    let shifts = Arc::new(InMemoryShiftStore::default());
    let balances = Arc::new(InMemoryBalanceStore::default());
    let audit = Arc::new(InMemoryAuditLog::default());

    balances.seed(user("kara"), LeaveType::new("annual"), 10.0);
    shifts.seed(user("kara"), day, ShiftType::Morning);
    shifts.seed(user("noel"), day, ShiftType::Afternoon);

    let service =
        RequestLifecycleService::new(requests, shifts.clone(), balances, audit.clone());

    println!("== leave request ==");
    let leave = service.create_leave(LeaveSubmission {
        requester: user("kara"),
        leave_type: LeaveType::new("annual"),
        start_date: day + Duration::days(7),
        end_date: day + Duration::days(11),
        notes: Some("demo leave".to_string()),
    })?;
    print_view("filed", &leave);

    let mut status = leave.status();
    if status == RequestStatus::PendingTl {
        let after_tl = service.transition(
            leave.id(),
            RequestStatus::PendingTl,
            RequestAction::Approve,
            &actor("lead-1", ActorRole::TeamLead),
            settings,
        )?;
        print_view("team lead approved", &after_tl);
        status = after_tl.status();
    }
    if status == RequestStatus::PendingWfm {
        let approved = service.transition(
            leave.id(),
            RequestStatus::PendingWfm,
            RequestAction::Approve,
            &actor("wfm-1", ActorRole::WorkforceManager),
            settings,
        )?;
        print_view("manager approved", &approved);
    }

    println!("== shift swap ==");
    let swap = service.create_swap(SwapSubmission {
        requester: user("kara"),
        target: user("noel"),
        requester_date: day,
        target_date: day,
    })?;
    print_view("filed", &swap);

    let chain = [
        (
            RequestStatus::PendingAcceptance,
            RequestAction::Accept,
            actor("noel", ActorRole::Agent),
            "target accepted",
        ),
        (
            RequestStatus::PendingTl,
            RequestAction::Approve,
            actor("lead-1", ActorRole::TeamLead),
            "team lead approved",
        ),
        (
            RequestStatus::PendingWfm,
            RequestAction::Approve,
            actor("wfm-1", ActorRole::WorkforceManager),
            "manager approved",
        ),
    ];
    for (expected, action, approver, stage) in chain {
        if service.get(swap.id())?.status() != expected {
            continue;
        }
        let next = service.transition(swap.id(), expected, action, &approver, settings)?;
        print_view(stage, &next);
    }

    println!("== roster after execution ==");
    for who in ["kara", "noel"] {
        if let Some(shift) = shifts.shift(&user(who), day).map_err(EngineError::from)? {
            let partner = shift
                .swapped_with
                .map(|counterpart| format!(" (swapped with {counterpart})"))
                .unwrap_or_default();
            println!(
                "{who:<6} {} {}{partner}",
                shift.date,
                shift.shift_type.label()
            );
        }
    }

    println!("== audit trail ==");
    for note in audit.notes() {
        println!(
            "{} {} {}",
            note.at.format("%H:%M:%S"),
            note.request,
            note.message
        );
    }

    Ok(())
}
