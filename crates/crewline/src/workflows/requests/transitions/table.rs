use super::super::domain::{ActorRole, RequestAction, RequestKind, RequestStatus};

/// Who, beyond the role check, may fire a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ActorGuard {
    Any,
    RequesterOnly,
    TargetOnly,
}

/// One row of the shared transition table. `to` is the base target; the
/// engine upgrades a team-lead approval to `Approved` when auto-approve is
/// switched on.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TransitionRule {
    pub(crate) kind: RequestKind,
    pub(crate) from: RequestStatus,
    pub(crate) action: RequestAction,
    pub(crate) roles: &'static [ActorRole],
    pub(crate) guard: ActorGuard,
    pub(crate) to: RequestStatus,
}

const TEAM_LEAD: &[ActorRole] = &[ActorRole::TeamLead];
const WFM: &[ActorRole] = &[ActorRole::WorkforceManager];
const APPROVERS: &[ActorRole] = &[ActorRole::TeamLead, ActorRole::WorkforceManager];
const ANY_ROLE: &[ActorRole] = &[
    ActorRole::Agent,
    ActorRole::TeamLead,
    ActorRole::WorkforceManager,
];

use ActorGuard::{Any, RequesterOnly, TargetOnly};
use RequestAction::{Accept, Approve, AskException, Cancel, Reject};
use RequestKind::{Leave, Swap};
use RequestStatus::{Approved, Denied, PendingAcceptance, PendingTl, PendingWfm, Rejected};

#[rustfmt::skip]
pub(crate) const RULES: &[TransitionRule] = &[
    // Leave: pending_tl -> pending_wfm -> approved, with manager override.
    TransitionRule { kind: Leave, from: PendingTl,  action: Approve, roles: TEAM_LEAD, guard: Any, to: PendingWfm },
    TransitionRule { kind: Leave, from: PendingTl,  action: Approve, roles: WFM,       guard: Any, to: Approved },
    TransitionRule { kind: Leave, from: PendingWfm, action: Approve, roles: WFM,       guard: Any, to: Approved },
    TransitionRule { kind: Leave, from: PendingTl,  action: Reject,  roles: APPROVERS, guard: Any, to: Rejected },
    TransitionRule { kind: Leave, from: PendingWfm, action: Reject,  roles: APPROVERS, guard: Any, to: Rejected },
    TransitionRule { kind: Leave, from: PendingTl,  action: Cancel,  roles: ANY_ROLE,  guard: RequesterOnly, to: Rejected },
    TransitionRule { kind: Leave, from: PendingWfm, action: Cancel,  roles: ANY_ROLE,  guard: RequesterOnly, to: Rejected },
    TransitionRule { kind: Leave, from: Denied,     action: AskException, roles: ANY_ROLE, guard: RequesterOnly, to: PendingTl },

    // Swap: pending_acceptance -> pending_tl -> pending_wfm -> approved.
    TransitionRule { kind: Swap, from: PendingAcceptance, action: Accept, roles: ANY_ROLE, guard: TargetOnly, to: PendingTl },
    TransitionRule { kind: Swap, from: PendingTl,  action: Approve, roles: TEAM_LEAD, guard: Any, to: PendingWfm },
    TransitionRule { kind: Swap, from: PendingTl,  action: Approve, roles: WFM,       guard: Any, to: Approved },
    TransitionRule { kind: Swap, from: PendingWfm, action: Approve, roles: WFM,       guard: Any, to: Approved },
    TransitionRule { kind: Swap, from: PendingTl,  action: Reject,  roles: APPROVERS, guard: Any, to: Rejected },
    TransitionRule { kind: Swap, from: PendingWfm, action: Reject,  roles: APPROVERS, guard: Any, to: Rejected },
    TransitionRule { kind: Swap, from: PendingAcceptance, action: Cancel, roles: ANY_ROLE, guard: RequesterOnly, to: Rejected },
    TransitionRule { kind: Swap, from: PendingTl,  action: Cancel,  roles: ANY_ROLE,  guard: RequesterOnly, to: Rejected },
];

pub(crate) fn rules_for(
    kind: RequestKind,
    from: RequestStatus,
    action: RequestAction,
) -> impl Iterator<Item = &'static TransitionRule> {
    RULES
        .iter()
        .filter(move |rule| rule.kind == kind && rule.from == from && rule.action == action)
}
