//! The state machine shared by leave and swap requests.
//!
//! Transitions live in a data table rather than per-kind match arms so both
//! request kinds run through one evaluator with one set of guards. The
//! engine only computes the outcome; persisting it (and winning the race
//! against concurrent approvers) is the service's job.

mod table;

use chrono::{DateTime, Utc};

use super::domain::{
    ActorRole, ApprovalSettings, Actor, RequestAction, RequestRecord, RequestStatus,
};
use table::{rules_for, ActorGuard};

/// Reasons a requested transition is not allowed. All of these are caller
/// errors; a well-behaved UI never produces them.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("no {action:?} transition out of {from:?}")]
    InvalidTransition {
        from: RequestStatus,
        action: RequestAction,
    },
    #[error("role {role:?} may not {action:?} a request in {from:?}")]
    RoleNotPermitted {
        role: ActorRole,
        action: RequestAction,
        from: RequestStatus,
    },
    #[error("only the requester may {0:?} this request")]
    NotRequestOwner(RequestAction),
    #[error("only the swap target may accept this request")]
    NotSwapTarget,
    #[error("exception requests are disabled")]
    ExceptionsDisabled,
}

/// A computed transition, ready to be stamped onto the record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: RequestStatus,
    pub to: RequestStatus,
    pub stamp_tl: bool,
    pub stamp_wfm: bool,
}

impl Transition {
    pub fn apply(&self, record: &mut RequestRecord, at: DateTime<Utc>) {
        record.set_status(self.to);
        if self.stamp_tl {
            record.set_tl_approved_at(at);
        }
        if self.stamp_wfm {
            record.set_wfm_approved_at(at);
        }
    }
}

/// Stateless evaluator over the transition table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionEngine;

impl TransitionEngine {
    pub fn evaluate(
        &self,
        record: &RequestRecord,
        action: RequestAction,
        actor: &Actor,
        settings: ApprovalSettings,
    ) -> Result<Transition, TransitionError> {
        let from = record.status();
        if from.is_terminal() {
            return Err(TransitionError::InvalidTransition { from, action });
        }

        let mut candidates = rules_for(record.kind(), from, action).peekable();
        if candidates.peek().is_none() {
            return Err(TransitionError::InvalidTransition { from, action });
        }

        let rule = candidates
            .find(|rule| rule.roles.contains(&actor.role))
            .ok_or(TransitionError::RoleNotPermitted {
                role: actor.role,
                action,
                from,
            })?;

        match rule.guard {
            ActorGuard::Any => {}
            ActorGuard::RequesterOnly => {
                if &actor.id != record.requester() {
                    return Err(TransitionError::NotRequestOwner(action));
                }
            }
            ActorGuard::TargetOnly => {
                if record.swap_target() != Some(&actor.id) {
                    return Err(TransitionError::NotSwapTarget);
                }
            }
        }

        if action == RequestAction::AskException && !settings.allow_leave_exceptions {
            return Err(TransitionError::ExceptionsDisabled);
        }

        let mut to = rule.to;
        if action == RequestAction::Approve
            && to == RequestStatus::PendingWfm
            && settings.auto_approve_on_tl
        {
            to = RequestStatus::Approved;
        }

        // Approving from pending_tl stamps the team-lead slot; landing on
        // approved stamps the manager slot (so a manager acting straight
        // from pending_tl stamps both in one step).
        let stamp_tl = action == RequestAction::Approve && from == RequestStatus::PendingTl;
        let stamp_wfm = action == RequestAction::Approve && to == RequestStatus::Approved;

        Ok(Transition {
            from,
            to,
            stamp_tl,
            stamp_wfm,
        })
    }
}
