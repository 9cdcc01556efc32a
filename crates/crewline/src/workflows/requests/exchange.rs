//! Executes an approved swap: the two slots exchange shift types, and when
//! the request spans two dates with assignments on both sides, the
//! cross-date slots exchange as well, so up to four rows move in one
//! all-or-nothing write.
//!
//! The plan is computed from the snapshot captured at filing time, never
//! from live intent. Live rows are only read to confirm they still match
//! the snapshot (or already match the exchanged layout, which makes a retry
//! a no-op).

use chrono::NaiveDate;

use super::domain::{Shift, ShiftRef, ShiftType, SwapRequest, UserId};
use super::repository::{ShiftStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("no shift row for {user} on {date}")]
    ShiftMissing { user: UserId, date: NaiveDate },
    #[error("shift for {user} on {date} changed since the swap was filed (expected {expected:?}, found {found:?})")]
    ShiftDrift {
        user: UserId,
        date: NaiveDate,
        expected: ShiftType,
        found: ShiftType,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What an execution run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeReport {
    pub rows_touched: usize,
    pub already_applied: bool,
}

struct SlotPlan {
    slot: ShiftRef,
    original: ShiftType,
    exchanged: ShiftType,
    counterpart: UserId,
}

fn slot_plans(swap: &SwapRequest) -> Vec<SlotPlan> {
    let snapshot = &swap.snapshot;
    let mut plans = vec![
        SlotPlan {
            slot: swap.requester_shift.clone(),
            original: snapshot.requester_shift,
            exchanged: snapshot.target_shift,
            counterpart: swap.target.clone(),
        },
        SlotPlan {
            slot: swap.target_shift.clone(),
            original: snapshot.target_shift,
            exchanged: snapshot.requester_shift,
            counterpart: swap.requester.clone(),
        },
    ];

    // Cross-date slots only exchange when both sides held an assignment at
    // filing time; a lone cross-date shift has no counterpart to receive.
    if swap.requester_shift.date != swap.target_shift.date {
        if let (Some(requester_cross), Some(target_cross)) = (
            snapshot.requester_on_target_date,
            snapshot.target_on_requester_date,
        ) {
            plans.push(SlotPlan {
                slot: ShiftRef {
                    user: swap.requester.clone(),
                    date: swap.target_shift.date,
                },
                original: requester_cross,
                exchanged: target_cross,
                counterpart: swap.target.clone(),
            });
            plans.push(SlotPlan {
                slot: ShiftRef {
                    user: swap.target.clone(),
                    date: swap.requester_shift.date,
                },
                original: target_cross,
                exchanged: requester_cross,
                counterpart: swap.requester.clone(),
            });
        }
    }

    plans
}

/// Apply the exchange through the shift store. Safe to retry: a run that
/// finds the exchanged layout already in place reports `already_applied`
/// and writes nothing.
pub fn execute<S: ShiftStore>(shifts: &S, swap: &SwapRequest) -> Result<ExchangeReport, ExchangeError> {
    let plans = slot_plans(swap);

    let mut live = Vec::with_capacity(plans.len());
    for plan in &plans {
        let current = shifts
            .shift(&plan.slot.user, plan.slot.date)?
            .ok_or_else(|| ExchangeError::ShiftMissing {
                user: plan.slot.user.clone(),
                date: plan.slot.date,
            })?;
        live.push(current.shift_type);
    }

    let matches_original = plans
        .iter()
        .zip(&live)
        .all(|(plan, current)| plan.original == *current);
    if matches_original {
        let writes: Vec<Shift> = plans
            .iter()
            .map(|plan| Shift {
                user: plan.slot.user.clone(),
                date: plan.slot.date,
                shift_type: plan.exchanged,
                swapped_with: Some(plan.counterpart.clone()),
            })
            .collect();
        let rows_touched = writes.len();
        shifts.exchange(writes)?;
        return Ok(ExchangeReport {
            rows_touched,
            already_applied: false,
        });
    }

    let matches_exchanged = plans
        .iter()
        .zip(&live)
        .all(|(plan, current)| plan.exchanged == *current);
    if matches_exchanged {
        return Ok(ExchangeReport {
            rows_touched: 0,
            already_applied: true,
        });
    }

    let (plan, found) = plans
        .iter()
        .zip(&live)
        .find(|(plan, current)| plan.original != **current)
        .expect("a mismatching slot exists when neither layout matches");
    Err(ExchangeError::ShiftDrift {
        user: plan.slot.user.clone(),
        date: plan.slot.date,
        expected: plan.original,
        found: *found,
    })
}
