use chrono::{Datelike, NaiveDate, Weekday};

use super::domain::{LeaveBalance, LeaveRequest, LeaveType, RequestId, RequestStatus};

/// Failures raised while vetting a leave request before it enters the chain.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("range {start} to {end} contains no business days")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("no leave balance on file for type '{0}'")]
    UnknownLeaveType(LeaveType),
    #[error("requested {requested} day(s) but only {available} available")]
    InsufficientBalance { requested: u32, available: f32 },
    #[error("dates collide with request {conflicting} ({status:?})")]
    OverlappingRequest {
        conflicting: RequestId,
        status: RequestStatus,
    },
}

/// What a successful validation hands back to the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaveAssessment {
    pub requested_days: u32,
    pub available_balance: f32,
}

/// Count of weekdays (Mon-Fri) in the inclusive range. Zero when the range
/// is inverted or covers only a weekend.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> u32 {
    let mut count = 0;
    let mut day = start;
    while day <= end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            count += 1;
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    count
}

/// Read-only gate in front of request creation. The caller supplies the
/// balance row and the requester's own request history; nothing is mutated.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaveValidator;

impl LeaveValidator {
    /// Vet a leave window against the balance and the requester's other
    /// requests. `exclude` skips one request id so an edit does not collide
    /// with itself.
    pub fn validate(
        &self,
        leave_type: &LeaveType,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<&RequestId>,
        balance: Option<&LeaveBalance>,
        existing: &[LeaveRequest],
    ) -> Result<LeaveAssessment, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidRange { start, end });
        }

        let requested_days = business_days(start, end);
        if requested_days == 0 {
            return Err(ValidationError::InvalidRange { start, end });
        }

        let balance = balance
            .ok_or_else(|| ValidationError::UnknownLeaveType(leave_type.clone()))?;

        // Hard failures before the soft one: an overlapping window should
        // surface even when the balance would also auto-deny the request.
        for request in existing {
            if Some(&request.id) == exclude {
                continue;
            }
            if !request.status.holds_dates() {
                continue;
            }
            if request.overlaps(start, end) {
                return Err(ValidationError::OverlappingRequest {
                    conflicting: request.id.clone(),
                    status: request.status,
                });
            }
        }

        if balance.days < requested_days as f32 {
            return Err(ValidationError::InsufficientBalance {
                requested: requested_days,
                available: balance.days,
            });
        }

        Ok(LeaveAssessment {
            requested_days,
            available_balance: balance.days,
        })
    }
}
