//! Session workflow error types.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::session::types::SessionStatus;

/// Errors that can occur while moving a session through its lifecycle.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Attempted a transition outside the allowed graph.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: SessionStatus,
        /// The attempted target status.
        to: SessionStatus,
    },

    /// The school may only answer a proposed session.
    #[error("Session is {0}, only proposed sessions accept a response")]
    NotAwaitingResponse(SessionStatus),

    /// No counter-proposal is pending on the session.
    #[error("Session has no pending counter-proposal")]
    NoCounterProposal,

    /// End is not after start.
    #[error("Session end must be after its start")]
    InvalidTimeRange,

    /// The slot is longer than a session may last.
    #[error("A session cannot last more than {0} days")]
    TooLong(i64),

    /// Realized hours are negative.
    #[error("Realized hours must not be negative (got {0})")]
    NegativeHours(Decimal),

    /// Planned hours are not positive.
    #[error("Planned hours must be positive (got {0})")]
    NonPositivePlannedHours(Decimal),

    /// Cancellation or rejection without a reason.
    #[error("A reason is required")]
    ReasonRequired,

    /// The session can no longer be edited.
    #[error("Session is {0} and can no longer be edited")]
    NotEditable(SessionStatus),

    /// The session can no longer be deleted.
    #[error("Session is {0} and cannot be deleted")]
    NotDeletable(SessionStatus),

    /// Satisfaction outside 1..=5.
    #[error("Satisfaction score must be between 1 and 5 (got {0})")]
    InvalidSatisfaction(i16),

    /// Satisfaction recorded on a session that was not delivered.
    #[error("Satisfaction can only be recorded on completed sessions")]
    NotCompleted,

}

impl SessionError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTimeRange
            | Self::TooLong(_)
            | Self::NegativeHours(_)
            | Self::NonPositivePlannedHours(_)
            | Self::ReasonRequired
            | Self::InvalidSatisfaction(_) => 400,

            Self::InvalidTransition { .. }
            | Self::NotAwaitingResponse(_)
            | Self::NoCounterProposal
            | Self::NotEditable(_)
            | Self::NotDeletable(_)
            | Self::NotCompleted => 422,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotAwaitingResponse(_) => "NOT_AWAITING_RESPONSE",
            Self::NoCounterProposal => "NO_COUNTER_PROPOSAL",
            Self::InvalidTimeRange => "INVALID_TIME_RANGE",
            Self::TooLong(_) => "SESSION_TOO_LONG",
            Self::NegativeHours(_) | Self::NonPositivePlannedHours(_) => "INVALID_HOURS",
            Self::ReasonRequired => "REASON_REQUIRED",
            Self::NotEditable(_) => "SESSION_NOT_EDITABLE",
            Self::NotDeletable(_) => "SESSION_NOT_DELETABLE",
            Self::InvalidSatisfaction(_) => "INVALID_SATISFACTION",
            Self::NotCompleted => "SESSION_NOT_COMPLETED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_error() {
        let err = SessionError::InvalidTransition {
            from: SessionStatus::Completed,
            to: SessionStatus::Cancelled,
        };
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert!(err.to_string().contains("completed"));
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn test_input_errors_are_bad_request() {
        assert_eq!(SessionError::InvalidTimeRange.status_code(), 400);
        assert_eq!(SessionError::ReasonRequired.status_code(), 400);
        assert_eq!(SessionError::InvalidSatisfaction(9).status_code(), 400);
        assert_eq!(
            SessionError::NegativeHours(Decimal::NEGATIVE_ONE).error_code(),
            "INVALID_HOURS"
        );
    }

    #[test]
    fn test_too_long_is_bad_request() {
        let err = SessionError::TooLong(31);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "SESSION_TOO_LONG");
        assert!(err.to_string().contains("31 days"));
    }
}
