//! Session workflow service.
//!
//! Validates lifecycle transitions and returns the `SessionAction` to persist,
//! together with its audit data. Nothing here touches storage.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::session::error::SessionError;
use crate::session::types::{CounterProposal, ProposalResponse, SessionAction, SessionStatus};

/// Stateless service for session status transitions.
pub struct SessionWorkflow;

impl SessionWorkflow {
    /// Staff confirmation of a proposed session.
    ///
    /// # Errors
    /// `InvalidTransition` unless the session is proposed.
    pub fn confirm(
        current_status: SessionStatus,
        confirmed_by: Uuid,
    ) -> Result<SessionAction, SessionError> {
        match current_status {
            SessionStatus::Proposed => Ok(SessionAction::Confirm {
                new_status: SessionStatus::Confirmed,
                confirmed_by,
                confirmed_at: Utc::now(),
            }),
            _ => Err(SessionError::InvalidTransition {
                from: current_status,
                to: SessionStatus::Confirmed,
            }),
        }
    }

    /// Start delivering a confirmed session.
    ///
    /// # Errors
    /// `InvalidTransition` unless the session is confirmed.
    pub fn start(
        current_status: SessionStatus,
        started_by: Uuid,
    ) -> Result<SessionAction, SessionError> {
        match current_status {
            SessionStatus::Confirmed => Ok(SessionAction::Start {
                new_status: SessionStatus::InProgress,
                started_by,
                started_at: Utc::now(),
            }),
            _ => Err(SessionError::InvalidTransition {
                from: current_status,
                to: SessionStatus::InProgress,
            }),
        }
    }

    /// Close a session that is being delivered.
    ///
    /// # Errors
    /// - `NegativeHours` if `hours_realized` is below zero
    /// - `InvalidTransition` unless the session is in progress
    pub fn complete(
        current_status: SessionStatus,
        completed_by: Uuid,
        hours_realized: Decimal,
    ) -> Result<SessionAction, SessionError> {
        if hours_realized < Decimal::ZERO {
            return Err(SessionError::NegativeHours(hours_realized));
        }

        match current_status {
            SessionStatus::InProgress => Ok(SessionAction::Complete {
                new_status: SessionStatus::Completed,
                completed_by,
                completed_at: Utc::now(),
                hours_realized,
            }),
            _ => Err(SessionError::InvalidTransition {
                from: current_status,
                to: SessionStatus::Completed,
            }),
        }
    }

    /// Call off a session that has not started yet.
    ///
    /// # Errors
    /// - `ReasonRequired` if the reason is blank
    /// - `InvalidTransition` unless the session is proposed or confirmed
    pub fn cancel(
        current_status: SessionStatus,
        cancelled_by: Uuid,
        reason: String,
    ) -> Result<SessionAction, SessionError> {
        if reason.trim().is_empty() {
            return Err(SessionError::ReasonRequired);
        }

        match current_status {
            SessionStatus::Proposed | SessionStatus::Confirmed => Ok(SessionAction::Cancel {
                new_status: SessionStatus::Cancelled,
                cancelled_by,
                cancelled_at: Utc::now(),
                reason: reason.trim().to_string(),
            }),
            _ => Err(SessionError::InvalidTransition {
                from: current_status,
                to: SessionStatus::Cancelled,
            }),
        }
    }

    /// Apply a school's answer to a proposal.
    ///
    /// A counter-proposal leaves the session proposed and records the
    /// suggested timing.
    ///
    /// # Errors
    /// - `NotAwaitingResponse` unless the session is proposed
    /// - `ReasonRequired` for a rejection without reason
    /// - `InvalidTimeRange` for a counter whose end is not after its start
    pub fn respond(
        current_status: SessionStatus,
        responded_by: Uuid,
        response: ProposalResponse,
    ) -> Result<SessionAction, SessionError> {
        if current_status != SessionStatus::Proposed {
            return Err(SessionError::NotAwaitingResponse(current_status));
        }

        let responded_at = Utc::now();
        match response {
            ProposalResponse::Accept => Ok(SessionAction::Accept {
                new_status: SessionStatus::Confirmed,
                responded_by,
                responded_at,
            }),
            ProposalResponse::Reject { reason } => {
                if reason.trim().is_empty() {
                    return Err(SessionError::ReasonRequired);
                }
                Ok(SessionAction::Reject {
                    new_status: SessionStatus::Cancelled,
                    responded_by,
                    responded_at,
                    reason: reason.trim().to_string(),
                })
            }
            ProposalResponse::Counter {
                start,
                end,
                comment,
            } => {
                validate_range(start, end)?;
                Ok(SessionAction::Counter {
                    new_status: SessionStatus::Proposed,
                    responded_by,
                    responded_at,
                    proposal: CounterProposal {
                        start,
                        end,
                        comment: comment
                            .map(|c| c.trim().to_string())
                            .filter(|c| !c.is_empty()),
                    },
                })
            }
        }
    }

    /// Staff takes over the pending counter-proposal timing.
    ///
    /// The session stays proposed so the school can accept the new timing.
    ///
    /// # Errors
    /// - `InvalidTransition` unless the session is proposed
    /// - `NoCounterProposal` if nothing is pending
    pub fn apply_counter(
        current_status: SessionStatus,
        applied_by: Uuid,
        pending: Option<&CounterProposal>,
    ) -> Result<SessionAction, SessionError> {
        if current_status != SessionStatus::Proposed {
            return Err(SessionError::InvalidTransition {
                from: current_status,
                to: SessionStatus::Proposed,
            });
        }

        let proposal = pending.ok_or(SessionError::NoCounterProposal)?;
        validate_range(proposal.start, proposal.end)?;

        Ok(SessionAction::ApplyCounter {
            new_status: SessionStatus::Proposed,
            applied_by,
            start: proposal.start,
            end: proposal.end,
        })
    }

    /// Check if a status transition is allowed.
    ///
    /// - Proposed → Confirmed | Cancelled
    /// - Confirmed → InProgress | Cancelled
    /// - InProgress → Completed
    #[must_use]
    pub fn is_valid_transition(from: SessionStatus, to: SessionStatus) -> bool {
        matches!(
            (from, to),
            (
                SessionStatus::Proposed,
                SessionStatus::Confirmed | SessionStatus::Cancelled
            ) | (
                SessionStatus::Confirmed,
                SessionStatus::InProgress | SessionStatus::Cancelled
            ) | (SessionStatus::InProgress, SessionStatus::Completed)
        )
    }
}

/// Longest slot a single session may cover.
pub const MAX_SESSION_DAYS: i64 = 31;

/// Rejects ranges whose end is not strictly after the start, and slots
/// longer than [`MAX_SESSION_DAYS`].
///
/// # Errors
/// - `InvalidTimeRange` when `end <= start`
/// - `TooLong` past the maximum length
pub fn validate_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), SessionError> {
    if end <= start {
        return Err(SessionError::InvalidTimeRange);
    }
    if end - start > Duration::days(MAX_SESSION_DAYS) {
        return Err(SessionError::TooLong(MAX_SESSION_DAYS));
    }
    Ok(())
}

/// Validates a satisfaction score for a delivered session.
///
/// # Errors
/// - `NotCompleted` unless the session is completed
/// - `InvalidSatisfaction` outside 1..=5
pub fn validate_satisfaction(status: SessionStatus, score: i16) -> Result<(), SessionError> {
    if status != SessionStatus::Completed {
        return Err(SessionError::NotCompleted);
    }
    if !(1..=5).contains(&score) {
        return Err(SessionError::InvalidSatisfaction(score));
    }
    Ok(())
}
