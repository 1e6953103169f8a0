//! Session lifecycle domain types.
//!
//! This module defines the session status, the school's possible responses to
//! a proposal, and the actions produced by the workflow service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Session status in the planning workflow.
///
/// The valid transitions are:
/// - Proposed → Confirmed (staff confirm or school accept)
/// - Proposed → Cancelled (staff cancel or school reject)
/// - Confirmed → InProgress (start)
/// - Confirmed → Cancelled (cancel)
/// - InProgress → Completed (complete)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Proposed by staff, waiting for the school.
    Proposed,
    /// Agreed by both sides.
    Confirmed,
    /// Currently being delivered.
    InProgress,
    /// Delivered (terminal).
    Completed,
    /// Called off (terminal).
    Cancelled,
}

impl SessionStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Proposed,
        Self::Confirmed,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "proposed" => Some(Self::Proposed),
            "confirmed" => Some(Self::Confirmed),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if staff may still edit the session details.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Proposed | Self::Confirmed)
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns true if the session still occupies the trainer's time.
    #[must_use]
    pub const fn blocks_trainer(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Returns true if the session may be deleted outright.
    #[must_use]
    pub const fn is_deletable(&self) -> bool {
        matches!(self, Self::Proposed | Self::Cancelled)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A school's answer to a proposed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "response", rename_all = "snake_case")]
pub enum ProposalResponse {
    /// The school agrees with the proposed timing.
    Accept,
    /// The school suggests another timing; the session stays proposed.
    Counter {
        /// Suggested start.
        start: DateTime<Utc>,
        /// Suggested end.
        end: DateTime<Utc>,
        /// Optional explanation.
        #[serde(default)]
        comment: Option<String>,
    },
    /// The school declines.
    Reject {
        /// Reason given by the school.
        reason: String,
    },
}

/// Alternate timing suggested by a school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterProposal {
    /// Suggested start.
    pub start: DateTime<Utc>,
    /// Suggested end.
    pub end: DateTime<Utc>,
    /// Optional explanation.
    pub comment: Option<String>,
}

/// Workflow action representing a transition with audit data.
#[derive(Debug, Clone)]
pub enum SessionAction {
    /// Staff confirmed a proposed session.
    Confirm {
        /// Resulting status.
        new_status: SessionStatus,
        /// Staff member.
        confirmed_by: Uuid,
        /// When.
        confirmed_at: DateTime<Utc>,
    },
    /// Delivery started.
    Start {
        /// Resulting status.
        new_status: SessionStatus,
        /// Who started it.
        started_by: Uuid,
        /// When.
        started_at: DateTime<Utc>,
    },
    /// Delivery finished.
    Complete {
        /// Resulting status.
        new_status: SessionStatus,
        /// Who closed the session.
        completed_by: Uuid,
        /// When.
        completed_at: DateTime<Utc>,
        /// Hours actually delivered.
        hours_realized: Decimal,
    },
    /// Session called off by staff.
    Cancel {
        /// Resulting status.
        new_status: SessionStatus,
        /// Staff member.
        cancelled_by: Uuid,
        /// When.
        cancelled_at: DateTime<Utc>,
        /// Why.
        reason: String,
    },
    /// The school accepted the proposal.
    Accept {
        /// Resulting status.
        new_status: SessionStatus,
        /// School user.
        responded_by: Uuid,
        /// When.
        responded_at: DateTime<Utc>,
    },
    /// The school suggested another timing.
    Counter {
        /// Resulting status (unchanged).
        new_status: SessionStatus,
        /// School user.
        responded_by: Uuid,
        /// When.
        responded_at: DateTime<Utc>,
        /// The suggested timing.
        proposal: CounterProposal,
    },
    /// The school declined the proposal.
    Reject {
        /// Resulting status.
        new_status: SessionStatus,
        /// School user.
        responded_by: Uuid,
        /// When.
        responded_at: DateTime<Utc>,
        /// Why.
        reason: String,
    },
    /// Staff took over the school's counter timing.
    ApplyCounter {
        /// Resulting status (unchanged).
        new_status: SessionStatus,
        /// Staff member.
        applied_by: Uuid,
        /// New start.
        start: DateTime<Utc>,
        /// New end.
        end: DateTime<Utc>,
    },
}

impl SessionAction {
    /// Returns the status resulting from this action.
    #[must_use]
    pub const fn new_status(&self) -> SessionStatus {
        match self {
            Self::Confirm { new_status, .. }
            | Self::Start { new_status, .. }
            | Self::Complete { new_status, .. }
            | Self::Cancel { new_status, .. }
            | Self::Accept { new_status, .. }
            | Self::Counter { new_status, .. }
            | Self::Reject { new_status, .. }
            | Self::ApplyCounter { new_status, .. } => *new_status,
        }
    }

    /// Returns the user who triggered the action.
    #[must_use]
    pub const fn actor(&self) -> Uuid {
        match self {
            Self::Confirm { confirmed_by: by, .. }
            | Self::Start { started_by: by, .. }
            | Self::Complete { completed_by: by, .. }
            | Self::Cancel { cancelled_by: by, .. }
            | Self::Accept { responded_by: by, .. }
            | Self::Counter { responded_by: by, .. }
            | Self::Reject { responded_by: by, .. }
            | Self::ApplyCounter { applied_by: by, .. } => *by,
        }
    }

    /// Returns true if the action came from the school side.
    #[must_use]
    pub const fn is_school_response(&self) -> bool {
        matches!(
            self,
            Self::Accept { .. } | Self::Counter { .. } | Self::Reject { .. }
        )
    }
}
