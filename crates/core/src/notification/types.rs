//! Audit events and notification messages.

use chrono::{DateTime, Utc};
use classplan_shared::types::{SchoolId, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use uuid::Uuid;

use crate::session::SessionAction;

/// What happened to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Session proposed.
    Created,
    /// Details edited.
    Updated,
    /// Staff confirmed.
    Confirmed,
    /// Delivery started.
    Started,
    /// Delivery finished.
    Completed,
    /// Staff cancelled.
    Cancelled,
    /// School accepted.
    Accepted,
    /// School rejected.
    Rejected,
    /// School suggested another timing.
    Countered,
    /// Staff applied the school's timing.
    CounterApplied,
    /// Trainer assigned.
    TrainerAssigned,
}

impl EventKind {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Confirmed => "confirmed",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Countered => "countered",
            Self::CounterApplied => "counter_applied",
            Self::TrainerAssigned => "trainer_assigned",
        }
    }

    /// Parses from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "updated" => Some(Self::Updated),
            "confirmed" => Some(Self::Confirmed),
            "started" => Some(Self::Started),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            "countered" => Some(Self::Countered),
            "counter_applied" => Some(Self::CounterApplied),
            "trainer_assigned" => Some(Self::TrainerAssigned),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who an event is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientRole {
    /// Training provider staff.
    Staff,
    /// The session's school.
    School,
    /// The assigned trainer.
    Trainer,
}

impl RecipientRole {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Staff => "staff",
            Self::School => "school",
            Self::Trainer => "trainer",
        }
    }

    /// Parses from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "staff" => Some(Self::Staff),
            "school" => Some(Self::School),
            "trainer" => Some(Self::Trainer),
            _ => None,
        }
    }
}

/// What messages need to know about the session.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// Session id.
    pub session_id: SessionId,
    /// School id.
    pub school_id: SchoolId,
    /// School name.
    pub school_name: String,
    /// Module title.
    pub module_title: String,
    /// Current start.
    pub start: DateTime<Utc>,
    /// Current end.
    pub end: DateTime<Utc>,
}

impl SessionSummary {
    fn describe(&self) -> String {
        format!(
            "\"{}\" at {} on {} ({} - {} UTC)",
            self.module_title,
            self.school_name,
            self.start.format("%Y-%m-%d"),
            self.start.format("%H:%M"),
            self.end.format("%H:%M"),
        )
    }
}

/// An audit entry ready to be appended and sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Session concerned.
    pub session_id: SessionId,
    /// Kind of event.
    pub kind: EventKind,
    /// User who triggered it.
    pub actor: Uuid,
    /// Addressee.
    pub recipient: RecipientRole,
    /// Email subject line.
    pub subject: String,
    /// One-line message for the feed and email body.
    pub message: String,
    /// Structured details.
    pub payload: serde_json::Value,
}

impl NotificationEvent {
    /// Builds the event for a workflow action.
    ///
    /// Staff actions go to the school; school responses go to staff.
    #[must_use]
    pub fn for_action(session: &SessionSummary, action: &SessionAction) -> Self {
        let what = session.describe();
        let (kind, message, payload) = match action {
            SessionAction::Confirm { .. } => (
                EventKind::Confirmed,
                format!("Session {what} has been confirmed."),
                json!({}),
            ),
            SessionAction::Start { .. } => (
                EventKind::Started,
                format!("Session {what} has started."),
                json!({}),
            ),
            SessionAction::Complete { hours_realized, .. } => (
                EventKind::Completed,
                format!("Session {what} is completed ({hours_realized} h delivered)."),
                json!({ "hours_realized": hours_realized }),
            ),
            SessionAction::Cancel { reason, .. } => (
                EventKind::Cancelled,
                format!("Session {what} has been cancelled: {reason}"),
                json!({ "reason": reason }),
            ),
            SessionAction::Accept { .. } => (
                EventKind::Accepted,
                format!("{} accepted session {what}.", session.school_name),
                json!({}),
            ),
            SessionAction::Reject { reason, .. } => (
                EventKind::Rejected,
                format!("{} rejected session {what}: {reason}", session.school_name),
                json!({ "reason": reason }),
            ),
            SessionAction::Counter { proposal, .. } => (
                EventKind::Countered,
                format!(
                    "{} suggests another timing for session {what}: {} to {}{}",
                    session.school_name,
                    proposal.start.format("%Y-%m-%d %H:%M"),
                    proposal.end.format("%Y-%m-%d %H:%M"),
                    proposal
                        .comment
                        .as_deref()
                        .map(|c| format!(" ({c})"))
                        .unwrap_or_default()
                ),
                json!({
                    "proposed_start": proposal.start,
                    "proposed_end": proposal.end,
                    "comment": proposal.comment,
                }),
            ),
            SessionAction::ApplyCounter { start, end, .. } => (
                EventKind::CounterApplied,
                format!(
                    "Your suggested timing was applied to session \"{}\"; please confirm it.",
                    session.module_title
                ),
                json!({ "start": start, "end": end }),
            ),
        };

        let recipient = if action.is_school_response() {
            RecipientRole::Staff
        } else {
            RecipientRole::School
        };

        Self::build(session, kind, action.actor(), recipient, message, payload)
    }

    /// Event for a newly proposed session.
    #[must_use]
    pub fn created(session: &SessionSummary, actor: Uuid) -> Self {
        Self::build(
            session,
            EventKind::Created,
            actor,
            RecipientRole::School,
            format!("New session proposed: {}.", session.describe()),
            json!({ "start": session.start, "end": session.end }),
        )
    }

    /// Event for edited session details.
    #[must_use]
    pub fn updated(session: &SessionSummary, actor: Uuid, changes: serde_json::Value) -> Self {
        Self::build(
            session,
            EventKind::Updated,
            actor,
            RecipientRole::School,
            format!("Session {} has been updated.", session.describe()),
            changes,
        )
    }

    /// Event for a trainer assignment, addressed to the trainer.
    #[must_use]
    pub fn trainer_assigned(
        session: &SessionSummary,
        actor: Uuid,
        trainer_id: Uuid,
        trainer_name: &str,
    ) -> Self {
        Self::build(
            session,
            EventKind::TrainerAssigned,
            actor,
            RecipientRole::Trainer,
            format!("{trainer_name} is assigned to session {}.", session.describe()),
            json!({ "trainer_id": trainer_id }),
        )
    }

    fn build(
        session: &SessionSummary,
        kind: EventKind,
        actor: Uuid,
        recipient: RecipientRole,
        message: String,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            session_id: session.session_id,
            kind,
            actor,
            recipient,
            subject: format!("[Classplan] {} - session {}", session.module_title, kind),
            message,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{CounterProposal, SessionStatus};
    use chrono::TimeZone;

    fn summary() -> SessionSummary {
        SessionSummary {
            session_id: SessionId::new(),
            school_id: SchoolId::new(),
            school_name: "Lycée Hoche".into(),
            module_title: "Python".into(),
            start: Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2026, 3, 2, 11, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_staff_action_goes_to_school() {
        let actor = Uuid::new_v4();
        let action = SessionAction::Confirm {
            new_status: SessionStatus::Confirmed,
            confirmed_by: actor,
            confirmed_at: Utc::now(),
        };
        let event = NotificationEvent::for_action(&summary(), &action);
        assert_eq!(event.kind, EventKind::Confirmed);
        assert_eq!(event.recipient, RecipientRole::School);
        assert_eq!(event.actor, actor);
        assert!(event.message.contains("2026-03-02 (08:00 - 11:00 UTC)"));
        assert_eq!(event.subject, "[Classplan] Python - session confirmed");
    }

    #[test]
    fn test_school_response_goes_to_staff() {
        let action = SessionAction::Reject {
            new_status: SessionStatus::Cancelled,
            responded_by: Uuid::new_v4(),
            responded_at: Utc::now(),
            reason: "exams".into(),
        };
        let event = NotificationEvent::for_action(&summary(), &action);
        assert_eq!(event.kind, EventKind::Rejected);
        assert_eq!(event.recipient, RecipientRole::Staff);
        assert_eq!(event.payload["reason"], "exams");
    }

    #[test]
    fn test_counter_payload() {
        let s = summary();
        let action = SessionAction::Counter {
            new_status: SessionStatus::Proposed,
            responded_by: Uuid::new_v4(),
            responded_at: Utc::now(),
            proposal: CounterProposal {
                start: s.start + chrono::Duration::days(1),
                end: s.end + chrono::Duration::days(1),
                comment: Some("morning only".into()),
            },
        };
        let event = NotificationEvent::for_action(&s, &action);
        assert_eq!(event.kind, EventKind::Countered);
        assert!(event.message.contains("(morning only)"));
        assert_eq!(event.payload["comment"], "morning only");
    }

    #[test]
    fn test_trainer_assigned() {
        let event =
            NotificationEvent::trainer_assigned(&summary(), Uuid::new_v4(), Uuid::new_v4(), "Ada");
        assert_eq!(event.recipient, RecipientRole::Trainer);
        assert!(event.message.starts_with("Ada is assigned"));
    }

    #[test]
    fn test_event_kind_roundtrip() {
        for kind in [
            EventKind::Created,
            EventKind::Updated,
            EventKind::Confirmed,
            EventKind::Started,
            EventKind::Completed,
            EventKind::Cancelled,
            EventKind::Accepted,
            EventKind::Rejected,
            EventKind::Countered,
            EventKind::CounterApplied,
            EventKind::TrainerAssigned,
        ] {
            assert_eq!(EventKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(RecipientRole::parse("school"), Some(RecipientRole::School));
    }
}
