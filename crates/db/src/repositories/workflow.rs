//! Workflow repository for session state transitions.
//!
//! Every transition is validated by the core workflow, then the row update
//! and its audit event are written in one database transaction.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use tracing::info;
use uuid::Uuid;

use classplan_core::notification::NotificationEvent;
use classplan_core::scheduling::TimeRange;
use classplan_core::school::ConstraintViolation;
use classplan_core::session::{ProposalResponse, SessionAction, SessionError, SessionWorkflow};

use crate::entities::sessions;
use crate::repositories::event::insert_event;
use crate::repositories::session::{
    BookingError, SessionParties, SessionRepository, SessionScope, check_constraints,
};

/// An applied transition.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    /// The session after the transition.
    pub session: sessions::Model,
    /// What was done.
    pub action: SessionAction,
    /// The appended audit event.
    pub event: NotificationEvent,
    /// Parties, for addressing the notification.
    pub parties: SessionParties,
    /// School constraint warnings when the transition moved the slot.
    pub warnings: Vec<ConstraintViolation>,
}

/// Workflow repository for session transitions.
#[derive(Debug, Clone)]
pub struct WorkflowRepository {
    db: DatabaseConnection,
    sessions: SessionRepository,
}

impl WorkflowRepository {
    /// Creates a new workflow repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let sessions = SessionRepository::new(db.clone());
        Self { db, sessions }
    }

    /// Staff confirms a proposed session.
    pub async fn confirm(&self, id: Uuid, actor: Uuid) -> Result<TransitionOutcome, BookingError> {
        self.transition(id, SessionScope::All, |s| {
            SessionWorkflow::confirm(s.core_status(), actor)
        })
        .await
    }

    /// Delivery starts.
    pub async fn start(&self, id: Uuid, actor: Uuid) -> Result<TransitionOutcome, BookingError> {
        self.transition(id, SessionScope::All, |s| {
            SessionWorkflow::start(s.core_status(), actor)
        })
        .await
    }

    /// Delivery ends with the hours actually given.
    pub async fn complete(
        &self,
        id: Uuid,
        actor: Uuid,
        hours_realized: Decimal,
    ) -> Result<TransitionOutcome, BookingError> {
        self.transition(id, SessionScope::All, |s| {
            SessionWorkflow::complete(s.core_status(), actor, hours_realized)
        })
        .await
    }

    /// Staff calls a session off.
    pub async fn cancel(
        &self,
        id: Uuid,
        actor: Uuid,
        reason: String,
    ) -> Result<TransitionOutcome, BookingError> {
        self.transition(id, SessionScope::All, |s| {
            SessionWorkflow::cancel(s.core_status(), actor, reason)
        })
        .await
    }

    /// The school answers a proposal.
    pub async fn respond(
        &self,
        id: Uuid,
        scope: SessionScope,
        actor: Uuid,
        response: ProposalResponse,
    ) -> Result<TransitionOutcome, BookingError> {
        self.transition(id, scope, |s| {
            SessionWorkflow::respond(s.core_status(), actor, response)
        })
        .await
    }

    /// Staff takes over the school's counter timing.
    ///
    /// The new timing goes through the same school calendar check as a
    /// created or edited session: with `strict` set, violations reject it,
    /// otherwise they come back as warnings. The assigned trainer must be
    /// free for the new timing.
    pub async fn apply_counter(
        &self,
        id: Uuid,
        actor: Uuid,
        strict: bool,
    ) -> Result<TransitionOutcome, BookingError> {
        let session = self.sessions.find_by_id(id, SessionScope::All).await?;
        let pending = session.counter_proposal();
        let action =
            SessionWorkflow::apply_counter(session.core_status(), actor, pending.as_ref())?;

        let mut warnings = Vec::new();
        if let SessionAction::ApplyCounter { start, end, .. } = &action {
            let range = TimeRange::new(*start, *end)?;
            let parties = self.sessions.parties(&session).await?;
            warnings = check_constraints(&parties.school, &range, strict)?;

            if let Some(trainer_id) = session.trainer_id {
                let conflicts = self
                    .sessions
                    .trainer_conflicts(trainer_id, &range, Some(id))
                    .await?;
                if !conflicts.is_empty() {
                    return Err(BookingError::TrainerConflict(conflicts));
                }
            }
        }

        let mut outcome = self.apply(session, action).await?;
        outcome.warnings = warnings;
        Ok(outcome)
    }

    async fn transition<F>(
        &self,
        id: Uuid,
        scope: SessionScope,
        decide: F,
    ) -> Result<TransitionOutcome, BookingError>
    where
        F: FnOnce(&sessions::Model) -> Result<SessionAction, SessionError>,
    {
        let session = self.sessions.find_by_id(id, scope).await?;
        let action = decide(&session)?;
        self.apply(session, action).await
    }

    async fn apply(
        &self,
        session: sessions::Model,
        action: SessionAction,
    ) -> Result<TransitionOutcome, BookingError> {
        let parties = self.sessions.parties(&session).await?;
        let from = session.core_status();

        let mut active: sessions::ActiveModel = session.into();
        apply_action(&mut active, &action);

        let txn = self.db.begin().await?;
        let session = active.update(&txn).await?;
        let event = NotificationEvent::for_action(&parties.summary(&session), &action);
        insert_event(&txn, &event).await?;
        txn.commit().await?;

        info!(
            session_id = %session.id,
            from = %from,
            to = %action.new_status(),
            event = %event.kind,
            actor = %action.actor(),
            "Session transition applied"
        );

        Ok(TransitionOutcome {
            session,
            action,
            event,
            parties,
            warnings: Vec::new(),
        })
    }
}

/// Writes the effect of `action` onto the row.
fn apply_action(active: &mut sessions::ActiveModel, action: &SessionAction) {
    active.status = Set(action.new_status().into());
    active.updated_at = Set(Utc::now().into());

    match action {
        SessionAction::Confirm { confirmed_at, .. } => {
            active.confirmed_at = Set(Some((*confirmed_at).into()));
        }
        SessionAction::Start { .. } => {}
        SessionAction::Complete {
            completed_at,
            hours_realized,
            ..
        } => {
            active.hours_realized = Set(Some(*hours_realized));
            active.completed_at = Set(Some((*completed_at).into()));
        }
        SessionAction::Cancel { reason, .. } | SessionAction::Reject { reason, .. } => {
            active.cancel_reason = Set(Some(reason.clone()));
            clear_counter(active);
        }
        SessionAction::Accept { responded_at, .. } => {
            active.confirmed_at = Set(Some((*responded_at).into()));
            clear_counter(active);
        }
        SessionAction::Counter { proposal, .. } => {
            active.proposed_start = Set(Some(proposal.start.into()));
            active.proposed_end = Set(Some(proposal.end.into()));
            active.counter_comment = Set(proposal.comment.clone());
        }
        SessionAction::ApplyCounter { start, end, .. } => {
            active.start_at = Set((*start).into());
            active.end_at = Set((*end).into());
            clear_counter(active);
        }
    }
}

fn clear_counter(active: &mut sessions::ActiveModel) {
    active.proposed_start = Set(None);
    active.proposed_end = Set(None);
    active.counter_comment = Set(None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::sea_orm_active_enums::SessionStatus;
    use chrono::{Duration, TimeZone};
    use classplan_core::session::{self, CounterProposal};
    use rust_decimal_macros::dec;

    fn row() -> sessions::Model {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        let now = Utc::now().into();
        sessions::Model {
            id: Uuid::now_v7(),
            school_id: Uuid::now_v7(),
            module_id: Uuid::now_v7(),
            trainer_id: None,
            start_at: start.into(),
            end_at: (start + Duration::hours(3)).into(),
            hours_planned: dec!(3),
            hours_realized: None,
            location: None,
            group_name: None,
            notes: None,
            status: SessionStatus::Proposed,
            satisfaction: None,
            proposed_start: None,
            proposed_end: None,
            counter_comment: None,
            cancel_reason: None,
            created_by: Uuid::now_v7(),
            confirmed_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_counter_then_apply() {
        let model = row();
        let proposal = CounterProposal {
            start: Utc.with_ymd_and_hms(2026, 3, 3, 13, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2026, 3, 3, 16, 0, 0).unwrap(),
            comment: Some("afternoon".into()),
        };

        let counter = SessionWorkflow::respond(
            model.core_status(),
            Uuid::now_v7(),
            ProposalResponse::Counter {
                start: proposal.start,
                end: proposal.end,
                comment: proposal.comment.clone(),
            },
        )
        .unwrap();

        let mut active: sessions::ActiveModel = model.clone().into();
        apply_action(&mut active, &counter);
        assert_eq!(active.status.clone().unwrap(), SessionStatus::Proposed);
        assert_eq!(
            active
                .proposed_start
                .clone()
                .unwrap()
                .map(|at| at.with_timezone(&Utc)),
            Some(proposal.start)
        );
        assert_eq!(active.counter_comment.clone().unwrap().as_deref(), Some("afternoon"));

        let applied = SessionWorkflow::apply_counter(
            session::SessionStatus::Proposed,
            Uuid::now_v7(),
            Some(&proposal),
        )
        .unwrap();
        apply_action(&mut active, &applied);
        assert_eq!(
            active.start_at.clone().unwrap().with_timezone(&Utc),
            proposal.start
        );
        assert_eq!(active.proposed_start.clone().unwrap(), None);
        assert_eq!(active.counter_comment.clone().unwrap(), None);
    }

    #[test]
    fn test_complete_records_hours() {
        let mut model = row();
        model.status = SessionStatus::InProgress;
        let action =
            SessionWorkflow::complete(model.core_status(), Uuid::now_v7(), dec!(2.5)).unwrap();

        let mut active: sessions::ActiveModel = model.into();
        apply_action(&mut active, &action);
        assert_eq!(active.status.clone().unwrap(), SessionStatus::Completed);
        assert_eq!(active.hours_realized.clone().unwrap(), Some(dec!(2.5)));
        assert!(active.completed_at.clone().unwrap().is_some());
    }

    #[test]
    fn test_reject_keeps_reason() {
        let model = row();
        let action = SessionWorkflow::respond(
            model.core_status(),
            Uuid::now_v7(),
            ProposalResponse::Reject {
                reason: "exam week".into(),
            },
        )
        .unwrap();

        let mut active: sessions::ActiveModel = model.into();
        apply_action(&mut active, &action);
        assert_eq!(active.status.clone().unwrap(), SessionStatus::Cancelled);
        assert_eq!(
            active.cancel_reason.clone().unwrap().as_deref(),
            Some("exam week")
        );
    }
}
