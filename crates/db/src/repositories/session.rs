//! Session repository: planning, editing and assigning training sessions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use serde_json::{Map, Value, json};
use tracing::info;
use uuid::Uuid;

use classplan_core::notification::{NotificationEvent, RecipientRole, SessionSummary};
use classplan_core::scheduling::{Conflict, SchedulingError, TimeRange, trainer_conflicts};
use classplan_core::school::{ConstraintError, ConstraintViolation, contact_emails};
use classplan_core::session::{self, SessionError, validate_range, validate_satisfaction};
use classplan_shared::types::PageRequest;

use crate::entities::{
    availabilities, modules, schools, sea_orm_active_enums::SessionStatus, sessions, trainers,
};
use crate::repositories::convert::to_utc;
use crate::repositories::event::insert_event;

/// Error types for session planning.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Session not found (or not visible to the caller).
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    /// School not found.
    #[error("School not found: {0}")]
    SchoolNotFound(Uuid),

    /// Module not found.
    #[error("Module not found: {0}")]
    ModuleNotFound(Uuid),

    /// Module is not open for scheduling.
    #[error("Module {0} is inactive")]
    ModuleInactive(Uuid),

    /// Trainer not found.
    #[error("Trainer not found: {0}")]
    TrainerNotFound(Uuid),

    /// Trainer is deactivated.
    #[error("Trainer {0} is inactive")]
    TrainerInactive(Uuid),

    /// Lifecycle or input rule broken.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Invalid range.
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    /// The trainer is busy for the slot.
    #[error("Trainer has {} conflict(s) for this slot", .0.len())]
    TrainerConflict(Vec<Conflict>),

    /// The slot breaks school constraints and strict mode is on.
    #[error("Slot violates {} school constraint(s)", .0.len())]
    ConstraintViolations(Vec<ConstraintViolation>),

    /// The school's stored constraints are unusable.
    #[error("Invalid school constraints: {0}")]
    Constraint(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ConstraintError> for BookingError {
    fn from(err: ConstraintError) -> Self {
        Self::Constraint(err.to_string())
    }
}

/// Which sessions a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionScope {
    /// Provider staff see everything.
    All,
    /// A school sees its own sessions.
    School(Uuid),
    /// A trainer sees sessions assigned to them.
    Trainer(Uuid),
}

impl SessionScope {
    pub(crate) fn apply(self, query: Select<sessions::Entity>) -> Select<sessions::Entity> {
        match self {
            Self::All => query,
            Self::School(id) => query.filter(sessions::Column::SchoolId.eq(id)),
            Self::Trainer(id) => query.filter(sessions::Column::TrainerId.eq(id)),
        }
    }
}

/// Input for proposing a session.
#[derive(Debug, Clone)]
pub struct CreateSessionInput {
    /// School.
    pub school_id: Uuid,
    /// Module.
    pub module_id: Uuid,
    /// Trainer, if already known.
    pub trainer_id: Option<Uuid>,
    /// Start.
    pub start: DateTime<Utc>,
    /// End.
    pub end: DateTime<Utc>,
    /// Planned hours; defaults to the module duration.
    pub hours_planned: Option<Decimal>,
    /// Room or address.
    pub location: Option<String>,
    /// Class or group.
    pub group_name: Option<String>,
    /// Free notes.
    pub notes: Option<String>,
}

/// Edit of a session still open for changes. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateSessionInput {
    /// New start.
    pub start: Option<DateTime<Utc>>,
    /// New end.
    pub end: Option<DateTime<Utc>>,
    /// Planned hours.
    pub hours_planned: Option<Decimal>,
    /// Room or address.
    pub location: Option<String>,
    /// Class or group.
    pub group_name: Option<String>,
    /// Free notes.
    pub notes: Option<String>,
}

/// Filter for listing sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    /// School.
    pub school_id: Option<Uuid>,
    /// Trainer.
    pub trainer_id: Option<Uuid>,
    /// Module.
    pub module_id: Option<Uuid>,
    /// Status.
    pub status: Option<session::SessionStatus>,
    /// Sessions ending after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Sessions starting before this instant.
    pub to: Option<DateTime<Utc>>,
}

impl SessionFilter {
    pub(crate) fn apply(&self, mut query: Select<sessions::Entity>) -> Select<sessions::Entity> {
        if let Some(id) = self.school_id {
            query = query.filter(sessions::Column::SchoolId.eq(id));
        }
        if let Some(id) = self.trainer_id {
            query = query.filter(sessions::Column::TrainerId.eq(id));
        }
        if let Some(id) = self.module_id {
            query = query.filter(sessions::Column::ModuleId.eq(id));
        }
        if let Some(status) = self.status {
            query = query.filter(sessions::Column::Status.eq(SessionStatus::from(status)));
        }
        if let Some(from) = self.from {
            query = query.filter(sessions::Column::EndAt.gt(from));
        }
        if let Some(to) = self.to {
            query = query.filter(sessions::Column::StartAt.lt(to));
        }
        query
    }
}

/// School, module and trainer of a session.
#[derive(Debug, Clone)]
pub struct SessionParties {
    /// School.
    pub school: schools::Model,
    /// Module.
    pub module: modules::Model,
    /// Assigned trainer.
    pub trainer: Option<trainers::Model>,
}

impl SessionParties {
    /// What notification messages need to know about the session.
    pub fn summary(&self, session: &sessions::Model) -> SessionSummary {
        SessionSummary {
            session_id: session.id.into(),
            school_id: session.school_id.into(),
            school_name: self.school.name.clone(),
            module_title: self.module.title.clone(),
            start: to_utc(session.start_at),
            end: to_utc(session.end_at),
        }
    }

    /// Email addresses for an event addressed to `role`.
    ///
    /// Staff events go to the staff mailbox; school events to every school
    /// contact with an address; trainer events to the assigned trainer.
    pub fn recipients(&self, role: RecipientRole, staff_email: &str) -> Vec<String> {
        match role {
            RecipientRole::Staff => vec![staff_email.to_string()],
            RecipientRole::School => contact_emails(&self.school.contact_list()),
            RecipientRole::Trainer => self
                .trainer
                .as_ref()
                .map(|t| vec![t.email.clone()])
                .unwrap_or_default(),
        }
    }
}

/// A session write together with what the caller should report and send.
#[derive(Debug, Clone)]
pub struct SessionWrite {
    /// The stored session.
    pub session: sessions::Model,
    /// School constraint warnings for the new slot.
    pub warnings: Vec<ConstraintViolation>,
    /// Audit events appended by the write.
    pub events: Vec<NotificationEvent>,
    /// Parties, for addressing notifications.
    pub parties: SessionParties,
}

/// Session repository.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    db: DatabaseConnection,
}

impl SessionRepository {
    /// Creates a new session repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Proposes a new session.
    ///
    /// With `strict` set, school constraint violations reject the session;
    /// otherwise they come back as warnings. A trainer given up front must be
    /// free unless `force` is set.
    pub async fn create(
        &self,
        input: CreateSessionInput,
        created_by: Uuid,
        strict: bool,
        force: bool,
    ) -> Result<SessionWrite, BookingError> {
        validate_range(input.start, input.end)?;
        let range = TimeRange::new(input.start, input.end)?;

        let school = schools::Entity::find_by_id(input.school_id)
            .one(&self.db)
            .await?
            .ok_or(BookingError::SchoolNotFound(input.school_id))?;
        let module = modules::Entity::find_by_id(input.module_id)
            .one(&self.db)
            .await?
            .ok_or(BookingError::ModuleNotFound(input.module_id))?;
        if !module.is_active {
            return Err(BookingError::ModuleInactive(module.id));
        }

        let hours_planned = input.hours_planned.unwrap_or(module.duration_hours);
        if hours_planned <= Decimal::ZERO {
            return Err(SessionError::NonPositivePlannedHours(hours_planned).into());
        }

        let warnings = check_constraints(&school, &range, strict)?;

        let trainer = match input.trainer_id {
            Some(trainer_id) => {
                let trainer = self.active_trainer(trainer_id).await?;
                if !force {
                    self.ensure_trainer_free(trainer_id, &range, None).await?;
                }
                Some(trainer)
            }
            None => None,
        };

        let now = Utc::now().into();
        let row = sessions::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(school.id),
            module_id: Set(module.id),
            trainer_id: Set(trainer.as_ref().map(|t| t.id)),
            start_at: Set(range.start().into()),
            end_at: Set(range.end().into()),
            hours_planned: Set(hours_planned),
            hours_realized: Set(None),
            location: Set(input.location),
            group_name: Set(input.group_name),
            notes: Set(input.notes),
            status: Set(SessionStatus::Proposed),
            satisfaction: Set(None),
            proposed_start: Set(None),
            proposed_end: Set(None),
            counter_comment: Set(None),
            cancel_reason: Set(None),
            created_by: Set(created_by),
            confirmed_at: Set(None),
            completed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let parties = SessionParties {
            school,
            module,
            trainer,
        };

        let txn = self.db.begin().await?;
        let session = row.insert(&txn).await?;
        let summary = parties.summary(&session);
        let mut events = vec![NotificationEvent::created(&summary, created_by)];
        if let Some(trainer) = &parties.trainer {
            events.push(NotificationEvent::trainer_assigned(
                &summary,
                created_by,
                trainer.id,
                &trainer.full_name,
            ));
        }
        for event in &events {
            insert_event(&txn, event).await?;
        }
        txn.commit().await?;

        info!(
            session_id = %session.id,
            school_id = %session.school_id,
            module_id = %session.module_id,
            warnings = warnings.len(),
            "Session proposed"
        );

        Ok(SessionWrite {
            session,
            warnings,
            events,
            parties,
        })
    }

    /// Finds a session visible in `scope`.
    pub async fn find_by_id(
        &self,
        id: Uuid,
        scope: SessionScope,
    ) -> Result<sessions::Model, BookingError> {
        scope
            .apply(sessions::Entity::find_by_id(id))
            .one(&self.db)
            .await?
            .ok_or(BookingError::SessionNotFound(id))
    }

    /// Lists sessions by start time.
    pub async fn list(
        &self,
        filter: &SessionFilter,
        scope: SessionScope,
        page: &PageRequest,
    ) -> Result<(Vec<sessions::Model>, u64), BookingError> {
        let query = filter.apply(scope.apply(sessions::Entity::find()));

        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_asc(sessions::Column::StartAt)
            .order_by_asc(sessions::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((items, total))
    }

    /// Loads school, module and trainer of a session.
    pub async fn parties(&self, session: &sessions::Model) -> Result<SessionParties, BookingError> {
        let school = schools::Entity::find_by_id(session.school_id)
            .one(&self.db)
            .await?
            .ok_or(BookingError::SchoolNotFound(session.school_id))?;
        let module = modules::Entity::find_by_id(session.module_id)
            .one(&self.db)
            .await?
            .ok_or(BookingError::ModuleNotFound(session.module_id))?;
        let trainer = match session.trainer_id {
            Some(id) => trainers::Entity::find_by_id(id).one(&self.db).await?,
            None => None,
        };
        Ok(SessionParties {
            school,
            module,
            trainer,
        })
    }

    /// Edits a proposed or confirmed session.
    ///
    /// A new slot is checked against the school calendar and, when a
    /// trainer is assigned, against the trainer's schedule unless `force`.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateSessionInput,
        actor: Uuid,
        strict: bool,
        force: bool,
    ) -> Result<SessionWrite, BookingError> {
        let existing = self.find_by_id(id, SessionScope::All).await?;
        let status = existing.core_status();
        if !status.is_editable() {
            return Err(SessionError::NotEditable(status).into());
        }

        let parties = self.parties(&existing).await?;
        let start = input.start.unwrap_or_else(|| to_utc(existing.start_at));
        let end = input.end.unwrap_or_else(|| to_utc(existing.end_at));
        validate_range(start, end)?;
        let range = TimeRange::new(start, end)?;
        let moved = range != existing.range()?;

        let mut changes = Map::new();
        let mut warnings = Vec::new();
        if moved {
            warnings = check_constraints(&parties.school, &range, strict)?;
            if let Some(trainer_id) = existing.trainer_id.filter(|_| !force) {
                self.ensure_trainer_free(trainer_id, &range, Some(id)).await?;
            }
            changes.insert("start".into(), json!(range.start()));
            changes.insert("end".into(), json!(range.end()));
        }

        let mut active: sessions::ActiveModel = existing.into();
        active.start_at = Set(range.start().into());
        active.end_at = Set(range.end().into());
        if let Some(hours) = input.hours_planned {
            if hours <= Decimal::ZERO {
                return Err(SessionError::NonPositivePlannedHours(hours).into());
            }
            active.hours_planned = Set(hours);
            changes.insert("hours_planned".into(), json!(hours));
        }
        if let Some(location) = input.location {
            changes.insert("location".into(), json!(location));
            active.location = Set(Some(location));
        }
        if let Some(group_name) = input.group_name {
            changes.insert("group_name".into(), json!(group_name));
            active.group_name = Set(Some(group_name));
        }
        if let Some(notes) = input.notes {
            changes.insert("notes".into(), json!(notes));
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Utc::now().into());

        let txn = self.db.begin().await?;
        let session = active.update(&txn).await?;
        let event = NotificationEvent::updated(
            &parties.summary(&session),
            actor,
            Value::Object(changes),
        );
        insert_event(&txn, &event).await?;
        txn.commit().await?;

        info!(session_id = %session.id, actor = %actor, moved, "Session updated");

        Ok(SessionWrite {
            session,
            warnings,
            events: vec![event],
            parties,
        })
    }

    /// Deletes a proposed or cancelled session with its event log.
    pub async fn delete(&self, id: Uuid) -> Result<(), BookingError> {
        let existing = self.find_by_id(id, SessionScope::All).await?;
        let status = existing.core_status();
        if !status.is_deletable() {
            return Err(SessionError::NotDeletable(status).into());
        }

        sessions::Entity::delete_by_id(id).exec(&self.db).await?;
        info!(session_id = %id, "Session deleted");
        Ok(())
    }

    /// Assigns a trainer to an open session.
    ///
    /// Fails with `TrainerConflict` when the trainer is busy, unless `force`.
    pub async fn assign_trainer(
        &self,
        id: Uuid,
        trainer_id: Uuid,
        actor: Uuid,
        force: bool,
    ) -> Result<SessionWrite, BookingError> {
        let existing = self.find_by_id(id, SessionScope::All).await?;
        let status = existing.core_status();
        if !status.is_editable() {
            return Err(SessionError::NotEditable(status).into());
        }

        let trainer = self.active_trainer(trainer_id).await?;
        let range = existing.range()?;
        if !force {
            self.ensure_trainer_free(trainer_id, &range, Some(id)).await?;
        }

        let mut parties = self.parties(&existing).await?;
        let mut active: sessions::ActiveModel = existing.into();
        active.trainer_id = Set(Some(trainer.id));
        active.updated_at = Set(Utc::now().into());

        let txn = self.db.begin().await?;
        let session = active.update(&txn).await?;
        let event = NotificationEvent::trainer_assigned(
            &parties.summary(&session),
            actor,
            trainer.id,
            &trainer.full_name,
        );
        insert_event(&txn, &event).await?;
        txn.commit().await?;

        info!(session_id = %session.id, trainer_id = %trainer.id, force, "Trainer assigned");

        parties.trainer = Some(trainer);
        Ok(SessionWrite {
            session,
            warnings: Vec::new(),
            events: vec![event],
            parties,
        })
    }

    /// Records the school's satisfaction with a completed session.
    pub async fn record_satisfaction(
        &self,
        id: Uuid,
        score: i16,
        scope: SessionScope,
    ) -> Result<sessions::Model, BookingError> {
        let existing = self.find_by_id(id, scope).await?;
        validate_satisfaction(existing.core_status(), score)?;

        let mut active: sessions::ActiveModel = existing.into();
        active.satisfaction = Set(Some(score));
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Conflicts a trainer would have for `range`, ignoring `exclude`.
    pub async fn trainer_conflicts(
        &self,
        trainer_id: Uuid,
        range: &TimeRange,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Conflict>, BookingError> {
        let sessions = sessions::Entity::find()
            .filter(sessions::Column::TrainerId.eq(trainer_id))
            .filter(sessions::Column::Status.ne(SessionStatus::Cancelled))
            .filter(sessions::Column::StartAt.lt(range.end()))
            .filter(sessions::Column::EndAt.gt(range.start()))
            .all(&self.db)
            .await?
            .iter()
            .map(sessions::Model::booked)
            .collect::<Result<Vec<_>, _>>()?;

        let windows = availabilities::Entity::find()
            .filter(availabilities::Column::TrainerId.eq(trainer_id))
            .filter(availabilities::Column::StartAt.lt(range.end()))
            .filter(availabilities::Column::EndAt.gt(range.start()))
            .all(&self.db)
            .await?
            .iter()
            .map(availabilities::Model::window)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(trainer_conflicts(
            range,
            &sessions,
            &windows,
            exclude.map(Into::into),
        ))
    }

    async fn ensure_trainer_free(
        &self,
        trainer_id: Uuid,
        range: &TimeRange,
        exclude: Option<Uuid>,
    ) -> Result<(), BookingError> {
        let conflicts = self.trainer_conflicts(trainer_id, range, exclude).await?;
        if conflicts.is_empty() {
            Ok(())
        } else {
            Err(BookingError::TrainerConflict(conflicts))
        }
    }

    async fn active_trainer(&self, trainer_id: Uuid) -> Result<trainers::Model, BookingError> {
        let trainer = trainers::Entity::find_by_id(trainer_id)
            .one(&self.db)
            .await?
            .ok_or(BookingError::TrainerNotFound(trainer_id))?;
        if !trainer.is_active {
            return Err(BookingError::TrainerInactive(trainer_id));
        }
        Ok(trainer)
    }
}

/// Checks a slot against the school calendar.
/// Checks `range` against the school calendar.
///
/// Violations reject the slot when `strict`, otherwise they are returned.
pub(crate) fn check_constraints(
    school: &schools::Model,
    range: &TimeRange,
    strict: bool,
) -> Result<Vec<ConstraintViolation>, BookingError> {
    let constraints = school
        .constraints()
        .map_err(|e| BookingError::Constraint(e.to_string()))?;
    let violations = constraints.check(range)?;
    if strict && !violations.is_empty() {
        return Err(BookingError::ConstraintViolations(violations));
    }
    Ok(violations)
}
