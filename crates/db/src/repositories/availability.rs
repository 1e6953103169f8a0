//! Availability repository: trainer free/busy windows.
//!
//! Overlap is checked before each write; two concurrent writers can still
//! both pass the check.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use classplan_core::scheduling::{AvailabilityType, SchedulingError, TimeRange, find_conflicts};

use crate::entities::{availabilities, trainers};

/// Error types for availability operations.
#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    /// Availability not found.
    #[error("Availability not found: {0}")]
    NotFound(Uuid),

    /// Trainer not found.
    #[error("Trainer not found: {0}")]
    TrainerNotFound(Uuid),

    /// End is not after start.
    #[error(transparent)]
    InvalidRange(#[from] SchedulingError),

    /// The window overlaps other windows of the trainer.
    #[error("Availability overlaps {} existing window(s)", .0.len())]
    Overlap(Vec<Uuid>),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for declaring a window.
#[derive(Debug, Clone)]
pub struct AvailabilityInput {
    /// Start.
    pub start: DateTime<Utc>,
    /// End.
    pub end: DateTime<Utc>,
    /// Kind.
    pub kind: AvailabilityType,
    /// Note.
    pub note: Option<String>,
}

/// Availability repository.
#[derive(Debug, Clone)]
pub struct AvailabilityRepository {
    db: DatabaseConnection,
}

impl AvailabilityRepository {
    /// Creates a new availability repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Declares a window for a trainer.
    pub async fn create(
        &self,
        trainer_id: Uuid,
        input: AvailabilityInput,
    ) -> Result<availabilities::Model, AvailabilityError> {
        trainers::Entity::find_by_id(trainer_id)
            .one(&self.db)
            .await?
            .ok_or(AvailabilityError::TrainerNotFound(trainer_id))?;

        let range = TimeRange::new(input.start, input.end)?;
        self.ensure_no_overlap(trainer_id, &range, None).await?;

        let now = Utc::now().into();
        let window = availabilities::ActiveModel {
            id: Set(Uuid::now_v7()),
            trainer_id: Set(trainer_id),
            start_at: Set(range.start().into()),
            end_at: Set(range.end().into()),
            availability_type: Set(input.kind.into()),
            note: Set(input.note),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(window.insert(&self.db).await?)
    }

    /// Finds a window by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<availabilities::Model, AvailabilityError> {
        availabilities::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AvailabilityError::NotFound(id))
    }

    /// Windows of a trainer, optionally only those overlapping `window`.
    pub async fn list_for_trainer(
        &self,
        trainer_id: Uuid,
        window: Option<&TimeRange>,
    ) -> Result<Vec<availabilities::Model>, DbErr> {
        let mut query =
            availabilities::Entity::find().filter(availabilities::Column::TrainerId.eq(trainer_id));
        if let Some(window) = window {
            query = query
                .filter(availabilities::Column::StartAt.lt(window.end()))
                .filter(availabilities::Column::EndAt.gt(window.start()));
        }
        query
            .order_by_asc(availabilities::Column::StartAt)
            .all(&self.db)
            .await
    }

    /// Moves or re-types a window.
    pub async fn update(
        &self,
        id: Uuid,
        input: AvailabilityInput,
    ) -> Result<availabilities::Model, AvailabilityError> {
        let existing = self.find_by_id(id).await?;
        let range = TimeRange::new(input.start, input.end)?;
        self.ensure_no_overlap(existing.trainer_id, &range, Some(id))
            .await?;

        let mut active: availabilities::ActiveModel = existing.into();
        active.start_at = Set(range.start().into());
        active.end_at = Set(range.end().into());
        active.availability_type = Set(input.kind.into());
        active.note = Set(input.note);
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a window.
    pub async fn delete(&self, id: Uuid) -> Result<availabilities::Model, AvailabilityError> {
        let existing = self.find_by_id(id).await?;
        availabilities::Entity::delete_by_id(id)
            .exec(&self.db)
            .await?;
        Ok(existing)
    }

    async fn ensure_no_overlap(
        &self,
        trainer_id: Uuid,
        range: &TimeRange,
        except: Option<Uuid>,
    ) -> Result<(), AvailabilityError> {
        let mut query = availabilities::Entity::find()
            .filter(availabilities::Column::TrainerId.eq(trainer_id))
            .filter(availabilities::Column::StartAt.lt(range.end()))
            .filter(availabilities::Column::EndAt.gt(range.start()));
        if let Some(id) = except {
            query = query.filter(availabilities::Column::Id.ne(id));
        }

        let windows = query
            .all(&self.db)
            .await?
            .iter()
            .map(availabilities::Model::window)
            .collect::<Result<Vec<_>, _>>()?;

        let ids: Vec<Uuid> = find_conflicts(range, &windows)
            .into_iter()
            .map(|w| w.id.into_inner())
            .collect();
        if ids.is_empty() {
            return Ok(());
        }
        Err(AvailabilityError::Overlap(ids))
    }
}
