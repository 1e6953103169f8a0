//! Planning queries: calendar views, trainer schedules and conflict scans.

use std::collections::HashMap;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use uuid::Uuid;

use classplan_core::scheduling::{
    CalendarItem, ScheduleConflict, TimeRange, TrainerSchedule, schedule_conflicts,
};
use classplan_core::session::SessionStatus;
use classplan_shared::types::{ModuleId, SchoolId, SessionId, TrainerId};

use crate::entities::{
    availabilities, modules, schools, sea_orm_active_enums as db_enums, sessions, trainers,
};
use crate::repositories::session::{BookingError, SessionFilter, SessionScope};

/// A session as shown on the planning calendar.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarEntry {
    /// Session.
    pub session_id: SessionId,
    /// School.
    pub school_id: SchoolId,
    /// School name.
    pub school_name: String,
    /// Module.
    pub module_id: ModuleId,
    /// Module title.
    pub module_title: String,
    /// Trainer.
    pub trainer_id: Option<TrainerId>,
    /// Trainer name.
    pub trainer_name: Option<String>,
    /// Scheduled range.
    pub range: TimeRange,
    /// Status.
    pub status: SessionStatus,
    /// Room or address.
    pub location: Option<String>,
    /// Class or group.
    pub group_name: Option<String>,
}

impl CalendarItem for CalendarEntry {
    fn range(&self) -> TimeRange {
        self.range
    }

    fn school_id(&self) -> SchoolId {
        self.school_id
    }

    fn trainer_id(&self) -> Option<TrainerId> {
        self.trainer_id
    }

    fn module_id(&self) -> ModuleId {
        self.module_id
    }

    fn status(&self) -> SessionStatus {
        self.status
    }
}

/// Planning repository.
#[derive(Debug, Clone)]
pub struct PlanningRepository {
    db: DatabaseConnection,
}

impl PlanningRepository {
    /// Creates a new planning repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Sessions overlapping `window`, with display names, by start time.
    pub async fn calendar(
        &self,
        window: &TimeRange,
        filter: &SessionFilter,
        scope: SessionScope,
    ) -> Result<Vec<CalendarEntry>, BookingError> {
        let filter = SessionFilter {
            from: Some(window.start()),
            to: Some(window.end()),
            ..filter.clone()
        };
        let rows = filter
            .apply(scope.apply(sessions::Entity::find()))
            .order_by_asc(sessions::Column::StartAt)
            .all(&self.db)
            .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let school_names: HashMap<Uuid, String> = schools::Entity::find()
            .filter(schools::Column::Id.is_in(rows.iter().map(|r| r.school_id)))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();
        let module_titles: HashMap<Uuid, String> = modules::Entity::find()
            .filter(modules::Column::Id.is_in(rows.iter().map(|r| r.module_id)))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| (m.id, m.title))
            .collect();
        let trainer_names = self
            .trainer_names(rows.iter().filter_map(|r| r.trainer_id).collect())
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(CalendarEntry {
                    session_id: row.id.into(),
                    school_id: row.school_id.into(),
                    school_name: school_names.get(&row.school_id).cloned().unwrap_or_default(),
                    module_id: row.module_id.into(),
                    module_title: module_titles.get(&row.module_id).cloned().unwrap_or_default(),
                    trainer_id: row.trainer_id.map(Into::into),
                    trainer_name: row.trainer_id.and_then(|id| trainer_names.get(&id).cloned()),
                    range: row.range()?,
                    status: row.core_status(),
                    location: row.location,
                    group_name: row.group_name,
                })
            })
            .collect()
    }

    /// Schedules of the given trainers within `window`.
    ///
    /// Cancelled sessions are left out. Trainers come back in the order given.
    pub async fn trainer_schedules(
        &self,
        trainer_ids: &[Uuid],
        window: &TimeRange,
    ) -> Result<Vec<TrainerSchedule>, BookingError> {
        if trainer_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut schedules: HashMap<Uuid, TrainerSchedule> = trainer_ids
            .iter()
            .map(|id| {
                (
                    *id,
                    TrainerSchedule {
                        trainer_id: (*id).into(),
                        ..TrainerSchedule::default()
                    },
                )
            })
            .collect();

        let sessions = sessions::Entity::find()
            .filter(sessions::Column::TrainerId.is_in(trainer_ids.iter().copied()))
            .filter(sessions::Column::Status.ne(db_enums::SessionStatus::Cancelled))
            .filter(sessions::Column::StartAt.lt(window.end()))
            .filter(sessions::Column::EndAt.gt(window.start()))
            .order_by_asc(sessions::Column::StartAt)
            .all(&self.db)
            .await?;
        for row in &sessions {
            if let Some(schedule) = row.trainer_id.and_then(|id| schedules.get_mut(&id)) {
                schedule.sessions.push(row.booked()?);
            }
        }

        let windows = availabilities::Entity::find()
            .filter(availabilities::Column::TrainerId.is_in(trainer_ids.iter().copied()))
            .filter(availabilities::Column::StartAt.lt(window.end()))
            .filter(availabilities::Column::EndAt.gt(window.start()))
            .order_by_asc(availabilities::Column::StartAt)
            .all(&self.db)
            .await?;
        for row in &windows {
            if let Some(schedule) = schedules.get_mut(&row.trainer_id) {
                schedule.windows.push(row.window()?);
            }
        }

        Ok(trainer_ids
            .iter()
            .filter_map(|id| schedules.remove(id))
            .collect())
    }

    /// Clashes in every trainer's schedule within `window`.
    pub async fn conflicts(
        &self,
        window: &TimeRange,
        trainer_id: Option<Uuid>,
    ) -> Result<Vec<ScheduleConflict>, BookingError> {
        let trainer_ids: Vec<Uuid> = match trainer_id {
            Some(id) => vec![id],
            None => trainers::Entity::find()
                .order_by_asc(trainers::Column::FullName)
                .all(&self.db)
                .await?
                .into_iter()
                .map(|t| t.id)
                .collect(),
        };

        let schedules = self.trainer_schedules(&trainer_ids, window).await?;
        Ok(schedules.iter().flat_map(schedule_conflicts).collect())
    }

    async fn trainer_names(&self, ids: Vec<Uuid>) -> Result<HashMap<Uuid, String>, BookingError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(trainers::Entity::find()
            .filter(trainers::Column::Id.is_in(ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|t| (t.id, t.full_name))
            .collect())
    }
}
