//! Planning views: calendar, conflict report and trainer availability.

use std::collections::HashSet;

use axum::{
    Router,
    extract::State,
    routing::get,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::extractors::ValidatedQuery;
use crate::response::{ApiResponse, ApiResult};
use crate::routes::trainers::TrainerResponse;
use crate::{ApiError, AppState, middleware::AuthUser};
use classplan_core::scheduling::{
    CalendarFilter, ScheduleConflict, TimeRange, available_trainers, group_by_day,
    parse_timezone,
};
use classplan_core::session::SessionStatus;
use classplan_db::repositories::{CalendarEntry, SessionFilter};
use classplan_db::{PlanningRepository, TrainerRepository};

/// Longest window a planning query may cover.
const MAX_WINDOW_DAYS: i64 = 366;

const DEFAULT_TIMEZONE: &str = "Europe/Paris";

/// Creates the planning routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/planning/calendar", get(get_calendar))
        .route("/planning/conflicts", get(get_conflicts))
        .route("/planning/available-trainers", get(get_available_trainers))
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Query parameters for the calendar.
#[derive(Debug, Deserialize, Validate)]
pub struct CalendarQuery {
    /// Window start.
    pub from: DateTime<Utc>,
    /// Window end.
    pub to: DateTime<Utc>,
    /// IANA timezone used to group by day.
    pub tz: Option<String>,
    /// School.
    pub school_id: Option<Uuid>,
    /// Trainer.
    pub trainer_id: Option<Uuid>,
    /// Module.
    pub module_id: Option<Uuid>,
    /// Status.
    pub status: Option<SessionStatus>,
}

/// Query parameters for the conflict report.
#[derive(Debug, Deserialize, Validate)]
pub struct ConflictsQuery {
    /// Window start.
    pub from: DateTime<Utc>,
    /// Window end.
    pub to: DateTime<Utc>,
    /// Only this trainer.
    pub trainer_id: Option<Uuid>,
}

/// Query parameters for the available trainer search.
#[derive(Debug, Deserialize, Validate)]
pub struct AvailableTrainersQuery {
    /// Slot start.
    pub start: DateTime<Utc>,
    /// Slot end.
    pub end: DateTime<Utc>,
    /// Skill term the trainer must list.
    pub skill: Option<String>,
    /// Require a declared `available` window covering the slot.
    #[serde(default)]
    pub require_declared: bool,
    /// Session being re-planned, ignored as a clash.
    pub exclude_session: Option<Uuid>,
}

/// One local day of the calendar.
#[derive(Debug, Serialize)]
pub struct CalendarDay {
    /// Local date.
    pub date: NaiveDate,
    /// Sessions starting that day, by start time.
    pub sessions: Vec<CalendarEntry>,
}

/// Calendar for a window.
#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    /// Timezone the days are expressed in.
    pub timezone: String,
    /// Window covered.
    pub window: TimeRange,
    /// Days with at least one session.
    pub days: Vec<CalendarDay>,
}

fn window(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<TimeRange, ApiError> {
    let range = TimeRange::new(from, to)?;
    if range.duration() > Duration::days(MAX_WINDOW_DAYS) {
        return Err(ApiError::validation(format!(
            "Planning window cannot exceed {MAX_WINDOW_DAYS} days"
        )));
    }
    Ok(range)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /planning/calendar - Sessions in a window, grouped by local day.
async fn get_calendar(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<CalendarQuery>,
) -> ApiResult<CalendarResponse> {
    let scope = auth.session_scope()?;
    let range = window(query.from, query.to)?;
    let timezone = query.tz.unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
    let tz = parse_timezone(&timezone)?;

    let filter = SessionFilter {
        school_id: query.school_id,
        trainer_id: query.trainer_id,
        module_id: query.module_id,
        status: query.status,
        ..SessionFilter::default()
    };
    let calendar_filter = CalendarFilter {
        school_id: query.school_id.map(Into::into),
        trainer_id: query.trainer_id.map(Into::into),
        module_id: query.module_id.map(Into::into),
        status: query.status,
    };

    let entries = PlanningRepository::new((*state.db).clone())
        .calendar(&range, &filter, scope)
        .await?;

    let days = group_by_day(entries, &range, &calendar_filter, tz)
        .into_iter()
        .map(|(date, sessions)| CalendarDay { date, sessions })
        .collect();

    Ok(ApiResponse::ok(CalendarResponse {
        timezone,
        window: range,
        days,
    }))
}

/// GET /planning/conflicts - Trainer clashes in a window.
///
/// Staff see every trainer; a trainer may check its own schedule.
async fn get_conflicts(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<ConflictsQuery>,
) -> ApiResult<Vec<ScheduleConflict>> {
    match query.trainer_id {
        Some(id) => auth.require_trainer_or_staff(id)?,
        None => auth.require_staff()?,
    }
    let range = window(query.from, query.to)?;

    let conflicts = PlanningRepository::new((*state.db).clone())
        .conflicts(&range, query.trainer_id)
        .await?;

    Ok(ApiResponse::ok(conflicts))
}

/// GET /planning/available-trainers - Active trainers free for a slot.
async fn get_available_trainers(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<AvailableTrainersQuery>,
) -> ApiResult<Vec<TrainerResponse>> {
    auth.require_staff()?;
    let slot = TimeRange::new(query.start, query.end)?;

    let candidates = TrainerRepository::new((*state.db).clone())
        .list_active(query.skill.as_deref())
        .await?;
    let ids: Vec<Uuid> = candidates.iter().map(|t| t.id).collect();

    let schedules = PlanningRepository::new((*state.db).clone())
        .trainer_schedules(&ids, &slot)
        .await?;

    let free: HashSet<Uuid> = available_trainers(
        &slot,
        &schedules,
        query.require_declared,
        query.exclude_session.map(Into::into),
    )
    .into_iter()
    .map(Into::into)
    .collect();

    Ok(ApiResponse::ok(
        candidates
            .into_iter()
            .filter(|t| free.contains(&t.id))
            .map(TrainerResponse::from)
            .collect(),
    ))
}
