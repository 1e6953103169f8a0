//! Activity report routes.

use axum::{
    Router,
    extract::State,
    routing::get,
};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::extractors::ValidatedQuery;
use crate::response::{ApiResponse, ApiResult};
use crate::{ApiError, AppState, middleware::AuthUser};
use classplan_core::reports::{
    ActivityReport, PeriodKind, ReportCache, ReportFilter, ReportPeriod, ReportService,
};
use classplan_db::ReportRepository;
use classplan_db::entities::report_runs;
use classplan_shared::Role;

/// Creates the report routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/activity", get(get_activity_report))
        .route("/reports/runs", get(list_report_runs))
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Which window to report on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodParam {
    /// Monday to Sunday week around `date`.
    #[default]
    Week,
    /// Calendar month around `date`.
    Month,
    /// `start` to `end`, both inclusive.
    Custom,
}

/// Query parameters for the activity report.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ActivityQuery {
    /// Window kind.
    #[serde(default)]
    pub period: PeriodParam,
    /// Day inside the week or month; today when absent.
    pub date: Option<NaiveDate>,
    /// First day of a custom window.
    pub start: Option<NaiveDate>,
    /// Last day of a custom window.
    pub end: Option<NaiveDate>,
    /// Restrict to one school.
    pub school_id: Option<Uuid>,
    /// Restrict to one trainer.
    pub trainer_id: Option<Uuid>,
    /// Restrict to one module.
    pub module_id: Option<Uuid>,
}

impl ActivityQuery {
    fn period(&self, today: NaiveDate) -> Result<ReportPeriod, ApiError> {
        let date = self.date.unwrap_or(today);
        let period = match self.period {
            PeriodParam::Week => ReportPeriod::week_containing(date)?,
            PeriodParam::Month => ReportPeriod::month_containing(date)?,
            PeriodParam::Custom => match (self.start, self.end) {
                (Some(start), Some(end)) => ReportPeriod::new(start, end)?,
                _ => {
                    return Err(ApiError::validation(
                        "start and end are required for a custom period",
                    ));
                }
            },
        };
        Ok(period)
    }

    fn filter(&self) -> ReportFilter {
        ReportFilter {
            school_id: self.school_id.map(Into::into),
            trainer_id: self.trainer_id.map(Into::into),
            module_id: self.module_id.map(Into::into),
        }
    }
}

/// Query parameters for run history.
#[derive(Debug, Deserialize, Validate)]
pub struct RunsQuery {
    /// Number of runs, at most 100.
    pub limit: Option<u64>,
}

/// A scheduled report run.
#[derive(Debug, Serialize)]
pub struct ReportRunResponse {
    /// Id.
    pub id: Uuid,
    /// Weekly, monthly or custom.
    pub period_kind: PeriodKind,
    /// First day covered.
    pub period_start: NaiveDate,
    /// Last day covered.
    pub period_end: NaiveDate,
    /// Number of recipients.
    pub recipients: i32,
    /// Outcome.
    pub status: String,
    /// Failure detail.
    pub error: Option<String>,
    /// When the run happened.
    pub created_at: DateTime<FixedOffset>,
}

impl From<report_runs::Model> for ReportRunResponse {
    fn from(r: report_runs::Model) -> Self {
        Self {
            id: r.id,
            period_kind: r.period_kind.into(),
            period_start: r.period_start,
            period_end: r.period_end,
            recipients: r.recipients,
            status: r.status,
            error: r.error,
            created_at: r.created_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /reports/activity - Aggregated activity for a period.
///
/// Staff may filter freely. A school user always gets its own school.
async fn get_activity_report(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(mut query): ValidatedQuery<ActivityQuery>,
) -> ApiResult<ActivityReport> {
    match auth.role() {
        Role::Admin | Role::Staff => {}
        Role::School => query.school_id = Some(auth.school_id()?),
        Role::Trainer => {
            return Err(ApiError::forbidden("Reports are not available to trainers"));
        }
    }

    let period = query.period(Utc::now().date_naive())?;
    let filter = query.filter();

    let report = activity_report(
        &ReportRepository::new((*state.db).clone()),
        &state.report_cache,
        period,
        filter,
        state.settings.default_hourly_rate,
    )
    .await?;

    Ok(ApiResponse::ok(report))
}

/// GET /reports/runs - Recent scheduled report runs.
async fn list_report_runs(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<RunsQuery>,
) -> ApiResult<Vec<ReportRunResponse>> {
    auth.require_staff()?;

    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let runs = ReportRepository::new((*state.db).clone())
        .recent_runs(limit)
        .await?;

    Ok(ApiResponse::ok(
        runs.into_iter().map(ReportRunResponse::from).collect(),
    ))
}

/// Cached report for `period` and `filter`, computed on a miss.
pub async fn activity_report(
    repo: &ReportRepository,
    cache: &ReportCache,
    period: ReportPeriod,
    filter: ReportFilter,
    default_rate: rust_decimal::Decimal,
) -> Result<ActivityReport, ApiError> {
    let key = ReportCache::cache_key("activity", &period, &filter);
    if let Some(hit) = cache.get(&key) {
        debug!(period = %period.kind, start = %period.start, "Report cache hit");
        return Ok(hit);
    }

    let facts = repo.load_facts(&period, &filter).await?;
    let report = ReportService::summarize(period, filter, &facts, default_rate);
    cache.insert(&key, report.clone());

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 3, d).unwrap()
    }

    #[rstest]
    #[case(PeriodParam::Week, day(4), day(10))]
    #[case(PeriodParam::Month, day(1), day(31))]
    fn test_period_around_date(
        #[case] kind: PeriodParam,
        #[case] start: NaiveDate,
        #[case] end: NaiveDate,
    ) {
        let query = ActivityQuery {
            period: kind,
            date: Some(day(6)),
            ..ActivityQuery::default()
        };
        let period = query.period(day(20)).unwrap();
        assert_eq!((period.start, period.end), (start, end));
    }

    #[test]
    fn test_custom_period_needs_both_bounds() {
        let query = ActivityQuery {
            period: PeriodParam::Custom,
            start: Some(day(1)),
            ..ActivityQuery::default()
        };
        assert_eq!(query.period(day(20)).unwrap_err().error.status_code(), 400);
    }

    #[test]
    fn test_custom_period_rejects_reversed_bounds() {
        let query = ActivityQuery {
            period: PeriodParam::Custom,
            start: Some(day(10)),
            end: Some(day(1)),
            ..ActivityQuery::default()
        };
        assert!(query.period(day(20)).is_err());
    }

    #[test]
    fn test_date_defaults_to_today() {
        let period = ActivityQuery::default().period(day(20)).unwrap();
        assert!(period.start <= day(20) && day(20) <= period.end);
    }
}
