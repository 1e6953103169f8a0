//! Trainer availability routes.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, patch},
};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::extractors::{ValidatedJson, ValidatedQuery, clean};
use crate::response::{ApiResponse, ApiResult};
use crate::{AppState, middleware::AuthUser};
use classplan_core::scheduling::{AvailabilityType, TimeRange};
use classplan_db::AvailabilityRepository;
use classplan_db::entities::availabilities;
use classplan_db::repositories::AvailabilityInput;

/// Creates the availability routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/trainers/{trainer_id}/availabilities",
            get(list_availabilities).post(create_availability),
        )
        .route(
            "/availabilities/{availability_id}",
            patch(update_availability).delete(delete_availability),
        )
}

/// Request body for declaring or replacing a window.
#[derive(Debug, Deserialize, Validate)]
pub struct AvailabilityRequest {
    /// Start.
    pub start: DateTime<Utc>,
    /// End.
    pub end: DateTime<Utc>,
    /// Kind of window.
    pub availability_type: AvailabilityType,
    /// Free note.
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

impl From<AvailabilityRequest> for AvailabilityInput {
    fn from(r: AvailabilityRequest) -> Self {
        Self {
            start: r.start,
            end: r.end,
            kind: r.availability_type,
            note: clean(r.note),
        }
    }
}

/// Optional window for listing.
#[derive(Debug, Deserialize, Validate)]
pub struct WindowQuery {
    /// Windows ending after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Windows starting before this instant.
    pub to: Option<DateTime<Utc>>,
}

/// Availability window as returned by the API.
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    /// Id.
    pub id: Uuid,
    /// Trainer.
    pub trainer_id: Uuid,
    /// Start.
    pub start: DateTime<FixedOffset>,
    /// End.
    pub end: DateTime<FixedOffset>,
    /// Kind of window.
    pub availability_type: AvailabilityType,
    /// Free note.
    pub note: Option<String>,
}

impl From<availabilities::Model> for AvailabilityResponse {
    fn from(a: availabilities::Model) -> Self {
        Self {
            id: a.id,
            trainer_id: a.trainer_id,
            start: a.start_at,
            end: a.end_at,
            availability_type: a.availability_type.into(),
            note: a.note,
        }
    }
}

/// GET `/trainers/{trainer_id}/availabilities` - List a trainer's windows.
async fn list_availabilities(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trainer_id): Path<Uuid>,
    ValidatedQuery(query): ValidatedQuery<WindowQuery>,
) -> ApiResult<Vec<AvailabilityResponse>> {
    auth.require_trainer_or_staff(trainer_id)?;

    let window = match (query.from, query.to) {
        (Some(from), Some(to)) => Some(TimeRange::new(from, to)?),
        (None, None) => None,
        _ => {
            return Err(crate::ApiError::validation(
                "from and to must be given together",
            ));
        }
    };

    let rows = AvailabilityRepository::new((*state.db).clone())
        .list_for_trainer(trainer_id, window.as_ref())
        .await?;

    Ok(ApiResponse::ok(
        rows.into_iter().map(AvailabilityResponse::from).collect(),
    ))
}

/// POST `/trainers/{trainer_id}/availabilities` - Declare a window.
async fn create_availability(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trainer_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<AvailabilityRequest>,
) -> ApiResult<AvailabilityResponse> {
    auth.require_trainer_or_staff(trainer_id)?;

    let window = AvailabilityRepository::new((*state.db).clone())
        .create(trainer_id, payload.into())
        .await?;

    info!(availability_id = %window.id, trainer_id = %trainer_id, "Availability declared");

    Ok(ApiResponse::created(window.into()))
}

/// PATCH `/availabilities/{availability_id}` - Replace a window.
async fn update_availability(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(availability_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<AvailabilityRequest>,
) -> ApiResult<AvailabilityResponse> {
    let repo = AvailabilityRepository::new((*state.db).clone());
    let existing = repo.find_by_id(availability_id).await?;
    auth.require_trainer_or_staff(existing.trainer_id)?;

    let window = repo.update(availability_id, payload.into()).await?;

    info!(availability_id = %window.id, "Availability updated");

    Ok(ApiResponse::ok(window.into()))
}

/// DELETE `/availabilities/{availability_id}` - Remove a window.
async fn delete_availability(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(availability_id): Path<Uuid>,
) -> ApiResult<AvailabilityResponse> {
    let repo = AvailabilityRepository::new((*state.db).clone());
    let existing = repo.find_by_id(availability_id).await?;
    auth.require_trainer_or_staff(existing.trainer_id)?;

    let removed = repo.delete(availability_id).await?;

    info!(availability_id = %removed.id, trainer_id = %removed.trainer_id, "Availability removed");

    Ok(ApiResponse::ok(removed.into()))
}
