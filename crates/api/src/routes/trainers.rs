//! Trainer management routes.

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::extractors::{ValidatedJson, ValidatedQuery, amount_in_range, clean, non_blank};
use crate::response::{ApiResponse, ApiResult};
use crate::{AppState, middleware::AuthUser};
use classplan_db::TrainerRepository;
use classplan_db::entities::trainers;
use classplan_db::repositories::{CreateTrainerInput, TrainerFilter, UpdateTrainerInput};
use classplan_shared::types::{PageRequest, PageResponse};

/// Creates the trainer routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trainers", get(list_trainers).post(create_trainer))
        .route(
            "/trainers/{trainer_id}",
            get(get_trainer)
                .patch(update_trainer)
                .delete(deactivate_trainer),
        )
}

/// Request body for creating a trainer.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTrainerRequest {
    /// Linked user account.
    pub user_id: Option<Uuid>,
    /// Full name.
    #[validate(custom(function = "non_blank"), length(max = 200))]
    pub full_name: String,
    /// Email.
    #[validate(email, length(max = 255))]
    pub email: String,
    /// Phone.
    #[validate(length(max = 64))]
    pub phone: Option<String>,
    /// Skill terms.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Hourly rate.
    #[validate(custom(function = "amount_in_range"))]
    pub hourly_rate: Option<Decimal>,
}

/// Request body for updating a trainer.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTrainerRequest {
    /// Full name.
    #[validate(custom(function = "non_blank"), length(max = 200))]
    pub full_name: Option<String>,
    /// Email.
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    /// Phone.
    #[validate(length(max = 64))]
    pub phone: Option<String>,
    /// Skill terms.
    pub skills: Option<Vec<String>>,
    /// Hourly rate.
    #[validate(custom(function = "amount_in_range"))]
    pub hourly_rate: Option<Decimal>,
    /// Active flag.
    pub is_active: Option<bool>,
}

/// Query parameters for listing trainers.
#[derive(Debug, Deserialize, Validate)]
pub struct ListTrainersQuery {
    /// Include deactivated trainers.
    #[serde(default)]
    pub include_inactive: bool,
    /// Skill term.
    pub skill: Option<String>,
    /// Page number.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Trainer as returned by the API.
#[derive(Debug, Serialize)]
pub struct TrainerResponse {
    /// Id.
    pub id: Uuid,
    /// Linked user account.
    pub user_id: Option<Uuid>,
    /// Full name.
    pub full_name: String,
    /// Email.
    pub email: String,
    /// Phone.
    pub phone: Option<String>,
    /// Skill terms.
    pub skills: Vec<String>,
    /// Hourly rate.
    pub hourly_rate: Option<Decimal>,
    /// Active flag.
    pub is_active: bool,
    /// Created at.
    pub created_at: DateTime<FixedOffset>,
}

impl From<trainers::Model> for TrainerResponse {
    fn from(t: trainers::Model) -> Self {
        Self {
            id: t.id,
            user_id: t.user_id,
            full_name: t.full_name,
            email: t.email,
            phone: t.phone,
            skills: t.skills,
            hourly_rate: t.hourly_rate,
            is_active: t.is_active,
            created_at: t.created_at,
        }
    }
}

/// GET /trainers - List trainers.
async fn list_trainers(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<ListTrainersQuery>,
) -> ApiResult<PageResponse<TrainerResponse>> {
    auth.require_staff()?;

    let page = PageRequest::from_query(query.page, query.per_page);
    let filter = TrainerFilter {
        include_inactive: query.include_inactive,
        skill: clean(query.skill),
    };

    let (items, total) = TrainerRepository::new((*state.db).clone())
        .list(&filter, &page)
        .await?;

    Ok(ApiResponse::ok(
        PageResponse::new(items, &page, total).map(TrainerResponse::from),
    ))
}

/// POST /trainers - Create a trainer.
async fn create_trainer(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateTrainerRequest>,
) -> ApiResult<TrainerResponse> {
    auth.require_staff()?;

    let trainer = TrainerRepository::new((*state.db).clone())
        .create(CreateTrainerInput {
            user_id: payload.user_id,
            full_name: payload.full_name.trim().to_string(),
            email: payload.email.trim().to_string(),
            phone: clean(payload.phone),
            skills: payload.skills,
            hourly_rate: payload.hourly_rate,
        })
        .await?;

    info!(trainer_id = %trainer.id, "Trainer created");

    Ok(ApiResponse::created(trainer.into()))
}

/// GET `/trainers/{trainer_id}` - Get a trainer (staff or the trainer).
async fn get_trainer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trainer_id): Path<Uuid>,
) -> ApiResult<TrainerResponse> {
    auth.require_trainer_or_staff(trainer_id)?;

    let trainer = TrainerRepository::new((*state.db).clone())
        .find_by_id(trainer_id)
        .await?;

    Ok(ApiResponse::ok(trainer.into()))
}

/// PATCH `/trainers/{trainer_id}` - Update a trainer.
async fn update_trainer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trainer_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateTrainerRequest>,
) -> ApiResult<TrainerResponse> {
    auth.require_staff()?;

    let trainer = TrainerRepository::new((*state.db).clone())
        .update(
            trainer_id,
            UpdateTrainerInput {
                full_name: payload.full_name.map(|n| n.trim().to_string()),
                email: payload.email.map(|e| e.trim().to_string()),
                phone: clean(payload.phone),
                skills: payload.skills,
                hourly_rate: payload.hourly_rate,
                is_active: payload.is_active,
            },
        )
        .await?;
    state.report_cache.invalidate_all();

    info!(trainer_id = %trainer.id, user_id = %auth.user_id(), "Trainer updated");

    Ok(ApiResponse::ok(trainer.into()))
}

/// DELETE `/trainers/{trainer_id}` - Deactivate a trainer.
///
/// The record stays so past sessions keep their trainer.
async fn deactivate_trainer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trainer_id): Path<Uuid>,
) -> ApiResult<TrainerResponse> {
    auth.require_staff()?;

    let trainer = TrainerRepository::new((*state.db).clone())
        .deactivate(trainer_id)
        .await?;
    state.report_cache.invalidate_all();

    info!(trainer_id = %trainer.id, user_id = %auth.user_id(), "Trainer deactivated");

    Ok(ApiResponse::ok(trainer.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn create(email: &str, phone: Option<String>, rate: &str) -> CreateTrainerRequest {
        serde_json::from_value(serde_json::json!({
            "full_name": "Amina Diallo",
            "email": email,
            "phone": phone,
            "hourly_rate": rate,
        }))
        .unwrap()
    }

    #[rstest]
    #[case::fits("amina@trainers.local", Some("+33 6 12 34 56 78".into()), "55", true)]
    #[case::long_phone("amina@trainers.local", Some("0".repeat(65)), "55", false)]
    #[case::huge_rate("amina@trainers.local", None, "10000000000", false)]
    fn test_create_limits(
        #[case] email: &str,
        #[case] phone: Option<String>,
        #[case] rate: &str,
        #[case] valid: bool,
    ) {
        assert_eq!(create(email, phone, rate).validate().is_ok(), valid);
    }

    #[test]
    fn test_email_fits_the_column() {
        let domain = format!("{}local", format!("{}.", "d".repeat(59)).repeat(4));
        let email = format!("{}@{domain}", "a".repeat(60));
        assert!(email.len() > 255);
        assert!(create(&email, None, "55").validate().is_err());
        assert!(create("a@trainers.local", None, "55").validate().is_ok());
    }
}
