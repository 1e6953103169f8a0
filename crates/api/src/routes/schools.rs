//! School management routes.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, put},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::extractors::{ValidatedJson, ValidatedQuery, clean, non_blank};
use crate::response::{ApiResponse, ApiResult};
use crate::{AppState, middleware::AuthUser};
use classplan_core::school::{Contact, PartnerStatus, SchoolConstraints, SchoolType};
use classplan_db::SchoolRepository;
use classplan_db::entities::schools;
use classplan_db::repositories::{CreateSchoolInput, SchoolFilter, UpdateSchoolInput};
use classplan_shared::types::{PageRequest, PageResponse};

/// Creates the school routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools", get(list_schools).post(create_school))
        .route(
            "/schools/{school_id}",
            get(get_school).patch(update_school).delete(delete_school),
        )
        .route("/schools/{school_id}/constraints", put(update_constraints))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// A school contact.
#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    /// Full name.
    #[validate(custom(function = "non_blank"), length(max = 200))]
    pub name: String,
    /// Position.
    pub role: Option<String>,
    /// Email address.
    #[validate(email)]
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
}

impl From<ContactRequest> for Contact {
    fn from(c: ContactRequest) -> Self {
        Self {
            name: c.name.trim().to_string(),
            role: clean(c.role),
            email: clean(c.email),
            phone: clean(c.phone),
        }
    }
}

/// Request body for creating a school.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSchoolRequest {
    /// Name.
    #[validate(custom(function = "non_blank"), length(max = 200))]
    pub name: String,
    /// Classification.
    pub school_type: SchoolType,
    /// Street address.
    pub address: Option<String>,
    /// City.
    #[validate(length(max = 255))]
    pub city: Option<String>,
    /// Contacts.
    #[serde(default)]
    #[validate(nested)]
    pub contacts: Vec<ContactRequest>,
    /// Partnership status, `prospect` when absent.
    pub status: Option<PartnerStatus>,
    /// Free notes.
    pub notes: Option<String>,
    /// Calendar constraints.
    pub constraints: Option<SchoolConstraints>,
}

/// Request body for updating a school.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSchoolRequest {
    /// Name.
    #[validate(custom(function = "non_blank"), length(max = 200))]
    pub name: Option<String>,
    /// Classification.
    pub school_type: Option<SchoolType>,
    /// Street address.
    pub address: Option<String>,
    /// City.
    #[validate(length(max = 255))]
    pub city: Option<String>,
    /// Contacts, replaced as a whole.
    #[validate(nested)]
    pub contacts: Option<Vec<ContactRequest>>,
    /// Partnership status.
    pub status: Option<PartnerStatus>,
    /// Free notes.
    pub notes: Option<String>,
}

/// Request body for replacing calendar constraints.
#[derive(Debug, Deserialize, Validate)]
pub struct ConstraintsRequest {
    /// New constraints.
    #[serde(flatten)]
    pub constraints: SchoolConstraints,
}

/// Query parameters for listing schools.
#[derive(Debug, Deserialize, Validate)]
pub struct ListSchoolsQuery {
    /// Partnership status.
    pub status: Option<PartnerStatus>,
    /// Classification.
    pub school_type: Option<SchoolType>,
    /// Name or city contains.
    pub search: Option<String>,
    /// Page number.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// School as returned by the API.
#[derive(Debug, Serialize)]
pub struct SchoolResponse {
    /// Id.
    pub id: Uuid,
    /// Name.
    pub name: String,
    /// Classification.
    pub school_type: SchoolType,
    /// Street address.
    pub address: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Contacts.
    pub contacts: Vec<Contact>,
    /// Partnership status.
    pub status: PartnerStatus,
    /// Free notes.
    pub notes: Option<String>,
    /// Calendar constraints; `null` when the stored value is unreadable.
    pub constraints: Option<SchoolConstraints>,
    /// Created at.
    pub created_at: DateTime<FixedOffset>,
    /// Updated at.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<schools::Model> for SchoolResponse {
    fn from(school: schools::Model) -> Self {
        let contacts = school.contact_list();
        let constraints = school.constraints().ok();
        Self {
            id: school.id,
            name: school.name,
            school_type: school.school_type.into(),
            address: school.address,
            city: school.city,
            contacts,
            status: school.status.into(),
            notes: school.notes,
            constraints,
            created_at: school.created_at,
            updated_at: school.updated_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /schools - List schools.
async fn list_schools(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<ListSchoolsQuery>,
) -> ApiResult<PageResponse<SchoolResponse>> {
    auth.require_staff()?;

    let page = PageRequest::from_query(query.page, query.per_page);
    let filter = SchoolFilter {
        status: query.status,
        school_type: query.school_type,
        search: clean(query.search),
    };

    let (items, total) = SchoolRepository::new((*state.db).clone())
        .list(&filter, &page)
        .await?;

    Ok(ApiResponse::ok(
        PageResponse::new(items, &page, total).map(SchoolResponse::from),
    ))
}

/// POST /schools - Create a school.
async fn create_school(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateSchoolRequest>,
) -> ApiResult<SchoolResponse> {
    auth.require_staff()?;

    let input = CreateSchoolInput {
        name: payload.name.trim().to_string(),
        school_type: payload.school_type,
        address: clean(payload.address),
        city: clean(payload.city),
        contacts: payload.contacts.into_iter().map(Contact::from).collect(),
        status: payload.status.unwrap_or(PartnerStatus::Prospect),
        notes: clean(payload.notes),
        constraints: payload.constraints,
    };

    let school = SchoolRepository::new((*state.db).clone())
        .create(input)
        .await?;

    info!(school_id = %school.id, name = %school.name, user_id = %auth.user_id(), "School created");

    Ok(ApiResponse::created(school.into()))
}

/// GET `/schools/{school_id}` - Get a school.
///
/// A school user may only read its own record.
async fn get_school(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
) -> ApiResult<SchoolResponse> {
    if !auth.role().is_staff() && auth.school_id()? != school_id {
        return Err(crate::ApiError::forbidden("Not your school"));
    }

    let school = SchoolRepository::new((*state.db).clone())
        .find_by_id(school_id)
        .await?;

    Ok(ApiResponse::ok(school.into()))
}

/// PATCH `/schools/{school_id}` - Update a school.
async fn update_school(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateSchoolRequest>,
) -> ApiResult<SchoolResponse> {
    auth.require_staff()?;

    let input = UpdateSchoolInput {
        name: payload.name.map(|n| n.trim().to_string()),
        school_type: payload.school_type,
        address: clean(payload.address),
        city: clean(payload.city),
        contacts: payload
            .contacts
            .map(|list| list.into_iter().map(Contact::from).collect()),
        status: payload.status,
        notes: clean(payload.notes),
    };

    let school = SchoolRepository::new((*state.db).clone())
        .update(school_id, input)
        .await?;
    state.report_cache.invalidate_all();

    info!(school_id = %school.id, user_id = %auth.user_id(), "School updated");

    Ok(ApiResponse::ok(school.into()))
}

/// PUT `/schools/{school_id}/constraints` - Replace calendar constraints.
async fn update_constraints(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    ValidatedJson(ConstraintsRequest { constraints }): ValidatedJson<ConstraintsRequest>,
) -> ApiResult<SchoolResponse> {
    auth.require_staff()?;

    let school = SchoolRepository::new((*state.db).clone())
        .update_constraints(school_id, &constraints)
        .await?;

    info!(school_id = %school.id, timezone = %constraints.timezone, "School constraints updated");

    Ok(ApiResponse::ok(school.into()))
}

/// DELETE `/schools/{school_id}` - Delete a school without sessions.
async fn delete_school(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    auth.require_admin()?;

    SchoolRepository::new((*state.db).clone())
        .delete(school_id)
        .await?;
    state.report_cache.invalidate_all();

    info!(school_id = %school_id, user_id = %auth.user_id(), "School deleted");

    Ok(ApiResponse::ok(serde_json::json!({ "id": school_id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_validation() {
        let payload: CreateSchoolRequest = serde_json::from_value(serde_json::json!({
            "name": "  ",
            "school_type": "high",
            "contacts": [{ "name": "Mme Roux", "email": "not-an-email" }]
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        let fields = errors.errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("contacts"));
    }

    #[test]
    fn test_contact_is_cleaned() {
        let contact = Contact::from(ContactRequest {
            name: " Mme Roux ".into(),
            role: Some("  ".into()),
            email: Some(" roux@lycee.fr ".into()),
            phone: None,
        });
        assert_eq!(contact.name, "Mme Roux");
        assert_eq!(contact.role, None);
        assert_eq!(contact.email.as_deref(), Some("roux@lycee.fr"));
    }
}
