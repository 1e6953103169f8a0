//! Training catalog routes.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::extractors::{
    ValidatedJson, ValidatedQuery, amount_in_range, clean, hours_in_range, non_blank,
};
use crate::response::{ApiResponse, ApiResult};
use crate::{AppState, middleware::AuthUser};
use classplan_core::catalog::{ModuleContent, PricingType};
use classplan_db::ModuleRepository;
use classplan_db::entities::modules;
use classplan_db::repositories::ModuleFilter;
use classplan_shared::types::{PageRequest, PageResponse};

/// Creates the module routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/modules", get(list_modules).post(create_module))
        .route(
            "/modules/{module_id}",
            get(get_module).patch(update_module).delete(delete_module),
        )
        .route("/modules/{module_id}/duplicate", post(duplicate_module))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a module.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateModuleRequest {
    /// Unique code.
    #[validate(custom(function = "non_blank"), length(max = 50))]
    pub code: String,
    /// Title.
    #[validate(custom(function = "non_blank"), length(max = 200))]
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Nominal duration in hours.
    #[validate(custom(function = "hours_in_range"))]
    pub duration_hours: Decimal,
    /// Billing model.
    pub pricing_type: PricingType,
    /// Price.
    #[validate(custom(function = "amount_in_range"))]
    pub price: Option<Decimal>,
    /// Learning objectives.
    #[serde(default)]
    pub objectives: Vec<String>,
    /// Prerequisites.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    /// RNCP code.
    #[validate(length(max = 32))]
    pub rncp_code: Option<String>,
    /// Free-form metadata.
    pub metadata: Option<serde_json::Value>,
    /// Skill terms.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Category terms.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Active flag, `true` when absent.
    pub is_active: Option<bool>,
}

impl From<CreateModuleRequest> for ModuleContent {
    fn from(r: CreateModuleRequest) -> Self {
        Self {
            code: r.code.trim().to_string(),
            title: r.title.trim().to_string(),
            description: clean(r.description),
            duration_hours: r.duration_hours,
            pricing_type: r.pricing_type,
            price: r.price,
            objectives: r.objectives,
            prerequisites: r.prerequisites,
            rncp_code: clean(r.rncp_code),
            metadata: r.metadata.unwrap_or_else(|| serde_json::json!({})),
            skills: r.skills,
            categories: r.categories,
            is_active: r.is_active.unwrap_or(true),
        }
    }
}

/// Request body for updating a module. Absent fields are kept.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateModuleRequest {
    /// Unique code.
    #[validate(custom(function = "non_blank"), length(max = 50))]
    pub code: Option<String>,
    /// Title.
    #[validate(custom(function = "non_blank"), length(max = 200))]
    pub title: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Nominal duration in hours.
    #[validate(custom(function = "hours_in_range"))]
    pub duration_hours: Option<Decimal>,
    /// Billing model.
    pub pricing_type: Option<PricingType>,
    /// Price.
    #[validate(custom(function = "amount_in_range"))]
    pub price: Option<Decimal>,
    /// Learning objectives.
    pub objectives: Option<Vec<String>>,
    /// Prerequisites.
    pub prerequisites: Option<Vec<String>>,
    /// RNCP code.
    #[validate(length(max = 32))]
    pub rncp_code: Option<String>,
    /// Free-form metadata.
    pub metadata: Option<serde_json::Value>,
    /// Skill terms.
    pub skills: Option<Vec<String>>,
    /// Category terms.
    pub categories: Option<Vec<String>>,
    /// Active flag.
    pub is_active: Option<bool>,
}

impl UpdateModuleRequest {
    /// Applies the set fields onto `content`.
    fn apply(self, mut content: ModuleContent) -> ModuleContent {
        if let Some(code) = self.code {
            content.code = code.trim().to_string();
        }
        if let Some(title) = self.title {
            content.title = title.trim().to_string();
        }
        if self.description.is_some() {
            content.description = clean(self.description);
        }
        if let Some(hours) = self.duration_hours {
            content.duration_hours = hours;
        }
        if let Some(pricing) = self.pricing_type {
            content.pricing_type = pricing;
        }
        if self.price.is_some() {
            content.price = self.price;
        }
        if let Some(objectives) = self.objectives {
            content.objectives = objectives;
        }
        if let Some(prerequisites) = self.prerequisites {
            content.prerequisites = prerequisites;
        }
        if self.rncp_code.is_some() {
            content.rncp_code = clean(self.rncp_code);
        }
        if let Some(metadata) = self.metadata {
            content.metadata = metadata;
        }
        if let Some(skills) = self.skills {
            content.skills = skills;
        }
        if let Some(categories) = self.categories {
            content.categories = categories;
        }
        if let Some(active) = self.is_active {
            content.is_active = active;
        }
        content
    }
}

/// Query parameters for listing modules.
#[derive(Debug, Deserialize, Validate)]
pub struct ListModulesQuery {
    /// Active flag.
    pub is_active: Option<bool>,
    /// Category term.
    pub category: Option<String>,
    /// Skill term.
    pub skill: Option<String>,
    /// Page number.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Module as returned by the API.
#[derive(Debug, Serialize)]
pub struct ModuleResponse {
    /// Id.
    pub id: Uuid,
    /// Unique code.
    pub code: String,
    /// Title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Nominal duration in hours.
    pub duration_hours: Decimal,
    /// Billing model.
    pub pricing_type: PricingType,
    /// Price.
    pub price: Option<Decimal>,
    /// Learning objectives.
    pub objectives: Vec<String>,
    /// Prerequisites.
    pub prerequisites: Vec<String>,
    /// RNCP code.
    pub rncp_code: Option<String>,
    /// Free-form metadata.
    pub metadata: serde_json::Value,
    /// Skill terms.
    pub skills: Vec<String>,
    /// Category terms.
    pub categories: Vec<String>,
    /// Active flag.
    pub is_active: bool,
    /// Created at.
    pub created_at: DateTime<FixedOffset>,
    /// Updated at.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<modules::Model> for ModuleResponse {
    fn from(m: modules::Model) -> Self {
        Self {
            id: m.id,
            code: m.code,
            title: m.title,
            description: m.description,
            duration_hours: m.duration_hours,
            pricing_type: m.pricing_type.into(),
            price: m.price,
            objectives: m.objectives,
            prerequisites: m.prerequisites,
            rncp_code: m.rncp_code,
            metadata: m.metadata,
            skills: m.skills,
            categories: m.categories,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /modules - List catalog modules.
async fn list_modules(
    State(state): State<AppState>,
    _auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<ListModulesQuery>,
) -> ApiResult<PageResponse<ModuleResponse>> {
    let page = PageRequest::from_query(query.page, query.per_page);
    let filter = ModuleFilter {
        is_active: query.is_active,
        category: clean(query.category),
        skill: clean(query.skill),
    };

    let (items, total) = ModuleRepository::new((*state.db).clone())
        .list(&filter, &page)
        .await?;

    Ok(ApiResponse::ok(
        PageResponse::new(items, &page, total).map(ModuleResponse::from),
    ))
}

/// POST /modules - Create a module.
async fn create_module(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateModuleRequest>,
) -> ApiResult<ModuleResponse> {
    auth.require_staff()?;

    let module = ModuleRepository::new((*state.db).clone())
        .create(payload.into())
        .await?;

    info!(module_id = %module.id, code = %module.code, "Module created");

    Ok(ApiResponse::created(module.into()))
}

/// GET `/modules/{module_id}` - Get a module.
async fn get_module(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(module_id): Path<Uuid>,
) -> ApiResult<ModuleResponse> {
    let module = ModuleRepository::new((*state.db).clone())
        .find_by_id(module_id)
        .await?;

    Ok(ApiResponse::ok(module.into()))
}

/// PATCH `/modules/{module_id}` - Update a module.
async fn update_module(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(module_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateModuleRequest>,
) -> ApiResult<ModuleResponse> {
    auth.require_staff()?;

    let repo = ModuleRepository::new((*state.db).clone());
    let current = repo.find_by_id(module_id).await?.content();
    let module = repo.update(module_id, payload.apply(current)).await?;
    state.report_cache.invalidate_all();

    info!(module_id = %module.id, user_id = %auth.user_id(), "Module updated");

    Ok(ApiResponse::ok(module.into()))
}

/// DELETE `/modules/{module_id}` - Delete a module no session uses.
async fn delete_module(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(module_id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    auth.require_admin()?;

    ModuleRepository::new((*state.db).clone())
        .delete(module_id)
        .await?;
    state.report_cache.invalidate_all();

    info!(module_id = %module_id, user_id = %auth.user_id(), "Module deleted");

    Ok(ApiResponse::ok(serde_json::json!({ "id": module_id })))
}

/// POST `/modules/{module_id}/duplicate` - Copy a module into a new inactive one.
async fn duplicate_module(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(module_id): Path<Uuid>,
) -> ApiResult<ModuleResponse> {
    auth.require_staff()?;

    let copy = ModuleRepository::new((*state.db).clone())
        .duplicate(module_id)
        .await?;
    state.report_cache.invalidate_all();

    Ok(ApiResponse::created(copy.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn content() -> ModuleContent {
        CreateModuleRequest {
            code: " PY-101 ".into(),
            title: "Python".into(),
            description: Some("  ".into()),
            duration_hours: dec!(3),
            pricing_type: PricingType::Hourly,
            price: Some(dec!(80)),
            objectives: vec!["loops".into()],
            prerequisites: vec![],
            rncp_code: None,
            metadata: None,
            skills: vec!["python".into()],
            categories: vec![],
            is_active: None,
        }
        .into()
    }

    #[test]
    fn test_create_request_defaults() {
        let content = content();
        assert_eq!(content.code, "PY-101");
        assert_eq!(content.description, None);
        assert!(content.is_active);
        assert_eq!(content.metadata, serde_json::json!({}));
    }

    #[test]
    fn test_update_keeps_absent_fields() {
        let patch = UpdateModuleRequest {
            title: Some(" Python 2 ".into()),
            is_active: Some(false),
            ..UpdateModuleRequest::default()
        };
        let updated = patch.apply(content());
        assert_eq!(updated.title, "Python 2");
        assert!(!updated.is_active);
        assert_eq!(updated.code, "PY-101");
        assert_eq!(updated.price, Some(dec!(80)));
        assert_eq!(updated.objectives, vec!["loops".to_string()]);
    }

    #[test]
    fn test_limits_follow_columns() {
        let fits = UpdateModuleRequest {
            rncp_code: Some("RNCP35584".into()),
            duration_hours: Some(dec!(999999.99)),
            price: Some(dec!(9999999999.99)),
            ..UpdateModuleRequest::default()
        };
        assert!(fits.validate().is_ok());

        let long_rncp = UpdateModuleRequest {
            rncp_code: Some("R".repeat(33)),
            ..UpdateModuleRequest::default()
        };
        assert!(long_rncp.validate().is_err());

        let huge_duration = UpdateModuleRequest {
            duration_hours: Some(dec!(1000000)),
            ..UpdateModuleRequest::default()
        };
        assert!(huge_duration.validate().is_err());

        let huge_price = UpdateModuleRequest {
            price: Some(dec!(10000000000)),
            ..UpdateModuleRequest::default()
        };
        assert!(huge_price.validate().is_err());
    }
}
