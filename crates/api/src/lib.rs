//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Authentication middleware and role checks
//! - Request extractors with validation
//! - JSON success and error envelopes
//! - Email delivery of session notifications

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod notifier;
pub mod response;
pub mod routes;

use axum::Router;
use classplan_core::notification::Notifier;
use classplan_core::reports::ReportCache;
use classplan_shared::{JwtService, ReportsConfig};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Planning and reporting settings resolved from configuration.
#[derive(Debug, Clone)]
pub struct PlanningSettings {
    /// Rate for negotiable or unpriced modules.
    pub default_hourly_rate: Decimal,
    /// Reject sessions that break school constraints instead of warning.
    pub strict_constraints: bool,
    /// Staff mailbox receiving school responses.
    pub staff_email: String,
}

impl PlanningSettings {
    /// Resolves settings from the reports section.
    pub fn from_config(
        reports: &ReportsConfig,
        staff_email: impl Into<String>,
    ) -> Result<Self, rust_decimal::Error> {
        Ok(Self {
            default_hourly_rate: Decimal::from_str(reports.default_hourly_rate.trim())?,
            strict_constraints: reports.strict_constraints,
            staff_email: staff_email.into(),
        })
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Delivery of session notifications.
    pub notifier: Arc<dyn Notifier>,
    /// Computed activity reports.
    pub report_cache: ReportCache,
    /// Planning settings.
    pub settings: Arc<PlanningSettings>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_settings_from_config() {
        let reports = ReportsConfig {
            default_hourly_rate: " 62.50 ".into(),
            strict_constraints: true,
            ..ReportsConfig::default()
        };
        let settings = PlanningSettings::from_config(&reports, "staff@provider.fr").unwrap();
        assert_eq!(settings.default_hourly_rate, dec!(62.50));
        assert!(settings.strict_constraints);
        assert_eq!(settings.staff_email, "staff@provider.fr");
    }

    #[test]
    fn test_settings_reject_bad_rate() {
        let reports = ReportsConfig {
            default_hourly_rate: "fifty".into(),
            ..ReportsConfig::default()
        };
        assert!(PlanningSettings::from_config(&reports, "").is_err());
    }
}
