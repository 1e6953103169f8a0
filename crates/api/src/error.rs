//! Mapping of domain and repository errors onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::{Value, json};
use tracing::error;
use validator::ValidationErrors;

use classplan_core::reports::ReportError;
use classplan_core::scheduling::SchedulingError;
use classplan_core::session::SessionError;
use classplan_db::repositories::{
    AvailabilityError, BookingError, ModuleError, SchoolError, TrainerError,
};
use classplan_shared::AppError;

/// Error returned by every handler.
///
/// Renders as `{"success": false, "error": CODE, "message": "..."}`, with an
/// optional `details` value for conflicts and constraint violations.
#[derive(Debug)]
pub struct ApiError {
    /// Classified error.
    pub error: AppError,
    /// Structured context for the client.
    pub details: Option<Value>,
}

impl ApiError {
    /// Wraps an application error.
    #[must_use]
    pub const fn new(error: AppError) -> Self {
        Self {
            error,
            details: None,
        }
    }

    /// Attaches structured details.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// 401 with the given message.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(AppError::Unauthorized(message.into()))
    }

    /// 403 with the given message.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(AppError::Forbidden(message.into()))
    }

    /// 400 with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(AppError::Validation(message.into()))
    }

    /// 404 with the given message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(AppError::NotFound(message.into()))
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self::new(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.error.is_server_error() {
            error!(error = %self.error, code = self.error.error_code(), "Request failed");
        }

        let mut body = json!({
            "success": false,
            "error": self.error.error_code(),
            "message": self.error.public_message(),
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Error Mapping
// ============================================================================

impl From<DbErr> for ApiError {
    fn from(e: DbErr) -> Self {
        Self::new(AppError::Database(e.to_string()))
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(e: ValidationErrors) -> Self {
        let details = serde_json::to_value(e.field_errors()).unwrap_or(Value::Null);
        Self::validation(e.to_string()).with_details(details)
    }
}

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        Self::validation(e.to_string())
    }
}

impl From<SchedulingError> for ApiError {
    fn from(e: SchedulingError) -> Self {
        Self::validation(e.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        let message = e.to_string();
        match e {
            SessionError::InvalidTransition { .. }
            | SessionError::NotAwaitingResponse(_)
            | SessionError::NoCounterProposal
            | SessionError::NotEditable(_)
            | SessionError::NotDeletable(_)
            | SessionError::NotCompleted => Self::new(AppError::BusinessRule(message)),
            SessionError::InvalidTimeRange
            | SessionError::TooLong(_)
            | SessionError::NegativeHours(_)
            | SessionError::NonPositivePlannedHours(_)
            | SessionError::ReasonRequired
            | SessionError::InvalidSatisfaction(_) => Self::validation(message),
        }
    }
}

impl From<SchoolError> for ApiError {
    fn from(e: SchoolError) -> Self {
        let message = e.to_string();
        match e {
            SchoolError::NotFound(_) => Self::not_found(message),
            SchoolError::InvalidConstraints(_) => Self::validation(message),
            SchoolError::HasSessions(_) => Self::new(AppError::BusinessRule(message)),
            SchoolError::Corrupt(_) => Self::new(AppError::Internal(message)),
            SchoolError::Database(db) => db.into(),
        }
    }
}

impl From<ModuleError> for ApiError {
    fn from(e: ModuleError) -> Self {
        let message = e.to_string();
        match e {
            ModuleError::NotFound(_) => Self::not_found(message),
            ModuleError::DuplicateCode(_) => Self::new(AppError::Conflict(message)),
            ModuleError::Invalid(_) => Self::validation(message),
            ModuleError::InUse(_) => Self::new(AppError::BusinessRule(message)),
            ModuleError::Database(db) => db.into(),
        }
    }
}

impl From<TrainerError> for ApiError {
    fn from(e: TrainerError) -> Self {
        let message = e.to_string();
        match e {
            TrainerError::NotFound(_) => Self::not_found(message),
            TrainerError::UserTaken(_) => Self::new(AppError::Conflict(message)),
            TrainerError::Database(db) => db.into(),
        }
    }
}

impl From<AvailabilityError> for ApiError {
    fn from(e: AvailabilityError) -> Self {
        let message = e.to_string();
        match e {
            AvailabilityError::NotFound(_) | AvailabilityError::TrainerNotFound(_) => {
                Self::not_found(message)
            }
            AvailabilityError::InvalidRange(inner) => inner.into(),
            AvailabilityError::Overlap(ids) => {
                Self::new(AppError::Conflict(message)).with_details(json!({ "overlaps": ids }))
            }
            AvailabilityError::Database(db) => db.into(),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(e: BookingError) -> Self {
        let message = e.to_string();
        match e {
            BookingError::SessionNotFound(_)
            | BookingError::SchoolNotFound(_)
            | BookingError::ModuleNotFound(_)
            | BookingError::TrainerNotFound(_) => Self::not_found(message),
            BookingError::ModuleInactive(_) | BookingError::TrainerInactive(_) => {
                Self::new(AppError::BusinessRule(message))
            }
            BookingError::Session(inner) => inner.into(),
            BookingError::Scheduling(inner) => inner.into(),
            BookingError::TrainerConflict(conflicts) => Self::new(AppError::Conflict(message))
                .with_details(json!({ "conflicts": conflicts })),
            BookingError::ConstraintViolations(violations) => {
                let messages: Vec<String> = violations.iter().map(|v| v.message()).collect();
                Self::new(AppError::BusinessRule(message)).with_details(json!({
                    "violations": violations,
                    "messages": messages,
                }))
            }
            BookingError::Constraint(_) => Self::new(AppError::Internal(message)),
            BookingError::Database(db) => db.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classplan_core::catalog::CatalogError;
    use http_body_util::BodyExt;
    use rstest::rstest;
    use uuid::Uuid;

    async fn body_of(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let response = ApiError::not_found("Session not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_of(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "NOT_FOUND");
        assert_eq!(body["message"], "Not found: Session not found");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_database_error_is_hidden() {
        let response = ApiError::from(DbErr::Custom("password leaked".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(response).await;
        assert_eq!(body["error"], "DATABASE_ERROR");
        assert_eq!(body["message"], "An error occurred");
    }

    #[tokio::test]
    async fn test_conflict_carries_details() {
        let id = Uuid::new_v4();
        let response = ApiError::from(AvailabilityError::Overlap(vec![id])).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_of(response).await;
        assert_eq!(body["details"]["overlaps"][0], id.to_string());
    }

    #[rstest]
    #[case(BookingError::SessionNotFound(Uuid::nil()), 404)]
    #[case(BookingError::ModuleInactive(Uuid::nil()), 422)]
    #[case(BookingError::TrainerConflict(vec![]), 409)]
    #[case(BookingError::Session(SessionError::NoCounterProposal), 422)]
    #[case(BookingError::Session(SessionError::ReasonRequired), 400)]
    #[case(BookingError::Session(SessionError::TooLong(31)), 400)]
    #[case(BookingError::Scheduling(SchedulingError::InvalidTimeRange), 400)]
    #[case(BookingError::Scheduling(SchedulingError::InvalidTimezone("Mars/Olympus".into())), 400)]
    #[case(BookingError::Constraint("bad timezone".into()), 500)]
    fn test_booking_error_status(#[case] err: BookingError, #[case] status: u16) {
        assert_eq!(ApiError::from(err).error.status_code(), status);
    }

    #[rstest]
    #[case(ModuleError::DuplicateCode("PY-101".into()), 409)]
    #[case(ModuleError::InUse(3), 422)]
    #[case(ModuleError::NotFound(Uuid::nil()), 404)]
    #[case(ModuleError::Invalid(CatalogError::TooLong { field: "code", max: 64 }), 400)]
    fn test_module_error_status(#[case] err: ModuleError, #[case] status: u16) {
        assert_eq!(ApiError::from(err).error.status_code(), status);
    }
}
