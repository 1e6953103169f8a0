//! Authentication middleware and role checks for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{AppState, ApiError};
use classplan_db::repositories::{FeedScope, SessionScope};
use classplan_shared::{Claims, JwtError, Role};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Authentication middleware that validates JWT tokens.
///
/// Valid claims are stored in the request extensions for [`AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return ApiError::unauthorized("Authorization header with Bearer token is required")
            .into_response();
    };

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(JwtError::Expired) => ApiError::unauthorized("Token has expired").into_response(),
        Err(_) => ApiError::unauthorized("Invalid or malformed token").into_response(),
    }
}

/// Extractor for authenticated user claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Returns the user ID from the claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.0.user_id()
    }

    /// Returns the user's role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.0.role
    }

    /// Returns the inner claims.
    #[must_use]
    pub const fn claims(&self) -> &Claims {
        &self.0
    }

    /// Staff or admin only.
    pub fn require_staff(&self) -> Result<(), ApiError> {
        if self.role().is_staff() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Staff role required"))
        }
    }

    /// Admin only.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role() == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin role required"))
        }
    }

    /// School of a school user.
    pub fn school_id(&self) -> Result<Uuid, ApiError> {
        match (self.role(), self.0.school) {
            (Role::School, Some(id)) => Ok(id),
            (Role::School, None) => Err(ApiError::forbidden("Token carries no school")),
            _ => Err(ApiError::forbidden("School role required")),
        }
    }

    /// Trainer profile of a trainer user.
    pub fn trainer_id(&self) -> Result<Uuid, ApiError> {
        match (self.role(), self.0.trainer) {
            (Role::Trainer, Some(id)) => Ok(id),
            (Role::Trainer, None) => Err(ApiError::forbidden("Token carries no trainer")),
            _ => Err(ApiError::forbidden("Trainer role required")),
        }
    }

    /// Sessions visible to the caller.
    pub fn session_scope(&self) -> Result<SessionScope, ApiError> {
        match self.role() {
            Role::Admin | Role::Staff => Ok(SessionScope::All),
            Role::School => self.school_id().map(SessionScope::School),
            Role::Trainer => self.trainer_id().map(SessionScope::Trainer),
        }
    }

    /// Notification feed of the caller.
    pub fn feed_scope(&self) -> Result<FeedScope, ApiError> {
        match self.role() {
            Role::Admin | Role::Staff => Ok(FeedScope::Staff),
            Role::School => self.school_id().map(FeedScope::School),
            Role::Trainer => self.trainer_id().map(FeedScope::Trainer),
        }
    }

    /// Staff, or the trainer owning `trainer_id`.
    pub fn require_trainer_or_staff(&self, trainer_id: Uuid) -> Result<(), ApiError> {
        if self.role().is_staff() || self.trainer_id().is_ok_and(|own| own == trainer_id) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Only staff or the trainer may do this"))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn user(role: Role) -> AuthUser {
        AuthUser(Claims::new(Uuid::new_v4(), role, Utc::now() + Duration::hours(1)))
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_staff_sees_everything() {
        let staff = user(Role::Staff);
        assert!(staff.require_staff().is_ok());
        assert!(staff.require_admin().is_err());
        assert_eq!(staff.session_scope().unwrap(), SessionScope::All);
        assert_eq!(staff.feed_scope().unwrap(), FeedScope::Staff);
    }

    #[test]
    fn test_school_scope_needs_school_claim() {
        let school = Uuid::new_v4();
        let scoped = AuthUser(user(Role::School).0.with_school(school));
        assert_eq!(scoped.session_scope().unwrap(), SessionScope::School(school));
        assert!(scoped.require_staff().is_err());

        let unscoped = user(Role::School);
        assert_eq!(unscoped.session_scope().unwrap_err().error.status_code(), 403);
    }

    #[test]
    fn test_trainer_owns_availabilities() {
        let trainer = Uuid::new_v4();
        let me = AuthUser(user(Role::Trainer).0.with_trainer(trainer));
        assert!(me.require_trainer_or_staff(trainer).is_ok());
        assert!(me.require_trainer_or_staff(Uuid::new_v4()).is_err());
        assert!(user(Role::Admin).require_trainer_or_staff(trainer).is_ok());
    }
}
