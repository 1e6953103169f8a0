//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod availabilities;
pub mod health;
pub mod modules;
pub mod notifications;
pub mod planning;
pub mod reports;
pub mod schools;
pub mod sessions;
pub mod trainers;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(schools::routes())
        .merge(modules::routes())
        .merge(trainers::routes())
        .merge(availabilities::routes())
        .merge(sessions::routes())
        .merge(planning::routes())
        .merge(reports::routes())
        .merge(notifications::routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}
