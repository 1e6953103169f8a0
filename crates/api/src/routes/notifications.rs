//! Notification feed routes.
//!
//! Each caller reads the events addressed to its role: staff see staff
//! events, a school or trainer sees those for its own sessions.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::extractors::ValidatedQuery;
use crate::response::{ApiResponse, ApiResult};
use crate::{ApiError, AppState, middleware::AuthUser};
use classplan_core::notification::{EventKind, RecipientRole};
use classplan_db::EventRepository;
use classplan_db::entities::session_events;
use classplan_shared::types::{PageRequest, PageResponse};

/// Creates the notification routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/{event_id}/read", post(mark_read))
}

/// Query parameters for the feed.
#[derive(Debug, Deserialize, Validate)]
pub struct FeedQuery {
    /// Only unread events.
    #[serde(default)]
    pub unread_only: bool,
    /// Page number.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// An audit event as returned by the API.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    /// Id.
    pub id: Uuid,
    /// Session.
    pub session_id: Uuid,
    /// What happened.
    pub kind: EventKind,
    /// Who did it.
    pub actor: Uuid,
    /// Who it is addressed to.
    pub recipient: RecipientRole,
    /// Human-readable message.
    pub message: String,
    /// Structured details.
    pub payload: serde_json::Value,
    /// Read flag.
    pub is_read: bool,
    /// Created at.
    pub created_at: DateTime<FixedOffset>,
}

impl From<session_events::Model> for EventResponse {
    fn from(e: session_events::Model) -> Self {
        Self {
            id: e.id,
            session_id: e.session_id,
            kind: e.kind.into(),
            actor: e.actor,
            recipient: e.recipient.into(),
            message: e.message,
            payload: e.payload,
            is_read: e.is_read,
            created_at: e.created_at,
        }
    }
}

/// Unread counter.
#[derive(Debug, Serialize)]
pub struct UnreadCount {
    /// Unread events.
    pub unread: u64,
}

/// GET /notifications - The caller's feed, newest first.
async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<FeedQuery>,
) -> ApiResult<PageResponse<EventResponse>> {
    let page = PageRequest::from_query(query.page, query.per_page);

    let (items, total) = EventRepository::new((*state.db).clone())
        .list_for_recipient(auth.feed_scope()?, query.unread_only, &page)
        .await?;

    Ok(ApiResponse::ok(
        PageResponse::new(items, &page, total).map(EventResponse::from),
    ))
}

/// GET /notifications/unread-count - Number of unread events.
async fn unread_count(State(state): State<AppState>, auth: AuthUser) -> ApiResult<UnreadCount> {
    let unread = EventRepository::new((*state.db).clone())
        .unread_count(auth.feed_scope()?)
        .await?;

    Ok(ApiResponse::ok(UnreadCount { unread }))
}

/// POST `/notifications/{event_id}/read` - Mark one event read.
async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(event_id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let found = EventRepository::new((*state.db).clone())
        .mark_read(auth.feed_scope()?, event_id)
        .await?;

    if !found {
        return Err(ApiError::not_found(format!("Notification not found: {event_id}")));
    }

    Ok(ApiResponse::ok(serde_json::json!({ "id": event_id, "is_read": true })))
}

/// POST /notifications/read-all - Mark the whole feed read.
async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<serde_json::Value> {
    let updated = EventRepository::new((*state.db).clone())
        .mark_all_read(auth.feed_scope()?)
        .await?;

    Ok(ApiResponse::ok(serde_json::json!({ "updated": updated })))
}
