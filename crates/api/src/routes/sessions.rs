//! Session planning and workflow routes.
//!
//! Every write appends audit events, sends their notifications in the
//! background and drops cached reports.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::extractors::{ValidatedJson, ValidatedQuery, clean, hours_in_range, non_blank};
use crate::notifier::dispatch;
use crate::response::{ApiResponse, ApiResult};
use crate::routes::notifications::EventResponse;
use crate::{ApiError, AppState, middleware::AuthUser};
use classplan_core::notification::NotificationEvent;
use classplan_core::school::ConstraintViolation;
use classplan_core::session::{CounterProposal, ProposalResponse, SessionStatus};
use classplan_db::entities::sessions;
use classplan_db::repositories::{
    CreateSessionInput, SessionFilter, SessionParties, SessionScope, SessionWrite,
    TransitionOutcome, UpdateSessionInput,
};
use classplan_db::{EventRepository, SessionRepository, WorkflowRepository};
use classplan_shared::Role;
use classplan_shared::types::{PageRequest, PageResponse};

/// Creates the session routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(list_sessions).post(create_session))
        .route(
            "/sessions/{session_id}",
            get(get_session).patch(update_session).delete(delete_session),
        )
        .route("/sessions/{session_id}/confirm", post(confirm_session))
        .route("/sessions/{session_id}/start", post(start_session))
        .route("/sessions/{session_id}/complete", post(complete_session))
        .route("/sessions/{session_id}/cancel", post(cancel_session))
        .route("/sessions/{session_id}/apply-counter", post(apply_counter))
        .route("/sessions/{session_id}/respond", post(respond_to_session))
        .route("/sessions/{session_id}/assign-trainer", post(assign_trainer))
        .route("/sessions/{session_id}/satisfaction", put(record_satisfaction))
        .route("/sessions/{session_id}/events", get(list_session_events))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for proposing a session.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionRequest {
    /// School.
    pub school_id: Uuid,
    /// Module.
    pub module_id: Uuid,
    /// Trainer, if already chosen.
    pub trainer_id: Option<Uuid>,
    /// Start.
    pub start: DateTime<Utc>,
    /// End.
    pub end: DateTime<Utc>,
    /// Planned hours; the module duration when absent.
    #[validate(custom(function = "hours_in_range"))]
    pub hours_planned: Option<Decimal>,
    /// Room or address.
    #[validate(length(max = 300))]
    pub location: Option<String>,
    /// Class or group.
    #[validate(length(max = 100))]
    pub group_name: Option<String>,
    /// Free notes.
    pub notes: Option<String>,
    /// Book the trainer even when busy.
    #[serde(default)]
    pub force: bool,
}

/// Request body for editing a session. Absent fields are kept.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSessionRequest {
    /// New start.
    pub start: Option<DateTime<Utc>>,
    /// New end.
    pub end: Option<DateTime<Utc>>,
    /// Planned hours.
    #[validate(custom(function = "hours_in_range"))]
    pub hours_planned: Option<Decimal>,
    /// Room or address.
    #[validate(length(max = 300))]
    pub location: Option<String>,
    /// Class or group.
    #[validate(length(max = 100))]
    pub group_name: Option<String>,
    /// Free notes.
    pub notes: Option<String>,
    /// Keep the trainer even when the new slot clashes.
    #[serde(default)]
    pub force: bool,
}

/// Request body for closing a session.
#[derive(Debug, Deserialize, Validate)]
pub struct CompleteRequest {
    /// Hours actually delivered.
    #[validate(custom(function = "hours_in_range"))]
    pub hours_realized: Decimal,
}

/// Request body for cancelling a session.
#[derive(Debug, Deserialize, Validate)]
pub struct CancelRequest {
    /// Why the session is called off.
    #[validate(custom(function = "non_blank"), length(max = 1000))]
    pub reason: String,
}

/// Request body for a school's answer.
#[derive(Debug, Deserialize, Validate)]
pub struct RespondRequest {
    /// Accept, counter or reject.
    #[serde(flatten)]
    pub response: ProposalResponse,
}

/// Request body for assigning a trainer.
#[derive(Debug, Deserialize, Validate)]
pub struct AssignTrainerRequest {
    /// Trainer to book.
    pub trainer_id: Uuid,
    /// Book the trainer even when busy.
    #[serde(default)]
    pub force: bool,
}

/// Request body for a satisfaction score.
#[derive(Debug, Deserialize, Validate)]
pub struct SatisfactionRequest {
    /// Score from 1 to 5.
    #[validate(range(min = 1, max = 5))]
    pub score: i16,
}

/// Query parameters for listing sessions.
#[derive(Debug, Deserialize, Validate)]
pub struct ListSessionsQuery {
    /// School.
    pub school_id: Option<Uuid>,
    /// Trainer.
    pub trainer_id: Option<Uuid>,
    /// Module.
    pub module_id: Option<Uuid>,
    /// Status.
    pub status: Option<SessionStatus>,
    /// Sessions ending after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Sessions starting before this instant.
    pub to: Option<DateTime<Utc>>,
    /// Page number.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Session as returned by the API.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Id.
    pub id: Uuid,
    /// School.
    pub school_id: Uuid,
    /// Module.
    pub module_id: Uuid,
    /// Trainer.
    pub trainer_id: Option<Uuid>,
    /// Start.
    pub start: DateTime<FixedOffset>,
    /// End.
    pub end: DateTime<FixedOffset>,
    /// Planned hours.
    pub hours_planned: Decimal,
    /// Realized hours.
    pub hours_realized: Option<Decimal>,
    /// Room or address.
    pub location: Option<String>,
    /// Class or group.
    pub group_name: Option<String>,
    /// Free notes.
    pub notes: Option<String>,
    /// Status.
    pub status: SessionStatus,
    /// Satisfaction score.
    pub satisfaction: Option<i16>,
    /// Pending counter-proposal from the school.
    pub counter_proposal: Option<CounterProposal>,
    /// Cancellation or rejection reason.
    pub cancel_reason: Option<String>,
    /// Confirmed at.
    pub confirmed_at: Option<DateTime<FixedOffset>>,
    /// Completed at.
    pub completed_at: Option<DateTime<FixedOffset>>,
    /// Created by.
    pub created_by: Uuid,
    /// Created at.
    pub created_at: DateTime<FixedOffset>,
    /// Updated at.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<sessions::Model> for SessionResponse {
    fn from(s: sessions::Model) -> Self {
        let status = s.core_status();
        let counter_proposal = s.counter_proposal();
        Self {
            id: s.id,
            school_id: s.school_id,
            module_id: s.module_id,
            trainer_id: s.trainer_id,
            start: s.start_at,
            end: s.end_at,
            hours_planned: s.hours_planned,
            hours_realized: s.hours_realized,
            location: s.location,
            group_name: s.group_name,
            notes: s.notes,
            status,
            satisfaction: s.satisfaction,
            counter_proposal,
            cancel_reason: s.cancel_reason,
            confirmed_at: s.confirmed_at,
            completed_at: s.completed_at,
            created_by: s.created_by,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// A session write with the school calendar warnings it raised.
#[derive(Debug, Serialize)]
pub struct SessionWriteResponse {
    /// The stored session.
    pub session: SessionResponse,
    /// Constraint violations accepted as warnings.
    pub warnings: Vec<ConstraintViolation>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /sessions - List sessions visible to the caller.
async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<ListSessionsQuery>,
) -> ApiResult<PageResponse<SessionResponse>> {
    let scope = auth.session_scope()?;
    let page = PageRequest::from_query(query.page, query.per_page);
    let filter = SessionFilter {
        school_id: query.school_id,
        trainer_id: query.trainer_id,
        module_id: query.module_id,
        status: query.status,
        from: query.from,
        to: query.to,
    };

    let (items, total) = SessionRepository::new((*state.db).clone())
        .list(&filter, scope, &page)
        .await?;

    Ok(ApiResponse::ok(
        PageResponse::new(items, &page, total).map(SessionResponse::from),
    ))
}

/// POST /sessions - Propose a session.
async fn create_session(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateSessionRequest>,
) -> ApiResult<SessionWriteResponse> {
    auth.require_staff()?;

    let input = CreateSessionInput {
        school_id: payload.school_id,
        module_id: payload.module_id,
        trainer_id: payload.trainer_id,
        start: payload.start,
        end: payload.end,
        hours_planned: payload.hours_planned,
        location: clean(payload.location),
        group_name: clean(payload.group_name),
        notes: clean(payload.notes),
    };

    let write = SessionRepository::new((*state.db).clone())
        .create(
            input,
            auth.user_id(),
            state.settings.strict_constraints,
            payload.force,
        )
        .await?;

    Ok(ApiResponse::created(finish_write(&state, write)))
}

/// GET `/sessions/{session_id}` - Get a session.
async fn get_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> ApiResult<SessionResponse> {
    let session = SessionRepository::new((*state.db).clone())
        .find_by_id(session_id, auth.session_scope()?)
        .await?;

    Ok(ApiResponse::ok(session.into()))
}

/// PATCH `/sessions/{session_id}` - Edit a proposed or confirmed session.
async fn update_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateSessionRequest>,
) -> ApiResult<SessionWriteResponse> {
    auth.require_staff()?;

    let input = UpdateSessionInput {
        start: payload.start,
        end: payload.end,
        hours_planned: payload.hours_planned,
        location: clean(payload.location),
        group_name: clean(payload.group_name),
        notes: clean(payload.notes),
    };

    let write = SessionRepository::new((*state.db).clone())
        .update(
            session_id,
            input,
            auth.user_id(),
            state.settings.strict_constraints,
            payload.force,
        )
        .await?;

    Ok(ApiResponse::ok(finish_write(&state, write)))
}

/// DELETE `/sessions/{session_id}` - Delete a proposed or cancelled session.
async fn delete_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    auth.require_staff()?;

    SessionRepository::new((*state.db).clone())
        .delete(session_id)
        .await?;
    state.report_cache.invalidate_all();

    Ok(ApiResponse::ok(serde_json::json!({ "id": session_id })))
}

/// POST `/sessions/{session_id}/confirm` - Confirm a proposed session.
async fn confirm_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> ApiResult<SessionResponse> {
    auth.require_staff()?;

    let outcome = WorkflowRepository::new((*state.db).clone())
        .confirm(session_id, auth.user_id())
        .await?;

    Ok(ApiResponse::ok(finish_transition(&state, outcome)))
}

/// POST `/sessions/{session_id}/start` - Mark delivery as started.
async fn start_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> ApiResult<SessionResponse> {
    auth.require_staff()?;

    let outcome = WorkflowRepository::new((*state.db).clone())
        .start(session_id, auth.user_id())
        .await?;

    Ok(ApiResponse::ok(finish_transition(&state, outcome)))
}

/// POST `/sessions/{session_id}/complete` - Close a session with realized hours.
async fn complete_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CompleteRequest>,
) -> ApiResult<SessionResponse> {
    auth.require_staff()?;

    let outcome = WorkflowRepository::new((*state.db).clone())
        .complete(session_id, auth.user_id(), payload.hours_realized)
        .await?;

    Ok(ApiResponse::ok(finish_transition(&state, outcome)))
}

/// POST `/sessions/{session_id}/cancel` - Call a session off.
async fn cancel_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CancelRequest>,
) -> ApiResult<SessionResponse> {
    auth.require_staff()?;

    let outcome = WorkflowRepository::new((*state.db).clone())
        .cancel(session_id, auth.user_id(), payload.reason.trim().to_string())
        .await?;

    Ok(ApiResponse::ok(finish_transition(&state, outcome)))
}

/// POST `/sessions/{session_id}/apply-counter` - Take over the school's timing.
async fn apply_counter(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> ApiResult<SessionWriteResponse> {
    auth.require_staff()?;

    let mut outcome = WorkflowRepository::new((*state.db).clone())
        .apply_counter(
            session_id,
            auth.user_id(),
            state.settings.strict_constraints,
        )
        .await?;

    let warnings = std::mem::take(&mut outcome.warnings);
    Ok(ApiResponse::ok(SessionWriteResponse {
        session: finish_transition(&state, outcome),
        warnings,
    }))
}

/// POST `/sessions/{session_id}/respond` - School accepts, counters or rejects.
async fn respond_to_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
    ValidatedJson(RespondRequest { response }): ValidatedJson<RespondRequest>,
) -> ApiResult<SessionResponse> {
    let scope = SessionScope::School(auth.school_id()?);

    let outcome = WorkflowRepository::new((*state.db).clone())
        .respond(session_id, scope, auth.user_id(), response)
        .await?;

    Ok(ApiResponse::ok(finish_transition(&state, outcome)))
}

/// POST `/sessions/{session_id}/assign-trainer` - Book a trainer.
async fn assign_trainer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<AssignTrainerRequest>,
) -> ApiResult<SessionWriteResponse> {
    auth.require_staff()?;

    let write = SessionRepository::new((*state.db).clone())
        .assign_trainer(session_id, payload.trainer_id, auth.user_id(), payload.force)
        .await?;

    info!(
        session_id = %session_id,
        trainer_id = %payload.trainer_id,
        forced = payload.force,
        "Trainer assigned"
    );

    Ok(ApiResponse::ok(finish_write(&state, write)))
}

/// PUT `/sessions/{session_id}/satisfaction` - Record the school's score.
async fn record_satisfaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<SatisfactionRequest>,
) -> ApiResult<SessionResponse> {
    if auth.role() == Role::Trainer {
        return Err(ApiError::forbidden("Trainers cannot score sessions"));
    }

    let session = SessionRepository::new((*state.db).clone())
        .record_satisfaction(session_id, payload.score, auth.session_scope()?)
        .await?;
    state.report_cache.invalidate_all();

    info!(session_id = %session_id, score = payload.score, "Satisfaction recorded");

    Ok(ApiResponse::ok(session.into()))
}

/// GET `/sessions/{session_id}/events` - Audit trail, oldest first.
async fn list_session_events(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Vec<EventResponse>> {
    SessionRepository::new((*state.db).clone())
        .find_by_id(session_id, auth.session_scope()?)
        .await?;

    let events = EventRepository::new((*state.db).clone())
        .list_for_session(session_id)
        .await?;

    Ok(ApiResponse::ok(
        events.into_iter().map(EventResponse::from).collect(),
    ))
}

// ============================================================================
// Write Follow-up
// ============================================================================

fn notify(state: &AppState, parties: &SessionParties, events: Vec<NotificationEvent>) {
    state.report_cache.invalidate_all();
    dispatch(&state.notifier, parties, &state.settings.staff_email, events);
}

fn finish_write(state: &AppState, write: SessionWrite) -> SessionWriteResponse {
    notify(state, &write.parties, write.events);
    SessionWriteResponse {
        session: write.session.into(),
        warnings: write.warnings,
    }
}

fn finish_transition(state: &AppState, outcome: TransitionOutcome) -> SessionResponse {
    notify(state, &outcome.parties, vec![outcome.event]);
    outcome.session.into()
}
