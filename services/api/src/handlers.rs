//! Axum Handlers for the REST API
//!
//! This module contains the logic for handling HTTP requests for session
//! management. It uses `utoipa` doc comments to generate OpenAPI
//! documentation. Every session route requires an `x-user-id` header and
//! rejects access to sessions owned by somebody else.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use coach_core::error::CoachError;
use coach_core::session::Session;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::{
    models::{
        CreateSessionPayload, ErrorResponse, SessionDto, SnapshotDto, SubmitAnswerPayload,
        SubmitOutcomeDto, SummaryDto, TurnDto,
    },
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    Validation(Vec<String>),
    NotFound(String),
    Conflict(String),
    Unavailable(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(message)),
            )
                .into_response(),
            ApiError::Validation(errors) => {
                let mut body = ErrorResponse::new("Validation failed");
                body.errors = Some(errors);
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse::new(message))).into_response()
            }
            ApiError::Conflict(message) => {
                (StatusCode::CONFLICT, Json(ErrorResponse::new(message))).into_response()
            }
            ApiError::Unavailable(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new(message)),
            )
                .into_response(),
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(message)),
                )
                    .into_response()
            }
        }
    }
}

impl From<CoachError> for ApiError {
    fn from(err: CoachError) -> Self {
        match err {
            CoachError::Validation { errors } => ApiError::Validation(errors),
            CoachError::SessionNotFound(id) => {
                ApiError::NotFound(format!("Session with id '{}' not found", id))
            }
            CoachError::InvalidState { .. }
            | CoachError::AlreadyInFlight
            | CoachError::NoActiveQuestion
            | CoachError::DuplicateAnswer { .. } => ApiError::Conflict(err.to_string()),
            CoachError::Recoverable(_) | CoachError::EvaluationFailed(_) => {
                ApiError::Unavailable(err.to_string())
            }
            CoachError::Schema(_) | CoachError::Store(_) | CoachError::Config(_) => {
                ApiError::InternalServerError(anyhow::Error::new(err))
            }
        }
    }
}

fn user_id(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("x-user-id header is required".to_string()))
}

/// Fetches the session and rejects access by anyone but its owner. An
/// ownership mismatch reads as not-found on purpose.
async fn owned_session(
    state: &AppState,
    id: Uuid,
    user_id: &str,
) -> Result<Session, ApiError> {
    let session = state
        .store
        .get_session(id)
        .await?
        .filter(|s| s.owner_id == user_id)
        .ok_or_else(|| ApiError::NotFound(format!("Session with id '{}' not found", id)))?;
    Ok(session)
}

/// Create a new interview practice session.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = CreateSessionPayload,
    responses(
        (status = 201, description = "Session created successfully", body = SessionDto),
        (status = 400, description = "Invalid setup", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "The ID of the user creating the session")
    )
)]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateSessionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id(&headers)?;
    let session = state
        .orchestrator
        .create_session(user_id, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(SessionDto::from(session))))
}

/// Start the interview and receive the opening question.
#[utoipa::path(
    post,
    path = "/sessions/{id}/start",
    responses(
        (status = 200, description = "Interview started", body = TurnDto),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Already started or a turn is in flight", body = ErrorResponse),
        (status = 503, description = "Question generation unavailable", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn start_interview(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id(&headers)?;
    owned_session(&state, id, user_id).await?;
    let turn = state.orchestrator.start_interview(id).await?;
    Ok((StatusCode::OK, Json(TurnDto::from(turn))))
}

/// Submit an answer to the current question.
#[utoipa::path(
    post,
    path = "/sessions/{id}/answers",
    request_body = SubmitAnswerPayload,
    responses(
        (status = 200, description = "Answer scored", body = SubmitOutcomeDto),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "No active question, duplicate answer or a turn is in flight", body = ErrorResponse),
        (status = 503, description = "Evaluation unavailable", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitAnswerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id(&headers)?;
    owned_session(&state, id, user_id).await?;
    let outcome = state
        .orchestrator
        .submit_answer(id, &payload.answer_text, payload.time_taken_seconds)
        .await?;
    Ok((StatusCode::OK, Json(SubmitOutcomeDto::from(outcome))))
}

/// End the interview early. The session completes through the same path
/// as answering the final question.
#[utoipa::path(
    post,
    path = "/sessions/{id}/end",
    responses(
        (status = 200, description = "Interview completed", body = SessionDto),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Session is not in progress", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn end_interview(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id(&headers)?;
    owned_session(&state, id, user_id).await?;
    let session = state.orchestrator.end_interview(id).await?;
    Ok((StatusCode::OK, Json(SessionDto::from(session))))
}

/// Abandon a session that has not finished.
#[utoipa::path(
    post,
    path = "/sessions/{id}/abandon",
    responses(
        (status = 200, description = "Session abandoned", body = SessionDto),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Session already finished", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn abandon_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id(&headers)?;
    owned_session(&state, id, user_id).await?;
    let session = state.orchestrator.abandon_session(id).await?;
    Ok((StatusCode::OK, Json(SessionDto::from(session))))
}

/// Get a full session snapshot for resuming, including the reconstructed
/// question timer.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    responses(
        (status = 200, description = "Session snapshot", body = SnapshotDto),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id(&headers)?;
    owned_session(&state, id, user_id).await?;
    let snapshot = state.orchestrator.load_session(id).await?;
    Ok((StatusCode::OK, Json(SnapshotDto::from(snapshot))))
}

/// Get the post-completion summary for a session.
#[utoipa::path(
    get,
    path = "/sessions/{id}/summary",
    responses(
        (status = 200, description = "Session summary", body = SummaryDto),
        (status = 404, description = "Session or summary not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id(&headers)?;
    owned_session(&state, id, user_id).await?;
    let summary = state
        .store
        .get_summary(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No summary for session '{}'", id)))?;
    Ok((StatusCode::OK, Json(SummaryDto::from(summary))))
}
