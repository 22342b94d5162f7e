//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API and OpenAPI documentation.

use crate::{
    handlers,
    models::{
        AnswerDto, CreateSessionPayload, ErrorResponse, FeedbackDto, ImprovementDayDto,
        MessageDto, ScoresDto, SessionDto, SnapshotDto, SubmitAnswerPayload, SubmitOutcomeDto,
        SummaryDto, TimerDto, TurnDto,
    },
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::create_session,
        handlers::start_interview,
        handlers::submit_answer,
        handlers::end_interview,
        handlers::abandon_session,
        handlers::get_session,
        handlers::get_summary,
    ),
    components(
        schemas(
            SessionDto,
            MessageDto,
            AnswerDto,
            ScoresDto,
            FeedbackDto,
            TimerDto,
            ImprovementDayDto,
            SummaryDto,
            TurnDto,
            SubmitOutcomeDto,
            SnapshotDto,
            CreateSessionPayload,
            SubmitAnswerPayload,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Interview Coach API", description = "Session management for interview practice")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Group all routes that require AppState into their own router.
    let api_router = Router::new()
        .route("/sessions", post(handlers::create_session))
        .route("/sessions/{id}", get(handlers::get_session))
        .route("/sessions/{id}/start", post(handlers::start_interview))
        .route("/sessions/{id}/answers", post(handlers::submit_answer))
        .route("/sessions/{id}/end", post(handlers::end_interview))
        .route("/sessions/{id}/abandon", post(handlers::abandon_session))
        .route("/sessions/{id}/summary", get(handlers::get_summary))
        .with_state(app_state);

    // Merge the stateful routes with the stateless Swagger UI routes.
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
