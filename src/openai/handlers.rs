use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::CurrentUser,
    controller::Controller,
    error::AppError,
    extract::ValidJson,
    response::ApiResponse,
    state::AppState,
};

use super::{
    dto::{BatchReport, GenerateRequest, HealthReport},
    services::DocumentationService,
};

/// Five base64 files of a few MB each.
const BODY_LIMIT: usize = 16 * 1024 * 1024;

pub struct OpenAiController;

impl Controller for OpenAiController {
    const NAME: &'static str = "openai";
    const PREFIX: &'static str = "/api/openai";

    fn routes() -> Router<AppState> {
        Router::new()
            .route(
                "/generate-documentation",
                post(generate_documentation).layer(DefaultBodyLimit::max(BODY_LIMIT)),
            )
            .route("/health", get(health))
    }
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn generate_documentation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidJson(payload): ValidJson<GenerateRequest>,
) -> Result<ApiResponse<BatchReport>, AppError> {
    let (files, model) = payload.into_parts();
    let report = DocumentationService::new(&state)
        .generate_batch(files, model, user.id)
        .await?;
    Ok(ApiResponse::ok(report, "Documentation generated successfully"))
}

pub async fn health(State(state): State<AppState>) -> Result<ApiResponse<HealthReport>, AppError> {
    let report = DocumentationService::new(&state).health()?;
    Ok(ApiResponse::ok(report, "OpenAI service is healthy"))
}
