use axum::{extract::State, routing::post, Router};
use tracing::instrument;

use crate::{
    controller::Controller,
    db::Entity,
    error::AppError,
    extract::ValidJson,
    response::ApiResponse,
    state::AppState,
    users::model::PublicUser,
};

use super::{
    dto::{GithubValidation, RegisterRequest, ValidateGithubRequest},
    services::RegistrationService,
};

pub struct RegistrationController;

impl Controller for RegistrationController {
    const NAME: &'static str = "registration";
    const PREFIX: &'static str = "/api/register";

    fn routes() -> Router<AppState> {
        Router::new()
            .route("/", post(register))
            .route("/validate-github", post(validate_github))
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    let user = RegistrationService::new(&state).register(payload).await?;
    Ok(ApiResponse::created(user.to_dict(), "Registration successful"))
}

#[instrument(skip(state))]
pub async fn validate_github(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<ValidateGithubRequest>,
) -> Result<ApiResponse<GithubValidation>, AppError> {
    let (validation, message) = RegistrationService::new(&state)
        .validate_github_username(&payload.github_username)
        .await?;
    Ok(ApiResponse::ok(validation, message))
}
