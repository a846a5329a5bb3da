use axum::{
    extract::{FromRef, State},
    routing::post,
    Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, RefreshResponse},
        jwt::{JwtKeys, RefreshUser},
    },
    controller::Controller,
    db::Entity,
    error::AppError,
    extract::ValidJson,
    response::ApiResponse,
    state::AppState,
    users::services::UserService,
};

pub struct AuthController;

impl Controller for AuthController {
    const NAME: &'static str = "auth";
    const PREFIX: &'static str = "/api/auth";

    fn routes() -> Router<AppState> {
        Router::new()
            .route("/login", post(login))
            .route("/refresh", post(refresh))
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>, AppError> {
    let user = UserService::new(&state)
        .authenticate(&payload.email, &payload.password)
        .await?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;

    info!(user_id = %user.id, email = %user.email, "tokens issued");
    Ok(ApiResponse::ok(
        LoginResponse {
            user: user.to_dict(),
            access_token,
            refresh_token,
        },
        "Login successful",
    ))
}

/// Exchanges a refresh token for a new access token.
#[instrument(skip(state))]
pub async fn refresh(
    State(state): State<AppState>,
    RefreshUser(user_id): RefreshUser,
) -> Result<ApiResponse<RefreshResponse>, AppError> {
    let user = UserService::new(&state).current_user(user_id).await?;
    let access_token = JwtKeys::from_ref(&state).sign_access(user.id)?;
    info!(user_id = %user.id, "access token refreshed");
    Ok(ApiResponse::ok(RefreshResponse { access_token }, "Token refreshed"))
}
