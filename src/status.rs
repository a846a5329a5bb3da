use std::collections::BTreeMap;

use axum::{routing::get, Router};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    auth::AuthController, controller::Controller, github::GithubController, openai::OpenAiController,
    registration::RegistrationController, response::ApiResponse, state::AppState, users::UsersController,
};

pub const SERVICE_NAME: &str = "Documentation Generator API";
pub const API_VERSION: &str = "1.0.0";

#[derive(Debug, Serialize)]
pub struct Index {
    pub message: String,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct ApiStatus {
    pub api: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

pub struct StatusController;

impl Controller for StatusController {
    const NAME: &'static str = "status";
    const PREFIX: &'static str = "";

    fn routes() -> Router<AppState> {
        Router::new()
            .route("/", get(index))
            .route("/health", get(health))
            .route("/api/status", get(api_status))
    }
}

pub async fn index() -> ApiResponse<Index> {
    ApiResponse::ok(
        Index {
            message: format!("{SERVICE_NAME} is running"),
            version: API_VERSION,
        },
        "Success",
    )
}

pub async fn health() -> ApiResponse<Health> {
    ApiResponse::ok(
        Health {
            status: "healthy",
            timestamp: OffsetDateTime::now_utc(),
        },
        "Success",
    )
}

pub async fn api_status() -> ApiResponse<ApiStatus> {
    let endpoints = BTreeMap::from([
        (AuthController::NAME, AuthController::PREFIX),
        (RegistrationController::NAME, RegistrationController::PREFIX),
        (UsersController::NAME, UsersController::PREFIX),
        (GithubController::NAME, GithubController::PREFIX),
        (OpenAiController::NAME, OpenAiController::PREFIX),
        ("health", "/health"),
    ]);
    ApiResponse::ok(
        ApiStatus {
            api: SERVICE_NAME,
            version: API_VERSION,
            status: "active",
            endpoints,
        },
        "Success",
    )
}
