use serde::{Deserialize, Serialize};

use crate::{
    extract::{Problems, Validate},
    users::model::PublicUser,
};

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Vec<String> {
        let mut p = Problems::default();
        p.email("email", &self.email);
        p.check(!self.password.is_empty(), "password", "Missing data for required field.");
        p.into_vec()
    }
}

/// Returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

/// Returned by the refresh endpoint.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}
