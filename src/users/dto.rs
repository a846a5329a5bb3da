use serde::{Deserialize, Serialize};

use crate::extract::{Problems, Validate};

use super::{
    model::{PublicUser, Role},
    repo::Pagination,
};

/// Admin-side account creation.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub github_username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Vec<String> {
        let mut p = Problems::default();
        p.name("name", &self.name);
        p.email("email", &self.email);
        p.github_username("github_username", &self.github_username);
        p.password("password", &self.password);
        p.into_vec()
    }
}

/// Profile update; every field optional. `role` and `is_active` are honoured
/// for admins only.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub github_username: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Vec<String> {
        let mut p = Problems::default();
        if let Some(name) = &self.name {
            p.name("name", name);
        }
        if let Some(email) = &self.email {
            p.email("email", email);
        }
        if let Some(username) = &self.github_username {
            p.github_username("github_username", username);
        }
        if let Some(password) = &self.password {
            p.password("password", password);
        }
        p.into_vec()
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl Validate for ChangePasswordRequest {
    fn validate(&self) -> Vec<String> {
        let mut p = Problems::default();
        p.check(!self.current_password.is_empty(), "current_password", "Missing data for required field.");
        p.password("new_password", &self.new_password);
        p.into_vec()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

impl Validate for ListUsersQuery {
    fn validate(&self) -> Vec<String> {
        Vec::new()
    }
}

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

#[derive(Debug, Deserialize)]
pub struct SearchUsersQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Validate for SearchUsersQuery {
    fn validate(&self) -> Vec<String> {
        let mut p = Problems::default();
        p.check(!self.q.trim().is_empty(), "q", "Search query is required");
        p.check(self.page >= 1, "page", "must be at least 1");
        p.check(
            (1..=MAX_PER_PAGE).contains(&self.per_page),
            "per_page",
            "must be between 1 and 100",
        );
        p.into_vec()
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<PublicUser>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct UserSearchResponse {
    pub users: Vec<PublicUser>,
    pub pagination: Pagination,
}
