//! Request extractors that turn malformed input into `AppError` instead of
//! axum's plain-text rejections.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::AppError;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    static ref GITHUB_USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9-]+$").unwrap();
}

pub const NAME_MAX_LEN: usize = 100;
pub const EMAIL_MAX_LEN: usize = 120;
pub const GITHUB_USERNAME_MIN_LEN: usize = 3;
pub const GITHUB_USERNAME_MAX_LEN: usize = 50;

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= EMAIL_MAX_LEN && EMAIL_RE.is_match(email)
}

pub fn is_valid_github_username(username: &str) -> bool {
    GITHUB_USERNAME_RE.is_match(username)
}

/// Schema check run after deserialization. An empty list means valid.
pub trait Validate {
    fn validate(&self) -> Vec<String>;
}

/// Collects field problems in declaration order.
#[derive(Debug, Default)]
pub struct Problems(Vec<String>);

impl Problems {
    pub fn add(&mut self, field: &str, message: impl AsRef<str>) {
        self.0.push(format!("{field}: {}", message.as_ref()));
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    pub fn name(&mut self, field: &str, value: &str) {
        let len = value.trim().chars().count();
        self.check(
            (1..=NAME_MAX_LEN).contains(&len),
            field,
            "must be between 1 and 100 characters",
        );
    }

    pub fn email(&mut self, field: &str, value: &str) {
        self.check(is_valid_email(value.trim()), field, "Not a valid email address.");
    }

    pub fn github_username(&mut self, field: &str, value: &str) {
        let value = value.trim();
        let len = value.chars().count();
        if len < GITHUB_USERNAME_MIN_LEN {
            self.add(field, "GitHub username must be at least 3 characters");
        } else if len > GITHUB_USERNAME_MAX_LEN {
            self.add(field, "GitHub username must be at most 50 characters");
        } else if !is_valid_github_username(value) {
            self.add(field, "Invalid GitHub username format");
        }
    }

    pub fn password(&mut self, field: &str, value: &str) {
        self.check(
            value.chars().count() >= crate::auth::password::MIN_PASSWORD_LEN,
            field,
            "Password must be at least 8 characters",
        );
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// JSON body that has been parsed and validated.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::validation(vec![rejection.body_text()]))?;
        let errors = value.validate();
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }
        Ok(Self(value))
    }
}

/// Query string that has been parsed and validated.
#[derive(Debug, Clone)]
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::validation(vec![rejection.body_text()]))?;
        let errors = value.validate();
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }
        Ok(Self(value))
    }
}

/// `:id` path segment. Anything that is not a UUID cannot name a record, so it
/// is reported as not found.
#[derive(Debug, Clone, Copy)]
pub struct IdPath(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound("User not found".into()))?;
        Ok(Self(id))
    }
}
