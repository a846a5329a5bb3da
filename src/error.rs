use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::{db::DataError, response::error_response};

/// Every failure a handler can surface. Rendering happens in one place,
/// `IntoResponse` below.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, errors: Vec<String> },
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(errors: Vec<String>) -> Self {
        Self::Validation {
            message: "Validation error".into(),
            errors,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream { status, .. } => *status,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Data(DataError::UniqueViolation(_)) => StatusCode::BAD_REQUEST,
            Self::Data(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Validation { message, errors } => {
                warn!(%status, ?errors, "{message}");
                error_response(message, status, Some(errors))
            }
            Self::Data(DataError::UniqueViolation(constraint)) => {
                warn!(%status, %constraint, "unique constraint violated");
                error_response("Record already exists", status, None)
            }
            Self::Data(err) => {
                error!(error = ?err, "data access failed");
                error_response("Internal server error", status, None)
            }
            Self::Internal(err) => {
                error!(error = ?err, "unhandled error");
                error_response("Internal server error", status, None)
            }
            other if status.is_server_error() => {
                error!(%status, error = %other, "request failed");
                error_response(other.to_string(), status, None)
            }
            other => {
                warn!(%status, error = %other, "request rejected");
                error_response(other.to_string(), status, None)
            }
        }
    }
}

/// Fallback for unmatched routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("The requested resource was not found".into())
}

/// Converts a caught panic into the generic 500 envelope.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!(panic = %detail, "handler panicked");
    error_response("Internal server error", StatusCode::INTERNAL_SERVER_ERROR, None)
}
