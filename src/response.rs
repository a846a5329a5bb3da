use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Uniform body of every response the API produces.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    pub errors: Option<Vec<String>>,
}

/// A successful envelope paired with its status code.
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    body: Envelope<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            status,
            body: Envelope {
                success: true,
                message: message.into(),
                data: Some(data),
                errors: None,
            },
        }
    }

    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::success(data, message, StatusCode::OK)
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::success(data, message, StatusCode::CREATED)
    }
}

impl ApiResponse<()> {
    /// Success without a payload; `data` is rendered as null.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: Envelope {
                success: true,
                message: message.into(),
                data: None,
                errors: None,
            },
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn error_response(message: impl Into<String>, status: StatusCode, errors: Option<Vec<String>>) -> Response {
    let body: Envelope<()> = Envelope {
        success: false,
        message: message.into(),
        data: None,
        errors: errors.filter(|e| !e.is_empty()),
    };
    (status, Json(body)).into_response()
}
