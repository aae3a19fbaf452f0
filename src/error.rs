use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Upstream error {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request timed out")]
    Timeout,
}

impl AppError {
    pub fn upstream(status: reqwest::StatusCode, message: impl Into<String>) -> Self {
        AppError::Upstream {
            status: status.as_u16(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Upstream { status, message } if status == 401 || status == 403 => {
                (StatusCode::UNAUTHORIZED, message)
            }
            AppError::Upstream { status, message } => {
                error!("upstream error {}: {}", status, message);
                (StatusCode::BAD_GATEWAY, message)
            }
            AppError::Network(e) => {
                error!("network error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to reach upstream service".to_string(),
                )
            }
            AppError::Timeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "Upstream request timed out".to_string(),
            ),
            AppError::Database(e) => {
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            AppError::Config(msg) => {
                error!("configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
        });

        (status, body).into_response()
    }
}
