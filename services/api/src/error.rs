//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how each
//! kind is presented over HTTP.

use crate::config::ConfigError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use ledger_digest_core::error::CoreError;
use ledger_digest_core::ports::PortError;
use serde_json::json;
use tracing::{error, warn};

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core services.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Represents an error that propagated up from one of the adapters at startup.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request was rejected before reaching the core.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(core) => match core {
                CoreError::AlreadyExists => StatusCode::CONFLICT,
                CoreError::InvalidCredentials | CoreError::Unauthorized => StatusCode::UNAUTHORIZED,
                CoreError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                CoreError::DeliveryFailed(_) => StatusCode::BAD_GATEWAY,
                CoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                CoreError::AccountNotFound { .. } | CoreError::Unexpected(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to clients. Internal faults never leak their details.
    fn detail(&self) -> String {
        match self {
            ApiError::Core(CoreError::AccountNotFound { .. }) => {
                "Error retrieving user account".to_string()
            }
            ApiError::Core(CoreError::StoreUnavailable(_)) => {
                "Service temporarily unavailable, please retry".to_string()
            }
            ApiError::Core(CoreError::DeliveryFailed(_)) => {
                "Error sending summary email".to_string()
            }
            ApiError::Core(CoreError::Unexpected(_)) => "An unexpected error occurred".to_string(),
            ApiError::Core(core) => core.to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
            _ => "An unexpected error occurred".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Core(CoreError::AlreadyExists)
            | ApiError::Core(CoreError::InvalidCredentials)
            | ApiError::Core(CoreError::Unauthorized)
            | ApiError::Core(CoreError::InvalidInput(_))
            | ApiError::BadRequest(_) => {}
            ApiError::Core(CoreError::StoreUnavailable(_))
            | ApiError::Core(CoreError::DeliveryFailed(_)) => warn!("{}", self),
            _ => error!(error = ?self, "Request failed"),
        }

        let mut response = (status, Json(json!({ "detail": self.detail() }))).into_response();
        let headers = response.headers_mut();
        match status {
            StatusCode::UNAUTHORIZED => {
                headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            StatusCode::SERVICE_UNAVAILABLE => {
                headers.insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
            }
            _ => {}
        }
        response
    }
}
