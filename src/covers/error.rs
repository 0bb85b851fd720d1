//! Error taxonomy for cover retrieval.
//!
//! Errors are `Clone` because one coalesced probe hands the same outcome to
//! every waiter.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that can occur while fetching a cover.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoverError {
    /// Credentials missing, or rejected by the library server.
    #[error("Library authentication failed: {message}")]
    Authentication {
        status: Option<u16>,
        message: String,
        /// Set once the single rebuild-and-retry has been spent.
        after_retry: bool,
    },

    /// Server unreachable or timed out.
    #[error("Library unreachable at '{target}': {message}")]
    Connectivity { target: String, message: String },

    /// Server answered, but in a degraded way (5xx, unreadable body).
    #[error("Library degraded: {message}")]
    Upstream { status: Option<u16>, message: String },

    /// Every candidate path was tried and none served a cover.
    #[error("No cover found for book '{book_id}'")]
    NotFound { book_id: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoverError {
    /// Build from a transport-level reqwest failure against `target`.
    pub fn from_transport(target: &str, err: &reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            CoverError::Connectivity {
                target: target.to_string(),
                message: err.to_string(),
            }
        } else {
            CoverError::Upstream {
                status: err.status().map(|s| s.as_u16()),
                message: format!("{}: {}", target, err),
            }
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, CoverError::Authentication { .. })
    }

    /// Mark an authentication failure as surfacing after the retry.
    pub fn after_retry(self) -> Self {
        match self {
            CoverError::Authentication { status, message, .. } => CoverError::Authentication {
                status,
                message,
                after_retry: true,
            },
            other => other,
        }
    }

    /// Map error variant to the HTTP status returned to the dashboard.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CoverError::Authentication { after_retry: false, .. } => StatusCode::UNAUTHORIZED,
            CoverError::Authentication { after_retry: true, .. } => StatusCode::BAD_GATEWAY,
            CoverError::Connectivity { .. } => StatusCode::SERVICE_UNAVAILABLE,
            CoverError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            CoverError::NotFound { .. } => StatusCode::NOT_FOUND,
            CoverError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CoverError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error type string for JSON responses
    pub fn error_type(&self) -> &'static str {
        match self {
            CoverError::Authentication { .. } => "unauthorized",
            CoverError::Connectivity { .. } | CoverError::Upstream { .. } => "unavailable",
            CoverError::NotFound { .. } => "not_found",
            CoverError::InvalidRequest(_) => "invalid_request",
            CoverError::Internal(_) => "internal_error",
        }
    }
}
