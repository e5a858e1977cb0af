/// Unified error types for the portfolio service
use crate::{contact::FormError, content::ContentError, listing::ListError};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the portfolio service
#[derive(Error, Debug)]
pub enum PortfolioError {
    /// Content store errors
    #[error("Content store error: {0}")]
    Content(#[from] ContentError),

    /// Validation errors (bad configuration, malformed request bodies)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation not allowed in the current view/form state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Session capacity exhausted
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Rate limiting errors
    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after: std::time::Duration },

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert PortfolioError to HTTP response
impl IntoResponse for PortfolioError {
    fn into_response(self) -> Response {
        let retry_after = match &self {
            PortfolioError::RateLimitExceeded { retry_after } => Some(retry_after.as_secs().max(1)),
            _ => None,
        };

        let (status, error_code, message) = match self {
            PortfolioError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            PortfolioError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "NotFound",
                self.to_string(),
            ),
            PortfolioError::Conflict(_) => (
                StatusCode::CONFLICT,
                "Conflict",
                self.to_string(),
            ),
            PortfolioError::Unavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Unavailable",
                self.to_string(),
            ),
            PortfolioError::RateLimitExceeded { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RateLimitExceeded",
                "Rate limit exceeded".to_string(),
            ),
            PortfolioError::Content(_) => (
                StatusCode::BAD_GATEWAY,
                "UpstreamError",
                "Content store unavailable".to_string(), // Don't leak details
            ),
            PortfolioError::Internal(_) | PortfolioError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<ListError> for PortfolioError {
    fn from(e: ListError) -> Self {
        PortfolioError::Conflict(e.to_string())
    }
}

impl From<FormError> for PortfolioError {
    fn from(e: FormError) -> Self {
        PortfolioError::Conflict(e.to_string())
    }
}

/// Result type alias for portfolio operations
pub type PortfolioResult<T> = Result<T, PortfolioError>;
