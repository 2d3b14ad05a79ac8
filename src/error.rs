use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::ErrorBody;

/// ApiError
///
/// Every failure a request can end in. Each variant maps to exactly one status
/// code and a `{error, message}` body; nothing internal leaks into the payload.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required request field was absent or empty (400).
    #[error("{error}: {message}")]
    MissingField {
        error: &'static str,
        message: &'static str,
    },

    /// No bearer token was presented (401).
    #[error("access token required")]
    AuthenticationRequired,

    /// A bearer token was presented but failed verification (403).
    #[error("invalid token")]
    AuthenticationInvalid,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingField { .. } => StatusCode::BAD_REQUEST,
            ApiError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            ApiError::AuthenticationInvalid => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (error, message) = match &self {
            ApiError::MissingField { error, message } => (*error, *message),
            ApiError::AuthenticationRequired => (
                "Access token required",
                "Please provide a valid Bearer token in the Authorization header",
            ),
            ApiError::AuthenticationInvalid => (
                "Invalid token",
                "The provided token is invalid or expired",
            ),
            ApiError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    "Internal server error",
                    "The request could not be completed",
                )
            }
        };

        let body = ErrorBody {
            error: error.to_string(),
            message: message.to_string(),
        };

        (self.status(), Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
