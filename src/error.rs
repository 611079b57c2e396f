use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Closed set of failures the API reports. Handlers raise these; the mapping
/// in `into_response` is the only place status codes and wire shapes are
/// chosen.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing input, correctable by the caller.
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid, or expired token.
    #[error("{0}")]
    Authentication(String),

    /// Acting on a resource the caller does not own. Rendered as a plain
    /// not-found so probing never reveals whether the resource exists.
    #[error("{0}")]
    Authorization(String),

    /// The current state already satisfies or contradicts the request.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Storage, email, or configuration failure beyond caller control.
    #[error("{0}")]
    Internal(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        // Detail stays in server logs; the client only sees a generic message.
        error!(error = ?err, "unhandled error");
        ApiError::Internal("Internal error".into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Authentication(m) => (StatusCode::UNAUTHORIZED, m),
            ApiError::Authorization(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        let body = Json(json!({
            "success": false,
            "error": { "message": message },
        }));
        (status, body).into_response()
    }
}
