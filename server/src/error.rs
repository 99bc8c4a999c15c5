//! Unified error handling for the server.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A quote failed validation
    #[error("Invalid quote: {0}")]
    Quote(#[from] quotesync_engine::Error),

    /// The body was not the JSON we expected
    #[error("Malformed body: {0}")]
    Body(#[from] JsonRejection),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

/// JSON body of every error response.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            AppError::Quote(e) => {
                tracing::warn!(error = %e, "Rejected quote");
                (StatusCode::BAD_REQUEST, "Invalid quote".to_string(), Some(e.to_string()))
            }
            AppError::Body(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Rejected body");
                (
                    rejection.status(),
                    "Malformed body".to_string(),
                    Some(rejection.body_text()),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
