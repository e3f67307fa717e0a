use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("num_questions must be between {min} and {max}, got {requested}")]
    OutOfRange {
        requested: i64,
        min: usize,
        max: usize,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Quiz generation failed: {0}")]
    Generation(String),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for failures caused by the caller's input rather than by a
    /// provider or by this service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::BadRequest(_) | Error::OutOfRange { .. } | Error::Validation(_) | Error::Json(_)
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) | Error::OutOfRange { .. } | Error::Validation(_) | Error::Json(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Provider(_)
            | Error::Generation(_)
            | Error::Reqwest(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Anyhow(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the `error` field of a response body. Provider
    /// detail is only exposed when `verbose` is set.
    pub fn public_message(&self, verbose: bool) -> String {
        if self.is_client_error() || verbose {
            return self.to_string();
        }
        match self.status() {
            StatusCode::BAD_GATEWAY => "Failed to generate quiz: upstream provider unavailable".to_string(),
            StatusCode::SERVICE_UNAVAILABLE => "Service is not configured".to_string(),
            _ => "An unexpected error occurred".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        ApiError::new(self, false).into_response()
    }
}

/// Error response that knows whether the deployment runs with `DEBUG_MODE`.
#[derive(Debug)]
pub struct ApiError {
    error: Error,
    verbose: bool,
}

impl ApiError {
    pub fn new(error: Error, verbose: bool) -> Self {
        Self { error, verbose }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.error.status();
        if status.is_server_error() {
            tracing::error!(error = %self.error, "request failed");
        } else {
            tracing::debug!(error = %self.error, "request rejected");
        }
        let body = Json(json!({ "error": self.error.public_message(self.verbose) }));
        (status, body).into_response()
    }
}
