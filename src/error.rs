use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Error taxonomy of the retry subsystem. Eligibility and validation failures
/// mutate nothing; gateway failures are recorded on the attempt (FAILED)
/// before being surfaced.
#[derive(Debug, Error)]
pub enum RetryError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    RetryNotAllowed(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Gateway(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl RetryError {
    pub fn code(&self) -> &'static str {
        match self {
            RetryError::NotFound(_) => "NOT_FOUND",
            RetryError::RetryNotAllowed(_) => "RETRY_NOT_ALLOWED",
            RetryError::InvalidState(_) => "INVALID_STATE",
            RetryError::Validation(_) => "VALIDATION_ERROR",
            RetryError::Gateway(_) => "GATEWAY_ERROR",
            RetryError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RetryError::NotFound(_) => StatusCode::NOT_FOUND,
            RetryError::RetryNotAllowed(_) => StatusCode::CONFLICT,
            RetryError::InvalidState(_) => StatusCode::CONFLICT,
            RetryError::Validation(_) => StatusCode::BAD_REQUEST,
            RetryError::Gateway(_) => StatusCode::BAD_GATEWAY,
            RetryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for RetryError {
    fn from(e: sqlx::Error) -> Self {
        RetryError::Internal(e.into())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

impl IntoResponse for RetryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("internal error: {:#}", self);
        }
        let body = ErrorEnvelope {
            error: ErrorPayload {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
