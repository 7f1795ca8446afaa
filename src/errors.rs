use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;

use crate::models::ErrorResponse;
use crate::mortgage::{ComputationError, ValidationError};

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Input failed validation. Detail is logged, never returned.
    InvalidInput(ValidationError),
    /// Request body was not valid JSON.
    MalformedBody(String),
    /// Client exceeded its request window.
    RateLimited,
    /// HTTP method not supported on this route.
    MethodNotAllowed,
    /// Request body is not JSON.
    UnsupportedMediaType,
    /// Request body exceeds the configured size limit.
    PayloadTooLarge,
    /// Payment formula produced an invalid amount.
    Computation(ComputationError),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidInput(e) => write!(f, "Invalid input: {}", e),
            AppError::MalformedBody(msg) => write!(f, "Malformed body: {}", msg),
            AppError::RateLimited => write!(f, "Rate limit exceeded"),
            AppError::MethodNotAllowed => write!(f, "Method not allowed"),
            AppError::UnsupportedMediaType => write!(f, "Unsupported media type"),
            AppError::PayloadTooLarge => write!(f, "Payload too large"),
            AppError::Computation(e) => write!(f, "Computation error: {}", e),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// HTTP status and client-facing message for this error.
    pub fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidInput(_) | AppError::MalformedBody(_) => {
                (StatusCode::BAD_REQUEST, "Invalid input")
            }
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests, please try again later.",
            ),
            AppError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
            AppError::UnsupportedMediaType => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Content-Type must be application/json",
            ),
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large"),
            AppError::Computation(_) | AppError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::WithContext { source, .. } => source.status_and_message(),
        }
    }
}

impl IntoResponse for AppError {
    /// Maps each error variant to a status code and a generic JSON body.
    ///
    /// Server faults are logged here; client errors are logged by the handler,
    /// which knows whether detail may be written in this environment.
    fn into_response(self) -> Response {
        match &self {
            AppError::Computation(e) => {
                tracing::error!("Payment computation failed: {}", e);
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
            }
            AppError::WithContext { source, context } => {
                tracing::error!("Error with context: {} -> {}", context, source);
            }
            _ => {}
        }

        let (status, message) = self.status_and_message();
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidInput(err)
    }
}

impl From<ComputationError> for AppError {
    fn from(err: ComputationError) -> Self {
        AppError::Computation(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedBody(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e.into()),
            context: f(),
        })
    }
}
