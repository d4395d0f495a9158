//! Error-to-response mapping
//!
//! One application error type that renders as a JSON HTTP response with
//! the right status code. Handlers return `Result<T, AppError>` and use
//! `?`; the conversion to a response logs the error and maps the kind to
//! a status.
//!
//! # Usage
//!
//! ```ignore
//! use parapet::{AppError, Result};
//!
//! async fn get_item(id: u64) -> Result<Item> {
//!     find_item(id).ok_or_else(|| AppError::resource_not_found("item", id))
//! }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::fmt;

/// Error categories with their HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad request (400)
    BadRequest,
    /// Unauthorized (401) - token missing, invalid, or expired
    Unauthorized,
    /// Not found (404) - the addressed resource doesn't exist
    NotFound,
    /// Conflict (409) - the resource already exists
    Conflict,
    /// Unprocessable entity (422) - payload failed validation
    Validation,
    /// Internal server error (500)
    Internal,
}

impl ErrorKind {
    /// The HTTP status code for this error kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest => write!(f, "bad_request"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Validation => write!(f, "validation_error"),
            Self::Internal => write!(f, "internal_error"),
        }
    }
}

/// Application error that maps to an HTTP response.
#[derive(Debug)]
pub struct AppError {
    /// Error kind determines the HTTP status
    pub kind: ErrorKind,
    /// User-facing message
    pub message: String,
    /// Original error, kept for logging
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// A resource lookup came up empty (404).
    pub fn resource_not_found(resource: &str, id: impl fmt::Display) -> Self {
        Self::new(ErrorKind::NotFound, format!("{resource} not found: {id}"))
    }

    /// A resource with this identity already exists (409).
    pub fn resource_already_exists(resource: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::Conflict,
            format!("{resource} already exists: {id}"),
        )
    }

    /// Create a bad request error (400).
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    /// Create an unauthorized error (401).
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Create a validation error (422).
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create an internal error (500) with its source.
    pub fn internal(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind: ErrorKind::Internal,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Log the error (called by the response conversion).
    fn log(&self) {
        let source = self
            .source
            .as_deref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "none".to_string());

        match self.kind {
            ErrorKind::Internal => {
                tracing::error!(
                    error_kind = %self.kind,
                    message = %self.message,
                    source = %source,
                    "Internal error"
                );
            }
            ErrorKind::Unauthorized => {
                tracing::warn!(
                    error_kind = %self.kind,
                    message = %self.message,
                    "Auth error"
                );
            }
            _ => {
                tracing::debug!(
                    error_kind = %self.kind,
                    message = %self.message,
                    "Client error"
                );
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

/// JSON error response body.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ErrorResponse {
    /// Error kind as a stable string
    pub error: String,
    /// Human-readable message
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        let body = ErrorResponse {
            error: self.kind.to_string(),
            message: self.message,
        };
        (self.kind.status_code(), Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::internal("IO error", err)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind as JwtErrorKind;

        match err.kind() {
            JwtErrorKind::ExpiredSignature => AppError::unauthorized("token expired"),
            JwtErrorKind::InvalidToken | JwtErrorKind::InvalidSignature => {
                AppError::unauthorized("invalid token")
            }
            _ => AppError::unauthorized("token validation failed"),
        }
    }
}

/// Result type alias for handlers returning [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_status_codes() {
        assert_eq!(ErrorKind::BadRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorKind::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ErrorKind::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorKind::Validation.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorKind::Internal.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_resource_constructors() {
        let err = AppError::resource_not_found("item", 42);
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "item not found: 42");

        let err = AppError::resource_already_exists("user", "alice");
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.message, "user already exists: alice");
    }

    #[test]
    fn test_error_display() {
        let err = AppError::validation("missing field `name`");
        assert_eq!(format!("{err}"), "validation_error: missing field `name`");
    }

    #[test]
    fn test_jwt_error_conversion() {
        let err: AppError =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::ExpiredSignature)
                .into();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
        assert_eq!(err.message, "token expired");
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let response = AppError::resource_not_found("item", 7).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["message"], "item not found: 7");
    }
}
