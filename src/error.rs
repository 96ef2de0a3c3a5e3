//! Error taxonomy shared by both services.
//!
//! Every failure leaving a service is a [`ServiceError`] with a stable
//! [`ErrorCode`]. Store internals never cross the boundary: they are logged
//! and replaced by a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// ============================================================
// Stable wire codes
// ============================================================

/// Stable, documented code carried by every error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    NotFound,
    AlreadyExists,
    AuthenticationError,
    TokenError,
    InsufficientStock,
    StoreError,
    StoreTimeout,
    InternalError,
}

impl ErrorCode {
    // ---
    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::AuthenticationError => "AUTHENTICATION_ERROR",
            ErrorCode::TokenError => "TOKEN_ERROR",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::StoreError => "STORE_ERROR",
            ErrorCode::StoreTimeout => "STORE_TIMEOUT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// HTTP status used when this code is returned by a handler.
    pub fn status(&self) -> StatusCode {
        // ---
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::AlreadyExists | ErrorCode::InsufficientStock => StatusCode::CONFLICT,
            ErrorCode::AuthenticationError | ErrorCode::TokenError => StatusCode::UNAUTHORIZED,
            ErrorCode::StoreError => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::StoreTimeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body of every error response and of terminal stream error frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    // ---
    pub code: ErrorCode,
    pub message: String,
}

// ============================================================
// Store layer errors
// ============================================================

/// Failures reported by a repository implementation.
///
/// Absence of a record is never an error here; repositories return `None`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("unique constraint violated")]
    UniqueViolation,

    #[error("store rejected pattern: {0}")]
    InvalidPattern(String),

    #[error("numeric value out of range")]
    OutOfRange,

    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),

    #[error("store backend failure")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    // ---
    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        // ---
        StoreError::Backend(err.into())
    }
}

// ============================================================
// Service boundary errors
// ============================================================

/// The taxonomy every operation of both services maps its failures into.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    // Same text for unknown user and wrong password.
    #[error("invalid username or password")]
    Authentication,

    #[error("invalid or expired token")]
    Token,

    #[error("insufficient stock for item {id}: {available} available")]
    InsufficientStock { id: String, available: i64 },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    // ---
    pub fn validation(message: impl Into<String>) -> Self {
        // ---
        ServiceError::Validation(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        // ---
        match self {
            ServiceError::Validation(_) => ErrorCode::ValidationError,
            ServiceError::NotFound(_) => ErrorCode::NotFound,
            ServiceError::AlreadyExists(_) => ErrorCode::AlreadyExists,
            ServiceError::Authentication => ErrorCode::AuthenticationError,
            ServiceError::Token => ErrorCode::TokenError,
            ServiceError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            ServiceError::Store(StoreError::Timeout(_)) => ErrorCode::StoreTimeout,
            ServiceError::Store(_) => ErrorCode::StoreError,
            ServiceError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Caller-safe representation. Store and internal details are withheld.
    pub fn to_body(&self) -> ErrorBody {
        // ---
        let code = self.code();
        let message = match code {
            ErrorCode::StoreTimeout => "store operation timed out".to_string(),
            ErrorCode::StoreError => "store unavailable".to_string(),
            ErrorCode::InternalError => "internal server error".to_string(),
            _ => self.to_string(),
        };
        ErrorBody { code, message }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        // ---
        match &self {
            ServiceError::Store(err) => tracing::error!("Store failure: {:?}", err),
            ServiceError::Internal(detail) => tracing::error!("Internal failure: {}", detail),
            other => tracing::debug!("Request rejected: {}", other),
        }

        let body = self.to_body();
        (body.code.status(), Json(body)).into_response()
    }
}

// ============================================================
// Startup errors
// ============================================================

/// Initialization failures. Returned to `main`, which decides whether to exit.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("could not connect to store after {attempts} attempt(s)")]
    Connect {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("store liveness probe failed")]
    Probe(#[source] StoreError),

    #[error("store migration failed")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("metrics initialization failed: {0}")]
    Metrics(String),

    #[error("could not bind {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server terminated with an error")]
    Serve(#[source] std::io::Error),
}

impl StartupError {
    // ---
    pub fn config(err: anyhow::Error) -> Self {
        // ---
        StartupError::Config(format!("{err:#}"))
    }
}
