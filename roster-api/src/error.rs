//! Error Types for the ROSTER API
//!
//! This module defines error handling for the HTTP layer:
//! - ErrorCode enum with a stable wire code and HTTP status per category
//! - ApiError struct serialized as the JSON error body
//! - Conversions from workflow, database and parsing errors
//!
//! Storage failures are logged in full and surfaced with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use roster_core::{ErrorKind, RosterError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// The workflow codes match [`ErrorKind::code`] so clients can switch on the
/// same strings whatever the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Caller identity (401, 403)
    // ========================================================================
    /// No usable caller identity on the request
    Unauthorized,

    /// Caller's role does not allow the operation
    Forbidden,

    // ========================================================================
    // Input errors (400)
    // ========================================================================
    /// Input violates a business rule
    ValidationError,

    /// Request contains invalid input data
    InvalidInput,

    /// Field format is incorrect
    InvalidFormat,

    // ========================================================================
    // Not found (404)
    // ========================================================================
    /// Entity does not exist or is not visible to the caller
    NotFound,

    // ========================================================================
    // Conflicts (409)
    // ========================================================================
    /// Action not allowed in the request's current status
    InvalidTransition,

    /// Request no longer matches the schedule; refresh and retry
    Inconsistency,

    // ========================================================================
    // Server errors (500, 503, 504)
    // ========================================================================
    /// Store rejected or failed the operation
    StorageError,

    /// Database operation failed
    DatabaseError,

    /// Service is temporarily unavailable
    ServiceUnavailable,

    /// Database connection pool exhausted
    ConnectionPoolExhausted,

    /// Operation timed out
    Timeout,

    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,

            ErrorCode::ValidationError | ErrorCode::InvalidInput | ErrorCode::InvalidFormat => {
                StatusCode::BAD_REQUEST
            }

            ErrorCode::NotFound => StatusCode::NOT_FOUND,

            ErrorCode::InvalidTransition | ErrorCode::Inconsistency => StatusCode::CONFLICT,

            ErrorCode::ServiceUnavailable | ErrorCode::ConnectionPoolExhausted => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,

            ErrorCode::StorageError | ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "Caller identity required",
            ErrorCode::Forbidden => "Access forbidden",
            ErrorCode::ValidationError => "Request validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::NotFound => "Entity not found",
            ErrorCode::InvalidTransition => "Action not allowed in the current status",
            ErrorCode::Inconsistency => "Request is out of date, refresh and retry",
            ErrorCode::StorageError => "Storage operation failed",
            ErrorCode::DatabaseError => "Database operation failed",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
            ErrorCode::ConnectionPoolExhausted => "Connection pool exhausted",
            ErrorCode::Timeout => "Operation timed out",
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation => ErrorCode::ValidationError,
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::Forbidden => ErrorCode::Forbidden,
            ErrorKind::InvalidTransition => ErrorCode::InvalidTransition,
            ErrorKind::Inconsistency => ErrorCode::Inconsistency,
            ErrorKind::Storage => ErrorCode::StorageError,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error body returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional structured context (entity type, current status, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors
    // ========================================================================

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create an InvalidFormat error.
    pub fn invalid_format(field: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("Field '{}' has invalid format, expected {}", field, expected),
        )
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    pub fn connection_pool_exhausted() -> Self {
        Self::from_code(ErrorCode::ConnectionPoolExhausted)
    }

    /// Create a Timeout error.
    pub fn timeout(operation: &str) -> Self {
        Self::new(
            ErrorCode::Timeout,
            format!("Operation '{}' timed out", operation),
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

/// Convert a workflow error into its caller-facing form.
impl From<RosterError> for ApiError {
    fn from(err: RosterError) -> Self {
        let code = ErrorCode::from(err.kind());
        match &err {
            RosterError::NotFound { entity_type, id } => ApiError::new(code, err.to_string())
                .with_details(json!({ "entity_type": entity_type, "id": id })),
            RosterError::InvalidTransition { status, action, .. } => {
                ApiError::new(code, err.to_string())
                    .with_details(json!({ "status": status, "action": action }))
            }
            RosterError::Inconsistency { shift_id, .. } => ApiError::new(code, err.to_string())
                .with_details(json!({ "shift_id": shift_id, "refresh": true })),
            RosterError::Storage(_) | RosterError::Config(_) => {
                tracing::error!("Storage error: {:?}", err);
                ApiError::from_code(code)
            }
            RosterError::Validation(_) | RosterError::Forbidden { .. } => {
                ApiError::new(code, err.to_string())
            }
        }
    }
}

/// Convert from tokio_postgres::Error to ApiError.
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        ApiError::database_error("Database operation failed")
    }
}

/// Convert from deadpool_postgres::PoolError to ApiError.
impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!("Connection pool error: {:?}", err);

        match err {
            deadpool_postgres::PoolError::Timeout(_) => ApiError::connection_pool_exhausted(),
            deadpool_postgres::PoolError::Closed => {
                ApiError::service_unavailable("Database connection pool is closed")
            }
            _ => ApiError::database_error("Failed to acquire database connection"),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON serialization error: {:?}", err);
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

impl From<uuid::Error> for ApiError {
    fn from(err: uuid::Error) -> Self {
        ApiError::invalid_format("id", &format!("valid UUID: {}", err))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use roster_core::{StorageError, ValidationError};

    proptest! {
        #[test]
        fn prop_backend_reasons_never_reach_the_client(suffix in "[a-z0-9]{4,24}") {
            let reason = format!("pg-{suffix}");
            let err = ApiError::from(RosterError::from(StorageError::Backend {
                reason: reason.clone(),
            }));
            prop_assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            prop_assert!(!err.message.contains(&reason));
            prop_assert!(err.details.is_none());
        }

        #[test]
        fn prop_field_errors_are_client_errors(field in "[a-z_]{1,16}", reason in "[a-z ]{1,32}") {
            let err = ApiError::from(RosterError::from(ValidationError::InvalidValue {
                field,
                reason,
            }));
            prop_assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }
}
