//! # Service Error Type
//!
//! Unified error type for the exposed operations.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Service                            │
//! │                                                                         │
//! │  Operation body                                                         │
//! │  Result<Response<T>, ServiceError>                                      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Database Error? ─── DbError::QueryFailed("...") ──┐                   │
//! │         │                                          │  classified +     │
//! │         ▼                                          ▼  logged here      │
//! │  Core/Validation Error? ── CoreError ───────── ServiceError ──────►    │
//! │         │                                          │                   │
//! │         ▼                                          ▼                   │
//! │  Success ──────────────────────────────► Response envelope             │
//! │                                                                         │
//! │  Policy: Validation before mutation; NotFound/Forbidden short-circuit; │
//! │  Unexpected is logged with full context and surfaced generically.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use storefront_core::{CoreError, ValidationError};
use storefront_db::DbError;

/// Error returned by operation bodies before envelope conversion.
///
/// ## Serialization
/// Carries both a machine-readable `code` and a human-readable `message`;
/// the envelope keeps only the message, the code is for programmatic
/// callers and tests.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for the operation taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Customer/item/cart/line/purchase/discount-profile absent
    NotFound,

    /// Ownership mismatch: acting on another customer's cart or purchase
    Forbidden,

    /// Input invalid; detected before any mutation is staged
    Validation,

    /// Concurrent mutation detected
    Conflict,

    /// Persistence/infrastructure failure; logged, surfaced generically
    Unexpected,
}

impl ServiceError {
    /// Creates a new service error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ServiceError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ServiceError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::Forbidden, message)
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::Validation, message)
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::Conflict, message)
    }

    /// Creates an unexpected error with a generic public message.
    pub fn unexpected(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::Unexpected, message)
    }
}

/// Converts database errors to service errors.
///
/// Infrastructure failures are logged here with their internal detail; the
/// message that travels outward stays generic.
impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ServiceError::not_found(&entity, &id),
            DbError::Conflict { entity, id } => ServiceError::conflict(format!(
                "{} was modified concurrently: {}",
                entity, id
            )),
            DbError::UniqueViolation { field, .. } => {
                ServiceError::conflict(format!("Conflicting write on {}", field))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ServiceError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ServiceError::unexpected("Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ServiceError::unexpected("Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ServiceError::unexpected("Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ServiceError::unexpected("Database transaction failed")
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ServiceError::unexpected("Database operation failed")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ServiceError::unexpected("Database operation failed")
            }
        }
    }
}

/// Converts core errors to service errors.
impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::LineNotFound(_) => {
                ServiceError::new(ErrorCode::NotFound, "Item not found in the cart")
            }
            CoreError::CartTooLarge { max } => ServiceError::validation(format!(
                "Cart cannot have more than {} lines",
                max
            )),
            CoreError::QuantityTooLarge { requested, max } => ServiceError::validation(format!(
                "Quantity {} exceeds maximum allowed ({})",
                requested, max
            )),
            CoreError::Validation(e) => ServiceError::validation(e.to_string()),
        }
    }
}

/// Converts validation errors to service errors.
impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::validation(err.to_string())
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ServiceError {}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = ServiceError::not_found("Cart", "abc");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Cart not found: abc");
    }

    #[test]
    fn test_db_not_found_maps_through() {
        let err: ServiceError = DbError::not_found("Item", "i-1").into();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_internal_db_error_is_generic() {
        let err: ServiceError = DbError::Internal("corrupt decimal in price".to_string()).into();
        assert_eq!(err.code, ErrorCode::Unexpected);
        // Internal detail must not leak to callers
        assert!(!err.message.contains("decimal"));
    }

    #[test]
    fn test_core_validation_maps_to_validation() {
        let err: ServiceError = CoreError::Validation(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(err.message, "quantity must be positive");
    }
}
