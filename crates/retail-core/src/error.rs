//! # Error Types
//!
//! Domain-specific error types for retail-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  retail-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  retail-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  retail-engine errors                                                  │
//! │  └── EngineError      - Core | Db umbrella seen by the service layer   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every failure of `create_transaction` carrying one of the first two
/// variants is surfaced only after the engine has fully compensated the
/// partial transaction; callers never observe a half-applied sale.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced item code does not exist in the catalog.
    #[error("Item not found: {code}")]
    ItemNotFound { code: String },

    /// Requested quantity exceeds the item's current stock.
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// A range-based query was given a start date after its end date.
    /// Surfaced before any aggregation runs.
    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// A transaction request with zero lines. Rejected before any store
    /// access.
    #[error("Transaction request contains no lines")]
    EmptyRequest,

    /// Transaction id does not exist in the ledger. Also raised when
    /// `undo_transaction` is invoked twice for the same id: the second call
    /// is a precondition violation, not a no-op.
    #[error("Transaction not found: {id}")]
    TransactionNotFound { id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Returned by the explicit validation functions in [`crate::validation`],
/// decoupled from whatever transport carried the request.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed item code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            code: "P001".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for P001: available 3, requested 5"
        );

        let err = CoreError::ItemNotFound {
            code: "P111".to_string(),
        };
        assert_eq!(err.to_string(), "Item not found: P111");
    }

    #[test]
    fn test_invalid_range_message() {
        let err = CoreError::InvalidRange {
            start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        assert_eq!(err.to_string(), "Invalid date range: 2024-02-01 is after 2024-01-01");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
