//! # Engine Error Types
//!
//! The umbrella error surfaced to the service layer. Business failures keep
//! their `CoreError` identity (the transport maps them to status codes);
//! storage failures arrive as `DbError`.

use thiserror::Error;

use retail_core::CoreError;
use retail_db::DbError;

/// Errors surfaced by the transaction and analytics engines.
///
/// By the time a `Core` error from `create_transaction` reaches the caller,
/// compensation has already run: stock restored, partial records deleted.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule violation (item not found, insufficient stock, invalid
    /// range, empty request, ...).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure.
    #[error(transparent)]
    Db(#[from] DbError),

    /// A report value failed to (de)serialize for the result cache.
    #[error("Cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_passes_through() {
        let err: EngineError = CoreError::EmptyRequest.into();
        assert_eq!(err.to_string(), "Transaction request contains no lines");
    }

    #[test]
    fn test_db_error_passes_through() {
        let err: EngineError = DbError::PoolExhausted.into();
        assert_eq!(err.to_string(), "Connection pool exhausted");
    }
}
