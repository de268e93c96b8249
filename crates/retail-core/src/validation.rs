//! # Validation Module
//!
//! Explicit input-validation functions, each returning a typed result.
//!
//! These run before any store access, so a rejected request has no effects
//! to undo. The transport layer (HTTP, CSV import, whatever) is expected to
//! deserialize into the request types and hand them here; nothing in this
//! module knows where the input came from.
//!
//! ## Usage
//! ```rust
//! use retail_core::types::LineRequest;
//! use retail_core::validation::validate_line_requests;
//!
//! let lines = vec![LineRequest::new("P001", 2)];
//! assert!(validate_line_requests(&lines).is_ok());
//! assert!(validate_line_requests(&[]).is_err());
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::LineRequest;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted item code.
pub const MAX_ITEM_CODE_LEN: usize = 50;

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a transaction request before the engine touches the store.
///
/// ## Rules
/// - At least one line (`EmptyRequest` otherwise)
/// - Every quantity >= 1
/// - Every item code well-formed (existence is checked later, against the
///   catalog, by the engine itself)
pub fn validate_line_requests(lines: &[LineRequest]) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(CoreError::EmptyRequest);
    }

    for line in lines {
        validate_item_code(&line.item_code)?;
        validate_quantity(line.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates an item code.
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_ITEM_CODE_LEN`] characters
/// - Only alphanumeric characters, hyphens and underscores
///
/// ## Example
/// ```rust
/// use retail_core::validation::validate_item_code;
///
/// assert!(validate_item_code("P001").is_ok());
/// assert!(validate_item_code("").is_err());
/// assert!(validate_item_code("has space").is_err());
/// ```
pub fn validate_item_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "item_code".to_string(),
        });
    }

    if code.len() > MAX_ITEM_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "item_code".to_string(),
            max: MAX_ITEM_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "item_code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a requested quantity.
///
/// ## Rules
/// - Must be positive (>= 1)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (zero is allowed: promotional items)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a starting or current stock quantity.
///
/// ## Rules
/// - Must be non-negative
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock quantity".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_line_requests_ok() {
        let lines = vec![LineRequest::new("P001", 2), LineRequest::new("B001", 1)];
        assert!(validate_line_requests(&lines).is_ok());
    }

    #[test]
    fn test_validate_line_requests_empty() {
        let err = validate_line_requests(&[]).unwrap_err();
        assert!(matches!(err, CoreError::EmptyRequest));
    }

    #[test]
    fn test_validate_line_requests_bad_quantity() {
        let lines = vec![LineRequest::new("P001", 0)];
        let err = validate_line_requests(&lines).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MustBePositive { .. })
        ));

        let lines = vec![LineRequest::new("P001", -3)];
        assert!(validate_line_requests(&lines).is_err());
    }

    #[test]
    fn test_validate_item_code() {
        assert!(validate_item_code("P001").is_ok());
        assert!(validate_item_code("ITEM_42-X").is_ok());

        assert!(validate_item_code("").is_err());
        assert!(validate_item_code("   ").is_err());
        assert!(validate_item_code("has space").is_err());
        assert!(validate_item_code(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-1).is_err());
    }

    #[test]
    fn test_validate_stock_quantity() {
        assert!(validate_stock_quantity(0).is_ok());
        assert!(validate_stock_quantity(50).is_ok());
        assert!(validate_stock_quantity(-1).is_err());
    }
}
