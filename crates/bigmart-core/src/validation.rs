//! # Validation Module
//!
//! Form validation for BigMart documents.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Screen                                                       │
//! │  └── Inline "required" hints while typing                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Repository submit (Rust)                                     │
//! │  └── THIS MODULE: refuse to write, notify the user                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Hosted store                                                 │
//! │  └── Security rules only; no schema, no foreign keys                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bigmart_core::validation::{validate_required, validate_numeric};
//!
//! assert!(validate_required("unit", "pcs").is_ok());
//! assert!(validate_numeric("price", "abc").is_err());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::MAX_TEXT_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Largest quantity accepted for one sale line.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required text field.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most `MAX_TEXT_LEN` characters
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        });
    }

    Ok(())
}

/// Validates a location name. Locations are stored trimmed, so only the
/// trimmed form matters.
pub fn validate_location_name(name: &str) -> ValidationResult<()> {
    validate_required("name", name)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a numeric string field (quantity, price, totals).
///
/// ## Rules
/// - Required
/// - Must be a plain decimal number (`"3"`, `"2.50"`)
/// - Must not be negative
pub fn validate_numeric(field: &str, value: &str) -> ValidationResult<()> {
    validate_required(field, value)?;

    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a number".to_string(),
        })?;

    if !parsed.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a number".to_string(),
        });
    }

    if parsed < 0.0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a line quantity entered on the bulk sale screen.
///
/// ## User Workflow
/// ```text
/// User types "3" ──► validate_quantity_input ──► Ok(3)
/// User types ""  ──► Err("Please select a product and enter quantity.")
/// User types "0" ──► Err("quantity must be positive")
/// User types "99999999999999999999" ──► Err("quantity must be at most 1000000")
/// ```
pub fn validate_quantity_input(value: &str) -> ValidationResult<i64> {
    let qty = crate::aggregate::parse_int_prefix(value).ok_or_else(|| {
        ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: "must be a whole number".to_string(),
        }
    })?;

    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::TooLarge {
            field: "quantity".to_string(),
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(qty)
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates an ISO day date (`YYYY-MM-DD`).
pub fn validate_iso_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a date in YYYY-MM-DD form".to_string(),
        }
    })
}

/// Formats a date the way sale and purchase documents store it.
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required() {
        assert!(validate_required("name", "Pen").is_ok());
        assert!(validate_required("name", "").is_err());
        assert!(validate_required("name", "   ").is_err());
        assert!(validate_required("name", &"A".repeat(MAX_TEXT_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_numeric() {
        assert!(validate_numeric("price", "2.50").is_ok());
        assert!(validate_numeric("quantity", "10").is_ok());
        assert!(validate_numeric("quantity", "0").is_ok());

        assert!(matches!(
            validate_numeric("quantity", ""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_numeric("quantity", "ten"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            validate_numeric("quantity", "-1"),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_numeric("quantity", "inf").is_err());
    }

    #[test]
    fn test_validate_quantity_input() {
        assert_eq!(validate_quantity_input("3").unwrap(), 3);
        assert_eq!(validate_quantity_input(" 12 ").unwrap(), 12);
        assert!(validate_quantity_input("").is_err());
        assert!(validate_quantity_input("0").is_err());
        assert!(validate_quantity_input("x").is_err());
    }

    #[test]
    fn test_validate_quantity_input_upper_bound() {
        assert_eq!(validate_quantity_input("1000000").unwrap(), MAX_LINE_QUANTITY);
        assert!(matches!(
            validate_quantity_input("1000001"),
            Err(ValidationError::TooLarge { max: 1_000_000, .. })
        ));
        // Saturates to i64::MAX while parsing; still rejected.
        assert!(matches!(
            validate_quantity_input("99999999999999999999"),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_iso_date() {
        let date = validate_iso_date("soldDate", "2024-02-29").unwrap();
        assert_eq!(format_iso_date(date), "2024-02-29");

        assert!(validate_iso_date("soldDate", "2023-02-29").is_err());
        assert!(validate_iso_date("soldDate", "03/01/2024").is_err());
        assert!(matches!(
            validate_iso_date("soldDate", ""),
            Err(ValidationError::Required { .. })
        ));
    }
}
