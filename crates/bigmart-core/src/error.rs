//! # Error Types
//!
//! Domain-specific error types for bigmart-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bigmart-core errors (this file)                                       │
//! │  ├── CoreError        - Table / draft rule violations                  │
//! │  └── ValidationError  - Form submission failures                       │
//! │                                                                         │
//! │  bigmart-client errors (separate crate)                                │
//! │  ├── StoreError       - Remote collection store failures               │
//! │  ├── AuthError        - Sign-in / sign-up failures                     │
//! │  └── ClientError      - What the screen shows (notification)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → Notification        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unresolved references in aggregation are NOT errors: they are counted
//! and skipped (see [`crate::aggregate::SkipCounts`]).

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core logic errors.
///
/// Nothing here is fatal: every variant leaves the view state unchanged and
/// is shown to the user as a notification.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A column outside the table's sortable set was selected.
    #[error("Column '{0}' is not sortable")]
    ColumnNotSortable(String),

    /// A product chosen for a sale line is not in the current product list.
    ///
    /// ## When This Occurs
    /// - The product was deleted after the picker was populated
    /// - A stale key survived a snapshot refresh
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A sale line index is out of range.
    #[error("Sale line {index} does not exist (draft has {len} lines)")]
    LineNotFound { index: usize, len: usize },

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Form validation errors.
///
/// Raised before anything is written to the store. A submit that fails
/// validation has no persisted side effect.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value is above what the field allows (or the arithmetic can hold).
    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: i64 },

    /// Invalid format (e.g., not a number, not a YYYY-MM-DD date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A multi-field form rule failed; the message is shown as-is.
    #[error("{0}")]
    Incomplete(String),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
