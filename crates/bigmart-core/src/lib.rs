//! # bigmart-core: Pure Client Logic for BigMart POS
//!
//! This crate holds everything the BigMart screens compute from store
//! snapshots, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        BigMart Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Screens (out of scope)                       │   │
//! │  │   Products ─ Vendors ─ Customers ─ Sales ─ Dashboard ─ Settings │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  bigmart-client (async I/O)                     │   │
//! │  │   RemoteStore ─ AuthGate ─ Repository ─ LiveTable ─ Dashboard   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ snapshots                              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ bigmart-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   rows    │  │   view    │  │ aggregate │  │   sale    │  │   │
//! │  │   │ Snapshot  │  │ TableView │  │  Series   │  │ SaleDraft │  │   │
//! │  │   │   Row     │  │ TableSpec │  │  Lookup   │  │ DraftLine │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORE • NO NETWORK • PURE FUNCTIONS               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Documents (Product, Vendor, Sale, ...) and their collections
//! - [`rows`] - Snapshot → row projection
//! - [`view`] - Sort and filter state of a list screen
//! - [`aggregate`] - Group-and-sum into chart series
//! - [`dashboard`] - The three dashboard charts
//! - [`sale`] - Bulk sale draft
//! - [`money`] - Integer cents for sale line math
//! - [`validation`] - Form checks before anything is written
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use bigmart_core::rows::project_value;
//! use bigmart_core::view::TableView;
//! use bigmart_core::{Entity, Product};
//! use serde_json::json;
//!
//! let snapshot = json!({
//!     "k1": {"productName": "Pen", "quantity": "10", "price": "1.00", "unit": "pcs"},
//!     "k2": {"productName": "Pad", "quantity": "5", "price": "2.00", "unit": "pcs"}
//! });
//!
//! let mut view = TableView::new(Product::table_spec());
//! view.set_rows(project_value(Some(&snapshot)));
//! view.select_sort_column("quantity").unwrap();
//!
//! let first = view.visible_rows().next().unwrap();
//! assert_eq!(first.id, "k2");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregate;
pub mod dashboard;
pub mod error;
pub mod money;
pub mod rows;
pub mod sale;
pub mod types;
pub mod validation;
pub mod view;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use aggregate::{Aggregation, SeriesPoint, SkipCounts};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use rows::{Record, Row, Snapshot};
pub use types::*;
pub use view::{TableSpec, TableView};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of any free-text form field, in characters.
pub const MAX_TEXT_LEN: usize = 200;
