//! # bigmart-client: Store and Auth Plumbing for BigMart POS
//!
//! This crate connects the pure logic in `bigmart-core` to the hosted
//! realtime store and authentication service, behind two ports that can be
//! swapped for in-process implementations.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      bigmart-client                                     │
//! │                                                                         │
//! │  ┌───────────────────────────────────────────────────────────────────┐ │
//! │  │                          BigMart                                  │ │
//! │  │   config ─ session ─ repositories ─ dashboard ─ location settings │ │
//! │  └───────┬───────────────────────┬───────────────────────┬──────────┘ │
//! │          │                       │                       │            │
//! │  ┌───────▼───────┐      ┌────────▼────────┐     ┌────────▼────────┐   │
//! │  │  Repository   │      │   LiveTable     │     │  LiveDashboard  │   │
//! │  │  validate →   │      │  Subscription → │     │  3 × Subscription│  │
//! │  │  write        │      │  TableView      │     │  → Summary      │   │
//! │  └───────┬───────┘      └────────┬────────┘     └────────┬────────┘   │
//! │          └───────────────────────┼───────────────────────┘            │
//! │                                  │                                    │
//! │  ┌───────────────────────────────▼──────────────┐  ┌────────────────┐ │
//! │  │          RemoteStore (port)                  │  │ AuthGate (port)│ │
//! │  │  subscribe ─ get ─ append ─ set ─ update ─   │  │ sign_in/up/out │ │
//! │  │  remove                                      │  │ identity watch │ │
//! │  └───────────────────────────────┬──────────────┘  └───────┬────────┘ │
//! │                                  │                          │          │
//! │                      MemoryStore (in-process)     MemoryAuthGate       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! ### Ports
//! - [`store`] - `RemoteStore` trait, paths and `Subscription`
//! - [`auth`] - `AuthGate` trait, `Identity`, `MemoryAuthGate`
//! - [`memory`] - `MemoryStore`, the in-process realtime store
//!
//! ### Screen State
//! - [`repository`] - Validated writes and typed reads per collection
//! - [`live`] - Sortable, filterable tables that follow a collection
//! - [`dashboard`] - Charts recomputed on every change
//! - [`settings`] - Per-identity location preference
//! - [`session`] - Sign-in, sign-up, sign-out with alert-ready errors
//! - [`client`] - `BigMart`, the handle that ties it all together
//!
//! ### Ambient
//! - [`config`] - TOML + environment configuration
//! - [`telemetry`] - Tracing subscriber setup
//! - [`error`] - Store, auth and client error types
//!
//! ## Usage
//!
//! ```rust
//! use bigmart_client::{BigMart, ClientConfig};
//! use bigmart_core::Product;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let client = BigMart::in_memory(ClientConfig::default());
//!
//! let mut products = client.products().watch().await.unwrap();
//! client
//!     .products()
//!     .create(&Product {
//!         product_name: "Pen".to_string(),
//!         quantity: "10".to_string(),
//!         price: "1.50".to_string(),
//!         unit: "pcs".to_string(),
//!         description: None,
//!     })
//!     .await
//!     .unwrap();
//!
//! products.next_change().await.unwrap();
//! assert_eq!(products.visible_rows().count(), 1);
//! # });
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

// Ports
pub mod auth;
pub mod memory;
pub mod store;

// Screen state
pub mod client;
pub mod dashboard;
pub mod live;
pub mod repository;
pub mod session;
pub mod settings;

// Ambient
pub mod config;
pub mod error;
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use auth::{AuthGate, Identity, MemoryAuthGate};
pub use client::BigMart;
pub use config::{BackendSettings, ClientConfig, DashboardSettings, LoggingSettings};
pub use dashboard::LiveDashboard;
pub use error::{AuthError, ClientError, ClientResult, Notice, StoreError, StoreResult};
pub use live::LiveTable;
pub use memory::MemoryStore;
pub use repository::Repository;
pub use session::Session;
pub use settings::{LocationSettings, SelectionOutcome};
pub use store::{RemoteStore, Subscription};
pub use telemetry::init_tracing;
