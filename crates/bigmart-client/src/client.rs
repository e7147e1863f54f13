//! # BigMart Client
//!
//! One handle that wires the store, the auth gate and the config together
//! and hands out everything a screen needs.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. ClientConfig::load_or_default(None)                                 │
//! │  2. init_tracing(&config.logging.filter)                                │
//! │  3. BigMart::new(config, store, auth)                                   │
//! │        │                                                                │
//! │        ├── products() / vendors() / ...   Repository<T>                 │
//! │        ├── dashboard()                    LiveDashboard                 │
//! │        ├── location_settings()            LocationSettings              │
//! │        ├── sale_draft()                   SaleDraft (today)             │
//! │        └── session()                      Session                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use bigmart_core::sale::SaleDraft;
use bigmart_core::{Customer, Entity, Location, Product, Purchase, Sale, Vendor};
use tracing::info;

use crate::auth::{AuthGate, MemoryAuthGate};
use crate::config::ClientConfig;
use crate::dashboard::LiveDashboard;
use crate::error::ClientResult;
use crate::memory::MemoryStore;
use crate::repository::Repository;
use crate::session::Session;
use crate::settings::LocationSettings;
use crate::store::RemoteStore;

/// Entry point of the client.
#[derive(Clone)]
pub struct BigMart {
    config: ClientConfig,
    store: Arc<dyn RemoteStore>,
    session: Session,
}

impl std::fmt::Debug for BigMart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BigMart")
            .field("session", &self.session)
            .finish()
    }
}

impl BigMart {
    pub fn new(config: ClientConfig, store: Arc<dyn RemoteStore>, auth: Arc<dyn AuthGate>) -> Self {
        info!(
            backend_configured = config.backend.is_configured(),
            expand_bulk_sales = config.dashboard.expand_bulk_sales,
            "BigMart client ready"
        );
        BigMart {
            config,
            store,
            session: Session::new(auth),
        }
    }

    /// A client backed by the in-process store and auth gate.
    pub fn in_memory(config: ClientConfig) -> Self {
        Self::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryAuthGate::new()),
        )
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn RemoteStore> {
        Arc::clone(&self.store)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Repository for any entity type.
    pub fn repository<T: Entity>(&self) -> Repository<T> {
        Repository::new(self.store())
    }

    pub fn products(&self) -> Repository<Product> {
        self.repository()
    }

    pub fn vendors(&self) -> Repository<Vendor> {
        self.repository()
    }

    pub fn customers(&self) -> Repository<Customer> {
        self.repository()
    }

    pub fn locations(&self) -> Repository<Location> {
        self.repository()
    }

    pub fn purchases(&self) -> Repository<Purchase> {
        self.repository()
    }

    pub fn sales(&self) -> Repository<Sale> {
        self.repository()
    }

    /// Live dashboard using the configured bulk-sale handling.
    pub async fn dashboard(&self) -> ClientResult<LiveDashboard> {
        Ok(LiveDashboard::open(self.store.as_ref(), self.config.dashboard_options()).await?)
    }

    /// Settings screen state for whoever is signed in now.
    pub async fn location_settings(&self) -> ClientResult<LocationSettings> {
        LocationSettings::open(self.store(), self.session.identity()).await
    }

    /// An empty bulk sale dated today (local time).
    pub fn sale_draft(&self) -> SaleDraft {
        SaleDraft::new(chrono::Local::now().date_naive())
    }

    /// Validates and stores a finished draft, then clears it for the next
    /// sale. The draft is left untouched when anything fails.
    pub async fn submit_sale(&self, draft: &mut SaleDraft) -> ClientResult<String> {
        let sale = draft.submit()?;
        let key = self.sales().create(&sale).await?;
        info!(%key, lines = draft.lines().len(), "Bulk sale recorded");
        draft.reset();
        Ok(key)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
