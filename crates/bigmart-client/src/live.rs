//! # Live Tables
//!
//! A [`TableView`] kept in step with a store subscription.
//!
//! ## Update Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         LiveTable                                       │
//! │                                                                         │
//! │  store write ──► Subscription (watch) ──► next_change().await           │
//! │                                                │                        │
//! │                                                ▼                        │
//! │                              Snapshot ──► rows ──► TableView::set_rows  │
//! │                                                          │              │
//! │                          sort column + filter text kept ─┘              │
//! │                                                                         │
//! │  Screen controls call select_sort_column / set_filter_text directly;    │
//! │  they never touch the store.                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bigmart_core::rows::{project_rows, Row};
use bigmart_core::view::TableSpec;
use bigmart_core::{CoreResult, TableView};
use tracing::{debug, warn};

use crate::error::StoreResult;
use crate::store::Subscription;

/// A sortable, filterable table that follows one collection.
#[derive(Debug)]
pub struct LiveTable {
    subscription: Subscription,
    view: TableView,
    ignored: usize,
}

impl LiveTable {
    /// Wraps a subscription and applies whatever value it already holds.
    pub fn new(subscription: Subscription, spec: TableSpec) -> Self {
        let mut table = LiveTable {
            subscription,
            view: TableView::new(spec),
            ignored: 0,
        };
        table.apply();
        table
    }

    fn apply(&mut self) {
        let snapshot = self.subscription.snapshot();
        if snapshot.ignored() > 0 {
            debug!(
                path = %self.subscription.path(),
                ignored = snapshot.ignored(),
                "Skipped non-record children"
            );
        }
        self.ignored = snapshot.ignored();
        self.view.set_rows(project_rows(&snapshot));
        debug!(
            path = %self.subscription.path(),
            rows = self.view.rows().len(),
            "Snapshot applied"
        );
    }

    /// Applies a pending snapshot without waiting. Returns true if one was
    /// applied.
    pub fn refresh(&mut self) -> StoreResult<bool> {
        if self.subscription.has_changed()? {
            self.apply();
            return Ok(true);
        }
        Ok(false)
    }

    /// Waits for the next snapshot and applies it.
    ///
    /// ## Errors
    /// - `SubscriptionClosed` once the store is gone; the last rows stay.
    pub async fn next_change(&mut self) -> StoreResult<()> {
        if let Err(e) = self.subscription.changed().await {
            warn!(path = %self.subscription.path(), "Live table lost its subscription");
            return Err(e);
        }
        self.apply();
        Ok(())
    }

    /// Stops following the collection.
    pub fn cancel(self) {
        self.subscription.cancel();
    }

    pub fn path(&self) -> &str {
        self.subscription.path()
    }

    pub fn view(&self) -> &TableView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut TableView {
        &mut self.view
    }

    /// Header tap. See [`TableView::select_sort_column`].
    pub fn select_sort_column(&mut self, column: &str) -> CoreResult<()> {
        self.view.select_sort_column(column)
    }

    pub fn set_filter_text(&mut self, text: &str) {
        self.view.set_filter_text(text);
    }

    /// Rows to display, sorted and filtered.
    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> {
        self.view.visible_rows()
    }

    /// All rows of the latest snapshot, in key order.
    pub fn rows(&self) -> &[Row] {
        self.view.rows()
    }

    /// Children of the latest snapshot that were not records.
    pub fn ignored(&self) -> usize {
        self.ignored
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::memory::MemoryStore;
    use crate::store::RemoteStore;
    use bigmart_core::{Entity, Product};
    use serde_json::json;

    fn ids(table: &LiveTable) -> Vec<String> {
        table.visible_rows().map(|r| r.id.clone()).collect()
    }

    #[tokio::test]
    async fn test_existing_data_is_shown_immediately() {
        let store = MemoryStore::with_data(json!({
            "products": {
                "p1": {"productName": "Soap", "quantity": "3"},
                "p2": {"productName": "Apple", "quantity": "12"},
                "junk": 5
            }
        }));
        let sub = store.subscribe("products").await.unwrap();
        let table = LiveTable::new(sub, Product::table_spec());

        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.ignored(), 1);
        assert_eq!(table.path(), "products");
    }

    #[tokio::test]
    async fn test_sort_and_filter_survive_updates() {
        let store = MemoryStore::new();
        store
            .set("products/p1", json!({"productName": "Soap", "quantity": "3"}))
            .await
            .unwrap();
        let sub = store.subscribe("products").await.unwrap();
        let mut table = LiveTable::new(sub, Product::table_spec());

        table.select_sort_column("quantity").unwrap();
        table.select_sort_column("quantity").unwrap();
        assert!(!table.view().sort_ascending());

        store
            .set("products/p2", json!({"productName": "Sugar", "quantity": "12"}))
            .await
            .unwrap();
        table.next_change().await.unwrap();
        assert_eq!(ids(&table), vec!["p2", "p1"]);

        table.set_filter_text("SUG");
        assert_eq!(ids(&table), vec!["p2"]);

        store
            .set("products/p3", json!({"productName": "Brown sugar", "quantity": "40"}))
            .await
            .unwrap();
        assert!(table.refresh().unwrap());
        assert_eq!(ids(&table), vec!["p3", "p2"]);
        assert!(!table.refresh().unwrap());
    }

    #[tokio::test]
    async fn test_unsortable_column_is_rejected() {
        let store = MemoryStore::new();
        let sub = store.subscribe("products").await.unwrap();
        let mut table = LiveTable::new(sub, Product::table_spec());

        assert!(table.select_sort_column("description").is_err());
        assert_eq!(table.view().sort_column(), None);
    }

    #[tokio::test]
    async fn test_closed_store_keeps_last_rows() {
        let store = MemoryStore::with_data(json!({"products": {"p1": {"productName": "Soap"}}}));
        let sub = store.subscribe("products").await.unwrap();
        let mut table = LiveTable::new(sub, Product::table_spec());
        drop(store);

        assert!(matches!(
            table.next_change().await,
            Err(StoreError::SubscriptionClosed(_))
        ));
        assert_eq!(table.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_releases_subscriber() {
        let store = MemoryStore::new();
        let sub = store.subscribe("products").await.unwrap();
        let table = LiveTable::new(sub, TableSpec::unrestricted());
        assert_eq!(store.subscriber_count().await, 1);

        table.cancel();
        assert_eq!(store.subscriber_count().await, 0);
    }
}
