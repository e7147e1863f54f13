//! # Live Dashboard
//!
//! Follows products, purchases and sales and recomputes the three charts
//! whenever any of them changes.
//!
//! ```text
//! products  ──┐
//! purchases ──┼──► select! ──► DashboardSummary::compute ──► charts
//! sales     ──┘
//! ```
//!
//! Products only supply display names, so a rename shows up in the pie on
//! the next change without any sale being rewritten.

use bigmart_core::dashboard::{DashboardOptions, DashboardSummary, PieSlice};
use bigmart_core::rows::Row;
use bigmart_core::Collection;
use tracing::{debug, warn};

use crate::error::StoreResult;
use crate::store::{RemoteStore, Subscription};

/// Dashboard charts kept current against the store.
#[derive(Debug)]
pub struct LiveDashboard {
    products: Subscription,
    purchases: Subscription,
    sales: Subscription,
    options: DashboardOptions,
    summary: DashboardSummary,
}

impl LiveDashboard {
    /// Subscribes to the three source collections and computes the charts
    /// from whatever they already hold.
    pub async fn open(store: &dyn RemoteStore, options: DashboardOptions) -> StoreResult<Self> {
        let products = store.subscribe(Collection::Products.path()).await?;
        let purchases = store.subscribe(Collection::Purchases.path()).await?;
        let sales = store.subscribe(Collection::Sales.path()).await?;

        let mut dashboard = LiveDashboard {
            products,
            purchases,
            sales,
            options,
            summary: DashboardSummary::default(),
        };
        dashboard.recompute();
        Ok(dashboard)
    }

    fn recompute(&mut self) {
        let products: Vec<Row> = self.products.rows();
        let purchases: Vec<Row> = self.purchases.rows();
        let sales: Vec<Row> = self.sales.rows();

        self.summary = DashboardSummary::compute(&products, &purchases, &sales, self.options);

        let skipped = self.summary.sales_by_product.skipped.total()
            + self.summary.purchases_per_day.skipped.total()
            + self.summary.sales_per_day.skipped.total();
        debug!(
            products = products.len(),
            purchases = purchases.len(),
            sales = sales.len(),
            skipped,
            "Dashboard recomputed"
        );
    }

    /// Waits until any source collection changes, then recomputes.
    ///
    /// ## Errors
    /// - `SubscriptionClosed` if any source is gone; the last charts stay.
    pub async fn next_change(&mut self) -> StoreResult<()> {
        let result = tokio::select! {
            r = self.products.changed() => r,
            r = self.purchases.changed() => r,
            r = self.sales.changed() => r,
        };
        if let Err(e) = result {
            warn!(error = %e, "Dashboard lost a source subscription");
            return Err(e);
        }
        self.recompute();
        Ok(())
    }

    /// Recomputes if any source has an unseen value. Returns true if it did.
    pub fn refresh(&mut self) -> StoreResult<bool> {
        let pending = self.products.has_changed()?
            | self.purchases.has_changed()?
            | self.sales.has_changed()?;
        if pending {
            self.recompute();
        }
        Ok(pending)
    }

    pub fn summary(&self) -> &DashboardSummary {
        &self.summary
    }

    pub fn pie_slices(&self) -> Vec<PieSlice> {
        self.summary.pie_slices()
    }

    pub fn options(&self) -> DashboardOptions {
        self.options
    }

    /// Changes how bulk sales are counted and recomputes.
    pub fn set_options(&mut self, options: DashboardOptions) {
        if self.options != options {
            self.options = options;
            self.recompute();
        }
    }

    /// Stops following all three collections.
    pub fn cancel(self) {
        self.products.cancel();
        self.purchases.cancel();
        self.sales.cancel();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
