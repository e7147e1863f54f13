//! # Dashboard Model
//!
//! The three dashboard charts, computed from the current products,
//! purchases and sales rows.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Chart               Rows        Label                    Quantity      │
//! │  ─────               ────        ─────                    ────────      │
//! │  Sales by Product    sales       products[product].name   quantity      │
//! │  (pie)                                                                  │
//! │  Purchases Per Day   purchases   datePurchased            quantity      │
//! │  (bar)                                                                  │
//! │  Sales Per Day       sales       soldDate                 quantity      │
//! │  (line)                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Bulk sales carry their quantities inside `products` lines, not at the top
//! level, so by default they fall out of both sales charts as unresolved or
//! unparseable. [`DashboardOptions::expand_bulk_sales`] flattens each line
//! into its own sale row first.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::aggregate::{group_and_sum, Aggregation, LabelSource, LookupTable};
use crate::rows::{Record, Row};

/// Pie colors, assigned by slice index.
pub const PIE_PALETTE: [&str; 6] = [
    "#ff6384", "#36a2eb", "#ffce56", "#4caf50", "#9c27b0", "#f57c00",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardOptions {
    /// Expand bulk-sale lines into per-line rows before aggregating.
    pub expand_bulk_sales: bool,
}

/// One slice of the sales-by-product pie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PieSlice {
    pub name: String,
    pub quantity: i64,
    pub color: String,
}

/// Everything the dashboard screen renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub sales_by_product: Aggregation,
    pub purchases_per_day: Aggregation,
    pub sales_per_day: Aggregation,
}

impl DashboardSummary {
    /// Computes all three charts.
    pub fn compute(
        products: &[Row],
        purchases: &[Row],
        sales: &[Row],
        options: DashboardOptions,
    ) -> Self {
        let expanded;
        let sales: &[Row] = if options.expand_bulk_sales {
            expanded = expand_bulk_sale_rows(sales);
            &expanded
        } else {
            sales
        };

        DashboardSummary {
            sales_by_product: sales_by_product(sales, products),
            purchases_per_day: purchases_by_date(purchases),
            sales_per_day: sales_by_date(sales),
        }
    }

    pub fn pie_slices(&self) -> Vec<PieSlice> {
        pie_slices(&self.sales_by_product)
    }
}

/// Units sold per product name. Sales reference products by key.
pub fn sales_by_product(sales: &[Row], products: &[Row]) -> Aggregation {
    let table = LookupTable::by_id(products, "productName");
    group_and_sum(
        sales,
        LabelSource::Join {
            field: "product",
            table: &table,
        },
        "quantity",
    )
}

/// Units purchased per `datePurchased`.
pub fn purchases_by_date(purchases: &[Row]) -> Aggregation {
    group_and_sum(purchases, LabelSource::Field("datePurchased"), "quantity")
}

/// Units sold per `soldDate`.
pub fn sales_by_date(sales: &[Row]) -> Aggregation {
    group_and_sum(sales, LabelSource::Field("soldDate"), "quantity")
}

/// Colors a series for the pie chart.
pub fn pie_slices(aggregation: &Aggregation) -> Vec<PieSlice> {
    aggregation
        .series
        .iter()
        .enumerate()
        .map(|(i, point)| PieSlice {
            name: point.label.clone(),
            quantity: point.value,
            color: PIE_PALETTE[i % PIE_PALETTE.len()].to_string(),
        })
        .collect()
}

/// Replaces every bulk sale with one single-item row per line.
///
/// Line rows are keyed `{sale key}/{line index}` and carry `product`,
/// `quantity` and `price` from the line plus the sale's `customer` and
/// `soldDate`. Single-item sales pass through unchanged.
pub fn expand_bulk_sale_rows(sales: &[Row]) -> Vec<Row> {
    let mut out = Vec::with_capacity(sales.len());

    for sale in sales {
        let Some(Value::Array(lines)) = sale.fields.get("products") else {
            out.push(sale.clone());
            continue;
        };

        for (i, line) in lines.iter().enumerate() {
            let Value::Object(line) = line else {
                continue;
            };

            let mut fields = Record::new();
            for (from, to) in [("id", "product"), ("quantity", "quantity"), ("price", "price")] {
                if let Some(v) = line.get(from) {
                    fields.insert(to.to_string(), v.clone());
                }
            }
            for shared in ["customer", "soldDate"] {
                if let Some(v) = sale.fields.get(shared) {
                    fields.insert(shared.to_string(), v.clone());
                }
            }

            out.push(Row::new(format!("{}/{}", sale.id, i), fields));
        }
    }

    out
}

// =============================================================================
// Unit Tests
// =============================================================================
