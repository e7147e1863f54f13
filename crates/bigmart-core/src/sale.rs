//! # Bulk Sale Draft
//!
//! The in-progress state of the "sell multiple products" form.
//!
//! ## Draft Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Sale Draft Operations                                │
//! │                                                                         │
//! │  Screen Action            Draft Method            State Change          │
//! │  ─────────────            ────────────            ────────────          │
//! │                                                                         │
//! │  Pick Customer ──────────► set_customer() ──────► customer = key       │
//! │                                                                         │
//! │  Add Product ────────────► add_line() ──────────► lines.push(line)     │
//! │                                                                         │
//! │  Remove Line ────────────► remove_line() ───────► lines.remove(i)      │
//! │                                                                         │
//! │  Pick Date ──────────────► set_sold_date() ─────► sold_date = d        │
//! │                                                                         │
//! │  Submit ─────────────────► submit() ────────────► (read only) → Sale   │
//! │                                                                         │
//! │  After the store accepts the sale: reset() clears customer and lines.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Adding the same product twice adds a second line; lines are never merged.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::rows::Row;
use crate::types::{Entity, Sale, SaleLine};
use crate::validation::{format_iso_date, validate_quantity_input};

/// Shown when "Add Product" is pressed without a product or quantity.
pub const ADD_LINE_INCOMPLETE: &str = "Please select a product and enter quantity.";

/// Shown when "Submit Sale" is pressed without a customer or lines.
pub const SUBMIT_INCOMPLETE: &str = "Please select customer and at least one product.";

/// One line of the draft.
///
/// ## Design Notes
/// `name` and `unit_price` are frozen copies of the product at the time the
/// line was added. Renaming or repricing the product afterwards does not
/// change the draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftLine {
    /// Product key.
    pub product_id: String,

    /// Product name at time of adding (frozen).
    pub name: String,

    pub quantity: i64,

    /// Unit price at time of adding (frozen).
    pub unit_price: Money,
}

impl DraftLine {
    /// Builds a line from a product row.
    ///
    /// ## Errors
    /// - `InvalidFormat` if the product's price is not a decimal number
    pub fn from_product(product: &Row, quantity: i64) -> CoreResult<Self> {
        let unit_price = product
            .text("price")
            .and_then(|p| Money::parse(&p))
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "price".to_string(),
                reason: format!("product {} has no usable price", product.id),
            })?;

        Ok(DraftLine {
            product_id: product.id.clone(),
            name: product
                .text("productName")
                .map(|n| n.into_owned())
                .unwrap_or_default(),
            quantity,
            unit_price,
        })
    }

    /// Unit price × quantity.
    ///
    /// ## Errors
    /// - `TooLarge` if the total does not fit in cents
    pub fn line_total(&self) -> CoreResult<Money> {
        self.unit_price
            .multiply_quantity(self.quantity)
            .ok_or_else(|| too_large("total"))
    }

    /// The stored form of the line.
    pub fn to_sale_line(&self) -> CoreResult<SaleLine> {
        Ok(SaleLine {
            id: self.product_id.clone(),
            name: self.name.clone(),
            quantity: self.quantity,
            price: self.unit_price.to_decimal_string(),
            total: self.line_total()?.to_decimal_string(),
        })
    }
}

fn too_large(field: &str) -> CoreError {
    ValidationError::TooLarge {
        field: field.to_string(),
        max: i64::MAX,
    }
    .into()
}

/// A bulk sale being assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDraft {
    customer: Option<String>,
    lines: Vec<DraftLine>,
    sold_date: NaiveDate,
}

impl SaleDraft {
    /// Creates an empty draft dated `sold_date` (the screen passes today).
    pub fn new(sold_date: NaiveDate) -> Self {
        SaleDraft {
            customer: None,
            lines: Vec::new(),
            sold_date,
        }
    }

    /// Selects the customer by key. An empty key clears the selection.
    pub fn set_customer(&mut self, customer_key: &str) {
        self.customer = if customer_key.is_empty() {
            None
        } else {
            Some(customer_key.to_string())
        };
    }

    pub fn customer(&self) -> Option<&str> {
        self.customer.as_deref()
    }

    pub fn set_sold_date(&mut self, date: NaiveDate) {
        self.sold_date = date;
    }

    pub fn sold_date(&self) -> NaiveDate {
        self.sold_date
    }

    /// Adds a line from the product picker and the quantity box.
    ///
    /// ## Behavior
    /// - Empty product or empty quantity: the "select a product" message
    /// - Quantity is read like the quantity box: leading integer, must be > 0
    /// - Product must be among `products` (the current product rows)
    pub fn add_line(
        &mut self,
        products: &[Row],
        product_id: &str,
        quantity_input: &str,
    ) -> CoreResult<&DraftLine> {
        if product_id.is_empty() || quantity_input.trim().is_empty() {
            return Err(ValidationError::Incomplete(ADD_LINE_INCOMPLETE.to_string()).into());
        }

        let quantity = validate_quantity_input(quantity_input)?;
        let product = products
            .iter()
            .find(|p| p.id == product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let line = DraftLine::from_product(product, quantity)?;
        line.line_total()?;

        let index = self.lines.len();
        self.lines.push(line);
        Ok(&self.lines[index])
    }

    /// Removes the line at `index`.
    pub fn remove_line(&mut self, index: usize) -> CoreResult<DraftLine> {
        if index >= self.lines.len() {
            return Err(CoreError::LineNotFound {
                index,
                len: self.lines.len(),
            });
        }
        Ok(self.lines.remove(index))
    }

    pub fn lines(&self) -> &[DraftLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all line totals.
    ///
    /// ## Errors
    /// - `TooLarge` if a line total or the sum overflows
    pub fn total_price(&self) -> CoreResult<Money> {
        self.lines.iter().try_fold(Money::zero(), |acc, line| {
            acc.checked_add(line.line_total()?)
                .ok_or_else(|| too_large("totalPrice"))
        })
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> CoreResult<i64> {
        self.lines.iter().try_fold(0i64, |acc, line| {
            acc.checked_add(line.quantity)
                .ok_or_else(|| too_large("quantity"))
        })
    }

    /// Builds the sale record to append to `sales`.
    ///
    /// Does not modify the draft; call [`SaleDraft::reset`] once the store
    /// has accepted the record.
    pub fn submit(&self) -> CoreResult<Sale> {
        let customer = match &self.customer {
            Some(c) if !self.lines.is_empty() => c.clone(),
            _ => {
                return Err(ValidationError::Incomplete(SUBMIT_INCOMPLETE.to_string()).into());
            }
        };

        let sale = Sale {
            customer,
            product: None,
            products: Some(
                self.lines
                    .iter()
                    .map(DraftLine::to_sale_line)
                    .collect::<CoreResult<Vec<_>>>()?,
            ),
            quantity: None,
            price: None,
            total_price: self.total_price()?.to_decimal_string(),
            sold_date: format_iso_date(self.sold_date),
        };
        sale.validate()?;
        Ok(sale)
    }

    /// Clears customer and lines, keeping the date.
    pub fn reset(&mut self) {
        self.customer = None;
        self.lines.clear();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::project_value;
    use serde_json::json;

    fn products() -> Vec<Row> {
        project_value(Some(&json!({
            "k1": {"productName": "Pen", "price": "2.10", "quantity": "50", "unit": "pcs"},
            "k2": {"productName": "Pad", "price": "3", "quantity": "20", "unit": "pcs"},
            "k3": {"productName": "Odd", "price": "free", "quantity": "1", "unit": "pcs"}
        })))
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_add_line_freezes_product() {
        let mut draft = SaleDraft::new(today());
        let line = draft.add_line(&products(), "k1", "3").unwrap();

        assert_eq!(line.name, "Pen");
        assert_eq!(line.unit_price.cents(), 210);
        assert_eq!(line.line_total().unwrap().to_decimal_string(), "6.30");
    }

    #[test]
    fn test_same_product_adds_second_line() {
        let mut draft = SaleDraft::new(today());
        draft.add_line(&products(), "k1", "1").unwrap();
        draft.add_line(&products(), "k1", "2").unwrap();

        assert_eq!(draft.lines().len(), 2);
        assert_eq!(draft.total_quantity().unwrap(), 3);
    }

    #[test]
    fn test_add_line_requires_product_and_quantity() {
        let mut draft = SaleDraft::new(today());

        let err = draft.add_line(&products(), "", "3").unwrap_err();
        assert_eq!(err.to_string(), ADD_LINE_INCOMPLETE);

        let err = draft.add_line(&products(), "k1", "  ").unwrap_err();
        assert_eq!(err.to_string(), ADD_LINE_INCOMPLETE);

        assert!(draft.add_line(&products(), "k1", "0").is_err());
        assert!(matches!(
            draft.add_line(&products(), "gone", "1"),
            Err(CoreError::ProductNotFound(_))
        ));
        assert!(draft.add_line(&products(), "k3", "1").is_err());
        assert!(draft.is_empty());
    }

    #[test]
    fn test_oversized_quantity_is_rejected() {
        let mut draft = SaleDraft::new(today());
        draft.set_customer("c1");

        let err = draft
            .add_line(&products(), "k1", "99999999999999999999")
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::TooLarge { .. })
        ));
        assert!(draft.is_empty());

        draft.add_line(&products(), "k1", "1000000").unwrap();
        assert_eq!(draft.submit().unwrap().total_price, "2100000.00");
    }

    #[test]
    fn test_overflowing_line_reports_instead_of_panicking() {
        let mut draft = SaleDraft::new(today());
        draft.set_customer("c1");
        draft.lines.push(DraftLine {
            product_id: "k1".to_string(),
            name: "Pen".to_string(),
            quantity: i64::MAX,
            unit_price: Money::from_cents(210),
        });

        assert!(draft.total_price().is_err());
        assert!(draft.total_quantity().is_ok());
        assert!(matches!(
            draft.submit(),
            Err(CoreError::Validation(ValidationError::TooLarge { .. }))
        ));

        let huge = project_value(Some(&json!({
            "k9": {"productName": "Gold", "price": "90000000000000000", "unit": "kg"}
        })));
        assert!(draft.add_line(&huge, "k9", "1000").is_err());
        assert_eq!(draft.lines().len(), 1);
    }

    #[test]
    fn test_remove_line() {
        let mut draft = SaleDraft::new(today());
        draft.add_line(&products(), "k1", "1").unwrap();
        draft.add_line(&products(), "k2", "1").unwrap();

        let removed = draft.remove_line(0).unwrap();
        assert_eq!(removed.product_id, "k1");
        assert_eq!(draft.lines()[0].product_id, "k2");

        assert!(matches!(
            draft.remove_line(5),
            Err(CoreError::LineNotFound { index: 5, len: 1 })
        ));
    }

    #[test]
    fn test_submit_builds_bulk_sale() {
        let mut draft = SaleDraft::new(today());
        draft.set_customer("c1");
        draft.add_line(&products(), "k1", "3").unwrap();
        draft.add_line(&products(), "k2", "2").unwrap();

        let sale = draft.submit().unwrap();
        assert_eq!(sale.customer, "c1");
        assert_eq!(sale.total_price, "12.30");
        assert_eq!(sale.sold_date, "2024-03-01");

        let lines = sale.products.unwrap();
        assert_eq!(lines[1].price, "3.00");
        assert_eq!(lines[1].total, "6.00");

        // submit leaves the draft intact
        assert_eq!(draft.lines().len(), 2);
        draft.reset();
        assert!(draft.is_empty());
        assert!(draft.customer().is_none());
        assert_eq!(draft.sold_date(), today());
    }

    #[test]
    fn test_submit_requires_customer_and_lines() {
        let mut draft = SaleDraft::new(today());
        draft.add_line(&products(), "k1", "1").unwrap();
        assert_eq!(draft.submit().unwrap_err().to_string(), SUBMIT_INCOMPLETE);

        let mut draft = SaleDraft::new(today());
        draft.set_customer("c1");
        assert_eq!(draft.submit().unwrap_err().to_string(), SUBMIT_INCOMPLETE);

        draft.set_customer("");
        assert!(draft.customer().is_none());
    }

    #[test]
    fn test_submitted_sale_wire_shape() {
        let mut draft = SaleDraft::new(today());
        draft.set_customer("c1");
        draft.add_line(&products(), "k2", "1").unwrap();

        let value = serde_json::to_value(draft.submit().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "customer": "c1",
                "products": [{"id": "k2", "name": "Pad", "quantity": 1, "price": "3.00", "total": "3.00"}],
                "totalPrice": "3.00",
                "soldDate": "2024-03-01"
            })
        );
    }
}
