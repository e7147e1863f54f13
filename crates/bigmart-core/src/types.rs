//! # Domain Types
//!
//! The documents BigMart keeps in the realtime store.
//!
//! ## Collections
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Store Layout                                    │
//! │                                                                         │
//! │  products/{key}        Product    productName, quantity, price, unit   │
//! │  vendors/{key}         Vendor     companyName, contactNumber, ...      │
//! │  customers/{key}       Customer   name, contactNumber, address         │
//! │  locations/{key}       Location   name                                 │
//! │  purchases/{key}       Purchase   vendor*, product*, quantity, date    │
//! │  sales/{key}           Sale       customer†, product† | products[]     │
//! │  user_locations/{uid}  UserLocationPreference   locationId†            │
//! │                                                                         │
//! │  * display-name reference     † key reference                           │
//! │  References are NOT enforced: deleting a product leaves stale           │
//! │  references behind in purchases and sales.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Identity
//! Keys are generated by the store on append and never stored inside the
//! document itself. A [`crate::rows::Row`] re-attaches the key as `id`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::validation::{self, ValidationResult};
use crate::view::TableSpec;

// =============================================================================
// Collections
// =============================================================================

/// The named, flat collections of keyed records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Products,
    Vendors,
    Customers,
    Locations,
    Purchases,
    Sales,
}

impl Collection {
    /// Every keyed collection, in screen order.
    pub const ALL: [Collection; 6] = [
        Collection::Products,
        Collection::Vendors,
        Collection::Customers,
        Collection::Locations,
        Collection::Purchases,
        Collection::Sales,
    ];

    /// Store path of the collection root.
    pub const fn path(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Vendors => "vendors",
            Collection::Customers => "customers",
            Collection::Locations => "locations",
            Collection::Purchases => "purchases",
            Collection::Sales => "sales",
        }
    }

    /// Store path of one record in the collection.
    pub fn record_path(&self, key: &str) -> String {
        format!("{}/{}", self.path(), key)
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Root of the per-identity location preferences.
pub const USER_LOCATIONS_PATH: &str = "user_locations";

/// Store path of one identity's location preference.
pub fn user_location_path(identity: &str) -> String {
    format!("{}/{}", USER_LOCATIONS_PATH, identity)
}

// =============================================================================
// Entity Trait
// =============================================================================

/// A document type stored in one of the keyed [`Collection`]s.
///
/// Ties together where the document lives, how a form submit is checked,
/// and how its list screen sorts and searches.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The collection this entity is stored in.
    const COLLECTION: Collection;

    /// Checks the document before it is written.
    fn validate(&self) -> ValidationResult<()>;

    /// Canonical form written to the store (e.g. trimmed names).
    fn normalized(self) -> Self {
        self
    }

    /// Sortable and searchable columns of the entity's list screen.
    fn table_spec() -> TableSpec;
}

// =============================================================================
// Lenient Numeric Strings
// =============================================================================

/// Numeric fields are strings on the wire, but older documents (and the bulk
/// sale flow) sometimes carry JSON numbers. Accept both.
mod numeric_string {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(serde::de::Error::custom(format!(
                "expected a numeric string, got {}",
                other
            ))),
        }
    }

    pub mod option {
        use serde::{Deserialize, Deserializer};
        use serde_json::Value;

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<Value>::deserialize(deserializer)? {
                None | Some(Value::Null) => Ok(None),
                Some(Value::String(s)) => Ok(Some(s)),
                Some(Value::Number(n)) => Ok(Some(n.to_string())),
                Some(other) => Err(serde::de::Error::custom(format!(
                    "expected a numeric string, got {}",
                    other
                ))),
            }
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product kept in inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Display name, also the label used on the dashboard.
    pub product_name: String,

    /// Stock on hand, as a numeric string.
    #[serde(deserialize_with = "numeric_string::deserialize")]
    pub quantity: String,

    /// Unit price, as a numeric string.
    #[serde(deserialize_with = "numeric_string::deserialize")]
    pub price: String,

    /// Unit of measure ("pcs", "kg", ...).
    pub unit: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub description: Option<String>,
}

impl Entity for Product {
    const COLLECTION: Collection = Collection::Products;

    fn validate(&self) -> ValidationResult<()> {
        validation::validate_required("productName", &self.product_name)?;
        validation::validate_numeric("quantity", &self.quantity)?;
        validation::validate_numeric("price", &self.price)?;
        validation::validate_required("unit", &self.unit)?;
        Ok(())
    }

    fn table_spec() -> TableSpec {
        TableSpec::new(
            &["productName", "quantity", "price", "unit"],
            &["productName", "description", "unit"],
        )
    }
}

// =============================================================================
// Vendor
// =============================================================================

/// A supplier the store buys from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub company_name: String,
    pub contact_number: String,
    pub location: String,
    pub address: String,
    pub contract_expiry: String,
}

impl Entity for Vendor {
    const COLLECTION: Collection = Collection::Vendors;

    fn validate(&self) -> ValidationResult<()> {
        validation::validate_required("companyName", &self.company_name)?;
        validation::validate_required("contactNumber", &self.contact_number)?;
        validation::validate_required("location", &self.location)?;
        validation::validate_required("address", &self.address)?;
        validation::validate_required("contractExpiry", &self.contract_expiry)?;
        Ok(())
    }

    fn table_spec() -> TableSpec {
        TableSpec::new(
            &["companyName", "location", "contractExpiry"],
            &["companyName", "contactNumber", "location", "address"],
        )
    }
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    pub contact_number: String,
    pub address: String,
}

impl Entity for Customer {
    const COLLECTION: Collection = Collection::Customers;

    fn validate(&self) -> ValidationResult<()> {
        validation::validate_required("name", &self.name)?;
        validation::validate_required("contactNumber", &self.contact_number)?;
        validation::validate_required("address", &self.address)?;
        Ok(())
    }

    fn table_spec() -> TableSpec {
        TableSpec::new(&["name"], &["name", "contactNumber", "address"])
    }
}

// =============================================================================
// Location
// =============================================================================

/// A store location a user can pick in settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Location {
    pub name: String,
}

impl Entity for Location {
    const COLLECTION: Collection = Collection::Locations;

    fn validate(&self) -> ValidationResult<()> {
        validation::validate_location_name(&self.name)
    }

    fn normalized(self) -> Self {
        Location {
            name: self.name.trim().to_string(),
        }
    }

    fn table_spec() -> TableSpec {
        TableSpec::new(&["name"], &["name"])
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// Stock bought from a vendor.
///
/// `vendor` and `product` hold display names, not keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub vendor: String,
    pub product: String,
    #[serde(deserialize_with = "numeric_string::deserialize")]
    pub quantity: String,
    /// `YYYY-MM-DD`.
    pub date_purchased: String,
}

impl Entity for Purchase {
    const COLLECTION: Collection = Collection::Purchases;

    fn validate(&self) -> ValidationResult<()> {
        validation::validate_required("vendor", &self.vendor)?;
        validation::validate_required("product", &self.product)?;
        validation::validate_numeric("quantity", &self.quantity)?;
        validation::validate_iso_date("datePurchased", &self.date_purchased)?;
        Ok(())
    }

    fn table_spec() -> TableSpec {
        TableSpec::new(
            &["vendor", "product", "quantity", "datePurchased"],
            &["vendor", "product"],
        )
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One product line of a bulk sale.
///
/// Name and unit price are frozen at the time the line was added, so the
/// sale keeps reading correctly after the product is renamed or repriced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    /// Product key.
    pub id: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    pub quantity: i64,
    /// Unit price at time of sale, two decimals.
    #[serde(deserialize_with = "numeric_string::deserialize")]
    pub price: String,
    /// `price × quantity`, two decimals.
    #[serde(deserialize_with = "numeric_string::deserialize")]
    pub total: String,
}

/// A sale to a customer.
///
/// Two shapes share the collection:
/// - single item: `product` + `quantity` + `price`
/// - bulk: `products` lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    /// Customer key.
    pub customer: String,

    /// Product key (single-item flow).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub product: Option<String>,

    /// Lines (bulk flow).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub products: Option<Vec<SaleLine>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "numeric_string::option::deserialize"
    )]
    #[ts(optional)]
    pub quantity: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "numeric_string::option::deserialize"
    )]
    #[ts(optional)]
    pub price: Option<String>,

    #[serde(deserialize_with = "numeric_string::deserialize")]
    pub total_price: String,

    /// `YYYY-MM-DD`.
    pub sold_date: String,
}

impl Sale {
    /// Returns true for the multi-line shape.
    pub fn is_bulk(&self) -> bool {
        self.products.is_some()
    }
}

impl Entity for Sale {
    const COLLECTION: Collection = Collection::Sales;

    fn validate(&self) -> ValidationResult<()> {
        validation::validate_required("customer", &self.customer)?;
        match (&self.product, &self.products) {
            (_, Some(lines)) => {
                if lines.is_empty() {
                    return Err(crate::ValidationError::Required {
                        field: "products".to_string(),
                    });
                }
            }
            (Some(product), None) => {
                validation::validate_required("product", product)?;
                validation::validate_numeric("quantity", self.quantity.as_deref().unwrap_or(""))?;
            }
            (None, None) => {
                return Err(crate::ValidationError::Required {
                    field: "product".to_string(),
                });
            }
        }
        validation::validate_numeric("totalPrice", &self.total_price)?;
        validation::validate_iso_date("soldDate", &self.sold_date)?;
        Ok(())
    }

    fn table_spec() -> TableSpec {
        TableSpec::new(
            &["customer", "product", "quantity", "totalPrice", "soldDate"],
            &["customer", "product"],
        )
    }
}

// =============================================================================
// User Location Preference
// =============================================================================

/// The location an identity has selected. One per identity, overwritten on
/// every selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UserLocationPreference {
    /// Location key.
    pub location_id: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
