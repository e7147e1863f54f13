//! # Row Projection
//!
//! Turns a collection snapshot into the flat rows every list screen and the
//! dashboard work on.
//!
//! ## Projection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Snapshot (key → record)                Rows                            │
//! │                                                                         │
//! │  "k1": {productName: "Pen", ...}  ──►  {id: "k1", productName: "Pen"}  │
//! │  "k2": {productName: "Pad", ...}  ──►  {id: "k2", productName: "Pad"}  │
//! │                                                                         │
//! │  absent / null                    ──►  []   (never an error)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Row order is the store's key order. Push keys start with a timestamp, so
//! this is also creation order, but nothing downstream relies on that.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Field map of one document.
pub type Record = Map<String, Value>;

// =============================================================================
// Snapshot
// =============================================================================

/// A point-in-time copy of one collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    records: BTreeMap<String, Record>,
    ignored: usize,
}

impl Snapshot {
    /// An empty collection.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a snapshot from the raw node at a collection path.
    ///
    /// `None` and `null` mean the collection does not exist yet. Children
    /// that are not objects cannot become rows; they are dropped and counted
    /// in [`Snapshot::ignored`].
    pub fn from_value(value: Option<&Value>) -> Self {
        let mut snapshot = Snapshot::default();

        if let Some(Value::Object(children)) = value {
            for (key, child) in children {
                match child {
                    Value::Object(record) => {
                        snapshot.records.insert(key.clone(), record.clone());
                    }
                    _ => snapshot.ignored += 1,
                }
            }
        } else if let Some(other) = value {
            if !other.is_null() {
                snapshot.ignored += 1;
            }
        }

        snapshot
    }

    /// Builds a snapshot from keyed records.
    pub fn from_records<I, K>(records: I) -> Self
    where
        I: IntoIterator<Item = (K, Record)>,
        K: Into<String>,
    {
        Snapshot {
            records: records.into_iter().map(|(k, r)| (k.into(), r)).collect(),
            ignored: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of non-object children dropped while building the snapshot.
    pub fn ignored(&self) -> usize {
        self.ignored
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    /// Keys in store order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
}

// =============================================================================
// Row
// =============================================================================

/// One record flattened for display: its key as `id` plus its fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub id: String,
    #[serde(flatten)]
    pub fields: Record,
}

/// A borrowed cell of a row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    /// The row key (`id` column).
    Key(&'a str),
    /// A document field.
    Value(&'a Value),
}

impl<'a> Cell<'a> {
    /// Text form used for searching and labels.
    ///
    /// `null` has no text. Numbers and booleans use their JSON spelling;
    /// arrays and objects their compact JSON encoding.
    pub fn text(&self) -> Option<Cow<'a, str>> {
        match *self {
            Cell::Key(key) => Some(Cow::Borrowed(key)),
            Cell::Value(Value::Null) => None,
            Cell::Value(Value::String(s)) => Some(Cow::Borrowed(s.as_str())),
            Cell::Value(other) => Some(Cow::Owned(other.to_string())),
        }
    }
}

impl Row {
    /// Creates a row from a key and its record.
    ///
    /// The key is authoritative: an `id` field inside the record is dropped
    /// so the row's `id` always equals its source key.
    pub fn new(id: impl Into<String>, mut fields: Record) -> Self {
        fields.remove("id");
        Row {
            id: id.into(),
            fields,
        }
    }

    /// Looks up a column; `id` resolves to the key.
    pub fn cell(&self, column: &str) -> Option<Cell<'_>> {
        if column == "id" {
            return Some(Cell::Key(&self.id));
        }
        self.fields.get(column).map(Cell::Value)
    }

    /// Text of a column, or `None` when absent or null.
    pub fn text(&self, column: &str) -> Option<Cow<'_, str>> {
        self.cell(column).and_then(|cell| cell.text())
    }

    /// Decodes the fields back into a typed document.
    pub fn to_entity<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(Value::Object(self.fields.clone()))
    }
}

// =============================================================================
// Projection
// =============================================================================

/// Projects a snapshot into rows in store key order.
///
/// ## Example
/// ```rust
/// use bigmart_core::rows::{project_rows, Snapshot};
/// use serde_json::json;
///
/// let raw = json!({"k2": {"productName": "Pad"}, "k1": {"productName": "Pen"}});
/// let rows = project_rows(&Snapshot::from_value(Some(&raw)));
/// assert_eq!(rows[0].id, "k1");
/// assert_eq!(rows[1].id, "k2");
/// ```
pub fn project_rows(snapshot: &Snapshot) -> Vec<Row> {
    snapshot
        .records
        .iter()
        .map(|(key, record)| Row::new(key.clone(), record.clone()))
        .collect()
}

/// Projects the raw node at a collection path.
pub fn project_value(value: Option<&Value>) -> Vec<Row> {
    project_rows(&Snapshot::from_value(value))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_scenario_snapshot_to_rows() {
        let raw = json!({
            "k1": {"productName": "Pen", "quantity": "10"},
            "k2": {"productName": "Pad", "quantity": "5"}
        });
        let rows = project_value(Some(&raw));

        let as_json = serde_json::to_value(&rows).unwrap();
        assert_eq!(
            as_json,
            json!([
                {"id": "k1", "productName": "Pen", "quantity": "10"},
                {"id": "k2", "productName": "Pad", "quantity": "5"}
            ])
        );
    }

    #[test]
    fn test_absent_collection_is_empty() {
        assert!(project_value(None).is_empty());
        assert!(project_value(Some(&Value::Null)).is_empty());
        assert!(project_rows(&Snapshot::empty()).is_empty());
    }

    #[test]
    fn test_row_count_and_unique_ids() {
        let raw = json!({
            "-Nb1": {"name": "A"},
            "-Nb2": {"name": "B"},
            "-Nb3": {"name": "C", "id": "spoofed"}
        });
        let snapshot = Snapshot::from_value(Some(&raw));
        let rows = project_rows(&snapshot);

        assert_eq!(rows.len(), snapshot.len());
        let ids: HashSet<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), rows.len());
        for (row, key) in rows.iter().zip(snapshot.keys()) {
            assert_eq!(row.id, key);
        }
        assert_eq!(rows[2].text("id").unwrap(), "-Nb3");
    }

    #[test]
    fn test_non_object_children_are_ignored() {
        let raw = json!({"k1": {"name": "A"}, "k2": "stray", "k3": 7});
        let snapshot = Snapshot::from_value(Some(&raw));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.ignored(), 2);
    }

    #[test]
    fn test_cell_text() {
        let row = Row::new(
            "k1",
            json!({"name": "Pen", "qty": 3, "flag": true, "none": null})
                .as_object()
                .cloned()
                .unwrap(),
        );
        assert_eq!(row.text("name").unwrap(), "Pen");
        assert_eq!(row.text("qty").unwrap(), "3");
        assert_eq!(row.text("flag").unwrap(), "true");
        assert!(row.text("none").is_none());
        assert!(row.text("missing").is_none());
    }

    #[test]
    fn test_row_to_entity() {
        use crate::types::Customer;

        let row = Row::new(
            "c1",
            json!({"name": "Ann", "contactNumber": "555", "address": "Main St"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let customer: Customer = row.to_entity().unwrap();
        assert_eq!(customer.name, "Ann");
    }
}
