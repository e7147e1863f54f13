//! # Aggregation
//!
//! Group-and-sum over projected rows, producing the series charts consume.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       group_and_sum                                     │
//! │                                                                         │
//! │  for each row:                                                          │
//! │                                                                         │
//! │    LabelSource::Field("soldDate") ──────► "2024-03-01"                  │
//! │    LabelSource::Join { field: "product", table } ──► table["k1"] = "Pen"│
//! │         │                                                               │
//! │         │ no label ──────────────────────► skipped.unresolved += 1     │
//! │         ▼                                                               │
//! │    parse_quantity(row["quantity"])                                      │
//! │         │                                                               │
//! │         │ not an integer ────────────────► skipped.unparseable += 1    │
//! │         ▼                                                               │
//! │    series[label] += quantity   (labels in first-occurrence order)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Skipping is permissive and silent at the call site, but both counts are
//! returned so a screen can show a warning.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::rows::{Cell, Row};

// =============================================================================
// Quantity Parsing
// =============================================================================

/// Parses the leading integer of a string.
///
/// ## Rules
/// - Leading whitespace is skipped
/// - An optional `+` or `-` sign
/// - Then as many ASCII digits as follow; anything after them is ignored
/// - No digits at all means no value
///
/// ## Example
/// ```rust
/// use bigmart_core::aggregate::parse_int_prefix;
///
/// assert_eq!(parse_int_prefix(" 12 boxes"), Some(12));
/// assert_eq!(parse_int_prefix("2.9"), Some(2));
/// assert_eq!(parse_int_prefix("-3"), Some(-3));
/// assert_eq!(parse_int_prefix("abc"), None);
/// ```
pub fn parse_int_prefix(text: &str) -> Option<i64> {
    let s = text.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits: &str = {
        let end = rest
            .bytes()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    };
    if digits.is_empty() {
        return None;
    }

    let mut value: i64 = 0;
    for b in digits.bytes() {
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(b - b'0'));
    }

    Some(if negative { -value } else { value })
}

/// Reads an integer quantity from a cell.
///
/// Strings go through [`parse_int_prefix`]; JSON numbers are truncated
/// toward zero. Absent, null, boolean and structured cells have no quantity.
pub fn parse_quantity(cell: Option<Cell<'_>>) -> Option<i64> {
    match cell? {
        Cell::Key(key) => parse_int_prefix(key),
        Cell::Value(Value::String(s)) => parse_int_prefix(s),
        Cell::Value(Value::Number(n)) => match n.as_i64() {
            Some(i) => Some(i),
            None => n
                .as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64),
        },
        Cell::Value(_) => None,
    }
}

// =============================================================================
// Join Resolution
// =============================================================================

/// Reference value → display label, built once per aggregation from the
/// referenced collection's rows.
///
/// Collections are inconsistent about what a reference holds: sales store
/// product keys, purchases store product names. The call site picks the
/// matching constructor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    labels: HashMap<String, String>,
}

impl LookupTable {
    /// Keyed by row key.
    pub fn by_id<'a, I>(rows: I, label_field: &str) -> Self
    where
        I: IntoIterator<Item = &'a Row>,
    {
        let mut table = LookupTable::default();
        for row in rows {
            table.insert(row.id.clone(), row, label_field);
        }
        table
    }

    /// Keyed by the text of `key_field`.
    pub fn by_field<'a, I>(rows: I, key_field: &str, label_field: &str) -> Self
    where
        I: IntoIterator<Item = &'a Row>,
    {
        let mut table = LookupTable::default();
        for row in rows {
            if let Some(key) = row.text(key_field) {
                table.insert(key.into_owned(), row, label_field);
            }
        }
        table
    }

    /// Keyed by both row key and `key_field`. Row keys take precedence when
    /// a display value collides with another row's key.
    pub fn by_id_or_field<'a, I>(rows: I, key_field: &str, label_field: &str) -> Self
    where
        I: IntoIterator<Item = &'a Row>,
    {
        let rows: Vec<&Row> = rows.into_iter().collect();
        let mut table = Self::by_field(rows.iter().copied(), key_field, label_field);
        for row in rows {
            table.insert(row.id.clone(), row, label_field);
        }
        table
    }

    fn insert(&mut self, key: String, row: &Row, label_field: &str) {
        match row.text(label_field) {
            Some(label) if !label.is_empty() => {
                self.labels.insert(key, label.into_owned());
            }
            _ => {}
        }
    }

    /// Label for a reference value, if the referenced row still exists.
    pub fn resolve(&self, reference: &str) -> Option<&str> {
        self.labels.get(reference).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Where a row's group label comes from.
#[derive(Debug, Clone, Copy)]
pub enum LabelSource<'a> {
    /// The raw text of a field, e.g. a date.
    Field(&'a str),
    /// A reference field resolved through a lookup table.
    Join {
        field: &'a str,
        table: &'a LookupTable,
    },
}

impl LabelSource<'_> {
    /// Resolves a row's label. Empty labels count as unresolved.
    pub fn resolve(&self, row: &Row) -> Option<String> {
        let label = match *self {
            LabelSource::Field(field) => row.text(field).map(|t| t.into_owned()),
            LabelSource::Join { field, table } => row
                .text(field)
                .and_then(|reference| table.resolve(&reference).map(str::to_string)),
        };
        label.filter(|l| !l.is_empty())
    }
}

// =============================================================================
// Series
// =============================================================================

/// One point of a chart series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SeriesPoint {
    pub label: String,
    pub value: i64,
}

impl SeriesPoint {
    pub fn new(label: impl Into<String>, value: i64) -> Self {
        SeriesPoint {
            label: label.into(),
            value,
        }
    }
}

/// Rows left out of an aggregation, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SkipCounts {
    /// Label missing, empty, or referencing a row that no longer exists.
    pub unresolved: usize,
    /// Label resolved but the quantity did not parse.
    pub unparseable: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.unresolved + self.unparseable
    }
}

/// Result of a group-and-sum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
    pub series: Vec<SeriesPoint>,
    pub skipped: SkipCounts,
}

impl Aggregation {
    /// Sum of every point.
    pub fn total(&self) -> i64 {
        self.series
            .iter()
            .fold(0i64, |acc, p| acc.saturating_add(p.value))
    }

    pub fn labels(&self) -> Vec<&str> {
        self.series.iter().map(|p| p.label.as_str()).collect()
    }

    pub fn values(&self) -> Vec<i64> {
        self.series.iter().map(|p| p.value).collect()
    }

    pub fn get(&self, label: &str) -> Option<i64> {
        self.series.iter().find(|p| p.label == label).map(|p| p.value)
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Groups rows by label and sums their integer quantity.
///
/// ## Example
/// ```rust
/// use bigmart_core::aggregate::{group_and_sum, LabelSource};
/// use bigmart_core::rows::project_value;
/// use serde_json::json;
///
/// let purchases = project_value(Some(&json!({
///     "p1": {"datePurchased": "2024-03-01", "quantity": "4"},
///     "p2": {"datePurchased": "2024-03-01", "quantity": "6"},
/// })));
/// let agg = group_and_sum(&purchases, LabelSource::Field("datePurchased"), "quantity");
/// assert_eq!(agg.get("2024-03-01"), Some(10));
/// ```
pub fn group_and_sum<'a, I>(rows: I, label: LabelSource<'_>, quantity_field: &str) -> Aggregation
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut aggregation = Aggregation::default();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let Some(name) = label.resolve(row) else {
            aggregation.skipped.unresolved += 1;
            continue;
        };
        let Some(quantity) = parse_quantity(row.cell(quantity_field)) else {
            aggregation.skipped.unparseable += 1;
            continue;
        };

        match index.get(&name) {
            Some(&i) => {
                let point = &mut aggregation.series[i];
                point.value = point.value.saturating_add(quantity);
            }
            None => {
                index.insert(name.clone(), aggregation.series.len());
                aggregation.series.push(SeriesPoint::new(name, quantity));
            }
        }
    }

    aggregation
}

// =============================================================================
// Unit Tests
// =============================================================================
