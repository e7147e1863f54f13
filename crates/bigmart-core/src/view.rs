//! # Tabular View State
//!
//! Sort and filter state shared by every list screen (products, vendors,
//! customers, locations, purchases, sales).
//!
//! ## State Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Column Header Clicks                                 │
//! │                                                                         │
//! │  unsorted ──click "name"──► name ▲ ──click "name"──► name ▼            │
//! │                               │                        │                │
//! │                               │                  click "name"           │
//! │                               │                        ▼                │
//! │                               │                      name ▲             │
//! │                               │                                         │
//! │                        click "quantity" (any direction)                 │
//! │                               ▼                                         │
//! │                          quantity ▲   (different column = ascending)    │
//! │                                                                         │
//! │  Filter text never touches the row order; it only narrows the           │
//! │  visible subset.                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//! Each cell maps to a [`SortKey`]: `Missing < Number < Text`. Numbers and
//! numeric strings compare numerically, everything else compares as text.
//! The sort is stable, so rows with equal keys keep their previous relative
//! order and repeated toggles are reproducible.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::rows::{Cell, Row};

// =============================================================================
// Table Spec
// =============================================================================

/// Which columns a list screen sorts and searches on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSpec {
    sortable: Vec<String>,
    searchable: Vec<String>,
}

impl TableSpec {
    /// Creates a spec. An empty `sortable` list allows every column; an
    /// empty `searchable` list searches every field.
    pub fn new(sortable: &[&str], searchable: &[&str]) -> Self {
        TableSpec {
            sortable: sortable.iter().map(|c| c.to_string()).collect(),
            searchable: searchable.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// A spec with no column restrictions.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn is_sortable(&self, column: &str) -> bool {
        self.sortable.is_empty() || self.sortable.iter().any(|c| c == column)
    }

    pub fn sortable(&self) -> &[String] {
        &self.sortable
    }

    pub fn searchable(&self) -> &[String] {
        &self.searchable
    }
}

// =============================================================================
// Sort Keys
// =============================================================================

/// Sort direction shown next to the column header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Comparable form of one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey<'a> {
    /// Absent or null; sorts before everything.
    Missing,
    Number(f64),
    Text(Cow<'a, str>),
}

impl<'a> SortKey<'a> {
    /// Derives the sort key of a cell.
    pub fn of(cell: Option<Cell<'a>>) -> Self {
        match cell {
            None | Some(Cell::Value(Value::Null)) => SortKey::Missing,
            Some(Cell::Value(Value::Number(n))) => match n.as_f64() {
                Some(f) if f.is_finite() => SortKey::Number(f),
                _ => SortKey::Text(Cow::Owned(n.to_string())),
            },
            Some(cell) => match cell.text() {
                Some(text) => match parse_number(&text) {
                    Some(f) => SortKey::Number(f),
                    None => SortKey::Text(text),
                },
                None => SortKey::Missing,
            },
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Missing => 0,
            SortKey::Number(_) => 1,
            SortKey::Text(_) => 2,
        }
    }

    /// Three-way comparison; a total order over all keys.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Compares two rows on one column, ascending.
pub fn compare_rows(a: &Row, b: &Row, column: &str) -> Ordering {
    SortKey::of(a.cell(column)).compare(&SortKey::of(b.cell(column)))
}

// =============================================================================
// Table View
// =============================================================================

/// Rows of one list screen plus its sort and filter state.
///
/// ## Usage
/// ```rust
/// use bigmart_core::rows::project_value;
/// use bigmart_core::view::{TableSpec, TableView};
/// use serde_json::json;
///
/// let raw = json!({"k1": {"name": "Pen"}, "k2": {"name": "Ink"}});
/// let mut view = TableView::new(TableSpec::unrestricted());
/// view.set_rows(project_value(Some(&raw)));
///
/// view.select_sort_column("name").unwrap();
/// let names: Vec<_> = view.visible_rows().map(|r| r.id.as_str()).collect();
/// assert_eq!(names, ["k2", "k1"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableView {
    spec: TableSpec,
    rows: Vec<Row>,
    sort_column: Option<String>,
    sort_ascending: bool,
    filter_text: String,
    /// Indices into `rows` that pass the filter, in row order.
    visible: Vec<usize>,
}

impl TableView {
    /// Creates an empty, unsorted, unfiltered view.
    pub fn new(spec: TableSpec) -> Self {
        TableView {
            spec,
            sort_ascending: true,
            ..Default::default()
        }
    }

    /// Replaces the rows wholesale (new snapshot) and re-applies the current
    /// sort and filter. Does not toggle the sort direction.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.rows = rows;
        self.apply_sort();
        self.apply_filter();
    }

    /// Handles a click on a column header.
    ///
    /// Same column flips the direction; a different column starts ascending.
    /// Columns outside the table's sortable set are rejected and the state is
    /// left unchanged.
    pub fn select_sort_column(&mut self, column: &str) -> CoreResult<()> {
        if !self.spec.is_sortable(column) {
            return Err(CoreError::ColumnNotSortable(column.to_string()));
        }

        if self.sort_column.as_deref() == Some(column) {
            self.sort_ascending = !self.sort_ascending;
        } else {
            self.sort_column = Some(column.to_string());
            self.sort_ascending = true;
        }

        self.apply_sort();
        self.apply_filter();
        Ok(())
    }

    /// Sets the search box text and recomputes the visible subset.
    pub fn set_filter_text(&mut self, text: &str) {
        self.filter_text = text.to_string();
        self.apply_filter();
    }

    /// All rows in current sort order, ignoring the filter.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Rows passing the filter, in current sort order.
    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.visible.iter().filter_map(move |&i| self.rows.get(i))
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn sort_column(&self) -> Option<&str> {
        self.sort_column.as_deref()
    }

    pub fn sort_ascending(&self) -> bool {
        self.sort_ascending
    }

    /// Direction indicator for the active column, if any.
    pub fn sort_direction(&self) -> Option<SortDirection> {
        self.sort_column.as_ref().map(|_| {
            if self.sort_ascending {
                SortDirection::Ascending
            } else {
                SortDirection::Descending
            }
        })
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn spec(&self) -> &TableSpec {
        &self.spec
    }

    fn apply_sort(&mut self) {
        let Some(column) = self.sort_column.as_deref() else {
            return;
        };
        let ascending = self.sort_ascending;

        // slice::sort_by is stable
        self.rows.sort_by(|a, b| {
            let ord = compare_rows(a, b, column);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
    }

    fn apply_filter(&mut self) {
        let needle = self.filter_text.to_lowercase();
        self.visible = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| needle.is_empty() || self.haystack(row).contains(&needle))
            .map(|(i, _)| i)
            .collect();
    }

    /// Lower-cased concatenation of the searchable fields of a row, with no
    /// separator between fields.
    fn haystack(&self, row: &Row) -> String {
        let parts: Vec<Cow<'_, str>> = if self.spec.searchable.is_empty() {
            std::iter::once(Cow::Borrowed(row.id.as_str()))
                .chain(row.fields.keys().filter_map(|k| row.text(k)))
                .collect()
        } else {
            self.spec
                .searchable
                .iter()
                .filter_map(|column| row.text(column))
                .collect()
        };
        parts.concat().to_lowercase()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::Record;
    use serde_json::json;

    fn row(id: &str, fields: Value) -> Row {
        let record: Record = fields.as_object().cloned().unwrap_or_default();
        Row::new(id, record)
    }

    fn ids(view: &TableView) -> Vec<String> {
        view.visible_rows().map(|r| r.id.clone()).collect()
    }

    fn products() -> Vec<Row> {
        vec![
            row("k1", json!({"name": "Pen", "quantity": "10", "unit": "pcs"})),
            row("k2", json!({"name": "Pad", "quantity": "5", "unit": "pcs"})),
            row("k3", json!({"name": "Ink", "quantity": "9", "unit": "bottle"})),
            row("k4", json!({"name": "Pad", "quantity": "1", "unit": "box"})),
        ]
    }

    fn view_with(rows: Vec<Row>) -> TableView {
        let mut view = TableView::new(TableSpec::new(&[], &["name", "unit"]));
        view.set_rows(rows);
        view
    }

    #[test]
    fn test_toggle_cycle() {
        let mut view = view_with(products());

        view.select_sort_column("name").unwrap();
        assert_eq!(view.sort_direction(), Some(SortDirection::Ascending));
        assert_eq!(ids(&view), ["k3", "k2", "k4", "k1"]);

        view.select_sort_column("name").unwrap();
        assert_eq!(view.sort_direction(), Some(SortDirection::Descending));
        assert_eq!(ids(&view), ["k1", "k2", "k4", "k3"]);

        view.select_sort_column("name").unwrap();
        assert!(view.sort_ascending());
        assert_eq!(ids(&view), ["k3", "k2", "k4", "k1"]);
    }

    #[test]
    fn test_different_column_resets_to_ascending() {
        let mut view = view_with(products());

        view.select_sort_column("name").unwrap();
        view.select_sort_column("quantity").unwrap();
        assert_eq!(view.sort_column(), Some("quantity"));
        assert!(view.sort_ascending());
        assert_eq!(ids(&view), ["k4", "k2", "k3", "k1"]);

        // Also from a descending state
        view.select_sort_column("quantity").unwrap();
        assert!(!view.sort_ascending());
        view.select_sort_column("name").unwrap();
        assert!(view.sort_ascending());
    }

    #[test]
    fn test_numeric_strings_sort_numerically() {
        let mut view = view_with(products());
        view.select_sort_column("quantity").unwrap();
        let quantities: Vec<String> = view
            .visible_rows()
            .map(|r| r.text("quantity").unwrap().into_owned())
            .collect();
        assert_eq!(quantities, ["1", "5", "9", "10"]);
    }

    #[test]
    fn test_sort_is_stable() {
        // k2 and k4 share name "Pad"; k2 comes first before sorting.
        let mut view = view_with(products());
        view.select_sort_column("name").unwrap();
        let order = ids(&view);
        let k2 = order.iter().position(|id| id == "k2").unwrap();
        let k4 = order.iter().position(|id| id == "k4").unwrap();
        assert!(k2 < k4);

        // Descending keeps the pair's prior relative order too.
        view.select_sort_column("name").unwrap();
        let order = ids(&view);
        let k2 = order.iter().position(|id| id == "k2").unwrap();
        let k4 = order.iter().position(|id| id == "k4").unwrap();
        assert!(k2 < k4);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let mut view = view_with(products());
        view.select_sort_column("unit").unwrap();
        let once: Vec<Row> = view.rows().to_vec();

        let mut again = view_with(once.clone());
        again.select_sort_column("unit").unwrap();
        assert_eq!(again.rows(), once.as_slice());
    }

    #[test]
    fn test_missing_values_sort_first() {
        let rows = vec![
            row("a", json!({"price": "3"})),
            row("b", json!({})),
            row("c", json!({"price": null})),
            row("d", json!({"price": "1"})),
            row("e", json!({"price": "n/a"})),
        ];
        let mut view = view_with(rows);
        view.select_sort_column("price").unwrap();
        assert_eq!(ids(&view), ["b", "c", "d", "a", "e"]);

        view.select_sort_column("price").unwrap();
        assert_eq!(ids(&view), ["e", "a", "d", "b", "c"]);
    }

    #[test]
    fn test_filter_case_insensitive_across_fields() {
        let mut view = view_with(products());

        view.set_filter_text("PA");
        assert_eq!(ids(&view), ["k2", "k4"]);

        view.set_filter_text("box");
        assert_eq!(ids(&view), ["k4"]);

        // quantity is not searchable
        view.set_filter_text("10");
        assert!(ids(&view).is_empty());

        view.set_filter_text("");
        assert_eq!(view.visible_len(), 4);
    }

    #[test]
    fn test_filter_matches_fields_concatenated_without_separator() {
        let mut view = TableView::new(TableSpec::new(&[], &["productName", "unit"]));
        view.set_rows(vec![row("k1", json!({"productName": "Pen", "unit": "pcs"}))]);

        view.set_filter_text("PenPcs");
        assert_eq!(ids(&view), ["k1"]);

        view.set_filter_text("n p");
        assert!(ids(&view).is_empty());
    }

    #[test]
    fn test_filter_does_not_reorder_rows() {
        let mut view = view_with(products());
        let before: Vec<Row> = view.rows().to_vec();
        view.set_filter_text("pen");
        assert_eq!(view.rows(), before.as_slice());
    }

    #[test]
    fn test_filter_is_monotonic() {
        let mut view = view_with(products());
        for t in ["", "p", "pa", "pad", "pen", "i", "in", "ink"] {
            view.set_filter_text(t);
            let wide: Vec<String> = ids(&view);
            view.set_filter_text(&format!("{}x", t));
            let narrow: Vec<String> = ids(&view);
            assert!(narrow.iter().all(|id| wide.contains(id)));
        }
    }

    #[test]
    fn test_new_rows_keep_sort_and_filter() {
        let mut view = view_with(products());
        view.select_sort_column("name").unwrap();
        view.select_sort_column("name").unwrap();
        view.set_filter_text("p");

        let mut next = products();
        next.push(row("k5", json!({"name": "Pencil", "unit": "pcs"})));
        view.set_rows(next);

        assert!(!view.sort_ascending());
        assert_eq!(ids(&view), ["k5", "k1", "k2", "k4"]);
    }

    #[test]
    fn test_unsortable_column_is_rejected() {
        let mut view = TableView::new(TableSpec::new(&["name"], &["name"]));
        view.set_rows(products());
        view.select_sort_column("name").unwrap();

        let err = view.select_sort_column("unit").unwrap_err();
        assert!(matches!(err, CoreError::ColumnNotSortable(_)));
        assert_eq!(view.sort_column(), Some("name"));
        assert!(view.sort_ascending());
    }

    #[test]
    fn test_unrestricted_search_includes_id() {
        let mut view = TableView::new(TableSpec::unrestricted());
        view.set_rows(products());
        view.set_filter_text("k3");
        assert_eq!(ids(&view), ["k3"]);
    }
}
