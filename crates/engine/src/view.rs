//! View pipeline: filter, sort, paginate.
//!
//! The view is a projection of the canonical dataset and is never edited
//! directly. It is re-derived after every mutation, filter change, sort
//! change, page change, and reset.
//!
//! Key invariants:
//! - Filtering and sorting never touch canonical row order
//! - The window holds canonical row indices, so edits route back correctly
//! - Sorting is stable: equal keys keep canonical relative order

use std::collections::HashMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::cell::CellValue;
use crate::dataset::Dataset;

/// Separator turning a column filter value into an exact-membership set.
pub const FILTER_VALUE_SEPARATOR: char = '|';

// =============================================================================
// Filters
// =============================================================================

/// Active filters: per-column predicates plus one global substring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    /// Column name -> filter value. A value containing `|` is an
    /// exact-membership set; anything else is a case-insensitive substring.
    columns: HashMap<String, String>,
    /// Case-insensitive substring matched against every value of a row.
    global: Option<String>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_column(&mut self, column: &str, value: &str) {
        self.columns.insert(column.to_string(), value.to_string());
    }

    pub fn remove_column(&mut self, column: &str) -> bool {
        self.columns.remove(column).is_some()
    }

    pub fn set_global(&mut self, value: Option<String>) {
        self.global = value.filter(|v| !v.is_empty());
    }

    pub fn global(&self) -> Option<&str> {
        self.global.as_deref()
    }

    pub fn column(&self, name: &str) -> Option<&str> {
        self.columns.get(name).map(|v| v.as_str())
    }

    pub fn column_filters(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.global.is_none()
    }

    pub fn clear(&mut self) {
        self.columns.clear();
        self.global = None;
    }

    /// Re-key a column filter after a column rename.
    pub fn rename_column(&mut self, old: &str, new: &str) {
        if let Some(value) = self.columns.remove(old) {
            self.columns.insert(new.to_string(), value);
        }
    }

    /// Does this row pass every active filter?
    pub fn row_passes(&self, data: &Dataset, row: usize) -> bool {
        if let Some(needle) = &self.global {
            let haystack = (0..data.column_count())
                .map(|col| data.display_at(row, col))
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            if !haystack.contains(&needle.to_lowercase()) {
                return false;
            }
        }

        for (column, filter_value) in &self.columns {
            // A filter on a missing column reads the cell as empty
            let cell = data
                .column_index(column)
                .map(|col| data.display_at(row, col))
                .unwrap_or_default();

            if filter_value.contains(FILTER_VALUE_SEPARATOR) {
                // Exact membership in the separated value set
                let allowed = filter_value.split(FILTER_VALUE_SEPARATOR);
                if !allowed.into_iter().any(|v| v == cell) {
                    return false;
                }
            } else if !cell.to_lowercase().contains(&filter_value.to_lowercase()) {
                return false;
            }
        }

        true
    }
}

// =============================================================================
// Sort
// =============================================================================

/// Current sort state. At most one active sort column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<String>,
    pub ascending: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: None,
            ascending: true,
        }
    }
}

impl SortState {
    /// Toggle semantics: the same column flips direction, a new column
    /// starts ascending.
    pub fn toggle(&mut self, column: &str) {
        if self.column.as_deref() == Some(column) {
            self.ascending = !self.ascending;
        } else {
            self.column = Some(column.to_string());
            self.ascending = true;
        }
    }

    pub fn clear(&mut self) {
        self.column = None;
        self.ascending = true;
    }

    /// Re-key after a column rename.
    pub fn rename_column(&mut self, old: &str, new: &str) {
        if self.column.as_deref() == Some(old) {
            self.column = Some(new.to_string());
        }
    }
}

/// Comparison key: numeric when the display parses, else lowercased text.
/// Numbers order before text so mixed columns group sensibly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Number(OrderedFloat<f64>),
    Text(String),
}

fn sort_key(display: &str) -> SortKey {
    match display.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => SortKey::Number(OrderedFloat(n)),
        _ => SortKey::Text(display.to_lowercase()),
    }
}

fn compare_cells(a: &str, b: &str) -> std::cmp::Ordering {
    match (sort_key(a), sort_key(b)) {
        // Both numeric: numeric comparison
        (SortKey::Number(x), SortKey::Number(y)) => x.cmp(&y),
        // Otherwise case-insensitive lexicographic on the string form
        _ => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Pagination metadata handed to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub current_page: usize,
    pub total_pages: usize,
    /// Rows surviving the filters (not just this window).
    pub total_rows: usize,
    /// 1-based index of the first row shown; 0 when nothing is shown.
    pub showing_start: usize,
    /// 1-based index of the last row shown.
    pub showing_end: usize,
}

impl PageInfo {
    /// Human label like `21-25`, or `0` when no rows are shown.
    pub fn showing_range(&self) -> String {
        if self.total_rows == 0 {
            "0".to_string()
        } else {
            format!("{}-{}", self.showing_start, self.showing_end)
        }
    }
}

/// The derived view window: what the renderer shows.
#[derive(Debug, Clone, Default)]
pub struct ViewWindow {
    /// Canonical row indices of the windowed rows, in view order.
    pub row_indices: Vec<usize>,
    /// Materialized cells for the window, aligned with `row_indices`.
    pub rows: Vec<Vec<CellValue>>,
    pub page: PageInfo,
}

/// Canonical row indices passing the filters, in canonical order.
pub fn filtered_indices(data: &Dataset, filters: &FilterSet) -> Vec<usize> {
    (0..data.row_count())
        .filter(|&row| filters.row_passes(data, row))
        .collect()
}

/// Derive the visible window from the canonical dataset.
///
/// `page` is clamped to the last page; `page_size` of 0 is treated as 1.
pub fn derive_view(
    data: &Dataset,
    filters: &FilterSet,
    sort: &SortState,
    page: usize,
    page_size: usize,
) -> ViewWindow {
    let page_size = page_size.max(1);
    let mut indices = filtered_indices(data, filters);

    if let Some(column) = &sort.column {
        if let Some(col) = data.column_index(column) {
            indices.sort_by(|&a, &b| {
                let ord = compare_cells(&data.display_at(a, col), &data.display_at(b, col));
                if sort.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }
    }

    let total_rows = indices.len();
    let total_pages = total_rows.div_ceil(page_size);
    let current_page = if total_pages == 0 {
        0
    } else {
        page.min(total_pages - 1)
    };

    let start = current_page * page_size;
    let end = (start + page_size).min(total_rows);
    let window: Vec<usize> = indices[start..end].to_vec();

    let rows = window
        .iter()
        .map(|&row| data.row(row).map(|r| r.to_vec()).unwrap_or_default())
        .collect();

    ViewWindow {
        rows,
        page: PageInfo {
            current_page,
            total_pages,
            total_rows,
            showing_start: if total_rows == 0 { 0 } else { start + 1 },
            showing_end: end,
        },
        row_indices: window,
    }
}

// =============================================================================
// External filter predicate (AI bridge)
// =============================================================================

/// Comparison operator for an externally supplied structured predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredicateOp {
    Eq,
    NotEq,
    Contains,
    Gt,
    GtEq,
    Lt,
    LtEq,
}

impl PredicateOp {
    /// Parse the operator spellings accepted at the boundary.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "eq" | "=" | "==" => Some(PredicateOp::Eq),
            "ne" | "!=" | "<>" => Some(PredicateOp::NotEq),
            "contains" => Some(PredicateOp::Contains),
            "gt" | ">" => Some(PredicateOp::Gt),
            "ge" | ">=" => Some(PredicateOp::GtEq),
            "lt" | "<" => Some(PredicateOp::Lt),
            "le" | "<=" => Some(PredicateOp::LtEq),
            _ => None,
        }
    }
}

/// Structured row predicate supplied by an external caller (the AI filter
/// bridge). This replaces free-form filter code: no expression is ever
/// evaluated, the predicate is interpreted directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub column: String,
    pub op: PredicateOp,
    pub value: String,
}

impl FilterPredicate {
    pub fn new(column: impl Into<String>, op: PredicateOp, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Apply the predicate to one cell display string.
    ///
    /// Ordering operators compare numerically when both sides parse as
    /// numbers, else lexicographically (case-insensitive).
    pub fn matches(&self, cell: &str) -> bool {
        match self.op {
            PredicateOp::Eq => cell == self.value,
            PredicateOp::NotEq => cell != self.value,
            PredicateOp::Contains => cell.to_lowercase().contains(&self.value.to_lowercase()),
            PredicateOp::Gt => compare_cells(cell, &self.value).is_gt(),
            PredicateOp::GtEq => compare_cells(cell, &self.value).is_ge(),
            PredicateOp::Lt => compare_cells(cell, &self.value).is_lt(),
            PredicateOp::LtEq => compare_cells(cell, &self.value).is_le(),
        }
    }
}
