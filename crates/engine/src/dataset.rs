//! The dataset store.
//!
//! A `Dataset` owns an ordered column list and uniform rows of typed cells.
//!
//! # Invariants
//!
//! 1. Column names are unique within a dataset.
//! 2. Every row holds exactly `columns.len()` cells.
//! 3. Column kinds are inferred once per load (`infer_kinds`) and cached;
//!    cell edits do not re-infer.
//!
//! Three instances exist per session: *original* (import snapshot),
//! *canonical* (live), *view* (derived, never edited directly).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::cell::CellValue;
use crate::errors::DuplicateColumnError;
use crate::formula::eval::CellLookup;

/// Above this many distinct values a text column stops counting as
/// categorical.
const CATEGORICAL_MAX_DISTINCT: usize = 12;

/// Inferred column kind, computed once per dataset load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Text,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
    #[serde(skip)]
    kinds: Vec<ColumnKind>,
}

impl Dataset {
    /// Create an empty dataset with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        let kinds = vec![ColumnKind::Text; columns.len()];
        Self {
            columns,
            rows: Vec::new(),
            kinds,
        }
    }

    /// Create a dataset from columns and rows, padding or truncating each
    /// row to the column count, then infer column kinds.
    pub fn from_parts(columns: Vec<String>, mut rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        for row in &mut rows {
            row.resize(width, CellValue::Empty);
        }
        let mut data = Self {
            columns,
            rows,
            kinds: Vec::new(),
        };
        data.infer_kinds();
        data
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[CellValue]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Cell value by position; `Empty` when out of range.
    pub fn value(&self, row: usize, col: usize) -> CellValue {
        self.get(row, col).cloned().unwrap_or(CellValue::Empty)
    }

    /// Display string by position; empty when out of range.
    pub fn display_at(&self, row: usize, col: usize) -> String {
        self.get(row, col).map(|v| v.display()).unwrap_or_default()
    }

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows.len() && col < self.columns.len()
    }

    /// Write a value. Returns false (and does nothing) when out of range.
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) -> bool {
        match self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// Append a column with an empty value in every row.
    pub fn add_column(&mut self, name: &str) -> Result<(), DuplicateColumnError> {
        if self.columns.iter().any(|c| c == name) {
            return Err(DuplicateColumnError::new(name));
        }
        self.columns.push(name.to_string());
        self.kinds.push(ColumnKind::Text);
        for row in &mut self.rows {
            row.push(CellValue::Empty);
        }
        Ok(())
    }

    /// Append an all-empty row.
    pub fn add_row(&mut self) {
        self.rows.push(vec![CellValue::Empty; self.columns.len()]);
    }

    /// Relabel a column.
    ///
    /// No-op (returns false) when `old` is missing, `new` is blank or equal
    /// to `old`, or `new` would collide with another column.
    pub fn rename_column(&mut self, old: &str, new: &str) -> bool {
        let new = new.trim();
        if new.is_empty() || new == old {
            return false;
        }
        let Some(index) = self.column_index(old) else {
            return false;
        };
        if self.columns.iter().any(|c| c == new) {
            return false;
        }
        self.columns[index] = new.to_string();
        true
    }

    /// Replace the column labels wholesale (same count required).
    /// Used by history restore; cell data is untouched.
    pub fn set_columns(&mut self, columns: Vec<String>) {
        debug_assert_eq!(columns.len(), self.columns.len());
        self.columns = columns;
    }

    /// Replace all rows (history restore). Rows are padded to the column
    /// count like `from_parts`.
    pub fn set_rows(&mut self, mut rows: Vec<Vec<CellValue>>) {
        let width = self.columns.len();
        for row in &mut rows {
            row.resize(width, CellValue::Empty);
        }
        self.rows = rows;
    }

    pub fn kind(&self, col: usize) -> Option<ColumnKind> {
        self.kinds.get(col).copied()
    }

    pub fn kinds(&self) -> &[ColumnKind] {
        &self.kinds
    }

    /// Infer and cache the kind of every column.
    ///
    /// Numeric: every non-empty cell reads as a number (and at least one
    /// does). Categorical: few distinct values, each repeated. Text:
    /// everything else.
    pub fn infer_kinds(&mut self) {
        self.kinds = (0..self.columns.len())
            .map(|col| self.infer_kind_of(col))
            .collect();
    }

    fn infer_kind_of(&self, col: usize) -> ColumnKind {
        let mut non_empty = 0usize;
        let mut numeric = 0usize;
        let mut distinct: HashSet<String> = HashSet::new();

        for row in &self.rows {
            let Some(value) = row.get(col) else { continue };
            if value.is_empty() {
                continue;
            }
            non_empty += 1;
            if value.as_number().is_some() {
                numeric += 1;
            }
            distinct.insert(value.display().trim().to_lowercase());
        }

        if non_empty == 0 {
            return ColumnKind::Text;
        }
        if numeric == non_empty {
            return ColumnKind::Numeric;
        }
        if distinct.len() <= CATEGORICAL_MAX_DISTINCT && distinct.len() * 2 <= non_empty {
            return ColumnKind::Categorical;
        }
        ColumnKind::Text
    }
}

impl CellLookup for Dataset {
    fn number_at(&self, row: usize, col: usize) -> Option<f64> {
        self.get(row, col).and_then(|v| v.as_number())
    }

    fn is_counted(&self, row: usize, col: usize) -> bool {
        self.get(row, col).map(|v| !v.is_empty()).unwrap_or(false)
    }
}
