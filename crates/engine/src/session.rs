//! The editing session.
//!
//! One `Session` owns everything a single open dataset needs: the original
//! import snapshot, the live canonical dataset, formula bindings, view
//! state (filters/sort/page), edit history, selection, and validation
//! rules. All operations are synchronous and single-caller; embedders in a
//! threaded host serialize calls externally (one mutex around the session
//! is sufficient).
//!
//! The view is derived, never edited: `view()` recomputes the
//! filtered/sorted/paginated window from canonical state on every call.

use crate::address::CellAddress;
use crate::cell::CellValue;
use crate::csv::{self, ImportReport};
use crate::dataset::Dataset;
use crate::errors::{
    DuplicateColumnError, FilterApplicationError, HistoryUnderflow, ParseError, ValidationError,
};
use crate::formula::FormulaBindings;
use crate::history::{CellChange, History, HistoryEntry, StructuralSnapshot, DEFAULT_HISTORY_LIMIT};
use crate::recalc::{recalculate, RecalcReport};
use crate::selection::Selection;
use crate::validation::{RuleSet, ValidationRule};
use crate::view::{derive_view, FilterPredicate, FilterSet, SortState, ViewWindow};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Tunables a host passes at session creation.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub page_size: usize,
    pub history_limit: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

pub struct Session {
    original: Dataset,
    canonical: Dataset,
    bindings: FormulaBindings,
    filters: FilterSet,
    sort: SortState,
    page: usize,
    page_size: usize,
    history: History,
    selection: Selection,
    rules: RuleSet,
    last_recalc: RecalcReport,
}

impl Session {
    /// Open a session over an already-built dataset.
    pub fn from_dataset(data: Dataset) -> Self {
        Self::with_options(data, SessionOptions::default())
    }

    pub fn with_options(data: Dataset, options: SessionOptions) -> Self {
        Self {
            original: data.clone(),
            canonical: data,
            bindings: FormulaBindings::new(),
            filters: FilterSet::new(),
            sort: SortState::default(),
            page: 0,
            page_size: options.page_size.max(1),
            history: History::with_limit(options.history_limit),
            selection: Selection::new(),
            rules: RuleSet::new(),
            last_recalc: RecalcReport::default(),
        }
    }

    /// Import CSV text. The parsed dataset becomes both original and
    /// canonical; the report carries any skipped-line warnings.
    pub fn from_csv(text: &str) -> Result<(Self, ImportReport), ParseError> {
        let (data, report) = csv::parse_with_report(text)?;
        Ok((Self::from_dataset(data), report))
    }

    /// Import pre-parsed uniform records (the JSON path).
    pub fn from_records(
        records: &[serde_json::Map<String, serde_json::Value>],
    ) -> Result<Self, ParseError> {
        Ok(Self::from_dataset(csv::parse_records(records)?))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn canonical(&self) -> &Dataset {
        &self.canonical
    }

    pub fn original(&self) -> &Dataset {
        &self.original
    }

    pub fn columns(&self) -> &[String] {
        self.canonical.columns()
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn validation_rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Report from the most recent recalculation pass.
    pub fn last_recalc(&self) -> &RecalcReport {
        &self.last_recalc
    }

    /// Formula source bound at an address (without the leading `=`), for
    /// edit-mode display.
    pub fn formula_source(&self, addr: CellAddress) -> Option<&str> {
        self.bindings.source(addr)
    }

    /// Derive the current view window.
    pub fn view(&self) -> ViewWindow {
        derive_view(&self.canonical, &self.filters, &self.sort, self.page, self.page_size)
    }

    // =========================================================================
    // Cell edits
    // =========================================================================

    /// Write raw input into a cell.
    ///
    /// Input starting with `=` binds a formula and stores its evaluated
    /// result; anything else clears an existing binding and stores the
    /// literal. Either way every bound formula recomputes afterward.
    ///
    /// A validation rule rejecting a literal reverts the edit (the cell is
    /// reset to empty, which is itself undoable) and reports the reason.
    /// Out-of-range addresses are ignored.
    pub fn set_cell(&mut self, row: usize, col: usize, raw: &str) -> Result<(), ValidationError> {
        if !self.canonical.in_bounds(row, col) {
            return Ok(());
        }
        let addr = CellAddress::new(row, col);
        let old = self.canonical.value(row, col);
        let old_binding = self.bindings.source(addr).map(String::from);
        let trimmed = raw.trim();

        if let Some(source) = trimmed.strip_prefix('=') {
            self.bindings.bind(addr, source);
            self.last_recalc = recalculate(&mut self.canonical, &self.bindings);
            let new = self.canonical.value(row, col);
            self.history.record_cells(vec![CellChange {
                addr,
                old,
                new,
                old_binding,
                new_binding: Some(source.to_string()),
            }]);
            return Ok(());
        }

        let rejection = self
            .rules
            .get(&self.canonical.columns()[col])
            .and_then(|rule| rule.check(trimmed).err());

        let new = match rejection {
            Some(_) => CellValue::Empty,
            None => CellValue::from_input(raw),
        };
        self.bindings.unbind(addr);
        self.canonical.set(row, col, new.clone());
        self.last_recalc = recalculate(&mut self.canonical, &self.bindings);
        self.history.record_cells(vec![CellChange {
            addr,
            old,
            new,
            old_binding,
            new_binding: None,
        }]);

        match rejection {
            Some(reason) => Err(ValidationError::new(
                self.canonical.columns()[col].clone(),
                reason,
            )),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Structure
    // =========================================================================

    fn snapshot(&self) -> StructuralSnapshot {
        StructuralSnapshot {
            columns: self.canonical.columns().to_vec(),
            rows: self.canonical.rows().to_vec(),
            bindings: self
                .bindings
                .iter()
                .map(|(addr, binding)| (addr, binding.source.clone()))
                .collect(),
            original_columns: self.original.columns().to_vec(),
            filters: self.filters.clone(),
            sort: self.sort.clone(),
        }
    }

    fn restore(&mut self, snap: &StructuralSnapshot) {
        self.canonical = Dataset::from_parts(snap.columns.clone(), snap.rows.clone());
        self.original.set_columns(snap.original_columns.clone());
        self.bindings.clear();
        for (addr, source) in &snap.bindings {
            self.bindings.bind(*addr, source);
        }
        self.filters = snap.filters.clone();
        self.sort = snap.sort.clone();
        self.page = 0;
        self.selection.clear();
        self.last_recalc = recalculate(&mut self.canonical, &self.bindings);
    }

    /// Append a column, empty in every row. Blank names are ignored.
    pub fn add_column(&mut self, name: &str) -> Result<(), DuplicateColumnError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }
        let before = self.snapshot();
        self.canonical.add_column(name)?;
        let after = self.snapshot();
        self.history.record_structure(before, after);
        self.selection.clear();
        Ok(())
    }

    /// Append an all-empty row.
    pub fn add_row(&mut self) {
        let before = self.snapshot();
        self.canonical.add_row();
        let after = self.snapshot();
        self.history.record_structure(before, after);
    }

    /// Rename a column everywhere: canonical, original, active filters,
    /// sort state, and validation rules. Returns false (and changes
    /// nothing) for blank/equal/colliding names or a missing column.
    pub fn rename_column(&mut self, old: &str, new: &str) -> bool {
        let before = self.snapshot();
        if !self.canonical.rename_column(old, new) {
            return false;
        }
        self.original.rename_column(old, new);
        self.filters.rename_column(old, new.trim());
        self.sort.rename_column(old, new.trim());
        self.rules.rename_column(old, new.trim());
        let after = self.snapshot();
        self.history.record_structure(before, after);
        self.selection.clear();
        true
    }

    /// Replace canonical with a deep copy of the original; clear filters,
    /// sort, page, bindings, and selection.
    pub fn reset(&mut self) {
        let before = self.snapshot();
        self.canonical = self.original.clone();
        self.canonical.infer_kinds();
        self.bindings.clear();
        self.filters.clear();
        self.sort.clear();
        self.page = 0;
        self.selection.clear();
        self.last_recalc = RecalcReport::default();
        let after = self.snapshot();
        self.history.record_structure(before, after);
    }

    // =========================================================================
    // Undo / redo
    // =========================================================================

    pub fn undo(&mut self) -> Result<(), HistoryUnderflow> {
        let entry = self.history.undo().ok_or(HistoryUnderflow::Undo)?;
        match entry {
            HistoryEntry::Cells(changes) => {
                for change in changes.iter().rev() {
                    self.canonical
                        .set(change.addr.row, change.addr.col, change.old.clone());
                    match &change.old_binding {
                        Some(source) => self.bindings.bind(change.addr, source),
                        None => {
                            self.bindings.unbind(change.addr);
                        }
                    }
                }
                self.last_recalc = recalculate(&mut self.canonical, &self.bindings);
            }
            HistoryEntry::Structure { before, .. } => self.restore(&before),
        }
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), HistoryUnderflow> {
        let entry = self.history.redo().ok_or(HistoryUnderflow::Redo)?;
        match entry {
            HistoryEntry::Cells(changes) => {
                for change in &changes {
                    self.canonical
                        .set(change.addr.row, change.addr.col, change.new.clone());
                    match &change.new_binding {
                        Some(source) => self.bindings.bind(change.addr, source),
                        None => {
                            self.bindings.unbind(change.addr);
                        }
                    }
                }
                self.last_recalc = recalculate(&mut self.canonical, &self.bindings);
            }
            HistoryEntry::Structure { after, .. } => self.restore(&after),
        }
        Ok(())
    }

    // =========================================================================
    // Filters, sort, pagination
    // =========================================================================

    /// Set (or with a blank value, remove) a column filter. Resets to the
    /// first page.
    pub fn set_column_filter(&mut self, column: &str, value: &str) {
        if value.trim().is_empty() {
            self.filters.remove_column(column);
        } else {
            self.filters.set_column(column, value);
        }
        self.page = 0;
    }

    pub fn remove_filter(&mut self, column: &str) {
        self.filters.remove_column(column);
        self.page = 0;
    }

    pub fn set_global_filter(&mut self, value: Option<String>) {
        self.filters.set_global(value);
        self.page = 0;
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.page = 0;
    }

    /// Sort by a column with toggle semantics: repeating the column flips
    /// direction, a new column starts ascending. Resets to the first page.
    pub fn sort_by(&mut self, column: &str) {
        self.sort.toggle(column);
        self.page = 0;
    }

    pub fn clear_sort(&mut self) {
        self.sort.clear();
        self.page = 0;
    }

    /// Jump to a page, clamped to the last page of the current view.
    pub fn set_page(&mut self, page: usize) {
        let total = crate::view::filtered_indices(&self.canonical, &self.filters).len();
        let total_pages = total.div_ceil(self.page_size);
        self.page = if total_pages == 0 {
            0
        } else {
            page.min(total_pages - 1)
        };
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page + 1);
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.page.saturating_sub(1));
    }

    pub fn set_page_size(&mut self, size: usize) {
        self.page_size = size.max(1);
        self.page = 0;
    }

    // =========================================================================
    // Selection, copy, paste
    // =========================================================================

    pub fn begin_selection(&mut self, addr: CellAddress) {
        self.selection.begin(addr);
    }

    pub fn extend_selection(&mut self, addr: CellAddress) {
        self.selection.extend(addr);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Serialize the selected rectangle as TSV from canonical values.
    pub fn copy_selection(&self) -> Option<String> {
        self.selection.copy_tsv(&self.canonical)
    }

    /// Write TSV text starting at `anchor`. Cells beyond the canonical
    /// shape are silently dropped; the whole paste is one undoable batch.
    /// Pasted tokens take the same path as typed input, so `=...` binds a
    /// formula.
    pub fn paste(&mut self, text: &str, anchor: CellAddress) {
        // (addr, old, old_binding, literal value if not a formula, new_binding)
        let mut staged: Vec<(CellAddress, CellValue, Option<String>, Option<CellValue>, Option<String>)> =
            Vec::new();

        for (line_idx, line) in text.lines().enumerate() {
            for (field_idx, token) in line.split('\t').enumerate() {
                let row = anchor.row + line_idx;
                let col = anchor.col + field_idx;
                if !self.canonical.in_bounds(row, col) {
                    continue;
                }
                let addr = CellAddress::new(row, col);
                let old = self.canonical.value(row, col);
                let old_binding = self.bindings.source(addr).map(String::from);
                let token = token.trim();

                if let Some(source) = token.strip_prefix('=') {
                    self.bindings.bind(addr, source);
                    staged.push((addr, old, old_binding, None, Some(source.to_string())));
                } else {
                    let value = CellValue::from_input(token);
                    self.bindings.unbind(addr);
                    self.canonical.set(row, col, value.clone());
                    staged.push((addr, old, old_binding, Some(value), None));
                }
            }
        }

        if staged.is_empty() {
            return;
        }

        self.last_recalc = recalculate(&mut self.canonical, &self.bindings);

        let changes = staged
            .into_iter()
            .map(|(addr, old, old_binding, literal, new_binding)| CellChange {
                addr,
                old,
                // Formula cells take their just-evaluated value
                new: literal.unwrap_or_else(|| self.canonical.value(addr.row, addr.col)),
                old_binding,
                new_binding,
            })
            .collect();
        self.history.record_cells(changes);
    }

    // =========================================================================
    // External filter bridge
    // =========================================================================

    /// Apply a structured predicate against the *original* dataset and
    /// replace canonical with the matching rows. On error canonical is
    /// left unchanged. Returns the number of matching rows.
    ///
    /// Bindings are cleared (row identities shift) and view state resets;
    /// the whole application is one undoable entry.
    pub fn apply_external_filter(
        &mut self,
        predicate: &FilterPredicate,
    ) -> Result<usize, FilterApplicationError> {
        let col = self
            .original
            .column_index(&predicate.column)
            .ok_or_else(|| FilterApplicationError::unknown_column(&predicate.column))?;

        let before = self.snapshot();
        let rows: Vec<Vec<CellValue>> = (0..self.original.row_count())
            .filter(|&row| predicate.matches(&self.original.display_at(row, col)))
            .filter_map(|row| self.original.row(row).map(|r| r.to_vec()))
            .collect();
        let count = rows.len();

        self.canonical = Dataset::from_parts(self.original.columns().to_vec(), rows);
        self.bindings.clear();
        self.filters.clear();
        self.sort.clear();
        self.page = 0;
        self.selection.clear();
        self.last_recalc = RecalcReport::default();

        let after = self.snapshot();
        self.history.record_structure(before, after);
        Ok(count)
    }

    // =========================================================================
    // Validation rules
    // =========================================================================

    pub fn set_validation_rule(&mut self, column: &str, rule: ValidationRule) {
        self.rules.set(column, rule);
    }

    pub fn remove_validation_rule(&mut self, column: &str) -> bool {
        self.rules.remove(column)
    }

    pub fn clear_validation_rules(&mut self) {
        self.rules.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness;

    #[test]
    fn test_import_and_view() {
        let session = harness::sample_session();
        assert_eq!(session.columns(), &["Name".to_string(), "Age".to_string(), "City".to_string()]);
        let view = session.view();
        assert_eq!(view.page.total_rows, 5);
        assert_eq!(view.rows.len(), 5);
    }

    #[test]
    fn test_set_cell_literal_and_undo_redo() {
        let mut session = harness::sample_session();
        let before = session.canonical().value(0, 1);
        session.set_cell(0, 1, "31").unwrap();
        assert_eq!(session.canonical().value(0, 1), CellValue::Number(31.0));

        session.undo().unwrap();
        assert_eq!(session.canonical().value(0, 1), before);

        session.redo().unwrap();
        assert_eq!(session.canonical().value(0, 1), CellValue::Number(31.0));
    }

    #[test]
    fn test_undo_underflow_reports() {
        let mut session = harness::sample_session();
        assert_eq!(session.undo(), Err(HistoryUnderflow::Undo));
        assert_eq!(session.redo(), Err(HistoryUnderflow::Redo));
    }

    #[test]
    fn test_set_cell_formula_binds_and_evaluates() {
        let mut session = harness::sample_session();
        // Ages are 30, 25, 22, 41, 35 in column B
        session.set_cell(0, 2, "=SUM(B1:B5)").unwrap();
        assert_eq!(session.canonical().value(0, 2), CellValue::Number(153.0));
        assert_eq!(
            session.formula_source(CellAddress::new(0, 2)),
            Some("SUM(B1:B5)")
        );
    }

    #[test]
    fn test_formula_recomputes_on_precedent_edit() {
        let mut session = harness::sample_session();
        session.set_cell(0, 2, "=SUM(B1:B5)").unwrap();
        session.set_cell(0, 1, "40").unwrap();
        assert_eq!(session.canonical().value(0, 2), CellValue::Number(163.0));
    }

    #[test]
    fn test_literal_edit_clears_binding() {
        let mut session = harness::sample_session();
        session.set_cell(0, 2, "=1+1").unwrap();
        session.set_cell(0, 2, "plain").unwrap();
        assert_eq!(session.formula_source(CellAddress::new(0, 2)), None);
        assert_eq!(
            session.canonical().value(0, 2),
            CellValue::Text("plain".to_string())
        );
    }

    #[test]
    fn test_undo_restores_formula_binding() {
        let mut session = harness::sample_session();
        session.set_cell(0, 2, "=SUM(B1:B5)").unwrap();
        session.set_cell(0, 2, "overwritten").unwrap();
        session.undo().unwrap();
        assert_eq!(
            session.formula_source(CellAddress::new(0, 2)),
            Some("SUM(B1:B5)")
        );
        assert_eq!(session.canonical().value(0, 2), CellValue::Number(153.0));
    }

    #[test]
    fn test_cycle_marked() {
        let mut session = harness::sample_session();
        session.set_cell(0, 2, "=A2").unwrap();
        session.set_cell(1, 0, "=C1").unwrap();
        assert_eq!(session.canonical().value(0, 2), CellValue::cycle());
        assert_eq!(session.canonical().value(1, 0), CellValue::cycle());
        assert_eq!(session.last_recalc().cycle_cells, 2);
    }

    #[test]
    fn test_validation_reverts_to_empty() {
        let mut session = harness::sample_session();
        session.set_validation_rule("Age", ValidationRule::Number);

        let err = session.set_cell(0, 1, "not a number").unwrap_err();
        assert_eq!(err.column, "Age");
        assert_eq!(session.canonical().value(0, 1), CellValue::Empty);

        // The revert itself is undoable
        session.undo().unwrap();
        assert_eq!(session.canonical().value(0, 1), CellValue::Number(30.0));
    }

    #[test]
    fn test_validation_accepts_valid_and_blank() {
        let mut session = harness::sample_session();
        session.set_validation_rule("Age", ValidationRule::Number);
        assert!(session.set_cell(0, 1, "28").is_ok());
        assert!(session.set_cell(0, 1, "").is_ok());
    }

    #[test]
    fn test_add_column_and_duplicate() {
        let mut session = harness::sample_session();
        session.add_column("Score").unwrap();
        assert_eq!(session.columns().len(), 4);
        assert!(session.add_column("Age").is_err());

        session.undo().unwrap();
        assert_eq!(session.columns().len(), 3);
    }

    #[test]
    fn test_add_row() {
        let mut session = harness::sample_session();
        session.add_row();
        assert_eq!(session.canonical().row_count(), 6);
        session.undo().unwrap();
        assert_eq!(session.canonical().row_count(), 5);
    }

    #[test]
    fn test_rename_propagates() {
        let mut session = harness::sample_session();
        session.set_column_filter("Age", "3");
        session.sort_by("Age");
        session.set_validation_rule("Age", ValidationRule::Number);

        assert!(session.rename_column("Age", "Years"));
        assert_eq!(session.columns()[1], "Years");
        assert_eq!(session.original().columns()[1], "Years");
        assert_eq!(session.filters().column("Years"), Some("3"));
        assert_eq!(session.filters().column("Age"), None);
        assert_eq!(session.sort_state().column.as_deref(), Some("Years"));
        assert!(session.validation_rules().get("Years").is_some());
    }

    #[test]
    fn test_rename_noop_cases() {
        let mut session = harness::sample_session();
        assert!(!session.rename_column("Age", "Age"));
        assert!(!session.rename_column("Age", "  "));
        assert!(!session.rename_column("Missing", "X"));
        assert!(!session.can_undo());
    }

    #[test]
    fn test_reset_restores_original() {
        let mut session = harness::sample_session();
        session.set_cell(0, 0, "Changed").unwrap();
        session.set_column_filter("City", "Paris");
        session.sort_by("Age");
        session.set_page_size(2);
        session.next_page();

        session.reset();
        assert_eq!(session.canonical().display_at(0, 0), "Alice");
        assert!(session.filters().is_empty());
        assert_eq!(session.sort_state().column, None);
        assert_eq!(session.page(), 0);
    }

    #[test]
    fn test_filter_sort_paginate_through_session() {
        let mut session = harness::sample_session();
        session.set_global_filter(Some("paris".to_string()));
        let view = session.view();
        assert_eq!(view.page.total_rows, 3);

        session.sort_by("Age");
        let view = session.view();
        let first = view.row_indices[0];
        assert_eq!(session.canonical().display_at(first, 1), "22");
    }

    #[test]
    fn test_page_clamping() {
        let mut session = harness::sample_session();
        session.set_page_size(2);
        session.set_page(99);
        assert_eq!(session.page(), 2);
        session.prev_page();
        assert_eq!(session.page(), 1);
    }

    #[test]
    fn test_copy_paste_rectangle() {
        let mut session = harness::sample_session();
        session.begin_selection(CellAddress::new(0, 0));
        session.extend_selection(CellAddress::new(1, 1));
        let text = session.copy_selection().unwrap();
        assert_eq!(text, "Alice\t30\nBob\t25");

        session.paste(&text, CellAddress::new(3, 0));
        assert_eq!(session.canonical().display_at(3, 0), "Alice");
        assert_eq!(session.canonical().display_at(4, 1), "25");

        // One batch: a single undo reverts the whole paste
        session.undo().unwrap();
        assert_eq!(session.canonical().display_at(3, 0), "Dave");
    }

    #[test]
    fn test_paste_drops_overflow() {
        let mut session = harness::sample_session();
        session.paste("x\ty\tz", CellAddress::new(4, 1));
        assert_eq!(session.canonical().display_at(4, 1), "x");
        assert_eq!(session.canonical().display_at(4, 2), "y");
        // Third token fell outside the 3-column shape
        assert_eq!(session.canonical().column_count(), 3);

        session.paste("a\nb", CellAddress::new(4, 0));
        // Second line fell outside the 5-row shape
        assert_eq!(session.canonical().row_count(), 5);
        assert_eq!(session.canonical().display_at(4, 0), "a");
    }

    #[test]
    fn test_paste_formula_binds() {
        let mut session = harness::sample_session();
        session.paste("=SUM(B1:B2)", CellAddress::new(0, 2));
        assert_eq!(session.canonical().value(0, 2), CellValue::Number(55.0));
        assert!(session.formula_source(CellAddress::new(0, 2)).is_some());
    }

    #[test]
    fn test_external_filter_unknown_column() {
        let mut session = harness::sample_session();
        let before_rows = session.canonical().row_count();
        let err = session
            .apply_external_filter(&FilterPredicate::new(
                "Salary",
                crate::view::PredicateOp::Gt,
                "10",
            ))
            .unwrap_err();
        assert!(err.message.contains("Salary"));
        assert_eq!(session.canonical().row_count(), before_rows);
    }

    #[test]
    fn test_external_filter_replaces_canonical() {
        let mut session = harness::sample_session();
        session.set_cell(0, 0, "Edited").unwrap();

        let count = session
            .apply_external_filter(&FilterPredicate::new(
                "Age",
                crate::view::PredicateOp::Gt,
                "26",
            ))
            .unwrap();
        // Evaluated against the original: Alice 30, Dave 41, Eve 35
        assert_eq!(count, 3);
        assert_eq!(session.canonical().row_count(), 3);
        assert_eq!(session.canonical().display_at(0, 0), "Alice");

        // Undoable as one entry
        session.undo().unwrap();
        assert_eq!(session.canonical().row_count(), 5);
        assert_eq!(session.canonical().display_at(0, 0), "Edited");
    }

    #[test]
    fn test_structural_change_clears_selection() {
        let mut session = harness::sample_session();
        session.begin_selection(CellAddress::new(0, 0));
        session.add_column("Extra").unwrap();
        assert!(!session.selection().is_active());
    }
}
