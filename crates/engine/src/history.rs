//! Undo/redo history.
//!
//! Cell edits are stored as inverse operations (address + old + new value),
//! O(1) per edited cell. Shape changes (add row/column, rename, external
//! filter, reset) store a compact structural snapshot of the session state
//! they touch. The log is bounded: beyond `max_entries` the oldest entry
//! is dropped.

use crate::address::CellAddress;
use crate::cell::CellValue;
use crate::view::{FilterSet, SortState};

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// One cell's before/after, including its formula binding text.
#[derive(Clone, Debug, PartialEq)]
pub struct CellChange {
    pub addr: CellAddress,
    pub old: CellValue,
    pub new: CellValue,
    pub old_binding: Option<String>,
    pub new_binding: Option<String>,
}

/// Session state captured around a structural mutation.
#[derive(Clone, Debug, Default)]
pub struct StructuralSnapshot {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    pub bindings: Vec<(CellAddress, String)>,
    /// Column labels of the original dataset (rename relabels it too).
    pub original_columns: Vec<String>,
    pub filters: FilterSet,
    pub sort: SortState,
}

#[derive(Clone, Debug)]
pub enum HistoryEntry {
    /// A batch of cell edits applied as one undoable operation.
    Cells(Vec<CellChange>),
    /// A shape change: restore `before` to undo, `after` to redo.
    Structure {
        before: Box<StructuralSnapshot>,
        after: Box<StructuralSnapshot>,
    },
}

pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_entries: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(max_entries: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Record a batch of cell changes as a single undoable operation.
    /// No-op changes are filtered out; an all-no-op batch records nothing.
    pub fn record_cells(&mut self, changes: Vec<CellChange>) {
        let changes: Vec<CellChange> = changes
            .into_iter()
            .filter(|c| c.old != c.new || c.old_binding != c.new_binding)
            .collect();
        if changes.is_empty() {
            return;
        }
        self.push_entry(HistoryEntry::Cells(changes));
    }

    /// Record a structural mutation.
    pub fn record_structure(&mut self, before: StructuralSnapshot, after: StructuralSnapshot) {
        self.push_entry(HistoryEntry::Structure {
            before: Box::new(before),
            after: Box::new(after),
        });
    }

    fn push_entry(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);
        // A new edit invalidates any previously undone branch
        self.redo_stack.clear();

        if self.undo_stack.len() > self.max_entries {
            self.undo_stack.remove(0);
        }
    }

    /// Pop the last entry for undo; the caller applies the "old" side.
    pub fn undo(&mut self) -> Option<HistoryEntry> {
        let entry = self.undo_stack.pop()?;
        self.redo_stack.push(entry.clone());
        Some(entry)
    }

    /// Pop from the redo stack; the caller applies the "new" side.
    pub fn redo(&mut self) -> Option<HistoryEntry> {
        let entry = self.redo_stack.pop()?;
        self.undo_stack.push(entry.clone());
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(row: usize, old: &str, new: &str) -> CellChange {
        CellChange {
            addr: CellAddress::new(row, 0),
            old: CellValue::from_input(old),
            new: CellValue::from_input(new),
            old_binding: None,
            new_binding: None,
        }
    }

    #[test]
    fn test_record_then_undo_redo() {
        let mut history = History::new();
        history.record_cells(vec![change(0, "a", "b")]);

        assert!(history.can_undo());
        assert!(!history.can_redo());

        let entry = history.undo().unwrap();
        match &entry {
            HistoryEntry::Cells(changes) => assert_eq!(changes[0].old, CellValue::from_input("a")),
            _ => panic!("expected Cells entry"),
        }
        assert!(!history.can_undo());
        assert!(history.can_redo());

        history.redo().unwrap();
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_underflow_returns_none() {
        let mut history = History::new();
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut history = History::new();
        history.record_cells(vec![change(0, "a", "b")]);
        history.undo().unwrap();
        assert!(history.can_redo());

        history.record_cells(vec![change(0, "a", "c")]);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_no_op_batch_not_recorded() {
        let mut history = History::new();
        history.record_cells(vec![change(0, "same", "same")]);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_binding_change_alone_is_recorded() {
        let mut history = History::new();
        history.record_cells(vec![CellChange {
            addr: CellAddress::new(0, 0),
            old: CellValue::Number(3.0),
            new: CellValue::Number(3.0),
            old_binding: None,
            new_binding: Some("A1+2".to_string()),
        }]);
        assert!(history.can_undo());
    }

    #[test]
    fn test_bounded_log_drops_oldest() {
        let mut history = History::with_limit(3);
        for i in 0..5 {
            history.record_cells(vec![change(i, "x", "y")]);
        }
        let mut popped = 0;
        while history.undo().is_some() {
            popped += 1;
        }
        assert_eq!(popped, 3);
    }
}
