//! Rectangular cell selection.
//!
//! A selection is defined by an anchor and a focus address; the resolved
//! set is the inclusive rectangle between them, recomputed on every
//! extension. Selection addresses are canonical-dataset coordinates,
//! independent of the view's windowing.

use serde::{Deserialize, Serialize};

use crate::address::CellAddress;
use crate::dataset::Dataset;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    anchor: Option<CellAddress>,
    focus: Option<CellAddress>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new selection: anchor = focus = `addr`.
    pub fn begin(&mut self, addr: CellAddress) {
        self.anchor = Some(addr);
        self.focus = Some(addr);
    }

    /// Move the focus corner. No-op when no selection is active.
    pub fn extend(&mut self, addr: CellAddress) {
        if self.anchor.is_some() {
            self.focus = Some(addr);
        }
    }

    pub fn clear(&mut self) {
        self.anchor = None;
        self.focus = None;
    }

    pub fn is_active(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn anchor(&self) -> Option<CellAddress> {
        self.anchor
    }

    pub fn focus(&self) -> Option<CellAddress> {
        self.focus
    }

    /// Top-left and bottom-right corners of the resolved rectangle.
    pub fn bounds(&self) -> Option<(CellAddress, CellAddress)> {
        let (anchor, focus) = (self.anchor?, self.focus?);
        Some((
            CellAddress::new(anchor.row.min(focus.row), anchor.col.min(focus.col)),
            CellAddress::new(anchor.row.max(focus.row), anchor.col.max(focus.col)),
        ))
    }

    /// All selected addresses, row-major.
    pub fn cells(&self) -> Vec<CellAddress> {
        let Some((min, max)) = self.bounds() else {
            return Vec::new();
        };
        let mut cells = Vec::with_capacity((max.row - min.row + 1) * (max.col - min.col + 1));
        for row in min.row..=max.row {
            for col in min.col..=max.col {
                cells.push(CellAddress::new(row, col));
            }
        }
        cells
    }

    pub fn contains(&self, addr: CellAddress) -> bool {
        match self.bounds() {
            Some((min, max)) => {
                addr.row >= min.row && addr.row <= max.row && addr.col >= min.col && addr.col <= max.col
            }
            None => false,
        }
    }

    /// Serialize the selected rectangle as tab-separated values, one line
    /// per row, reading current canonical values. `None` when nothing is
    /// selected.
    pub fn copy_tsv(&self, data: &Dataset) -> Option<String> {
        let (min, max) = self.bounds()?;
        let mut lines = Vec::with_capacity(max.row - min.row + 1);
        for row in min.row..=max.row {
            let fields: Vec<String> = (min.col..=max.col)
                .map(|col| data.display_at(row, col))
                .collect();
            lines.push(fields.join("\t"));
        }
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;

    fn addr(row: usize, col: usize) -> CellAddress {
        CellAddress::new(row, col)
    }

    #[test]
    fn test_begin_sets_single_cell() {
        let mut sel = Selection::new();
        sel.begin(addr(1, 1));
        assert_eq!(sel.cells(), vec![addr(1, 1)]);
        assert!(sel.contains(addr(1, 1)));
        assert!(!sel.contains(addr(0, 0)));
    }

    #[test]
    fn test_extend_resolves_rectangle() {
        // Extending up-right from the anchor still resolves a normalized
        // rectangle: rows 0..=2, cols 1..=3.
        let mut sel = Selection::new();
        sel.begin(addr(2, 1));
        sel.extend(addr(0, 3));

        let cells = sel.cells();
        assert_eq!(cells.len(), 9);
        assert_eq!(cells.first(), Some(&addr(0, 1)));
        assert_eq!(cells.last(), Some(&addr(2, 3)));
        assert!(cells.iter().all(|c| c.row <= 2 && (1..=3).contains(&c.col)));
    }

    #[test]
    fn test_extend_recomputes_each_call() {
        let mut sel = Selection::new();
        sel.begin(addr(0, 0));
        sel.extend(addr(3, 3));
        assert_eq!(sel.cells().len(), 16);
        sel.extend(addr(1, 1));
        assert_eq!(sel.cells().len(), 4);
    }

    #[test]
    fn test_extend_without_begin_is_noop() {
        let mut sel = Selection::new();
        sel.extend(addr(2, 2));
        assert!(!sel.is_active());
        assert!(sel.cells().is_empty());
    }

    #[test]
    fn test_clear() {
        let mut sel = Selection::new();
        sel.begin(addr(0, 0));
        sel.clear();
        assert!(!sel.is_active());
        assert!(sel.cells().is_empty());
    }

    #[test]
    fn test_copy_tsv() {
        let data = Dataset::from_parts(
            vec!["A".into(), "B".into()],
            vec![
                vec![CellValue::from_input("1"), CellValue::from_input("x")],
                vec![CellValue::from_input("2"), CellValue::from_input("y")],
            ],
        );
        let mut sel = Selection::new();
        sel.begin(addr(0, 0));
        sel.extend(addr(1, 1));
        assert_eq!(sel.copy_tsv(&data).unwrap(), "1\tx\n2\ty");
    }

    #[test]
    fn test_copy_tsv_empty_selection() {
        let data = Dataset::new(vec!["A".into()]);
        assert_eq!(Selection::new().copy_tsv(&data), None);
    }
}
