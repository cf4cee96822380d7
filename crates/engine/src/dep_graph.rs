//! Dependency graph for formula cells.
//!
//! Tracks precedents (cells a formula reads) and dependents (formula cells
//! that read a given cell), and produces the evaluation order for a
//! recalculation pass.
//!
//! # Edge Direction
//!
//! ```text
//! A → B  means  "B depends on A"  (A is a precedent of B)
//! ```
//!
//! # Invariants
//!
//! 1. Bidirectional consistency: if A ∈ preds[B] then B ∈ succs[A].
//! 2. No dangling entries: empty sets are removed, not stored.
//! 3. No duplicate edges: set semantics enforced by FxHashSet.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::address::CellAddress;

#[derive(Default, Debug, Clone)]
pub struct DepGraph {
    /// For each formula cell B, the cells A it reads.
    preds: FxHashMap<CellAddress, FxHashSet<CellAddress>>,
    /// For each referenced cell A, the formula cells B that read it.
    succs: FxHashMap<CellAddress, FxHashSet<CellAddress>>,
}

/// Result of ordering the formula cells for one recalculation pass.
#[derive(Debug, Clone, Default)]
pub struct TopoOrder {
    /// Formula cells in a valid evaluation order (precedents first).
    pub order: Vec<CellAddress>,
    /// Formula cells on a cycle, or fed (transitively) by one. These never
    /// reach the order and are marked `#CYCLE` by the recalc pass.
    pub cyclic: Vec<CellAddress>,
    /// Dependency depth per ordered cell: a formula reading no formulas
    /// has depth 1, otherwise max(precedent depths) + 1.
    pub depths: FxHashMap<CellAddress, usize>,
}

impl DepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all edges for a formula cell atomically.
    ///
    /// Pass an empty set to clear the cell's edges.
    pub fn replace_edges(&mut self, formula_cell: CellAddress, new_preds: FxHashSet<CellAddress>) {
        if let Some(old_preds) = self.preds.remove(&formula_cell) {
            for pred in old_preds {
                if let Some(deps) = self.succs.get_mut(&pred) {
                    deps.remove(&formula_cell);
                    if deps.is_empty() {
                        self.succs.remove(&pred);
                    }
                }
            }
        }

        if new_preds.is_empty() {
            return;
        }

        for pred in &new_preds {
            self.succs.entry(*pred).or_default().insert(formula_cell);
        }
        self.preds.insert(formula_cell, new_preds);
    }

    pub fn precedents(&self, cell: CellAddress) -> impl Iterator<Item = CellAddress> + '_ {
        self.preds
            .get(&cell)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    pub fn dependents(&self, cell: CellAddress) -> impl Iterator<Item = CellAddress> + '_ {
        self.succs
            .get(&cell)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    pub fn formula_cell_count(&self) -> usize {
        self.preds.len()
    }

    /// Order the given formula cells so every cell follows its formula
    /// precedents (Kahn's algorithm). Only edges between two formula cells
    /// constrain the order; reads of plain value cells do not.
    pub fn topo_order(&self, formula_cells: &[CellAddress]) -> TopoOrder {
        let cell_set: FxHashSet<CellAddress> = formula_cells.iter().copied().collect();

        // In-degree counts only formula→formula edges
        let mut indegree: FxHashMap<CellAddress, usize> = FxHashMap::default();
        for &cell in formula_cells {
            let n = self
                .precedents(cell)
                .filter(|p| cell_set.contains(p) && *p != cell)
                .count();
            let self_edge = self.precedents(cell).any(|p| p == cell);
            // A self-reference is a one-cell cycle
            indegree.insert(cell, n + usize::from(self_edge));
        }

        let mut queue: Vec<CellAddress> = formula_cells
            .iter()
            .copied()
            .filter(|c| indegree[c] == 0)
            .collect();
        let mut result = TopoOrder::default();

        while let Some(cell) = queue.pop() {
            let depth = self
                .precedents(cell)
                .filter(|p| cell_set.contains(p))
                .filter_map(|p| result.depths.get(&p).copied())
                .max()
                .unwrap_or(0)
                + 1;
            result.depths.insert(cell, depth);
            result.order.push(cell);

            for dep in self.dependents(cell) {
                if dep == cell || !cell_set.contains(&dep) {
                    continue;
                }
                if let Some(n) = indegree.get_mut(&dep) {
                    if *n > 0 {
                        *n -= 1;
                        if *n == 0 {
                            queue.push(dep);
                        }
                    }
                }
            }
        }

        let emitted: FxHashSet<CellAddress> = result.order.iter().copied().collect();
        result.cyclic = formula_cells
            .iter()
            .copied()
            .filter(|c| !emitted.contains(c))
            .collect();

        result
    }
}
