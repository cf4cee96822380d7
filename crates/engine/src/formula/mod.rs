pub mod eval;
pub mod parser;

use rustc_hash::FxHashMap;

use crate::address::CellAddress;
use parser::Expr;

/// One cell's formula binding: the raw source (text after the leading `=`)
/// and its parsed AST, when parsing succeeded.
#[derive(Debug, Clone)]
pub struct Binding {
    pub source: String,
    pub ast: Option<Expr>,
}

/// Formula bindings for a dataset, in insertion order.
///
/// The displayed/stored value of a bound cell is its last evaluation
/// result; the binding itself survives until the cell is edited with a
/// non-formula value.
#[derive(Debug, Clone, Default)]
pub struct FormulaBindings {
    order: Vec<CellAddress>,
    map: FxHashMap<CellAddress, Binding>,
}

impl FormulaBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `source` (formula text without the `=`) to a cell, replacing
    /// any existing binding at that address.
    pub fn bind(&mut self, addr: CellAddress, source: &str) {
        let ast = parser::parse(source).ok();
        if !self.map.contains_key(&addr) {
            self.order.push(addr);
        }
        self.map.insert(
            addr,
            Binding {
                source: source.to_string(),
                ast,
            },
        );
    }

    /// Remove the binding at an address. Returns true if one existed.
    pub fn unbind(&mut self, addr: CellAddress) -> bool {
        if self.map.remove(&addr).is_some() {
            self.order.retain(|a| *a != addr);
            true
        } else {
            false
        }
    }

    pub fn get(&self, addr: CellAddress) -> Option<&Binding> {
        self.map.get(&addr)
    }

    pub fn source(&self, addr: CellAddress) -> Option<&str> {
        self.map.get(&addr).map(|b| b.source.as_str())
    }

    pub fn contains(&self, addr: CellAddress) -> bool {
        self.map.contains_key(&addr)
    }

    /// Bound addresses in insertion order.
    pub fn addresses(&self) -> &[CellAddress] {
        &self.order
    }

    /// Iterate bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (CellAddress, &Binding)> + '_ {
        self.order.iter().map(move |addr| (*addr, &self.map[addr]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.map.clear();
    }
}
