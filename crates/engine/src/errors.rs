//! Error taxonomy.
//!
//! Every error here is local and recoverable except `ParseError`, which
//! aborts the import that raised it. None is fatal to the process.

/// CSV text could not produce a dataset at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The input had no non-blank line.
    NoData,
    /// The header line yielded zero usable columns.
    NoColumns,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::NoData => write!(f, "no non-blank lines found in input"),
            ParseError::NoColumns => write!(f, "header line yielded no columns"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Attempt to add a column whose name is already taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateColumnError {
    pub name: String,
}

impl DuplicateColumnError {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl std::fmt::Display for DuplicateColumnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "column \"{}\" already exists", self.name)
    }
}

impl std::error::Error for DuplicateColumnError {}

/// A per-column validation rule rejected an entered value.
///
/// The edit has already been reverted (cell reset to empty) when this is
/// reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub column: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed for column \"{}\": {}", self.column, self.reason)
    }
}

impl std::error::Error for ValidationError {}

/// An externally supplied filter predicate could not be applied.
///
/// The canonical dataset is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterApplicationError {
    pub message: String,
}

impl FilterApplicationError {
    pub fn unknown_column(name: &str) -> Self {
        Self {
            message: format!("unknown column \"{}\"", name),
        }
    }
}

impl std::fmt::Display for FilterApplicationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "filter not applied: {}", self.message)
    }
}

impl std::error::Error for FilterApplicationError {}

/// Undo or redo was requested with an empty stack. Reported as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryUnderflow {
    Undo,
    Redo,
}

impl std::fmt::Display for HistoryUnderflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryUnderflow::Undo => write!(f, "nothing to undo"),
            HistoryUnderflow::Redo => write!(f, "nothing to redo"),
        }
    }
}

impl std::error::Error for HistoryUnderflow {}
