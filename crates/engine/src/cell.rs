use serde::{Deserialize, Serialize};

/// Error sentinel written into a cell when formula evaluation fails.
pub const ERROR_SENTINEL: &str = "#ERROR";

/// Error sentinel for cells on (or fed by) a circular reference.
pub const CYCLE_SENTINEL: &str = "#CYCLE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Error(String),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl CellValue {
    /// Coerce raw user input into a typed value.
    ///
    /// Input is trimmed; blank input becomes `Empty`, numeric input becomes
    /// `Number`, everything else `Text`. Formula detection (leading `=`) is
    /// the session's job, not this function's.
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        if let Ok(num) = trimmed.parse::<f64>() {
            if num.is_finite() {
                return CellValue::Number(num);
            }
        }

        CellValue::Text(trimmed.to_string())
    }

    /// The evaluation-failure sentinel value.
    pub fn error() -> Self {
        CellValue::Error(ERROR_SENTINEL.to_string())
    }

    /// The circular-reference sentinel value.
    pub fn cycle() -> Self {
        CellValue::Error(CYCLE_SENTINEL.to_string())
    }

    /// Numeric reading of this value, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Display string: what the renderer and exporters show.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Error(e) => e.clone(),
        }
    }

    /// True for `Empty` and for blank text.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}
