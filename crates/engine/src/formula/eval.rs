// Formula evaluator - tree-walks a parsed expression against cell data.

use super::parser::{AggFn, Expr, Op};

/// Read access to cell data during evaluation.
///
/// The dataset implements this; tests can implement it over a literal
/// grid. Out-of-range reads behave like empty cells.
pub trait CellLookup {
    /// Numeric reading of a cell; `None` when the cell is non-numeric,
    /// empty, or out of range.
    fn number_at(&self, row: usize, col: usize) -> Option<f64>;

    /// True when the cell holds a non-empty value (COUNT semantics).
    fn is_counted(&self, row: usize, col: usize) -> bool;
}

/// Evaluate an expression. Cell references read as 0 when non-numeric or
/// out of range; aggregates follow the per-function coercion rules.
///
/// Division by zero and non-finite results are evaluation errors; the
/// caller writes the `#ERROR` sentinel for them.
pub fn evaluate(expr: &Expr, cells: &impl CellLookup) -> Result<f64, String> {
    let result = eval_expr(expr, cells)?;
    if !result.is_finite() {
        return Err("non-finite result".to_string());
    }
    Ok(result)
}

fn eval_expr(expr: &Expr, cells: &impl CellLookup) -> Result<f64, String> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::CellRef(addr) => Ok(cells.number_at(addr.row, addr.col).unwrap_or(0.0)),
        Expr::Aggregate { func, start, end } => Ok(eval_aggregate(*func, start, end, cells)),
        Expr::BinaryOp { op, left, right } => {
            let left = eval_expr(left, cells)?;
            let right = eval_expr(right, cells)?;
            match op {
                Op::Add => Ok(left + right),
                Op::Sub => Ok(left - right),
                Op::Mul => Ok(left * right),
                Op::Div => {
                    if right == 0.0 {
                        Err("division by zero".to_string())
                    } else {
                        Ok(left / right)
                    }
                }
            }
        }
    }
}

fn eval_aggregate(
    func: AggFn,
    start: &crate::address::CellAddress,
    end: &crate::address::CellAddress,
    cells: &impl CellLookup,
) -> f64 {
    let (r0, r1) = (start.row.min(end.row), start.row.max(end.row));
    let (c0, c1) = (start.col.min(end.col), start.col.max(end.col));

    match func {
        AggFn::Sum => {
            let mut sum = 0.0;
            for row in r0..=r1 {
                for col in c0..=c1 {
                    sum += cells.number_at(row, col).unwrap_or(0.0);
                }
            }
            sum
        }
        AggFn::Avg => {
            let mut sum = 0.0;
            let mut count = 0usize;
            for row in r0..=r1 {
                for col in c0..=c1 {
                    if let Some(n) = cells.number_at(row, col) {
                        sum += n;
                        count += 1;
                    }
                }
            }
            if count > 0 {
                sum / count as f64
            } else {
                0.0
            }
        }
        AggFn::Count => {
            let mut count = 0usize;
            for row in r0..=r1 {
                for col in c0..=c1 {
                    if cells.is_counted(row, col) {
                        count += 1;
                    }
                }
            }
            count as f64
        }
        AggFn::Max | AggFn::Min => {
            let mut best: Option<f64> = None;
            for row in r0..=r1 {
                for col in c0..=c1 {
                    if let Some(n) = cells.number_at(row, col) {
                        best = Some(match best {
                            None => n,
                            Some(b) if func == AggFn::Max => b.max(n),
                            Some(b) => b.min(n),
                        });
                    }
                }
            }
            // No numeric cell in range reads as 0, not an error
            best.unwrap_or(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::parser::parse;

    /// Literal grid of display strings for lookup tests.
    struct Grid(Vec<Vec<&'static str>>);

    impl CellLookup for Grid {
        fn number_at(&self, row: usize, col: usize) -> Option<f64> {
            self.0
                .get(row)
                .and_then(|r| r.get(col))
                .and_then(|s| s.trim().parse::<f64>().ok())
        }

        fn is_counted(&self, row: usize, col: usize) -> bool {
            self.0
                .get(row)
                .and_then(|r| r.get(col))
                .map(|s| !s.is_empty())
                .unwrap_or(false)
        }
    }

    fn eval(formula: &str, grid: &Grid) -> Result<f64, String> {
        evaluate(&parse(formula).unwrap(), grid)
    }

    #[test]
    fn test_sum_ignores_non_numeric() {
        let grid = Grid(vec![vec!["1"], vec!["2"], vec!["x"]]);
        assert_eq!(eval("SUM(A1:A3)", &grid).unwrap(), 3.0);
    }

    #[test]
    fn test_avg_excludes_non_numeric() {
        let grid = Grid(vec![vec!["2"], vec!["4"], vec!["x"]]);
        assert_eq!(eval("AVG(A1:A3)", &grid).unwrap(), 3.0);
    }

    #[test]
    fn test_avg_empty_range_is_zero() {
        let grid = Grid(vec![vec![""], vec![""]]);
        assert_eq!(eval("AVG(A1:A2)", &grid).unwrap(), 0.0);
    }

    #[test]
    fn test_count_non_empty() {
        let grid = Grid(vec![vec![""], vec!["a"], vec!["b"]]);
        assert_eq!(eval("COUNT(A1:A3)", &grid).unwrap(), 2.0);
    }

    #[test]
    fn test_max_min() {
        let grid = Grid(vec![vec!["5"], vec!["-2"], vec!["x"]]);
        assert_eq!(eval("MAX(A1:A3)", &grid).unwrap(), 5.0);
        assert_eq!(eval("MIN(A1:A3)", &grid).unwrap(), -2.0);
    }

    #[test]
    fn test_max_no_numeric_is_zero() {
        let grid = Grid(vec![vec!["a"], vec!["b"]]);
        assert_eq!(eval("MAX(A1:A2)", &grid).unwrap(), 0.0);
        assert_eq!(eval("MIN(A1:A2)", &grid).unwrap(), 0.0);
    }

    #[test]
    fn test_rectangular_range() {
        let grid = Grid(vec![vec!["1", "2"], vec!["3", "4"]]);
        assert_eq!(eval("SUM(A1:B2)", &grid).unwrap(), 10.0);
    }

    #[test]
    fn test_cell_ref_arithmetic() {
        let grid = Grid(vec![vec!["10", "4"]]);
        assert_eq!(eval("A1*2+B1", &grid).unwrap(), 24.0);
    }

    #[test]
    fn test_missing_ref_reads_zero() {
        let grid = Grid(vec![vec!["1"]]);
        assert_eq!(eval("A1+Z99", &grid).unwrap(), 1.0);
    }

    #[test]
    fn test_non_numeric_ref_reads_zero() {
        let grid = Grid(vec![vec!["hello", "2"]]);
        assert_eq!(eval("A1+B1", &grid).unwrap(), 2.0);
    }

    #[test]
    fn test_division_by_zero_errors() {
        let grid = Grid(vec![vec!["1", "0"]]);
        assert!(eval("A1/B1", &grid).is_err());
    }
}
