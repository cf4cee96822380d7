//! CSV text ingestion.
//!
//! Turns raw CSV text into a `Dataset`. Parsing is best-effort: one
//! malformed data line is skipped (and recorded in the `ImportReport`)
//! without aborting the import. Only a missing header is fatal.
//!
//! Tokenizer rules: inside a quoted field a doubled quote (`""`) is a
//! literal quote, any other quote toggles quoted state, and commas inside
//! quotes are literal. Every produced field is trimmed.

use serde::{Deserialize, Serialize};

use crate::cell::CellValue;
use crate::dataset::Dataset;
use crate::errors::ParseError;

/// A single data line that could not be tokenized. Non-fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowParseWarning {
    /// 1-based line number in the (normalized) input.
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for RowParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Summary of one import pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Number of data rows that made it into the dataset.
    pub rows_imported: usize,
    /// Number of data lines skipped because they failed to tokenize.
    pub rows_skipped: usize,
    /// Number of columns found in the header.
    pub columns: usize,
    /// One warning per skipped line.
    pub warnings: Vec<RowParseWarning>,
}

impl ImportReport {
    /// Format as a one-line log entry.
    ///
    /// Format: `[import/csv] 128 rows  5 cols  skipped=1`
    pub fn log_line(&self) -> String {
        format!(
            "[import/csv] {} rows  {} cols  skipped={}",
            self.rows_imported, self.columns, self.rows_skipped
        )
    }
}

/// Parse CSV text into a dataset.
pub fn parse(text: &str) -> Result<Dataset, ParseError> {
    parse_with_report(text).map(|(data, _)| data)
}

/// Parse CSV text, also returning the import report.
///
/// Fails with `ParseError` when no non-blank line exists or the header
/// line yields zero columns.
pub fn parse_with_report(text: &str) -> Result<(Dataset, ImportReport), ParseError> {
    // Normalize line endings before splitting
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();

    let header_index = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .ok_or(ParseError::NoData)?;

    let headers =
        parse_line(lines[header_index]).map_err(|_| ParseError::NoColumns)?;
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ParseError::NoColumns);
    }

    let mut report = ImportReport {
        columns: headers.len(),
        ..Default::default()
    };
    let mut rows: Vec<Vec<CellValue>> = Vec::new();

    for (offset, line) in lines[header_index + 1..].iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(values) => {
                // Zip against headers by position: missing fields become
                // empty, extra fields are dropped.
                let row = (0..headers.len())
                    .map(|i| values.get(i).map(|v| CellValue::from_input(v)).unwrap_or(CellValue::Empty))
                    .collect();
                rows.push(row);
            }
            Err(message) => {
                report.rows_skipped += 1;
                report.warnings.push(RowParseWarning {
                    line: header_index + offset + 2,
                    message,
                });
            }
        }
    }

    report.rows_imported = rows.len();
    Ok((Dataset::from_parts(headers, rows), report))
}

/// Tokenize one CSV line with quote handling. Fields are trimmed.
///
/// Fails when a quoted field is still open at end of line.
pub fn parse_line(line: &str) -> Result<Vec<String>, String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // Escaped quote
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                result.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }

    result.push(current.trim().to_string());
    Ok(result)
}

/// Ingest a pre-parsed array of uniform records (the JSON import path).
///
/// Column order comes from the first record's key order; missing keys in
/// later records become empty strings, unknown keys are ignored.
pub fn parse_records(
    records: &[serde_json::Map<String, serde_json::Value>],
) -> Result<Dataset, ParseError> {
    let first = records.first().ok_or(ParseError::NoData)?;
    let columns: Vec<String> = first.keys().cloned().collect();
    if columns.is_empty() {
        return Err(ParseError::NoColumns);
    }

    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|col| match record.get(col) {
                    None | Some(serde_json::Value::Null) => CellValue::Empty,
                    Some(serde_json::Value::String(s)) => CellValue::from_input(s),
                    Some(serde_json::Value::Number(n)) => {
                        CellValue::Number(n.as_f64().unwrap_or(0.0))
                    }
                    Some(other) => CellValue::from_input(&other.to_string()),
                })
                .collect()
        })
        .collect();

    Ok(Dataset::from_parts(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_quote_handling() {
        assert_eq!(
            parse_line("a,\"b,c\",\"d\"\"e\"").unwrap(),
            vec!["a", "b,c", "d\"e"]
        );
    }

    #[test]
    fn test_parse_line_trims_fields() {
        assert_eq!(parse_line(" a , b ,c ").unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_line_unterminated_quote() {
        assert!(parse_line("a,\"open").is_err());
    }

    #[test]
    fn test_parse_basic() {
        let data = parse("Name,Age\nAlice,30\nBob,25\n").unwrap();
        assert_eq!(data.columns(), &["Name".to_string(), "Age".to_string()]);
        assert_eq!(data.row_count(), 2);
        assert_eq!(data.display_at(0, 0), "Alice");
        assert_eq!(data.value(1, 1), CellValue::Number(25.0));
    }

    #[test]
    fn test_parse_line_endings() {
        let data = parse("A,B\r\n1,2\r3,4\n").unwrap();
        assert_eq!(data.row_count(), 2);
        assert_eq!(data.display_at(1, 1), "4");
    }

    #[test]
    fn test_parse_skips_leading_blank_lines() {
        let data = parse("\n   \nName\nAlice\n").unwrap();
        assert_eq!(data.columns(), &["Name".to_string()]);
        assert_eq!(data.row_count(), 1);
    }

    #[test]
    fn test_parse_short_and_long_rows() {
        let data = parse("A,B,C\n1\n1,2,3,4\n").unwrap();
        assert_eq!(data.value(0, 1), CellValue::Empty);
        assert_eq!(data.value(0, 2), CellValue::Empty);
        // Extra field dropped
        assert_eq!(data.display_at(1, 2), "3");
    }

    #[test]
    fn test_parse_no_data() {
        assert_eq!(parse("").unwrap_err(), ParseError::NoData);
        assert_eq!(parse("\n\n  \n").unwrap_err(), ParseError::NoData);
    }

    #[test]
    fn test_parse_no_columns() {
        assert_eq!(parse(",,\n1,2,3").unwrap_err(), ParseError::NoColumns);
    }

    #[test]
    fn test_malformed_line_skipped_not_fatal() {
        let (data, report) = parse_with_report("A,B\n1,2\n\"bad,3\n4,5\n").unwrap();
        assert_eq!(data.row_count(), 2);
        assert_eq!(report.rows_imported, 2);
        assert_eq!(report.rows_skipped, 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].line, 3);
    }

    #[test]
    fn test_report_log_line() {
        let report = ImportReport {
            rows_imported: 128,
            rows_skipped: 1,
            columns: 5,
            warnings: vec![],
        };
        assert_eq!(report.log_line(), "[import/csv] 128 rows  5 cols  skipped=1");
    }

    #[test]
    fn test_parse_records() {
        let records: Vec<serde_json::Map<String, serde_json::Value>> = vec![
            serde_json::from_str(r#"{"Name":"Alice","Age":30}"#).unwrap(),
            serde_json::from_str(r#"{"Name":"Bob"}"#).unwrap(),
        ];
        let data = parse_records(&records).unwrap();
        assert_eq!(data.columns(), &["Name".to_string(), "Age".to_string()]);
        assert_eq!(data.value(0, 1), CellValue::Number(30.0));
        assert_eq!(data.value(1, 1), CellValue::Empty);
    }

    #[test]
    fn test_parse_records_empty() {
        assert_eq!(parse_records(&[]).unwrap_err(), ParseError::NoData);
    }
}
