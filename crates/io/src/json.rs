// JSON import/export

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use gridsift_engine::cell::CellValue;
use gridsift_engine::csv::parse_records;
use gridsift_engine::dataset::Dataset;

/// Import a JSON array of uniform records.
///
/// Column order follows the first record; missing keys become empty
/// strings for that row.
pub fn import(path: &Path) -> Result<Dataset, String> {
    let content = super::csv::read_file_as_utf8(path)?;
    import_from_str(&content)
}

pub fn import_from_str(text: &str) -> Result<Dataset, String> {
    let records: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_str(text).map_err(|e| e.to_string())?;
    parse_records(&records).map_err(|e| e.to_string())
}

/// Export rows as a JSON array of objects keyed by column name.
pub fn export(data: &Dataset, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| e.to_string())?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &records_of(data.columns(), data.rows()))
        .map_err(|e| e.to_string())
}

pub fn export_string(data: &Dataset) -> Result<String, String> {
    serde_json::to_string_pretty(&records_of(data.columns(), data.rows()))
        .map_err(|e| e.to_string())
}

/// Export an explicit row set (e.g. the current view window's rows).
pub fn export_rows_string(columns: &[String], rows: &[Vec<CellValue>]) -> Result<String, String> {
    serde_json::to_string_pretty(&records_of(columns, rows)).map_err(|e| e.to_string())
}

fn records_of(
    columns: &[String],
    rows: &[Vec<CellValue>],
) -> Vec<serde_json::Map<String, serde_json::Value>> {
    rows.iter()
        .map(|row| {
            columns
                .iter()
                .enumerate()
                .map(|(i, col)| {
                    let display = row.get(i).map(|v| v.display()).unwrap_or_default();
                    (col.clone(), serde_json::Value::String(display))
                })
                .collect()
        })
        .collect()
}
