// CSV file import/export

use std::io::Read;
use std::path::Path;

use gridsift_engine::cell::CellValue;
use gridsift_engine::csv::{parse_with_report, ImportReport};
use gridsift_engine::dataset::Dataset;

/// Import a CSV file into a dataset, with the import report.
pub fn import(path: &Path) -> Result<(Dataset, ImportReport), String> {
    let content = read_file_as_utf8(path)?;
    parse_with_report(&content).map_err(|e| e.to_string())
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Export a whole dataset to a CSV file. Every field is quoted.
pub fn export(data: &Dataset, path: &Path) -> Result<(), String> {
    let file = std::fs::File::create(path).map_err(|e| e.to_string())?;
    write_csv(file, data.columns(), data.rows())
}

/// Export a whole dataset to a CSV string.
pub fn export_string(data: &Dataset) -> Result<String, String> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, data.columns(), data.rows())?;
    String::from_utf8(buffer).map_err(|e| e.to_string())
}

/// Export an explicit row set (e.g. the current view window's rows).
pub fn export_rows_string(columns: &[String], rows: &[Vec<CellValue>]) -> Result<String, String> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, columns, rows)?;
    String::from_utf8(buffer).map_err(|e| e.to_string())
}

fn write_csv<W: std::io::Write>(
    writer: W,
    columns: &[String],
    rows: &[Vec<CellValue>],
) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(writer);

    writer.write_record(columns).map_err(|e| e.to_string())?;
    for row in rows {
        let record: Vec<String> = row.iter().map(|v| v.display()).collect();
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())
}
