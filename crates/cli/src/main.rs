//! gsift - headless driver for gridsift datasets.
//!
//! Loads a CSV (or JSON records) file into an engine session, applies
//! filters/sort, prints a page window, or exports. Exists to exercise the
//! engine without a renderer.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use gridsift_config::Settings;
use gridsift_engine::dataset::{ColumnKind, Dataset};
use gridsift_engine::session::{Session, SessionOptions};
use gridsift_engine::view::{FilterPredicate, PredicateOp};

#[derive(Parser)]
#[command(name = "gsift", about = "Filter, sort and page through tabular data", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Print dataset shape and inferred column kinds
    Info {
        file: PathBuf,
    },
    /// Print a page of the (filtered, sorted) view
    Show {
        file: PathBuf,
        /// Column filter as column=value; value may be a |-separated set
        #[arg(long = "filter", value_name = "COL=VALUE")]
        filters: Vec<String>,
        /// Substring matched across all columns
        #[arg(long)]
        global: Option<String>,
        /// Sort column
        #[arg(long)]
        sort: Option<String>,
        /// Sort descending instead of ascending
        #[arg(long, requires = "sort")]
        desc: bool,
        /// Page number (0-based)
        #[arg(long, default_value_t = 0)]
        page: usize,
        /// Rows per page (defaults to the configured page size)
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Export the canonical or filtered rows
    Export {
        file: PathBuf,
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,
        /// Structured predicate column:op:value (op: eq, ne, contains, gt, ge, lt, le)
        #[arg(long, value_name = "COL:OP:VALUE")]
        r#where: Option<String>,
        /// Output path (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Info { file } => info(&file),
        Command::Show {
            file,
            filters,
            global,
            sort,
            desc,
            page,
            page_size,
        } => show(&file, &filters, global, sort, desc, page, page_size),
        Command::Export {
            file,
            format,
            r#where,
            out,
        } => export(&file, format, r#where.as_deref(), out.as_deref()),
    }
}

/// Load a session from CSV or JSON, by extension.
fn load_session(file: &std::path::Path) -> Result<Session, String> {
    let settings = Settings::load();
    let options = SessionOptions {
        page_size: settings.page_size,
        history_limit: settings.history_limit,
    };

    let data = load_dataset(file)?;
    Ok(Session::with_options(data, options))
}

fn load_dataset(file: &std::path::Path) -> Result<Dataset, String> {
    let is_json = file
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        gridsift_io::json::import(file)
    } else {
        let (data, report) = gridsift_io::csv::import(file)?;
        if report.rows_skipped > 0 {
            eprintln!("{}", report.log_line());
            for warning in &report.warnings {
                eprintln!("  skipped {}", warning);
            }
        }
        Ok(data)
    }
}

fn info(file: &std::path::Path) -> Result<(), String> {
    let session = load_session(file)?;
    let data = session.canonical();

    println!("{} rows x {} columns", data.row_count(), data.column_count());
    for (i, name) in data.columns().iter().enumerate() {
        let kind = match data.kind(i) {
            Some(ColumnKind::Numeric) => "numeric",
            Some(ColumnKind::Categorical) => "categorical",
            _ => "text",
        };
        println!("  {:<20} {}", name, kind);
    }
    Ok(())
}

fn show(
    file: &std::path::Path,
    filters: &[String],
    global: Option<String>,
    sort: Option<String>,
    desc: bool,
    page: usize,
    page_size: Option<usize>,
) -> Result<(), String> {
    let mut session = load_session(file)?;

    for spec in filters {
        let (column, value) = spec
            .split_once('=')
            .ok_or_else(|| format!("bad filter \"{}\", expected COL=VALUE", spec))?;
        session.set_column_filter(column, value);
    }
    session.set_global_filter(global);
    if let Some(column) = sort {
        session.sort_by(&column);
        if desc {
            session.sort_by(&column); // second toggle flips to descending
        }
    }
    if let Some(size) = page_size {
        session.set_page_size(size);
    }
    session.set_page(page);

    let view = session.view();
    print_window(session.columns(), &view);
    Ok(())
}

fn print_window(columns: &[String], view: &gridsift_engine::view::ViewWindow) {
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(col, name)| {
            view.rows
                .iter()
                .map(|row| row.get(col).map(|v| v.display().len()).unwrap_or(0))
                .max()
                .unwrap_or(0)
                .max(name.len())
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(name, w)| format!("{:<width$}", name, width = *w))
        .collect();
    println!("{}", header.join("  "));

    for row in &view.rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(value, w)| format!("{:<width$}", value.display(), width = *w))
            .collect();
        println!("{}", line.join("  "));
    }

    let page = &view.page;
    println!(
        "rows {} of {}  ·  page {}/{}",
        page.showing_range(),
        page.total_rows,
        page.current_page + 1,
        page.total_pages.max(1)
    );
}

fn export(
    file: &std::path::Path,
    format: ExportFormat,
    predicate: Option<&str>,
    out: Option<&std::path::Path>,
) -> Result<(), String> {
    let mut session = load_session(file)?;

    if let Some(spec) = predicate {
        let pred = parse_predicate(spec)?;
        let kept = session
            .apply_external_filter(&pred)
            .map_err(|e| e.to_string())?;
        eprintln!("{} rows match", kept);
    }

    let data = session.canonical();
    let content = match format {
        ExportFormat::Csv => gridsift_io::csv::export_string(data)?,
        ExportFormat::Json => gridsift_io::json::export_string(data)?,
    };

    match out {
        Some(path) => std::fs::write(path, content).map_err(|e| e.to_string()),
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}

/// Parse `column:op:value` into a structured predicate.
fn parse_predicate(spec: &str) -> Result<FilterPredicate, String> {
    let mut parts = spec.splitn(3, ':');
    let column = parts.next().unwrap_or_default();
    let op = parts.next().unwrap_or_default();
    let value = parts.next().unwrap_or_default();
    if column.is_empty() || op.is_empty() {
        return Err(format!("bad predicate \"{}\", expected COL:OP:VALUE", spec));
    }
    let op = PredicateOp::parse(op).ok_or_else(|| format!("unknown operator \"{}\"", op))?;
    Ok(FilterPredicate::new(column, op, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_predicate() {
        let pred = parse_predicate("Age:gt:30").unwrap();
        assert_eq!(pred.column, "Age");
        assert_eq!(pred.op, PredicateOp::Gt);
        assert_eq!(pred.value, "30");

        // Value may contain colons
        let pred = parse_predicate("When:contains:12:30").unwrap();
        assert_eq!(pred.value, "12:30");

        assert!(parse_predicate("Age").is_err());
        assert!(parse_predicate("Age:wat:1").is_err());
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
