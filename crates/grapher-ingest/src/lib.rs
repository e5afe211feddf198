//! Chart data ingestion.
//!
//! Turns files and data frames into raw rows and column definitions, the
//! input of [`grapher_table::TableBuilder`].
//!
//! # Features
//!
//! - **CSV**: header normalization and entity/time column detection
//! - **JSON**: row arrays, column definitions and chart configuration
//! - **DataFrame**: Polars frames with named entity/time columns
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use grapher_ingest::load_table;
//! use grapher_model::TimeUnit;
//!
//! let (table, report) = load_table(Path::new("gdp.csv"), None, TimeUnit::Year)?;
//! println!("{} rows, {} rejected", table.row_count(), report.rejected_count());
//! ```

mod csv;
mod error;
mod frame;
mod json;

use std::path::Path;

use grapher_model::{ColumnDef, RawRow, TimeUnit};
use grapher_table::{IngestReport, Table, TableBuilder};
use tracing::info;

pub use crate::csv::{parse_csv_rows, read_csv_rows};
pub use error::{IngestError, Result};
pub use frame::{any_to_raw, rows_from_dataframe, rows_from_default_dataframe};
pub use json::{parse_json_rows, read_chart_config, read_column_defs, read_json_rows};

/// Source file formats recognised by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Json,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(DataFormat::Csv),
            "json" => Some(DataFormat::Json),
            _ => None,
        }
    }
}

/// Read raw rows from a CSV or JSON file.
pub fn load_rows(path: &Path) -> Result<Vec<RawRow>> {
    match DataFormat::from_path(path) {
        Some(DataFormat::Csv) => read_csv_rows(path),
        Some(DataFormat::Json) => read_json_rows(path),
        None => Err(IngestError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Read a data file and optional column definitions and build a table.
pub fn load_table(
    data: &Path,
    defs: Option<&Path>,
    time_unit: TimeUnit,
) -> Result<(Table, IngestReport)> {
    let rows = load_rows(data)?;
    let defs: Vec<ColumnDef> = match defs {
        Some(path) => read_column_defs(path)?,
        None => Vec::new(),
    };
    let (table, report) = TableBuilder::new(defs)
        .with_time_unit(time_unit)
        .build(&rows);
    info!(
        path = %data.display(),
        rows = table.row_count(),
        columns = table.column_slugs().len(),
        rejected = report.rejected_count(),
        duplicates = report.duplicate_count(),
        "loaded table"
    );
    Ok((table, report))
}
