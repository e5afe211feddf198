//! JSON rows, column definitions and chart configuration.

use std::path::Path;

use grapher_model::{ChartSeriesConfig, ColumnDef, RawRow};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{IngestError, Result};

fn read_to_string(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

fn parse<T: DeserializeOwned>(text: &str, path: &Path) -> Result<T> {
    serde_json::from_str(text).map_err(|source| IngestError::JsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read an array of `{ "entityName", "time", <slug>: value }` rows.
pub fn read_json_rows(path: &Path) -> Result<Vec<RawRow>> {
    let rows: Vec<RawRow> = parse(&read_to_string(path)?, path)?;
    debug!(path = %path.display(), rows = rows.len(), "read json rows");
    Ok(rows)
}

/// Read an array of column definitions.
pub fn read_column_defs(path: &Path) -> Result<Vec<ColumnDef>> {
    let defs: Vec<ColumnDef> = parse(&read_to_string(path)?, path)?;
    debug!(path = %path.display(), columns = defs.len(), "read column definitions");
    Ok(defs)
}

/// Read one chart series configuration.
pub fn read_chart_config(path: &Path) -> Result<ChartSeriesConfig> {
    parse(&read_to_string(path)?, path)
}

/// Parse rows from an in-memory JSON string.
pub fn parse_json_rows(text: &str) -> Result<Vec<RawRow>> {
    parse(text, Path::new("<inline>"))
}
