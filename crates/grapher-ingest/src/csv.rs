//! CSV reading into raw rows.
//!
//! The first non-blank record is the header. One header must name the
//! entity (`entityName`, `entity` or `country`) and one the time (`time`,
//! `year`, `day` or `date`); every other header becomes a field. Blank cells
//! are read as nulls, everything else as text for the table builder to coerce.

use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use grapher_model::{RawRow, RawValue};
use tracing::debug;

use crate::error::{IngestError, Result};

const ENTITY_HEADERS: &[&str] = &["entityname", "entity", "country"];
const TIME_HEADERS: &[&str] = &["time", "year", "day", "date"];

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized
}

fn normalize_cell(raw: &str) -> RawValue {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    if trimmed.is_empty() {
        RawValue::Null
    } else {
        RawValue::Text(trimmed.to_string())
    }
}

/// Header key used to recognise entity and time columns.
fn header_key(header: &str) -> String {
    header
        .chars()
        .filter(|ch| !matches!(ch, '_' | '-' | ' '))
        .collect::<String>()
        .to_lowercase()
}

fn find_header(headers: &[String], candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|candidate| headers.iter().position(|h| header_key(h) == *candidate))
}

/// Read a CSV file into raw rows.
pub fn read_csv_rows(path: &Path) -> Result<Vec<RawRow>> {
    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = std::fs::File::open(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_csv_rows(file, path)
}

/// Parse CSV from any reader; `path` labels errors.
pub fn parse_csv_rows<R: Read>(input: R, path: &Path) -> Result<Vec<RawRow>> {
    let csv_error = |source: csv::Error| IngestError::CsvParse {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut records = reader.records();
    let mut headers: Option<Vec<String>> = None;
    for record in records.by_ref() {
        let record = record.map_err(csv_error)?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        headers = Some(record.iter().map(normalize_header).collect());
        break;
    }
    let Some(headers) = headers else {
        return Ok(Vec::new());
    };

    let entity_idx = find_header(&headers, ENTITY_HEADERS).ok_or_else(|| {
        IngestError::MissingKeyColumn {
            column: "entity",
            path: path.to_path_buf(),
        }
    })?;
    let time_idx =
        find_header(&headers, TIME_HEADERS).ok_or_else(|| IngestError::MissingKeyColumn {
            column: "time",
            path: path.to_path_buf(),
        })?;

    let mut rows = Vec::new();
    for record in records {
        let record = record.map_err(csv_error)?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let mut row = RawRow::default();
        for (idx, header) in headers.iter().enumerate() {
            let value = normalize_cell(record.get(idx).unwrap_or(""));
            if idx == entity_idx {
                if let RawValue::Text(name) = value {
                    row.entity_name = Some(name);
                }
            } else if idx == time_idx {
                row.time = Some(value);
            } else if !header.is_empty() {
                row.values.insert(header.clone(), value);
            }
        }
        rows.push(row);
    }
    debug!(path = %path.display(), rows = rows.len(), columns = headers.len(), "read csv rows");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_bom_and_blank_lines() {
        let data = "\u{feff}Entity , Year,gdp ,region\n\nFrance,2000,1.5,Europe\nChad,2000,,Africa\n";
        let rows = parse_csv_rows(data.as_bytes(), Path::new("inline.csv")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entity_name.as_deref(), Some("France"));
        assert_eq!(rows[0].time, Some(RawValue::from("2000")));
        assert_eq!(rows[0].values.get("gdp"), Some(&RawValue::from("1.5")));
        assert_eq!(rows[1].values.get("gdp"), Some(&RawValue::Null));
    }

    #[test]
    fn test_missing_time_header() {
        let data = "entityName,gdp\nFrance,1\n";
        let err = parse_csv_rows(data.as_bytes(), Path::new("inline.csv")).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingKeyColumn { column: "time", .. }
        ));
    }

    #[test]
    fn test_short_records_pad_with_nulls() {
        let data = "entity_name,time,a,b\nFrance,2000,1\n";
        let rows = parse_csv_rows(data.as_bytes(), Path::new("inline.csv")).unwrap();
        assert_eq!(rows[0].values.get("b"), Some(&RawValue::Null));
    }
}
