//! Per-row ingestion outcomes.
//!
//! Malformed and duplicate rows are recovered locally while a table is
//! built; this report is how the caller learns about them.

use std::fmt;

use grapher_model::{ColumnSlug, RowKey};
use serde::Serialize;

/// Why an input row was excluded from the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "camelCase")]
pub enum RejectReason {
    MissingEntity,
    MissingTime,
    /// The time field was present but not an integer (or date, on day axes).
    InvalidTime(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingEntity => f.write_str("missing entity name"),
            RejectReason::MissingTime => f.write_str("missing time"),
            RejectReason::InvalidTime(raw) => write!(f, "invalid time value {raw:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRow {
    /// Position of the row in the input.
    pub index: usize,
    pub reason: RejectReason,
}

/// A cell that could not be coerced to its column's kind and was stored as Missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidCell {
    pub index: usize,
    pub slug: ColumnSlug,
    pub raw: String,
}

/// Outcome of building a table from raw rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub input_rows: usize,
    pub accepted_rows: usize,
    pub rejected: Vec<RejectedRow>,
    /// Keys seen more than once; later values overwrote earlier ones.
    pub duplicates: Vec<RowKey>,
    pub invalid_cells: Vec<InvalidCell>,
}

impl IngestReport {
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }

    /// Returns true when every input row landed in the table unchanged.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.duplicates.is_empty() && self.invalid_cells.is_empty()
    }
}
