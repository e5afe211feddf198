//! Building a table from raw rows.
//!
//! Rows are validated one at a time: a row without an entity or a usable
//! time is rejected and reported, a cell that cannot be coerced to its
//! column's kind is stored as Missing and reported, and a repeated
//! `(entity, time)` key is merged into the first occurrence field by field,
//! with the later value winning.

use std::collections::{BTreeMap, HashMap};

use grapher_model::time::parse_time;
use grapher_model::{
    CellValue, ColumnDef, ColumnKind, ColumnSlug, EntityName, RawRow, RawValue, RowKey, Time,
    TimeUnit, format_number,
};
use tracing::{debug, warn};

use crate::column::Column;
use crate::report::{IngestReport, InvalidCell, RejectReason, RejectedRow};
use crate::table::{ColumnStore, Table};

/// Configurable entry point for turning raw rows into a [`Table`].
#[derive(Debug, Clone)]
pub struct TableBuilder {
    defs: Vec<ColumnDef>,
    time_unit: TimeUnit,
    infer_undeclared: bool,
}

impl TableBuilder {
    pub fn new(defs: Vec<ColumnDef>) -> Self {
        Self {
            defs,
            time_unit: TimeUnit::Year,
            infer_undeclared: true,
        }
    }

    pub fn with_time_unit(mut self, unit: TimeUnit) -> Self {
        self.time_unit = unit;
        self
    }

    /// When disabled, fields without a column definition are ignored.
    pub fn with_inference(mut self, enabled: bool) -> Self {
        self.infer_undeclared = enabled;
        self
    }

    pub fn build(&self, rows: &[RawRow]) -> (Table, IngestReport) {
        let mut report = IngestReport {
            input_rows: rows.len(),
            ..IngestReport::default()
        };

        let defs = self.resolve_defs(rows);

        let mut keys: Vec<RowKey> = Vec::new();
        let mut positions: HashMap<RowKey, usize> = HashMap::new();
        // Per physical row: field -> (input index, raw value). The last
        // non-blank value wins; a blank only fills a field not yet seen.
        let mut merged: Vec<BTreeMap<&str, (usize, &RawValue)>> = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            let key = match self.row_key(row) {
                Ok(key) => key,
                Err(reason) => {
                    debug!(index, %reason, "rejected input row");
                    report.rejected.push(RejectedRow { index, reason });
                    continue;
                }
            };
            let position = match positions.get(&key) {
                Some(&position) => {
                    warn!(key = %key, index, "duplicate row key, later values overwrite earlier ones");
                    report.duplicates.push(key);
                    position
                }
                None => {
                    let position = keys.len();
                    positions.insert(key.clone(), position);
                    keys.push(key);
                    merged.push(BTreeMap::new());
                    position
                }
            };
            for (field, value) in &row.values {
                let fields = &mut merged[position];
                if value.is_blank() && fields.contains_key(field.as_str()) {
                    continue;
                }
                fields.insert(field.as_str(), (index, value));
            }
        }

        let mut columns = Vec::with_capacity(defs.len());
        for def in defs {
            let mut values = Vec::with_capacity(keys.len());
            for (position, key) in keys.iter().enumerate() {
                let cell = match merged[position].get(def.slug.as_str()) {
                    Some(&(index, raw)) => match coerce(raw, def.kind) {
                        Some(cell) => cell,
                        None => {
                            report.invalid_cells.push(InvalidCell {
                                index,
                                slug: def.slug.clone(),
                                raw: raw.to_string(),
                            });
                            CellValue::Missing
                        }
                    },
                    None => key_cell(key, def.kind),
                };
                values.push(cell);
            }
            columns.push(Column::raw(def, values));
        }

        report.accepted_rows = keys.len();
        if !report.invalid_cells.is_empty() {
            warn!(
                count = report.invalid_cells.len(),
                "cells could not be coerced to their column kind and were stored as missing"
            );
        }
        debug!(
            input = report.input_rows,
            accepted = report.accepted_rows,
            rejected = report.rejected_count(),
            duplicates = report.duplicate_count(),
            columns = columns.len(),
            "built table"
        );

        let (entities, times): (Vec<EntityName>, Vec<Time>) =
            keys.into_iter().map(|key| (key.entity, key.time)).unzip();
        let store = ColumnStore::new(entities, times, columns, self.time_unit);
        (Table::from_store(store), report)
    }

    fn row_key(&self, row: &RawRow) -> Result<RowKey, RejectReason> {
        let entity = row
            .entity_name
            .as_deref()
            .and_then(|name| EntityName::new(name).ok())
            .ok_or(RejectReason::MissingEntity)?;
        let raw_time = row
            .time
            .as_ref()
            .filter(|raw| !raw.is_blank())
            .ok_or(RejectReason::MissingTime)?;
        let time = parse_time(raw_time, self.time_unit)
            .ok_or_else(|| RejectReason::InvalidTime(raw_time.to_string()))?;
        Ok(RowKey::new(entity, time))
    }

    /// Declared definitions first, then inferred ones for undeclared fields
    /// in order of first appearance.
    fn resolve_defs(&self, rows: &[RawRow]) -> Vec<ColumnDef> {
        let mut defs: Vec<ColumnDef> = Vec::with_capacity(self.defs.len());
        for def in &self.defs {
            if defs.iter().any(|existing| existing.slug == def.slug) {
                warn!(slug = %def.slug, "duplicate column definition ignored");
                continue;
            }
            defs.push(def.clone());
        }
        if !self.infer_undeclared {
            return defs;
        }

        let mut undeclared: Vec<&str> = Vec::new();
        for row in rows {
            for field in row.values.keys() {
                let declared = defs.iter().any(|def| def.slug.as_str() == field.as_str());
                if !declared && !undeclared.contains(&field.as_str()) {
                    undeclared.push(field);
                }
            }
        }
        for field in undeclared {
            let Ok(slug) = ColumnSlug::new(field) else {
                continue;
            };
            let kind = infer_column_kind(rows.iter().filter_map(|row| row.values.get(field)));
            debug!(slug = %slug, kind = %kind, "inferred column kind");
            defs.push(ColumnDef::new(slug, kind));
        }
        defs
    }
}

impl Table {
    /// Build a year-based table, returning it with the ingestion report.
    pub fn from_raw_rows(rows: &[RawRow], defs: Vec<ColumnDef>) -> (Table, IngestReport) {
        TableBuilder::new(defs).build(rows)
    }
}

/// Infer the kind of an undeclared column from its non-blank values.
///
/// Numeric when every value reads as a number, Boolean when every value is
/// a boolean, Categorical otherwise (and for columns with no values at all).
pub fn infer_column_kind<'a>(values: impl IntoIterator<Item = &'a RawValue>) -> ColumnKind {
    let mut seen = false;
    let mut all_numeric = true;
    let mut all_boolean = true;
    for value in values.into_iter().filter(|value| !value.is_blank()) {
        seen = true;
        all_numeric &= value.to_f64().is_some();
        all_boolean &= parse_bool(value).is_some();
        if !all_numeric && !all_boolean {
            break;
        }
    }
    match (seen, all_numeric, all_boolean) {
        (false, _, _) => ColumnKind::Categorical,
        (true, true, _) => ColumnKind::Numeric,
        (true, false, true) => ColumnKind::Boolean,
        _ => ColumnKind::Categorical,
    }
}

/// Coerce one raw value to a column kind. `None` means the value is invalid
/// for the kind; blanks always coerce to Missing.
pub(crate) fn coerce(raw: &RawValue, kind: ColumnKind) -> Option<CellValue> {
    if raw.is_blank() {
        return Some(CellValue::Missing);
    }
    if kind.is_numeric() {
        return raw.to_f64().map(CellValue::Number);
    }
    if kind.is_boolean() {
        return parse_bool(raw).map(CellValue::Boolean);
    }
    let text = match raw {
        RawValue::Text(s) => s.trim().to_string(),
        RawValue::Number(v) => format_number(*v),
        RawValue::Boolean(v) => v.to_string(),
        RawValue::Null => return Some(CellValue::Missing),
    };
    Some(CellValue::Text(text))
}

fn parse_bool(raw: &RawValue) -> Option<bool> {
    match raw {
        RawValue::Boolean(v) => Some(*v),
        RawValue::Number(v) if *v == 1.0 => Some(true),
        RawValue::Number(v) if *v == 0.0 => Some(false),
        RawValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Cell for a column that mirrors the row key when the row has no such field.
fn key_cell(key: &RowKey, kind: ColumnKind) -> CellValue {
    match kind {
        ColumnKind::EntityName => CellValue::Text(key.entity.as_str().to_string()),
        ColumnKind::Time => CellValue::Number(key.time as f64),
        _ => CellValue::Missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slug(s: &str) -> ColumnSlug {
        ColumnSlug::new(s).unwrap()
    }

    #[test]
    fn test_coerces_by_kind() {
        assert_eq!(
            coerce(&RawValue::from("12.5"), ColumnKind::Numeric),
            Some(CellValue::Number(12.5))
        );
        assert_eq!(coerce(&RawValue::from("abc"), ColumnKind::Numeric), None);
        assert_eq!(
            coerce(&RawValue::from(""), ColumnKind::Numeric),
            Some(CellValue::Missing)
        );
        assert_eq!(
            coerce(&RawValue::from("Yes"), ColumnKind::Boolean),
            Some(CellValue::Boolean(true))
        );
        assert_eq!(
            coerce(&RawValue::from(3.0), ColumnKind::Categorical),
            Some(CellValue::Text("3".to_string()))
        );
    }

    #[test]
    fn test_infers_kinds() {
        let numbers = [RawValue::from(1.0), RawValue::from("2"), RawValue::Null];
        assert_eq!(infer_column_kind(&numbers), ColumnKind::Numeric);
        let flags = [RawValue::from(true), RawValue::from("no")];
        assert_eq!(infer_column_kind(&flags), ColumnKind::Boolean);
        let mixed = [RawValue::from(1.0), RawValue::from("Europe")];
        assert_eq!(infer_column_kind(&mixed), ColumnKind::Categorical);
        assert_eq!(
            infer_column_kind(std::iter::empty()),
            ColumnKind::Categorical
        );
    }

    #[test]
    fn test_rejects_rows_without_key() {
        let rows = vec![
            RawRow {
                entity_name: None,
                time: Some(RawValue::from(2000.0)),
                ..RawRow::default()
            },
            RawRow {
                entity_name: Some("A".to_string()),
                time: None,
                ..RawRow::default()
            },
            RawRow::new("A", "later"),
            RawRow::new("A", 2000.0).with("gdp", 1.0),
        ];
        let (table, report) = Table::from_raw_rows(&rows, vec![ColumnDef::numeric(slug("gdp"))]);
        assert_eq!(table.row_count(), 1);
        assert_eq!(report.rejected_count(), 3);
        assert_eq!(report.rejected[0].reason, RejectReason::MissingEntity);
        assert_eq!(report.rejected[1].reason, RejectReason::MissingTime);
        assert_eq!(
            report.rejected[2].reason,
            RejectReason::InvalidTime("later".to_string())
        );
    }

    #[test]
    fn test_duplicate_keys_merge_fields() {
        let rows = vec![
            RawRow::new("A", 2000.0).with("gdp", 1.0).with("pop", 10.0),
            RawRow::new("B", 2000.0).with("gdp", 5.0),
            RawRow::new("A", 2000.0).with("gdp", 2.0),
        ];
        let defs = vec![
            ColumnDef::numeric(slug("gdp")),
            ColumnDef::numeric(slug("pop")),
        ];
        let (table, report) = Table::from_raw_rows(&rows, defs);
        assert_eq!(table.row_count(), 2);
        assert_eq!(report.duplicate_count(), 1);
        assert_eq!(table.entity_name(0).as_str(), "A");
        assert_eq!(
            table.value_at("gdp", "A", 2000).unwrap(),
            CellValue::Number(2.0)
        );
        assert_eq!(
            table.value_at("pop", "A", 2000).unwrap(),
            CellValue::Number(10.0)
        );
    }

    #[test]
    fn test_blank_duplicate_keeps_earlier_value() {
        let rows = vec![
            RawRow::new("A", 2000.0).with("gdp", 1.0).with("pop", RawValue::Null),
            RawRow::new("A", 2000.0)
                .with("gdp", RawValue::Null)
                .with("pop", "")
                .with("area", 3.0),
        ];
        let defs = vec![
            ColumnDef::numeric(slug("gdp")),
            ColumnDef::numeric(slug("pop")),
            ColumnDef::numeric(slug("area")),
        ];
        let (table, report) = Table::from_raw_rows(&rows, defs);
        assert_eq!(report.duplicate_count(), 1);
        assert!(report.invalid_cells.is_empty());
        assert_eq!(table.value_at("gdp", "A", 2000).unwrap(), CellValue::Number(1.0));
        assert_eq!(table.value_at("pop", "A", 2000).unwrap(), CellValue::Missing);
        assert_eq!(table.value_at("area", "A", 2000).unwrap(), CellValue::Number(3.0));
    }

    #[test]
    fn test_day_axis_accepts_dates() {
        let rows = vec![
            RawRow::new("A", "2020-01-22").with("cases", 3.0),
            RawRow::new("A", 5.0).with("cases", 4.0),
        ];
        let (table, report) = TableBuilder::new(vec![ColumnDef::numeric(slug("cases"))])
            .with_time_unit(TimeUnit::Day)
            .build(&rows);
        assert!(report.is_clean());
        assert_eq!(table.times(), vec![1, 5]);
    }

    #[test]
    fn test_time_and_entity_columns_default_to_row_key() {
        let rows = vec![RawRow::new("A", 2001.0)];
        let defs = vec![
            ColumnDef::new(slug("year"), ColumnKind::Time),
            ColumnDef::new(slug("country"), ColumnKind::EntityName),
        ];
        let (table, _) = Table::from_raw_rows(&rows, defs);
        assert_eq!(
            table.value_at("year", "A", 2001).unwrap(),
            CellValue::Number(2001.0)
        );
        assert_eq!(
            table.value_at("country", "A", 2001).unwrap(),
            CellValue::Text("A".to_string())
        );
    }
}
