//! Polars `DataFrame` to raw rows.

use grapher_model::{RawRow, RawValue, format_number};
use polars::prelude::*;

use crate::error::Result;

/// Convert a Polars value into a raw cell, keeping numbers numeric.
pub fn any_to_raw(value: AnyValue<'_>) -> RawValue {
    match value {
        AnyValue::Null => RawValue::Null,
        AnyValue::Boolean(b) => RawValue::Boolean(b),
        AnyValue::Int8(v) => RawValue::Number(f64::from(v)),
        AnyValue::Int16(v) => RawValue::Number(f64::from(v)),
        AnyValue::Int32(v) => RawValue::Number(f64::from(v)),
        AnyValue::Int64(v) => RawValue::Number(v as f64),
        AnyValue::UInt8(v) => RawValue::Number(f64::from(v)),
        AnyValue::UInt16(v) => RawValue::Number(f64::from(v)),
        AnyValue::UInt32(v) => RawValue::Number(f64::from(v)),
        AnyValue::UInt64(v) => RawValue::Number(v as f64),
        AnyValue::Float32(v) => RawValue::Number(f64::from(v)),
        AnyValue::Float64(v) => RawValue::Number(v),
        AnyValue::String(s) => RawValue::Text(s.to_string()),
        AnyValue::StringOwned(s) => RawValue::Text(s.to_string()),
        other => RawValue::Text(other.to_string()),
    }
}

fn any_to_name(value: AnyValue<'_>) -> Option<String> {
    match any_to_raw(value) {
        RawValue::Text(s) => Some(s),
        RawValue::Number(v) => Some(format_number(v)),
        RawValue::Boolean(b) => Some(b.to_string()),
        RawValue::Null => None,
    }
}

/// Read every row of `df`, taking the entity and time from the named columns.
pub fn rows_from_dataframe(
    df: &DataFrame,
    entity_column: &str,
    time_column: &str,
) -> Result<Vec<RawRow>> {
    let entities = df.column(entity_column)?;
    let times = df.column(time_column)?;
    let fields: Vec<&Column> = df
        .get_columns()
        .iter()
        .filter(|col| col.name().as_str() != entity_column && col.name().as_str() != time_column)
        .collect();

    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let mut row = RawRow {
            entity_name: any_to_name(entities.get(idx)?),
            time: Some(any_to_raw(times.get(idx)?)),
            ..RawRow::default()
        };
        for col in &fields {
            row.values
                .insert(col.name().to_string(), any_to_raw(col.get(idx)?));
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Same as [`rows_from_dataframe`] with the default `entityName` / `time` names.
pub fn rows_from_default_dataframe(df: &DataFrame) -> Result<Vec<RawRow>> {
    rows_from_dataframe(df, grapher_table::ENTITY_COLUMN, grapher_table::TIME_COLUMN)
}

#[cfg(test)]
mod tests {
    use grapher_model::{CellValue, ColumnDef, ColumnSlug};
    use grapher_table::Table;

    use super::*;

    #[test]
    fn test_any_to_raw() {
        assert_eq!(any_to_raw(AnyValue::Int32(3)), RawValue::Number(3.0));
        assert_eq!(any_to_raw(AnyValue::Null), RawValue::Null);
        assert_eq!(any_to_raw(AnyValue::String("x")), RawValue::from("x"));
    }

    #[test]
    fn test_dataframe_round_trip_through_table() {
        let df = df! {
            "entityName" => ["France", "Chad"],
            "time" => [2000i64, 2000],
            "gdp" => [Some(1.5f64), None],
        }
        .unwrap();
        let rows = rows_from_default_dataframe(&df).unwrap();
        let (table, report) = Table::from_raw_rows(
            &rows,
            vec![ColumnDef::numeric(ColumnSlug::new("gdp").unwrap())],
        );
        assert!(report.is_clean());
        assert_eq!(
            table.value_at("gdp", "France", 2000).unwrap(),
            CellValue::Number(1.5)
        );
        let exported = table.to_dataframe().unwrap();
        assert_eq!(exported.height(), 2);
        assert_eq!(exported.get_column_names().len(), 3);
    }
}
