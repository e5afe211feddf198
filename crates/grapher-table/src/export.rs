//! Polars export of a table view.

use grapher_model::{CellValue, ColumnKind};
use polars::prelude::{Column as PolarsColumn, DataFrame, PolarsResult};

use crate::table::Table;

pub const ENTITY_COLUMN: &str = "entityName";
pub const TIME_COLUMN: &str = "time";

impl Table {
    /// Materialize the selected rows as a `DataFrame`.
    ///
    /// The frame has `entityName` and `time` followed by one column per
    /// visible slug. Numeric columns become `f64`, boolean columns `bool`,
    /// everything else strings; Missing cells become nulls.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns = Vec::with_capacity(self.column_slugs().len() + 2);
        let entities: Vec<&str> = (0..self.row_count())
            .map(|row| self.entity_name(row).as_str())
            .collect();
        let times: Vec<i64> = (0..self.row_count()).map(|row| self.time(row)).collect();
        columns.push(PolarsColumn::new(ENTITY_COLUMN.into(), entities));
        columns.push(PolarsColumn::new(TIME_COLUMN.into(), times));

        for slug in self.column_slugs() {
            let Ok(view) = self.column_view(slug.as_str()) else {
                continue;
            };
            let name = slug.as_str().into();
            let column = match view.column().kind() {
                kind if kind.is_numeric() => {
                    PolarsColumn::new(name, view.iter().map(CellValue::as_f64).collect::<Vec<_>>())
                }
                ColumnKind::Boolean => PolarsColumn::new(
                    name,
                    view.iter().map(CellValue::as_bool).collect::<Vec<_>>(),
                ),
                _ => PolarsColumn::new(
                    name,
                    view.iter()
                        .map(|cell| cell.as_str().map(str::to_string))
                        .collect::<Vec<_>>(),
                ),
            };
            columns.push(column);
        }
        DataFrame::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use grapher_model::{ColumnDef, ColumnSlug, RawRow};
    use polars::prelude::AnyValue;

    use super::*;

    #[test]
    fn test_exports_selected_rows_with_nulls() {
        let rows = vec![
            RawRow::new("France", 2000.0).with("gdp", 1.5).with("region", "Europe"),
            RawRow::new("Chad", 2000.0).with("region", "Africa"),
            RawRow::new("Chad", 2001.0).with("gdp", 2.0),
        ];
        let defs = vec![
            ColumnDef::numeric(ColumnSlug::new("gdp").unwrap()),
            ColumnDef::new(ColumnSlug::new("region").unwrap(), ColumnKind::Categorical),
        ];
        let (table, _) = Table::from_raw_rows(&rows, defs);
        let df = table.filter_by_entity_names(&["Chad"]).to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 4);
        let gdp = df.column("gdp").unwrap();
        assert_eq!(gdp.get(0).unwrap(), AnyValue::Null);
        assert_eq!(gdp.get(1).unwrap(), AnyValue::Float64(2.0));
        assert_eq!(
            df.column("region").unwrap().get(0).unwrap(),
            AnyValue::String("Africa")
        );
    }
}
