//! Selection operators.
//!
//! Every operator returns a new [`Table`] over the same shared column
//! arrays. Row filters build a fresh entity index, row-set id and cache for
//! the new view; the parent view is left untouched.

use std::collections::HashSet;

use grapher_model::{CellValue, ColumnSlug, Time};
use tracing::debug;

use crate::error::Result;
use crate::table::Table;

impl Table {
    /// Keep rows whose view index satisfies `predicate`, in the current order.
    pub fn filter_rows(&self, mut predicate: impl FnMut(usize) -> bool) -> Table {
        let rows: Vec<usize> = (0..self.row_count())
            .filter(|&row| predicate(row))
            .map(|row| self.physical(row))
            .collect();
        debug!(
            from = self.row_count(),
            to = rows.len(),
            "filtered table rows"
        );
        self.with_rows(rows)
    }

    pub fn filter_by_entity_names<S: AsRef<str>>(&self, names: &[S]) -> Table {
        let wanted: HashSet<&str> = names.iter().map(|name| name.as_ref()).collect();
        self.filter_rows(|row| wanted.contains(self.entity_name(row).as_str()))
    }

    /// Keep rows with `start <= time <= end`.
    pub fn filter_by_time_range(&self, start: Time, end: Time) -> Table {
        self.filter_rows(|row| (start..=end).contains(&self.time(row)))
    }

    /// Keep rows where `slug` equals `value`.
    pub fn filter_by_column_value(&self, slug: &str, value: &CellValue) -> Result<Table> {
        let view = self.column_view(slug)?;
        Ok(self.filter_rows(|row| view.get(row) == value))
    }

    /// Keep rows where every listed column is present.
    pub fn drop_rows_with_missing<S: AsRef<str>>(&self, slugs: &[S]) -> Result<Table> {
        let views = slugs
            .iter()
            .map(|slug| self.column_view(slug.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.filter_rows(|row| views.iter().all(|view| view.get(row).is_present())))
    }

    /// A view exposing only the listed columns, in the given order.
    ///
    /// Rows are unchanged, so the view keeps this table's row set and cache.
    pub fn select_columns<S: AsRef<str>>(&self, slugs: &[S]) -> Result<Table> {
        let mut visible: Vec<ColumnSlug> = Vec::with_capacity(slugs.len());
        for slug in slugs {
            let column = self.raw_column(slug.as_ref())?;
            if !visible.contains(column.slug()) {
                visible.push(column.slug().clone());
            }
        }
        Ok(self.with_visible(visible))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use grapher_model::{ColumnDef, ColumnKind, RawRow, TransformKind};

    use super::*;

    fn sample() -> Table {
        let rows = vec![
            RawRow::new("France", 2000.0)
                .with("gdp", 1.0)
                .with("region", "Europe"),
            RawRow::new("France", 2001.0).with("gdp", 2.0),
            RawRow::new("Chad", 2000.0)
                .with("gdp", 3.0)
                .with("region", "Africa"),
            RawRow::new("Chad", 2001.0)
                .with("region", "Africa"),
        ];
        let defs = vec![
            ColumnDef::numeric(ColumnSlug::new("gdp").unwrap()),
            ColumnDef::new(ColumnSlug::new("region").unwrap(), ColumnKind::Categorical),
        ];
        Table::from_raw_rows(&rows, defs).0
    }

    #[test]
    fn test_filters_share_column_arrays() {
        let table = sample();
        let france = table.filter_by_entity_names(&["France"]);
        assert_eq!(france.row_count(), 2);
        assert_eq!(france.entity_names().len(), 1);
        let base = table.get("gdp").unwrap();
        let filtered = france.get("gdp").unwrap();
        assert!(Arc::ptr_eq(&base, &filtered));
        assert_eq!(table.row_count(), 4);
        assert_ne!(table.row_set_id(), france.row_set_id());
    }

    #[test]
    fn test_time_range_is_inclusive() {
        let table = sample();
        assert_eq!(table.filter_by_time_range(2001, 2001).row_count(), 2);
        assert_eq!(table.filter_by_time_range(2002, 2010).row_count(), 0);
        assert_eq!(
            table.filter_by_time_range(2000, 2001).time_domain(),
            Some((2000, 2001))
        );
    }

    #[test]
    fn test_drops_rows_with_missing_values() {
        let table = sample();
        let complete = table.drop_rows_with_missing(&["gdp", "region"]).unwrap();
        assert_eq!(complete.row_count(), 2);
        assert!(table.drop_rows_with_missing(&["nope"]).is_err());
    }

    #[test]
    fn test_filters_by_category() {
        let table = sample();
        let africa = table
            .filter_by_column_value("region", &CellValue::Text("Africa".to_string()))
            .unwrap();
        assert_eq!(africa.entity_names()[0].as_str(), "Chad");
        assert_eq!(africa.row_count(), 2);
    }

    #[test]
    fn test_select_columns_keeps_cache() {
        let table = sample();
        table.derive("gdp", &TransformKind::LogSafe).unwrap();
        let narrow = table.select_columns(&["gdp"]).unwrap();
        assert_eq!(narrow.column_slugs().len(), 1);
        assert!(!narrow.has_column("region"));
        assert_eq!(narrow.cache_entries().len(), 1);
        assert!(narrow.get("region").is_err());
    }

    #[test]
    fn test_filtered_views_have_independent_caches() {
        let table = sample();
        let france = table.filter_by_entity_names(&["France"]);
        let chad = table.filter_by_entity_names(&["Chad"]);
        let kind = TransformKind::interpolate(1.0);
        let a = france.derive("gdp", &kind).unwrap();
        let b = chad.derive("gdp", &kind).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(france.cache_entries().len(), 1);
        assert_eq!(chad.cache_entries().len(), 1);
        assert!(table.cache_entries().is_empty());
        assert_eq!(
            france.value_at("gdp-interpolated-1", "France", 2001).unwrap(),
            CellValue::Number(2.0)
        );
        assert_eq!(
            france.value_at("gdp-interpolated-1", "Chad", 2000).unwrap(),
            CellValue::Missing
        );
    }
}
