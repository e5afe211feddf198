//! Immutable columns and row-ordered views over them.
//!
//! A [`Column`] owns its value array behind an `Arc`. Arrays are indexed by
//! *physical* row position in the table's shared store, so every view of the
//! store can read them without copying. A [`ColumnView`] pairs a column with
//! the row positions of one table view and reads values in that view's order.

use std::sync::Arc;

use grapher_model::{CellValue, ColumnDef, ColumnKind, ColumnSlug, ColumnSource};

#[derive(Debug, Clone)]
pub struct Column {
    def: ColumnDef,
    values: Arc<[CellValue]>,
    /// Per-row "value was interpolated" flags; absent for raw columns.
    interpolated: Option<Arc<[bool]>>,
    source: ColumnSource,
}

impl Column {
    pub(crate) fn raw(def: ColumnDef, values: Vec<CellValue>) -> Self {
        Self {
            def,
            values: values.into(),
            interpolated: None,
            source: ColumnSource::Raw,
        }
    }

    pub(crate) fn derived(
        def: ColumnDef,
        values: Vec<CellValue>,
        interpolated: Option<Vec<bool>>,
        source: ColumnSource,
    ) -> Self {
        Self {
            def,
            values: values.into(),
            interpolated: interpolated.map(Into::into),
            source,
        }
    }

    pub fn def(&self) -> &ColumnDef {
        &self.def
    }

    pub fn slug(&self) -> &ColumnSlug {
        &self.def.slug
    }

    pub fn kind(&self) -> ColumnKind {
        self.def.kind
    }

    pub fn source(&self) -> &ColumnSource {
        &self.source
    }

    /// Number of physical rows in the backing store.
    pub fn physical_len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn value_at(&self, physical: usize) -> &CellValue {
        self.values.get(physical).unwrap_or(&CellValue::Missing)
    }

    pub(crate) fn interpolated_at(&self, physical: usize) -> bool {
        self.interpolated
            .as_ref()
            .and_then(|flags| flags.get(physical).copied())
            .unwrap_or(false)
    }

    /// Returns true when both columns read the very same value array.
    pub fn shares_values_with(&self, other: &Column) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }
}

/// A column read through the row order of one table view.
#[derive(Debug, Clone)]
pub struct ColumnView {
    column: Arc<Column>,
    rows: Arc<[usize]>,
}

impl ColumnView {
    pub(crate) fn new(column: Arc<Column>, rows: Arc<[usize]>) -> Self {
        Self { column, rows }
    }

    pub fn column(&self) -> &Arc<Column> {
        &self.column
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of the view's `row`-th row.
    pub fn get(&self, row: usize) -> &CellValue {
        match self.rows.get(row) {
            Some(&physical) => self.column.value_at(physical),
            None => &CellValue::Missing,
        }
    }

    pub fn number(&self, row: usize) -> Option<f64> {
        self.get(row).as_f64()
    }

    pub fn is_interpolated(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .is_some_and(|&physical| self.column.interpolated_at(physical))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows
            .iter()
            .map(move |&physical| self.column.value_at(physical))
    }

    /// Numeric readings in view order; non-numeric and missing cells are `None`.
    pub fn numbers(&self) -> Vec<Option<f64>> {
        self.iter().map(CellValue::as_f64).collect()
    }

    /// Count of present cells in the view.
    pub fn present_count(&self) -> usize {
        self.iter().filter(|value| value.is_present()).count()
    }
}
