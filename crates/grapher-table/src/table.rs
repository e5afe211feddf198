//! The persistent table.
//!
//! A [`Table`] is a cheap, immutable view: an `Arc` to the shared column
//! store plus the list of selected physical rows, the entity index for those
//! rows, the visible column slugs and the view's own derived-column cache.
//! Filtering produces a new view; nothing is ever mutated in place.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use grapher_model::{CellValue, ColumnDef, ColumnSlug, EntityName, RowKey, Time, TimeUnit};

use crate::cache::{CacheEntryInfo, TransformCache};
use crate::column::{Column, ColumnView};
use crate::error::{Result, TransformError};
use crate::row::{EntityIndex, RowSetId};

/// Physical storage shared by every view derived from one ingestion.
#[derive(Debug)]
pub(crate) struct ColumnStore {
    pub(crate) entities: Vec<EntityName>,
    pub(crate) times: Vec<Time>,
    pub(crate) columns: Vec<Arc<Column>>,
    pub(crate) by_slug: HashMap<ColumnSlug, usize>,
    pub(crate) time_unit: TimeUnit,
}

impl ColumnStore {
    pub(crate) fn new(
        entities: Vec<EntityName>,
        times: Vec<Time>,
        columns: Vec<Column>,
        time_unit: TimeUnit,
    ) -> Self {
        let by_slug = columns
            .iter()
            .enumerate()
            .map(|(idx, column)| (column.slug().clone(), idx))
            .collect();
        Self {
            entities,
            times,
            columns: columns.into_iter().map(Arc::new).collect(),
            by_slug,
            time_unit,
        }
    }

    fn column(&self, slug: &str) -> Option<&Arc<Column>> {
        self.by_slug.get(slug).and_then(|&idx| self.columns.get(idx))
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    pub(crate) store: Arc<ColumnStore>,
    pub(crate) rows: Arc<[usize]>,
    pub(crate) index: Arc<EntityIndex>,
    pub(crate) visible: Arc<[ColumnSlug]>,
    pub(crate) row_set: RowSetId,
    pub(crate) cache: Arc<TransformCache>,
}

impl Table {
    pub(crate) fn from_store(store: ColumnStore) -> Self {
        let rows: Vec<usize> = (0..store.entities.len()).collect();
        let visible: Vec<ColumnSlug> = store
            .columns
            .iter()
            .map(|column| column.slug().clone())
            .collect();
        Self::view(Arc::new(store), rows, visible.into())
    }

    fn view(store: Arc<ColumnStore>, rows: Vec<usize>, visible: Arc<[ColumnSlug]>) -> Self {
        let index = EntityIndex::build(&rows, &store.entities, &store.times);
        let row_set = RowSetId::fingerprint(&rows, &store.entities, &store.times);
        Self {
            store,
            rows: rows.into(),
            index: Arc::new(index),
            visible,
            row_set,
            cache: Arc::new(TransformCache::default()),
        }
    }

    /// A new view over the given physical rows, with a fresh derived-column cache.
    pub(crate) fn with_rows(&self, rows: Vec<usize>) -> Self {
        Self::view(Arc::clone(&self.store), rows, Arc::clone(&self.visible))
    }

    /// A new view over the same rows showing only `visible` columns.
    ///
    /// The row set is unchanged, so the cache is shared with this view.
    pub(crate) fn with_visible(&self, visible: Vec<ColumnSlug>) -> Self {
        Self {
            visible: visible.into(),
            ..self.clone()
        }
    }

    /// An empty table with no rows or columns.
    pub fn empty(time_unit: TimeUnit) -> Self {
        Self::from_store(ColumnStore::new(Vec::new(), Vec::new(), Vec::new(), time_unit))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn time_unit(&self) -> TimeUnit {
        self.store.time_unit
    }

    /// Identity of this view's row set.
    pub fn row_set_id(&self) -> RowSetId {
        self.row_set
    }

    pub fn entity_index(&self) -> &EntityIndex {
        &self.index
    }

    pub(crate) fn physical(&self, row: usize) -> usize {
        self.rows[row]
    }

    pub fn entity_name(&self, row: usize) -> &EntityName {
        &self.store.entities[self.rows[row]]
    }

    pub fn time(&self, row: usize) -> Time {
        self.store.times[self.rows[row]]
    }

    pub fn row_key(&self, row: usize) -> RowKey {
        RowKey::new(self.entity_name(row).clone(), self.time(row))
    }

    /// Visible column slugs in definition order.
    pub fn column_slugs(&self) -> &[ColumnSlug] {
        &self.visible
    }

    pub fn has_column(&self, slug: &str) -> bool {
        self.visible.iter().any(|visible| visible.as_str() == slug)
    }

    pub fn column_def(&self, slug: &str) -> Option<&ColumnDef> {
        if !self.has_column(slug) {
            return None;
        }
        self.store.column(slug).map(|column| column.def())
    }

    pub(crate) fn raw_column(&self, slug: &str) -> Result<&Arc<Column>> {
        if !self.has_column(slug) {
            return Err(TransformError::UnknownColumn(slug.to_string()));
        }
        self.store
            .column(slug)
            .ok_or_else(|| TransformError::UnknownColumn(slug.to_string()))
    }

    /// Look up a column by slug.
    ///
    /// Raw columns come straight from the shared store. Derived columns are
    /// found by the slug they were given when first computed on this view
    /// (see [`Table::derive`]).
    pub fn get(&self, slug: &str) -> Result<Arc<Column>> {
        if let Ok(column) = self.raw_column(slug) {
            return Ok(Arc::clone(column));
        }
        self.cache
            .get_by_slug(slug)
            .ok_or_else(|| TransformError::UnknownColumn(slug.to_string()))
    }

    /// The column read in this view's row order.
    pub fn column_view(&self, slug: &str) -> Result<ColumnView> {
        Ok(self.view_of(self.get(slug)?))
    }

    pub(crate) fn view_of(&self, column: Arc<Column>) -> ColumnView {
        ColumnView::new(column, Arc::clone(&self.rows))
    }

    /// Smallest present numeric value over the selected rows.
    pub fn min(&self, slug: &str) -> Result<Option<f64>> {
        Ok(self
            .column_view(slug)?
            .iter()
            .filter_map(CellValue::as_f64)
            .reduce(f64::min))
    }

    /// Largest present numeric value over the selected rows.
    pub fn max(&self, slug: &str) -> Result<Option<f64>> {
        Ok(self
            .column_view(slug)?
            .iter()
            .filter_map(CellValue::as_f64)
            .reduce(f64::max))
    }

    /// Number of present values of a column over the selected rows.
    pub fn num_values(&self, slug: &str) -> Result<usize> {
        Ok(self.column_view(slug)?.present_count())
    }

    /// First and last time over the selected rows.
    pub fn time_domain(&self) -> Option<(Time, Time)> {
        let mut times = self.rows.iter().map(|&physical| self.store.times[physical]);
        let first = times.next()?;
        Some(times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }

    /// Distinct times of the selected rows, ascending.
    pub fn times(&self) -> Vec<Time> {
        let set: BTreeSet<Time> = self
            .rows
            .iter()
            .map(|&physical| self.store.times[physical])
            .collect();
        set.into_iter().collect()
    }

    /// Entities of the selected rows, sorted by name.
    pub fn entity_names(&self) -> Vec<EntityName> {
        self.index.iter().map(|(entity, _)| entity.clone()).collect()
    }

    /// View row holding `(entity, time)`, if selected.
    pub fn find_row(&self, entity: &str, time: Time) -> Option<usize> {
        let rows = self.index.rows_for(entity);
        rows.binary_search_by_key(&time, |&row| self.time(row))
            .ok()
            .map(|pos| rows[pos])
    }

    /// The cell of `slug` at `(entity, time)`; Missing when the row is not selected.
    pub fn value_at(&self, slug: &str, entity: &str, time: Time) -> Result<CellValue> {
        let column = self.get(slug)?;
        Ok(self
            .find_row(entity, time)
            .map(|row| column.value_at(self.physical(row)).clone())
            .unwrap_or(CellValue::Missing))
    }

    /// Read-only listing of this view's derived-column cache.
    pub fn cache_entries(&self) -> Vec<CacheEntryInfo> {
        self.cache.entries()
    }
}
