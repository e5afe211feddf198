//! Per-view memoization of derived columns.
//!
//! Entries are only ever added. A key combines the row-set identity of the
//! view, the source column and the normalized transform parameters, so two
//! views over different rows can never read each other's results.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use grapher_model::{ColumnSlug, TransformKind};

use crate::column::Column;
use crate::row::RowSetId;
use crate::transform::TransformParams;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct TransformKey {
    pub(crate) row_set: RowSetId,
    pub(crate) source: ColumnSlug,
    pub(crate) params: TransformParams,
}

/// Read-only description of one cached derived column.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntryInfo {
    pub row_set: RowSetId,
    pub source: ColumnSlug,
    pub derived: ColumnSlug,
    pub transform: TransformKind,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<TransformKey, Arc<Column>>,
    by_slug: HashMap<ColumnSlug, TransformKey>,
    /// Insertion order, for stable listings.
    order: Vec<(TransformKey, TransformKind)>,
}

#[derive(Debug, Default)]
pub(crate) struct TransformCache {
    state: RwLock<CacheState>,
}

impl TransformCache {
    pub(crate) fn get(&self, key: &TransformKey) -> Option<Arc<Column>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.entries.get(key).cloned()
    }

    pub(crate) fn get_by_slug(&self, slug: &str) -> Option<Arc<Column>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let key = state.by_slug.get(slug)?;
        state.entries.get(key).cloned()
    }

    /// Store a computed column and return the cached instance.
    ///
    /// If another caller stored the same key first, that column is returned
    /// and `column` is discarded, so every caller sees one instance per key.
    pub(crate) fn insert(
        &self,
        key: TransformKey,
        kind: &TransformKind,
        column: Column,
    ) -> Arc<Column> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = state.entries.get(&key) {
            return Arc::clone(existing);
        }
        let column = Arc::new(column);
        state
            .by_slug
            .entry(column.slug().clone())
            .or_insert_with(|| key.clone());
        state.order.push((key.clone(), kind.clone()));
        state.entries.insert(key, Arc::clone(&column));
        column
    }

    pub(crate) fn entries(&self) -> Vec<CacheEntryInfo> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .order
            .iter()
            .filter_map(|(key, kind)| {
                let column = state.entries.get(key)?;
                Some(CacheEntryInfo {
                    row_set: key.row_set,
                    source: key.source.clone(),
                    derived: column.slug().clone(),
                    transform: kind.clone(),
                })
            })
            .collect()
    }
}
