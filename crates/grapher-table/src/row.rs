#![deny(unsafe_code)]

//! Row index model: per-entity row lists and row-set identity.

use std::collections::BTreeMap;
use std::fmt;

use grapher_model::{EntityName, Time};
use sha2::{Digest, Sha256};

/// A deterministic identifier of the ordered row set of one table view.
///
/// Two views share an id only if they select the same physical rows with the
/// same `(entity, time)` keys in the same order. Derived-column cache keys
/// include it, so caches never mix results computed over different rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowSetId([u8; 16]);

impl RowSetId {
    pub fn from_first_16_bytes_of_sha256(digest: &[u8]) -> Self {
        let mut out = [0u8; 16];
        out.copy_from_slice(&digest[..16]);
        Self(out)
    }

    pub(crate) fn fingerprint(rows: &[usize], entities: &[EntityName], times: &[Time]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((rows.len() as u64).to_le_bytes());
        for &physical in rows {
            hasher.update((physical as u64).to_le_bytes());
            if let Some(entity) = entities.get(physical) {
                hasher.update(entity.as_str().as_bytes());
            }
            hasher.update([0u8]);
            if let Some(time) = times.get(physical) {
                hasher.update(time.to_le_bytes());
            }
        }
        Self::from_first_16_bytes_of_sha256(&hasher.finalize())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for RowSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Maps each entity to its view rows, sorted by time ascending.
///
/// Built once per view and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct EntityIndex {
    rows: BTreeMap<EntityName, Vec<usize>>,
    /// Entities in order of first appearance in the view.
    order: Vec<EntityName>,
}

impl EntityIndex {
    /// Build the index for view rows `0..rows.len()`, where `rows[i]` is the
    /// physical position of view row `i`.
    pub(crate) fn build(rows: &[usize], entities: &[EntityName], times: &[Time]) -> Self {
        let mut index: BTreeMap<EntityName, Vec<usize>> = BTreeMap::new();
        let mut order = Vec::new();
        for (row, &physical) in rows.iter().enumerate() {
            let entity = &entities[physical];
            match index.get_mut(entity) {
                Some(list) => list.push(row),
                None => {
                    order.push(entity.clone());
                    index.insert(entity.clone(), vec![row]);
                }
            }
        }
        for list in index.values_mut() {
            list.sort_by_key(|&row| times[rows[row]]);
        }
        Self { rows: index, order }
    }

    /// View rows of `entity`, sorted by time. Empty when the entity is absent.
    pub fn rows_for(&self, entity: &str) -> &[usize] {
        self.rows.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.rows.contains_key(entity)
    }

    /// Entities in order of first appearance.
    pub fn entities(&self) -> &[EntityName] {
        &self.order
    }

    /// Iterate `(entity, rows)` pairs in entity-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityName, &[usize])> {
        self.rows.iter().map(|(entity, rows)| (entity, rows.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str) -> EntityName {
        EntityName::new(name).unwrap()
    }

    #[test]
    fn test_index_sorts_rows_by_time() {
        let entities = vec![entity("A"), entity("B"), entity("A"), entity("A")];
        let times = vec![2002, 2000, 2000, 2001];
        let rows: Vec<usize> = (0..4).collect();
        let index = EntityIndex::build(&rows, &entities, &times);
        assert_eq!(index.rows_for("A"), &[2, 3, 0]);
        assert_eq!(index.rows_for("B"), &[1]);
        assert!(index.rows_for("C").is_empty());
        assert_eq!(index.entities(), &[entity("A"), entity("B")]);
    }

    #[test]
    fn test_fingerprint_depends_on_row_selection() {
        let entities = vec![entity("A"), entity("B")];
        let times = vec![2000, 2000];
        let both = RowSetId::fingerprint(&[0, 1], &entities, &times);
        let first = RowSetId::fingerprint(&[0], &entities, &times);
        assert_ne!(both, first);
        assert_eq!(both, RowSetId::fingerprint(&[0, 1], &entities, &times));
        assert_eq!(both.to_hex().len(), 32);
    }
}
