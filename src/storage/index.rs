//! Hash index: column value -> set of row ids.
//!
//! One index exists per PRIMARY KEY or UNIQUE column. The index must
//! always mirror the row store; every write path that changes an indexed
//! column updates the index in the same step.

use super::table::RowId;
use super::value::Value;
use std::collections::{BTreeSet, HashMap};

/// A hash-based mapping from column value to the row ids holding it.
///
/// Row-id sets are ordered so index-resolved lookups iterate in the same
/// ascending row-id order as a full scan.
#[derive(Debug, Clone, Default)]
pub struct HashIndex {
    entries: HashMap<Value, BTreeSet<RowId>>,
}

impl HashIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row id under a value. NULL is never indexed.
    pub fn add(&mut self, value: &Value, row_id: RowId) {
        if value.is_null() {
            return;
        }
        self.entries.entry(value.clone()).or_default().insert(row_id);
    }

    /// Remove a row id from a value's entry, pruning empty entries.
    pub fn remove(&mut self, value: &Value, row_id: RowId) {
        if let Some(ids) = self.entries.get_mut(value) {
            ids.remove(&row_id);
            if ids.is_empty() {
                self.entries.remove(value);
            }
        }
    }

    /// Row ids currently holding the value, in ascending order.
    pub fn lookup(&self, value: &Value) -> impl Iterator<Item = RowId> + '_ {
        self.entries.get(value).into_iter().flatten().copied()
    }

    /// True if any row other than `exclude` holds the value.
    pub fn is_held_by_other(&self, value: &Value, exclude: Option<RowId>) -> bool {
        self.lookup(value).any(|id| Some(id) != exclude)
    }

    /// Number of distinct indexed values
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no values are indexed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut index = HashIndex::new();
        index.add(&Value::Text("alice@x.com".into()), 1);
        index.add(&Value::Text("bob@x.com".into()), 2);

        let ids: Vec<RowId> = index.lookup(&Value::Text("alice@x.com".into())).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(index.lookup(&Value::Text("nobody".into())).count(), 0);
    }

    #[test]
    fn test_remove_prunes_empty_entries() {
        let mut index = HashIndex::new();
        index.add(&Value::Integer(7), 3);
        assert_eq!(index.len(), 1);

        index.remove(&Value::Integer(7), 3);
        assert!(index.is_empty());
    }

    #[test]
    fn test_null_is_never_indexed() {
        let mut index = HashIndex::new();
        index.add(&Value::Null, 1);
        assert!(index.is_empty());
    }

    #[test]
    fn test_is_held_by_other_excludes_self() {
        let mut index = HashIndex::new();
        index.add(&Value::Integer(42), 5);

        assert!(index.is_held_by_other(&Value::Integer(42), None));
        assert!(index.is_held_by_other(&Value::Integer(42), Some(6)));
        assert!(!index.is_held_by_other(&Value::Integer(42), Some(5)));
    }

    #[test]
    fn test_lookup_is_ascending() {
        let mut index = HashIndex::new();
        index.add(&Value::Integer(1), 9);
        index.add(&Value::Integer(1), 2);
        index.add(&Value::Integer(1), 5);

        let ids: Vec<RowId> = index.lookup(&Value::Integer(1)).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }
}
