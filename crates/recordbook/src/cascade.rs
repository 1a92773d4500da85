//! Owned child rows and cascading removal.
//!
//! A [`ChildTable`] keeps rows grouped under their owner's key, each group in
//! insertion order, so listing the children of one owner never scans the
//! others. [`cascade`] removes every row owned by a set of owners from any
//! number of tables.

use std::hash::Hash;

use indexmap::IndexMap;

/// Rows of type `V` keyed by `K`, grouped under owner `P`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildTable<P, K, V>
where
    P: Hash + Eq,
    K: Hash + Eq,
{
    groups: IndexMap<P, IndexMap<K, V>>,
}

impl<P, K, V> Default for ChildTable<P, K, V>
where
    P: Hash + Eq,
    K: Hash + Eq,
{
    fn default() -> Self {
        Self {
            groups: IndexMap::new(),
        }
    }
}

impl<P, K, V> ChildTable<P, K, V>
where
    P: Hash + Eq + Copy,
    K: Hash + Eq + Copy,
{
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row, returning the row it replaced, if any.
    pub fn insert(&mut self, owner: P, key: K, row: V) -> Option<V> {
        self.groups.entry(owner).or_default().insert(key, row)
    }

    /// Look up one row.
    #[must_use]
    pub fn get(&self, owner: P, key: K) -> Option<&V> {
        self.groups.get(&owner).and_then(|rows| rows.get(&key))
    }

    /// Look up one row mutably.
    pub fn get_mut(&mut self, owner: P, key: K) -> Option<&mut V> {
        self.groups.get_mut(&owner).and_then(|rows| rows.get_mut(&key))
    }

    /// Whether `owner` has a row under `key`.
    #[must_use]
    pub fn contains(&self, owner: P, key: K) -> bool {
        self.get(owner, key).is_some()
    }

    /// Remove one row, keeping the order of its siblings.
    pub fn remove(&mut self, owner: P, key: K) -> Option<V> {
        let rows = self.groups.get_mut(&owner)?;
        let removed = rows.shift_remove(&key);
        if rows.is_empty() {
            self.groups.shift_remove(&owner);
        }
        removed
    }

    /// Rows owned by `owner` in insertion order.
    pub fn children(&self, owner: P) -> impl Iterator<Item = &V> + '_ {
        self.groups
            .get(&owner)
            .into_iter()
            .flat_map(IndexMap::values)
    }

    /// Keys of the rows owned by `owner`.
    pub fn keys(&self, owner: P) -> impl Iterator<Item = K> + '_ {
        self.groups
            .get(&owner)
            .into_iter()
            .flat_map(|rows| rows.keys().copied())
    }

    /// Number of rows owned by `owner`.
    #[must_use]
    pub fn count(&self, owner: P) -> usize {
        self.groups.get(&owner).map_or(0, IndexMap::len)
    }

    /// Remove and return every row owned by `owner`.
    pub fn detach(&mut self, owner: P) -> Vec<V> {
        self.groups
            .shift_remove(&owner)
            .map(|rows| rows.into_values().collect())
            .unwrap_or_default()
    }

    /// Every row, grouped by owner in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &V> + '_ {
        self.groups.values().flat_map(IndexMap::values)
    }

    /// Total number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.values().map(IndexMap::len).sum()
    }

    /// Whether the table holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// A collection whose rows reference an owner of type `P`.
pub trait Dependents<P> {
    /// Remove every row owned by `owner`, returning how many were removed.
    fn release(&mut self, owner: P) -> usize;
}

impl<P, K, V> Dependents<P> for ChildTable<P, K, V>
where
    P: Hash + Eq + Copy,
    K: Hash + Eq + Copy,
{
    fn release(&mut self, owner: P) -> usize {
        self.detach(owner).len()
    }
}

/// Remove every row owned by any of `owners` from each of `dependents`.
///
/// Returns the number of rows removed from each dependent, in the order the
/// dependents were given. Nothing here can fail, so the caller observes either
/// the state before the call or the state after all removals.
pub fn cascade<P: Copy>(owners: &[P], dependents: &mut [&mut dyn Dependents<P>]) -> Vec<usize> {
    dependents
        .iter_mut()
        .map(|table| owners.iter().map(|owner| table.release(*owner)).sum())
        .collect()
}
