//! Monotonic id and sequence-number allocation.
//!
//! Every identifier in the catalogs comes from here: file ids, field ids
//! (catalog-global), and the per-parent sequence numbers of valid data,
//! data structures, key files, and notes.
//!
//! [`next_id`] is the bare `max + 1` rule. [`SequenceScope`] wraps it with a
//! high-water mark so an id is never handed out twice within a scope, even
//! when the row that held the current maximum has since been deleted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Return `max(existing) + 1`, or `1` for an empty set.
///
/// Saturates at `u32::MAX`; use [`SequenceScope::allocate`] when exhaustion
/// has to be reported.
#[must_use]
pub fn next_id<I>(existing: I) -> u32
where
    I: IntoIterator<Item = u32>,
{
    existing
        .into_iter()
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

/// Allocation state for one id scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceScope {
    high_water: u32,
}

impl SequenceScope {
    /// Create a scope that has never allocated an id.
    #[must_use]
    pub const fn new() -> Self {
        Self { high_water: 0 }
    }

    /// Create a scope that resumes after `high_water`.
    #[must_use]
    pub const fn resume(high_water: u32) -> Self {
        Self { high_water }
    }

    /// The largest id this scope has handed out or observed.
    #[must_use]
    pub const fn high_water(&self) -> u32 {
        self.high_water
    }

    /// Allocate the next id given the ids currently live in the scope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] once the scope has used `u32::MAX`.
    pub fn allocate<I>(&mut self, existing: I) -> Result<u32>
    where
        I: IntoIterator<Item = u32>,
    {
        let next = self.peek(existing)?;
        self.high_water = next;
        Ok(next)
    }

    /// The id [`allocate`](Self::allocate) would return, without consuming it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] once the scope has used `u32::MAX`.
    pub fn peek<I>(&self, existing: I) -> Result<u32>
    where
        I: IntoIterator<Item = u32>,
    {
        let live_max = existing.into_iter().max().unwrap_or(0);
        live_max
            .max(self.high_water)
            .checked_add(1)
            .ok_or_else(|| Error::conflict("id sequence exhausted"))
    }

    /// Record an id that entered the scope without being allocated here.
    pub fn observe(&mut self, id: u32) {
        self.high_water = self.high_water.max(id);
    }
}

/// One [`SequenceScope`] per parent key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopedSequences<P: Ord> {
    scopes: BTreeMap<P, SequenceScope>,
}

impl<P: Ord> Default for ScopedSequences<P> {
    fn default() -> Self {
        Self {
            scopes: BTreeMap::new(),
        }
    }
}

impl<P: Ord + Copy> ScopedSequences<P> {
    /// Allocate the next sequence number under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if the parent's scope is exhausted.
    pub fn allocate<I>(&mut self, parent: P, existing: I) -> Result<u32>
    where
        I: IntoIterator<Item = u32>,
    {
        self.scopes.entry(parent).or_default().allocate(existing)
    }

    /// The number [`allocate`](Self::allocate) would return under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if the parent's scope is exhausted.
    pub fn peek<I>(&self, parent: P, existing: I) -> Result<u32>
    where
        I: IntoIterator<Item = u32>,
    {
        self.scopes
            .get(&parent)
            .copied()
            .unwrap_or_default()
            .peek(existing)
    }

    /// Record a sequence number that entered `parent`'s scope from outside.
    pub fn observe(&mut self, parent: P, id: u32) {
        self.scopes.entry(parent).or_default().observe(id);
    }

    /// The high-water mark for `parent`, `0` if nothing was allocated.
    #[must_use]
    pub fn high_water(&self, parent: P) -> u32 {
        self.scopes.get(&parent).map_or(0, SequenceScope::high_water)
    }

    /// Iterate over every scope and its high-water mark in parent order.
    pub fn iter(&self) -> impl Iterator<Item = (P, u32)> + '_ {
        self.scopes
            .iter()
            .map(|(parent, scope)| (*parent, scope.high_water()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_next_id_empty() {
        assert_eq!(next_id(std::iter::empty()), 1);
    }

    #[test]
    fn test_next_id_uses_max_not_len() {
        assert_eq!(next_id([1, 2, 3]), 4);
        assert_eq!(next_id([7, 2]), 8);
    }

    #[test]
    fn test_next_id_saturates() {
        assert_eq!(next_id([u32::MAX]), u32::MAX);
    }

    #[test]
    fn test_scope_skips_deleted_middle_id() {
        let mut scope = SequenceScope::new();
        for _ in 0..3 {
            let live: Vec<u32> = (1..=scope.high_water()).collect();
            scope.allocate(live).unwrap();
        }
        // {1, 2, 3} with 2 deleted
        assert_eq!(scope.allocate([1, 3]).unwrap(), 4);
    }

    #[test]
    fn test_scope_never_reuses_deleted_max() {
        let mut scope = SequenceScope::new();
        assert_eq!(scope.allocate([]).unwrap(), 1);
        assert_eq!(scope.allocate([1]).unwrap(), 2);
        // id 2 deleted; the bare rule would hand it out again
        assert_eq!(next_id([1]), 2);
        assert_eq!(scope.allocate([1]).unwrap(), 3);
    }

    #[test]
    fn test_scope_respects_live_ids_above_high_water() {
        let mut scope = SequenceScope::resume(2);
        assert_eq!(scope.allocate([10]).unwrap(), 11);
        assert_eq!(scope.high_water(), 11);
    }

    #[test]
    fn test_scope_exhaustion_is_conflict() {
        let mut scope = SequenceScope::resume(u32::MAX);
        let err = scope.allocate([]).unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut scope = SequenceScope::new();
        assert_eq!(scope.peek([]).unwrap(), 1);
        assert_eq!(scope.peek([]).unwrap(), 1);
        assert_eq!(scope.allocate([]).unwrap(), 1);
        assert_eq!(scope.peek([]).unwrap(), 2);

        let seqs = ScopedSequences::<u32>::default();
        assert_eq!(seqs.peek(4, [2]).unwrap(), 3);
        assert_eq!(seqs.high_water(4), 0);
    }

    #[test]
    fn test_observe_only_raises() {
        let mut scope = SequenceScope::resume(5);
        scope.observe(3);
        assert_eq!(scope.high_water(), 5);
        scope.observe(9);
        assert_eq!(scope.high_water(), 9);
    }

    #[test]
    fn test_scoped_sequences_are_independent() {
        let mut seqs = ScopedSequences::<u32>::default();
        assert_eq!(seqs.allocate(1, []).unwrap(), 1);
        assert_eq!(seqs.allocate(1, [1]).unwrap(), 2);
        assert_eq!(seqs.allocate(2, []).unwrap(), 1);
        assert_eq!(seqs.high_water(1), 2);
        assert_eq!(seqs.high_water(2), 1);
        assert_eq!(seqs.high_water(3), 0);
        assert_eq!(seqs.iter().collect::<Vec<_>>(), vec![(1, 2), (2, 1)]);
    }

    #[test]
    fn test_scope_serializes_as_number() {
        let json = serde_json::to_string(&SequenceScope::resume(7)).unwrap();
        assert_eq!(json, "7");
    }

    proptest! {
        #[test]
        fn allocation_strictly_increases(deletes in prop::collection::vec(any::<bool>(), 1..40)) {
            let mut scope = SequenceScope::new();
            let mut live: Vec<u32> = Vec::new();
            let mut last = 0;
            for delete in deletes {
                if delete && !live.is_empty() {
                    live.pop();
                }
                let id = scope.allocate(live.iter().copied()).unwrap();
                prop_assert!(id > last);
                prop_assert!(!live.contains(&id));
                last = id;
                live.push(id);
            }
        }
    }
}
