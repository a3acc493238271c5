//! Sorted, duplicate-free array of ordered values.

use std::{
    collections::BTreeSet,
    ops::{Bound, RangeBounds},
};

use crate::transactional::{Changes, Staged, Transactional};

/// Immutable sorted array without duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedArray<T> {
    values: Vec<T>,
}

impl<T: Ord> SortedArray<T> {
    pub fn new() -> SortedArray<T> {
        SortedArray { values: Vec::new() }
    }

    /// Builds the array from values in any order; duplicates are dropped.
    pub fn from_values(values: impl IntoIterator<Item = T>) -> SortedArray<T> {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_unstable();
        values.dedup();
        SortedArray { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    pub fn contains(&self, value: &T) -> bool {
        self.values.binary_search(value).is_ok()
    }

    /// `Ok(index)` of `value`, or `Err(insertion_index)` if absent.
    pub fn binary_search(&self, value: &T) -> Result<usize, usize> {
        self.values.binary_search(value)
    }

    /// The contiguous slice of values within `range`.
    pub fn range(&self, range: impl RangeBounds<T>) -> &[T] {
        let start = match range.start_bound() {
            Bound::Included(v) => self.values.partition_point(|x| x < v),
            Bound::Excluded(v) => self.values.partition_point(|x| x <= v),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(v) => self.values.partition_point(|x| x <= v),
            Bound::Excluded(v) => self.values.partition_point(|x| x < v),
            Bound::Unbounded => self.values.len(),
        };
        if start >= end {
            &[]
        } else {
            &self.values[start..end]
        }
    }
}

impl<T: Ord> Default for SortedArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Net inserts and removals recorded against a [`SortedArray`], coalesced against
/// the base the transaction reads the same way as
/// [`BitmapChanges`](crate::BitmapChanges).
#[derive(Debug, Clone)]
pub struct SortedArrayChanges<T> {
    inserted: BTreeSet<T>,
    removed: BTreeSet<T>,
}

impl<T> Default for SortedArrayChanges<T> {
    fn default() -> Self {
        SortedArrayChanges {
            inserted: BTreeSet::new(),
            removed: BTreeSet::new(),
        }
    }
}

impl<T: Ord + Clone> SortedArrayChanges<T> {
    pub fn insert(&mut self, base: &SortedArray<T>, value: T) {
        if !self.removed.remove(&value) && !base.contains(&value) {
            self.inserted.insert(value);
        }
    }

    pub fn remove(&mut self, base: &SortedArray<T>, value: T) {
        if !self.inserted.remove(&value) && base.contains(&value) {
            self.removed.insert(value);
        }
    }

    fn affects(&self, base: &SortedArray<T>) -> bool {
        self.inserted.iter().any(|value| !base.contains(value))
            || self.removed.iter().any(|value| base.contains(value))
    }
}

impl<T> Staged<'_, SortedArray<T>>
where
    T: Ord + Clone + Send + Sync + 'static,
{
    pub fn insert(&mut self, value: T) {
        let (base, changes) = self.parts();
        changes.insert(base, value);
    }

    pub fn remove(&mut self, value: T) {
        let (base, changes) = self.parts();
        changes.remove(base, value);
    }
}

impl<T: Send + 'static> Changes for SortedArrayChanges<T> {
    fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.removed.is_empty()
    }
}

impl<T> Transactional for SortedArray<T>
where
    T: Ord + Clone + Send + Sync + 'static,
{
    type Changes = SortedArrayChanges<T>;

    fn apply(&self, changes: &SortedArrayChanges<T>) -> Option<SortedArray<T>> {
        if !changes.affects(self) {
            return None;
        }
        let mut kept = self
            .values
            .iter()
            .filter(|value| !changes.removed.contains(*value))
            .peekable();
        let mut inserted = changes.inserted.iter().peekable();
        let mut values = Vec::with_capacity(self.values.len() + changes.inserted.len());
        loop {
            let next = match (kept.peek(), inserted.peek()) {
                (Some(a), Some(b)) if a < b => kept.next(),
                (Some(a), Some(b)) if a > b => inserted.next(),
                (Some(_), Some(_)) => {
                    inserted.next();
                    kept.next()
                }
                (Some(_), None) => kept.next(),
                (None, Some(_)) => inserted.next(),
                (None, None) => break,
            };
            values.extend(next.cloned());
        }
        Some(SortedArray { values })
    }
}
