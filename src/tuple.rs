//! Diff-tracking persistent sequence.
//!
//! A [`Tuple`] is a [`TupleTree`] that additionally remembers *how* it
//! was derived from its previous state, as a [`SequenceDiff`]. Consumers
//! holding an older version can ask the newer one whether it is a direct
//! successor and, if so, apply the recorded change incrementally instead
//! of rebuilding their view from scratch.

use crate::diff::{SequenceChange, SequenceDiff};
use crate::tuple_tree::{TupleTree, TupleTreeIterator};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

// =============================================================================
// Contiguous-run detection
// =============================================================================

/// Watches the indices touched by a filtering pass and reports whether
/// they formed one contiguous run. A run has a usable start index; a
/// scattered selection does not, and the resulting diff carries no index.
struct RunTracker {
    start: i64,
    length: i64,
}

impl RunTracker {
    const UNSET: i64 = -2;
    const BROKEN: i64 = -1;

    fn new(size: usize) -> Self {
        Self {
            start: if size > 0 { Self::UNSET } else { Self::BROKEN },
            length: 0,
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    fn record(&mut self, index: usize) {
        let index = index as i64;
        if self.start != Self::BROKEN {
            if self.start == Self::UNSET {
                self.start = index;
            } else if index > self.start + self.length {
                self.start = Self::BROKEN;
            }
        }
        if self.start >= 0 {
            self.length += 1;
        }
    }

    #[allow(clippy::cast_sign_loss)]
    fn index(&self) -> Option<usize> {
        (self.start >= 0).then(|| self.start as usize)
    }
}

// =============================================================================
// Tuple Definition
// =============================================================================

/// A persistent sequence carrying the [`SequenceDiff`] of the operation
/// that produced it.
///
/// Every edit returns a new `Tuple` whose diff is the successor of the
/// receiver's, so a chain of edits forms a verifiable version history.
/// Equality and hashing consider only the elements; two tuples with the
/// same contents but different histories compare equal.
///
/// # Examples
///
/// ```rust
/// use thicket::{SequenceChange, Tuple};
///
/// let base: Tuple<i32> = (0..5).collect();
/// let edited = base.add_at(2, 99).unwrap();
///
/// let diff = edited.difference_from_previous();
/// assert_eq!(diff.change(), SequenceChange::Add);
/// assert_eq!(diff.index(), Some(2));
/// assert_eq!(diff.size(), 1);
/// assert!(diff.is_direct_successor_of(base.difference_from_previous()));
/// ```
pub struct Tuple<T> {
    tree: TupleTree<T>,
    diff: SequenceDiff,
}

impl<T> Tuple<T> {
    /// Creates an empty tuple starting a fresh version lineage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: TupleTree::new(),
            diff: SequenceDiff::initial(),
        }
    }

    /// Creates a tuple from a vector, starting a fresh version lineage.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            tree: TupleTree::from_vec(items),
            diff: SequenceDiff::initial(),
        }
    }

    fn derived(&self, tree: TupleTree<T>, change: SequenceChange, index: Option<usize>, size: usize) -> Self
    where
        T: Clone,
    {
        Self {
            tree,
            diff: SequenceDiff::successor_of(&self.diff, change, index, size),
        }
    }

    /// The diff describing how this tuple was derived from its previous
    /// state. The first tuple of a lineage carries an initial diff with
    /// change [`SequenceChange::None`].
    #[must_use]
    pub fn difference_from_previous(&self) -> &SequenceDiff {
        &self.diff
    }

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the tuple holds no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns a reference to the element at `index`, or `None` if
    /// `index` is out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.tree.get(index)
    }

    /// Returns the first element, or `None` if the tuple is empty.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.tree.first()
    }

    /// Returns the last element, or `None` if the tuple is empty.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.tree.last()
    }

    /// Returns `true` if both tuples share the same root allocation.
    #[inline]
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        TupleTree::ptr_eq(&this.tree, &other.tree)
    }

    /// Returns an iterator over the elements in order.
    pub fn iter(&self) -> TupleTreeIterator<'_, T> {
        self.tree.iter()
    }
}

impl<T: Clone> Tuple<T> {
    /// Returns the subsequence `from..to` with a
    /// [`SequenceChange::Retain`] diff, or `None` if the range is out of
    /// bounds or inverted.
    ///
    /// A full-range slice returns a clone of the receiver, diff
    /// included.
    #[must_use]
    pub fn slice(&self, from: usize, to: usize) -> Option<Self> {
        let sliced = self.tree.slice(from, to)?;
        if TupleTree::ptr_eq(&sliced, &self.tree) {
            return Some(self.clone());
        }
        let index = if sliced.is_empty() { None } else { Some(from) };
        let size = sliced.len();
        Some(self.derived(sliced, SequenceChange::Retain, index, size))
    }

    /// Returns the tuple without the elements in `from..to` with a
    /// [`SequenceChange::Remove`] diff, or `None` if the range is out of
    /// bounds or inverted.
    #[must_use]
    pub fn remove_range(&self, from: usize, to: usize) -> Option<Self> {
        let trimmed = self.tree.remove_range(from, to)?;
        if TupleTree::ptr_eq(&trimmed, &self.tree) {
            return Some(self.clone());
        }
        let removed = to - from;
        let index = if removed == self.len() { 0 } else { from };
        Some(self.derived(trimmed, SequenceChange::Remove, Some(index), removed))
    }

    /// Returns the tuple without the element at `index`, or `None` if
    /// `index` is out of range.
    #[must_use]
    pub fn remove_at(&self, index: usize) -> Option<Self> {
        if index >= self.len() {
            return None;
        }
        self.remove_range(index, index + 1)
    }

    /// Returns the tuple with `item` inserted at `index` and a
    /// [`SequenceChange::Add`] diff, or `None` if `index` is out of
    /// range.
    #[must_use]
    pub fn add_at(&self, index: usize, item: T) -> Option<Self> {
        let grown = self.tree.add_at(index, item)?;
        Some(self.derived(grown, SequenceChange::Add, Some(index), 1))
    }

    /// Returns the tuple with `item` appended.
    #[must_use]
    pub fn add(&self, item: T) -> Self {
        let index = self.len();
        let grown = self.tree.add(item);
        self.derived(grown, SequenceChange::Add, Some(index), 1)
    }

    /// Returns the tuple with all of `items` inserted at `index` and a
    /// [`SequenceChange::Add`] diff, or `None` if `index` is out of
    /// range.
    #[must_use]
    pub fn add_all_at(&self, index: usize, items: &[T]) -> Option<Self> {
        let grown = self.tree.add_all_at(index, items)?;
        if TupleTree::ptr_eq(&grown, &self.tree) {
            return Some(self.clone());
        }
        Some(self.derived(grown, SequenceChange::Add, Some(index), items.len()))
    }

    /// Returns an empty tuple with a [`SequenceChange::Clear`] diff, or
    /// a clone of the receiver if it is already empty.
    #[must_use]
    pub fn clear(&self) -> Self {
        if self.is_empty() {
            return self.clone();
        }
        let size = self.len();
        self.derived(self.tree.clear(), SequenceChange::Clear, Some(0), size)
    }

    /// Returns the tuple sorted by the given comparator, with a
    /// [`SequenceChange::Sort`] diff.
    #[must_use]
    pub fn sort_by<F>(&self, compare: F) -> Self
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let size = self.len();
        self.derived(self.tree.sort_by(compare), SequenceChange::Sort, None, size)
    }

    /// Collects the elements into a vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.tree.to_vec()
    }
}

impl<T: Clone + PartialEq> Tuple<T> {
    /// Returns the tuple with the element at `index` replaced and a
    /// [`SequenceChange::Set`] diff, or `None` if `index` is out of
    /// range.
    ///
    /// Setting an element to an equal value returns a clone of the
    /// receiver, diff included.
    #[must_use]
    pub fn set_at(&self, index: usize, item: T) -> Option<Self> {
        let patched = self.tree.set_at(index, item)?;
        if TupleTree::ptr_eq(&patched, &self.tree) {
            return Some(self.clone());
        }
        Some(self.derived(patched, SequenceChange::Set, Some(index), 1))
    }

    /// Returns the tuple with the elements starting at `index` replaced
    /// by `items`, with a [`SequenceChange::Set`] diff, or `None` if the
    /// window runs past the end.
    #[must_use]
    pub fn set_all_at(&self, index: usize, items: &[T]) -> Option<Self> {
        let patched = self.tree.set_all_at(index, items)?;
        if TupleTree::ptr_eq(&patched, &self.tree) {
            return Some(self.clone());
        }
        Some(self.derived(patched, SequenceChange::Set, Some(index), items.len()))
    }

    /// Returns the tuple without any element equal to one of `items`,
    /// with a [`SequenceChange::Remove`] diff carrying no index.
    #[must_use]
    pub fn remove_all(&self, items: &[T]) -> Self {
        let kept = self.tree.remove_all(items);
        if TupleTree::ptr_eq(&kept, &self.tree) {
            return self.clone();
        }
        let removed = self.len() - kept.len();
        self.derived(kept, SequenceChange::Remove, None, removed)
    }

    /// Returns the tuple keeping only elements equal to one of `items`,
    /// with a [`SequenceChange::Retain`] diff.
    ///
    /// When the kept elements formed one contiguous run in the receiver,
    /// the diff carries the run's start index; a scattered retention
    /// carries no index.
    #[must_use]
    pub fn retain_all(&self, items: &[T]) -> Self {
        if items.is_empty() {
            return self.derived(self.tree.clear(), SequenceChange::Retain, None, 0);
        }
        let kept = self.tree.retain_all(items);
        if TupleTree::ptr_eq(&kept, &self.tree) {
            return self.clone();
        }
        let mut run = RunTracker::new(self.len());
        for (i, element) in self.iter().enumerate() {
            if items.contains(element) {
                run.record(i);
            }
        }
        let size = kept.len();
        self.derived(kept, SequenceChange::Retain, run.index(), size)
    }

    /// Returns the tuple without the elements matching `predicate`, with
    /// a [`SequenceChange::Remove`] diff. A contiguous removal carries
    /// its start index.
    #[must_use]
    pub fn remove_if<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&T) -> bool,
    {
        let mut run = RunTracker::new(self.len());
        let mut kept = Vec::new();
        for (i, element) in self.iter().enumerate() {
            if predicate(element) {
                run.record(i);
            } else {
                kept.push(element.clone());
            }
        }
        if kept.len() == self.len() {
            return self.clone();
        }
        let removed = self.len() - kept.len();
        self.derived(
            TupleTree::from_vec(kept),
            SequenceChange::Remove,
            run.index(),
            removed,
        )
    }

    /// Returns the tuple keeping only the elements matching `predicate`,
    /// with a [`SequenceChange::Retain`] diff. A contiguous retention
    /// carries its start index.
    #[must_use]
    pub fn retain_if<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&T) -> bool,
    {
        let mut run = RunTracker::new(self.len());
        let mut kept = Vec::new();
        for (i, element) in self.iter().enumerate() {
            if predicate(element) {
                run.record(i);
                kept.push(element.clone());
            }
        }
        if kept.len() == self.len() {
            return self.clone();
        }
        let size = kept.len();
        self.derived(
            TupleTree::from_vec(kept),
            SequenceChange::Retain,
            run.index(),
            size,
        )
    }

    /// Returns the elements in reverse order with a
    /// [`SequenceChange::Reverse`] diff, or a clone of the receiver for
    /// fewer than two elements.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let flipped = self.tree.reversed();
        if TupleTree::ptr_eq(&flipped, &self.tree) {
            return self.clone();
        }
        let size = self.len();
        self.derived(flipped, SequenceChange::Reverse, None, size)
    }

    /// Returns `true` if the tuple contains an element equal to `item`.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.tree.contains(item)
    }

    /// Returns the index of the first element equal to `item`, if any.
    #[must_use]
    pub fn first_index_of(&self, item: &T) -> Option<usize> {
        self.tree.first_index_of(item)
    }
}

impl<T: Clone + Ord> Tuple<T> {
    /// Returns the tuple sorted by the natural order, with a
    /// [`SequenceChange::Sort`] diff.
    #[must_use]
    pub fn sort(&self) -> Self {
        self.sort_by(Ord::cmp)
    }
}

impl<T: Clone + Hash + Eq> Tuple<T> {
    /// Returns the tuple with duplicates removed, keeping first
    /// occurrences, with a [`SequenceChange::Distinct`] diff counting the
    /// dropped elements.
    #[must_use]
    pub fn make_distinct(&self) -> Self {
        let distinct = self.tree.make_distinct();
        if TupleTree::ptr_eq(&distinct, &self.tree) {
            return self.clone();
        }
        let removed = self.len() - distinct.len();
        self.derived(distinct, SequenceChange::Distinct, None, removed)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<T> Clone for Tuple<T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            diff: self.diff,
        }
    }
}

impl<T> Default for Tuple<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Tuple<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for Tuple<T> {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl<T: Eq> Eq for Tuple<T> {}

impl<T: Hash> Hash for Tuple<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tree.hash(state);
    }
}

impl<T> FromIterator<T> for Tuple<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iterable: I) -> Self {
        Self::from_vec(iterable.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a Tuple<T> {
    type Item = &'a T;
    type IntoIter = TupleTreeIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for Tuple<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;

        let mut sequence = serializer.serialize_seq(Some(self.len()))?;
        for element in self {
            sequence.serialize_element(element)?;
        }
        sequence.end()
    }
}

// A deserialized tuple has no in-process history; it starts a fresh
// lineage with an initial diff.
#[cfg(feature = "serde")]
impl<'de, T: serde::Deserialize<'de>> serde::Deserialize<'de> for Tuple<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let items: Vec<T> = serde::Deserialize::deserialize(deserializer)?;
        Ok(Self::from_vec(items))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::add(|t: &Tuple<i32>| t.add_at(1, 9).unwrap(), SequenceChange::Add, Some(1), 1)]
    #[case::set(|t: &Tuple<i32>| t.set_at(2, 9).unwrap(), SequenceChange::Set, Some(2), 1)]
    #[case::remove(|t: &Tuple<i32>| t.remove_range(1, 3).unwrap(), SequenceChange::Remove, Some(1), 2)]
    #[case::slice(|t: &Tuple<i32>| t.slice(1, 4).unwrap(), SequenceChange::Retain, Some(1), 3)]
    #[case::clear(|t: &Tuple<i32>| t.clear(), SequenceChange::Clear, Some(0), 5)]
    #[case::sort(|t: &Tuple<i32>| t.sort(), SequenceChange::Sort, None, 5)]
    #[case::reverse(|t: &Tuple<i32>| t.reversed(), SequenceChange::Reverse, None, 5)]
    fn test_each_operation_records_its_diff(
        #[case] operation: fn(&Tuple<i32>) -> Tuple<i32>,
        #[case] change: SequenceChange,
        #[case] index: Option<usize>,
        #[case] size: usize,
    ) {
        let base: Tuple<i32> = vec![4, 0, 3, 1, 2].into_iter().collect();
        let edited = operation(&base);
        let diff = edited.difference_from_previous();

        assert_eq!(diff.change(), change);
        assert_eq!(diff.index(), index);
        assert_eq!(diff.size(), size);
        assert!(diff.is_direct_successor_of(base.difference_from_previous()));
    }

    #[rstest]
    fn test_edit_chain_forms_a_verifiable_history() {
        let first: Tuple<i32> = (0..5).collect();
        let second = first.add(5);
        let third = second.remove_at(0).unwrap();

        assert!(second
            .difference_from_previous()
            .is_direct_successor_of(first.difference_from_previous()));
        assert!(third
            .difference_from_previous()
            .is_direct_successor_of(second.difference_from_previous()));
        // Skipping a step breaks the chain.
        assert!(!third
            .difference_from_previous()
            .is_direct_successor_of(first.difference_from_previous()));
    }

    #[rstest]
    fn test_contiguous_retention_carries_the_run_index() {
        let base: Tuple<i32> = vec![1, 2, 3, 4, 5].into_iter().collect();
        let retained = base.retain_all(&[2, 3, 4]);

        let diff = retained.difference_from_previous();
        assert_eq!(retained.to_vec(), vec![2, 3, 4]);
        assert_eq!(diff.change(), SequenceChange::Retain);
        assert_eq!(diff.index(), Some(1));
        assert_eq!(diff.size(), 3);
    }

    #[rstest]
    fn test_scattered_retention_carries_no_index() {
        let base: Tuple<i32> = vec![1, 2, 3, 4, 5].into_iter().collect();
        let retained = base.retain_all(&[1, 5]);

        let diff = retained.difference_from_previous();
        assert_eq!(retained.to_vec(), vec![1, 5]);
        assert_eq!(diff.index(), None);
        assert_eq!(diff.size(), 2);
    }

    #[rstest]
    fn test_remove_if_tracks_a_contiguous_removal() {
        let base: Tuple<i32> = vec![1, 8, 9, 2].into_iter().collect();
        let trimmed = base.remove_if(|value| *value > 5);

        let diff = trimmed.difference_from_previous();
        assert_eq!(trimmed.to_vec(), vec![1, 2]);
        assert_eq!(diff.change(), SequenceChange::Remove);
        assert_eq!(diff.index(), Some(1));
        assert_eq!(diff.size(), 2);
    }

    #[rstest]
    fn test_no_op_edits_keep_the_receivers_diff() {
        let base: Tuple<i32> = (0..5).collect();
        let same = base.set_at(2, 2).unwrap();

        assert!(Tuple::ptr_eq(&base, &same));
        assert_eq!(
            same.difference_from_previous(),
            base.difference_from_previous()
        );
    }

    #[rstest]
    fn test_equality_ignores_history() {
        let built: Tuple<i32> = vec![1, 2, 3].into_iter().collect();
        let edited = Tuple::<i32>::from_vec(vec![1, 2, 3, 4]).remove_at(3).unwrap();

        assert_eq!(built, edited);
        assert_ne!(
            built.difference_from_previous(),
            edited.difference_from_previous()
        );
    }

    #[rstest]
    fn test_make_distinct_counts_dropped_elements() {
        let base: Tuple<i32> = vec![1, 2, 1, 3, 2].into_iter().collect();
        let distinct = base.make_distinct();

        assert_eq!(distinct.to_vec(), vec![1, 2, 3]);
        assert_eq!(distinct.difference_from_previous().change(), SequenceChange::Distinct);
        assert_eq!(distinct.difference_from_previous().size(), 2);
    }

    #[rstest]
    fn test_remove_all_reports_the_removed_count() {
        let base: Tuple<i32> = vec![1, 2, 3, 2, 1].into_iter().collect();
        let trimmed = base.remove_all(&[1, 2]);

        assert_eq!(trimmed.to_vec(), vec![3]);
        let diff = trimmed.difference_from_previous();
        assert_eq!(diff.change(), SequenceChange::Remove);
        assert_eq!(diff.index(), None);
        assert_eq!(diff.size(), 4);
    }
}
