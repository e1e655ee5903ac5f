//! Copy-on-write array store.
//!
//! This module provides [`ArrayStore`], the contiguous buffer type that
//! every node in this crate stores its local entries in. A store is an
//! immutable, reference-counted slice: cloning is a reference-count bump,
//! and every `with_*` helper returns a **new** store, so a buffer that has
//! been installed into a published node is never mutated afterwards.
//!
//! # Publication Contract
//!
//! Buffers are built as plain `Vec<T>` values, frozen into a
//! reference-counted slice on construction, and never aliased mutably
//! after that point. Unchanged stores are shared by reference between
//! collection versions; [`ArrayStore::ptr_eq`] exposes that sharing as a
//! cheap same-allocation check.

use crate::ReferenceCounter;
use std::cmp::Ordering;
use std::fmt;

// =============================================================================
// ArrayStore Definition
// =============================================================================

/// An immutable, reference-counted contiguous buffer.
///
/// `ArrayStore` is the owned-buffer abstraction behind every node type in
/// this crate. All "mutating" helpers are copy-on-write: they allocate a
/// fresh buffer and leave the receiver untouched.
///
/// # Examples
///
/// ```rust
/// use thicket::ArrayStore;
///
/// let store: ArrayStore<i32> = ArrayStore::from_vec(vec![1, 2, 3]);
/// let grown = store.with_insert(1, 9);
///
/// assert_eq!(store.as_slice(), &[1, 2, 3]);  // Original unchanged
/// assert_eq!(grown.as_slice(), &[1, 9, 2, 3]);
/// ```
pub struct ArrayStore<T> {
    items: ReferenceCounter<[T]>,
}

impl<T> ArrayStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: ReferenceCounter::from(Vec::new()),
        }
    }

    /// Creates a store owning the elements of the given vector.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            items: ReferenceCounter::from(items),
        }
    }

    /// Creates a store holding a single element.
    #[must_use]
    pub fn singleton(item: T) -> Self {
        Self::from_vec(vec![item])
    }

    /// Returns the number of elements in the store.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the store holds no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns a reference to the element at `index`, or `None` if
    /// `index` is out of range.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Returns the first element, or `None` if the store is empty.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// Returns the last element, or `None` if the store is empty.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    /// Returns the elements as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Returns an iterator over the elements.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Returns `true` if both stores share the same allocation.
    ///
    /// This is a performance short-circuit for structural sharing;
    /// correctness never depends on it.
    #[inline]
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        ReferenceCounter::ptr_eq(&this.items, &other.items)
    }
}

impl<T: Clone> ArrayStore<T> {
    /// Returns a new store with the element at `index` replaced.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[must_use]
    pub fn with_set(&self, index: usize, item: T) -> Self {
        let mut items = self.items.to_vec();
        items[index] = item;
        Self::from_vec(items)
    }

    /// Returns a new store with `item` inserted at `index`, shifting
    /// later elements right.
    ///
    /// # Panics
    ///
    /// Panics if `index > self.len()`.
    #[must_use]
    pub fn with_insert(&self, index: usize, item: T) -> Self {
        let mut items = Vec::with_capacity(self.len() + 1);
        items.extend_from_slice(&self.items[..index]);
        items.push(item);
        items.extend_from_slice(&self.items[index..]);
        Self::from_vec(items)
    }

    /// Returns a new store with `item` appended.
    #[must_use]
    pub fn with_push(&self, item: T) -> Self {
        self.with_insert(self.len(), item)
    }

    /// Returns a new store with the elements in `from..to` removed.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds or inverted.
    #[must_use]
    pub fn with_remove_range(&self, from: usize, to: usize) -> Self {
        let mut items = Vec::with_capacity(self.len() - (to - from));
        items.extend_from_slice(&self.items[..from]);
        items.extend_from_slice(&self.items[to..]);
        Self::from_vec(items)
    }

    /// Returns a new store with all elements of `insertion` spliced in at
    /// `index`, shifting later elements right.
    ///
    /// # Panics
    ///
    /// Panics if `index > self.len()`.
    #[must_use]
    pub fn with_splice_at(&self, index: usize, insertion: &[T]) -> Self {
        let mut items = Vec::with_capacity(self.len() + insertion.len());
        items.extend_from_slice(&self.items[..index]);
        items.extend_from_slice(insertion);
        items.extend_from_slice(&self.items[index..]);
        Self::from_vec(items)
    }

    /// Returns a new store holding a copy of the elements in `from..to`.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds or inverted.
    #[must_use]
    pub fn slice(&self, from: usize, to: usize) -> Self {
        Self::from_vec(self.items[from..to].to_vec())
    }

    /// Returns a new store with the elements sorted by the given
    /// comparator.
    #[must_use]
    pub fn sorted_by<F>(&self, compare: F) -> Self
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut items = self.items.to_vec();
        items.sort_by(compare);
        Self::from_vec(items)
    }

    /// Returns the elements as an owned vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.items.to_vec()
    }
}

impl<T> Clone for ArrayStore<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

impl<T> Default for ArrayStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for ArrayStore<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for ArrayStore<T> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for ArrayStore<T> {}

impl<T> FromIterator<T> for ArrayStore<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iterable: I) -> Self {
        Self::from_vec(iterable.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a ArrayStore<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Tests
// =============================================================================
