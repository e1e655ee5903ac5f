//! Insertion-order set composed over [`LinkedAssociation`].

use crate::linked_association::{LinkedAssociation, LinkedAssociationIterator};
use std::fmt;
use std::hash::{Hash, Hasher};

// =============================================================================
// LinkedValueSet Definition
// =============================================================================

/// A persistent set of values that remembers insertion order.
///
/// Built on [`LinkedAssociation`] with zero-sized values. Re-inserting
/// an existing element keeps its position; removing one closes the gap.
///
/// # Examples
///
/// ```rust
/// use thicket::LinkedValueSet;
///
/// let set = LinkedValueSet::new().insert(3).insert(1).insert(2);
///
/// let elements: Vec<i32> = set.iter().copied().collect();
/// assert_eq!(elements, vec![3, 1, 2]);
/// ```
pub struct LinkedValueSet<T> {
    entries: LinkedAssociation<T, ()>,
}

impl<T> LinkedValueSet<T> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: LinkedAssociation::new(),
        }
    }

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the set holds no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an empty set.
    #[must_use]
    pub fn clear(&self) -> Self {
        Self::new()
    }

    /// Returns `true` if both sets share the same underlying trie root.
    #[inline]
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        LinkedAssociation::ptr_eq(&this.entries, &other.entries)
    }

    /// Returns the first-inserted element, or `None` if the set is
    /// empty.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.entries.first_key()
    }

    /// Returns the last-inserted element, or `None` if the set is
    /// empty.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.entries.last_key()
    }
}

impl<T: Hash + Eq> LinkedValueSet<T> {
    /// Returns `true` if the set contains `value`.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.entries.contains_key(value)
    }

    /// Returns an iterator over the elements in insertion order.
    pub fn iter(&self) -> LinkedValueSetIterator<'_, T> {
        LinkedValueSetIterator {
            inner: self.entries.iter(),
        }
    }
}

impl<T: Hash + Eq + Clone> LinkedValueSet<T> {
    /// Returns a new set containing `value`.
    ///
    /// An existing element keeps its position in the insertion order,
    /// and the returned set shares the receiver's trie root.
    #[must_use]
    pub fn insert(&self, value: T) -> Self {
        Self {
            entries: self.entries.insert_if_absent(value, ()),
        }
    }

    /// Returns a new set without `value`, closing the gap in the
    /// insertion order.
    #[must_use]
    pub fn remove(&self, value: &T) -> Self {
        Self {
            entries: self.entries.remove(value),
        }
    }

    /// Collects the elements into a vector, in insertion order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<T: Clone> Clone for LinkedValueSet<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T> Default for LinkedValueSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq + fmt::Debug> fmt::Debug for LinkedValueSet<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Hash + Eq> PartialEq for LinkedValueSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<T: Hash + Eq> Eq for LinkedValueSet<T> {}

impl<T: Hash + Eq> Hash for LinkedValueSet<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for value in self.iter() {
            value.hash(state);
        }
    }
}

impl<T: Hash + Eq + Clone> FromIterator<T> for LinkedValueSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iterable: I) -> Self {
        iterable
            .into_iter()
            .fold(Self::new(), |set, value| set.insert(value))
    }
}

impl<'a, T: Hash + Eq> IntoIterator for &'a LinkedValueSet<T> {
    type Item = &'a T;
    type IntoIter = LinkedValueSetIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Iteration
// =============================================================================

/// Iterator over the elements of a [`LinkedValueSet`], in insertion
/// order.
pub struct LinkedValueSetIterator<'a, T> {
    inner: LinkedAssociationIterator<'a, T, ()>,
}

impl<'a, T: Hash + Eq> Iterator for LinkedValueSetIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(value, _)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T: Hash + Eq> ExactSizeIterator for LinkedValueSetIterator<'_, T> {}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize + Hash + Eq> serde::Serialize for LinkedValueSet<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;

        let mut sequence = serializer.serialize_seq(Some(self.len()))?;
        for value in self {
            sequence.serialize_element(value)?;
        }
        sequence.end()
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for LinkedValueSet<T>
where
    T: serde::Deserialize<'de> + Hash + Eq + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let values: Vec<T> = serde::Deserialize::deserialize(deserializer)?;
        Ok(values.into_iter().collect())
    }
}

// =============================================================================
// Tests
// =============================================================================
