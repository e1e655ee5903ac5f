//! Persistent set backed by the same hash trie as
//! [`Association`](crate::Association).

use crate::hamt::{hash_code, Node, NodeIter};
use crate::ReferenceCounter;
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

// =============================================================================
// ValueSet Definition
// =============================================================================

/// A persistent set of values with structural sharing.
///
/// A thin wrapper over the hash trie with zero-sized values, so the set
/// pays for no value storage. Every "mutating" operation returns a new
/// set; no-op writes share the receiver's root allocation, observable
/// through [`ValueSet::ptr_eq`].
///
/// # Examples
///
/// ```rust
/// use thicket::ValueSet;
///
/// let set = ValueSet::new().insert(1).insert(2);
/// let bigger = set.insert(3);
///
/// assert!(!set.contains(&3));    // Original unchanged
/// assert!(bigger.contains(&3));
/// ```
pub struct ValueSet<T> {
    root: ReferenceCounter<Node<T, ()>>,
}

impl<T> ValueSet<T> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: ReferenceCounter::new(Node::empty()),
        }
    }

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.size()
    }

    /// Returns `true` if the set holds no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.size() == 0
    }

    /// Returns an empty set.
    #[must_use]
    pub fn clear(&self) -> Self {
        Self::new()
    }

    /// Returns `true` if both sets share the same root allocation.
    #[inline]
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        ReferenceCounter::ptr_eq(&this.root, &other.root)
    }

    /// Returns an iterator over the elements, in unspecified order.
    pub fn iter(&self) -> ValueSetIterator<'_, T> {
        ValueSetIterator {
            inner: self.root.iter(),
        }
    }
}

impl<T: Hash + Eq> ValueSet<T> {
    /// Returns `true` if the set contains `value`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.root.lookup(value, hash_code(value)).is_some()
    }
}

impl<T: Hash + Eq + Clone> ValueSet<T> {
    /// Returns a new set containing `value`.
    ///
    /// If `value` is already present, the returned set shares the
    /// receiver's root allocation.
    #[must_use]
    pub fn insert(&self, value: T) -> Self {
        let hash = hash_code(&value);
        match self.root.inserted(value, hash, (), false) {
            Some(root) => Self {
                root: ReferenceCounter::new(root),
            },
            None => self.clone(),
        }
    }

    /// Returns a new set without `value`.
    ///
    /// If `value` is absent, the returned set shares the receiver's
    /// root allocation.
    #[must_use]
    pub fn remove<Q>(&self, value: &Q) -> Self
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.root.removed(value, hash_code(value)) {
            Some(root) => Self {
                root: ReferenceCounter::new(root),
            },
            None => self.clone(),
        }
    }

    /// Returns the union of both sets.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        other
            .iter()
            .fold(self.clone(), |set, value| set.insert(value.clone()))
    }

    /// Returns the intersection of both sets.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        self.iter()
            .filter(|value| other.contains(*value))
            .cloned()
            .collect()
    }

    /// Returns the elements of `self` that are not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        self.iter()
            .filter(|value| !other.contains(*value))
            .cloned()
            .collect()
    }

    /// Collects the elements into a standard [`HashSet`].
    #[must_use]
    pub fn to_hash_set(&self) -> HashSet<T> {
        self.iter().cloned().collect()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<T> Clone for ValueSet<T> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<T> Default for ValueSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for ValueSet<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Hash + Eq> PartialEq for ValueSet<T> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || self.root.equals(&other.root)
    }
}

impl<T: Hash + Eq> Eq for ValueSet<T> {}

impl<T> Hash for ValueSet<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i64(self.root.content_hash());
    }
}

impl<T: Hash + Eq + Clone> FromIterator<T> for ValueSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iterable: I) -> Self {
        iterable
            .into_iter()
            .fold(Self::new(), |set, value| set.insert(value))
    }
}

impl<'a, T> IntoIterator for &'a ValueSet<T> {
    type Item = &'a T;
    type IntoIter = ValueSetIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Iteration
// =============================================================================

/// Iterator over the elements of a [`ValueSet`].
pub struct ValueSetIterator<'a, T> {
    inner: NodeIter<'a, T, ()>,
}

impl<'a, T> Iterator for ValueSetIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(value, _)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for ValueSetIterator<'_, T> {}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for ValueSet<T> {
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
impl<'de, T> serde::Deserialize<'de> for ValueSet<T>
where
    T: serde::Deserialize<'de> + Hash + Eq + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ValueSetVisitor<T> {
            marker: std::marker::PhantomData<T>,
        }

        impl<'de, T> serde::de::Visitor<'de> for ValueSetVisitor<T>
        where
            T: serde::Deserialize<'de> + Hash + Eq + Clone,
        {
            type Value = ValueSet<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a sequence of set elements")
            }

            fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut result = ValueSet::new();
                while let Some(value) = access.next_element()? {
                    result = result.insert(value);
                }
                Ok(result)
            }
        }

        deserializer.deserialize_seq(ValueSetVisitor {
            marker: std::marker::PhantomData,
        })
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
    fn test_insert_and_contains() {
        let set = ValueSet::new().insert("a").insert("b");
        assert!(set.contains(&"a"));
        assert!(!set.contains(&"c"));
        assert_eq!(set.len(), 2);
    }

    #[rstest]
    fn test_duplicate_insert_shares_the_root() {
        let set = ValueSet::new().insert(1);
        let same = set.insert(1);
        assert!(ValueSet::ptr_eq(&set, &same));
    }

    #[rstest]
    fn test_remove_preserves_the_original() {
        let set = ValueSet::new().insert(1).insert(2);
        let smaller = set.remove(&1);

        assert!(set.contains(&1));
        assert!(!smaller.contains(&1));
    }

    #[rstest]
    fn test_set_algebra() {
        let left: ValueSet<i32> = (0..6).collect();
        let right: ValueSet<i32> = (3..9).collect();

        assert_eq!(left.union(&right), (0..9).collect());
        assert_eq!(left.intersection(&right), (3..6).collect());
        assert_eq!(left.difference(&right), (0..3).collect());
    }

    #[rstest]
    fn test_equality_ignores_insertion_order() {
        let forward: ValueSet<i32> = (0..40).collect();
        let backward: ValueSet<i32> = (0..40).rev().collect();
        assert_eq!(forward, backward);
    }
}
