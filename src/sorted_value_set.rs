//! Persistent ordered set backed by the shared ordered tree.

use crate::sorted_tree::{self, InOrderIter, NodeRef, TreeNode};
use crate::ReferenceCounter;
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

// =============================================================================
// SortedValueSet Definition
// =============================================================================

/// A persistent ordered set of values with structural sharing.
///
/// A thin wrapper over the ordered tree with zero-sized values, so the
/// set pays for no value storage. Elements iterate in ascending order,
/// writes rebalance the same way [`SortedAssociation`](crate::SortedAssociation)
/// does, and no-op writes share the receiver's root allocation.
///
/// # Examples
///
/// ```rust
/// use thicket::SortedValueSet;
///
/// let set: SortedValueSet<i32> = [3, 1, 2].into_iter().collect();
///
/// let elements: Vec<i32> = set.iter().copied().collect();
/// assert_eq!(elements, vec![1, 2, 3]);
/// assert_eq!(set.first(), Some(&1));
/// ```
pub struct SortedValueSet<T> {
    root: NodeRef<T, ()>,
}

impl<T> SortedValueSet<T> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: ReferenceCounter::new(TreeNode::empty()),
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

    /// Returns an iterator over the elements in ascending order.
    pub fn iter(&self) -> SortedValueSetIterator<'_, T> {
        SortedValueSetIterator {
            inner: self.root.iter(),
        }
    }

    /// Returns the smallest element, or `None` if the set is empty.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.root.first_entry().map(|(value, _)| value)
    }

    /// Returns the largest element, or `None` if the set is empty.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.root.last_entry().map(|(value, _)| value)
    }
}

impl<T: Ord> SortedValueSet<T> {
    /// Returns `true` if the set contains `value`.
    #[must_use]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        sorted_tree::find(&self.root, value).is_some()
    }
}

impl<T: Ord + Clone> SortedValueSet<T> {
    /// Returns a new set containing `value`.
    ///
    /// If `value` is already present, the returned set shares the
    /// receiver's root allocation.
    #[must_use]
    pub fn insert(&self, value: T) -> Self {
        let root = sorted_tree::insert(&self.root, value, (), false, true);
        Self { root }
    }

    /// Returns a new set without `value`.
    ///
    /// If `value` is absent, the returned set shares the receiver's
    /// root allocation.
    #[must_use]
    pub fn remove<Q>(&self, value: &Q) -> Self
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let root = sorted_tree::remove(&self.root, value, true);
        Self { root }
    }

    /// Collects the elements into a standard [`BTreeSet`].
    #[must_use]
    pub fn to_btree_set(&self) -> BTreeSet<T> {
        self.iter().cloned().collect()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<T> Clone for SortedValueSet<T> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<T> Default for SortedValueSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for SortedValueSet<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for SortedValueSet<T> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || (self.len() == other.len() && self.iter().eq(other.iter()))
    }
}

impl<T: Eq> Eq for SortedValueSet<T> {}

impl<T: Hash> Hash for SortedValueSet<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for value in self.iter() {
            value.hash(state);
        }
    }
}

impl<T: Ord + Clone> FromIterator<T> for SortedValueSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iterable: I) -> Self {
        iterable
            .into_iter()
            .fold(Self::new(), |set, value| set.insert(value))
    }
}

impl<'a, T> IntoIterator for &'a SortedValueSet<T> {
    type Item = &'a T;
    type IntoIter = SortedValueSetIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Iteration
// =============================================================================

/// Iterator over the elements of a [`SortedValueSet`], in ascending
/// order.
pub struct SortedValueSetIterator<'a, T> {
    inner: InOrderIter<'a, T, ()>,
}

impl<'a, T> Iterator for SortedValueSetIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(value, _)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for SortedValueSetIterator<'_, T> {}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for SortedValueSet<T> {
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
impl<'de, T> serde::Deserialize<'de> for SortedValueSet<T>
where
    T: serde::Deserialize<'de> + Ord + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct SetVisitor<T> {
            marker: std::marker::PhantomData<T>,
        }

        impl<'de, T> serde::de::Visitor<'de> for SetVisitor<T>
        where
            T: serde::Deserialize<'de> + Ord + Clone,
        {
            type Value = SortedValueSet<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a sequence of set elements")
            }

            fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut result = SortedValueSet::new();
                while let Some(value) = access.next_element()? {
                    result = result.insert(value);
                }
                Ok(result)
            }
        }

        deserializer.deserialize_seq(SetVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
