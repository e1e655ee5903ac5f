//! Persistent ordered maps backed by the shared ordered tree.
//!
//! Two variants share one tree implementation:
//! [`SortedAssociation`] runs the self-limiting rebalance step after
//! every write, while [`OrderedAssociation`] skips it and accepts
//! whatever shape the insertion order produces.

use crate::sorted_tree::{self, InOrderIter, NodeRef, TreeNode};
use crate::ReferenceCounter;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

// =============================================================================
// SortedAssociation Definition
// =============================================================================

/// A persistent ordered map with structural sharing.
///
/// Entries are kept in ascending key order; iteration, `first`, and
/// `last` observe that order. Every "mutating" operation returns a new
/// map sharing all untouched structure with the original, and no-op
/// writes share the receiver's root allocation, observable through
/// [`SortedAssociation::ptr_eq`].
///
/// After every write the tree rotates nodes toward the lighter side, but
/// only when the rotation strictly reduces the subtree size imbalance,
/// which keeps lookups O(log n) without the bookkeeping of a strict
/// height invariant.
///
/// # Examples
///
/// ```rust
/// use thicket::SortedAssociation;
///
/// let map = SortedAssociation::new()
///     .insert(3, "c")
///     .insert(1, "a")
///     .insert(2, "b");
///
/// let keys: Vec<i32> = map.keys().copied().collect();
/// assert_eq!(keys, vec![1, 2, 3]);
/// assert_eq!(map.first(), Some((&1, &"a")));
/// ```
pub struct SortedAssociation<K, V> {
    root: NodeRef<K, V>,
}

/// A persistent ordered map that never rebalances.
///
/// Identical to [`SortedAssociation`] except that the rebalance step is
/// skipped after writes, so the tree's shape (and therefore lookup cost)
/// follows the insertion order. Useful when keys arrive in an order that
/// is already well mixed, or when write cost matters more than worst-case
/// lookup depth.
pub struct OrderedAssociation<K, V> {
    root: NodeRef<K, V>,
}

macro_rules! ordered_map_impl {
    ($name:ident, $rebalance:expr) => {
        impl<K, V> $name<K, V> {
            /// Creates an empty map.
            #[must_use]
            pub fn new() -> Self {
                Self {
                    root: ReferenceCounter::new(TreeNode::empty()),
                }
            }

            /// Returns the number of entries.
            #[inline]
            #[must_use]
            pub fn len(&self) -> usize {
                self.root.size()
            }

            /// Returns `true` if the map holds no entries.
            #[inline]
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.root.size() == 0
            }

            /// Returns an empty map.
            #[must_use]
            pub fn clear(&self) -> Self {
                Self::new()
            }

            /// Returns `true` if both maps share the same root allocation.
            #[inline]
            #[must_use]
            pub fn ptr_eq(this: &Self, other: &Self) -> bool {
                ReferenceCounter::ptr_eq(&this.root, &other.root)
            }

            /// Returns an iterator over the entries in ascending key order.
            pub fn iter(&self) -> SortedAssociationIterator<'_, K, V> {
                SortedAssociationIterator {
                    inner: self.root.iter(),
                }
            }

            /// Returns an iterator over the keys in ascending order.
            pub fn keys(&self) -> impl Iterator<Item = &K> {
                self.iter().map(|(key, _)| key)
            }

            /// Returns an iterator over the values in ascending key order.
            pub fn values(&self) -> impl Iterator<Item = &V> {
                self.iter().map(|(_, value)| value)
            }

            /// Returns the entry with the smallest key, or `None` if empty.
            #[must_use]
            pub fn first(&self) -> Option<(&K, &V)> {
                self.root.first_entry()
            }

            /// Returns the entry with the largest key, or `None` if empty.
            #[must_use]
            pub fn last(&self) -> Option<(&K, &V)> {
                self.root.last_entry()
            }
        }

        impl<K: Ord, V> $name<K, V> {
            /// Returns a reference to the value for `key`, or `None` if
            /// absent.
            #[must_use]
            pub fn get<Q>(&self, key: &Q) -> Option<&V>
            where
                K: Borrow<Q>,
                Q: Ord + ?Sized,
            {
                sorted_tree::find(&self.root, key)
            }

            /// Returns `true` if the map contains `key`.
            #[must_use]
            pub fn contains_key<Q>(&self, key: &Q) -> bool
            where
                K: Borrow<Q>,
                Q: Ord + ?Sized,
            {
                self.get(key).is_some()
            }
        }

        impl<K: Ord + Clone, V: Clone + PartialEq> $name<K, V> {
            /// Returns a new map with `key` mapped to `value`.
            ///
            /// If `key` already maps to an equal value, the returned map
            /// shares the receiver's root allocation.
            #[must_use]
            pub fn insert(&self, key: K, value: V) -> Self {
                let root = sorted_tree::insert(&self.root, key, value, false, $rebalance);
                Self { root }
            }

            /// Returns a new map with `key` mapped to `value` only if
            /// `key` is currently absent.
            #[must_use]
            pub fn insert_if_absent(&self, key: K, value: V) -> Self {
                let root = sorted_tree::insert(&self.root, key, value, true, $rebalance);
                Self { root }
            }

            /// Returns a new map without `key`.
            ///
            /// If `key` is absent, the returned map shares the receiver's
            /// root allocation.
            #[must_use]
            pub fn remove<Q>(&self, key: &Q) -> Self
            where
                K: Borrow<Q>,
                Q: Ord + ?Sized,
            {
                let root = sorted_tree::remove(&self.root, key, $rebalance);
                Self { root }
            }

            /// Collects the entries into a standard [`BTreeMap`].
            #[must_use]
            pub fn to_btree_map(&self) -> BTreeMap<K, V> {
                self.iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            }
        }

        impl<K, V> Clone for $name<K, V> {
            fn clone(&self) -> Self {
                Self {
                    root: self.root.clone(),
                }
            }
        }

        impl<K, V> Default for $name<K, V> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for $name<K, V> {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.debug_map().entries(self.iter()).finish()
            }
        }

        impl<K: PartialEq, V: PartialEq> PartialEq for $name<K, V> {
            fn eq(&self, other: &Self) -> bool {
                Self::ptr_eq(self, other)
                    || (self.len() == other.len() && self.iter().eq(other.iter()))
            }
        }

        impl<K: Eq, V: Eq> Eq for $name<K, V> {}

        impl<K: Hash, V: Hash> Hash for $name<K, V> {
            fn hash<H: Hasher>(&self, state: &mut H) {
                state.write_usize(self.len());
                for (key, value) in self.iter() {
                    key.hash(state);
                    value.hash(state);
                }
            }
        }

        impl<K: Ord + Clone, V: Clone + PartialEq> FromIterator<(K, V)> for $name<K, V> {
            fn from_iter<I: IntoIterator<Item = (K, V)>>(iterable: I) -> Self {
                iterable
                    .into_iter()
                    .fold(Self::new(), |map, (key, value)| map.insert(key, value))
            }
        }

        impl<'a, K, V> IntoIterator for &'a $name<K, V> {
            type Item = (&'a K, &'a V);
            type IntoIter = SortedAssociationIterator<'a, K, V>;

            fn into_iter(self) -> Self::IntoIter {
                self.iter()
            }
        }

        #[cfg(feature = "serde")]
        impl<K, V> serde::Serialize for $name<K, V>
        where
            K: serde::Serialize,
            V: serde::Serialize,
        {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                use serde::ser::SerializeMap;

                let mut map = serializer.serialize_map(Some(self.len()))?;
                for (key, value) in self {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }

        #[cfg(feature = "serde")]
        impl<'de, K, V> serde::Deserialize<'de> for $name<K, V>
        where
            K: serde::Deserialize<'de> + Ord + Clone,
            V: serde::Deserialize<'de> + Clone + PartialEq,
        {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                struct MapVisitor<K, V> {
                    marker: std::marker::PhantomData<(K, V)>,
                }

                impl<'de, K, V> serde::de::Visitor<'de> for MapVisitor<K, V>
                where
                    K: serde::Deserialize<'de> + Ord + Clone,
                    V: serde::Deserialize<'de> + Clone + PartialEq,
                {
                    type Value = $name<K, V>;

                    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                        formatter.write_str("a map")
                    }

                    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
                    where
                        A: serde::de::MapAccess<'de>,
                    {
                        let mut result = $name::new();
                        while let Some((key, value)) = access.next_entry()? {
                            result = result.insert(key, value);
                        }
                        Ok(result)
                    }
                }

                deserializer.deserialize_map(MapVisitor {
                    marker: std::marker::PhantomData,
                })
            }
        }
    };
}

ordered_map_impl!(SortedAssociation, true);
ordered_map_impl!(OrderedAssociation, false);

// =============================================================================
// Iteration
// =============================================================================

/// Iterator over the entries of a [`SortedAssociation`] or
/// [`OrderedAssociation`], in ascending key order.
pub struct SortedAssociationIterator<'a, K, V> {
    inner: InOrderIter<'a, K, V>,
}

impl<'a, K, V> Iterator for SortedAssociationIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for SortedAssociationIterator<'_, K, V> {}

// =============================================================================
// Tests
// =============================================================================
