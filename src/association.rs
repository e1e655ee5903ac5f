//! Persistent key-value map backed by a hash trie.

use crate::hamt::{hash_code, Node, NodeIter};
use crate::ReferenceCounter;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

// =============================================================================
// Association Definition
// =============================================================================

/// A persistent key-value map with structural sharing.
///
/// Every "mutating" operation returns a new `Association` that shares all
/// untouched structure with the original; the original is never modified.
/// Operations that would not change the map return a value sharing the
/// same root allocation, observable through [`Association::ptr_eq`].
///
/// Keys are routed through a hash trie whose nodes hold small
/// exactly-full probe tables, so lookups, inserts, and removals are
/// O(log n) with at most one node copied per level.
///
/// Equality and hashing are content-based: two associations holding the
/// same entries are equal regardless of the order they were built in.
///
/// # Examples
///
/// ```rust
/// use thicket::Association;
///
/// let map = Association::new()
///     .insert("a", 1)
///     .insert("b", 2);
///
/// let updated = map.insert("a", 10);
///
/// assert_eq!(map.get("a"), Some(&1));       // Original unchanged
/// assert_eq!(updated.get("a"), Some(&10));
/// assert_eq!(updated.len(), 2);
/// ```
pub struct Association<K, V> {
    root: ReferenceCounter<Node<K, V>>,
}

impl<K, V> Association<K, V> {
    /// Creates an empty association.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use thicket::Association;
    ///
    /// let map: Association<String, i32> = Association::new();
    /// assert!(map.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: ReferenceCounter::new(Node::empty()),
        }
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.size()
    }

    /// Returns `true` if the association holds no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.size() == 0
    }

    /// Returns an empty association.
    ///
    /// Equivalent to [`Association::new`]; provided for symmetry with
    /// the other collection types.
    #[must_use]
    pub fn clear(&self) -> Self {
        Self::new()
    }

    /// Returns `true` if both associations share the same root
    /// allocation.
    ///
    /// This is how no-op writes can be detected without comparing
    /// contents: an operation that changes nothing returns a value for
    /// which this is `true`.
    #[inline]
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        ReferenceCounter::ptr_eq(&this.root, &other.root)
    }

    /// Returns an iterator over the entries, in unspecified order.
    pub fn iter(&self) -> AssociationIterator<'_, K, V> {
        AssociationIterator {
            inner: self.root.iter(),
        }
    }

    /// Returns an iterator over the keys, in unspecified order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the values, in unspecified order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }
}

impl<K: Hash + Eq, V> Association<K, V> {
    /// Returns a reference to the value for `key`, or `None` if absent.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use thicket::Association;
    ///
    /// let map = Association::new().insert("a".to_string(), 1);
    /// assert_eq!(map.get("a"), Some(&1));
    /// assert_eq!(map.get("b"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.root.lookup(key, hash_code(key))
    }

    /// Returns `true` if the association contains `key`.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }
}

impl<K: Hash + Eq + Clone, V: Clone + PartialEq> Association<K, V> {
    /// Returns a new association with `key` mapped to `value`.
    ///
    /// If `key` already maps to an equal value, the returned association
    /// shares the receiver's root allocation.
    ///
    /// # Complexity
    ///
    /// O(log n); one node is copied per trie level on the key's path.
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        let hash = hash_code(&key);
        match self.root.inserted(key, hash, value, false) {
            Some(root) => Self {
                root: ReferenceCounter::new(root),
            },
            None => self.clone(),
        }
    }

    /// Returns a new association with `key` mapped to `value` only if
    /// `key` is currently absent.
    ///
    /// If `key` is already present, the returned association shares the
    /// receiver's root allocation and keeps the existing value.
    #[must_use]
    pub fn insert_if_absent(&self, key: K, value: V) -> Self {
        let hash = hash_code(&key);
        match self.root.inserted(key, hash, value, true) {
            Some(root) => Self {
                root: ReferenceCounter::new(root),
            },
            None => self.clone(),
        }
    }

    /// Returns a new association without `key`.
    ///
    /// If `key` is absent, the returned association shares the
    /// receiver's root allocation.
    #[must_use]
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.root.removed(key, hash_code(key)) {
            Some(root) => Self {
                root: ReferenceCounter::new(root),
            },
            None => self.clone(),
        }
    }

    /// Collects the entries into a standard [`HashMap`].
    #[must_use]
    pub fn to_hash_map(&self) -> HashMap<K, V> {
        self.iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<K, V> Clone for Association<K, V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<K, V> Default for Association<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Association<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for Association<K, V> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || self.root.equals(&other.root)
    }
}

impl<K: Hash + Eq, V: Eq> Eq for Association<K, V> {}

impl<K, V: Hash> Hash for Association<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i64(self.root.content_hash());
    }
}

impl<K: Hash + Eq + Clone, V: Clone + PartialEq> FromIterator<(K, V)> for Association<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iterable: I) -> Self {
        iterable
            .into_iter()
            .fold(Self::new(), |map, (key, value)| map.insert(key, value))
    }
}

impl<'a, K, V> IntoIterator for &'a Association<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = AssociationIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Iteration
// =============================================================================

/// Iterator over the entries of an [`Association`].
///
/// The order is unspecified but stable for a given association value.
pub struct AssociationIterator<'a, K, V> {
    inner: NodeIter<'a, K, V>,
}

impl<'a, K, V> Iterator for AssociationIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for AssociationIterator<'_, K, V> {}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V> serde::Serialize for Association<K, V>
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
impl<'de, K, V> serde::Deserialize<'de> for Association<K, V>
where
    K: serde::Deserialize<'de> + Hash + Eq + Clone,
    V: serde::Deserialize<'de> + Clone + PartialEq,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct AssociationVisitor<K, V> {
            marker: std::marker::PhantomData<(K, V)>,
        }

        impl<'de, K, V> serde::de::Visitor<'de> for AssociationVisitor<K, V>
        where
            K: serde::Deserialize<'de> + Hash + Eq + Clone,
            V: serde::Deserialize<'de> + Clone + PartialEq,
        {
            type Value = Association<K, V>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut result = Association::new();
                while let Some((key, value)) = access.next_entry()? {
                    result = result.insert(key, value);
                }
                Ok(result)
            }
        }

        deserializer.deserialize_map(AssociationVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
