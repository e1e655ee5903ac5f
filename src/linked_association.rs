//! Insertion-order view over the hash trie.
//!
//! A [`LinkedAssociation`] stores each value together with the keys
//! inserted immediately before and after it, forming a doubly linked
//! chain threaded through a plain [`Association`]. Lookups cost the same
//! as the underlying trie; iteration follows the chain from the first
//! inserted key, so entries come back in insertion order. Updating an
//! existing key's value keeps its position in the chain; removal splices
//! its neighbours together.

use crate::association::Association;
use std::fmt;
use std::hash::{Hash, Hasher};

// =============================================================================
// LinkedEntry
// =============================================================================

/// A value plus its chain neighbours.
#[derive(Clone, PartialEq, Eq)]
struct LinkedEntry<K, V> {
    value: V,
    previous_key: Option<K>,
    next_key: Option<K>,
}

impl<K: Clone, V> LinkedEntry<K, V> {
    fn with_value(&self, value: V) -> Self
    where
        V: Clone,
    {
        Self {
            value,
            previous_key: self.previous_key.clone(),
            next_key: self.next_key.clone(),
        }
    }

    fn with_previous_key(&self, previous_key: Option<K>) -> Self
    where
        V: Clone,
    {
        Self {
            value: self.value.clone(),
            previous_key,
            next_key: self.next_key.clone(),
        }
    }

    fn with_next_key(&self, next_key: Option<K>) -> Self
    where
        V: Clone,
    {
        Self {
            value: self.value.clone(),
            previous_key: self.previous_key.clone(),
            next_key,
        }
    }
}

// =============================================================================
// LinkedAssociation Definition
// =============================================================================

/// A persistent key-value map that remembers insertion order.
///
/// Same structural-sharing guarantees as [`Association`], plus an
/// iteration order: entries come back in the order their keys were first
/// inserted. Re-inserting an existing key updates its value in place
/// without moving it; removing a key closes the gap in the order.
///
/// # Examples
///
/// ```rust
/// use thicket::LinkedAssociation;
///
/// let map = LinkedAssociation::new()
///     .insert("b", 2)
///     .insert("a", 1)
///     .insert("c", 3);
///
/// let keys: Vec<&str> = map.iter().map(|(key, _)| *key).collect();
/// assert_eq!(keys, vec!["b", "a", "c"]);
///
/// let keys: Vec<&str> = map.remove(&"a").iter().map(|(key, _)| *key).collect();
/// assert_eq!(keys, vec!["b", "c"]);
/// ```
pub struct LinkedAssociation<K, V> {
    entries: Association<K, LinkedEntry<K, V>>,
    first_key: Option<K>,
    last_key: Option<K>,
}

impl<K, V> LinkedAssociation<K, V> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Association::new(),
            first_key: None,
            last_key: None,
        }
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map holds no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an empty map.
    #[must_use]
    pub fn clear(&self) -> Self {
        Self::new()
    }

    /// Returns `true` if both maps share the same underlying trie root.
    #[inline]
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Association::ptr_eq(&this.entries, &other.entries)
    }

    /// Returns the first-inserted key, or `None` if the map is empty.
    #[must_use]
    pub fn first_key(&self) -> Option<&K> {
        self.first_key.as_ref()
    }

    /// Returns the last-inserted key, or `None` if the map is empty.
    #[must_use]
    pub fn last_key(&self) -> Option<&K> {
        self.last_key.as_ref()
    }
}

impl<K: Hash + Eq, V> LinkedAssociation<K, V> {
    /// Returns a reference to the value for `key`, or `None` if absent.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Returns `true` if the map contains `key`.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns an iterator over the entries in insertion order.
    pub fn iter(&self) -> LinkedAssociationIterator<'_, K, V> {
        LinkedAssociationIterator {
            entries: &self.entries,
            next_key: self.first_key.as_ref(),
            remaining: self.len(),
        }
    }

    /// Returns an iterator over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }
}

impl<K: Hash + Eq + Clone, V: Clone + PartialEq> LinkedAssociation<K, V> {
    /// Returns a new map with `key` mapped to `value`.
    ///
    /// A new key is appended to the insertion order; an existing key
    /// keeps its position and only its value changes. If `key` already
    /// maps to an equal value, the returned map shares the receiver's
    /// trie root.
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        if let Some(existing) = self.entries.get(&key) {
            if existing.value == value {
                return self.clone();
            }
            let updated = existing.with_value(value);
            return Self {
                entries: self.entries.insert(key, updated),
                first_key: self.first_key.clone(),
                last_key: self.last_key.clone(),
            };
        }
        self.appended(key, value)
    }

    /// Returns a new map with `key` mapped to `value` only if `key` is
    /// currently absent.
    #[must_use]
    pub fn insert_if_absent(&self, key: K, value: V) -> Self {
        if self.entries.contains_key(&key) {
            return self.clone();
        }
        self.appended(key, value)
    }

    fn appended(&self, key: K, value: V) -> Self {
        let entry = LinkedEntry {
            value,
            previous_key: self.last_key.clone(),
            next_key: None,
        };
        let mut entries = self.entries.insert(key.clone(), entry);
        if let Some(last_key) = &self.last_key {
            if let Some(last_entry) = self.entries.get(last_key) {
                entries = entries.insert(
                    last_key.clone(),
                    last_entry.with_next_key(Some(key.clone())),
                );
            }
        }
        Self {
            entries,
            first_key: self.first_key.clone().or_else(|| Some(key.clone())),
            last_key: Some(key),
        }
    }

    /// Returns a new map without `key`, splicing its insertion-order
    /// neighbours together.
    ///
    /// If `key` is absent, the returned map shares the receiver's trie
    /// root.
    #[must_use]
    pub fn remove(&self, key: &K) -> Self {
        let Some(existing) = self.entries.get(key) else {
            return self.clone();
        };
        let first_key = if self.first_key.as_ref() == Some(key) {
            existing.next_key.clone()
        } else {
            self.first_key.clone()
        };
        let last_key = if self.last_key.as_ref() == Some(key) {
            existing.previous_key.clone()
        } else {
            self.last_key.clone()
        };
        let mut entries = self.entries.remove(key);
        if let Some(previous_key) = &existing.previous_key {
            if let Some(previous_entry) = self.entries.get(previous_key) {
                entries = entries.insert(
                    previous_key.clone(),
                    previous_entry.with_next_key(existing.next_key.clone()),
                );
            }
        }
        if let Some(next_key) = &existing.next_key {
            if let Some(next_entry) = self.entries.get(next_key) {
                entries = entries.insert(
                    next_key.clone(),
                    next_entry.with_previous_key(existing.previous_key.clone()),
                );
            }
        }
        Self {
            entries,
            first_key,
            last_key,
        }
    }

    /// Collects the entries into a vector, in insertion order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<(K, V)> {
        self.iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<K: Clone, V> Clone for LinkedAssociation<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            first_key: self.first_key.clone(),
            last_key: self.last_key.clone(),
        }
    }
}

impl<K, V> Default for LinkedAssociation<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + fmt::Debug, V: fmt::Debug> fmt::Debug for LinkedAssociation<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for LinkedAssociation<K, V> {
    fn eq(&self, other: &Self) -> bool {
        // Chain neighbours are part of each stored entry, so trie
        // equality already implies identical insertion order.
        self.entries == other.entries
    }
}

impl<K: Hash + Eq, V: Eq> Eq for LinkedAssociation<K, V> {}

impl<K: Hash + Eq, V: Hash> Hash for LinkedAssociation<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for (key, value) in self.iter() {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl<K: Hash + Eq + Clone, V: Clone + PartialEq> FromIterator<(K, V)> for LinkedAssociation<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iterable: I) -> Self {
        iterable
            .into_iter()
            .fold(Self::new(), |map, (key, value)| map.insert(key, value))
    }
}

impl<'a, K: Hash + Eq, V> IntoIterator for &'a LinkedAssociation<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = LinkedAssociationIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Iteration
// =============================================================================

/// Iterator over the entries of a [`LinkedAssociation`], in insertion
/// order.
pub struct LinkedAssociationIterator<'a, K, V> {
    entries: &'a Association<K, LinkedEntry<K, V>>,
    next_key: Option<&'a K>,
    remaining: usize,
}

impl<'a, K: Hash + Eq, V> Iterator for LinkedAssociationIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.next_key.take()?;
        let entry = self.entries.get(key)?;
        self.next_key = entry.next_key.as_ref();
        self.remaining = self.remaining.saturating_sub(1);
        Some((key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Hash + Eq, V> ExactSizeIterator for LinkedAssociationIterator<'_, K, V> {}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V> serde::Serialize for LinkedAssociation<K, V>
where
    K: serde::Serialize + Hash + Eq,
    V: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;

        // Encoded as a sequence of pairs so the insertion order survives
        // formats that reorder map keys.
        let mut sequence = serializer.serialize_seq(Some(self.len()))?;
        for entry in self {
            sequence.serialize_element(&entry)?;
        }
        sequence.end()
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::Deserialize<'de> for LinkedAssociation<K, V>
where
    K: serde::Deserialize<'de> + Hash + Eq + Clone,
    V: serde::Deserialize<'de> + Clone + PartialEq,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let pairs: Vec<(K, V)> = serde::Deserialize::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

// =============================================================================
// Tests
// =============================================================================
