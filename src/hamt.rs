//! Hash-trie node shared by [`Association`](crate::Association) and
//! [`ValueSet`](crate::ValueSet).
//!
//! Each node owns a small open-addressed table of local entries plus an
//! optional array of branches. The local table is always exactly full:
//! its length equals its entry count, a slot is found by probing linearly
//! from `|hash| % len`, and the whole table is rebuilt whenever the entry
//! count changes. Local capacity grows with depth (`depth²`), so the root
//! holds nothing and fans out immediately, while deep nodes absorb more
//! entries before branching. Branch arrays are allocated once at
//! `32 + depth` slots and never resized; the branch for a key is chosen by
//! a depth-salted double-prime mix of its hash, so the same key hash takes
//! a different branch at every level.
//!
//! All updates are path-copying: an operation clones only the nodes on the
//! root-to-target path and returns `None` when nothing changed, letting
//! the public wrappers hand back a value that shares the old root.

use crate::store::ArrayStore;
use crate::ReferenceCounter;
use std::borrow::Borrow;
use std::hash::{Hash, Hasher};

const PRIME_1: i64 = 12_055_296_811_267;
const PRIME_2: i64 = 53_982_894_593_057;

const BASE_BRANCHING_PER_NODE: usize = 32;
const BASE_ENTRIES_PER_NODE: usize = 0;

type Branch<K, V> = Option<ReferenceCounter<Node<K, V>>>;

/// Folds a value's standard hash down to the 32-bit hash the trie routes
/// and stores.
pub(crate) fn hash_code<T: Hash + ?Sized>(value: &T) -> i32 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    value.hash(&mut hasher);
    let wide = hasher.finish();
    #[allow(clippy::cast_possible_truncation)]
    let folded = (wide ^ (wide >> 32)) as i32;
    folded
}

/// Combines a key hash and a value hash into one order-independent
/// 64-bit term. Content hashes are wrapping sums of these terms, so the
/// result is independent of trie shape.
pub(crate) fn combine(key_hash: i32, value_hash: i32) -> i64 {
    (i64::from(key_hash) << 32) | (i64::from(value_hash) & 0xFFFF_FFFF)
}

fn branch_index(hash: i32, depth: usize, branch_count: usize) -> usize {
    let wide = i64::from(hash);
    #[allow(clippy::cast_possible_wrap)]
    let salted = wide.wrapping_add(depth as i64);
    let mixed = PRIME_1.wrapping_mul(wide.wrapping_sub(PRIME_2.wrapping_mul(salted)));
    #[allow(clippy::cast_possible_truncation)]
    let folded = (mixed ^ (mixed >> 32)) as i32;
    folded.unsigned_abs() as usize % branch_count
}

const fn max_entries_for_depth(depth: usize) -> usize {
    BASE_ENTRIES_PER_NODE + depth * depth
}

const fn branch_count_for_depth(depth: usize) -> usize {
    BASE_BRANCHING_PER_NODE + depth
}

/// Re-slots entries into a fresh exactly-full open-addressed table.
///
/// Every entry lands at the first free slot probing linearly from
/// `|hash| % len`; with as many slots as entries a free slot always
/// exists.
fn open_addressed<K, V>(entries: Vec<(K, V, i32)>) -> (Vec<K>, Vec<V>, Vec<i32>) {
    let length = entries.len();
    let mut slots: Vec<Option<(K, V, i32)>> = (0..length).map(|_| None).collect();
    for entry in entries {
        let mut index = entry.2.unsigned_abs() as usize % length;
        while slots[index].is_some() {
            index = (index + 1) % length;
        }
        slots[index] = Some(entry);
    }
    let mut keys = Vec::with_capacity(length);
    let mut values = Vec::with_capacity(length);
    let mut hashes = Vec::with_capacity(length);
    for (key, value, hash) in slots.into_iter().flatten() {
        keys.push(key);
        values.push(value);
        hashes.push(hash);
    }
    (keys, values, hashes)
}

// =============================================================================
// Node
// =============================================================================

pub(crate) struct Node<K, V> {
    depth: usize,
    size: usize,
    keys: ArrayStore<K>,
    values: ArrayStore<V>,
    hashes: ArrayStore<i32>,
    branches: ArrayStore<Branch<K, V>>,
}

impl<K, V> Node<K, V> {
    pub(crate) fn empty() -> Self {
        Self {
            depth: 0,
            size: 0,
            keys: ArrayStore::new(),
            values: ArrayStore::new(),
            hashes: ArrayStore::new(),
            branches: ArrayStore::new(),
        }
    }

    fn leaf(depth: usize, key: K, value: V, hash: i32) -> Self {
        Self {
            depth,
            size: 1,
            keys: ArrayStore::singleton(key),
            values: ArrayStore::singleton(value),
            hashes: ArrayStore::singleton(hash),
            branches: ArrayStore::new(),
        }
    }

    /// Assembles a node from already-slotted local arrays.
    fn assembled(
        depth: usize,
        keys: ArrayStore<K>,
        values: ArrayStore<V>,
        hashes: ArrayStore<i32>,
        branches: ArrayStore<Branch<K, V>>,
    ) -> Self {
        let size = keys.len() + Self::branch_sizes(&branches);
        Self {
            depth,
            size,
            keys,
            values,
            hashes,
            branches,
        }
    }

    /// Assembles a node from raw local entries, re-slotting them into a
    /// fresh open-addressed table when there is more than one.
    fn rebuilt(
        depth: usize,
        keys: Vec<K>,
        values: Vec<V>,
        hashes: Vec<i32>,
        branches: ArrayStore<Branch<K, V>>,
    ) -> Self {
        let (keys, values, hashes) = if keys.len() > 1 {
            let entries = keys
                .into_iter()
                .zip(values)
                .zip(hashes)
                .map(|((key, value), hash)| (key, value, hash))
                .collect();
            open_addressed(entries)
        } else {
            (keys, values, hashes)
        };
        Self::assembled(
            depth,
            ArrayStore::from_vec(keys),
            ArrayStore::from_vec(values),
            ArrayStore::from_vec(hashes),
            branches,
        )
    }

    fn branch_sizes(branches: &ArrayStore<Branch<K, V>>) -> usize {
        branches
            .iter()
            .flatten()
            .map(|branch| branch.size)
            .sum()
    }

    #[inline]
    pub(crate) const fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn iter(&self) -> NodeIter<'_, K, V> {
        let mut stack = Vec::new();
        if self.size > 0 {
            stack.push(Frame {
                node: self,
                entry: 0,
                branch: 0,
            });
        }
        NodeIter {
            stack,
            remaining: self.size,
        }
    }
}

impl<K, V> Node<K, V> {
    /// Linear probe through the exactly-full local table. `None` means
    /// the key holds no local slot; it may still live in a branch.
    fn find_slot<Q>(&self, key: &Q, hash: i32) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let length = self.hashes.len();
        if length == 0 {
            return None;
        }
        let mut index = hash.unsigned_abs() as usize % length;
        for _ in 0..length {
            if self.hashes.as_slice()[index] == hash
                && self.keys.as_slice()[index].borrow() == key
            {
                return Some(index);
            }
            index = (index + 1) % length;
        }
        None
    }

    pub(crate) fn lookup<Q>(&self, key: &Q, hash: i32) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        if let Some(index) = self.find_slot(key, hash) {
            return self.values.get(index);
        }
        if self.branches.is_empty() {
            return None;
        }
        let index = branch_index(hash, self.depth, self.branches.len());
        self.branches.as_slice()[index].as_ref()?.lookup(key, hash)
    }
}

impl<K: Eq + Clone, V: Clone + PartialEq> Node<K, V> {
    /// Path-copying insert. Returns `None` when the trie already holds
    /// the entry unchanged (same value, or any value with `if_absent`).
    pub(crate) fn inserted(&self, key: K, hash: i32, value: V, if_absent: bool) -> Option<Self> {
        if let Some(index) = self.find_slot(&key, hash) {
            if self.values.as_slice()[index] == value || if_absent {
                return None;
            }
            return Some(Self::assembled(
                self.depth,
                self.keys.clone(),
                self.values.with_set(index, value),
                self.hashes.clone(),
                self.branches.clone(),
            ));
        }
        if self.keys.len() < max_entries_for_depth(self.depth) {
            // A removal can free a local slot while the key still lives
            // in a branch; the update must follow it there, or the key
            // would exist twice.
            if !self.branches.is_empty() {
                let index = branch_index(hash, self.depth, self.branches.len());
                if let Some(branch) = self.branches.as_slice()[index].as_ref() {
                    if branch.lookup(&key, hash).is_some() {
                        return branch.inserted(key, hash, value, if_absent).map(|updated| {
                            self.with_branch_at(index, Some(ReferenceCounter::new(updated)))
                        });
                    }
                }
            }
            let mut keys = self.keys.to_vec();
            let mut values = self.values.to_vec();
            let mut hashes = self.hashes.to_vec();
            keys.push(key);
            values.push(value);
            hashes.push(hash);
            return Some(Self::rebuilt(
                self.depth,
                keys,
                values,
                hashes,
                self.branches.clone(),
            ));
        }
        if self.branches.is_empty() {
            // The local table is full and there is nowhere to descend,
            // so this is where the trie grows.
            let branch_count = branch_count_for_depth(self.depth);
            let mut branches: Vec<Branch<K, V>> = vec![None; branch_count];
            branches[branch_index(hash, self.depth, branch_count)] = Some(ReferenceCounter::new(
                Self::leaf(self.depth + 1, key, value, hash),
            ));
            return Some(Self::assembled(
                self.depth,
                self.keys.clone(),
                self.values.clone(),
                self.hashes.clone(),
                ArrayStore::from_vec(branches),
            ));
        }
        let index = branch_index(hash, self.depth, self.branches.len());
        match &self.branches.as_slice()[index] {
            None => {
                let leaf = Self::leaf(self.depth + 1, key, value, hash);
                Some(self.with_branch_at(index, Some(ReferenceCounter::new(leaf))))
            }
            Some(branch) => branch
                .inserted(key, hash, value, if_absent)
                .map(|updated| self.with_branch_at(index, Some(ReferenceCounter::new(updated)))),
        }
    }

    /// Path-copying removal. Returns `None` when the key is absent.
    pub(crate) fn removed<Q>(&self, key: &Q, hash: i32) -> Option<Self>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        if let Some(index) = self.find_slot(key, hash) {
            let mut keys = self.keys.to_vec();
            let mut values = self.values.to_vec();
            let mut hashes = self.hashes.to_vec();
            keys.remove(index);
            values.remove(index);
            hashes.remove(index);
            return Some(Self::rebuilt(
                self.depth,
                keys,
                values,
                hashes,
                self.branches.clone(),
            ));
        }
        if self.branches.is_empty() {
            return None;
        }
        let index = branch_index(hash, self.depth, self.branches.len());
        let Some(branch) = self.branches.as_slice()[index].as_ref() else {
            return None;
        };
        let updated = branch.removed(key, hash)?;
        if updated.size == 0 {
            let has_other_branches = self
                .branches
                .iter()
                .enumerate()
                .any(|(i, candidate)| i != index && candidate.is_some());
            if !has_other_branches {
                // The last branch just drained, so the node collapses
                // back to a pure leaf.
                return Some(Self::assembled(
                    self.depth,
                    self.keys.clone(),
                    self.values.clone(),
                    self.hashes.clone(),
                    ArrayStore::new(),
                ));
            }
            return Some(self.with_branch_at(index, None));
        }
        Some(self.with_branch_at(index, Some(ReferenceCounter::new(updated))))
    }

    fn with_branch_at(&self, index: usize, branch: Branch<K, V>) -> Self {
        Self::assembled(
            self.depth,
            self.keys.clone(),
            self.values.clone(),
            self.hashes.clone(),
            self.branches.with_set(index, branch),
        )
    }
}

impl<K: Eq, V: PartialEq> Node<K, V> {
    /// Structural equality. Tries a pairwise walk first, which decides
    /// the answer cheaply when the two tries share local tables; falls
    /// back to entry-by-entry lookup otherwise.
    pub(crate) fn equals(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.size != other.size {
            return false;
        }
        match self.pairwise_equals(other) {
            Some(decided) => decided,
            None => self.entries_contained_in(other),
        }
    }

    fn pairwise_equals(&self, other: &Self) -> Option<bool> {
        if !ArrayStore::ptr_eq(&self.keys, &other.keys)
            || self.branches.len() != other.branches.len()
        {
            return None;
        }
        if !ArrayStore::ptr_eq(&self.values, &other.values)
            && self.values.as_slice() != other.values.as_slice()
        {
            return Some(false);
        }
        for (left, right) in self.branches.iter().zip(other.branches.iter()) {
            match (left, right) {
                (None, None) => {}
                (Some(left), Some(right)) => {
                    if std::ptr::eq(
                        ReferenceCounter::as_ptr(left),
                        ReferenceCounter::as_ptr(right),
                    ) {
                        continue;
                    }
                    if left.size != right.size {
                        return Some(false);
                    }
                    match left.pairwise_equals(right) {
                        Some(false) => return Some(false),
                        Some(true) => {}
                        None => return None,
                    }
                }
                _ => return None,
            }
        }
        Some(true)
    }

    /// `true` if every entry reachable from `self` maps to an equal
    /// value under `root`. With equal sizes this implies equality,
    /// because key routing is deterministic.
    fn entries_contained_in(&self, root: &Self) -> bool {
        for index in 0..self.keys.len() {
            let key = &self.keys.as_slice()[index];
            let hash = self.hashes.as_slice()[index];
            match root.lookup(key, hash) {
                Some(value) if *value == self.values.as_slice()[index] => {}
                _ => return false,
            }
        }
        self.branches
            .iter()
            .flatten()
            .all(|branch| branch.entries_contained_in(root))
    }
}

impl<K, V: Hash> Node<K, V> {
    /// Shape-independent 64-bit content hash: a wrapping sum of combined
    /// key/value hash terms over every entry in the trie.
    pub(crate) fn content_hash(&self) -> i64 {
        let mut total: i64 = 0;
        for index in 0..self.hashes.len() {
            let value_hash = hash_code(&self.values.as_slice()[index]);
            total = total.wrapping_add(combine(self.hashes.as_slice()[index], value_hash));
        }
        for branch in self.branches.iter().flatten() {
            total = total.wrapping_add(branch.content_hash());
        }
        total
    }
}

// =============================================================================
// Iteration
// =============================================================================

struct Frame<'a, K, V> {
    node: &'a Node<K, V>,
    entry: usize,
    branch: usize,
}

/// Depth-first traversal over a trie, local entries before branches.
pub(crate) struct NodeIter<'a, K, V> {
    stack: Vec<Frame<'a, K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for NodeIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let node = frame.node;
            if frame.entry < node.keys.len() {
                let index = frame.entry;
                frame.entry += 1;
                self.remaining -= 1;
                return Some((&node.keys.as_slice()[index], &node.values.as_slice()[index]));
            }
            if frame.branch < node.branches.len() {
                let mut descend = None;
                while frame.branch < node.branches.len() {
                    let candidate = node.branches.as_slice()[frame.branch].as_ref();
                    frame.branch += 1;
                    if let Some(child) = candidate {
                        if child.size > 0 {
                            descend = Some(&**child);
                            break;
                        }
                    }
                }
                if let Some(child) = descend {
                    self.stack.push(Frame {
                        node: child,
                        entry: 0,
                        branch: 0,
                    });
                }
                continue;
            }
            self.stack.pop();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for NodeIter<'_, K, V> {}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn inserted_all(node: Node<i32, i32>, entries: &[(i32, i32)]) -> Node<i32, i32> {
        entries.iter().fold(node, |node, &(key, value)| {
            node.inserted(key, hash_code(&key), value, false)
                .unwrap_or(node)
        })
    }

    #[rstest]
    fn test_empty_node_has_no_entries() {
        let node: Node<i32, i32> = Node::empty();
        assert_eq!(node.size(), 0);
        assert_eq!(node.lookup(&1, hash_code(&1)), None);
    }

    #[rstest]
    fn test_insert_then_lookup() {
        let node = inserted_all(Node::empty(), &[(1, 10), (2, 20), (3, 30)]);
        assert_eq!(node.size(), 3);
        assert_eq!(node.lookup(&2, hash_code(&2)), Some(&20));
        assert_eq!(node.lookup(&4, hash_code(&4)), None);
    }

    #[rstest]
    fn test_insert_same_value_is_a_no_op() {
        let node = inserted_all(Node::empty(), &[(1, 10)]);
        assert!(node.inserted(1, hash_code(&1), 10, false).is_none());
    }

    #[rstest]
    fn test_insert_if_absent_keeps_existing_value() {
        let node = inserted_all(Node::empty(), &[(1, 10)]);
        assert!(node.inserted(1, hash_code(&1), 99, true).is_none());
        let replaced = node.inserted(1, hash_code(&1), 99, false).unwrap();
        assert_eq!(replaced.lookup(&1, hash_code(&1)), Some(&99));
    }

    #[rstest]
    fn test_remove_missing_key_is_a_no_op() {
        let node = inserted_all(Node::empty(), &[(1, 10)]);
        assert!(node.removed(&2, hash_code(&2)).is_none());
    }

    #[rstest]
    fn test_insert_and_remove_many_entries() {
        let entries: Vec<(i32, i32)> = (0..500).map(|i| (i, i * 2)).collect();
        let node = inserted_all(Node::empty(), &entries);
        assert_eq!(node.size(), 500);
        for (key, value) in &entries {
            assert_eq!(node.lookup(key, hash_code(key)), Some(value));
        }

        let emptied = entries.iter().fold(node, |node, (key, _)| {
            node.removed(key, hash_code(key)).unwrap_or(node)
        });
        assert_eq!(emptied.size(), 0);
    }

    #[rstest]
    fn test_update_after_removal_follows_the_key_into_its_branch() {
        // Two keys routed to the same root branch: the first fills the
        // child's local table, the second lands in the child's branch.
        let root_branches = branch_count_for_depth(0);
        let colliding = (1..)
            .find(|&hash| branch_index(hash, 0, root_branches) == branch_index(0, 0, root_branches))
            .unwrap();

        let node: Node<i32, i32> = Node::empty();
        let node = node.inserted(1, 0, 10, false).unwrap();
        let node = node.inserted(2, colliding, 20, false).unwrap();

        // Removing the first key frees the child's local slot. A value
        // update of the second key must land on its branch entry, not
        // claim the freed slot.
        let node = node.removed(&1, 0).unwrap();
        let node = node.inserted(2, colliding, 99, false).unwrap();

        assert_eq!(node.size(), 1);
        assert_eq!(node.lookup(&2, colliding), Some(&99));
        assert_eq!(node.iter().count(), 1);
        assert!(node.inserted(2, colliding, 77, true).is_none());
    }

    #[rstest]
    fn test_iteration_visits_every_entry_once() {
        let entries: Vec<(i32, i32)> = (0..100).map(|i| (i, i + 1)).collect();
        let node = inserted_all(Node::empty(), &entries);

        let mut seen: Vec<i32> = node.iter().map(|(key, _)| *key).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_content_hash_is_shape_independent() {
        let forward = inserted_all(Node::empty(), &[(1, 10), (2, 20), (3, 30)]);
        let backward = inserted_all(Node::empty(), &[(3, 30), (2, 20), (1, 10)]);
        assert_eq!(forward.content_hash(), backward.content_hash());
        assert!(forward.equals(&backward));
    }

    #[rstest]
    fn test_equality_detects_differing_values() {
        let left = inserted_all(Node::empty(), &[(1, 10), (2, 20)]);
        let right = inserted_all(Node::empty(), &[(1, 10), (2, 21)]);
        assert!(!left.equals(&right));
    }
}
