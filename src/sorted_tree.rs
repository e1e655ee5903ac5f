//! Ordered-tree node shared by [`SortedAssociation`](crate::SortedAssociation),
//! [`OrderedAssociation`](crate::OrderedAssociation), and
//! [`SortedValueSet`](crate::SortedValueSet).
//!
//! Each node holds a sorted run of entries plus optional left/right
//! subtrees; everything in the left subtree sorts before the local run and
//! everything in the right subtree after it. Local capacity grows with
//! depth (`max(1, depth²/2)`), so nodes near the root stay small while
//! deep nodes absorb long runs. A single binary-search probe classifies a
//! key against the local run and drives lookup, insertion, and removal
//! alike.
//!
//! Insertion into a full interior node pops a boundary entry off the
//! lighter side of the local run and re-inserts it one level down, which
//! keeps local runs sorted without ever splitting them. Removal of a
//! node's last local entry pulls up the in-order neighbour from the
//! heavier subtree. The rebalance step rotates a node only when the
//! rotation strictly reduces the size imbalance between its subtrees;
//! the ordered (non-rebalancing) variants skip the step entirely via the
//! `rebalance` flag.
//!
//! All updates are path-copying and detect no-ops by returning the input
//! allocation unchanged.

use crate::store::ArrayStore;
use crate::ReferenceCounter;
use std::borrow::Borrow;
use std::cmp::Ordering;

pub(crate) type NodeRef<K, V> = ReferenceCounter<TreeNode<K, V>>;

const fn capacity_for_depth(depth: usize) -> usize {
    let computed = depth * depth / 2;
    if computed < 1 { 1 } else { computed }
}

// =============================================================================
// Probe
// =============================================================================

/// Where a key falls relative to a node's local sorted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Probe {
    /// Sorts before every local entry.
    Left,
    /// Sorts after every local entry.
    Right,
    /// Equal to the local entry at this index.
    Hit(usize),
    /// Sorts between the local entries at `index - 1` and `index`.
    Gap(usize),
}

pub(crate) fn probe<K, Q>(keys: &[K], key: &Q) -> Probe
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    if keys.is_empty() {
        return Probe::Left;
    }
    let mut low = 0;
    let mut high = keys.len();
    while low < high {
        let mid = (low + high) / 2;
        match key.cmp(keys[mid].borrow()) {
            Ordering::Less => high = mid,
            Ordering::Greater => low = mid + 1,
            Ordering::Equal => return Probe::Hit(mid),
        }
    }
    if low == 0 {
        Probe::Left
    } else if low == keys.len() {
        Probe::Right
    } else {
        Probe::Gap(low)
    }
}

// =============================================================================
// TreeNode
// =============================================================================

pub(crate) struct TreeNode<K, V> {
    size: usize,
    keys: ArrayStore<K>,
    values: ArrayStore<V>,
    left: Option<NodeRef<K, V>>,
    right: Option<NodeRef<K, V>>,
}

impl<K, V> TreeNode<K, V> {
    pub(crate) fn empty() -> Self {
        Self {
            size: 0,
            keys: ArrayStore::new(),
            values: ArrayStore::new(),
            left: None,
            right: None,
        }
    }

    fn single(key: K, value: V) -> Self {
        Self {
            size: 1,
            keys: ArrayStore::singleton(key),
            values: ArrayStore::singleton(value),
            left: None,
            right: None,
        }
    }

    fn assembled(
        keys: ArrayStore<K>,
        values: ArrayStore<V>,
        left: Option<NodeRef<K, V>>,
        right: Option<NodeRef<K, V>>,
    ) -> Self {
        let size = keys.len() + subtree_size(&left) + subtree_size(&right);
        Self {
            size,
            keys,
            values,
            left,
            right,
        }
    }

    fn with_arrays(&self, keys: ArrayStore<K>, values: ArrayStore<V>) -> Self {
        Self::assembled(keys, values, self.left.clone(), self.right.clone())
    }

    fn with_left(&self, left: Option<NodeRef<K, V>>) -> Self {
        Self::assembled(self.keys.clone(), self.values.clone(), left, self.right.clone())
    }

    fn with_right(&self, right: Option<NodeRef<K, V>>) -> Self {
        Self::assembled(self.keys.clone(), self.values.clone(), self.left.clone(), right)
    }

    #[inline]
    pub(crate) const fn size(&self) -> usize {
        self.size
    }

    fn local_len(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn iter(&self) -> InOrderIter<'_, K, V> {
        let mut stack = Vec::new();
        if self.size > 0 {
            stack.push(InOrderFrame {
                node: self,
                stage: 0,
                index: 0,
            });
        }
        InOrderIter {
            stack,
            remaining: self.size,
        }
    }

    /// The smallest entry in the subtree, if any.
    pub(crate) fn first_entry(&self) -> Option<(&K, &V)> {
        let mut node = self;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        node.keys.first().zip(node.values.first())
    }

    /// The largest entry in the subtree, if any.
    pub(crate) fn last_entry(&self) -> Option<(&K, &V)> {
        let mut node = self;
        while let Some(right) = node.right.as_deref() {
            node = right;
        }
        node.keys.last().zip(node.values.last())
    }

    /// The deepest level reachable from this node, counting this node as
    /// one. Diagnostic only; not used by any operation.
    pub(crate) fn height(&self) -> usize {
        let left = self.left.as_deref().map_or(0, Self::height);
        let right = self.right.as_deref().map_or(0, Self::height);
        1 + left.max(right)
    }
}

fn subtree_size<K, V>(subtree: &Option<NodeRef<K, V>>) -> usize {
    subtree.as_deref().map_or(0, TreeNode::size)
}

fn local_len_of<K, V>(subtree: &Option<NodeRef<K, V>>) -> usize {
    subtree.as_deref().map_or(0, TreeNode::local_len)
}

// =============================================================================
// Lookup
// =============================================================================

pub(crate) fn find<'a, K, V, Q>(node: &'a TreeNode<K, V>, key: &Q) -> Option<&'a V>
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    match probe(node.keys.as_slice(), key) {
        Probe::Hit(index) => node.values.get(index),
        Probe::Left => find(node.left.as_deref()?, key),
        Probe::Right => find(node.right.as_deref()?, key),
        Probe::Gap(_) => None,
    }
}

// =============================================================================
// Insertion
// =============================================================================

/// Inserts at the root and applies the final balance step. Returns the
/// input allocation unchanged for no-op writes.
pub(crate) fn insert<K, V>(
    root: &NodeRef<K, V>,
    key: K,
    value: V,
    if_absent: bool,
    rebalance: bool,
) -> NodeRef<K, V>
where
    K: Ord + Clone,
    V: Clone + PartialEq,
{
    maybe_balance(updated(root, key, value, if_absent, 0, rebalance), rebalance)
}

fn maybe_balance<K, V>(node: NodeRef<K, V>, rebalance: bool) -> NodeRef<K, V> {
    if rebalance { balance(node) } else { node }
}

fn maybe_balance_nullable<K, V>(
    node: Option<NodeRef<K, V>>,
    rebalance: bool,
) -> Option<NodeRef<K, V>> {
    node.map(|node| maybe_balance(node, rebalance))
}

fn updated<K, V>(
    node: &NodeRef<K, V>,
    key: K,
    value: V,
    if_absent: bool,
    depth: usize,
    rebalance: bool,
) -> NodeRef<K, V>
where
    K: Ord + Clone,
    V: Clone + PartialEq,
{
    let local_len = node.local_len();
    let position = probe(node.keys.as_slice(), &key);
    let found_locally = matches!(position, Probe::Hit(_) | Probe::Gap(_));
    let is_leaf = node.left.is_none() && node.right.is_none();

    if is_leaf && !found_locally && local_len < capacity_for_depth(depth) {
        // A leaf with room absorbs the entry at whichever end it sorts to.
        let (keys, values) = if matches!(position, Probe::Left) {
            (node.keys.with_insert(0, key), node.values.with_insert(0, value))
        } else {
            (node.keys.with_push(key), node.values.with_push(value))
        };
        return ReferenceCounter::new(node.with_arrays(keys, values));
    }

    match position {
        Probe::Left => match &node.left {
            Some(left) => {
                let new_left = maybe_balance(
                    updated(left, key, value, if_absent, depth + 1, rebalance),
                    rebalance,
                );
                if ReferenceCounter::ptr_eq(&new_left, left) {
                    node.clone()
                } else {
                    ReferenceCounter::new(node.with_left(Some(new_left)))
                }
            }
            None => {
                let leaf = ReferenceCounter::new(TreeNode::single(key, value));
                ReferenceCounter::new(node.with_left(Some(leaf)))
            }
        },
        Probe::Right => match &node.right {
            Some(right) => {
                let new_right = maybe_balance(
                    updated(right, key, value, if_absent, depth + 1, rebalance),
                    rebalance,
                );
                if ReferenceCounter::ptr_eq(&new_right, right) {
                    node.clone()
                } else {
                    ReferenceCounter::new(node.with_right(Some(new_right)))
                }
            }
            None => {
                let leaf = ReferenceCounter::new(TreeNode::single(key, value));
                ReferenceCounter::new(node.with_right(Some(leaf)))
            }
        },
        Probe::Gap(gap) => {
            if local_len < capacity_for_depth(depth) {
                let keys = node.keys.with_insert(gap, key);
                let values = node.values.with_insert(gap, value);
                return ReferenceCounter::new(node.with_arrays(keys, values));
            }
            // The local run is full, so a boundary entry is popped off
            // the side whose child holds the lighter local run and
            // re-inserted one level down; the new entry then fits into
            // the freed slot.
            if local_len_of(&node.left) < local_len_of(&node.right) {
                let popped_key = node.keys.as_slice()[0].clone();
                let popped_value = node.values.as_slice()[0].clone();
                let new_left = match &node.left {
                    Some(left) => maybe_balance(
                        updated(left, popped_key, popped_value, if_absent, depth + 1, rebalance),
                        rebalance,
                    ),
                    None => ReferenceCounter::new(TreeNode::single(popped_key, popped_value)),
                };
                let mut keys = node.keys.as_slice()[1..].to_vec();
                let mut values = node.values.as_slice()[1..].to_vec();
                keys.insert(gap - 1, key);
                values.insert(gap - 1, value);
                ReferenceCounter::new(TreeNode::assembled(
                    ArrayStore::from_vec(keys),
                    ArrayStore::from_vec(values),
                    Some(new_left),
                    node.right.clone(),
                ))
            } else {
                let popped_key = node.keys.as_slice()[local_len - 1].clone();
                let popped_value = node.values.as_slice()[local_len - 1].clone();
                let new_right = match &node.right {
                    Some(right) => maybe_balance(
                        updated(right, popped_key, popped_value, if_absent, depth + 1, rebalance),
                        rebalance,
                    ),
                    None => ReferenceCounter::new(TreeNode::single(popped_key, popped_value)),
                };
                let mut keys = node.keys.as_slice()[..local_len - 1].to_vec();
                let mut values = node.values.as_slice()[..local_len - 1].to_vec();
                keys.insert(gap, key);
                values.insert(gap, value);
                ReferenceCounter::new(TreeNode::assembled(
                    ArrayStore::from_vec(keys),
                    ArrayStore::from_vec(values),
                    node.left.clone(),
                    Some(new_right),
                ))
            }
        }
        Probe::Hit(index) => {
            if if_absent || node.values.as_slice()[index] == value {
                return node.clone();
            }
            let values = node.values.with_set(index, value);
            ReferenceCounter::new(node.with_arrays(node.keys.clone(), values))
        }
    }
}

// =============================================================================
// Removal
// =============================================================================

/// Removes at the root and applies the final balance step. Returns the
/// input allocation unchanged when the key is absent and an empty node
/// when the last entry leaves.
pub(crate) fn remove<K, V, Q>(root: &NodeRef<K, V>, key: &Q, rebalance: bool) -> NodeRef<K, V>
where
    K: Borrow<Q> + Ord + Clone,
    Q: Ord + ?Sized,
    V: Clone,
{
    match maybe_balance_nullable(removed(root, key, rebalance), rebalance) {
        Some(node) => node,
        None => ReferenceCounter::new(TreeNode::empty()),
    }
}

fn removed<K, V, Q>(
    node: &NodeRef<K, V>,
    key: &Q,
    rebalance: bool,
) -> Option<NodeRef<K, V>>
where
    K: Borrow<Q> + Ord + Clone,
    Q: Ord + ?Sized,
    V: Clone,
{
    let local_len = node.local_len();
    match probe(node.keys.as_slice(), key) {
        Probe::Left => match &node.left {
            Some(left) => {
                let new_left = maybe_balance_nullable(removed(left, key, rebalance), rebalance);
                if new_left
                    .as_ref()
                    .is_some_and(|updated| ReferenceCounter::ptr_eq(updated, left))
                {
                    Some(node.clone())
                } else {
                    Some(ReferenceCounter::new(node.with_left(new_left)))
                }
            }
            None => Some(node.clone()),
        },
        Probe::Right => match &node.right {
            Some(right) => {
                let new_right = maybe_balance_nullable(removed(right, key, rebalance), rebalance);
                if new_right
                    .as_ref()
                    .is_some_and(|updated| ReferenceCounter::ptr_eq(updated, right))
                {
                    Some(node.clone())
                } else {
                    Some(ReferenceCounter::new(node.with_right(new_right)))
                }
            }
            None => Some(node.clone()),
        },
        Probe::Gap(_) => Some(node.clone()),
        Probe::Hit(index) => {
            if local_len == 1 {
                return Some(removed_last_local_entry(node, rebalance)?);
            }
            let keys = node.keys.with_remove_range(index, index + 1);
            let values = node.values.with_remove_range(index, index + 1);
            Some(ReferenceCounter::new(node.with_arrays(keys, values)))
        }
    }
}

/// Removes a node's only local entry. With one child the child takes the
/// node's place; with two, the in-order neighbour is pulled up from the
/// heavier subtree so only the root of an empty tree ever goes without a
/// local run.
fn removed_last_local_entry<K, V>(
    node: &NodeRef<K, V>,
    rebalance: bool,
) -> Option<NodeRef<K, V>>
where
    K: Ord + Clone,
    V: Clone,
{
    let (left, right) = match (&node.left, &node.right) {
        (None, None) => return None,
        (Some(left), None) => return Some(left.clone()),
        (None, Some(right)) => return Some(right.clone()),
        (Some(left), Some(right)) => (left, right),
    };
    let pulled = if left.size() > right.size() {
        left.last_entry()
    } else {
        right.first_entry()
    };
    let Some((pulled_key, pulled_value)) = pulled else {
        return Some(node.clone());
    };
    let pulled_key = pulled_key.clone();
    let pulled_value = pulled_value.clone();
    let (new_left, new_right) = if left.size() > right.size() {
        (
            maybe_balance_nullable(removed(left, &pulled_key, rebalance), rebalance),
            Some(right.clone()),
        )
    } else {
        (
            Some(left.clone()),
            maybe_balance_nullable(removed(right, &pulled_key, rebalance), rebalance),
        )
    };
    Some(ReferenceCounter::new(TreeNode::assembled(
        ArrayStore::singleton(pulled_key),
        ArrayStore::singleton(pulled_value),
        new_left,
        new_right,
    )))
}

// =============================================================================
// Balancing
// =============================================================================

/// Rotates `node` toward its lighter side, but only when the rotation
/// strictly reduces the subtree size imbalance. Rotations move the
/// node's whole local run down one level, so a rotation that does not
/// pay for itself is skipped.
fn balance<K, V>(node: NodeRef<K, V>) -> NodeRef<K, V> {
    let left_size = subtree_size(&node.left);
    let right_size = subtree_size(&node.right);
    if left_size == right_size {
        return node;
    }
    let local_len = node.local_len();
    if left_size < right_size {
        if let Some(right) = &node.right {
            let imbalance = right_size - left_size;
            let right_left_size = subtree_size(&right.left);
            let new_right_size = right_size - right_left_size - right.local_len();
            let new_left_size = left_size + right_left_size + local_len;
            let new_imbalance = new_left_size.abs_diff(new_right_size);
            if new_imbalance < imbalance {
                let new_left = TreeNode {
                    size: new_left_size,
                    keys: node.keys.clone(),
                    values: node.values.clone(),
                    left: node.left.clone(),
                    right: right.left.clone(),
                };
                return ReferenceCounter::new(TreeNode {
                    size: node.size,
                    keys: right.keys.clone(),
                    values: right.values.clone(),
                    left: Some(ReferenceCounter::new(new_left)),
                    right: right.right.clone(),
                });
            }
        }
    } else if let Some(left) = &node.left {
        let imbalance = left_size - right_size;
        let left_right_size = subtree_size(&left.right);
        let new_left_size = left_size - left_right_size - left.local_len();
        let new_right_size = right_size + left_right_size + local_len;
        let new_imbalance = new_left_size.abs_diff(new_right_size);
        if new_imbalance < imbalance {
            let new_right = TreeNode {
                size: new_right_size,
                keys: node.keys.clone(),
                values: node.values.clone(),
                left: left.right.clone(),
                right: node.right.clone(),
            };
            return ReferenceCounter::new(TreeNode {
                size: node.size,
                keys: left.keys.clone(),
                values: left.values.clone(),
                left: left.left.clone(),
                right: Some(ReferenceCounter::new(new_right)),
            });
        }
    }
    node
}

// =============================================================================
// Iteration
// =============================================================================

struct InOrderFrame<'a, K, V> {
    node: &'a TreeNode<K, V>,
    stage: u8, // 0 = left, 1 = local run, 2 = right, 3 = done
    index: usize,
}

/// In-order traversal, yielding entries in ascending key order.
pub(crate) struct InOrderIter<'a, K, V> {
    stack: Vec<InOrderFrame<'a, K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for InOrderIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let node = frame.node;
            match frame.stage {
                0 => {
                    frame.stage = 1;
                    if let Some(left) = node.left.as_deref() {
                        self.stack.push(InOrderFrame {
                            node: left,
                            stage: 0,
                            index: 0,
                        });
                    }
                }
                1 => {
                    if frame.index < node.keys.len() {
                        let index = frame.index;
                        frame.index += 1;
                        self.remaining -= 1;
                        return Some((
                            &node.keys.as_slice()[index],
                            &node.values.as_slice()[index],
                        ));
                    }
                    frame.stage = 2;
                }
                2 => {
                    frame.stage = 3;
                    if let Some(right) = node.right.as_deref() {
                        self.stack.push(InOrderFrame {
                            node: right,
                            stage: 0,
                            index: 0,
                        });
                    }
                }
                _ => {
                    self.stack.pop();
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for InOrderIter<'_, K, V> {}

// =============================================================================
// Tests
// =============================================================================
