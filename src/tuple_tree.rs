//! Tree-backed persistent sequence.
//!
//! A [`TupleTree`] stores its elements in a 32-way tree whose leaves hold
//! contiguous runs of up to [`IDEAL_LEAF_NODE_SIZE`] elements. Positional
//! access walks cumulative child sizes, so reads are O(log n); edits copy
//! only the nodes on the path to the touched children and share the rest.
//!
//! A sequence built in one go from a known collection starts as a single
//! densely packed leaf, whatever its size. Only when a later edit grows a
//! leaf past the ideal size is that leaf rebuilt into an even 32-way
//! subtree, so read-mostly sequences keep the flat, cache-friendly
//! layout.

use crate::store::ArrayStore;
use crate::ReferenceCounter;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

const BRANCHING_FACTOR: usize = 32;
const IDEAL_LEAF_NODE_SIZE: usize = 512;

type NodeRef<T> = ReferenceCounter<Node<T>>;
type Child<T> = Option<NodeRef<T>>;

// =============================================================================
// Node
// =============================================================================

enum Node<T> {
    Leaf(ArrayStore<T>),
    Branch {
        size: usize,
        children: ArrayStore<Child<T>>,
    },
}

impl<T> Node<T> {
    fn empty_leaf() -> Self {
        Node::Leaf(ArrayStore::new())
    }

    fn branch(children: Vec<Child<T>>) -> Self {
        let size = children
            .iter()
            .flatten()
            .map(|child| child.size())
            .sum();
        Node::Branch {
            size,
            children: ArrayStore::from_vec(children),
        }
    }

    fn size(&self) -> usize {
        match self {
            Node::Leaf(items) => items.len(),
            Node::Branch { size, .. } => *size,
        }
    }

    fn lookup(&self, index: usize) -> Option<&T> {
        match self {
            Node::Leaf(items) => items.get(index),
            Node::Branch { children, .. } => {
                let mut start = 0;
                for child in children.iter().flatten() {
                    let size = child.size();
                    if index < start + size {
                        return child.lookup(index - start);
                    }
                    start += size;
                }
                None
            }
        }
    }
}

/// Builds a subtree for freshly materialized elements: a single leaf
/// below the ideal size, otherwise an even 32-way split with the last
/// child absorbing the remainder.
fn build<T: Clone>(items: &[T]) -> NodeRef<T> {
    if items.len() < IDEAL_LEAF_NODE_SIZE {
        return ReferenceCounter::new(Node::Leaf(ArrayStore::from_vec(items.to_vec())));
    }
    let step = items.len() / BRANCHING_FACTOR;
    let mut children = Vec::with_capacity(BRANCHING_FACTOR);
    for i in 0..BRANCHING_FACTOR {
        let start = i * step;
        let end = if i == BRANCHING_FACTOR - 1 {
            items.len()
        } else {
            (i + 1) * step
        };
        children.push(Some(build(&items[start..end])));
    }
    ReferenceCounter::new(Node::branch(children))
}

/// Slices `from..to` out of the subtree. Children outside the window are
/// dropped; a full-leaf slice returns the input allocation. The caller
/// guarantees a non-empty in-bounds window.
fn sliced<T: Clone>(node: &NodeRef<T>, from: usize, to: usize) -> Child<T> {
    match &**node {
        Node::Leaf(items) => {
            if from == 0 && to == items.len() {
                Some(node.clone())
            } else {
                Some(ReferenceCounter::new(Node::Leaf(items.slice(from, to))))
            }
        }
        Node::Branch { children, .. } => {
            let mut new_children: Vec<Child<T>> = vec![None; children.len()];
            let mut any = false;
            let mut start = 0;
            for (i, child) in children.iter().enumerate() {
                let Some(child) = child else { continue };
                if start >= to {
                    break;
                }
                let size = child.size();
                if from < start + size {
                    let child_from = from.saturating_sub(start);
                    let child_to = (to - start).min(size);
                    if child_from < child_to {
                        new_children[i] = sliced(child, child_from, child_to);
                        any |= new_children[i].is_some();
                    }
                }
                start += size;
            }
            if any {
                Some(ReferenceCounter::new(Node::branch(new_children)))
            } else {
                None
            }
        }
    }
}

/// Removes `from..to` from the subtree. Returns the input allocation
/// when nothing intersects and `None` when the subtree drains. A leaf
/// left above the ideal size by the removal is rebuilt into a subtree.
fn removed_range<T: Clone>(node: &NodeRef<T>, from: usize, to: usize) -> Child<T> {
    if from >= to {
        return Some(node.clone());
    }
    match &**node {
        Node::Leaf(items) => {
            let removed = to - from;
            if removed == items.len() {
                return None;
            }
            let remaining = items.len() - removed;
            if remaining > IDEAL_LEAF_NODE_SIZE {
                let mut stitched = Vec::with_capacity(remaining);
                stitched.extend_from_slice(&items.as_slice()[..from]);
                stitched.extend_from_slice(&items.as_slice()[to..]);
                return Some(build(&stitched));
            }
            Some(ReferenceCounter::new(Node::Leaf(
                items.with_remove_range(from, to),
            )))
        }
        Node::Branch { children, .. } => {
            let mut new_children: Option<Vec<Child<T>>> = None;
            let mut start = 0;
            for (i, child) in children.iter().enumerate() {
                let Some(child) = child else { continue };
                if start >= to {
                    break;
                }
                let size = child.size();
                if from < start + size {
                    let child_from = from.saturating_sub(start);
                    let child_to = (to - start).min(size);
                    if child_from < child_to {
                        let updated = removed_range(child, child_from, child_to);
                        new_children
                            .get_or_insert_with(|| children.to_vec())[i] = updated;
                    }
                }
                start += size;
            }
            match new_children {
                None => Some(node.clone()),
                Some(new_children) => {
                    if new_children.iter().all(Option::is_none) {
                        None
                    } else {
                        Some(ReferenceCounter::new(Node::branch(new_children)))
                    }
                }
            }
        }
    }
}

/// Splices `items` in at `index`. A leaf grown past the ideal size is
/// rebuilt into a subtree; a branch forwards the whole insertion to the
/// single child whose range covers the index.
fn added_all_at<T: Clone>(node: &NodeRef<T>, index: usize, items: &[T]) -> NodeRef<T> {
    match &**node {
        Node::Leaf(data) => {
            let grown = data.len() + items.len();
            if grown > IDEAL_LEAF_NODE_SIZE {
                let mut stitched = Vec::with_capacity(grown);
                stitched.extend_from_slice(&data.as_slice()[..index]);
                stitched.extend_from_slice(items);
                stitched.extend_from_slice(&data.as_slice()[index..]);
                return build(&stitched);
            }
            ReferenceCounter::new(Node::Leaf(data.with_splice_at(index, items)))
        }
        Node::Branch { children, .. } => {
            // The last child whose range touches the index wins, so an
            // insertion at a boundary lands in the later child.
            let mut best: Option<(usize, usize)> = None;
            let mut start = 0;
            for (i, child) in children.iter().enumerate() {
                let Some(child) = child else { continue };
                let next = start + child.size();
                if start <= index && index <= next {
                    best = Some((i, start));
                }
                start = next;
            }
            let Some((best_index, best_start)) = best else {
                return build(items);
            };
            let replacement = match &children.as_slice()[best_index] {
                Some(child) => added_all_at(child, index - best_start, items),
                None => build(items),
            };
            let mut new_children = children.to_vec();
            new_children[best_index] = Some(replacement);
            ReferenceCounter::new(Node::branch(new_children))
        }
    }
}

/// Overwrites elements starting at `index` with `items[offset..]`, as
/// far as both the subtree and the items reach. Returns the input
/// allocation when every touched element already compares equal.
fn set_all_at<T: Clone + PartialEq>(
    node: &NodeRef<T>,
    index: usize,
    offset: usize,
    items: &[T],
) -> NodeRef<T> {
    match &**node {
        Node::Leaf(data) => {
            let count = items
                .len()
                .saturating_sub(offset)
                .min(data.len().saturating_sub(index));
            if count == 0 {
                return node.clone();
            }
            let source = &items[offset..offset + count];
            let target = &data.as_slice()[index..index + count];
            if source == target {
                return node.clone();
            }
            let mut updated = data.to_vec();
            updated[index..index + count].clone_from_slice(source);
            ReferenceCounter::new(Node::Leaf(ArrayStore::from_vec(updated)))
        }
        Node::Branch { children, .. } => {
            let end_index = index + items.len();
            let mut new_children: Option<Vec<Child<T>>> = None;
            let mut start = 0;
            for (i, child) in children.iter().enumerate() {
                let Some(child) = child else { continue };
                let next = start + child.size();
                if end_index <= start {
                    break;
                }
                let updated = if start <= index && index < next {
                    Some(set_all_at(child, index - start, offset, items))
                } else if index < start && start < next.min(end_index + 1) {
                    // The window opened in an earlier child; this one
                    // continues it from its first element.
                    Some(set_all_at(child, 0, offset + (start - index), items))
                } else {
                    None
                };
                if let Some(updated) = updated {
                    if !ReferenceCounter::ptr_eq(&updated, child) {
                        new_children.get_or_insert_with(|| children.to_vec())[i] = Some(updated);
                    }
                }
                start = next;
            }
            match new_children {
                None => node.clone(),
                Some(new_children) => ReferenceCounter::new(Node::branch(new_children)),
            }
        }
    }
}

// =============================================================================
// TupleTree Definition
// =============================================================================

/// A persistent indexable sequence with structural sharing.
///
/// Reads are O(log n); edits copy only the root-to-leaf path of the
/// touched range. Operations taking indices return `None` when the index
/// or range is out of bounds, and edits that change nothing return a
/// value sharing the receiver's root allocation, observable through
/// [`TupleTree::ptr_eq`].
///
/// # Examples
///
/// ```rust
/// use thicket::TupleTree;
///
/// let sequence: TupleTree<i32> = (0..10).collect();
/// let edited = sequence.set_at(3, 99).unwrap();
///
/// assert_eq!(sequence.get(3), Some(&3));  // Original unchanged
/// assert_eq!(edited.get(3), Some(&99));
/// assert_eq!(sequence.slice(2, 5).unwrap().to_vec(), vec![2, 3, 4]);
/// ```
pub struct TupleTree<T> {
    size: usize,
    root: NodeRef<T>,
}

impl<T> TupleTree<T> {
    /// Creates an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self {
            size: 0,
            root: ReferenceCounter::new(Node::empty_leaf()),
        }
    }

    /// Creates a sequence from a vector, as a single densely packed
    /// leaf.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            size: items.len(),
            root: ReferenceCounter::new(Node::Leaf(ArrayStore::from_vec(items))),
        }
    }

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the sequence holds no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns a reference to the element at `index`, or `None` if
    /// `index` is out of range.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.size {
            return None;
        }
        self.root.lookup(index)
    }

    /// Returns the first element, or `None` if the sequence is empty.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns the last element, or `None` if the sequence is empty.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.size.checked_sub(1).and_then(|index| self.get(index))
    }

    /// Returns an empty sequence.
    #[must_use]
    pub fn clear(&self) -> Self {
        Self::new()
    }

    /// Returns `true` if both sequences share the same root allocation.
    #[inline]
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        ReferenceCounter::ptr_eq(&this.root, &other.root)
    }

    /// Returns an iterator over the elements in order.
    pub fn iter(&self) -> TupleTreeIterator<'_, T> {
        let mut stack = Vec::new();
        if self.size > 0 {
            stack.push((&*self.root, 0));
        }
        TupleTreeIterator {
            stack,
            remaining: self.size,
        }
    }
}

impl<T: Clone> TupleTree<T> {
    /// Returns the subsequence `from..to`, or `None` if the range is out
    /// of bounds or inverted.
    ///
    /// A full-range slice shares the receiver's root allocation; any
    /// other slice copies only the boundary leaves and shares every
    /// fully contained subtree.
    #[must_use]
    pub fn slice(&self, from: usize, to: usize) -> Option<Self> {
        if from > to || to > self.size {
            return None;
        }
        let new_size = to - from;
        if new_size == self.size {
            return Some(self.clone());
        }
        if new_size == 0 {
            return Some(Self::new());
        }
        let root = sliced(&self.root, from, to)
            .unwrap_or_else(|| ReferenceCounter::new(Node::empty_leaf()));
        Some(Self {
            size: new_size,
            root,
        })
    }

    /// Returns the sequence without the elements in `from..to`, or
    /// `None` if the range is out of bounds or inverted.
    #[must_use]
    pub fn remove_range(&self, from: usize, to: usize) -> Option<Self> {
        if from > to || to > self.size {
            return None;
        }
        let removed = to - from;
        if removed == 0 {
            return Some(self.clone());
        }
        if removed == self.size {
            return Some(Self::new());
        }
        let root = removed_range(&self.root, from, to)
            .unwrap_or_else(|| ReferenceCounter::new(Node::empty_leaf()));
        if ReferenceCounter::ptr_eq(&root, &self.root) {
            return Some(self.clone());
        }
        Some(Self {
            size: self.size - removed,
            root,
        })
    }

    /// Returns the sequence without the element at `index`, or `None`
    /// if `index` is out of range.
    #[must_use]
    pub fn remove_at(&self, index: usize) -> Option<Self> {
        if index >= self.size {
            return None;
        }
        self.remove_range(index, index + 1)
    }

    /// Returns the sequence with `item` inserted at `index` (which may
    /// equal the length to append), or `None` if `index` is out of
    /// range.
    #[must_use]
    pub fn add_at(&self, index: usize, item: T) -> Option<Self> {
        self.add_all_at(index, &[item])
    }

    /// Returns the sequence with `item` appended.
    #[must_use]
    pub fn add(&self, item: T) -> Self {
        // Appending at the length is always in range.
        match self.add_at(self.size, item) {
            Some(appended) => appended,
            None => self.clone(),
        }
    }

    /// Returns the sequence with all of `items` inserted at `index`, or
    /// `None` if `index` is out of range.
    #[must_use]
    pub fn add_all_at(&self, index: usize, items: &[T]) -> Option<Self> {
        if index > self.size {
            return None;
        }
        if items.is_empty() {
            return Some(self.clone());
        }
        let root = added_all_at(&self.root, index, items);
        Some(Self {
            size: self.size + items.len(),
            root,
        })
    }

    /// Returns the sequence sorted by the given comparator.
    #[must_use]
    pub fn sort_by<F>(&self, compare: F) -> Self
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut items = self.to_vec();
        items.sort_by(compare);
        Self {
            size: items.len(),
            root: build(&items),
        }
    }

    /// Collects the elements into a vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T: Clone + PartialEq> TupleTree<T> {
    /// Returns the sequence with the element at `index` replaced, or
    /// `None` if `index` is out of range.
    ///
    /// Setting an element to an equal value shares the receiver's root
    /// allocation.
    #[must_use]
    pub fn set_at(&self, index: usize, item: T) -> Option<Self> {
        if index >= self.size {
            return None;
        }
        self.set_all_at(index, &[item])
    }

    /// Returns the sequence with the elements starting at `index`
    /// replaced by `items`, or `None` if the window runs past the end.
    #[must_use]
    pub fn set_all_at(&self, index: usize, items: &[T]) -> Option<Self> {
        if index + items.len() > self.size {
            return None;
        }
        if items.is_empty() {
            return Some(self.clone());
        }
        let root = set_all_at(&self.root, index, 0, items);
        if ReferenceCounter::ptr_eq(&root, &self.root) {
            return Some(self.clone());
        }
        Some(Self {
            size: self.size,
            root,
        })
    }

    /// Returns the sequence without any element equal to one of `items`.
    ///
    /// If nothing matches, the returned sequence shares the receiver's
    /// root allocation.
    #[must_use]
    pub fn remove_all(&self, items: &[T]) -> Self {
        if items.is_empty() {
            return self.clone();
        }
        let kept: Vec<T> = self
            .iter()
            .filter(|element| !items.contains(element))
            .cloned()
            .collect();
        if kept.len() == self.size {
            return self.clone();
        }
        Self {
            size: kept.len(),
            root: build(&kept),
        }
    }

    /// Returns the sequence keeping only elements equal to one of
    /// `items`, preserving order and duplicates.
    ///
    /// If everything is kept, the returned sequence shares the
    /// receiver's root allocation.
    #[must_use]
    pub fn retain_all(&self, items: &[T]) -> Self {
        if items.is_empty() {
            return Self::new();
        }
        let kept: Vec<T> = self
            .iter()
            .filter(|element| items.contains(element))
            .cloned()
            .collect();
        if kept.len() == self.size {
            return self.clone();
        }
        Self {
            size: kept.len(),
            root: build(&kept),
        }
    }

    /// Returns `true` if the sequence contains an element equal to
    /// `item`.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.iter().any(|element| element == item)
    }

    /// Returns the index of the first element equal to `item`, if any.
    #[must_use]
    pub fn first_index_of(&self, item: &T) -> Option<usize> {
        self.iter().position(|element| element == item)
    }

    /// Returns the elements in reverse order.
    ///
    /// A sequence of fewer than two elements shares the receiver's root
    /// allocation.
    #[must_use]
    pub fn reversed(&self) -> Self {
        if self.size < 2 {
            return self.clone();
        }
        let mut items = self.to_vec();
        items.reverse();
        Self {
            size: items.len(),
            root: build(&items),
        }
    }
}

impl<T: Clone + Ord> TupleTree<T> {
    /// Returns the sequence sorted by the natural order.
    #[must_use]
    pub fn sort(&self) -> Self {
        self.sort_by(Ord::cmp)
    }
}

impl<T: Clone + Hash + Eq> TupleTree<T> {
    /// Returns the sequence with duplicate elements removed, keeping the
    /// first occurrence of each.
    #[must_use]
    pub fn make_distinct(&self) -> Self {
        let mut seen = HashSet::new();
        let kept: Vec<T> = self
            .iter()
            .filter(|element| seen.insert((*element).clone()))
            .cloned()
            .collect();
        if kept.len() == self.size {
            return self.clone();
        }
        Self {
            size: kept.len(),
            root: build(&kept),
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<T> Clone for TupleTree<T> {
    fn clone(&self) -> Self {
        Self {
            size: self.size,
            root: self.root.clone(),
        }
    }
}

impl<T> Default for TupleTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for TupleTree<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for TupleTree<T> {
    fn eq(&self, other: &Self) -> bool {
        if Self::ptr_eq(self, other) {
            return true;
        }
        if self.size != other.size {
            return false;
        }
        // Two densely packed sequences compare as flat slices.
        if let (Node::Leaf(left), Node::Leaf(right)) = (&*self.root, &*other.root) {
            return left == right;
        }
        self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for TupleTree<T> {}

impl<T: Hash> Hash for TupleTree<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.size);
        for element in self.iter() {
            element.hash(state);
        }
    }
}

impl<T> FromIterator<T> for TupleTree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iterable: I) -> Self {
        Self::from_vec(iterable.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a TupleTree<T> {
    type Item = &'a T;
    type IntoIter = TupleTreeIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Iteration
// =============================================================================

/// Iterator over the elements of a [`TupleTree`], in order.
pub struct TupleTreeIterator<'a, T> {
    stack: Vec<(&'a Node<T>, usize)>,
    remaining: usize,
}

impl<'a, T> Iterator for TupleTreeIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node_slot, index) = self.stack.last_mut()?;
            // Copy the long-lived node reference out of the stack borrow.
            let node: &'a Node<T> = *node_slot;
            match node {
                Node::Leaf(items) => {
                    if *index < items.len() {
                        let current = *index;
                        *index += 1;
                        self.remaining -= 1;
                        return Some(&items.as_slice()[current]);
                    }
                    self.stack.pop();
                }
                Node::Branch { children, .. } => {
                    if *index < children.len() {
                        let current = *index;
                        *index += 1;
                        if let Some(child) = children.as_slice()[current].as_ref() {
                            self.stack.push((child, 0));
                        }
                    } else {
                        self.stack.pop();
                    }
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for TupleTreeIterator<'_, T> {}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for TupleTree<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;

        let mut sequence = serializer.serialize_seq(Some(self.size))?;
        for element in self {
            sequence.serialize_element(element)?;
        }
        sequence.end()
    }
}

#[cfg(feature = "serde")]
impl<'de, T: serde::Deserialize<'de>> serde::Deserialize<'de> for TupleTree<T> {
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
    fn test_from_vec_starts_as_a_single_leaf() {
        let sequence: TupleTree<i32> = (0..2000).collect();
        assert!(matches!(&*sequence.root, Node::Leaf(_)));
        assert_eq!(sequence.len(), 2000);
        assert_eq!(sequence.get(1999), Some(&1999));
    }

    #[rstest]
    fn test_edits_split_an_oversized_leaf() {
        let sequence: TupleTree<i32> = (0..2000).collect();
        let edited = sequence.add_at(1000, -1).unwrap();
        assert!(matches!(&*edited.root, Node::Branch { .. }));
        assert_eq!(edited.len(), 2001);
        assert_eq!(edited.get(1000), Some(&-1));
        assert_eq!(edited.get(1001), Some(&1000));
    }

    #[rstest]
    fn test_out_of_range_operations_return_none() {
        let sequence: TupleTree<i32> = (0..5).collect();
        assert!(sequence.get(5).is_none());
        assert!(sequence.set_at(5, 0).is_none());
        assert!(sequence.add_at(6, 0).is_none());
        assert!(sequence.slice(2, 6).is_none());
        assert!(sequence.slice(4, 2).is_none());
        assert!(sequence.remove_range(0, 6).is_none());
    }

    #[rstest]
    fn test_full_range_slice_shares_the_root() {
        let sequence: TupleTree<i32> = (0..10).collect();
        let same = sequence.slice(0, 10).unwrap();
        assert!(TupleTree::ptr_eq(&sequence, &same));
    }

    #[rstest]
    fn test_set_to_equal_value_shares_the_root() {
        let sequence: TupleTree<i32> = (0..10).collect();
        let same = sequence.set_at(4, 4).unwrap();
        assert!(TupleTree::ptr_eq(&sequence, &same));
    }

    #[rstest]
    fn test_remove_range_keeps_the_rest_in_order() {
        let sequence: TupleTree<i32> = (0..10).collect();
        let trimmed = sequence.remove_range(3, 7).unwrap();
        assert_eq!(trimmed.to_vec(), vec![0, 1, 2, 7, 8, 9]);
        assert_eq!(sequence.len(), 10);
    }

    #[rstest]
    fn test_add_all_at_splices_in_order() {
        let sequence: TupleTree<i32> = vec![1, 5].into_iter().collect();
        let grown = sequence.add_all_at(1, &[2, 3, 4]).unwrap();
        assert_eq!(grown.to_vec(), vec![1, 2, 3, 4, 5]);
    }

    #[rstest]
    fn test_set_all_at_overwrites_a_window() {
        let sequence: TupleTree<i32> = (0..8).collect();
        let patched = sequence.set_all_at(2, &[20, 30, 40]).unwrap();
        assert_eq!(patched.to_vec(), vec![0, 1, 20, 30, 40, 5, 6, 7]);
    }

    #[rstest]
    fn test_set_all_at_spanning_leaves_of_a_split_tree() {
        let base: TupleTree<i32> = (0..600).collect();
        let split = base.add_at(0, -1).unwrap(); // forces a 32-way split
        let patch: Vec<i32> = (0..100).map(|i| 10_000 + i).collect();
        let patched = split.set_all_at(250, &patch).unwrap();

        for (i, expected) in patch.iter().enumerate() {
            assert_eq!(patched.get(250 + i), Some(expected));
        }
        assert_eq!(patched.get(249), split.get(249).copied().as_ref());
        assert_eq!(patched.get(350), split.get(350).copied().as_ref());
        assert_eq!(patched.len(), split.len());
    }

    #[rstest]
    fn test_slice_shares_fully_contained_children() {
        let base: TupleTree<i32> = (0..600).collect();
        let branchy = base.add_at(0, -1).unwrap();
        let window = branchy.slice(20, 580).unwrap();

        let Node::Branch { children: original, .. } = &*branchy.root else {
            panic!("edited tree should have split into a branch");
        };
        let Node::Branch { children: sliced, .. } = &*window.root else {
            panic!("a partial slice of a branch stays a branch");
        };

        // Children strictly inside the window are shared by reference,
        // not copied.
        let shared = original
            .iter()
            .zip(sliced.iter())
            .filter(|(left, right)| match (left, right) {
                (Some(left), Some(right)) => ReferenceCounter::ptr_eq(left, right),
                _ => false,
            })
            .count();
        assert!(shared > 20, "only {shared} children were shared");
    }

    #[rstest]
    fn test_remove_all_and_retain_all() {
        let sequence: TupleTree<i32> = vec![1, 2, 3, 2, 4].into_iter().collect();
        assert_eq!(sequence.remove_all(&[2]).to_vec(), vec![1, 3, 4]);
        assert_eq!(sequence.retain_all(&[2, 3]).to_vec(), vec![2, 3, 2]);
        assert!(sequence.retain_all(&[]).is_empty());
    }

    #[rstest]
    fn test_sort_reverse_distinct() {
        let sequence: TupleTree<i32> = vec![3, 1, 2, 1].into_iter().collect();
        assert_eq!(sequence.sort().to_vec(), vec![1, 1, 2, 3]);
        assert_eq!(sequence.reversed().to_vec(), vec![1, 2, 1, 3]);
        assert_eq!(sequence.make_distinct().to_vec(), vec![3, 1, 2]);
    }

    #[rstest]
    fn test_iteration_matches_positional_access() {
        let base: TupleTree<i32> = (0..1000).collect();
        let split = base.add_at(500, -1).unwrap();
        let collected: Vec<i32> = split.iter().copied().collect();
        let fetched: Vec<i32> = (0..split.len())
            .map(|i| *split.get(i).unwrap())
            .collect();
        assert_eq!(collected, fetched);
    }
}
