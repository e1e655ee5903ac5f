//! # thicket
//!
//! Persistent value collections with structural sharing.
//!
//! ## Overview
//!
//! This library provides a family of immutable collections in which every
//! "mutating" operation returns a new value that shares all untouched
//! structure with its predecessor:
//!
//! - [`Association`]: hash-trie map (depth-salted double hashing)
//! - [`ValueSet`]: hash-trie set
//! - [`SortedAssociation`]: balanced ordered map with self-limiting rebalancing
//! - [`OrderedAssociation`]: ordered map without active rebalancing
//! - [`SortedValueSet`]: balanced ordered set
//! - [`LinkedAssociation`] / [`LinkedValueSet`]: insertion-order views
//! - [`TupleTree`]: tree-backed indexable sequence
//! - [`Tuple`]: sequence that tracks a [`SequenceDiff`] per operation
//!
//! ## Value Semantics
//!
//! No operation mutates state reachable from a previously returned value.
//! Reads are therefore safe for unlimited concurrent callers, and writers
//! on different versions of the same logical collection never interact.
//! A no-op write returns a value sharing the same root allocation, which
//! callers can observe through the `ptr_eq` associated functions.
//!
//! ## Feature Flags
//!
//! - `arc`: use `Arc` instead of `Rc` internally, making collections
//!   `Send + Sync` when their elements are
//! - `serde`: `Serialize`/`Deserialize` implementations
//!
//! ## Example
//!
//! ```rust
//! use thicket::Association;
//!
//! let map = Association::new()
//!     .insert("one".to_string(), 1)
//!     .insert("two".to_string(), 2);
//!
//! // Structural sharing: the original map is preserved
//! let updated = map.insert("one".to_string(), 100);
//! assert_eq!(map.get("one"), Some(&1));
//! assert_eq!(updated.get("one"), Some(&100));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod association;
mod diff;
mod hamt;
mod linked_association;
mod linked_value_set;
mod sorted_association;
mod sorted_tree;
mod sorted_value_set;
mod store;
mod tuple;
mod tuple_tree;
mod value_set;

pub use association::Association;
pub use association::AssociationIterator;
pub use diff::SequenceChange;
pub use diff::SequenceDiff;
pub use diff::Version;
pub use linked_association::LinkedAssociation;
pub use linked_association::LinkedAssociationIterator;
pub use linked_value_set::LinkedValueSet;
pub use linked_value_set::LinkedValueSetIterator;
pub use sorted_association::OrderedAssociation;
pub use sorted_association::SortedAssociation;
pub use sorted_association::SortedAssociationIterator;
pub use sorted_value_set::SortedValueSet;
pub use sorted_value_set::SortedValueSetIterator;
pub use store::ArrayStore;
pub use tuple::Tuple;
pub use tuple_tree::TupleTree;
pub use tuple_tree::TupleTreeIterator;
pub use value_set::ValueSet;
pub use value_set::ValueSetIterator;

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use thicket::prelude::*;
/// ```
pub mod prelude {
    pub use crate::Association;
    pub use crate::LinkedAssociation;
    pub use crate::LinkedValueSet;
    pub use crate::OrderedAssociation;
    pub use crate::SequenceChange;
    pub use crate::SequenceDiff;
    pub use crate::SortedAssociation;
    pub use crate::SortedValueSet;
    pub use crate::Tuple;
    pub use crate::TupleTree;
    pub use crate::ValueSet;
    pub use crate::Version;
}

// =============================================================================
// Send / Sync expectations
// =============================================================================

#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(Association<i32, i32>: Send, Sync);
#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(TupleTree<String>: Send, Sync);

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(Association<i32, i32>: Send, Sync);
#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(TupleTree<String>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================
