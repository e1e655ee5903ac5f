//! Change metadata for sequence transformations.
//!
//! Every mutation of a [`Tuple`](crate::Tuple) produces a [`SequenceDiff`]
//! describing how the new value was derived from its predecessor: the kind
//! of [`SequenceChange`], the affected index range, and a chained signature
//! that lets an observer prove the diff is the direct successor of the one
//! it last applied. Observers that track a remote mirror of a sequence can
//! use this to apply the single delta instead of re-reading everything.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// SequenceChange
// =============================================================================

/// The kind of transformation a sequence underwent.
///
/// Carried by [`SequenceDiff`] together with the index and item count the
/// change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SequenceChange {
    /// No change; used for the initial state of a lineage.
    None,
    /// Items were inserted.
    Add,
    /// Items were removed.
    Remove,
    /// A contiguous run of items was kept and everything else dropped.
    Retain,
    /// Items were replaced in place.
    Set,
    /// All items were removed.
    Clear,
    /// The items were reordered by sorting.
    Sort,
    /// Duplicate items were removed.
    Distinct,
    /// The item order was reversed.
    Reverse,
}

impl SequenceChange {
    /// Stable per-variant code folded into diff signatures.
    const fn code(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Add => 1,
            Self::Remove => 2,
            Self::Retain => 3,
            Self::Set => 4,
            Self::Clear => 5,
            Self::Sort => 6,
            Self::Distinct => 7,
            Self::Reverse => 8,
        }
    }
}

// =============================================================================
// Version
// =============================================================================

/// Lineage counter shared by every version created in this process.
static LINEAGE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A value-semantic identity made of a lineage and a succession number.
///
/// [`Version::new`] draws a fresh lineage from a process-wide counter and
/// starts its succession at zero; [`Version::next`] and
/// [`Version::previous`] step the succession while keeping the lineage.
/// Two versions compare equal when both numbers match, which lets value
/// objects emulate identity without mutable state.
///
/// # Examples
///
/// ```rust
/// use thicket::Version;
///
/// let first = Version::new();
/// let second = first.next();
///
/// assert!(second.is_direct_successor_of(first));
/// assert_eq!(second.previous(), first);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Version {
    lineage: u64,
    succession: i64,
}

impl Version {
    /// Creates a version with a fresh lineage and a succession of zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lineage: LINEAGE_COUNTER.fetch_add(1, Ordering::Relaxed) + 1,
            succession: 0,
        }
    }

    /// Returns the version one succession step after this one, in the
    /// same lineage.
    #[must_use]
    pub const fn next(self) -> Self {
        Self {
            lineage: self.lineage,
            succession: self.succession + 1,
        }
    }

    /// Returns the version one succession step before this one, in the
    /// same lineage.
    #[must_use]
    pub const fn previous(self) -> Self {
        Self {
            lineage: self.lineage,
            succession: self.succession - 1,
        }
    }

    /// The lineage number, unique per [`Version::new`] call.
    #[must_use]
    pub const fn lineage(self) -> u64 {
        self.lineage
    }

    /// The succession number within the lineage.
    #[must_use]
    pub const fn succession(self) -> i64 {
        self.succession
    }

    /// `true` if `self` is in the same lineage as `other` with a
    /// succession exactly one greater.
    #[must_use]
    pub const fn is_direct_successor_of(self, other: Self) -> bool {
        self.lineage == other.lineage && self.succession == other.succession + 1
    }

    /// `true` if `self` is in the same lineage as `other` with any
    /// greater succession.
    #[must_use]
    pub const fn is_successor_of(self, other: Self) -> bool {
        self.lineage == other.lineage && self.succession > other.succession
    }

    /// `true` if `self` is in the same lineage as `other` with a
    /// succession exactly one less.
    #[must_use]
    pub const fn is_direct_predecessor_of(self, other: Self) -> bool {
        self.lineage == other.lineage && self.succession == other.succession - 1
    }

    /// `true` if `self` is in the same lineage as `other` with any
    /// lesser succession.
    #[must_use]
    pub const fn is_predecessor_of(self, other: Self) -> bool {
        self.lineage == other.lineage && self.succession < other.succession
    }

    /// 64-bit fold of both numbers, used in diff signatures.
    #[allow(clippy::cast_possible_wrap)]
    const fn fold(self) -> i64 {
        (self.lineage as i64)
            .wrapping_mul(31)
            .wrapping_add(self.succession)
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SequenceDiff
// =============================================================================

/// Metadata describing how a sequence was derived from its previous state.
///
/// A diff records the [`SequenceChange`] kind, the index it applies to
/// (`None` for whole-sequence changes like [`SequenceChange::Sort`]), the
/// number of affected items, a [`Version`], and a `signature` chained from
/// the predecessor's signature. The chain makes successorship checkable:
/// [`SequenceDiff::is_direct_successor_of`] recomputes what the successor
/// of `other` would look like and compares it against `self`, so a single
/// missed step anywhere in the history breaks the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SequenceDiff {
    signature: i64,
    version: Version,
    change: SequenceChange,
    index: Option<usize>,
    size: usize,
}

impl SequenceDiff {
    /// Creates the diff describing the initial state of a new lineage.
    #[must_use]
    pub fn initial() -> Self {
        Self::with_signature(Version::new(), SequenceChange::None, None, 0, 0)
    }

    /// Creates the successor diff of `previous` for the given change.
    #[must_use]
    pub fn successor_of(
        previous: &Self,
        change: SequenceChange,
        index: Option<usize>,
        size: usize,
    ) -> Self {
        Self::with_signature(previous.version.next(), change, index, size, previous.signature)
    }

    fn with_signature(
        version: Version,
        change: SequenceChange,
        index: Option<usize>,
        size: usize,
        previous_signature: i64,
    ) -> Self {
        Self {
            signature: Self::fold(version, change, index, size, previous_signature),
            version,
            change,
            index,
            size,
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    fn fold(
        version: Version,
        change: SequenceChange,
        index: Option<usize>,
        size: usize,
        previous_signature: i64,
    ) -> i64 {
        let index_or_minus_one = index.map_or(-1_i64, |value| value as i64);
        let mut result = 1_i64;
        result = result.wrapping_mul(31).wrapping_add(previous_signature);
        result = result.wrapping_mul(31).wrapping_add(version.fold());
        result = result.wrapping_mul(31).wrapping_add(change.code());
        result = result.wrapping_mul(31).wrapping_add(index_or_minus_one);
        result = result.wrapping_mul(31).wrapping_add(size as i64);
        result
    }

    /// `true` if `self` is exactly the diff that applying its own change
    /// on top of `other` would have produced.
    #[must_use]
    pub fn is_direct_successor_of(&self, other: &Self) -> bool {
        let expected = Self::successor_of(other, self.change, self.index, self.size);
        *self == expected
    }

    /// The kind of change this diff describes.
    #[must_use]
    pub const fn change(&self) -> SequenceChange {
        self.change
    }

    /// The index the change applies to, or `None` when the change is not
    /// specific to one location (for example a sort or a reversal).
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        self.index
    }

    /// The number of items affected by the change.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// The version of the sequence state this diff belongs to.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// The chained signature of this diff.
    #[must_use]
    pub const fn signature(&self) -> i64 {
        self.signature
    }
}

impl fmt::Display for SequenceDiff {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "SequenceDiff[signature={:x}, version=[lineage={}, succession={}], change={:?}, index={}, size={}]",
            self.signature,
            self.version.lineage(),
            self.version.succession(),
            self.change,
            self.index.map_or(-1_i64, |value| {
                i64::try_from(value).unwrap_or(i64::MAX)
            }),
            self.size,
        )
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
    fn test_new_versions_have_distinct_lineages() {
        let first = Version::new();
        let second = Version::new();
        assert_ne!(first.lineage(), second.lineage());
        assert_eq!(first.succession(), 0);
        assert_eq!(second.succession(), 0);
    }

    #[rstest]
    fn test_next_and_previous_step_succession() {
        let version = Version::new();
        assert!(version.next().is_direct_successor_of(version));
        assert!(version.previous().is_direct_predecessor_of(version));
        assert_eq!(version.next().previous(), version);
    }

    #[rstest]
    fn test_successor_relations_require_same_lineage() {
        let left = Version::new();
        let right = Version::new();
        assert!(!left.next().is_direct_successor_of(right));
        assert!(!left.next().is_successor_of(right));
    }

    #[rstest]
    fn test_initial_diff_has_no_index() {
        let diff = SequenceDiff::initial();
        assert_eq!(diff.change(), SequenceChange::None);
        assert_eq!(diff.index(), None);
        assert_eq!(diff.size(), 0);
    }

    #[rstest]
    fn test_successor_chain_is_verifiable() {
        let initial = SequenceDiff::initial();
        let added = SequenceDiff::successor_of(&initial, SequenceChange::Add, Some(0), 3);
        let removed = SequenceDiff::successor_of(&added, SequenceChange::Remove, Some(1), 1);

        assert!(added.is_direct_successor_of(&initial));
        assert!(removed.is_direct_successor_of(&added));
        assert!(!removed.is_direct_successor_of(&initial));
        assert!(!added.is_direct_successor_of(&removed));
    }

    #[rstest]
    fn test_forked_lineages_are_not_successors() {
        let shared = SequenceDiff::initial();
        let left = SequenceDiff::successor_of(&shared, SequenceChange::Add, Some(0), 1);
        let other_lineage = SequenceDiff::initial();

        assert!(!left.is_direct_successor_of(&other_lineage));
    }

    #[rstest]
    fn test_signature_depends_on_predecessor() {
        let initial = SequenceDiff::initial();
        let step = SequenceDiff::successor_of(&initial, SequenceChange::Add, Some(0), 1);
        let step_again = SequenceDiff::successor_of(&step, SequenceChange::Add, Some(0), 1);

        assert_ne!(step.signature(), step_again.signature());
    }
}
