//! Integration tests for Version and SequenceDiff.

use thicket::{SequenceChange, SequenceDiff, Version};

use rstest::rstest;

// =============================================================================
// Version Tests
// =============================================================================

#[rstest]
fn test_each_version_starts_a_distinct_lineage() {
    let first = Version::new();
    let second = Version::new();
    assert_ne!(first.lineage(), second.lineage());
}

#[rstest]
fn test_next_and_previous_step_the_succession() {
    let base = Version::new();
    let next = base.next();
    let back = next.previous();

    assert_eq!(next.lineage(), base.lineage());
    assert_eq!(next.succession(), base.succession() + 1);
    assert_eq!(back, base);
}

#[rstest]
fn test_successorship_requires_the_same_lineage() {
    let base = Version::new();
    let stranger = Version::new();

    assert!(base.next().is_direct_successor_of(base));
    assert!(base.is_direct_predecessor_of(base.next()));
    assert!(!stranger.next().is_direct_successor_of(base));
}

#[rstest]
fn test_distant_successors_are_not_direct() {
    let base = Version::new();
    let distant = base.next().next();

    assert!(distant.is_successor_of(base));
    assert!(!distant.is_direct_successor_of(base));
}

// =============================================================================
// SequenceDiff Tests
// =============================================================================

#[rstest]
fn test_initial_diff_describes_no_change() {
    let diff = SequenceDiff::initial();
    assert_eq!(diff.change(), SequenceChange::None);
    assert_eq!(diff.index(), None);
    assert_eq!(diff.size(), 0);
}

#[rstest]
fn test_successor_records_the_change() {
    let initial = SequenceDiff::initial();
    let successor = SequenceDiff::successor_of(&initial, SequenceChange::Add, Some(3), 2);

    assert_eq!(successor.change(), SequenceChange::Add);
    assert_eq!(successor.index(), Some(3));
    assert_eq!(successor.size(), 2);
    assert!(successor.is_direct_successor_of(&initial));
}

#[rstest]
fn test_signature_chain_detects_skipped_steps() {
    let v0 = SequenceDiff::initial();
    let v1 = SequenceDiff::successor_of(&v0, SequenceChange::Add, Some(0), 1);
    let v2 = SequenceDiff::successor_of(&v1, SequenceChange::Remove, Some(0), 1);

    assert!(v2.is_direct_successor_of(&v1));
    assert!(!v2.is_direct_successor_of(&v0));
    assert!(!v1.is_direct_successor_of(&v2));
}

#[rstest]
fn test_same_change_on_different_predecessors_differs() {
    let left = SequenceDiff::initial();
    let right = SequenceDiff::initial();

    let from_left = SequenceDiff::successor_of(&left, SequenceChange::Sort, None, 5);
    let from_right = SequenceDiff::successor_of(&right, SequenceChange::Sort, None, 5);

    assert_ne!(from_left, from_right);
    assert!(!from_left.is_direct_successor_of(&right));
}

#[rstest]
#[case(SequenceChange::Add)]
#[case(SequenceChange::Remove)]
#[case(SequenceChange::Retain)]
#[case(SequenceChange::Set)]
#[case(SequenceChange::Clear)]
#[case(SequenceChange::Sort)]
#[case(SequenceChange::Distinct)]
#[case(SequenceChange::Reverse)]
fn test_every_change_kind_chains(#[case] change: SequenceChange) {
    let initial = SequenceDiff::initial();
    let successor = SequenceDiff::successor_of(&initial, change, Some(1), 1);
    assert_eq!(successor.change(), change);
    assert!(successor.is_direct_successor_of(&initial));
}
