//! Integration tests for the insertion-order collections.

use thicket::{LinkedAssociation, LinkedValueSet};

use rstest::rstest;

// =============================================================================
// Insertion Order Tests
// =============================================================================

#[rstest]
fn test_iteration_follows_insertion_order() {
    let map = LinkedAssociation::new()
        .insert("charlie", 3)
        .insert("alpha", 1)
        .insert("bravo", 2);

    let keys: Vec<&str> = map.keys().copied().collect();
    assert_eq!(keys, vec!["charlie", "alpha", "bravo"]);
}

#[rstest]
fn test_update_keeps_the_original_position() {
    let map = LinkedAssociation::new()
        .insert("a", 1)
        .insert("b", 2)
        .insert("a", 100);

    let entries: Vec<(&str, i32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(entries, vec![("a", 100), ("b", 2)]);
}

#[rstest]
fn test_insert_if_absent_keeps_value_and_position() {
    let map = LinkedAssociation::new()
        .insert("a", 1)
        .insert("b", 2)
        .insert_if_absent("a", 100);

    assert_eq!(map.get(&"a"), Some(&1));
    assert_eq!(map.first_key(), Some(&"a"));
}

// =============================================================================
// Removal Splice Tests
// =============================================================================

#[rstest]
fn test_removing_the_middle_splices_neighbours() {
    let map = LinkedAssociation::new()
        .insert("a", 1)
        .insert("b", 2)
        .insert("c", 3);
    let spliced = map.remove(&"b");

    let keys: Vec<&str> = spliced.keys().copied().collect();
    assert_eq!(keys, vec!["a", "c"]);
    assert_eq!(spliced.first_key(), Some(&"a"));
    assert_eq!(spliced.last_key(), Some(&"c"));
}

#[rstest]
fn test_removing_the_head_promotes_the_next_entry() {
    let map = LinkedAssociation::new().insert(1, "one").insert(2, "two");
    let trimmed = map.remove(&1);

    assert_eq!(trimmed.first_key(), Some(&2));
    assert_eq!(trimmed.last_key(), Some(&2));
}

#[rstest]
fn test_removing_the_tail_rewinds_the_last_key() {
    let map = LinkedAssociation::new().insert(1, "one").insert(2, "two");
    let trimmed = map.remove(&2);

    assert_eq!(trimmed.first_key(), Some(&1));
    assert_eq!(trimmed.last_key(), Some(&1));
}

#[rstest]
fn test_removing_everything_resets_the_endpoints() {
    let map = LinkedAssociation::new().insert(1, "one");
    let empty = map.remove(&1);

    assert!(empty.is_empty());
    assert_eq!(empty.first_key(), None);
    assert_eq!(empty.last_key(), None);
}

#[rstest]
fn test_successive_removals_collapse_to_a_single_entry() {
    let map = LinkedAssociation::new()
        .insert("a", 1)
        .insert("b", 2)
        .insert("c", 3);

    let without_middle = map.remove(&"b");
    assert_eq!(without_middle.keys().copied().collect::<Vec<_>>(), vec!["a", "c"]);

    let only_c = without_middle.remove(&"a");
    assert_eq!(only_c.first_key(), Some(&"c"));
    assert_eq!(only_c.last_key(), Some(&"c"));
    assert_eq!(only_c.len(), 1);
}

#[rstest]
fn test_reinsert_after_removal_moves_to_the_back() {
    let map = LinkedAssociation::new()
        .insert("a", 1)
        .insert("b", 2)
        .insert("c", 3)
        .remove(&"a")
        .insert("a", 10);

    let keys: Vec<&str> = map.keys().copied().collect();
    assert_eq!(keys, vec!["b", "c", "a"]);
}

// =============================================================================
// Equality Tests
// =============================================================================

#[rstest]
fn test_equality_is_order_sensitive() {
    let forward = LinkedAssociation::new().insert(1, "a").insert(2, "b");
    let backward = LinkedAssociation::new().insert(2, "b").insert(1, "a");

    assert_ne!(forward, backward);
    assert_eq!(forward, forward.clone());
}

// =============================================================================
// Scale Tests
// =============================================================================

#[rstest]
fn test_long_chain_iterates_completely() {
    let map: LinkedAssociation<i32, i32> = (0..2_000).map(|key| (key, key)).collect();
    let keys: Vec<i32> = map.keys().copied().collect();
    let expected: Vec<i32> = (0..2_000).collect();
    assert_eq!(keys, expected);
}

// =============================================================================
// LinkedValueSet Tests
// =============================================================================

#[rstest]
fn test_linked_set_preserves_first_insertion_order() {
    let set: LinkedValueSet<i32> = [3, 1, 2, 1, 3].into_iter().collect();
    assert_eq!(set.to_vec(), vec![3, 1, 2]);
    assert_eq!(set.first(), Some(&3));
    assert_eq!(set.last(), Some(&2));
}

#[rstest]
fn test_linked_set_remove_closes_the_gap() {
    let set: LinkedValueSet<&str> = ["x", "y", "z"].into_iter().collect();
    let spliced = set.remove(&"y");
    assert_eq!(spliced.to_vec(), vec!["x", "z"]);
}
