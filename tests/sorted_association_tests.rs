//! Integration tests for SortedAssociation and OrderedAssociation.

use thicket::{OrderedAssociation, SortedAssociation, SortedValueSet};

use rstest::rstest;

// =============================================================================
// Basic Construction Tests
// =============================================================================

#[rstest]
fn test_new_creates_empty_map() {
    let map: SortedAssociation<i32, String> = SortedAssociation::new();
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    assert_eq!(map.first(), None);
    assert_eq!(map.last(), None);
}

#[rstest]
fn test_from_iterator_sorts_entries() {
    let map: SortedAssociation<i32, i32> = [(3, 30), (1, 10), (2, 20)].into_iter().collect();
    let keys: Vec<i32> = map.keys().copied().collect();
    assert_eq!(keys, vec![1, 2, 3]);
}

// =============================================================================
// Ordered Access Tests
// =============================================================================

#[rstest]
fn test_iteration_is_ascending() {
    let map: SortedAssociation<i32, i32> = (0..200).rev().map(|key| (key, key)).collect();
    let keys: Vec<i32> = map.keys().copied().collect();
    let expected: Vec<i32> = (0..200).collect();
    assert_eq!(keys, expected);
}

#[rstest]
fn test_first_and_last_entries() {
    let map: SortedAssociation<i32, &str> =
        [(5, "five"), (1, "one"), (9, "nine")].into_iter().collect();
    assert_eq!(map.first(), Some((&1, &"one")));
    assert_eq!(map.last(), Some((&9, &"nine")));
}

#[rstest]
fn test_borrowed_key_lookup() {
    let map = SortedAssociation::new().insert("alpha".to_string(), 1);
    assert_eq!(map.get("alpha"), Some(&1));
    assert!(map.contains_key("alpha"));
}

// =============================================================================
// Insert and Remove Tests
// =============================================================================

#[rstest]
fn test_insert_preserves_the_original() {
    let base: SortedAssociation<i32, i32> = (0..10).map(|key| (key, key)).collect();
    let updated = base.insert(5, 500);

    assert_eq!(base.get(&5), Some(&5));
    assert_eq!(updated.get(&5), Some(&500));
}

#[rstest]
fn test_equal_value_insert_shares_the_root() {
    let base = SortedAssociation::new().insert(1, "one");
    let same = base.insert(1, "one");
    assert!(SortedAssociation::ptr_eq(&base, &same));
}

#[rstest]
fn test_insert_if_absent_keeps_existing_values() {
    let base = SortedAssociation::new().insert(1, "original");
    let attempted = base.insert_if_absent(1, "replacement");
    assert_eq!(attempted.get(&1), Some(&"original"));
    assert!(SortedAssociation::ptr_eq(&base, &attempted));
}

#[rstest]
fn test_remove_missing_key_shares_the_root() {
    let base: SortedAssociation<i32, i32> = (0..10).map(|key| (key, key)).collect();
    let same = base.remove(&99);
    assert!(SortedAssociation::ptr_eq(&base, &same));
}

#[rstest]
fn test_interleaved_inserts_and_removals_stay_ordered() {
    let mut map: SortedAssociation<i32, i32> = SortedAssociation::new();
    for key in 0..300 {
        map = map.insert(key, key);
    }
    for key in (0..300).step_by(2) {
        map = map.remove(&key);
    }

    let keys: Vec<i32> = map.keys().copied().collect();
    let expected: Vec<i32> = (0..300).filter(|key| key % 2 == 1).collect();
    assert_eq!(keys, expected);
}

// =============================================================================
// Scale Tests
// =============================================================================

#[rstest]
fn test_ten_thousand_ascending_keys() {
    // Ascending insertion is the worst case for an unbalanced tree;
    // the self-balancing variant must stay fast and fully ordered.
    let map: SortedAssociation<i32, i32> = (0..10_000).map(|key| (key, key * 2)).collect();

    assert_eq!(map.len(), 10_000);
    assert_eq!(map.get(&0), Some(&0));
    assert_eq!(map.get(&9_999), Some(&19_998));
    let keys: Vec<i32> = map.keys().copied().collect();
    let expected: Vec<i32> = (0..10_000).collect();
    assert_eq!(keys, expected);
}

// =============================================================================
// OrderedAssociation Tests
// =============================================================================

#[rstest]
fn test_ordered_association_behaves_like_sorted() {
    let sorted: SortedAssociation<i32, i32> = (0..500).rev().map(|key| (key, key)).collect();
    let ordered: OrderedAssociation<i32, i32> = (0..500).rev().map(|key| (key, key)).collect();

    assert_eq!(sorted.to_btree_map(), ordered.to_btree_map());
    assert_eq!(ordered.first(), Some((&0, &0)));
    assert_eq!(ordered.last(), Some((&499, &499)));
}

#[rstest]
fn test_ordered_association_survives_adversarial_order() {
    // Without active rebalancing the tree can lean, but every operation
    // must still be correct.
    let mut map: OrderedAssociation<i32, i32> = OrderedAssociation::new();
    for key in 0..2_000 {
        map = map.insert(key, key);
    }
    for key in 500..1_500 {
        map = map.remove(&key);
    }

    assert_eq!(map.len(), 1_000);
    assert_eq!(map.get(&499), Some(&499));
    assert_eq!(map.get(&500), None);
    assert_eq!(map.get(&1_500), Some(&1_500));
}

// =============================================================================
// Equality Tests
// =============================================================================

#[rstest]
fn test_equality_ignores_insertion_order() {
    let forward: SortedAssociation<i32, i32> = (0..100).map(|key| (key, key)).collect();
    let backward: SortedAssociation<i32, i32> = (0..100).rev().map(|key| (key, key)).collect();
    assert_eq!(forward, backward);
}

// =============================================================================
// SortedValueSet Tests
// =============================================================================

#[rstest]
fn test_sorted_value_set_deduplicates_and_orders() {
    let set: SortedValueSet<i32> = [5, 3, 5, 1, 3].into_iter().collect();
    let elements: Vec<i32> = set.iter().copied().collect();
    assert_eq!(elements, vec![1, 3, 5]);
    assert_eq!(set.len(), 3);
}

#[rstest]
fn test_sorted_value_set_range_endpoints() {
    let set: SortedValueSet<i32> = (0..1_000).rev().collect();
    assert_eq!(set.first(), Some(&0));
    assert_eq!(set.last(), Some(&999));
}
