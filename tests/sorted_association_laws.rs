//! Property-based tests for the ordered collections.

use proptest::prelude::*;
use std::collections::BTreeMap;
use thicket::{OrderedAssociation, SortedAssociation};

// =============================================================================
// Strategy for generating test data
// =============================================================================

fn arbitrary_entries() -> impl Strategy<Value = Vec<(i16, i32)>> {
    prop::collection::vec((any::<i16>(), any::<i32>()), 0..80)
}

// =============================================================================
// Model Law: SortedAssociation agrees with BTreeMap
// =============================================================================

proptest! {
    #[test]
    fn prop_agrees_with_btree_map(entries in arbitrary_entries()) {
        let map: SortedAssociation<i16, i32> = entries.clone().into_iter().collect();
        let mut model = BTreeMap::new();
        for (key, value) in entries {
            model.insert(key, value);
        }

        prop_assert_eq!(map.len(), model.len());
        prop_assert_eq!(map.to_btree_map(), model);
    }
}

// =============================================================================
// Ordering Law: iteration yields strictly ascending keys
// =============================================================================

proptest! {
    #[test]
    fn prop_iteration_is_strictly_ascending(entries in arbitrary_entries()) {
        let map: SortedAssociation<i16, i32> = entries.into_iter().collect();
        let keys: Vec<i16> = map.keys().copied().collect();

        for window in keys.windows(2) {
            prop_assert!(window[0] < window[1]);
        }
    }
}

// =============================================================================
// Remove Law: removal deletes exactly the requested key
// =============================================================================

proptest! {
    #[test]
    fn prop_remove_deletes_exactly_one_key(entries in arbitrary_entries(), key in any::<i16>()) {
        let map: SortedAssociation<i16, i32> = entries.into_iter().collect();
        let removed = map.remove(&key);

        prop_assert_eq!(removed.get(&key), None);
        for (other, value) in map.iter() {
            if *other != key {
                prop_assert_eq!(removed.get(other), Some(value));
            }
        }
    }
}

// =============================================================================
// Variant Law: both ordered variants agree on contents
// =============================================================================

proptest! {
    #[test]
    fn prop_rebalancing_never_changes_contents(entries in arbitrary_entries()) {
        let balanced: SortedAssociation<i16, i32> = entries.clone().into_iter().collect();
        let plain: OrderedAssociation<i16, i32> = entries.into_iter().collect();

        prop_assert_eq!(balanced.to_btree_map(), plain.to_btree_map());
    }
}

// =============================================================================
// Persistence Law: edits never disturb earlier versions
// =============================================================================

proptest! {
    #[test]
    fn prop_earlier_versions_survive_edits(
        entries in arbitrary_entries(),
        key in any::<i16>(),
        value in any::<i32>()
    ) {
        let before: SortedAssociation<i16, i32> = entries.into_iter().collect();
        let snapshot = before.to_btree_map();

        let _after = before.insert(key, value).remove(&key);

        prop_assert_eq!(before.to_btree_map(), snapshot);
    }
}
