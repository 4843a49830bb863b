use cog_core::rewrite::{make_split_array, pushdown_array, sort_array, split_array};
use cog_core::{check, CogHandle, CrackerPolicy, Key, Reach, RewriteOp, RewritePolicy};
use cog_test_utils::*;
use proptest::prelude::*;

fn keys_strategy() -> impl Strategy<Value = Vec<Key>> {
    proptest::collection::vec(-50..50i64, 0..64)
}

fn op_strategy() -> impl Strategy<Value = (RewriteOp, Reach)> {
    let op = prop_oneof![
        Just(RewriteOp::Sort),
        Just(RewriteOp::Pushdown),
        (-50..50i64).prop_map(RewriteOp::Split),
    ];
    let reach = prop_oneof![
        Just(Reach::Node),
        Just(Reach::Tree),
        (-50..50i64).prop_map(Reach::Target),
        (-50..50i64).prop_map(Reach::PathTo),
    ];
    (op, reach)
}

// Splits never recurse forever under the top-down driver: a split that
// separates nothing is a no-op.
fn apply_all(h: &CogHandle, ops: &[(RewriteOp, Reach)]) {
    for (op, reach) in ops {
        op.apply_with(*reach, h);
    }
}

proptest! {
    #[test]
    fn prop_rewrites_preserve_size_and_records(
        keys in keys_strategy(),
        ops in proptest::collection::vec(op_strategy(), 0..12)
    ) {
        let h = array_handle(&keys);
        let before = record_multiset(&h);

        apply_all(&h, &ops);

        prop_assert_eq!(h.size(), keys.len());
        prop_assert_eq!(record_multiset(&h), before);
    }

    #[test]
    fn prop_sort_yields_non_decreasing(keys in keys_strategy()) {
        let h = array_handle(&keys);
        sort_array(&h);
        prop_assert!(is_non_decreasing(&keys_of(&h)));
        prop_assert_eq!(key_multiset(&h), { let mut k = keys.clone(); k.sort_unstable(); k });
    }

    #[test]
    fn prop_split_partitions_around_target(keys in keys_strategy(), target in -50..50i64) {
        let h = array_handle(&keys);
        split_array(target, &h);

        let cog = h.get();
        if let Some((left, right)) = cog.children() {
            prop_assert!(keys_of(left).iter().all(|k| *k < target));
            prop_assert!(keys_of(right).iter().all(|k| *k >= target));
        } else {
            // Only one-sided input is left as is.
            prop_assert!(keys.iter().all(|k| *k < target) || keys.iter().all(|k| *k >= target));
        }
        prop_assert!(check(&h).is_ok());
    }

    #[test]
    fn prop_pushdown_restores_separator(
        left in keys_strategy(),
        right in keys_strategy(),
        sep in -50..50i64
    ) {
        let h = btree_handle(array_handle(&left), sep, array_handle(&right));
        let before = record_multiset(&h);

        pushdown_array(&h);

        prop_assert!(check(&h).is_ok());
        prop_assert_eq!(record_multiset(&h), before);
    }

    #[test]
    fn prop_path_split_keeps_invariants(
        keys in keys_strategy(),
        targets in proptest::collection::vec(-50..50i64, 0..8)
    ) {
        let h = array_handle(&keys);
        for t in targets {
            cog_core::rewrite::recur_to_target_top_down(&make_split_array(t), t, &h);
        }
        prop_assert!(check(&h).is_ok());
        cog_core::rewrite::recur_top_down(&sort_array, &h);
        prop_assert!(is_non_decreasing(&keys_of(&h)));
    }

    #[test]
    fn prop_cracker_scan_is_key_preserving(
        keys in keys_strategy(),
        min_size in 0..10usize
    ) {
        let h = array_handle(&keys);
        let before = record_multiset(&h);

        CrackerPolicy::new(min_size).before_iterator(&h);

        prop_assert!(check(&h).is_ok());
        prop_assert_eq!(record_multiset(&h), before);
    }
}
