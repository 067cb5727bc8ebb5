#![cfg(test)]

// Property tests for RbTreeMap: model equivalence against BTreeMap with the
// red-black and pool invariants checked after every step.

use crate::rbt_map::RbTreeMap;
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Set(i32, i32),
    Delete(i32),
    Get(i32),
    Min,
    Max,
}

fn arb_ops(key_space: i32) -> impl Strategy<Value = Vec<Op>> {
    let key = 0..key_space;
    let op = prop_oneof![
        4 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Set(k, v)),
        3 => key.clone().prop_map(Op::Delete),
        1 => key.prop_map(Op::Get),
        1 => Just(Op::Min),
        1 => Just(Op::Max),
    ];
    proptest::collection::vec(op, 1..400)
}

// Property: state-machine equivalence against std::collections::BTreeMap.
// - `set` overwrites without duplicating; `delete` returns the stored value.
// - `get_min`/`get_max` agree with the model's first/last entries.
// - In-order traversal is sorted, black heights agree, parent links are
//   consistent and pool bookkeeping matches after grow and compaction.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_matches_btreemap(ops in arb_ops(200)) {
        let sut: RbTreeMap<i32, i32> = RbTreeMap::with_capacity(0).expect("create");
        let mut model = BTreeMap::new();
        for op in ops {
            match op {
                Op::Set(k, v) => {
                    sut.set(k, v).expect("set");
                    model.insert(k, v);
                }
                Op::Delete(k) => {
                    prop_assert_eq!(sut.delete(&k), model.remove(&k));
                }
                Op::Get(k) => {
                    prop_assert_eq!(sut.get(&k), model.get(&k).copied());
                    prop_assert_eq!(sut.has_key(&k), model.contains_key(&k));
                }
                Op::Min => {
                    prop_assert_eq!(sut.get_min(), model.first_key_value().map(|(k, v)| (*k, *v)));
                }
                Op::Max => {
                    prop_assert_eq!(sut.get_max(), model.last_key_value().map(|(k, v)| (*k, *v)));
                }
            }
            prop_assert_eq!(sut.len(), model.len());
            sut.check_invariants();
        }
        let entries: Vec<(i32, i32)> = model.into_iter().collect();
        prop_assert_eq!(sut.to_vec(), entries);
    }

    // Bulk load then delete in a random order: every compaction must keep
    // the remaining keys reachable.
    #[test]
    fn prop_bulk_delete_any_order(keys in proptest::sample::subsequence((0..1024).collect::<Vec<i32>>(), 1..1024)
        .prop_shuffle()) {
        let sut: RbTreeMap<i32, i32> = RbTreeMap::with_capacity(0).expect("create");
        for k in 0..1024 {
            sut.set(k, k).expect("set");
        }
        let mut remaining: BTreeMap<i32, i32> = (0..1024).map(|k| (k, k)).collect();
        for k in keys {
            prop_assert_eq!(sut.delete(&k), remaining.remove(&k));
        }
        sut.check_invariants();
        prop_assert_eq!(sut.len(), remaining.len());
        for k in remaining.keys() {
            prop_assert!(sut.has_key(k));
        }
    }
}
