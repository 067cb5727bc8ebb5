#![cfg(test)]

// Property tests for HashMap kept inside the crate so they can reach the
// table invariant checker and the test hashers.

use crate::hash_map::test_hashers::{ConstBuildHasher, IdentityBuildHasher};
use crate::hash_map::HashMap;
use core::hash::BuildHasher;
use proptest::prelude::*;

// Pool-indexed operations: keys shrink toward a small pool so collisions,
// tombstone reuse and re-insertion of deleted keys all show up quickly.
#[derive(Clone, Debug)]
enum Op {
    Set(usize, i32),
    Delete(usize),
    Get(usize),
    HasKey(usize),
}

fn arb_scenario() -> impl Strategy<Value = (Vec<u64>, Vec<Op>)> {
    proptest::collection::vec(0u64..4096, 1..=64).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Set(i, v)),
            3 => idx.clone().prop_map(Op::Delete),
            1 => idx.clone().prop_map(Op::Get),
            1 => idx.clone().prop_map(Op::HasKey),
        ];
        proptest::collection::vec(op, 1..300).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_against_model<S: BuildHasher>(
    sut: HashMap<u64, i32, S>,
    pool: &[u64],
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: hashbrown::HashMap<u64, i32> = hashbrown::HashMap::new();
    for op in ops {
        match op {
            Op::Set(i, v) => {
                sut.set(pool[i], v).expect("set");
                model.insert(pool[i], v);
            }
            Op::Delete(i) => {
                prop_assert_eq!(sut.delete(&pool[i]), model.remove(&pool[i]));
            }
            Op::Get(i) => {
                prop_assert_eq!(sut.get(&pool[i]), model.get(&pool[i]).copied());
            }
            Op::HasKey(i) => {
                prop_assert_eq!(sut.has_key(&pool[i]), model.contains_key(&pool[i]));
            }
        }
        prop_assert_eq!(sut.len(), model.len());
        sut.check_invariants();
    }
    for (k, v) in &model {
        prop_assert_eq!(sut.get(k), Some(*v));
    }
    Ok(())
}

// Property: state-machine equivalence against hashbrown::HashMap.
// - `get` returns the last value set for a key; `delete` returns it once.
// - No key is ever stored twice, even when a tombstone precedes it.
// - Table invariants hold after every operation, across grow, shrink and
//   same-size tombstone purges.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_matches_model_default_hasher((pool, ops) in arb_scenario()) {
        let sut = HashMap::with_capacity(0).expect("create");
        run_against_model(sut, &pool, ops)?;
    }

    #[test]
    fn prop_matches_model_identity_hasher((pool, ops) in arb_scenario()) {
        // Keys below 4096 cluster into long runs once the table is small.
        let sut = HashMap::with_capacity_and_hasher(0, IdentityBuildHasher).expect("create");
        run_against_model(sut, &pool, ops)?;
    }
}

// Collision variant: every key lands in one probe chain.
proptest! {
    #![proptest_config(ProptestConfig { cases: 16, .. ProptestConfig::default() })]
    #[test]
    fn prop_matches_model_all_colliding((pool, ops) in arb_scenario()) {
        let sut = HashMap::with_capacity_and_hasher(0, ConstBuildHasher).expect("create");
        run_against_model(sut, &pool, ops)?;
    }
}

// Growth from every starting size, then shrink back down to the floor.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_fill_and_drain(hint in 0usize..300, n in 1u64..600, stride in 1u64..64) {
        let sut: HashMap<u64, u64, IdentityBuildHasher> =
            HashMap::with_capacity_and_hasher(hint, IdentityBuildHasher).expect("create");
        for k in 0..n {
            sut.set(k * stride, k).expect("set");
        }
        sut.check_invariants();
        for k in 0..n {
            prop_assert_eq!(sut.get(&(k * stride)), Some(k));
        }
        for k in 0..n {
            prop_assert_eq!(sut.delete(&(k * stride)), Some(k));
        }
        sut.check_invariants();
        prop_assert!(sut.is_empty());
        prop_assert_eq!(sut.capacity(), 32);
    }
}
