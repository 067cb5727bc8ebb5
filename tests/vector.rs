use proptest::prelude::*;
use shared_containers::{Error, Vector};

#[test]
fn strings_copy_out_independently() {
    let v: Vector<String> = Vector::with_capacity(2).unwrap();
    v.append("alpha".to_string()).unwrap();
    v.append("beta".to_string()).unwrap();
    let mut got = v.get(0).unwrap();
    got.push('!');
    assert_eq!(v.get(0).unwrap(), "alpha");
    assert_eq!(v.delete(0).unwrap(), "alpha");
    assert_eq!(v.to_vec(), vec!["beta".to_string()]);
}

#[test]
fn errors_carry_index_and_length() {
    let v: Vector<u8> = Vector::with_capacity(0).unwrap();
    assert_eq!(v.get(0), Err(Error::IndexOutOfBounds { index: 0, len: 0 }));
    v.append(1).unwrap();
    assert_eq!(v.set(3, 9), Err(Error::IndexOutOfBounds { index: 3, len: 1 }));
}

#[test]
fn growth_then_shrink_keeps_order() {
    let v = Vector::with_capacity(0).unwrap();
    for i in 0..1000u32 {
        v.append(i).unwrap();
    }
    assert_eq!(v.capacity(), 1024);
    v.resize(10, 0).unwrap();
    assert_eq!(v.capacity(), 16);
    assert_eq!(v.to_vec(), (0..10).collect::<Vec<_>>());
}

#[derive(Clone, Debug)]
enum Op {
    Append(i32),
    Pop,
    Insert(usize, i32),
    Delete(usize),
    Swap(usize, usize),
}

// Property: Vector behaves like std Vec for positional edits; indices past
// the end fail without changing contents.
proptest! {
    #[test]
    fn prop_matches_std_vec(ops in proptest::collection::vec(prop_oneof![
        any::<i32>().prop_map(Op::Append),
        Just(Op::Pop),
        (0usize..40, any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
        (0usize..40).prop_map(Op::Delete),
        (0usize..40, 0usize..40).prop_map(|(a, b)| Op::Swap(a, b)),
    ], 1..300)) {
        let v = Vector::with_capacity(0).unwrap();
        let mut model: Vec<i32> = Vec::new();
        for op in ops {
            match op {
                Op::Append(x) => {
                    v.append(x).unwrap();
                    model.push(x);
                }
                Op::Pop => {
                    prop_assert_eq!(v.pop(), model.pop());
                }
                Op::Insert(i, x) => {
                    let r = v.insert(i, x);
                    if i <= model.len() {
                        prop_assert!(r.is_ok());
                        model.insert(i, x);
                    } else {
                        prop_assert!(r.is_err());
                    }
                }
                Op::Delete(i) => {
                    let r = v.delete(i);
                    if i < model.len() {
                        prop_assert_eq!(r, Ok(model.remove(i)));
                    } else {
                        prop_assert!(r.is_err());
                    }
                }
                Op::Swap(a, b) => {
                    let r = v.swap(a, b);
                    if a < model.len() && b < model.len() {
                        prop_assert!(r.is_ok());
                        model.swap(a, b);
                    } else {
                        prop_assert!(r.is_err());
                    }
                }
            }
            prop_assert_eq!(v.len(), model.len());
        }
        prop_assert_eq!(v.to_vec(), model);
    }
}
