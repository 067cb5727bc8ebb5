use shared_containers::{ElementType, HashMap};
use std::cell::Cell;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

#[test]
fn insert_forty_then_find_all() {
    let m: HashMap<u64, u64> = HashMap::with_capacity(32).unwrap();
    assert_eq!(m.capacity(), 32);
    for k in 0..40 {
        m.set(k, k + 100).unwrap();
    }
    assert_eq!(m.capacity(), 64);
    for k in 0..40 {
        assert!(m.has_key(&k), "lost key {}", k);
    }
}

#[test]
fn past_load_limit_every_key_is_found() {
    let m: HashMap<String, usize> = HashMap::with_capacity(0).unwrap();
    for i in 0..5000 {
        m.set(format!("key-{}", i), i).unwrap();
    }
    for i in 0..5000 {
        assert_eq!(m.get(&format!("key-{}", i)), Some(i));
    }
    assert!(m.len() * 8 <= m.capacity() * 7);
}

#[test]
fn shrink_then_regrow_with_deleted_keys() {
    let m: HashMap<i32, i32> = HashMap::with_capacity(0).unwrap();
    for k in 0..512 {
        m.set(k, k).unwrap();
    }
    let peak = m.capacity();
    for k in 0..500 {
        assert_eq!(m.delete(&k), Some(k));
        assert!(!m.has_key(&k));
    }
    assert!(m.capacity() < peak);
    for k in 0..500 {
        m.set(k, -k).unwrap();
    }
    for k in 0..500 {
        assert_eq!(m.get(&k), Some(-k));
    }
    for k in 500..512 {
        assert_eq!(m.get(&k), Some(k));
    }
}

// Key whose hash is called at most once per public operation.
struct CountingKey {
    id: u32,
    hashes: Rc<Cell<usize>>,
}

impl Hash for CountingKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hashes.set(self.hashes.get() + 1);
        self.id.hash(state);
    }
}

impl ElementType for CountingKey {
    fn compare(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }

    fn copy_element(&self) -> Self {
        CountingKey {
            id: self.id,
            hashes: self.hashes.clone(),
        }
    }
}

#[test]
fn rehash_never_rehashes_keys() {
    let hashes = Rc::new(Cell::new(0));
    let m: HashMap<CountingKey, ()> = HashMap::with_capacity(0).unwrap();
    for id in 0..1000 {
        m.set(
            CountingKey {
                id,
                hashes: hashes.clone(),
            },
            (),
        )
        .unwrap();
    }
    assert_eq!(hashes.get(), 1000, "one hash per insert, none during growth");
}

#[test]
fn values_may_be_containers() {
    let m: HashMap<&'static str, HashMap<u8, u8>> = HashMap::with_capacity(0).unwrap();
    let inner: HashMap<u8, u8> = HashMap::with_capacity(0).unwrap();
    inner.set(1, 2).unwrap();
    m.set("inner", inner).unwrap();
    let alias = m.get(&"inner").unwrap();
    alias.set(3, 4).unwrap();
    let again = m.get(&"inner").unwrap();
    assert_eq!(again.get(&3), Some(4));
    assert_eq!(again.len(), 2);
}
