//! HashMap: open-addressing table with linear probing and tombstones.
//!
//! Slots live in parallel arrays (`status`, cached `hashes`, `keys`,
//! `values`). A slot is live iff its status equals the table's current
//! generation tag. Deleting leaves a `Deleted` tombstone that lookups probe
//! past; only a truly `Empty` slot ends a probe.
//!
//! Rehashing reuses the same arrays. The arrays are resized (when growing)
//! and the generation tag flips; every slot still carrying the old tag is
//! then relocated to its probe position under the new capacity. A target
//! already holding an old-tag entry is swapped with the one being moved,
//! and the walk stays on the current slot until it holds no old-tag entry.
//! No second table is allocated.
//!
//! Invariants kept between calls:
//! - Exactly `count` slots carry the current tag and `tombstones` slots are
//!   `Deleted`; no slot carries the other generation tag.
//! - Every slot on the probe path from a live entry's home slot to the entry
//!   itself is non-empty.
//! - `count + tombstones <= max_load(capacity)`.
//! - Hashes are computed once on insert; `K: Hash` is never called again.

use crate::buffer::Slots;
use crate::element::ElementType;
use crate::error::{Error, Result};
use crate::policy::{grow_target, initial_capacity, max_load, shrink_target, MAP_MIN_CAPACITY};
use crate::shared_buffer::SharedBuffer;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum SlotStatus {
    Empty,
    Deleted,
    GenA,
    GenB,
}

impl SlotStatus {
    fn other_generation(self) -> Self {
        match self {
            SlotStatus::GenA => SlotStatus::GenB,
            SlotStatus::GenB => SlotStatus::GenA,
            s => s,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Probe {
    Found(usize),
    /// First reusable slot on the path, if any.
    Vacant(Option<usize>),
}

struct Table<K, V, S> {
    count: usize,
    tombstones: usize,
    generation: SlotStatus,
    status: Vec<SlotStatus>,
    hashes: Vec<u64>,
    keys: Slots<K>,
    values: Slots<V>,
    hasher: S,
}

impl<K, V, S> Table<K, V, S> {
    fn with_capacity(capacity: usize, hasher: S) -> Result<Self> {
        let mut status = Vec::new();
        status
            .try_reserve_exact(capacity)
            .map_err(|e| Error::from_reserve(capacity, e))?;
        status.resize(capacity, SlotStatus::Empty);
        let mut hashes = Vec::new();
        hashes
            .try_reserve_exact(capacity)
            .map_err(|e| Error::from_reserve(capacity, e))?;
        hashes.resize(capacity, 0);
        Ok(Self {
            count: 0,
            tombstones: 0,
            generation: SlotStatus::GenA,
            status,
            hashes,
            keys: Slots::zeroed(capacity)?,
            values: Slots::zeroed(capacity)?,
            hasher,
        })
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.status.len()
    }

    #[inline]
    fn mask(&self) -> usize {
        self.capacity() - 1
    }

    fn probe(&self, hash: u64, key: &K) -> Probe
    where
        K: ElementType,
    {
        let mask = self.mask();
        let start = (hash as usize) & mask;
        let mut first_free = None;
        for step in 0..=mask {
            let i = (start + step) & mask;
            match self.status[i] {
                SlotStatus::Empty => return Probe::Vacant(first_free.or(Some(i))),
                SlotStatus::Deleted => {
                    first_free.get_or_insert(i);
                }
                s if s == self.generation => {
                    if self.hashes[i] == hash
                        && self.keys.get(i).is_some_and(|k| k.compare(key).is_eq())
                    {
                        return Probe::Found(i);
                    }
                }
                _ => {}
            }
        }
        Probe::Vacant(first_free)
    }

    fn insert_at(&mut self, i: usize, hash: u64, key: K, value: V) {
        if self.status[i] == SlotStatus::Deleted {
            self.tombstones -= 1;
        }
        self.status[i] = self.generation;
        self.hashes[i] = hash;
        self.keys.put(i, key);
        self.values.put(i, value);
        self.count += 1;
    }

    fn remove_at(&mut self, i: usize) -> (K, V) {
        self.status[i] = SlotStatus::Deleted;
        self.tombstones += 1;
        self.count -= 1;
        let key = self.keys.take(i).expect("live slot holds a key");
        let value = self.values.take(i).expect("live slot holds a value");
        (key, value)
    }

    /// Make sure one more entry fits under the load limit. Returns true when
    /// a rehash moved entries around.
    fn reserve_one(&mut self) -> Result<bool> {
        let capacity = self.capacity();
        if self.count + self.tombstones < max_load(capacity) {
            return Ok(false);
        }
        if self.count + 1 > capacity / 2 {
            self.grow(grow_target(capacity + 1, MAP_MIN_CAPACITY)?)?;
        } else {
            // Mostly tombstones: rebuild at the same size.
            self.relocate(capacity, capacity);
        }
        Ok(true)
    }

    fn grow(&mut self, new_capacity: usize) -> Result<()> {
        let old_capacity = self.capacity();
        let extra = new_capacity - old_capacity;
        self.status
            .try_reserve_exact(extra)
            .map_err(|e| Error::from_reserve(new_capacity, e))?;
        self.hashes
            .try_reserve_exact(extra)
            .map_err(|e| Error::from_reserve(new_capacity, e))?;
        self.keys.reserve_to(new_capacity)?;
        self.values.reserve_to(new_capacity)?;

        self.status.resize(new_capacity, SlotStatus::Empty);
        self.hashes.resize(new_capacity, 0);
        self.keys.extend_to(new_capacity);
        self.values.extend_to(new_capacity);
        self.relocate(old_capacity, new_capacity);
        Ok(())
    }

    fn shrink(&mut self, new_capacity: usize) {
        let old_capacity = self.capacity();
        self.relocate(old_capacity, new_capacity);
        self.status.truncate(new_capacity);
        self.status.shrink_to_fit();
        self.hashes.truncate(new_capacity);
        self.hashes.shrink_to_fit();
        self.keys.shrink(new_capacity);
        self.values.shrink(new_capacity);
    }

    /// Re-seat every entry for `new_capacity` probing inside the current
    /// arrays, which must already span `max(old, new)` slots.
    fn relocate(&mut self, old_capacity: usize, new_capacity: usize) {
        let old = self.generation;
        let new = old.other_generation();
        // Tombstones belong to the old layout's probe paths.
        for s in self.status.iter_mut() {
            if *s == SlotStatus::Deleted {
                *s = SlotStatus::Empty;
            }
        }
        let mask = new_capacity - 1;
        let mut i = 0;
        while i < old_capacity {
            if self.status[i] != old {
                i += 1;
                continue;
            }
            let mut j = (self.hashes[i] as usize) & mask;
            while self.status[j] == new {
                j = (j + 1) & mask;
            }
            if j == i {
                self.status[i] = new;
                i += 1;
            } else if self.status[j] == old {
                // Evict: the displaced entry lands in slot i and is
                // relocated on the next pass over i.
                self.swap_slots(i, j);
                self.status[j] = new;
            } else {
                self.move_slot(i, j);
                self.status[j] = new;
                self.status[i] = SlotStatus::Empty;
                i += 1;
            }
        }
        self.generation = new;
        self.tombstones = 0;
        log::debug!(
            "hash map rehashed {} -> {} slots ({} live, generation {:?})",
            old_capacity,
            new_capacity,
            self.count,
            new
        );
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.hashes.swap(a, b);
        self.keys.swap(a, b);
        self.values.swap(a, b);
    }

    fn move_slot(&mut self, from: usize, to: usize) {
        self.hashes[to] = self.hashes[from];
        self.keys.move_slot(from, to);
        self.values.move_slot(from, to);
    }

    fn after_remove(&mut self) {
        if self.count == 0 && self.tombstones > 0 {
            self.status.fill(SlotStatus::Empty);
            self.tombstones = 0;
        }
        if let Some(target) = shrink_target(self.count, self.capacity(), MAP_MIN_CAPACITY, 2) {
            self.shrink(target);
        }
    }
}

/// Open-addressing hash map. Handles returned by
/// [`HashMap::clone_handle`] alias one table.
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    buf: SharedBuffer<Table<K, V, S>>,
}

impl<K, V> HashMap<K, V, DefaultHashBuilder>
where
    K: ElementType + Hash,
{
    /// Create an empty map sized for `size_hint` entries (at least 32 slots).
    pub fn with_capacity(size_hint: usize) -> Result<Self> {
        Self::with_capacity_and_hasher(size_hint, DefaultHashBuilder::default())
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: ElementType + Hash,
    S: BuildHasher,
{
    pub fn with_capacity_and_hasher(size_hint: usize, hasher: S) -> Result<Self> {
        let capacity = initial_capacity(size_hint, MAP_MIN_CAPACITY)?;
        let table = Table::with_capacity(capacity, hasher)?;
        log::trace!("hash map created with {} slots", capacity);
        Ok(Self {
            buf: SharedBuffer::new(table),
        })
    }

    pub fn len(&self) -> usize {
        self.buf.borrow().count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.borrow().capacity()
    }

    /// Insert or update. An existing value for `key` is replaced and dropped
    /// after the map is released.
    pub fn set(&self, key: K, value: V) -> Result<()> {
        let replaced = {
            let mut t = self.buf.borrow_mut();
            let hash = key.hash_element(&t.hasher);
            match t.probe(hash, &key) {
                Probe::Found(i) => t.values.put(i, value),
                Probe::Vacant(slot) => {
                    let slot = if t.reserve_one()? {
                        match t.probe(hash, &key) {
                            Probe::Vacant(slot) => slot,
                            Probe::Found(_) => unreachable!("key absent before rehash"),
                        }
                    } else {
                        slot
                    };
                    let i = slot.ok_or(Error::Full)?;
                    t.insert_at(i, hash, key, value);
                    None
                }
            }
        };
        drop(replaced);
        Ok(())
    }

    pub fn has_key(&self, key: &K) -> bool {
        let t = self.buf.borrow();
        let hash = key.hash_element(&t.hasher);
        matches!(t.probe(hash, key), Probe::Found(_))
    }

    /// Remove `key`, returning its value.
    pub fn delete(&self, key: &K) -> Option<V> {
        let (old_key, value) = {
            let mut t = self.buf.borrow_mut();
            let hash = key.hash_element(&t.hasher);
            let Probe::Found(i) = t.probe(hash, key) else {
                return None;
            };
            let entry = t.remove_at(i);
            t.after_remove();
            entry
        };
        drop(old_key);
        Some(value)
    }

    /// Copy of the value stored under `key`.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: ElementType,
    {
        let t = self.buf.borrow();
        let hash = key.hash_element(&t.hasher);
        let found = match t.probe(hash, key) {
            Probe::Found(i) => t.values.get(i).map(V::copy_element),
            Probe::Vacant(_) => None,
        };
        found
    }
}

impl<K, V, S> HashMap<K, V, S> {
    pub fn clone_handle(&self) -> Self {
        Self {
            buf: self.buf.retain(),
        }
    }

    pub fn ref_count(&self) -> usize {
        self.buf.ref_count()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.buf.ptr_eq(&other.buf)
    }

    /// Release this handle. Keys and values go with the last handle.
    pub fn free(self) {
        self.buf.release();
    }
}

impl<K, V, S> ElementType for HashMap<K, V, S> {
    fn compare(&self, other: &Self) -> Ordering {
        self.buf.borrow().count.cmp(&other.buf.borrow().count)
    }

    fn copy_element(&self) -> Self {
        self.clone_handle()
    }
}

impl<K, V, S> fmt::Debug for HashMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.buf.borrow();
        f.debug_struct("HashMap")
            .field("len", &t.count)
            .field("capacity", &t.capacity())
            .field("tombstones", &t.tombstones)
            .field("refs", &self.buf.ref_count())
            .finish()
    }
}

#[cfg(test)]
impl<K, V, S> HashMap<K, V, S>
where
    K: ElementType + Hash,
    S: BuildHasher,
{
    pub(crate) fn tombstones(&self) -> usize {
        self.buf.borrow().tombstones
    }

    /// Panics if any table invariant is broken.
    pub(crate) fn check_invariants(&self) {
        let t = self.buf.borrow();
        let cap = t.capacity();
        assert!(cap.is_power_of_two() && cap >= MAP_MIN_CAPACITY);
        assert_eq!(t.hashes.len(), cap);
        assert_eq!(t.keys.len(), cap);
        assert_eq!(t.values.len(), cap);
        let stale = t.generation.other_generation();
        let mut live = 0;
        let mut dead = 0;
        for i in 0..cap {
            let s = t.status[i];
            assert_ne!(s, stale, "slot {} still tagged with the old generation", i);
            if s == t.generation {
                live += 1;
                let key = t.keys.get(i).expect("live slot without key");
                assert!(t.values.is_live(i), "live slot without value");
                assert_eq!(t.hashes[i], key.hash_element(&t.hasher));
                assert_eq!(t.probe(t.hashes[i], key), Probe::Found(i));
                let mut j = (t.hashes[i] as usize) & (cap - 1);
                while j != i {
                    assert_ne!(t.status[j], SlotStatus::Empty, "probe path broken");
                    j = (j + 1) & (cap - 1);
                }
            } else {
                if s == SlotStatus::Deleted {
                    dead += 1;
                }
                assert!(!t.keys.is_live(i) && !t.values.is_live(i));
            }
        }
        assert_eq!(live, t.count);
        assert_eq!(dead, t.tombstones);
        assert!(t.count + t.tombstones <= max_load(cap));
    }
}

#[cfg(test)]
pub(crate) mod test_hashers {
    use core::hash::{BuildHasher, Hasher};

    /// Every key hashes to zero.
    #[derive(Clone, Default)]
    pub struct ConstBuildHasher;
    pub struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        }
    }

    /// Integers hash to themselves.
    #[derive(Clone, Default)]
    pub struct IdentityBuildHasher;
    #[derive(Default)]
    pub struct IdentityHasher(u64);
    impl BuildHasher for IdentityBuildHasher {
        type Hasher = IdentityHasher;
        fn build_hasher(&self) -> Self::Hasher {
            IdentityHasher(0)
        }
    }
    impl Hasher for IdentityHasher {
        fn write(&mut self, bytes: &[u8]) {
            for b in bytes {
                self.0 = self.0.rotate_left(8) ^ u64::from(*b);
            }
        }
        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }
        fn write_u32(&mut self, n: u32) {
            self.0 = u64::from(n);
        }
        fn finish(&self) -> u64 {
            self.0
        }
    }
}
