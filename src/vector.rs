//! Vector: contiguous, 0-indexed growable array behind a shared handle.

use crate::buffer::Slots;
use crate::element::ElementType;
use crate::error::{Error, Result};
use crate::policy::{grow_target, initial_capacity, shrink_target, SEQUENCE_MIN_CAPACITY};
use crate::shared_buffer::SharedBuffer;
use core::cmp::Ordering;
use core::fmt;

struct VectorState<T> {
    len: usize,
    slots: Slots<T>,
}

impl<T> VectorState<T> {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.len {
            Ok(())
        } else {
            Err(Error::out_of_bounds(index, self.len))
        }
    }

    fn reserve_for(&mut self, required: usize) -> Result<()> {
        let old = self.capacity();
        if required <= old {
            return Ok(());
        }
        let target = grow_target(required, SEQUENCE_MIN_CAPACITY)?;
        self.slots.grow(target)?;
        log::debug!("vector grew from {} to {} slots", old, target);
        Ok(())
    }

    fn maybe_shrink(&mut self) {
        let old = self.capacity();
        if let Some(target) = shrink_target(self.len, old, SEQUENCE_MIN_CAPACITY, 1) {
            self.slots.shrink(target);
            log::debug!("vector shrank from {} to {} slots", old, target);
        }
    }

    fn live_mut(&mut self) -> &mut [Option<T>] {
        let len = self.len;
        &mut self.slots.as_mut_slice()[..len]
    }
}

/// Growable array. Cloning the handle with [`Vector::clone_handle`] aliases
/// the same storage; there is no implicit deep copy.
pub struct Vector<T> {
    buf: SharedBuffer<VectorState<T>>,
}

impl<T> Vector<T> {
    /// Create an empty vector with room for at least `size_hint` elements.
    pub fn with_capacity(size_hint: usize) -> Result<Self> {
        let capacity = initial_capacity(size_hint, SEQUENCE_MIN_CAPACITY)?;
        let slots = Slots::zeroed(capacity)?;
        log::trace!("vector created with {} slots", capacity);
        Ok(Self {
            buf: SharedBuffer::new(VectorState { len: 0, slots }),
        })
    }

    pub fn len(&self) -> usize {
        self.buf.borrow().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.borrow().capacity()
    }

    /// Push `value` at the end.
    pub fn append(&self, value: T) -> Result<()> {
        let mut st = self.buf.borrow_mut();
        let len = st.len;
        st.reserve_for(len + 1)?;
        st.slots.put(len, value);
        st.len += 1;
        Ok(())
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Option<T> {
        let mut st = self.buf.borrow_mut();
        if st.len == 0 {
            return None;
        }
        st.len -= 1;
        let len = st.len;
        let value = st.slots.take(len);
        st.maybe_shrink();
        value
    }

    /// Insert `value` at `index`, shifting the tail right. `index == len`
    /// appends.
    pub fn insert(&self, index: usize, value: T) -> Result<()> {
        let mut st = self.buf.borrow_mut();
        let len = st.len;
        if index > len {
            return Err(Error::out_of_bounds(index, len));
        }
        st.reserve_for(len + 1)?;
        st.slots.put(len, value);
        st.len += 1;
        st.live_mut()[index..].rotate_right(1);
        Ok(())
    }

    /// Remove and return the element at `index`, shifting the tail left.
    pub fn delete(&self, index: usize) -> Result<T> {
        let mut st = self.buf.borrow_mut();
        st.check_index(index)?;
        st.live_mut()[index..].rotate_left(1);
        st.len -= 1;
        let len = st.len;
        let value = st
            .slots
            .take(len)
            .expect("slot below len must be live");
        st.maybe_shrink();
        Ok(value)
    }

    /// Replace the element at `index`. The previous element is dropped
    /// after the vector is released.
    pub fn set(&self, index: usize, value: T) -> Result<()> {
        let old = {
            let mut st = self.buf.borrow_mut();
            st.check_index(index)?;
            st.slots.put(index, value)
        };
        drop(old);
        Ok(())
    }

    /// Exchange the elements at `a` and `b`.
    pub fn swap(&self, a: usize, b: usize) -> Result<()> {
        let mut st = self.buf.borrow_mut();
        st.check_index(a)?;
        st.check_index(b)?;
        st.slots.swap(a, b);
        Ok(())
    }

    /// Reverse the live elements in place.
    pub fn reverse(&self) {
        self.buf.borrow_mut().live_mut().reverse();
    }

    /// Stable sort with a caller-supplied comparator.
    pub fn sort_by<F>(&self, mut cmp: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.buf
            .borrow_mut()
            .live_mut()
            .sort_by(|a, b| match (a, b) {
                (Some(a), Some(b)) => cmp(a, b),
                _ => Ordering::Equal,
            });
    }

    /// Add a holder aliasing this vector.
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

    /// Release this handle. Elements are dropped with the last handle.
    pub fn free(self) {
        self.buf.release();
    }
}

impl<T: ElementType> Vector<T> {
    /// Copy of the element at `index`.
    pub fn get(&self, index: usize) -> Result<T> {
        let st = self.buf.borrow();
        st.check_index(index)?;
        Ok(st
            .slots
            .get(index)
            .expect("slot below len must be live")
            .copy_element())
    }

    /// Sort by the element's own ordering.
    pub fn sort(&self) {
        self.sort_by(T::compare);
    }

    /// Grow with copies of `fill` or truncate to exactly `new_len`.
    pub fn resize(&self, new_len: usize, fill: T) -> Result<()> {
        let removed = {
            let mut st = self.buf.borrow_mut();
            let len = st.len;
            if new_len >= len {
                st.reserve_for(new_len)?;
                for i in len..new_len {
                    st.slots.put(i, fill.copy_element());
                }
                st.len = new_len;
                Vec::new()
            } else {
                let removed: Vec<T> = (new_len..len).filter_map(|i| st.slots.take(i)).collect();
                st.len = new_len;
                st.maybe_shrink();
                removed
            }
        };
        drop(removed);
        Ok(())
    }

    /// Snapshot of the live elements, in order.
    pub fn to_vec(&self) -> Vec<T> {
        let st = self.buf.borrow();
        (0..st.len)
            .filter_map(|i| st.slots.get(i).map(T::copy_element))
            .collect()
    }
}

impl<T> ElementType for Vector<T> {
    fn compare(&self, other: &Self) -> Ordering {
        self.len().cmp(&other.len())
    }

    fn copy_element(&self) -> Self {
        self.clone_handle()
    }
}

impl<T> fmt::Debug for Vector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.buf.borrow();
        f.debug_struct("Vector")
            .field("len", &st.len)
            .field("capacity", &st.capacity())
            .field("refs", &self.buf.ref_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(n: i32) -> Vector<i32> {
        let v = Vector::with_capacity(0).unwrap();
        for i in 0..n {
            v.append(i).unwrap();
        }
        v
    }

    #[test]
    fn append_grows_by_doubling() {
        let v = filled(16);
        assert_eq!(v.capacity(), 16);
        v.append(16).unwrap();
        assert_eq!(v.capacity(), 32);
        assert_eq!(v.len(), 17);
        assert_eq!(v.get(16).unwrap(), 16);
    }

    #[test]
    fn pop_shrinks_at_one_eighth() {
        let v = filled(200);
        assert_eq!(v.capacity(), 256);
        while v.len() > 32 {
            v.pop().unwrap();
        }
        assert_eq!(v.capacity(), 32);
        assert_eq!(v.to_vec(), (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn pop_on_empty_is_none() {
        let v: Vector<u8> = Vector::with_capacity(4).unwrap();
        assert_eq!(v.pop(), None);
    }

    #[test]
    fn insert_then_delete_restores_sequence() {
        let v = filled(5);
        v.insert(2, 99).unwrap();
        assert_eq!(v.to_vec(), vec![0, 1, 99, 2, 3, 4]);
        assert_eq!(v.delete(2).unwrap(), 99);
        assert_eq!(v.to_vec(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn insert_at_len_appends_and_past_len_fails() {
        let v = filled(3);
        v.insert(3, 7).unwrap();
        assert_eq!(v.to_vec(), vec![0, 1, 2, 7]);
        assert_eq!(
            v.insert(9, 1),
            Err(Error::IndexOutOfBounds { index: 9, len: 4 })
        );
        assert_eq!(v.len(), 4);
    }

    #[test]
    fn out_of_bounds_access_does_not_mutate() {
        let v = filled(2);
        assert!(v.get(2).is_err());
        assert!(v.set(2, 5).is_err());
        assert!(v.delete(5).is_err());
        assert!(v.swap(0, 2).is_err());
        assert_eq!(v.to_vec(), vec![0, 1]);
    }

    #[test]
    fn swap_reverse_and_sort() {
        let v = filled(6);
        v.swap(0, 5).unwrap();
        assert_eq!(v.to_vec(), vec![5, 1, 2, 3, 4, 0]);
        v.reverse();
        assert_eq!(v.to_vec(), vec![0, 4, 3, 2, 1, 5]);
        v.sort();
        assert_eq!(v.to_vec(), vec![0, 1, 2, 3, 4, 5]);
        v.sort_by(|a, b| b.cmp(a));
        assert_eq!(v.to_vec(), vec![5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn resize_fills_and_truncates() {
        let v = filled(2);
        v.resize(5, -1).unwrap();
        assert_eq!(v.to_vec(), vec![0, 1, -1, -1, -1]);
        v.resize(1, 0).unwrap();
        assert_eq!(v.to_vec(), vec![0]);
    }

    #[test]
    fn handles_alias_storage() {
        let a = filled(3);
        let b = a.clone_handle();
        assert_eq!(a.ref_count(), 2);
        b.set(0, 42).unwrap();
        assert_eq!(a.get(0).unwrap(), 42);
        assert!(a.ptr_eq(&b));
        b.free();
        assert_eq!(a.ref_count(), 1);
    }
}
