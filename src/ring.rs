//! Ring: circular slot buffer shared by `Deque` and `Queue`.
//!
//! Live elements occupy `len` consecutive slots starting at `front`, wrapping
//! at the capacity. Before any reallocation the ring is linearized so the
//! run starts at slot 0 and indices stay valid across the resize.

use crate::buffer::Slots;
use crate::element::ElementType;
use crate::error::Result;
use crate::policy::{grow_target, initial_capacity, shrink_target, SEQUENCE_MIN_CAPACITY};

#[derive(Debug)]
pub(crate) struct Ring<T> {
    slots: Slots<T>,
    front: usize,
    len: usize,
}

impl<T> Ring<T> {
    pub(crate) fn with_capacity(size_hint: usize) -> Result<Self> {
        let capacity = initial_capacity(size_hint, SEQUENCE_MIN_CAPACITY)?;
        Ok(Self {
            slots: Slots::zeroed(capacity)?,
            front: 0,
            len: 0,
        })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn mask(&self) -> usize {
        self.capacity() - 1
    }

    #[inline]
    fn physical(&self, logical: usize) -> usize {
        (self.front + logical) & self.mask()
    }

    fn linearize(&mut self) {
        if self.front != 0 {
            self.slots.rotate_left(self.front);
            self.front = 0;
        }
    }

    fn reserve_one(&mut self) -> Result<()> {
        let old = self.capacity();
        if self.len < old {
            return Ok(());
        }
        let target = grow_target(self.len + 1, SEQUENCE_MIN_CAPACITY)?;
        self.slots.reserve_to(target)?;
        self.linearize();
        self.slots.extend_to(target);
        log::debug!("ring grew from {} to {} slots", old, target);
        Ok(())
    }

    fn after_pop(&mut self) {
        if self.len == 0 {
            self.front = 0;
        }
        let old = self.capacity();
        if let Some(target) = shrink_target(self.len, old, SEQUENCE_MIN_CAPACITY, 1) {
            self.linearize();
            self.slots.shrink(target);
            log::debug!("ring shrank from {} to {} slots", old, target);
        }
    }

    pub(crate) fn push_back(&mut self, value: T) -> Result<()> {
        self.reserve_one()?;
        let slot = self.physical(self.len);
        self.slots.put(slot, value);
        self.len += 1;
        Ok(())
    }

    pub(crate) fn push_front(&mut self, value: T) -> Result<()> {
        self.reserve_one()?;
        self.front = (self.front + self.capacity() - 1) & self.mask();
        self.slots.put(self.front, value);
        self.len += 1;
        Ok(())
    }

    pub(crate) fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let value = self.slots.take(self.front);
        self.front = (self.front + 1) & self.mask();
        self.len -= 1;
        self.after_pop();
        value
    }

    pub(crate) fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let slot = self.physical(self.len - 1);
        let value = self.slots.take(slot);
        self.len -= 1;
        self.after_pop();
        value
    }

    pub(crate) fn front(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        self.slots.get(self.front)
    }

    pub(crate) fn back(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        self.slots.get(self.physical(self.len - 1))
    }

    pub(crate) fn copy_all(&self) -> Vec<T>
    where
        T: ElementType,
    {
        (0..self.len)
            .filter_map(|i| self.slots.get(self.physical(i)).map(T::copy_element))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_ring_survives_growth() {
        let mut r = Ring::with_capacity(16).unwrap();
        for i in 0..10 {
            r.push_back(i).unwrap();
        }
        for _ in 0..8 {
            r.pop_front().unwrap();
        }
        // front is now at slot 8; fill past the physical end.
        for i in 10..24 {
            r.push_back(i).unwrap();
        }
        assert_eq!(r.len(), 16);
        assert_eq!(r.capacity(), 16);
        r.push_back(24).unwrap();
        assert_eq!(r.capacity(), 32);
        assert_eq!(r.front, 0);
        assert_eq!(r.copy_all(), (8..25).collect::<Vec<_>>());
    }

    #[test]
    fn single_element_front_and_back_agree() {
        let mut r = Ring::with_capacity(0).unwrap();
        r.push_front('x').unwrap();
        assert_eq!(r.front(), Some(&'x'));
        assert_eq!(r.back(), Some(&'x'));
        assert_eq!(r.pop_back(), Some('x'));
        assert_eq!(r.front(), None);
        assert_eq!(r.front, 0);
    }

    #[test]
    fn shrink_linearizes_wrapped_run() {
        let mut r = Ring::with_capacity(128).unwrap();
        for i in 0..120 {
            r.push_back(i).unwrap();
        }
        for _ in 0..100 {
            r.pop_front().unwrap();
        }
        // Wrap the run across the physical end of the block.
        for i in 120..140 {
            r.push_back(i).unwrap();
        }
        for _ in 0..20 {
            r.pop_front().unwrap();
        }
        assert_eq!(r.capacity(), 128);
        assert_eq!(r.front, 120);
        for _ in 0..4 {
            r.pop_back().unwrap();
        }
        assert_eq!(r.capacity(), 16);
        assert_eq!(r.front, 0);
        assert_eq!(r.copy_all(), (120..136).collect::<Vec<_>>());
    }
}
