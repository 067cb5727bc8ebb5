//! SharedBuffer: reference-counted, interior-mutable storage handle.
//!
//! Copying a handle (`retain`) bumps the count and aliases the same storage;
//! it never duplicates the contents. All holders observe each other's
//! mutations. The storage is dropped exactly once, when the last handle is
//! released.
//!
//! Single-threaded: the count is a plain `Rc` count, so handles are
//! `!Send`/`!Sync`. Borrows are checked at runtime; a nested mutable borrow
//! of the same buffer panics.

use crate::buffer::Slots;
use crate::error::Result;
use core::cell::{Ref, RefCell, RefMut};
use core::fmt;
use std::rc::Rc;

pub struct SharedBuffer<T> {
    cell: Rc<RefCell<T>>,
}

impl<T> SharedBuffer<T> {
    /// Wrap `value` in a fresh buffer with a count of one.
    pub fn new(value: T) -> Self {
        Self {
            cell: Rc::new(RefCell::new(value)),
        }
    }

    /// Add a holder. The returned handle aliases `self`.
    #[inline]
    pub fn retain(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }

    /// Drop this holder; the storage goes away with the last one.
    #[inline]
    pub fn release(self) {
        drop(self);
    }

    /// Number of live holders.
    #[inline]
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.cell)
    }

    /// True when both handles alias one storage block.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    #[inline]
    pub(crate) fn borrow(&self) -> Ref<'_, T> {
        self.cell.borrow()
    }

    #[inline]
    pub(crate) fn borrow_mut(&self) -> RefMut<'_, T> {
        self.cell.borrow_mut()
    }

    /// Run `f` with shared access to the storage.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.borrow())
    }

    /// Run `f` with exclusive access to the storage.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.borrow_mut())
    }
}

impl<T> SharedBuffer<Slots<T>> {
    /// Shared block of `count` vacant slots.
    pub fn with_slots(count: usize) -> Result<Self> {
        Ok(Self::new(Slots::zeroed(count)?))
    }

    /// Grow the shared block in place. Every holder sees the new length;
    /// on failure the block is unchanged.
    pub fn grow(&self, new_count: usize) -> Result<()> {
        self.borrow_mut().grow(new_count)
    }

    pub fn slot_count(&self) -> usize {
        self.borrow().len()
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("refs", &self.ref_count())
            .field("data", &self.cell)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct DropCounter<'a>(&'a Cell<usize>);
    impl Drop for DropCounter<'_> {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn retain_release_round_trip_keeps_storage() {
        let drops = Cell::new(0);
        let a = SharedBuffer::new(DropCounter(&drops));
        let b = a.retain();
        let c = b.retain();
        assert_eq!(a.ref_count(), 3);
        b.release();
        c.release();
        assert_eq!(a.ref_count(), 1);
        assert_eq!(drops.get(), 0);
        a.release();
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn aliases_observe_mutation() {
        let a = SharedBuffer::new(vec![1, 2]);
        let b = a.retain();
        b.with_mut(|v| v.push(3));
        assert_eq!(a.with(|v| v.clone()), vec![1, 2, 3]);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&SharedBuffer::new(vec![1, 2, 3])));
    }

    #[test]
    fn grow_is_visible_through_every_holder() {
        let a: SharedBuffer<Slots<u32>> = SharedBuffer::with_slots(4).unwrap();
        let b = a.retain();
        a.with_mut(|s| s.put(1, 9));
        b.grow(16).unwrap();
        assert_eq!(a.slot_count(), 16);
        assert_eq!(a.with(|s| s.get(1).copied()), Some(9));
    }

    #[test]
    fn failed_grow_keeps_old_block() {
        let a: SharedBuffer<Slots<u64>> = SharedBuffer::with_slots(4).unwrap();
        assert!(a.grow(usize::MAX).is_err());
        assert_eq!(a.slot_count(), 4);
    }
}
