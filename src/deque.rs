//! Deque: double-ended ring buffer behind a shared handle.

use crate::element::ElementType;
use crate::error::Result;
use crate::ring::Ring;
use crate::shared_buffer::SharedBuffer;
use core::cmp::Ordering;
use core::fmt;

/// Double-ended queue with amortized O(1) pushes and pops at both ends.
pub struct Deque<T> {
    buf: SharedBuffer<Ring<T>>,
}

impl<T> Deque<T> {
    pub fn with_capacity(size_hint: usize) -> Result<Self> {
        let ring = Ring::with_capacity(size_hint)?;
        log::trace!("deque created with {} slots", ring.capacity());
        Ok(Self {
            buf: SharedBuffer::new(ring),
        })
    }

    pub fn len(&self) -> usize {
        self.buf.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.borrow().capacity()
    }

    pub fn push_front(&self, value: T) -> Result<()> {
        self.buf.borrow_mut().push_front(value)
    }

    pub fn push_back(&self, value: T) -> Result<()> {
        self.buf.borrow_mut().push_back(value)
    }

    pub fn pop_front(&self) -> Option<T> {
        self.buf.borrow_mut().pop_front()
    }

    pub fn pop_back(&self) -> Option<T> {
        self.buf.borrow_mut().pop_back()
    }

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

    pub fn free(self) {
        self.buf.release();
    }
}

impl<T: ElementType> Deque<T> {
    /// Copy of the first element.
    pub fn peek_front(&self) -> Option<T> {
        self.buf.borrow().front().map(T::copy_element)
    }

    /// Copy of the last element.
    pub fn peek_back(&self) -> Option<T> {
        self.buf.borrow().back().map(T::copy_element)
    }

    /// Snapshot front to back.
    pub fn to_vec(&self) -> Vec<T> {
        self.buf.borrow().copy_all()
    }
}

impl<T> ElementType for Deque<T> {
    fn compare(&self, other: &Self) -> Ordering {
        self.len().cmp(&other.len())
    }

    fn copy_element(&self) -> Self {
        self.clone_handle()
    }
}

impl<T> fmt::Debug for Deque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ring = self.buf.borrow();
        f.debug_struct("Deque")
            .field("len", &ring.len())
            .field("capacity", &ring.capacity())
            .field("refs", &self.buf.ref_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[test]
    fn interleaved_pushes_drain_like_vecdeque() {
        let d = Deque::with_capacity(0).unwrap();
        let mut model = VecDeque::new();
        for i in 0..50 {
            if i % 3 == 0 {
                d.push_front(i).unwrap();
                model.push_front(i);
            } else {
                d.push_back(i).unwrap();
                model.push_back(i);
            }
        }
        assert_eq!(d.to_vec(), model.iter().copied().collect::<Vec<_>>());
        let mut flip = false;
        while !model.is_empty() {
            if flip {
                assert_eq!(d.pop_front(), model.pop_front());
            } else {
                assert_eq!(d.pop_back(), model.pop_back());
            }
            flip = !flip;
        }
        assert!(d.is_empty());
        assert_eq!(d.pop_front(), None);
        assert_eq!(d.pop_back(), None);
    }

    #[test]
    fn peeks_do_not_remove() {
        let d = Deque::with_capacity(4).unwrap();
        assert_eq!(d.peek_front(), None);
        d.push_back("b".to_string()).unwrap();
        d.push_front("a".to_string()).unwrap();
        assert_eq!(d.peek_front().as_deref(), Some("a"));
        assert_eq!(d.peek_back().as_deref(), Some("b"));
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn aliased_handles_share_the_ring() {
        let a = Deque::with_capacity(0).unwrap();
        let b = a.clone_handle();
        a.push_back(1u8).unwrap();
        b.push_front(0).unwrap();
        assert_eq!(a.to_vec(), vec![0, 1]);
        assert_eq!(b.ref_count(), 2);
    }
}
