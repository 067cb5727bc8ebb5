//! Queue: FIFO over the same ring buffer as `Deque`.

use crate::element::ElementType;
use crate::error::Result;
use crate::ring::Ring;
use crate::shared_buffer::SharedBuffer;
use core::cmp::Ordering;
use core::fmt;

pub struct Queue<T> {
    buf: SharedBuffer<Ring<T>>,
}

impl<T> Queue<T> {
    pub fn with_capacity(size_hint: usize) -> Result<Self> {
        let ring = Ring::with_capacity(size_hint)?;
        log::trace!("queue created with {} slots", ring.capacity());
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

    /// Enqueue at the back.
    pub fn push(&self, value: T) -> Result<()> {
        self.buf.borrow_mut().push_back(value)
    }

    /// Dequeue from the front.
    pub fn pop(&self) -> Option<T> {
        self.buf.borrow_mut().pop_front()
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

impl<T: ElementType> Queue<T> {
    /// Copy of the element `pop` would return.
    pub fn peek_front(&self) -> Option<T> {
        self.buf.borrow().front().map(T::copy_element)
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.buf.borrow().copy_all()
    }
}

impl<T> ElementType for Queue<T> {
    fn compare(&self, other: &Self) -> Ordering {
        self.len().cmp(&other.len())
    }

    fn copy_element(&self) -> Self {
        self.clone_handle()
    }
}

impl<T> fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ring = self.buf.borrow();
        f.debug_struct("Queue")
            .field("len", &ring.len())
            .field("capacity", &ring.capacity())
            .field("refs", &self.buf.ref_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_across_growth_and_wrap() {
        let q = Queue::with_capacity(0).unwrap();
        let mut next_out = 0;
        for i in 0..300 {
            q.push(i).unwrap();
            if i % 4 == 3 {
                assert_eq!(q.pop(), Some(next_out));
                next_out += 1;
            }
        }
        assert_eq!(q.peek_front(), Some(next_out));
        while let Some(v) = q.pop() {
            assert_eq!(v, next_out);
            next_out += 1;
        }
        assert_eq!(next_out, 300);
        assert_eq!(q.capacity(), 16);
    }

    #[test]
    fn empty_queue_reports_none() {
        let q: Queue<String> = Queue::with_capacity(8).unwrap();
        assert_eq!(q.pop(), None);
        assert_eq!(q.peek_front(), None);
    }
}
