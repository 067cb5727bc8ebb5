//! Slots: the fixed-length element block behind every container.
//!
//! A slot is either vacant (`None`, the zero-filled state of a fresh block)
//! or holds one live element. Growth is split into a fallible `reserve_to`
//! and an infallible `extend_to` so a container can reserve several blocks
//! before committing any of them.

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct Slots<T> {
    slots: Vec<Option<T>>,
}

impl<T> Slots<T> {
    /// Allocate `len` vacant slots.
    pub fn zeroed(len: usize) -> Result<Self> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(len)
            .map_err(|e| Error::from_reserve(len, e))?;
        slots.resize_with(len, || None);
        Ok(Self { slots })
    }

    /// Number of slots, live or vacant.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Make room for `new_len` slots without changing the visible length.
    pub fn reserve_to(&mut self, new_len: usize) -> Result<()> {
        let additional = new_len.saturating_sub(self.slots.len());
        self.slots
            .try_reserve_exact(additional)
            .map_err(|e| Error::from_reserve(new_len, e))
    }

    /// Append vacant slots up to `new_len`. Only reallocates if `reserve_to`
    /// was skipped.
    pub fn extend_to(&mut self, new_len: usize) {
        if new_len > self.slots.len() {
            self.slots.resize_with(new_len, || None);
        }
    }

    /// Reserve and extend in one step.
    pub fn grow(&mut self, new_len: usize) -> Result<()> {
        self.reserve_to(new_len)?;
        self.extend_to(new_len);
        Ok(())
    }

    /// Cut the block down to `new_len` slots and return the spare memory.
    /// Every slot past `new_len` must already be vacant.
    pub fn shrink(&mut self, new_len: usize) {
        debug_assert!(self.slots[new_len.min(self.slots.len())..]
            .iter()
            .all(Option::is_none));
        self.slots.truncate(new_len);
        self.slots.shrink_to_fit();
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    #[inline]
    pub fn is_live(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Store `value` in slot `index`, returning whatever was there.
    #[inline]
    pub fn put(&mut self, index: usize, value: T) -> Option<T> {
        self.slots[index].replace(value)
    }

    /// Empty slot `index`, returning its element.
    #[inline]
    pub fn take(&mut self, index: usize) -> Option<T> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    #[inline]
    pub fn swap(&mut self, a: usize, b: usize) {
        self.slots.swap(a, b);
    }

    /// Move the content of `from` into `to`, leaving `from` vacant.
    /// Returns what `to` held before.
    #[inline]
    pub fn move_slot(&mut self, from: usize, to: usize) -> Option<T> {
        let moved = self.slots[from].take();
        core::mem::replace(&mut self.slots[to], moved)
    }

    /// Rotate the whole block so slot `mid` becomes slot 0.
    pub fn rotate_left(&mut self, mid: usize) {
        self.slots.rotate_left(mid);
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Option<T>] {
        &mut self.slots
    }

    /// Live elements with their slot index.
    pub fn iter_live(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|v| (i, v)))
    }
}
