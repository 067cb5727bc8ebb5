//! Element capabilities consumed by the containers.
//!
//! Every container touches its elements only through `ElementType`:
//! - `compare` orders keys and drives sorting.
//! - `copy_element` produces the value handed back by `get`-style calls.
//!   Plain values clone; container handles retain, so the copy aliases the
//!   same storage.
//! - `hash_element` feeds the hash map; it is only available for `Hash` types.
//!
//! Destruction is `Drop`, moves are Rust moves and swaps are `mem::swap`.

use core::cmp::Ordering;
use core::hash::{BuildHasher, Hash};

/// Capability set of an element type stored in a container.
pub trait ElementType: Sized {
    /// Size in bytes of one element slot.
    const SIZE: usize = core::mem::size_of::<Self>();

    /// Three-way comparison.
    fn compare(&self, other: &Self) -> Ordering;

    /// Copy used when a container hands an element back to the caller.
    fn copy_element(&self) -> Self;

    /// Hash under the given hasher state.
    #[inline]
    fn hash_element<S: BuildHasher>(&self, state: &S) -> u64
    where
        Self: Hash,
    {
        state.hash_one(self)
    }
}

macro_rules! ordered_copy_elements {
    ($($t:ty),* $(,)?) => {
        $(
            impl ElementType for $t {
                #[inline]
                fn compare(&self, other: &Self) -> Ordering {
                    self.cmp(other)
                }

                #[inline]
                fn copy_element(&self) -> Self {
                    *self
                }
            }
        )*
    };
}

ordered_copy_elements!(
    u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, usize, isize, bool, char, (),
    &'static str,
);

macro_rules! float_elements {
    ($($t:ty),*) => {
        $(
            impl ElementType for $t {
                #[inline]
                fn compare(&self, other: &Self) -> Ordering {
                    self.total_cmp(other)
                }

                #[inline]
                fn copy_element(&self) -> Self {
                    *self
                }
            }
        )*
    };
}

float_elements!(f32, f64);

impl ElementType for String {
    fn compare(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }

    fn copy_element(&self) -> Self {
        self.clone()
    }
}
