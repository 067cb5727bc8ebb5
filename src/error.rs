//! Error type shared by every container.
//!
//! Only genuine failures are errors. A missing key or an empty container is
//! reported as `None` by the lookup and removal operations.

use std::collections::TryReserveError;
use thiserror::Error;

/// Failure raised by a container operation. The container is left exactly
/// as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Growing a backing buffer failed.
    #[error("memory allocation failed: requested {requested} slots")]
    OutOfMemory {
        /// Number of slots the buffer tried to hold.
        requested: usize,
    },

    /// Positional access past the live elements.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// The rejected index.
        index: usize,
        /// Number of live elements at the time of the call.
        len: usize,
    },

    /// A probe or slot scan found no free slot.
    #[error("container has no free slot")]
    Full,
}

impl Error {
    pub(crate) fn out_of_memory(requested: usize) -> Self {
        Self::OutOfMemory { requested }
    }

    pub(crate) fn out_of_bounds(index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds { index, len }
    }

    pub(crate) fn from_reserve(requested: usize, _err: TryReserveError) -> Self {
        Self::out_of_memory(requested)
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        assert_eq!(
            Error::out_of_bounds(7, 3).to_string(),
            "index 7 out of bounds for length 3"
        );
        assert_eq!(
            Error::out_of_memory(64).to_string(),
            "memory allocation failed: requested 64 slots"
        );
        assert_eq!(Error::Full.to_string(), "container has no free slot");
    }

    #[test]
    fn reserve_failure_maps_to_out_of_memory() {
        let mut v: Vec<u64> = Vec::new();
        let err = v.try_reserve_exact(usize::MAX).unwrap_err();
        assert_eq!(
            Error::from_reserve(usize::MAX, err),
            Error::OutOfMemory {
                requested: usize::MAX
            }
        );
    }
}
