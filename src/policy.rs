//! Capacity policy shared by every container.
//!
//! Capacities are powers of two with a per-family floor. Containers grow by
//! doubling when they run out of room and shrink once the live count falls
//! to an eighth of the capacity.

use crate::error::{Error, Result};

/// Floor for vector, deque and queue.
pub const SEQUENCE_MIN_CAPACITY: usize = 16;

/// Floor for the hash map table and the tree node pool.
pub const MAP_MIN_CAPACITY: usize = 32;

/// Capacity for a freshly created container.
pub fn initial_capacity(hint: usize, floor: usize) -> Result<usize> {
    hint.checked_next_power_of_two()
        .map(|c| c.max(floor))
        .ok_or_else(|| Error::out_of_memory(hint))
}

/// Smallest admissible capacity holding `required` slots.
pub fn grow_target(required: usize, floor: usize) -> Result<usize> {
    initial_capacity(required, floor)
}

/// New capacity once `live` has dropped to an eighth of `capacity`, or
/// `None` when no shrink is due. `slack` multiplies the live count before
/// rounding so maps keep spare slots after shrinking.
pub fn shrink_target(live: usize, capacity: usize, floor: usize, slack: usize) -> Option<usize> {
    if live > capacity / 8 {
        return None;
    }
    let target = live
        .saturating_mul(slack)
        .max(1)
        .next_power_of_two()
        .max(floor);
    (target < capacity).then_some(target)
}

/// Highest slot occupancy a hash table tolerates (87.5%).
#[inline]
pub fn max_load(capacity: usize) -> usize {
    capacity - capacity / 8
}
