//! shared-containers: single-threaded containers whose storage is shared
//! between handles by reference counting.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small set of containers (vector, deque, queue, hash map,
//!   ordered map) that all sit on one reference-counted storage primitive
//!   and one growth policy, so each piece can be reasoned about on its own.
//! - Layers:
//!   - ElementType: per-type capability set (compare, copy, hash, size).
//!     Destroy is `Drop`, move is a Rust move, swap is `mem::swap`.
//!   - Slots<T>: fixed-length block of optional slots; `None` is the
//!     zero-filled vacant state. Growth is split into a fallible reserve
//!     and an infallible commit.
//!   - SharedBuffer<T>: `Rc<RefCell<T>>` with explicit retain/release.
//!   - Containers: `Vector`, `Deque`, `Queue`, `HashMap`, `RbTreeMap`, each
//!     a thin handle over a `SharedBuffer` of its state.
//!
//! Constraints
//! - Single-threaded: handles are `!Send`/`!Sync` (no atomics).
//! - Capacities are powers of two: at least 16 slots for sequences and 32
//!   for maps. Containers double when full and shrink once the live count
//!   falls to an eighth of the capacity.
//! - Allocation failure is reported as `Error::OutOfMemory` and leaves the
//!   container unchanged.
//!
//! Copy semantics
//! - `clone_handle` (and `ElementType::copy_element` for containers) adds
//!   a holder to the same storage. Copies alias; there is no deep copy.
//!   Storage and every live element are dropped with the last handle.
//! - Scalar and string elements copy by value.
//!
//! Reentrancy policy
//! - Mutators take `&self` and hold the storage's `RefCell` borrow while
//!   the structure may be inconsistent. User code runs inside that window
//!   only through `ElementType::compare`, `copy_element` and
//!   `hash_element`; reentering the same container from there panics.
//! - Removed or replaced elements are handed out of the borrow before they
//!   are dropped, so `Drop` for keys and values may reenter safely.
//!
//! Hashing
//! - Each hash map entry stores its `u64` hash. Rehashing and probing use
//!   the stored hash; `K: Hash` is called once per `set`/`get`/`delete`.
//! - Rehashing happens in place: the generation tag flips and entries
//!   still carrying the old tag are moved (or swapped) into position.
//!
//! Ordered map
//! - Tree nodes live in an index-addressed pool with slot 0 as the shared
//!   black sentinel. Shrinking compacts live nodes to the low end and
//!   rewrites every link that pointed at a moved slot.
//!
//! Notes and non-goals
//! - No iteration protocol beyond snapshots (`to_vec`).
//! - No thread-safe variant.
//! - Logging goes through the `log` facade (`debug!` on capacity changes,
//!   `trace!` on creation); no logger is installed by this crate.

pub mod buffer;
mod deque;
pub mod element;
mod error;
mod hash_map;
mod hash_map_proptest;
pub mod policy;
mod queue;
mod rbt_map;
mod rbt_map_proptest;
mod ring;
mod shared_buffer;
mod vector;

// Public surface
pub use buffer::Slots;
pub use deque::Deque;
pub use element::ElementType;
pub use error::{Error, Result};
pub use hash_map::HashMap;
pub use queue::Queue;
pub use rbt_map::RbTreeMap;
pub use shared_buffer::SharedBuffer;
pub use vector::Vector;
