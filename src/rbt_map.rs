//! RbTreeMap: red-black tree over an index-addressed node pool.
//!
//! Nodes live in a flat `Vec<Node>` with keys and values in parallel slot
//! buffers. Links are pool indices; index 0 is the permanent black sentinel
//! and doubles as "no link". Because nothing holds a pointer into the pool,
//! the arrays may be reallocated freely; shrinking compacts live nodes to the
//! low end and rewrites every link that referenced a moved index.
//!
//! Invariants kept between calls:
//! - Slot 0 is used, black, and has no children.
//! - The root is black and has parent 0; no red node has a red child; every
//!   root-to-leaf path crosses the same number of black nodes.
//! - `count` equals the number of used slots, sentinel included.
//! - Every slot below `least_unused` is used.

use crate::buffer::Slots;
use crate::element::ElementType;
use crate::error::{Error, Result};
use crate::policy::{grow_target, initial_capacity, shrink_target, MAP_MIN_CAPACITY};
use crate::shared_buffer::SharedBuffer;
use core::cmp::Ordering;
use core::fmt;

const NIL: usize = 0;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Color {
    Red,
    Black,
}

#[derive(Copy, Clone, Debug)]
struct Node {
    left: usize,
    right: usize,
    parent: usize,
    color: Color,
    used: bool,
}

impl Node {
    const SENTINEL: Node = Node {
        left: NIL,
        right: NIL,
        parent: NIL,
        color: Color::Black,
        used: true,
    };

    const VACANT: Node = Node {
        left: NIL,
        right: NIL,
        parent: NIL,
        color: Color::Black,
        used: false,
    };

    const LEAF: Node = Node {
        left: NIL,
        right: NIL,
        parent: NIL,
        color: Color::Red,
        used: true,
    };
}

struct NodePool<K, V> {
    /// Used slots, sentinel included.
    count: usize,
    least_unused: usize,
    nodes: Vec<Node>,
    keys: Slots<K>,
    values: Slots<V>,
}

impl<K, V> NodePool<K, V> {
    fn with_capacity(capacity: usize) -> Result<Self> {
        let mut nodes = Vec::new();
        nodes
            .try_reserve_exact(capacity)
            .map_err(|e| Error::from_reserve(capacity, e))?;
        nodes.resize(capacity, Node::VACANT);
        nodes[NIL] = Node::SENTINEL;
        Ok(Self {
            count: 1,
            least_unused: 1,
            nodes,
            keys: Slots::zeroed(capacity)?,
            values: Slots::zeroed(capacity)?,
        })
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    fn live(&self) -> usize {
        self.count - 1
    }

    /// Guarantee a free slot for the next `alloc`.
    fn reserve_one(&mut self) -> Result<()> {
        let old = self.capacity();
        if self.count < old {
            return Ok(());
        }
        let target = grow_target(self.count + 1, MAP_MIN_CAPACITY)?;
        self.nodes
            .try_reserve_exact(target - old)
            .map_err(|e| Error::from_reserve(target, e))?;
        self.keys.reserve_to(target)?;
        self.values.reserve_to(target)?;

        self.nodes.resize(target, Node::VACANT);
        self.keys.extend_to(target);
        self.values.extend_to(target);
        log::debug!("tree pool grew from {} to {} nodes", old, target);
        Ok(())
    }

    fn alloc(&mut self, key: K, value: V) -> usize {
        let mut i = self.least_unused;
        while self.nodes[i].used {
            i += 1;
        }
        self.nodes[i] = Node::LEAF;
        self.keys.put(i, key);
        self.values.put(i, value);
        self.count += 1;
        self.least_unused = i + 1;
        i
    }

    fn release(&mut self, i: usize) -> (K, V) {
        self.nodes[i] = Node::VACANT;
        self.count -= 1;
        self.least_unused = self.least_unused.min(i);
        let key = self.keys.take(i).expect("used node holds a key");
        let value = self.values.take(i).expect("used node holds a value");
        (key, value)
    }

    fn key(&self, i: usize) -> &K {
        self.keys.get(i).expect("used node holds a key")
    }
}

enum Descent {
    Found(usize),
    /// Where a new leaf for the key would hang.
    Vacant { parent: usize, left: bool },
}

struct TreeState<K, V> {
    pool: NodePool<K, V>,
    root: usize,
}

impl<K, V> TreeState<K, V> {
    #[inline]
    fn left(&self, x: usize) -> usize {
        self.pool.nodes[x].left
    }

    #[inline]
    fn right(&self, x: usize) -> usize {
        self.pool.nodes[x].right
    }

    #[inline]
    fn parent(&self, x: usize) -> usize {
        self.pool.nodes[x].parent
    }

    #[inline]
    fn color(&self, x: usize) -> Color {
        self.pool.nodes[x].color
    }

    #[inline]
    fn set_color(&mut self, x: usize, color: Color) {
        self.pool.nodes[x].color = color;
    }

    fn minimum(&self, mut x: usize) -> usize {
        while self.left(x) != NIL {
            x = self.left(x);
        }
        x
    }

    fn maximum(&self, mut x: usize) -> usize {
        while self.right(x) != NIL {
            x = self.right(x);
        }
        x
    }

    fn rotate_left(&mut self, x: usize) {
        let y = self.right(x);
        let y_left = self.left(y);
        self.pool.nodes[x].right = y_left;
        if y_left != NIL {
            self.pool.nodes[y_left].parent = x;
        }
        let p = self.parent(x);
        self.pool.nodes[y].parent = p;
        if p == NIL {
            self.root = y;
        } else if x == self.left(p) {
            self.pool.nodes[p].left = y;
        } else {
            self.pool.nodes[p].right = y;
        }
        self.pool.nodes[y].left = x;
        self.pool.nodes[x].parent = y;
    }

    fn rotate_right(&mut self, x: usize) {
        let y = self.left(x);
        let y_right = self.right(y);
        self.pool.nodes[x].left = y_right;
        if y_right != NIL {
            self.pool.nodes[y_right].parent = x;
        }
        let p = self.parent(x);
        self.pool.nodes[y].parent = p;
        if p == NIL {
            self.root = y;
        } else if x == self.right(p) {
            self.pool.nodes[p].right = y;
        } else {
            self.pool.nodes[p].left = y;
        }
        self.pool.nodes[y].right = x;
        self.pool.nodes[x].parent = y;
    }

    fn insert_fixup(&mut self, mut z: usize) {
        while self.color(self.parent(z)) == Color::Red {
            let p = self.parent(z);
            let g = self.parent(p);
            if p == self.left(g) {
                let uncle = self.right(g);
                if self.color(uncle) == Color::Red {
                    self.set_color(p, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(g, Color::Red);
                    z = g;
                } else {
                    if z == self.right(p) {
                        z = p;
                        self.rotate_left(z);
                    }
                    let p = self.parent(z);
                    let g = self.parent(p);
                    self.set_color(p, Color::Black);
                    self.set_color(g, Color::Red);
                    self.rotate_right(g);
                }
            } else {
                let uncle = self.left(g);
                if self.color(uncle) == Color::Red {
                    self.set_color(p, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(g, Color::Red);
                    z = g;
                } else {
                    if z == self.left(p) {
                        z = p;
                        self.rotate_right(z);
                    }
                    let p = self.parent(z);
                    let g = self.parent(p);
                    self.set_color(p, Color::Black);
                    self.set_color(g, Color::Red);
                    self.rotate_left(g);
                }
            }
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    /// Replace the subtree at `u` with the one at `v`. Sets `v`'s parent even
    /// when `v` is the sentinel; the delete fixup relies on it.
    fn transplant(&mut self, u: usize, v: usize) {
        let p = self.parent(u);
        if p == NIL {
            self.root = v;
        } else if u == self.left(p) {
            self.pool.nodes[p].left = v;
        } else {
            self.pool.nodes[p].right = v;
        }
        self.pool.nodes[v].parent = p;
    }

    fn delete_fixup(&mut self, mut x: usize) {
        while x != self.root && self.color(x) == Color::Black {
            let p = self.parent(x);
            if x == self.left(p) {
                let mut w = self.right(p);
                debug_assert!(w != NIL, "double-black node without sibling");
                if self.color(w) == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(p, Color::Red);
                    self.rotate_left(p);
                    w = self.right(self.parent(x));
                }
                if self.color(self.left(w)) == Color::Black
                    && self.color(self.right(w)) == Color::Black
                {
                    self.set_color(w, Color::Red);
                    x = self.parent(x);
                } else {
                    if self.color(self.right(w)) == Color::Black {
                        let wl = self.left(w);
                        self.set_color(wl, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_right(w);
                        w = self.right(self.parent(x));
                    }
                    let p = self.parent(x);
                    self.set_color(w, self.color(p));
                    self.set_color(p, Color::Black);
                    let wr = self.right(w);
                    self.set_color(wr, Color::Black);
                    self.rotate_left(p);
                    x = self.root;
                }
            } else {
                let mut w = self.left(p);
                debug_assert!(w != NIL, "double-black node without sibling");
                if self.color(w) == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(p, Color::Red);
                    self.rotate_right(p);
                    w = self.left(self.parent(x));
                }
                if self.color(self.right(w)) == Color::Black
                    && self.color(self.left(w)) == Color::Black
                {
                    self.set_color(w, Color::Red);
                    x = self.parent(x);
                } else {
                    if self.color(self.left(w)) == Color::Black {
                        let wr = self.right(w);
                        self.set_color(wr, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_left(w);
                        w = self.left(self.parent(x));
                    }
                    let p = self.parent(x);
                    self.set_color(w, self.color(p));
                    self.set_color(p, Color::Black);
                    let wl = self.left(w);
                    self.set_color(wl, Color::Black);
                    self.rotate_right(p);
                    x = self.root;
                }
            }
        }
        self.set_color(x, Color::Black);
    }

    /// Unlink node `z` and free its slot.
    fn remove_node(&mut self, z: usize) -> (K, V) {
        let mut removed_color = self.color(z);
        let x;
        if self.left(z) == NIL {
            x = self.right(z);
            self.transplant(z, x);
        } else if self.right(z) == NIL {
            x = self.left(z);
            self.transplant(z, x);
        } else {
            let y = self.minimum(self.right(z));
            removed_color = self.color(y);
            x = self.right(y);
            if self.parent(y) == z {
                self.pool.nodes[x].parent = y;
            } else {
                self.transplant(y, x);
                let zr = self.right(z);
                self.pool.nodes[y].right = zr;
                self.pool.nodes[zr].parent = y;
            }
            self.transplant(z, y);
            let zl = self.left(z);
            self.pool.nodes[y].left = zl;
            self.pool.nodes[zl].parent = y;
            self.set_color(y, self.color(z));
        }
        if removed_color == Color::Black {
            self.delete_fixup(x);
        }
        let entry = self.pool.release(z);
        // The fixup may have scribbled on the sentinel's parent link.
        self.pool.nodes[NIL] = Node::SENTINEL;
        entry
    }

    /// Move every used node into the lowest free slots, then cut the arrays
    /// down to `target`.
    fn compact(&mut self, target: usize) {
        let old = self.pool.capacity();
        let mut free = 1;
        for j in 1..old {
            if !self.pool.nodes[j].used {
                continue;
            }
            if j != free {
                self.move_node(j, free);
            }
            free += 1;
        }
        debug_assert_eq!(free, self.pool.count);
        self.pool.nodes.truncate(target);
        self.pool.nodes.shrink_to_fit();
        self.pool.keys.shrink(target);
        self.pool.values.shrink(target);
        self.pool.least_unused = free;
        self.pool.nodes[NIL] = Node::SENTINEL;
        log::debug!(
            "tree pool compacted from {} to {} nodes ({} live)",
            old,
            target,
            self.pool.live()
        );
    }

    fn move_node(&mut self, from: usize, to: usize) {
        let node = self.pool.nodes[from];
        self.pool.nodes[to] = node;
        self.pool.nodes[from] = Node::VACANT;
        self.pool.keys.move_slot(from, to);
        self.pool.values.move_slot(from, to);
        if node.left != NIL {
            self.pool.nodes[node.left].parent = to;
        }
        if node.right != NIL {
            self.pool.nodes[node.right].parent = to;
        }
        if node.parent == NIL {
            self.root = to;
        } else if self.left(node.parent) == from {
            self.pool.nodes[node.parent].left = to;
        } else {
            self.pool.nodes[node.parent].right = to;
        }
    }

    fn after_remove(&mut self) {
        let capacity = self.pool.capacity();
        if let Some(target) = shrink_target(self.pool.live(), capacity, MAP_MIN_CAPACITY, 2) {
            self.compact(target);
        }
    }

    /// Node indices in key order.
    fn in_order(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.pool.live());
        let mut stack = Vec::new();
        let mut x = self.root;
        while x != NIL || !stack.is_empty() {
            while x != NIL {
                stack.push(x);
                x = self.left(x);
            }
            if let Some(top) = stack.pop() {
                out.push(top);
                x = self.right(top);
            }
        }
        out
    }
}

impl<K: ElementType, V> TreeState<K, V> {
    fn find(&self, key: &K) -> usize {
        match self.descend(key) {
            Descent::Found(x) => x,
            Descent::Vacant { .. } => NIL,
        }
    }

    fn descend(&self, key: &K) -> Descent {
        let mut parent = NIL;
        let mut x = self.root;
        let mut left = false;
        while x != NIL {
            parent = x;
            match key.compare(self.pool.key(x)) {
                Ordering::Less => {
                    x = self.left(x);
                    left = true;
                }
                Ordering::Greater => {
                    x = self.right(x);
                    left = false;
                }
                Ordering::Equal => return Descent::Found(x),
            }
        }
        Descent::Vacant { parent, left }
    }
}

impl<K, V> TreeState<K, V> {
    /// Hang a new red leaf under `parent` and rebalance. The pool must have
    /// a free slot.
    fn attach(&mut self, parent: usize, left: bool, key: K, value: V) {
        let z = self.pool.alloc(key, value);
        self.pool.nodes[z].parent = parent;
        if parent == NIL {
            self.root = z;
        } else if left {
            self.pool.nodes[parent].left = z;
        } else {
            self.pool.nodes[parent].right = z;
        }
        self.insert_fixup(z);
    }

    fn entry_at(&self, x: usize) -> Option<(K, V)>
    where
        K: ElementType,
        V: ElementType,
    {
        let key = self.pool.keys.get(x)?.copy_element();
        let value = self.pool.values.get(x)?.copy_element();
        Some((key, value))
    }
}

/// Ordered map backed by a red-black tree in a compacting node pool.
/// Handles returned by [`RbTreeMap::clone_handle`] alias one tree.
pub struct RbTreeMap<K, V> {
    buf: SharedBuffer<TreeState<K, V>>,
}

impl<K: ElementType, V> RbTreeMap<K, V> {
    /// Create an empty map with room for `size_hint` entries (at least 32
    /// pool slots, sentinel included).
    pub fn with_capacity(size_hint: usize) -> Result<Self> {
        let capacity = initial_capacity(size_hint.saturating_add(1), MAP_MIN_CAPACITY)?;
        let pool = NodePool::with_capacity(capacity)?;
        log::trace!("tree map created with {} nodes", capacity);
        Ok(Self {
            buf: SharedBuffer::new(TreeState { pool, root: NIL }),
        })
    }

    /// Insert or update. A replaced value is dropped after the tree is
    /// released.
    pub fn set(&self, key: K, value: V) -> Result<()> {
        let replaced = {
            let mut st = self.buf.borrow_mut();
            match st.descend(&key) {
                Descent::Found(x) => st.pool.values.put(x, value),
                Descent::Vacant { parent, left } => {
                    // Growth appends slots, so `parent` stays valid.
                    st.pool.reserve_one()?;
                    st.attach(parent, left, key, value);
                    None
                }
            }
        };
        drop(replaced);
        Ok(())
    }

    pub fn has_key(&self, key: &K) -> bool {
        self.buf.borrow().find(key) != NIL
    }

    /// Remove `key`, returning its value.
    pub fn delete(&self, key: &K) -> Option<V> {
        let (old_key, value) = {
            let mut st = self.buf.borrow_mut();
            let z = st.find(key);
            if z == NIL {
                return None;
            }
            let entry = st.remove_node(z);
            st.after_remove();
            entry
        };
        drop(old_key);
        Some(value)
    }
}

impl<K: ElementType, V: ElementType> RbTreeMap<K, V> {
    /// Copy of the value stored under `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        let st = self.buf.borrow();
        let z = st.find(key);
        if z == NIL {
            return None;
        }
        let value = st.pool.values.get(z).map(V::copy_element);
        value
    }

    /// Smallest key and its value.
    pub fn get_min(&self) -> Option<(K, V)> {
        let st = self.buf.borrow();
        if st.root == NIL {
            return None;
        }
        let entry = st.entry_at(st.minimum(st.root));
        entry
    }

    /// Largest key and its value.
    pub fn get_max(&self) -> Option<(K, V)> {
        let st = self.buf.borrow();
        if st.root == NIL {
            return None;
        }
        let entry = st.entry_at(st.maximum(st.root));
        entry
    }

    /// Snapshot of all entries in key order.
    pub fn to_vec(&self) -> Vec<(K, V)> {
        let st = self.buf.borrow();
        let entries = st
            .in_order()
            .into_iter()
            .filter_map(|x| st.entry_at(x))
            .collect();
        entries
    }
}

impl<K, V> RbTreeMap<K, V> {
    pub fn len(&self) -> usize {
        self.buf.borrow().pool.live()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pool slots, sentinel included.
    pub fn capacity(&self) -> usize {
        self.buf.borrow().pool.capacity()
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

    /// Release this handle. Keys and values go with the last handle.
    pub fn free(self) {
        self.buf.release();
    }
}

impl<K, V> ElementType for RbTreeMap<K, V> {
    fn compare(&self, other: &Self) -> Ordering {
        self.len().cmp(&other.len())
    }

    fn copy_element(&self) -> Self {
        self.clone_handle()
    }
}

impl<K, V> fmt::Debug for RbTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.buf.borrow();
        f.debug_struct("RbTreeMap")
            .field("len", &st.pool.live())
            .field("capacity", &st.pool.capacity())
            .field("refs", &self.buf.ref_count())
            .finish()
    }
}

#[cfg(test)]
impl<K: ElementType, V> RbTreeMap<K, V> {
    /// Indices above the sentinel still marked used.
    pub(crate) fn used_slots(&self) -> Vec<usize> {
        let st = self.buf.borrow();
        (1..st.pool.capacity())
            .filter(|&i| st.pool.nodes[i].used)
            .collect()
    }

    pub(crate) fn root_is_sentinel(&self) -> bool {
        self.buf.borrow().root == NIL
    }

    /// Panics if any tree or pool invariant is broken. Returns the black
    /// height.
    pub(crate) fn check_invariants(&self) -> usize {
        let st = self.buf.borrow();
        let pool = &st.pool;
        let cap = pool.capacity();
        assert!(cap.is_power_of_two() && cap >= MAP_MIN_CAPACITY);
        assert_eq!(pool.keys.len(), cap);
        assert_eq!(pool.values.len(), cap);
        let s = pool.nodes[NIL];
        assert!(s.used && s.color == Color::Black && s.left == NIL && s.right == NIL);
        assert!(pool.count <= cap);
        assert!((0..pool.least_unused.min(cap)).all(|i| pool.nodes[i].used));
        let used = (1..cap).filter(|&i| pool.nodes[i].used).count();
        assert_eq!(used + 1, pool.count);
        for i in 1..cap {
            assert_eq!(pool.keys.is_live(i), pool.nodes[i].used);
            assert_eq!(pool.values.is_live(i), pool.nodes[i].used);
        }
        if st.root != NIL {
            assert_eq!(st.color(st.root), Color::Black);
            assert_eq!(st.parent(st.root), NIL);
        }
        let order = st.in_order();
        assert_eq!(order.len(), pool.live());
        for pair in order.windows(2) {
            assert_eq!(pool.key(pair[0]).compare(pool.key(pair[1])), Ordering::Less);
        }
        black_height(&st, st.root)
    }
}

#[cfg(test)]
fn black_height<K, V>(st: &TreeState<K, V>, x: usize) -> usize {
    if x == NIL {
        return 1;
    }
    let node = st.pool.nodes[x];
    assert!(node.used, "link to unused slot {}", x);
    for child in [node.left, node.right] {
        if child != NIL {
            assert_eq!(st.parent(child), x, "broken parent link");
            if node.color == Color::Red {
                assert_eq!(st.color(child), Color::Black, "red node with red child");
            }
        }
    }
    let lh = black_height(st, node.left);
    let rh = black_height(st, node.right);
    assert_eq!(lh, rh, "black height differs below {}", x);
    lh + usize::from(node.color == Color::Black)
}
