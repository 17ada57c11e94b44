//! An ordered map backed by an arena-allocated AVL tree.
//!
//! Nodes live in a slot arena and refer to each other by index, so the
//! parent back-references used for iteration can never dangle and teardown
//! never walks the node graph. Lookups, insertions and removals are
//! _O(log n)_; iteration is amortized _O(1)_ per step and needs no
//! auxiliary storage.

// Conventions used in comments:
// - The height of a node `x` is denoted `h(x)`; a missing subtree has
//   height -1 and a leaf has height 0.
// - The balance factor of `x` is `h(left(x)) - h(right(x))`.
//
// The fundamental invariants of the tree are:
// 1. BST ordering: keys in the left subtree of `x` are less than `key(x)`,
//    keys in the right subtree are greater. Keys are unique.
// 2. AVL balance: every balance factor is -1, 0 or 1.
// 3. Cached heights are exact: `h(x) = 1 + max(h(left(x)), h(right(x)))`.
// 4. Parent links mirror child links exactly.
//
// `assert_invariants` checks all four, plus arena/free-list consistency.

use core::{borrow::Borrow, cmp::Ordering, fmt};

use thiserror::Error;

mod cursor;
mod debug;
mod entry;
mod iter;
mod node;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use cursor::{Cursor, CursorMut};
pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use iter::Iter;

use entry::InsertAt;
use node::{Arena, Dir, Link, Node, NodeIdx};

/// The error returned by [`AvlTree::get`] and [`AvlTree::get_mut`] when the
/// key is absent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("key not found")]
pub struct NotFound;

/// An ordered map backed by an arena-allocated AVL tree.
///
/// Entries are ordered by key; `K` need only implement [`Ord`].
///
/// Re-inserting an existing key overwrites the stored value in place: the
/// key already in the map, the tree shape and the entry count are all left
/// untouched.
pub struct AvlTree<K, V> {
    nodes: Arena<K, V>,
    root: Link,
    len: usize,
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<K, V> {
        AvlTree {
            nodes: Arena::new(),
            root: None,
            len: 0,
        }
    }

    /// Returns a new empty tree with room for `capacity` entries before the
    /// arena reallocates.
    pub fn with_capacity(capacity: usize) -> AvlTree<K, V> {
        AvlTree {
            nodes: Arena::with_capacity(capacity),
            root: None,
            len: 0,
        }
    }

    /// Returns `true` if the map contains no entries.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of entries in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the height of the tree: -1 when empty, 0 for a single entry.
    pub fn height(&self) -> i8 {
        self.nodes.height(self.root)
    }

    /// Removes all entries, retaining the arena allocation.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        let reachable = match self.root {
            Some(root) => {
                assert!(self.nodes[root].parent.is_none(), "root has a parent");
                self.assert_invariants_at(root, None, None)
            }
            None => 0,
        };

        assert_eq!(reachable, self.len, "len does not match reachable nodes");
        self.nodes.assert_consistent(self.len);
    }

    // Checks the subtree at `node` against `(lower, upper)` exclusive key
    // bounds and returns its node count.
    fn assert_invariants_at(&self, node: NodeIdx, lower: Option<&K>, upper: Option<&K>) -> usize {
        let n = &self.nodes[node];

        if let Some(lower) = lower {
            assert!(*lower < n.key, "BST ordering violated");
        }
        if let Some(upper) = upper {
            assert!(n.key < *upper, "BST ordering violated");
        }

        let left_height = self.nodes.height(n.left());
        let right_height = self.nodes.height(n.right());

        assert_eq!(n.height, 1 + left_height.max(right_height), "stale height");
        assert!((left_height - right_height).abs() <= 1, "AVL balance violated");

        let mut count = 1;

        if let Some(left) = n.left() {
            assert_eq!(self.nodes[left].parent, Some(node), "broken parent link");
            count += self.assert_invariants_at(left, lower, Some(&n.key));
        }

        if let Some(right) = n.right() {
            assert_eq!(self.nodes[right].parent, Some(node), "broken parent link");
            count += self.assert_invariants_at(right, Some(&n.key), upper);
        }

        count
    }

    // Lookup =================================================================

    // Descends from the root comparing keys. `Ok` carries the matching node;
    // `Err` carries the position where the key would be attached.
    pub(crate) fn locate<Q>(&self, key: &Q) -> Result<NodeIdx, InsertAt>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = match self.root {
            Some(root) => root,
            None => return Err(InsertAt::Root),
        };

        loop {
            let dir = match key.cmp(self.nodes[cur].key.borrow()) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return Ok(cur),
                Ordering::Greater => Dir::Right,
            };

            match self.nodes[cur].child(dir) {
                Some(child) => cur = child,
                None => return Err(InsertAt::Child { parent: cur, dir }),
            }
        }
    }

    /// Returns `true` if the map contains an entry for `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.locate(key).is_ok()
    }

    /// Returns a reference to the value associated with `key`.
    ///
    /// An absent key is an error: no default value is fabricated.
    pub fn get<Q>(&self, key: &Q) -> Result<&V, NotFound>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.locate(key) {
            Ok(node) => Ok(&self.nodes[node].value),
            Err(_) => Err(NotFound),
        }
    }

    /// Returns a mutable reference to the value associated with `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V, NotFound>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.locate(key) {
            Ok(node) => Ok(&mut self.nodes[node].value),
            Err(_) => Err(NotFound),
        }
    }

    /// Returns a cursor pointing to the entry for `key`, or to the "ghost"
    /// non-element if the key is absent.
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Cursor {
            node: self.locate(key).ok(),
            tree: self,
        }
    }

    /// Returns an editing cursor pointing to the entry for `key`, or to the
    /// "ghost" non-element if the key is absent.
    pub fn find_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        CursorMut {
            node: self.locate(key).ok(),
            tree: self,
        }
    }

    /// Returns the entry with the minimum key.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let node = &self.nodes[self.first_node()?];
        Some((&node.key, &node.value))
    }

    /// Returns the entry with the maximum key.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let node = &self.nodes[self.last_node()?];
        Some((&node.key, &node.value))
    }

    /// Removes and returns the entry with the minimum key.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let (entry, _) = self.remove_at(self.first_node()?);
        Some(entry)
    }

    /// Removes and returns the entry with the maximum key.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let (entry, _) = self.remove_at(self.last_node()?);
        Some(entry)
    }

    /// Returns the entry for `key`, which may be vacant or occupied.
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V> {
        match self.locate(&key) {
            Ok(node) => Entry::Occupied(OccupiedEntry { tree: self, node }),
            Err(at) => Entry::Vacant(VacantEntry {
                tree: self,
                key,
                at,
            }),
        }
    }

    // Insertion ==============================================================

    /// Inserts a key/value entry into the tree.
    ///
    /// If the map already contains `key`, the stored value is overwritten in
    /// place; the key already in the map, the tree shape and [`len`] are all
    /// unchanged.
    ///
    /// Returns an editing cursor pointing to the inserted or updated entry.
    ///
    /// This operation completes in _O(log(n))_ time.
    ///
    /// [`len`]: AvlTree::len
    pub fn insert(&mut self, key: K, value: V) -> CursorMut<'_, K, V> {
        let node = match self.locate(&key) {
            Ok(node) => {
                // Overwrite: no new node, no height change, no rebalance.
                self.nodes[node].value = value;
                node
            }
            Err(at) => self.insert_at(at, key, value),
        };

        CursorMut {
            node: Some(node),
            tree: self,
        }
    }

    // Attaches a new leaf at `at` and restores the AVL invariant on the path
    // back to the root.
    pub(crate) fn insert_at(&mut self, at: InsertAt, key: K, value: V) -> NodeIdx {
        let node = match at {
            InsertAt::Root => {
                debug_assert!(self.root.is_none());

                let node = self.nodes.alloc(Node::new(key, value, None));
                self.root = Some(node);
                node
            }
            InsertAt::Child { parent, dir } => {
                debug_assert!(self.nodes[parent].child(dir).is_none());

                let node = self.nodes.alloc(Node::new(key, value, Some(parent)));
                self.nodes[parent].set_child(dir, Some(node));
                self.rebalance_path(Some(parent));
                node
            }
        };

        self.len += 1;
        node
    }

    // Removal ================================================================

    /// Removes the entry for `key`, returning its value.
    ///
    /// Removing an absent key is a silent no-op, not an error: the tree is
    /// untouched and `None` is returned.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.locate(key).ok()?;
        let ((_, value), _) = self.remove_at(node);
        Some(value)
    }

    // Removes the entry at `node`.
    //
    // Returns the removed key/value pair and the position holding the
    // removed entry's in-order successor after the removal (`None` if the
    // removed entry was the maximum). Cursors use the second element to
    // re-position themselves.
    pub(crate) fn remove_at(&mut self, node: NodeIdx) -> ((K, V), Link) {
        // With two children, the successor's key and value move into `node`
        // (the spliced-out slot then holds the removed entry's payload);
        // with fewer, `node` itself is spliced out.
        let (target, successor) = match (self.nodes[node].left(), self.nodes[node].right()) {
            (Some(_), Some(right)) => {
                let succ = self.min_in_subtree(right);
                self.nodes.swap_payload(node, succ);

                // The successor entry now lives at `node`.
                (succ, Some(node))
            }
            _ => (node, self.successor(node)),
        };

        // `target` has at most one child; splice it out.
        let parent = self.nodes[target].parent;
        let child = self.nodes[target].left().or(self.nodes[target].right());

        self.replace_child_or_set_root(parent, target, child);
        if let Some(child) = child {
            self.nodes[child].parent = parent;
        }

        let removed = self.nodes.free(target);
        self.len -= 1;

        self.rebalance_path(parent);

        ((removed.key, removed.value), successor)
    }

    // Rebalancing ============================================================

    // Recomputes the cached height of `node` from its children.
    #[inline]
    fn update_height(&mut self, node: NodeIdx) {
        let height = 1 + self
            .nodes
            .height(self.nodes[node].left())
            .max(self.nodes.height(self.nodes[node].right()));
        self.nodes[node].height = height;
    }

    // Walks from `from` up to the root, restoring the AVL invariant at each
    // node. A single rotation event per ancestor suffices, so one pass
    // restores the invariant for the whole tree.
    fn rebalance_path(&mut self, mut link: Link) {
        while let Some(node) = link {
            // A rotation moves `node` below its replacement; grab the parent
            // before that happens.
            let parent = self.nodes[node].parent;
            self.rebalance_at(node);
            link = parent;
        }
    }

    // Restores the AVL invariant at `node` after a structural change below
    // it, assuming both subtrees already satisfy it.
    fn rebalance_at(&mut self, node: NodeIdx) {
        let left_height = self.nodes.height(self.nodes[node].left());
        let right_height = self.nodes.height(self.nodes[node].right());

        // The heavy side, if the balance factor is out of range.
        let dir = if left_height - right_height > 1 {
            Dir::Left
        } else if right_height - left_height > 1 {
            Dir::Right
        } else {
            self.update_height(node);
            return;
        };

        let child = self.nodes[node]
            .child(dir)
            .expect("heavy subtree is missing");

        let outer = self.nodes.height(self.nodes[child].child(dir));
        let inner = self.nodes.height(self.nodes[child].child(!dir));

        // Single rotation when the outer grandchild is at least as tall as
        // the inner one; otherwise rotate the inner grandchild up first.
        let up = if outer >= inner {
            child
        } else {
            let grandchild = self.nodes[child]
                .child(!dir)
                .expect("inner grandchild is missing");
            self.rotate(child, grandchild);
            grandchild
        };

        self.rotate(node, up);
    }

    // Performs a rotation, moving `up` up and its parent `down` down.
    //
    // Heights of both nodes are recomputed, demoted node first.
    fn rotate(&mut self, down: NodeIdx, up: NodeIdx) {
        // - `down` becomes the `dir` child of `up`.
        // - `across` goes from the `dir` child of `up` to the `!dir` child
        //   of `down`.
        let dir = if self.nodes[down].right() == Some(up) {
            Dir::Left
        } else {
            Dir::Right
        };

        debug_assert_eq!(self.nodes[down].child(!dir), Some(up));

        let across = self.nodes[up].child(dir);
        self.nodes[down].set_child(!dir, across);
        if let Some(across) = across {
            self.nodes[across].parent = Some(down);
        }

        let parent = self.nodes[down].parent;
        self.nodes[up].set_child(dir, Some(down));
        self.nodes[down].parent = Some(up);
        self.nodes[up].parent = parent;

        self.replace_child_or_set_root(parent, down, Some(up));

        self.update_height(down);
        self.update_height(up);
    }

    // Support methods ========================================================

    // Replaces the child pointer of `parent` pointing at `old_child` with
    // `new_child`, or the root pointer if `parent` is `None`.
    //
    // `new_child`'s parent link is not updated.
    #[inline]
    fn replace_child_or_set_root(&mut self, parent: Link, old_child: NodeIdx, new_child: Link) {
        match parent {
            Some(parent) => {
                let dir = self.which_child(parent, old_child);
                self.nodes[parent].set_child(dir, new_child);
            }
            None => self.root = new_child,
        }
    }

    fn which_child(&self, parent: NodeIdx, child: NodeIdx) -> Dir {
        if self.nodes[parent].left() == Some(child) {
            Dir::Left
        } else {
            debug_assert_eq!(self.nodes[parent].right(), Some(child));
            Dir::Right
        }
    }

    // Returns the minimum node in the subtree at `root`.
    fn min_in_subtree(&self, mut cur: NodeIdx) -> NodeIdx {
        while let Some(left) = self.nodes[cur].left() {
            cur = left;
        }

        cur
    }

    // Returns the maximum node in the subtree at `root`.
    fn max_in_subtree(&self, mut cur: NodeIdx) -> NodeIdx {
        while let Some(right) = self.nodes[cur].right() {
            cur = right;
        }

        cur
    }

    pub(crate) fn first_node(&self) -> Link {
        Some(self.min_in_subtree(self.root?))
    }

    pub(crate) fn last_node(&self) -> Link {
        Some(self.max_in_subtree(self.root?))
    }

    // Returns the node holding the next-greater key, or `None` if `node`
    // holds the maximum.
    //
    // With a right child, the successor is the leftmost node of the right
    // subtree; otherwise it is the first ancestor reached from a left child.
    pub(crate) fn successor(&self, node: NodeIdx) -> Link {
        if let Some(right) = self.nodes[node].right() {
            return Some(self.min_in_subtree(right));
        }

        let mut cur = node;
        loop {
            let parent = self.nodes[cur].parent?;

            if self.nodes[parent].left() == Some(cur) {
                return Some(parent);
            }

            cur = parent;
        }
    }

    // Returns the node holding the next-smaller key, or `None` if `node`
    // holds the minimum.
    pub(crate) fn predecessor(&self, node: NodeIdx) -> Link {
        if let Some(left) = self.nodes[node].left() {
            return Some(self.max_in_subtree(left));
        }

        let mut cur = node;
        loop {
            let parent = self.nodes[cur].parent?;

            if self.nodes[parent].right() == Some(cur) {
                return Some(parent);
            }

            cur = parent;
        }
    }

    // Cursors and iteration ==================================================

    /// Returns a cursor pointing to the minimum entry.
    ///
    /// If the tree is empty, the cursor points to the "ghost" non-element.
    pub fn cursor_first(&self) -> Cursor<'_, K, V> {
        Cursor {
            node: self.first_node(),
            tree: self,
        }
    }

    /// Returns a cursor pointing to the maximum entry.
    ///
    /// If the tree is empty, the cursor points to the "ghost" non-element.
    pub fn cursor_last(&self) -> Cursor<'_, K, V> {
        Cursor {
            node: self.last_node(),
            tree: self,
        }
    }

    /// Returns an editing cursor pointing to the minimum entry.
    ///
    /// If the tree is empty, the cursor points to the "ghost" non-element.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, K, V> {
        CursorMut {
            node: self.first_node(),
            tree: self,
        }
    }

    /// Returns an editing cursor pointing to the maximum entry.
    ///
    /// If the tree is empty, the cursor points to the "ghost" non-element.
    pub fn cursor_last_mut(&mut self) -> CursorMut<'_, K, V> {
        CursorMut {
            node: self.last_node(),
            tree: self,
        }
    }

    /// Returns an iterator over the entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self)
    }
}

impl<K: Ord, V> Default for AvlTree<K, V> {
    fn default() -> AvlTree<K, V> {
        AvlTree::new()
    }
}

impl<K: Ord + Clone, V: Clone> Clone for AvlTree<K, V> {
    // The arena is copied slot for slot, so every index relation in the
    // clone holds without fixups.
    fn clone(&self) -> AvlTree<K, V> {
        AvlTree {
            nodes: self.nodes.clone(),
            root: self.root,
            len: self.len,
        }
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'tree, K: Ord, V> IntoIterator for &'tree AvlTree<K, V> {
    type Item = (&'tree K, &'tree V);
    type IntoIter = Iter<'tree, K, V>;

    fn into_iter(self) -> Iter<'tree, K, V> {
        self.iter()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> AvlTree<K, V> {
        let mut tree = AvlTree::new();

        for (key, value) in iter {
            tree.insert(key, value);
        }

        tree
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}
