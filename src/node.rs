//! Node storage: an index-addressed arena.
//
// Nodes are never individually heap-allocated. They live in a growable slot
// vector and refer to each other by `NodeIdx`, a `u32` handle that stays
// valid until the node is freed. Freed slots are threaded onto a free list
// (through the slots themselves) and handed back out by later allocations,
// so a long-lived tree with churn does not grow its backing vector.
//
// Balance bookkeeping is the classic AVL cached height:
// - a missing subtree has height -1,
// - a leaf has height 0,
// - `h(n) = 1 + max(h(left), h(right))` after every operation.
//
// `i8` is plenty of room: an AVL tree with `u32::MAX` nodes is under 47
// levels tall.

use core::mem;
use core::ops::{Index, IndexMut, Not};

/// A stable handle to an occupied arena slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct NodeIdx(u32);

pub(crate) type Link = Option<NodeIdx>;

impl NodeIdx {
    #[inline]
    fn new(index: usize) -> NodeIdx {
        debug_assert!(index < u32::MAX as usize);
        NodeIdx(index as u32)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[derive(Clone)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) parent: Link,
    children: [Link; 2],
    pub(crate) height: i8,
}

impl<K, V> Node<K, V> {
    /// Returns a fresh leaf node.
    pub(crate) fn new(key: K, value: V, parent: Link) -> Node<K, V> {
        Node {
            key,
            value,
            parent,
            children: [None, None],
            height: 0,
        }
    }

    #[inline]
    pub(crate) fn child(&self, dir: Dir) -> Link {
        self.children[dir as usize]
    }

    #[inline]
    pub(crate) fn left(&self) -> Link {
        self.child(Dir::Left)
    }

    #[inline]
    pub(crate) fn right(&self) -> Link {
        self.child(Dir::Right)
    }

    #[inline]
    pub(crate) fn set_child(&mut self, dir: Dir, child: Link) -> Link {
        mem::replace(&mut self.children[dir as usize], child)
    }

    #[inline]
    pub(crate) fn set_left(&mut self, left: Link) -> Link {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    pub(crate) fn set_right(&mut self, right: Link) -> Link {
        self.set_child(Dir::Right, right)
    }
}

#[derive(Clone)]
pub(crate) enum Slot<K, V> {
    Occupied(Node<K, V>),
    Vacant { next: Link },
}

/// The slot vector plus the head of the vacant-slot free list.
///
/// Cloning an arena clones it slot for slot, so every `NodeIdx` relation
/// (parent links, child links, the free list) holds in the copy without
/// fixups.
#[derive(Clone)]
pub(crate) struct Arena<K, V> {
    slots: Vec<Slot<K, V>>,
    free: Link,
}

impl<K, V> Arena<K, V> {
    pub(crate) const fn new() -> Arena<K, V> {
        Arena {
            slots: Vec::new(),
            free: None,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Arena<K, V> {
        Arena {
            slots: Vec::with_capacity(capacity),
            free: None,
        }
    }

    /// Places `node` in a vacant slot, growing the vector only if none is
    /// free.
    pub(crate) fn alloc(&mut self, node: Node<K, V>) -> NodeIdx {
        match self.free {
            Some(idx) => {
                self.free = match self.slots[idx.index()] {
                    Slot::Vacant { next } => next,
                    Slot::Occupied(_) => unreachable!("free list points at an occupied slot"),
                };
                self.slots[idx.index()] = Slot::Occupied(node);
                idx
            }
            None => {
                let idx = NodeIdx::new(self.slots.len());
                self.slots.push(Slot::Occupied(node));
                idx
            }
        }
    }

    /// Extracts the node at `idx` and threads its slot onto the free list.
    pub(crate) fn free(&mut self, idx: NodeIdx) -> Node<K, V> {
        let slot = mem::replace(
            &mut self.slots[idx.index()],
            Slot::Vacant { next: self.free },
        );
        self.free = Some(idx);

        match slot {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("freed slot {} twice", idx.index()),
        }
    }

    /// Swaps the key/value payloads of two occupied slots, leaving their
    /// structural links (parent, children, height) in place.
    ///
    /// Used by two-child removal: the successor's payload moves into the
    /// removed node's slot, and the successor's slot is the one spliced out.
    pub(crate) fn swap_payload(&mut self, a: NodeIdx, b: NodeIdx) {
        assert_ne!(a, b, "cannot swap a slot with itself");

        let (lo, hi) = if a.index() < b.index() {
            (a.index(), b.index())
        } else {
            (b.index(), a.index())
        };

        let (head, tail) = self.slots.split_at_mut(hi);
        match (&mut head[lo], &mut tail[0]) {
            (Slot::Occupied(x), Slot::Occupied(y)) => {
                mem::swap(&mut x.key, &mut y.key);
                mem::swap(&mut x.value, &mut y.value);
            }
            _ => panic!("swap_payload on a vacant slot"),
        }
    }

    /// Returns the cached height of the subtree at `link`, `-1` if the
    /// subtree is missing.
    #[inline]
    pub(crate) fn height(&self, link: Link) -> i8 {
        link.map_or(-1, |idx| self[idx].height)
    }

    /// Drops every node and resets the free list, keeping the allocation.
    //
    // `Vec::clear` drops slots in a loop, so teardown never recurses no
    // matter how tall the tree was.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free = None;
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Panics unless exactly `expected_len` slots are occupied and the free
    /// list covers exactly the vacant ones, acyclically.
    pub(crate) fn assert_consistent(&self, expected_len: usize) {
        let occupied = self
            .slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Occupied(_)))
            .count();
        assert_eq!(occupied, expected_len, "occupied slots != tree len");

        let mut seen = vec![false; self.slots.len()];
        let mut free_len = 0;
        let mut cur = self.free;
        while let Some(idx) = cur {
            assert!(!seen[idx.index()], "free list revisits slot {}", idx.index());
            seen[idx.index()] = true;
            free_len += 1;

            cur = match &self.slots[idx.index()] {
                Slot::Vacant { next } => *next,
                Slot::Occupied(_) => panic!("free list points at occupied slot {}", idx.index()),
            };
        }
        assert_eq!(free_len, self.slots.len() - occupied, "free list misses vacant slots");
    }
}

impl<K, V> Index<NodeIdx> for Arena<K, V> {
    type Output = Node<K, V>;

    #[inline]
    fn index(&self, idx: NodeIdx) -> &Node<K, V> {
        match &self.slots[idx.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("node {} was freed", idx.index()),
        }
    }
}

impl<K, V> IndexMut<NodeIdx> for Arena<K, V> {
    #[inline]
    fn index_mut(&mut self, idx: NodeIdx) -> &mut Node<K, V> {
        match &mut self.slots[idx.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("node {} was freed", idx.index()),
        }
    }
}
