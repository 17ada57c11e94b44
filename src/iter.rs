use core::iter::FusedIterator;

use crate::{
    node::{Link, NodeIdx},
    AvlTree,
};

/// An iterator over the entries of an [`AvlTree`] in ascending key order.
///
/// The iterator walks the parent links of the tree directly; it allocates
/// nothing and each step is amortized _O(1)_.
pub struct Iter<'tree, K, V> {
    tree: &'tree AvlTree<K, V>,

    head: Link,
    tail: Link,
    len: usize,
}

impl<'tree, K: Ord, V> Iter<'tree, K, V> {
    pub(crate) fn new(tree: &'tree AvlTree<K, V>) -> Self {
        Iter {
            tree,

            head: tree.first_node(),
            tail: tree.last_node(),
            len: tree.len(),
        }
    }

    fn entry(&self, node: NodeIdx) -> (&'tree K, &'tree V) {
        let node = &self.tree.nodes[node];
        (&node.key, &node.value)
    }
}

impl<'tree, K, V> Clone for Iter<'tree, K, V> {
    fn clone(&self) -> Iter<'tree, K, V> {
        Iter {
            tree: self.tree,
            head: self.head,
            tail: self.tail,
            len: self.len,
        }
    }
}

impl<'tree, K: Ord, V> Iterator for Iter<'tree, K, V> {
    type Item = (&'tree K, &'tree V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let head = self.head?;
        self.len -= 1;

        // Once the ends meet, both are exhausted.
        if self.len == 0 {
            self.head = None;
            self.tail = None;
        } else {
            self.head = self.tree.successor(head);
        }

        Some(self.entry(head))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'tree, K: Ord, V> DoubleEndedIterator for Iter<'tree, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let tail = self.tail?;
        self.len -= 1;

        if self.len == 0 {
            self.head = None;
            self.tail = None;
        } else {
            self.tail = self.tree.predecessor(tail);
        }

        Some(self.entry(tail))
    }
}

impl<'tree, K: Ord, V> ExactSizeIterator for Iter<'tree, K, V> {
    fn len(&self) -> usize {
        self.len
    }
}

impl<'tree, K: Ord, V> FusedIterator for Iter<'tree, K, V> {}
