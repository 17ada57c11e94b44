use crate::{node::Link, AvlTree};

/// A cursor over an [`AvlTree`].
///
/// A cursor points either to an entry of the tree or to a "ghost"
/// non-element that connects the last entry to the first. The ghost is the
/// begin/end sentinel of the ordered sequence; dereferencing it yields
/// `None`.
pub struct Cursor<'tree, K, V> {
    pub(crate) tree: &'tree AvlTree<K, V>,
    pub(crate) node: Link,
}

impl<'tree, K: Ord, V> Cursor<'tree, K, V> {
    /// Moves the cursor to the next entry of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method
    /// moves it to the first entry. If it is pointing to the last entry,
    /// this method moves it to the "ghost" non-element.
    pub fn move_next(&mut self) {
        self.node = match self.node {
            Some(node) => self.tree.successor(node),
            None => self.tree.first_node(),
        };
    }

    /// Moves the cursor to the previous entry of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method
    /// moves it to the last entry. If it is pointing to the first entry,
    /// this method moves it to the "ghost" non-element.
    pub fn move_prev(&mut self) {
        self.node = match self.node {
            Some(node) => self.tree.predecessor(node),
            None => self.tree.last_node(),
        };
    }

    /// Returns a reference to the value the cursor points to.
    ///
    /// This returns `None` if the cursor is currently pointing to the
    /// "ghost" non-element.
    pub fn get(&self) -> Option<&'tree V> {
        Some(&self.tree.nodes[self.node?].value)
    }

    /// Returns a reference to the key the cursor points to.
    ///
    /// This returns `None` if the cursor is currently pointing to the
    /// "ghost" non-element.
    pub fn key(&self) -> Option<&'tree K> {
        Some(&self.tree.nodes[self.node?].key)
    }

    /// Returns the entry the cursor points to.
    ///
    /// This returns `None` if the cursor is currently pointing to the
    /// "ghost" non-element.
    pub fn key_value(&self) -> Option<(&'tree K, &'tree V)> {
        let node = &self.tree.nodes[self.node?];
        Some((&node.key, &node.value))
    }

    /// Returns the next entry without moving the cursor.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method
    /// returns the first entry. If it is pointing to the last entry, this
    /// method returns `None`.
    pub fn peek_next(&self) -> Option<(&'tree K, &'tree V)> {
        let next = match self.node {
            Some(node) => self.tree.successor(node),
            None => self.tree.first_node(),
        };

        let node = &self.tree.nodes[next?];
        Some((&node.key, &node.value))
    }

    /// Returns the previous entry without moving the cursor.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method
    /// returns the last entry. If it is pointing to the first entry, this
    /// method returns `None`.
    pub fn peek_prev(&self) -> Option<(&'tree K, &'tree V)> {
        let prev = match self.node {
            Some(node) => self.tree.predecessor(node),
            None => self.tree.last_node(),
        };

        let node = &self.tree.nodes[prev?];
        Some((&node.key, &node.value))
    }
}

/// A cursor over an [`AvlTree`] which supports editing operations.
///
/// A cursor points either to an entry of the tree or to a "ghost"
/// non-element that connects the last entry to the first.
///
/// The cursor borrows the tree mutably, so no other structural mutation can
/// happen while it is live; the only removals possible during traversal are
/// the cursor's own, which re-position it before touching the tree.
pub struct CursorMut<'tree, K, V> {
    pub(crate) tree: &'tree mut AvlTree<K, V>,
    pub(crate) node: Link,
}

impl<'tree, K: Ord, V> CursorMut<'tree, K, V> {
    /// Returns a read-only cursor pointing to the current entry.
    ///
    /// The `CursorMut` remains immutably borrowed for the lifetime of the
    /// returned `Cursor`.
    pub fn as_cursor(&self) -> Cursor<'_, K, V> {
        Cursor {
            tree: &*self.tree,
            node: self.node,
        }
    }

    /// Moves the cursor to the next entry of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method
    /// moves it to the first entry. If it is pointing to the last entry,
    /// this method moves it to the "ghost" non-element.
    pub fn move_next(&mut self) {
        self.node = match self.node {
            Some(node) => self.tree.successor(node),
            None => self.tree.first_node(),
        };
    }

    /// Moves the cursor to the previous entry of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method
    /// moves it to the last entry. If it is pointing to the first entry,
    /// this method moves it to the "ghost" non-element.
    pub fn move_prev(&mut self) {
        self.node = match self.node {
            Some(node) => self.tree.predecessor(node),
            None => self.tree.last_node(),
        };
    }

    /// Returns a reference to the value the cursor points to.
    ///
    /// This returns `None` if the cursor is currently pointing to the
    /// "ghost" non-element.
    pub fn get(&self) -> Option<&V> {
        Some(&self.tree.nodes[self.node?].value)
    }

    /// Returns a mutable reference to the value the cursor points to.
    ///
    /// This returns `None` if the cursor is currently pointing to the
    /// "ghost" non-element.
    ///
    /// Only the value is exposed mutably; the key cannot be modified
    /// through a cursor, so the ordering of the tree cannot be violated.
    pub fn get_mut(&mut self) -> Option<&mut V> {
        Some(&mut self.tree.nodes[self.node?].value)
    }

    /// Returns a reference to the key the cursor points to.
    ///
    /// This returns `None` if the cursor is currently pointing to the
    /// "ghost" non-element.
    pub fn key(&self) -> Option<&K> {
        Some(&self.tree.nodes[self.node?].key)
    }

    /// Returns the entry the cursor points to.
    ///
    /// This returns `None` if the cursor is currently pointing to the
    /// "ghost" non-element.
    pub fn key_value(&self) -> Option<(&K, &V)> {
        let node = &self.tree.nodes[self.node?];
        Some((&node.key, &node.value))
    }

    /// Returns the next entry without moving the cursor.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method
    /// returns the first entry. If it is pointing to the last entry, this
    /// method returns `None`.
    pub fn peek_next(&self) -> Option<(&K, &V)> {
        let next = match self.node {
            Some(node) => self.tree.successor(node),
            None => self.tree.first_node(),
        };

        let node = &self.tree.nodes[next?];
        Some((&node.key, &node.value))
    }

    /// Returns the previous entry without moving the cursor.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method
    /// returns the last entry. If it is pointing to the first entry, this
    /// method returns `None`.
    pub fn peek_prev(&self) -> Option<(&K, &V)> {
        let prev = match self.node {
            Some(node) => self.tree.predecessor(node),
            None => self.tree.last_node(),
        };

        let node = &self.tree.nodes[prev?];
        Some((&node.key, &node.value))
    }

    /// Removes the current entry from the tree.
    ///
    /// This returns the removed entry and moves the cursor to the next
    /// entry. If the cursor is pointing to the "ghost" non-element, this
    /// method returns `None`, and neither the tree nor the cursor is
    /// modified.
    pub fn remove_current(&mut self) -> Option<(K, V)> {
        let remove = self.node?;

        let (entry, successor) = self.tree.remove_at(remove);
        self.node = successor;

        Some(entry)
    }

    /// Removes the current entry from the tree.
    ///
    /// This returns the removed entry and moves the cursor to the previous
    /// entry. If the cursor is pointing to the "ghost" non-element, this
    /// method returns `None`, and neither the tree nor the cursor is
    /// modified.
    pub fn remove_current_and_move_prev(&mut self) -> Option<(K, V)> {
        let remove = self.node?;

        // The predecessor is never the node spliced out by `remove_at` (a
        // two-child removal splices from the right subtree), so its position
        // survives the removal.
        let predecessor = self.tree.predecessor(remove);
        let (entry, _) = self.tree.remove_at(remove);
        self.node = predecessor;

        Some(entry)
    }
}
