use core::mem;

use crate::{
    node::{Dir, NodeIdx},
    AvlTree,
};

/// A view into a single entry in an [`AvlTree`], which may be either vacant
/// or occupied.
///
/// Obtained from [`AvlTree::entry`]. `tree.entry(key).or_default()` is the
/// insert-or-fetch-default indexed access: it inserts a default value for
/// an absent key and returns a mutable reference to the value either way.
pub enum Entry<'tree, K, V> {
    Vacant(VacantEntry<'tree, K, V>),
    Occupied(OccupiedEntry<'tree, K, V>),
}

// The position a vacant entry's key would be attached at, captured during
// the descent so `insert` does not search again.
pub(crate) enum InsertAt {
    Root,
    Child { parent: NodeIdx, dir: Dir },
}

impl<'tree, K: Ord, V> Entry<'tree, K, V> {
    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Vacant(entry) => entry.key(),
            Entry::Occupied(entry) => entry.key(),
        }
    }

    /// Inserts `default` if the entry is vacant, and returns a mutable
    /// reference to the value in the entry.
    pub fn or_insert(self, default: V) -> &'tree mut V {
        match self {
            Entry::Vacant(entry) => entry.insert(default),
            Entry::Occupied(entry) => entry.into_mut(),
        }
    }

    /// Inserts the value returned by `default` if the entry is vacant, and
    /// returns a mutable reference to the value in the entry.
    pub fn or_insert_with<F: FnOnce() -> V>(self, default: F) -> &'tree mut V {
        match self {
            Entry::Vacant(entry) => entry.insert(default()),
            Entry::Occupied(entry) => entry.into_mut(),
        }
    }

    /// Inserts the default value if the entry is vacant, and returns a
    /// mutable reference to the value in the entry.
    pub fn or_default(self) -> &'tree mut V
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }

    /// Applies `f` to the value if the entry is occupied.
    pub fn and_modify<F: FnOnce(&mut V)>(mut self, f: F) -> Self {
        if let Entry::Occupied(entry) = &mut self {
            f(entry.get_mut());
        }

        self
    }
}

/// A view into a vacant entry in an [`AvlTree`].
pub struct VacantEntry<'tree, K, V> {
    pub(crate) tree: &'tree mut AvlTree<K, V>,
    pub(crate) key: K,
    pub(crate) at: InsertAt,
}

impl<'tree, K: Ord, V> VacantEntry<'tree, K, V> {
    /// Returns a reference to the key this entry would be inserted at.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Takes ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts `value` at the key associated with this entry and returns a
    /// mutable reference to it.
    pub fn insert(self, value: V) -> &'tree mut V {
        let node = self.tree.insert_at(self.at, self.key, value);
        &mut self.tree.nodes[node].value
    }
}

/// A view into an occupied entry in an [`AvlTree`].
pub struct OccupiedEntry<'tree, K, V> {
    pub(crate) tree: &'tree mut AvlTree<K, V>,
    pub(crate) node: NodeIdx,
}

impl<'tree, K: Ord, V> OccupiedEntry<'tree, K, V> {
    /// Returns a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.tree.nodes[self.node].key
    }

    /// Returns a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.tree.nodes[self.node].value
    }

    /// Returns a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.tree.nodes[self.node].value
    }

    /// Converts the entry into a mutable reference to its value, bound to
    /// the lifetime of the tree.
    pub fn into_mut(self) -> &'tree mut V {
        &mut self.tree.nodes[self.node].value
    }

    /// Replaces the value in the entry, returning the previous value.
    ///
    /// The tree shape and the key already in the entry are unchanged.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }

    /// Removes the entry from the tree, returning its value.
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Removes the entry from the tree, returning the key and value.
    pub fn remove_entry(self) -> (K, V) {
        let (entry, _) = self.tree.remove_at(self.node);
        entry
    }
}
