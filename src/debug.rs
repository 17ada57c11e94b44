use core::fmt;

use crate::{node::NodeIdx, AvlTree};

impl<K, V> AvlTree<K, V>
where
    K: Ord + fmt::Debug,
{
    /// Writes a human-readable rendering of the tree shape to `w`.
    ///
    /// The tree is printed sideways, right subtree first, with indentation
    /// proportional to depth; each line carries the node's key, its cached
    /// height and its parent's key. Purely a debugging aid; the format is
    /// not stable.
    pub fn dump<W: fmt::Write>(&self, w: &mut W) -> fmt::Result {
        match self.root {
            Some(root) => self.dump_at(w, root, 0),
            None => writeln!(w, "(empty)"),
        }
    }

    fn dump_at<W: fmt::Write>(&self, w: &mut W, node: NodeIdx, depth: usize) -> fmt::Result {
        let n = &self.nodes[node];

        if let Some(right) = n.right() {
            self.dump_at(w, right, depth + 1)?;
        }

        write!(w, "{:indent$}", "", indent = 4 * depth)?;
        match n.parent {
            Some(parent) => writeln!(
                w,
                "{:?} h={} (parent {:?})",
                n.key, n.height, self.nodes[parent].key
            )?,
            None => writeln!(w, "{:?} h={} (root)", n.key, n.height)?,
        }

        if let Some(left) = n.left() {
            self.dump_at(w, left, depth + 1)?;
        }

        Ok(())
    }
}
