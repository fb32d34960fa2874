//! Allocation-free tree traversal.

use crate::tree::node::Node;
use crate::tree::tree::{NodeId, Tree};

/// A cursor for walking a tree without re-resolving sibling positions.
///
/// Keeps the descent path, so `goto_next_sibling`/`goto_parent` are O(1)
/// rather than searching the parent's child list.
pub struct TreeCursor<'t> {
    tree: &'t Tree,
    /// Path from the root: (node, index within its parent).
    path: Vec<(NodeId, usize)>,
}

impl<'t> TreeCursor<'t> {
    pub(crate) fn new(tree: &'t Tree, root: NodeId) -> Self {
        Self {
            tree,
            path: vec![(root, 0)],
        }
    }

    /// The node the cursor currently points at.
    pub fn node(&self) -> Node<'t> {
        let (id, _) = *self.path.last().expect("cursor path is never empty");
        self.tree.node(id)
    }

    /// Depth below the node the cursor was created at.
    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    /// Move to the first child. Returns false at a leaf.
    pub fn goto_first_child(&mut self) -> bool {
        let (id, _) = *self.path.last().expect("cursor path is never empty");
        match self.tree.data(id).children.first() {
            Some(&child) => {
                self.path.push((child, 0));
                true
            }
            None => false,
        }
    }

    /// Move to the next sibling. Returns false at the last child or root.
    pub fn goto_next_sibling(&mut self) -> bool {
        if self.path.len() < 2 {
            return false;
        }
        let (_, index) = *self.path.last().expect("checked length");
        let (parent, _) = self.path[self.path.len() - 2];
        let siblings = &self.tree.data(parent).children;
        match siblings.get(index + 1) {
            Some(&next) => {
                *self.path.last_mut().expect("checked length") = (next, index + 1);
                true
            }
            None => false,
        }
    }

    /// Move to the parent. Returns false at the node the cursor started on.
    pub fn goto_parent(&mut self) -> bool {
        if self.path.len() < 2 {
            return false;
        }
        self.path.pop();
        true
    }
}

impl Tree {
    /// A cursor positioned at the root.
    pub fn walk(&self) -> TreeCursor<'_> {
        TreeCursor::new(self, self.root)
    }
}
