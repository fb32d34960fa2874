//! Node handles: navigation and range queries over a finished tree.

use std::ops::Range;

use canopy_core::Point;

use crate::tree::tree::{NodeId, Tree};

/// A lightweight handle to one node. Copyable; borrows the tree.
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t Tree,
    id: NodeId,
}

impl<'t> Node<'t> {
    pub(crate) fn new(tree: &'t Tree, id: NodeId) -> Self {
        Self { tree, id }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    fn data(&self) -> &'t crate::tree::tree::NodeData {
        self.tree.data(self.id)
    }

    /// The symbol id of this node's kind.
    #[inline]
    pub fn kind(&self) -> u16 {
        self.data().kind
    }

    /// The display name of this node's kind.
    pub fn kind_name(&self) -> &'t str {
        self.tree.table.symbol_name(self.data().kind)
    }

    #[inline]
    pub fn start_byte(&self) -> usize {
        self.data().start as usize
    }

    #[inline]
    pub fn end_byte(&self) -> usize {
        self.data().end as usize
    }

    #[inline]
    pub fn byte_range(&self) -> Range<usize> {
        self.start_byte()..self.end_byte()
    }

    /// Row/column coordinates of the node's span, derived from the tree's
    /// newline index.
    pub fn point_range(&self) -> (Point, Point) {
        let data = self.data();
        (
            self.tree.lines.point_of(data.start),
            self.tree.lines.point_of(data.end),
        )
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.data().flags.error
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.data().flags.missing
    }

    #[inline]
    pub fn is_extra(&self) -> bool {
        self.data().flags.extra
    }

    /// Whether this node or any descendant is an ERROR or MISSING node.
    #[inline]
    pub fn has_error(&self) -> bool {
        self.data().flags.has_error
    }

    /// Whether this node's kind comes from a named rule (as opposed to an
    /// inline literal).
    pub fn is_named(&self) -> bool {
        let kind = self.data().kind;
        if kind == canopy_tables::ERROR_SYMBOL {
            return true;
        }
        self.tree
            .table
            .symbols
            .get(kind as usize)
            .is_some_and(|info| info.named)
    }

    pub fn parent(&self) -> Option<Node<'t>> {
        self.data().parent.map(|id| Node::new(self.tree, id))
    }

    #[inline]
    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    pub fn child(&self, index: usize) -> Option<Node<'t>> {
        self.data()
            .children
            .get(index)
            .map(|&id| Node::new(self.tree, id))
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'t>> + '_ {
        self.data()
            .children
            .iter()
            .map(|&id| Node::new(self.tree, id))
    }

    pub fn next_sibling(&self) -> Option<Node<'t>> {
        let parent = self.parent()?;
        let siblings = &parent.data().children;
        let index = siblings.iter().position(|&id| id == self.id)?;
        siblings.get(index + 1).map(|&id| Node::new(self.tree, id))
    }

    pub fn prev_sibling(&self) -> Option<Node<'t>> {
        let parent = self.parent()?;
        let siblings = &parent.data().children;
        let index = siblings.iter().position(|&id| id == self.id)?;
        index
            .checked_sub(1)
            .map(|i| Node::new(self.tree, siblings[i]))
    }

    /// The direct child whose range covers `byte`, found by binary search
    /// over the range-sorted children.
    pub fn child_containing_byte(&self, byte: usize) -> Option<Node<'t>> {
        let byte = byte as u32;
        let children = &self.data().children;
        let index = children
            .partition_point(|&id| self.tree.data(id).start <= byte)
            .checked_sub(1)?;
        let candidate = children[index];
        (self.tree.data(candidate).end > byte).then(|| Node::new(self.tree, candidate))
    }

    /// The smallest descendant (or self) whose range covers
    /// `[start, end)`. Descent is logarithmic per level in the child count.
    pub fn descendant_for_byte_range(&self, start: usize, end: usize) -> Node<'t> {
        let mut current = *self;
        loop {
            let Some(child) = current.child_containing_byte(start) else {
                return current;
            };
            if child.end_byte() < end.max(start + 1) {
                return current;
            }
            current = child;
        }
    }

    /// Render as an s-expression: named nodes in parentheses, anonymous
    /// leaves quoted, MISSING and ERROR called out.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        let data = self.data();
        if data.flags.missing {
            out.push_str("(MISSING ");
            out.push_str(self.kind_name());
            out.push(')');
            return;
        }
        if data.children.is_empty() {
            if self.is_named() {
                out.push('(');
                out.push_str(self.kind_name());
                out.push(')');
            } else {
                out.push('"');
                out.push_str(self.kind_name());
                out.push('"');
            }
            return;
        }
        out.push('(');
        out.push_str(self.kind_name());
        for child in self.children() {
            out.push(' ');
            child.write_sexp(out);
        }
        out.push(')');
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Node({} [{}, {}))",
            self.kind_name(),
            self.start_byte(),
            self.end_byte()
        )
    }
}
