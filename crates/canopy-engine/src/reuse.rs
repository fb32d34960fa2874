//! Subtree reuse for incremental re-parse.
//!
//! Candidates come from the previous (edited) tree: the outermost node
//! starting at the parse position, then progressively smaller ones when
//! the outer candidates fail their checks. A candidate is pushed wholesale
//! only when its bytes are untouched AND its boundary lookahead window
//! stays clear of every dirty range; tokens whose window reaches dirty
//! text are re-lexed and reused only if the fresh token is identical.

use canopy_tables::SymbolId;

use crate::tree::{NodeId, Tree};

/// Why a candidate can or cannot be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Candidate {
    /// Internal node, clean window: push via goto.
    Internal(NodeId),
    /// Leaf, clean window: feed as a pre-lexed token.
    Leaf(NodeId),
    /// Leaf whose window touches dirty text: re-lex, compare, then reuse.
    LeafNeedsVerify(NodeId),
}

pub(crate) struct ReuseCursor<'t> {
    tree: &'t Tree,
}

impl<'t> ReuseCursor<'t> {
    /// Returns None if the previous tree belongs to a different grammar
    /// version; nothing from it can be trusted then.
    pub fn new(tree: &'t Tree, fingerprint: u64) -> Option<Self> {
        (tree.grammar_fingerprint() == fingerprint).then_some(Self { tree })
    }

    pub fn tree(&self) -> &'t Tree {
        self.tree
    }

    /// Candidates starting exactly at `pos`, outermost first. The caller
    /// takes the first one that passes its table checks and descends
    /// otherwise.
    pub fn candidates_at(&self, pos: usize) -> Vec<Candidate> {
        let pos = pos as u32;
        let mut out = Vec::new();
        let mut current = self.tree.root();

        loop {
            let starts_here = current.start_byte() as u32 == pos;
            if starts_here {
                if let Some(candidate) = self.classify(current.id()) {
                    out.push(candidate);
                }
            }

            let Some(child) = descend_toward(current, pos) else {
                break;
            };
            current = child;
        }
        out
    }

    fn classify(&self, id: NodeId) -> Option<Candidate> {
        let data = self.tree.data(id);
        if data.flags.missing || data.flags.has_error || data.flags.fragile {
            return None;
        }
        if data.start == data.end {
            return None;
        }

        let window_end = data.end.saturating_add(data.lookahead);
        let window_dirty = self.intersects_dirty(data.start, window_end);
        let body_dirty = data.flags.invalid || self.intersects_dirty(data.start, data.end);

        if data.children.is_empty() {
            if body_dirty {
                return None;
            }
            if window_dirty {
                return Some(Candidate::LeafNeedsVerify(id));
            }
            return Some(Candidate::Leaf(id));
        }

        if body_dirty || window_dirty {
            return None;
        }
        Some(Candidate::Internal(id))
    }

    fn intersects_dirty(&self, start: u32, end: u32) -> bool {
        self.tree
            .dirty
            .iter()
            .any(|&(dirty_start, dirty_end)| start < dirty_end && end > dirty_start)
    }

    /// The kind of the first token inside a subtree, used to check that the
    /// current state would shift straight into it.
    pub fn first_leaf_kind(&self, id: NodeId) -> Option<SymbolId> {
        let mut current = id;
        loop {
            let data = self.tree.data(current);
            match data.children.first() {
                Some(&child) => current = child,
                None => return Some(data.kind),
            }
        }
    }
}

/// The child of `node` whose range contains `pos` (or starts at it).
fn descend_toward<'t>(
    node: crate::tree::Node<'t>,
    pos: u32,
) -> Option<crate::tree::Node<'t>> {
    let child = node.child_containing_byte(pos as usize)?;
    (child.start_byte() as u32 <= pos && (child.end_byte() as u32) > pos).then_some(child)
}
