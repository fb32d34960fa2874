//! The node arena and tree lifecycle.

use std::sync::Arc;

use canopy_tables::{CompiledGrammar, SymbolId};

use crate::error::EditError;
use crate::tree::edit::{
    Edit, dirty_ranges, merge_ranges, range_intersects_edits, translate_offset, validate_edits,
};
use crate::tree::line_index::LineIndex;
use crate::tree::node::Node;

/// Stable index of a node within its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct NodeFlags {
    /// ERROR node, or an unrecognized-byte token.
    pub error: bool,
    /// Zero-width token synthesized by recovery.
    pub missing: bool,
    /// Extra token (whitespace, comments).
    pub extra: bool,
    /// Self or any descendant is error/missing.
    pub has_error: bool,
    /// Range touched by an edit; set on edited trees, never on freshly
    /// parsed ones.
    pub invalid: bool,
    /// Built while the stack was forked; not a safe reuse candidate.
    pub fragile: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub kind: SymbolId,
    pub start: u32,
    pub end: u32,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub flags: NodeFlags,
    /// Bytes past `end` the lexer (or the closing reduce's lookahead
    /// token) examined when this node was finished. An edit inside
    /// `[start, end + lookahead)` means the node cannot be reused as-is.
    pub lookahead: u32,
}

/// An immutable concrete syntax tree.
///
/// Value-like: never mutated after construction. [`Tree::with_edits`]
/// derives a successor whose node ranges are translated and whose touched
/// nodes are marked; a following parse with this tree as `previous`
/// completes the incremental re-derivation.
#[derive(Debug, Clone)]
pub struct Tree {
    pub(crate) table: Arc<CompiledGrammar>,
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) root: NodeId,
    pub(crate) text_len: u32,
    pub(crate) lines: LineIndex,
    /// Post-edit spans of new text awaiting re-parse, merged and sorted.
    pub(crate) dirty: Vec<(u32, u32)>,
}

impl Tree {
    pub fn root(&self) -> Node<'_> {
        Node::new(self, self.root)
    }

    pub fn node(&self, id: NodeId) -> Node<'_> {
        Node::new(self, id)
    }

    /// Total length in bytes of the source this tree describes.
    pub fn text_len(&self) -> usize {
        self.text_len as usize
    }

    /// Identity of the grammar version that produced this tree.
    pub fn grammar_fingerprint(&self) -> u64 {
        self.table.fingerprint
    }

    pub fn grammar(&self) -> &Arc<CompiledGrammar> {
        &self.table
    }

    /// Whether any node is marked out-of-date by an edit.
    pub fn has_pending_edits(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub(crate) fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    /// Derive a successor tree with every node range translated through the
    /// edits and touched nodes marked for re-parse. The receiver remains
    /// valid and unchanged.
    pub fn with_edits(&self, edits: &[Edit]) -> Result<Tree, EditError> {
        validate_edits(edits)?;
        if edits.is_empty() {
            return Ok(self.clone());
        }

        let mut nodes = self.nodes.clone();
        for node in &mut nodes {
            let invalid = range_intersects_edits(node.start, node.end, edits);
            node.start = translate_offset(node.start, edits, true);
            node.end = translate_offset(node.end, edits, false).max(node.start);
            node.flags.invalid |= invalid;
        }

        // Invalidity propagates upward: a parent with a touched descendant
        // cannot be reused wholesale.
        propagate_invalid(&mut nodes, self.root);

        let delta: i64 = edits.iter().map(|e| e.delta()).sum();
        let text_len = (i64::from(self.text_len) + delta).max(0) as u32;

        let mut dirty: Vec<(u32, u32)> = self
            .dirty
            .iter()
            .map(|&(start, end)| {
                (
                    translate_offset(start, edits, true),
                    translate_offset(end, edits, false),
                )
            })
            .collect();
        dirty.extend(dirty_ranges(edits));

        Ok(Tree {
            table: Arc::clone(&self.table),
            nodes,
            root: self.root,
            text_len,
            lines: self.lines.with_edits(edits),
            dirty: merge_ranges(dirty),
        })
    }
}

fn propagate_invalid(nodes: &mut [NodeData], root: NodeId) {
    // Post-order over an explicit stack; children finish before parents.
    let mut stack = vec![(root, false)];
    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            let any_child_invalid = nodes[id.index()]
                .children
                .iter()
                .any(|child| nodes[child.index()].flags.invalid);
            if any_child_invalid {
                nodes[id.index()].flags.invalid = true;
            }
        } else {
            stack.push((id, true));
            for &child in &nodes[id.index()].children {
                stack.push((child, false));
            }
        }
    }
}

/// Arena accumulator used during parsing. Nodes from abandoned stacks and
/// recovery probes are compacted away by [`TreeBuilder::finish`].
#[derive(Debug, Default)]
pub(crate) struct TreeBuilder {
    nodes: Vec<NodeData>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub fn push_leaf(
        &mut self,
        kind: SymbolId,
        start: u32,
        end: u32,
        mut flags: NodeFlags,
        lookahead: u32,
    ) -> NodeId {
        flags.has_error = flags.error || flags.missing;
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            start,
            end,
            parent: None,
            children: Vec::new(),
            flags,
            lookahead,
        });
        id
    }

    /// Build an internal node over already-spliced children. Empty nodes
    /// sit zero-width at `empty_pos`.
    pub fn push_internal(
        &mut self,
        kind: SymbolId,
        children: Vec<NodeId>,
        mut flags: NodeFlags,
        lookahead: u32,
        empty_pos: u32,
    ) -> NodeId {
        let (start, end) = match (children.first(), children.last()) {
            (Some(first), Some(last)) => {
                (self.nodes[first.index()].start, self.nodes[last.index()].end)
            }
            _ => (empty_pos, empty_pos),
        };
        flags.has_error = flags.error
            || flags.missing
            || children
                .iter()
                .any(|child| self.nodes[child.index()].flags.has_error);
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            start,
            end,
            parent: None,
            children,
            flags,
            lookahead,
        });
        id
    }

    /// Adjust a node's recorded lookahead after the fact (reduce nodes
    /// learn their window from the closing token).
    pub fn set_lookahead(&mut self, id: NodeId, lookahead: u32) {
        self.nodes[id.index()].lookahead = lookahead;
    }

    /// Deep-copy a subtree from a previous tree into this arena. This is
    /// the reuse path of incremental parsing: no lexing or reductions are
    /// re-run for the copied span.
    pub fn copy_subtree(&mut self, source: &Tree, node: NodeId) -> NodeId {
        let data = source.data(node);
        let children: Vec<NodeId> = data
            .children
            .iter()
            .map(|&child| self.copy_subtree(source, child))
            .collect();
        let id = NodeId(self.nodes.len() as u32);
        let mut flags = data.flags;
        flags.invalid = false;
        self.nodes.push(NodeData {
            kind: data.kind,
            start: data.start,
            end: data.end,
            parent: None,
            children,
            flags,
            lookahead: data.lookahead,
        });
        id
    }

    /// Compact to the nodes reachable from `root`, fix up parent links,
    /// and freeze.
    pub fn finish(
        self,
        root: NodeId,
        table: Arc<CompiledGrammar>,
        text_len: u32,
        lines: LineIndex,
    ) -> Tree {
        let mut remap = vec![u32::MAX; self.nodes.len()];
        let mut ordered: Vec<NodeId> = Vec::new();

        // Preorder walk assigning compact ids.
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if remap[id.index()] != u32::MAX {
                continue;
            }
            remap[id.index()] = ordered.len() as u32;
            ordered.push(id);
            for &child in self.nodes[id.index()].children.iter().rev() {
                stack.push(child);
            }
        }

        let mut nodes: Vec<NodeData> = ordered
            .iter()
            .map(|&old_id| {
                let data = &self.nodes[old_id.index()];
                NodeData {
                    kind: data.kind,
                    start: data.start,
                    end: data.end,
                    parent: None,
                    children: data
                        .children
                        .iter()
                        .map(|child| NodeId(remap[child.index()]))
                        .collect(),
                    flags: data.flags,
                    lookahead: data.lookahead,
                }
            })
            .collect();

        for index in 0..nodes.len() {
            let id = NodeId(index as u32);
            let children = nodes[index].children.clone();
            for child in children {
                nodes[child.index()].parent = Some(id);
            }
        }

        Tree {
            table,
            nodes,
            root: NodeId(remap[root.index()]),
            text_len,
            lines,
            dirty: Vec::new(),
        }
    }
}
