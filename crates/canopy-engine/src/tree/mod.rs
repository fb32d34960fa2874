//! Immutable, persistent concrete syntax trees.
//!
//! Nodes live in a single owning arena indexed by stable integer ids;
//! parent and child references are id lists, so the parent/child/sibling
//! graph has no ownership cycles. A tree is never mutated after it is
//! returned: editing produces a marked successor tree, and incremental
//! re-parse copies unaffected node records into the new arena instead of
//! re-deriving them.

mod cursor;
mod edit;
mod line_index;
mod node;
#[allow(clippy::module_inception)]
mod tree;

#[cfg(test)]
mod line_index_tests;

pub use cursor::TreeCursor;
pub use edit::Edit;
pub use node::Node;
pub use tree::{NodeId, Tree};

pub(crate) use line_index::LineIndex;
pub(crate) use tree::{NodeData, NodeFlags, TreeBuilder};
