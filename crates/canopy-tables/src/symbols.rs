//! Symbol and production records.

use serde::{Deserialize, Serialize};

use crate::SymbolId;

/// Metadata for one grammar symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    /// Named symbols come from rule definitions; anonymous ones from
    /// inline literals like `"+"`.
    pub named: bool,
    /// Hidden symbols (underscore-prefixed and generated auxiliary rules)
    /// never appear in trees: their children are spliced into the parent.
    pub visible: bool,
    /// Extra tokens may appear between any two tokens.
    pub extra: bool,
    /// External tokens are produced by the caller's scanner hook.
    pub external: bool,
}

/// Associativity of a production, used for conflict resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Assoc {
    #[default]
    None,
    Left,
    Right,
}

/// One flattened production: `lhs := rhs[0] rhs[1] ...`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Production {
    pub lhs: SymbolId,
    pub rhs: Vec<SymbolId>,
    /// Static precedence for table-time conflict resolution.
    pub prec: i32,
    pub assoc: Assoc,
    /// Dynamic precedence, accumulated per stack during generalized
    /// parsing to rank ambiguous interpretations.
    pub dynamic_prec: i32,
}

impl Production {
    #[inline]
    pub fn rhs_len(&self) -> usize {
        self.rhs.len()
    }
}
