//! Lexical rules: one matcher per terminal, plus the keyword table.

use serde::{Deserialize, Serialize};

use crate::SymbolId;

/// How one terminal is recognized in the byte stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TokenMatcher {
    /// End-of-input pseudo-terminal; never matched against bytes.
    End,
    /// Exact byte sequence.
    Literal(String),
    /// Anchored sparse DFA, serialized little-endian. Deserialized with
    /// [`crate::deserialize_dfa`] at parse time; sparse DFAs load from
    /// unaligned bytes, which is why the dense build is converted before
    /// storage.
    Pattern { dfa: Vec<u8> },
    /// Produced by the caller's external scanner hook; `index` is the
    /// position in [`LexTable::externals`].
    External { index: u16 },
}

/// The compiled lexical rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexTable {
    /// Indexed by terminal [`SymbolId`].
    pub matchers: Vec<TokenMatcher>,
    /// Terminals that may appear between any two tokens.
    pub extras: Vec<SymbolId>,
    /// Keyword lexemes, sorted by text for binary search. A lexeme matched
    /// by the `word` rule is looked up here; a hit re-types the token.
    pub keywords: Vec<(String, SymbolId)>,
    /// The `word` rule's terminal, if the grammar declared one.
    pub word: Option<SymbolId>,
    /// External terminals in declaration order.
    pub externals: Vec<SymbolId>,
}

impl LexTable {
    /// Look up a keyword by its lexeme.
    pub fn keyword(&self, text: &str) -> Option<SymbolId> {
        self.keywords
            .binary_search_by(|(lexeme, _)| lexeme.as_str().cmp(text))
            .ok()
            .map(|idx| self.keywords[idx].1)
    }

    #[inline]
    pub fn is_extra(&self, symbol: SymbolId) -> bool {
        self.extras.contains(&symbol)
    }
}
