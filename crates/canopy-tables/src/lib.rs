#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Compiled table format and runtime types for canopy.
//!
//! A [`CompiledGrammar`] is the frozen output of grammar compilation: a
//! symbol listing, the productions, the parse automaton ([`ParseTable`]) and
//! the lexical rules ([`LexTable`]). It is built once per grammar, never
//! mutated afterwards, and shared read-only between any number of parses.
//!
//! The artifact module frames a compiled grammar for storage: magic bytes,
//! a format version, a crc32 checksum, and a postcard payload.

pub mod artifact;
mod dfa;
mod lex_table;
mod parse_table;
mod symbols;

#[cfg(test)]
mod artifact_tests;
#[cfg(test)]
mod parse_table_tests;

pub use artifact::{ARTIFACT_MAGIC, ArtifactError, FORMAT_VERSION};
pub use dfa::deserialize_dfa;
pub use lex_table::{LexTable, TokenMatcher};
pub use parse_table::{Action, ActionSet, MAX_ACTIONS, ParseState, ParseTable};
pub use symbols::{Assoc, Production, SymbolInfo};

use serde::{Deserialize, Serialize};

/// Symbol id: terminals first (0 is end-of-input), then nonterminals.
pub type SymbolId = u16;

/// Parse automaton state id.
pub type StateId = u32;

/// Production id, indexing [`CompiledGrammar::productions`].
pub type ProductionId = u32;

/// The end-of-input terminal.
pub const END_SYMBOL: SymbolId = 0;

/// Reserved sentinel kind for ERROR nodes and unrecognized-byte tokens.
/// Never present in the symbol listing.
pub const ERROR_SYMBOL: SymbolId = u16::MAX;

/// A compiled grammar: everything the runtime needs to lex and parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledGrammar {
    /// Grammar name, as authored.
    pub name: String,
    /// Stable hash of the source grammar; keys the process-wide registry
    /// and ties trees to the grammar version that produced them.
    pub fingerprint: u64,
    /// Symbol listing indexed by [`SymbolId`].
    pub symbols: Vec<SymbolInfo>,
    /// Symbols `0..terminal_count` are terminals.
    pub terminal_count: u16,
    /// The entry nonterminal.
    pub start_symbol: SymbolId,
    /// Productions, indexed by [`ProductionId`]. Production 0 is the
    /// augmented start production.
    pub productions: Vec<Production>,
    pub parse: ParseTable,
    pub lex: LexTable,
}

impl CompiledGrammar {
    #[inline]
    pub fn is_terminal(&self, symbol: SymbolId) -> bool {
        symbol < self.terminal_count
    }

    /// Resolve a symbol id to its display name. The ERROR sentinel resolves
    /// to `"ERROR"`.
    pub fn symbol_name(&self, symbol: SymbolId) -> &str {
        if symbol == ERROR_SYMBOL {
            "ERROR"
        } else {
            self.symbols
                .get(symbol as usize)
                .map(|info| info.name.as_str())
                .unwrap_or("?")
        }
    }

    /// Look up a symbol id by name.
    pub fn symbol_named(&self, name: &str) -> Option<SymbolId> {
        self.symbols
            .iter()
            .position(|info| info.name == name)
            .map(|idx| idx as SymbolId)
    }

    pub fn state(&self, id: StateId) -> &ParseState {
        &self.parse.states[id as usize]
    }

    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id as usize]
    }

    /// Structural sanity check: every state, symbol, and production
    /// referenced by the tables must exist. Run after decoding an artifact;
    /// tables produced by the compiler in-process always pass.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let state_count = self.parse.states.len() as u64;
        for state in &self.parse.states {
            for (symbol, actions) in &state.actions {
                if *symbol >= self.terminal_count {
                    return Err(ArtifactError::Malformed("action on non-terminal symbol"));
                }
                for action in actions.iter() {
                    match *action {
                        Action::Shift { state } => {
                            if u64::from(state) >= state_count {
                                return Err(ArtifactError::Malformed("shift to missing state"));
                            }
                        }
                        Action::Reduce { production } => {
                            if production as usize >= self.productions.len() {
                                return Err(ArtifactError::Malformed("reduce of missing production"));
                            }
                        }
                        Action::Accept => {}
                    }
                }
            }
            for (symbol, target) in &state.gotos {
                if self.is_terminal(*symbol) || *symbol as usize >= self.symbols.len() {
                    return Err(ArtifactError::Malformed("goto on terminal symbol"));
                }
                if u64::from(*target) >= state_count {
                    return Err(ArtifactError::Malformed("goto to missing state"));
                }
            }
        }
        if self.lex.matchers.len() != self.terminal_count as usize {
            return Err(ArtifactError::Malformed("matcher count mismatch"));
        }
        for matcher in &self.lex.matchers {
            if let TokenMatcher::Pattern { dfa } = matcher {
                deserialize_dfa(dfa).map_err(ArtifactError::Dfa)?;
            }
        }
        Ok(())
    }
}
