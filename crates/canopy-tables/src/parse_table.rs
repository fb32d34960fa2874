//! The parse automaton as pure data.
//!
//! One generic engine loop drives any grammar by looking up
//! `(state, lookahead)` here; there is no per-grammar code. Action rows are
//! sorted by symbol id for binary search.

use serde::{Deserialize, Serialize};

use crate::{ProductionId, StateId, SymbolId};

/// Maximum number of actions a single `(state, lookahead)` cell may hold.
/// Wider cells are rejected at compile time; the bound keeps generalized
/// parsing's fan-out predictable.
pub const MAX_ACTIONS: usize = 8;

/// A single parse action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Shift { state: StateId },
    Reduce { production: ProductionId },
    Accept,
}

/// The action(s) for one `(state, lookahead)` cell.
///
/// Deterministic cells hold exactly one action. Cells covered by a declared
/// conflict hold up to [`MAX_ACTIONS`], in a fixed order (shifts first, then
/// reduces by production id); the engine forks one stack per action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSet(Vec<Action>);

impl ActionSet {
    pub fn new(actions: Vec<Action>) -> Self {
        debug_assert!(!actions.is_empty() && actions.len() <= MAX_ACTIONS);
        Self(actions)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.0.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The lone action of a deterministic cell, if this cell is one.
    #[inline]
    pub fn single(&self) -> Option<Action> {
        match self.0.as_slice() {
            [action] => Some(*action),
            _ => None,
        }
    }
}

/// One automaton state: terminal actions plus nonterminal gotos, both
/// sorted by symbol id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseState {
    pub actions: Vec<(SymbolId, ActionSet)>,
    pub gotos: Vec<(SymbolId, StateId)>,
}

impl ParseState {
    /// Look up the action set for a lookahead terminal (binary search).
    pub fn action(&self, symbol: SymbolId) -> Option<&ActionSet> {
        self.actions
            .binary_search_by_key(&symbol, |(sym, _)| *sym)
            .ok()
            .map(|idx| &self.actions[idx].1)
    }

    /// Look up the successor state after reducing to a nonterminal.
    pub fn goto(&self, symbol: SymbolId) -> Option<StateId> {
        self.gotos
            .binary_search_by_key(&symbol, |(sym, _)| *sym)
            .ok()
            .map(|idx| self.gotos[idx].1)
    }

    /// Terminals this state has any action for, in ascending id order.
    /// This is the valid-token set the lexer scans against.
    pub fn valid_terminals(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.actions.iter().map(|(sym, _)| *sym)
    }

    /// Whether any action cell in this state holds more than one action.
    pub fn has_conflicts(&self) -> bool {
        self.actions.iter().any(|(_, set)| set.len() > 1)
    }
}

/// The full automaton. State 0 is the start state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseTable {
    pub states: Vec<ParseState>,
}

impl ParseTable {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
