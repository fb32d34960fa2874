//! Grammar preparation: flattening rule trees into numbered productions
//! and validating the result before automaton construction.

mod flatten;
mod validate;

#[cfg(test)]
mod validate_tests;

pub(crate) use flatten::{
    FlatGrammar, FlatMatcher, FlatProduction, NonterminalSpec, SymRef, TerminalSpec, flatten,
};
pub(crate) use validate::validate;
