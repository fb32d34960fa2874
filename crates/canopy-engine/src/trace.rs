//! Tracing infrastructure for debugging parser execution.
//!
//! # Design: Zero-Cost Abstraction
//!
//! The tracer is designed as a zero-cost abstraction. When `NoopTracer` is
//! used:
//! - All trait methods are `#[inline(always)]` empty functions
//! - The compiler eliminates all tracer calls and their arguments
//! - No tracing-related state exists in core execution structures
//!
//! Formatting and name resolution happen in the tracer implementation; the
//! engine hands over raw ids it already has.

use canopy_tables::{CompiledGrammar, ProductionId, StateId, SymbolId};

/// Verbosity level for trace output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Default: shift, reduce, recovery events.
    #[default]
    Default,
    /// Verbose: also forks, merges, and subtree reuse.
    Verbose,
}

/// Tracer trait for parser instrumentation.
///
/// Each method is called at a specific point during execution:
/// - `trace_shift` - after a token is shifted
/// - `trace_reduce` - after a production is reduced
/// - `trace_fork` / `trace_merge` - when ambiguity forks or merges stacks
/// - `trace_reuse` - when an unedited subtree is pushed wholesale
/// - `trace_missing` / `trace_error_node` - recovery events
/// - `trace_accept` - when a stack reaches Accept
pub trait Tracer {
    /// Called after a token is shifted.
    fn trace_shift(&mut self, symbol: SymbolId, start: usize, end: usize);

    /// Called after a production is reduced.
    fn trace_reduce(&mut self, production: ProductionId, child_count: usize);

    /// Called when a multi-action cell forks the stack.
    fn trace_fork(&mut self, state: StateId, fan_out: usize);

    /// Called when two stacks merge at a token boundary.
    fn trace_merge(&mut self, state: StateId);

    /// Called when an unedited subtree from the previous tree is reused.
    fn trace_reuse(&mut self, symbol: SymbolId, start: usize, end: usize);

    /// Called when recovery synthesizes a zero-width MISSING token.
    fn trace_missing(&mut self, symbol: SymbolId, offset: usize);

    /// Called when recovery closes an ERROR node.
    fn trace_error_node(&mut self, start: usize, end: usize);

    /// Called when a stack accepts.
    fn trace_accept(&mut self, error_cost: u32);
}

/// Tracer that does nothing. All methods optimize away.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_shift(&mut self, _symbol: SymbolId, _start: usize, _end: usize) {}
    #[inline(always)]
    fn trace_reduce(&mut self, _production: ProductionId, _child_count: usize) {}
    #[inline(always)]
    fn trace_fork(&mut self, _state: StateId, _fan_out: usize) {}
    #[inline(always)]
    fn trace_merge(&mut self, _state: StateId) {}
    #[inline(always)]
    fn trace_reuse(&mut self, _symbol: SymbolId, _start: usize, _end: usize) {}
    #[inline(always)]
    fn trace_missing(&mut self, _symbol: SymbolId, _offset: usize) {}
    #[inline(always)]
    fn trace_error_node(&mut self, _start: usize, _end: usize) {}
    #[inline(always)]
    fn trace_accept(&mut self, _error_cost: u32) {}
}

/// Tracer that prints events to stderr, resolving symbol names through the
/// compiled grammar.
pub struct PrintTracer<'g> {
    grammar: &'g CompiledGrammar,
    verbosity: Verbosity,
}

impl<'g> PrintTracer<'g> {
    pub fn new(grammar: &'g CompiledGrammar, verbosity: Verbosity) -> Self {
        Self { grammar, verbosity }
    }
}

impl Tracer for PrintTracer<'_> {
    fn trace_shift(&mut self, symbol: SymbolId, start: usize, end: usize) {
        eprintln!(
            "shift   {} [{start}, {end})",
            self.grammar.symbol_name(symbol)
        );
    }

    fn trace_reduce(&mut self, production: ProductionId, child_count: usize) {
        let lhs = self.grammar.production(production).lhs;
        eprintln!(
            "reduce  {} <- {child_count} children",
            self.grammar.symbol_name(lhs)
        );
    }

    fn trace_fork(&mut self, state: StateId, fan_out: usize) {
        if self.verbosity == Verbosity::Verbose {
            eprintln!("fork    state {state} x{fan_out}");
        }
    }

    fn trace_merge(&mut self, state: StateId) {
        if self.verbosity == Verbosity::Verbose {
            eprintln!("merge   state {state}");
        }
    }

    fn trace_reuse(&mut self, symbol: SymbolId, start: usize, end: usize) {
        if self.verbosity == Verbosity::Verbose {
            eprintln!(
                "reuse   {} [{start}, {end})",
                self.grammar.symbol_name(symbol)
            );
        }
    }

    fn trace_missing(&mut self, symbol: SymbolId, offset: usize) {
        eprintln!(
            "missing {} at {offset}",
            self.grammar.symbol_name(symbol)
        );
    }

    fn trace_error_node(&mut self, start: usize, end: usize) {
        eprintln!("error   [{start}, {end})");
    }

    fn trace_accept(&mut self, error_cost: u32) {
        eprintln!("accept  cost {error_cost}");
    }
}
