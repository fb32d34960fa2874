#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Runtime engine for canopy.
//!
//! Drives the compiled tables from `canopy-tables` over a byte source:
//! - `source` - pull-based byte access (the engine does no I/O)
//! - `lexer` - state-sensitive table-driven lexing with an external
//!   scanner hook
//! - `parser` - the generalized LR loop, stack forking/merging,
//!   cooperative cancellation
//! - `recovery` - ERROR/MISSING synthesis; a tree comes out of any input
//! - `tree` - immutable arena trees, edits, byte/point indexing
//!
//! Parses are independent synchronous calls sharing nothing mutable but
//! the frozen tables; trees are value-like once returned.

mod error;
mod lexer;
mod parser;
mod recovery;
mod reuse;
mod source;
mod stack;
mod trace;
pub mod tree;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod parser_tests;
#[cfg(test)]
mod recovery_tests;
#[cfg(test)]
mod reuse_tests;
#[cfg(test)]
mod source_tests;

pub use error::{EditError, LexError, ParseError};
pub use lexer::{ExternalInput, ExternalScanner, Token};
pub use parser::{ParseOptions, Parser};
pub use source::{ChunkedSource, TextSource};
pub use trace::{NoopTracer, PrintTracer, Tracer, Verbosity};
pub use tree::{Edit, Node, NodeId, Tree, TreeCursor};
