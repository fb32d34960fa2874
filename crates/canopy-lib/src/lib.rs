#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Error-tolerant incremental parsing for grammar-defined languages.
//!
//! Compile a declarative grammar once, then parse and re-parse source text
//! as it is edited, getting a complete concrete syntax tree for *any*
//! input. Syntax errors become ERROR/MISSING nodes instead of failures.
//!
//! ```
//! use canopy_lib::{Grammar, Parser, compile};
//!
//! let grammar = Grammar::from_json(r#"{
//!     "name": "digits",
//!     "rules": { "number": { "type": "PATTERN", "value": "[0-9]+" } }
//! }"#)?;
//! let table = compile(&grammar)?;
//! let parser = Parser::new(table);
//!
//! let tree = parser.parse("42", None)?;
//! assert_eq!(tree.root().to_sexp(), "(number)");
//!
//! // Re-derive from the previous tree after (here: zero) edits.
//! let edited = tree.with_edits(&[])?;
//! let tree = parser.parse("42", Some(&edited))?;
//! assert_eq!(tree.root().byte_range(), 0..2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Compiled tables are cached process-wide by grammar fingerprint and
//! shared read-only; parses run on any thread. See `canopy-compiler` for
//! table construction and `canopy-engine` for the runtime.

use std::sync::Arc;

pub use canopy_compiler::{GrammarError, fingerprint, registry};
pub use canopy_core::{Grammar, Point, Rule};
pub use canopy_engine::{
    ChunkedSource, Edit, EditError, ExternalInput, ExternalScanner, LexError, Node, NodeId,
    NoopTracer, ParseError, ParseOptions, Parser, PrintTracer, TextSource, Token, Tracer, Tree,
    TreeCursor, Verbosity,
};
pub use canopy_tables::{ARTIFACT_MAGIC, ArtifactError, CompiledGrammar, SymbolId};


/// Compile a grammar into shared, immutable parse tables.
///
/// Cached process-wide by grammar fingerprint: compiling the same grammar
/// again returns the existing tables. Use [`registry::reset`] to clear the
/// cache.
pub fn compile(grammar: &Grammar) -> Result<Arc<CompiledGrammar>, GrammarError> {
    canopy_compiler::registry::compile_cached(grammar)
}

/// Decode a compiled grammar artifact (produced by
/// [`CompiledGrammar::to_artifact_bytes`]) and register it for reuse.
pub fn load_artifact(bytes: &[u8]) -> Result<Arc<CompiledGrammar>, ArtifactError> {
    let compiled = Arc::new(CompiledGrammar::from_artifact_bytes(bytes)?);
    canopy_compiler::registry::register(Arc::clone(&compiled));
    Ok(compiled)
}
