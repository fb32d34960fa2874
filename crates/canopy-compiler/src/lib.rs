#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Grammar compiler for canopy.
//!
//! The compilation pipeline:
//! - `prepare` - flattening rule trees into productions, validation
//! - `build` - FIRST/FOLLOW analysis, item sets, conflict resolution,
//!   lexical DFAs
//! - `registry` - process-wide cache of compiled tables
//!
//! Compilation is a synchronous batch computation; its output
//! [`CompiledGrammar`] is immutable and safe to share across threads.

mod build;
mod error;
mod prepare;
pub mod registry;

#[cfg(test)]
mod compile_tests;

pub use error::GrammarError;

use canopy_core::Grammar;
use canopy_tables::CompiledGrammar;

/// Compile a declarative grammar into its parse and lex tables.
///
/// Deterministic: the same grammar always produces byte-identical tables.
pub fn compile(grammar: &Grammar) -> Result<CompiledGrammar, GrammarError> {
    let flat = prepare::flatten(grammar)?;
    prepare::validate(&flat)?;
    build::build(&flat, fingerprint(grammar))
}

/// Stable hash of a grammar's canonical serialization. Keys the registry
/// and ties every tree to the grammar version that produced it.
pub fn fingerprint(grammar: &Grammar) -> u64 {
    fnv1a(&grammar.to_binary())
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
