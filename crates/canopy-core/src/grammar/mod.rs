//! Grammar types for declarative language definitions.
//!
//! This module provides types for representing tree-sitter-style
//! `grammar.json` files, with support for JSON deserialization and compact
//! binary serialization.

mod binary;
mod json;
mod types;

#[cfg(test)]
mod binary_tests;

pub use json::DecodeError;
pub use types::{Grammar, Rule, default_extras};
