#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures for canopy grammars.
//!
//! Two layers:
//! - **Grammar layer**: the declarative rule tree as authored, with 1:1
//!   JSON deserialization from `grammar.json` files
//! - **Support types**: name interning for compilation, `Point` coordinates
//!   shared by the whole pipeline
//!
//! Compilation of a [`Grammar`] into parse tables lives in `canopy-compiler`;
//! this crate only models the input.

pub mod grammar;
mod interner;
mod point;

#[cfg(test)]
mod point_tests;

pub use grammar::{DecodeError, Grammar, Rule};
pub use interner::{NameId, NameInterner};
pub use point::Point;
