//! Errors that can occur during lexing, parsing, and editing.
//!
//! Syntactic errors in the parsed text are never represented here; they
//! become ERROR/MISSING nodes inside an otherwise complete tree.

/// Fatal lexing conditions.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LexError {
    /// An external scanner claimed a token without consuming bytes, which
    /// would loop forever.
    #[error("external scanner returned a zero-length `{symbol}` token at byte {offset}")]
    ZeroWidthExternal { symbol: String, offset: usize },

    /// The lex table references DFA data that does not deserialize. Tables
    /// produced by the compiler or a validated artifact never hit this.
    #[error("lex table is malformed: {0}")]
    Table(String),
}

/// Errors that abort a parse attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    /// The cooperative cancellation flag was raised. No partial tree is
    /// exposed.
    #[error("parse cancelled")]
    Cancelled,

    #[error(transparent)]
    Lex(#[from] LexError),
}

/// Caller misuse of the edit interface.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EditError {
    #[error("edit {index} starts before the previous edit")]
    Unsorted { index: usize },

    #[error("edit {index} overlaps the previous edit's replaced range")]
    Overlapping { index: usize },

    #[error("edit {index} has old_end before start")]
    Inverted { index: usize },
}
