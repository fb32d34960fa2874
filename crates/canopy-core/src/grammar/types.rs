//! Grammar type definitions.

use serde::{Deserialize, Serialize};

/// Complete declarative grammar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grammar {
    /// Grammar name (e.g., "amble", "json").
    pub name: String,
    /// Production rules, preserving definition order. The entry rule is
    /// always first.
    pub rules: Vec<(String, Rule)>,
    /// Extra/trivia tokens (comments, whitespace), valid between any two
    /// tokens. Defaults to ASCII whitespace when the grammar omits them;
    /// an explicitly empty list disables extras entirely.
    #[serde(default = "default_extras")]
    pub extras: Vec<Rule>,
    /// Expected conflicts: sets of rule names allowed to remain ambiguous
    /// in the parse table (resolved at runtime by generalized parsing).
    #[serde(default)]
    pub conflicts: Vec<Vec<String>>,
    /// External scanner tokens.
    #[serde(default)]
    pub externals: Vec<Rule>,
    /// Keyword identifier rule: the token whose matches are checked against
    /// the keyword table.
    #[serde(default)]
    pub word: Option<String>,
}

/// The implicit whitespace extra used when a grammar does not list its own.
pub fn default_extras() -> Vec<Rule> {
    vec![Rule::Pattern {
        value: "[ \\t\\r\\n]+".to_string(),
    }]
}

/// Grammar rule variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Rule {
    /// Epsilon (empty match).
    Blank,
    /// Literal token.
    String(String),
    /// Regex token.
    Pattern { value: String },
    /// Reference to another rule.
    Symbol(String),
    /// Sequence of rules (must match in order).
    Seq(Vec<Rule>),
    /// Alternation.
    Choice(Vec<Rule>),
    /// Zero or more repetitions.
    Repeat(Box<Rule>),
    /// One or more repetitions.
    Repeat1(Box<Rule>),
    /// Force the content to lex as a single token.
    Token(Box<Rule>),
    /// Static precedence.
    Prec { value: i32, content: Box<Rule> },
    /// Left-associative precedence.
    PrecLeft { value: i32, content: Box<Rule> },
    /// Right-associative precedence.
    PrecRight { value: i32, content: Box<Rule> },
    /// Dynamic precedence: biases stack selection during generalized
    /// parsing instead of table construction.
    PrecDynamic { value: i32, content: Box<Rule> },
}

impl Rule {
    /// Strip precedence wrappers, returning the underlying content.
    pub fn unwrap_prec(&self) -> &Rule {
        match self {
            Rule::Prec { content, .. }
            | Rule::PrecLeft { content, .. }
            | Rule::PrecRight { content, .. }
            | Rule::PrecDynamic { content, .. } => content.unwrap_prec(),
            other => other,
        }
    }

    /// Whether this rule body defines a token: a bare literal, pattern, or
    /// explicit `Token` wrapper (modulo precedence annotations).
    pub fn is_terminal_body(&self) -> bool {
        matches!(
            self.unwrap_prec(),
            Rule::String(_) | Rule::Pattern { .. } | Rule::Token(_)
        )
    }
}

impl Grammar {
    /// Create an empty grammar with the default extras.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
            extras: default_extras(),
            conflicts: Vec::new(),
            externals: Vec::new(),
            word: None,
        }
    }

    /// Look up a rule body by name.
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|(rule_name, _)| rule_name == name)
            .map(|(_, body)| body)
    }

    /// The entry rule name (first in definition order), if any.
    pub fn start_rule(&self) -> Option<&str> {
        self.rules.first().map(|(name, _)| name.as_str())
    }
}
