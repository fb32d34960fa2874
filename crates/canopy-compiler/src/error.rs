//! Compile-time grammar errors.

/// Errors that abort table construction. Each names the offending rule
/// where one exists; syntactic errors in *parsed source text* are never
/// represented here; those become ERROR/MISSING nodes in trees.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GrammarError {
    #[error("grammar has no rules")]
    EmptyGrammar,

    /// A rule references a name that is neither a defined rule nor a
    /// declared external token.
    #[error("rule `{rule}` references `{symbol}`, which is neither a defined rule nor a declared external token")]
    Undeclared { rule: String, symbol: String },

    #[error("externals[{index}] must be a symbol reference")]
    MalformedExternal { index: usize },

    #[error("extras[{index}] must be a symbol reference or a token")]
    MalformedExtra { index: usize },

    #[error("rule `{rule}` is unreachable from the entry rule `{start}`")]
    Unreachable { rule: String, start: String },

    /// The rule can derive itself without consuming input, so ambiguity
    /// under it is unbounded.
    #[error("rule `{rule}` can derive itself without consuming input")]
    CyclicRule { rule: String },

    #[error("rule `{rule}` has an invalid pattern: {message}")]
    InvalidPattern { rule: String, message: String },

    /// A conflict that precedence did not resolve and no declared conflict
    /// set covers.
    #[error("unresolved conflict on `{lookahead}` involving {}; declare a conflict or add precedence", format_rules(.rules))]
    Conflict {
        lookahead: String,
        rules: Vec<String>,
    },

    /// A declared conflict produced more simultaneous actions than the
    /// engine's bounded fan-out allows.
    #[error("ambiguity on `{lookahead}` needs {width} simultaneous actions, more than the supported {bound}")]
    AmbiguityBound {
        lookahead: String,
        width: usize,
        bound: usize,
    },
}

fn format_rules(rules: &[String]) -> String {
    let names: Vec<String> = rules.iter().map(|r| format!("`{r}`")).collect();
    names.join(", ")
}
