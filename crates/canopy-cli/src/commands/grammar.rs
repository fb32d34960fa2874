//! Shared grammar loading for CLI commands.

use std::path::Path;
use std::sync::Arc;

use canopy_lib::{CompiledGrammar, Grammar};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("cannot read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{path}` is not valid grammar JSON: {message}")]
    GrammarJson { path: String, message: String },

    #[error(transparent)]
    Grammar(#[from] canopy_lib::GrammarError),

    #[error(transparent)]
    Artifact(#[from] canopy_lib::ArtifactError),

    #[error(transparent)]
    Parse(#[from] canopy_lib::ParseError),

    #[error(transparent)]
    Edit(#[from] canopy_lib::EditError),

    #[error("pass a source file or --source, not both")]
    ConflictingSources,

    #[error("nothing to parse: pass a source file or --source")]
    NoSource,
}

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Load compiled tables from either a grammar.json (compiled on the spot,
/// registry-cached) or a `.canopy` artifact.
pub(crate) fn load_grammar(path: &Path) -> Result<Arc<CompiledGrammar>, CliError> {
    let bytes = read_file(path)?;

    if bytes.starts_with(&canopy_lib::ARTIFACT_MAGIC) {
        return Ok(canopy_lib::load_artifact(&bytes)?);
    }

    let text = String::from_utf8_lossy(&bytes);
    let grammar = Grammar::from_json(&text).map_err(|e| CliError::GrammarJson {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(canopy_lib::compile(&grammar)?)
}
