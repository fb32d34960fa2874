//! `canopy compile`: grammar.json → table artifact.

use std::path::PathBuf;

use crate::cli::CompileParams;
use crate::commands::{CliError, load_grammar};

pub fn run(params: CompileParams) -> Result<(), CliError> {
    let compiled = load_grammar(&params.grammar)?;

    let output: PathBuf = params
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.canopy", compiled.name)));

    let bytes = compiled.to_artifact_bytes();
    std::fs::write(&output, &bytes).map_err(|source| CliError::Io {
        path: output.display().to_string(),
        source,
    })?;

    println!(
        "compiled `{}`: {} symbols, {} states, {} bytes -> {}",
        compiled.name,
        compiled.symbols.len(),
        compiled.parse.states.len(),
        bytes.len(),
        output.display()
    );
    Ok(())
}
