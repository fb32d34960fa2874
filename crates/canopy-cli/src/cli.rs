//! Command-line definition and argument extraction.
//!
//! Shared `clap::Arg` constructors keep the same argument meaning across
//! commands; each command's params struct pulls its values out of the
//! matches.

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

/// Grammar file: `grammar.json` or a compiled `.canopy` artifact
/// (positional).
fn grammar_path_arg() -> Arg {
    Arg::new("grammar")
        .value_name("GRAMMAR")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Grammar file (grammar.json or compiled .canopy artifact)")
}

/// Source file to parse (positional).
fn source_path_arg() -> Arg {
    Arg::new("source_path")
        .value_name("SOURCE")
        .value_parser(value_parser!(PathBuf))
        .help("Source file to parse")
}

/// Inline source text (-s/--source).
fn source_text_arg() -> Arg {
    Arg::new("source_text")
        .short('s')
        .long("source")
        .value_name("TEXT")
        .help("Inline source text")
}

/// Artifact output path (-o/--output).
fn output_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("PATH")
        .value_parser(value_parser!(PathBuf))
        .help("Output path (defaults to the grammar name + .canopy)")
}

/// Emit the tree as JSON (--json).
fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Emit the tree as JSON instead of an s-expression")
}

/// Show byte spans on every node (--spans).
fn spans_arg() -> Arg {
    Arg::new("spans")
        .long("spans")
        .action(ArgAction::SetTrue)
        .help("Show byte spans on every node")
}

/// Apply a text replacement and re-parse incrementally (--edit).
fn edit_arg() -> Arg {
    Arg::new("edit")
        .long("edit")
        .num_args(3)
        .value_names(["START", "OLD_END", "NEW_TEXT"])
        .help("Replace bytes [START, OLD_END) with NEW_TEXT and re-parse incrementally")
}

pub fn build_cli() -> Command {
    Command::new("canopy")
        .about("Compile grammars and parse source into error-tolerant syntax trees")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("compile")
                .about("Compile grammar.json into a table artifact")
                .arg(grammar_path_arg())
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("parse")
                .about("Parse a source file and print its syntax tree")
                .arg(grammar_path_arg())
                .arg(source_path_arg())
                .arg(source_text_arg())
                .arg(json_arg())
                .arg(spans_arg())
                .arg(edit_arg()),
        )
}

pub struct CompileParams {
    pub grammar: PathBuf,
    pub output: Option<PathBuf>,
}

impl CompileParams {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            grammar: matches
                .get_one::<PathBuf>("grammar")
                .expect("grammar is required")
                .clone(),
            output: matches.get_one::<PathBuf>("output").cloned(),
        }
    }
}

pub struct ParseParams {
    pub grammar: PathBuf,
    pub source_path: Option<PathBuf>,
    pub source_text: Option<String>,
    pub json: bool,
    pub spans: bool,
    /// (start, old_end, new_text) from --edit.
    pub edit: Option<(usize, usize, String)>,
}

impl ParseParams {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let edit = matches.get_many::<String>("edit").map(|mut values| {
            let start = values.next().expect("clap enforces three values");
            let old_end = values.next().expect("clap enforces three values");
            let new_text = values.next().expect("clap enforces three values");
            (
                start.parse().unwrap_or(0),
                old_end.parse().unwrap_or(0),
                new_text.clone(),
            )
        });
        Self {
            grammar: matches
                .get_one::<PathBuf>("grammar")
                .expect("grammar is required")
                .clone(),
            source_path: matches.get_one::<PathBuf>("source_path").cloned(),
            source_text: matches.get_one::<String>("source_text").cloned(),
            json: matches.get_flag("json"),
            spans: matches.get_flag("spans"),
            edit,
        }
    }
}
