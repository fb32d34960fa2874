mod cli;
mod commands;

use cli::{CompileParams, ParseParams, build_cli};

fn main() {
    let matches = build_cli().get_matches();

    let outcome = match matches.subcommand() {
        Some(("compile", m)) => {
            let params = CompileParams::from_matches(m);
            commands::compile::run(params)
        }
        Some(("parse", m)) => {
            let params = ParseParams::from_matches(m);
            commands::parse::run(params)
        }
        _ => unreachable!("clap should have caught this"),
    };

    if let Err(error) = outcome {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
