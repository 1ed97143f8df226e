//! ctxkit CLI: assemble LLM prompts from messages, files, directories,
//! URLs, and nested JSON configs.

mod commands;

use std::process::ExitCode;

use clap::{CommandFactory, FromArgMatches};
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    commands::init_tracing(&cli);

    match commands::run(&cli, &matches) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("Error: {err}");
            Ok(ExitCode::from(2))
        }
    }
}
