//! tagsense CLI - replay tag and team-sense scenarios from the command line.

use clap::Parser;
use std::process::ExitCode;
use tagsense_cli::commands;
use tagsense_cli::{Cli, Command, Formatter};
use tracing_subscriber::EnvFilter;

/// Exit code when a requirement or scenario expectation is not met
const EXIT_MISMATCH: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_MISMATCH),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> tagsense_cli::Result<bool> {
    let formatter = Formatter::new(cli.format.into(), !cli.no_color);

    match cli.command {
        Command::Run(args) => commands::execute_run(args, &formatter),
        Command::Check(args) => commands::execute_check(args, &formatter),
    }
}

// Logs go to stderr; RUST_LOG overrides -v
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
