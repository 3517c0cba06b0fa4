//! CLI command definitions and argument parsing.

use clap::{ArgAction, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tagsense_domain::MatchPolicy;

/// tagsense - Replay tag and team-sense scenarios and evaluate tag requirements.
#[derive(Debug, Parser)]
#[command(name = "tagsense")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "table")]
    pub format: CliFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay a scenario file through a tag counter per actor and a team sense
    Run(RunArgs),

    /// Evaluate a tag requirement against a set of tags
    Check(CheckArgs),
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Scenario file (TOML)
    pub scenario: PathBuf,
}

/// Arguments for the check command.
#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Tags the subject has (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Tags that must all be present (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    pub require: Vec<String>,

    /// Tags of which none may be present (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    pub ignore: Vec<String>,

    /// How tag queries treat ancestors
    #[arg(short, long, value_enum, default_value = "explicit")]
    pub policy: PolicyArg,
}

/// Match policy argument, shared by the command line and scenario files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyArg {
    /// Only the named tag
    #[default]
    Explicit,
    /// The named tag and its ancestors
    #[serde(alias = "include_parents")]
    IncludeParents,
}

impl From<CliFormat> for crate::output::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::output::OutputFormat::Table,
            CliFormat::Json => crate::output::OutputFormat::Json,
        }
    }
}

impl From<PolicyArg> for MatchPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Explicit => MatchPolicy::Explicit,
            PolicyArg::IncludeParents => MatchPolicy::IncludeParents,
        }
    }
}
