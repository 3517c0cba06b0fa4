//! tagsense CLI library.
//!
//! This library provides the core functionality for the `tagsense` command-line
//! interface: argument parsing, scenario files, command execution and output
//! formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Scenario;
pub use error::{CliError, Result};
pub use output::{Formatter, OutputFormat};
