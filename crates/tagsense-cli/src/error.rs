//! Error types for the CLI application.

use tagsense_domain::TagError;
use tagsense_perception::PerceptionError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Scenario references something it never declared, or is otherwise inconsistent
    #[error("Scenario error: {0}")]
    Scenario(String),

    /// Tag name error
    #[error("Tag error: {0}")]
    Tag(#[from] TagError),

    /// Sense configuration or listener error
    #[error("Perception error: {0}")]
    Perception(#[from] PerceptionError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}
