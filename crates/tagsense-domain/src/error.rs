//! Error types for tag construction

use thiserror::Error;

/// Errors raised while interning tag names
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// The tag name was empty
    #[error("Tag name cannot be empty")]
    Empty,

    /// The tag name is not a well-formed dotted path
    #[error("Invalid tag name '{name}': {reason}")]
    InvalidName {
        /// The rejected name
        name: String,
        /// What was wrong with it
        reason: String,
    },
}
