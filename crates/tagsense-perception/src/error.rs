//! Error types for perception operations

use crate::ListenerId;
use thiserror::Error;

/// Errors that can occur while configuring or driving a sense
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PerceptionError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No listener with this id is registered
    #[error("Unknown listener: {0}")]
    UnknownListener(ListenerId),

    /// The worker that owns the event queue has shut down
    #[error("Event queue closed")]
    QueueClosed,

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}
