// ABOUTME: Error types for the connection probe.
// ABOUTME: Covers target parsing, process launch, and command timeouts.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("failed to run '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command timed out after {0:?}")]
    CommandTimeout(Duration),

    #[error(transparent)]
    Config(#[from] crate::error::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProbeError>;
