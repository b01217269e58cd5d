// ABOUTME: Error types for the stderr-filtering launcher.
// ABOUTME: Maps each failure class to the exit code the wrapper reports.

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for failures of the wrapper itself (config, relay setup).
pub const EXIT_WRAPPER_FAILURE: u8 = 125;
/// Exit code when the wrapped executable exists but cannot be executed.
pub const EXIT_NOT_EXECUTABLE: u8 = 126;
/// Exit code when the wrapped executable cannot be found.
pub const EXIT_NOT_FOUND: u8 = 127;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot launch '{program}': command not found")]
    NotFound { program: String },

    #[error("cannot launch '{program}': permission denied")]
    NotExecutable { program: String },

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("stderr relay could not be established for '{0}'")]
    RelayUnavailable(String),

    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Classify a spawn error for `program`.
    pub fn from_spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        let program = program.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound { program },
            std::io::ErrorKind::PermissionDenied => Error::NotExecutable { program },
            _ => Error::Spawn { program, source },
        }
    }

    /// Process exit code to report for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::NotFound { .. } => EXIT_NOT_FOUND,
            Error::NotExecutable { .. } => EXIT_NOT_EXECUTABLE,
            _ => EXIT_WRAPPER_FAILURE,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
