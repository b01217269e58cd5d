// ABOUTME: Diagnostic logging configuration for the wrapper.
// ABOUTME: Logging is off by default because stderr carries the child's output.

use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_FILTER: &str = "off";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `debug` or `ssh_wrapper=trace`.
    #[serde(default)]
    pub filter: Option<String>,

    /// Append diagnostics to this file instead of stderr.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LogConfig {
    pub fn filter_directive(&self) -> &str {
        self.filter.as_deref().unwrap_or(DEFAULT_FILTER)
    }
}
