// ABOUTME: tracing-subscriber setup shared by the wrapper and the probe.
// ABOUTME: The wrapper logs nowhere unless asked, since its stderr is the child's.

use crate::config::{DEFAULT_FILTER, LogConfig};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Install the wrapper's subscriber.
///
/// A configured log file is opened in append mode; if that fails the
/// diagnostics fall back to stderr so the problem is visible.
pub fn init_wrapper(config: &LogConfig) {
    let filter = wrapper_filter(config.filter_directive());

    if let Some(path) = &config.file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file))
                    .init();
                return;
            }
            Err(e) => {
                eprintln!("ssh-wrapper: cannot open log file {}: {e}", path.display());
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse the wrapper's filter. An unparsable directive turns logging off
/// and says so once, rather than leaking diagnostics into the child's stream.
pub fn wrapper_filter(directive: &str) -> EnvFilter {
    match EnvFilter::try_new(directive) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("ssh-wrapper: invalid log filter '{directive}': {e}");
            EnvFilter::new(DEFAULT_FILTER)
        }
    }
}

/// Install the probe's subscriber: `debug` when verbose, `warn` otherwise.
pub fn init_cli(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
