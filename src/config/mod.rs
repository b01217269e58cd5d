// ABOUTME: Configuration types and loading for ssh-wrapper.yml.
// ABOUTME: Handles file discovery, YAML parsing, env overrides, and validation.

mod log;
mod probe;

pub use log::{DEFAULT_FILTER, LogConfig};
pub use probe::ProbeDefaults;

use crate::error::{Error, Result};
use crate::filter::{FIPS_NOISE, SuppressionFilter};
use serde::Deserialize;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "ssh-wrapper.yml";
pub const CONFIG_FILENAME_ALT: &str = "ssh-wrapper.yaml";

/// Explicit config file path.
pub const CONFIG_ENV: &str = "SSH_WRAPPER_CONFIG";
/// Overrides `program`.
pub const PROGRAM_ENV: &str = "SSH_WRAPPER_PROGRAM";
/// Overrides `log.filter`.
pub const LOG_ENV: &str = "SSH_WRAPPER_LOG";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Wrapped executable; bare names are looked up on PATH.
    #[serde(default = "default_program")]
    pub program: PathBuf,

    /// Extra line prefixes dropped from the child's stderr. The FIPS banner
    /// is always dropped and need not be listed.
    #[serde(default)]
    pub suppress: Vec<String>,

    /// How long the relay may keep draining after the child exits.
    #[serde(default = "default_drain_timeout", with = "humantime_serde")]
    pub drain_timeout: Duration,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub probe: ProbeDefaults,
}

fn default_program() -> PathBuf {
    PathBuf::from("ssh")
}

fn default_drain_timeout() -> Duration {
    Duration::from_secs(2)
}

impl Default for Config {
    fn default() -> Self {
        Config {
            program: default_program(),
            suppress: Vec::new(),
            drain_timeout: default_drain_timeout(),
            log: LogConfig::default(),
            probe: ProbeDefaults::default(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Locate and load the configuration.
    ///
    /// `SSH_WRAPPER_CONFIG` wins and must point at an existing file. Otherwise
    /// `ssh-wrapper.yml` (or `.yaml`) in `dir` is used if present, and the
    /// built-in defaults if not.
    pub fn discover(dir: Option<&Path>) -> Result<Self> {
        if let Some(path) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            let path = PathBuf::from(path);
            if !path.is_file() {
                return Err(Error::ConfigNotFound(path));
            }
            tracing::debug!(path = %path.display(), "loading config from {CONFIG_ENV}");
            return Self::load(&path);
        }

        if let Some(dir) = dir {
            for path in [dir.join(CONFIG_FILENAME), dir.join(CONFIG_FILENAME_ALT)] {
                if path.is_file() {
                    tracing::debug!(path = %path.display(), "loading config");
                    return Self::load(&path);
                }
            }
        }

        Ok(Config::default())
    }

    /// Discover relative to the running executable and apply env overrides.
    pub fn from_env() -> Result<Self> {
        let exe_dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let mut config = Self::discover(exe_dir.as_deref())?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `SSH_WRAPPER_PROGRAM` and `SSH_WRAPPER_LOG`. Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(program) = non_empty_var(PROGRAM_ENV) {
            self.program = PathBuf::from(program);
        }
        if let Some(filter) = non_empty_var(LOG_ENV) {
            self.log.filter = Some(filter.to_string_lossy().into_owned());
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.program.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("program cannot be empty".to_string()));
        }
        if let Some(pos) = self.suppress.iter().position(String::is_empty) {
            return Err(Error::InvalidConfig(format!(
                "suppress[{pos}] is empty and would drop every line"
            )));
        }
        Ok(())
    }

    /// The FIPS banner plus every configured prefix.
    pub fn filter(&self) -> SuppressionFilter {
        SuppressionFilter::new(
            std::iter::once(FIPS_NOISE).chain(self.suppress.iter().map(String::as_str)),
        )
    }
}

fn non_empty_var(name: &str) -> Option<OsString> {
    env::var_os(name).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_wrap_ssh_and_drop_fips_banner() {
        let config = Config::default();
        assert_eq!(config.program, PathBuf::from("ssh"));
        assert!(config.suppress.is_empty());
        assert_eq!(config.drain_timeout, Duration::from_secs(2));
        assert!(config.filter().is_suppressed(b"FIPS mode initialized\n"));
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.program, PathBuf::from("ssh"));
        assert!(config.suppress.is_empty());
        assert!(config.filter().is_suppressed(b"FIPS mode initialized\n"));
    }

    #[test]
    fn empty_prefix_is_rejected() {
        let err = Config::from_yaml("suppress: ['']").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn empty_program_is_rejected() {
        let err = Config::from_yaml("program: ''").unwrap_err();
        assert!(err.to_string().contains("program"));
    }
}
