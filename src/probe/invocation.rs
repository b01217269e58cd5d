// ABOUTME: Builds the SSH client argument vector used for every probe command.
// ABOUTME: Uses the job submitter's non-interactive options, without connection sharing.

use super::target::{DEFAULT_PORT, Target};
use crate::config::ProbeDefaults;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SshInvocation {
    pub target: Target,
    /// Login user when the target does not name one.
    pub user: Option<String>,
    pub identity_file: Option<PathBuf>,
    pub ssh_config: Option<PathBuf>,
    pub connect_timeout: Duration,
    pub server_alive_interval: Duration,
}

impl SshInvocation {
    pub fn new(target: Target) -> Self {
        Self::from_defaults(target, &ProbeDefaults::default())
    }

    pub fn from_defaults(target: Target, defaults: &ProbeDefaults) -> Self {
        Self {
            target,
            user: defaults.user.clone(),
            identity_file: defaults.identity_file.clone(),
            ssh_config: defaults.ssh_config.clone(),
            connect_timeout: defaults.connect_timeout,
            server_alive_interval: defaults.server_alive_interval,
        }
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn identity_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_file = Some(path.into());
        self
    }

    pub fn ssh_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.ssh_config = Some(path.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// The user that will log in: the target's own, else the configured one.
    pub fn login_user(&self) -> Option<&str> {
        self.target.user.as_deref().or(self.user.as_deref())
    }

    /// Arguments for running `remote_command` on the target.
    ///
    /// No `ControlMaster`/`ControlPath`: every call opens its own
    /// connection, so timings measure a full round trip.
    pub fn args(&self, remote_command: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        if let Some(config) = &self.ssh_config {
            args.push("-F".into());
            args.push(config.into());
        }
        if let Some(key) = &self.identity_file {
            let mut opt = OsString::from("IdentityFile=");
            opt.push(key);
            args.push("-o".into());
            args.push(opt);
        }
        if let Some(user) = self.login_user() {
            args.push("-l".into());
            args.push(user.into());
        }
        if self.target.port != DEFAULT_PORT {
            args.push("-p".into());
            args.push(self.target.port.to_string().into());
        }

        for opt in [
            "BatchMode=yes".to_string(),
            format!("ConnectTimeout={}", whole_secs(self.connect_timeout)),
            format!("ServerAliveInterval={}", whole_secs(self.server_alive_interval)),
            "StrictHostKeyChecking=no".to_string(),
        ] {
            args.push("-o".into());
            args.push(opt.into());
        }

        args.push(self.target.host.as_str().into());
        args.push(remote_command.into());
        args
    }
}

/// SSH takes whole seconds; never round a non-zero timeout down to "none".
fn whole_secs(d: Duration) -> u64 {
    d.as_secs().max(1)
}
