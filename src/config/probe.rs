// ABOUTME: Connection probe defaults read from the wrapper config.
// ABOUTME: Mirrors the SSH options the job submitter passes to every connection.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ProbeDefaults {
    #[serde(default)]
    pub user: Option<String>,

    /// Private key passed as `-o IdentityFile=`.
    #[serde(default)]
    pub identity_file: Option<PathBuf>,

    /// SSH client config passed as `-F`; `/dev/null` isolates from `~/.ssh/config`.
    #[serde(default)]
    pub ssh_config: Option<PathBuf>,

    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,

    #[serde(default = "default_server_alive_interval", with = "humantime_serde")]
    pub server_alive_interval: Duration,
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_server_alive_interval() -> Duration {
    Duration::from_secs(20)
}

impl Default for ProbeDefaults {
    fn default() -> Self {
        ProbeDefaults {
            user: None,
            identity_file: None,
            ssh_config: None,
            connect_timeout: default_connect_timeout(),
            server_alive_interval: default_server_alive_interval(),
        }
    }
}
