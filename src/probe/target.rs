// ABOUTME: Probe target addresses.
// ABOUTME: Parses formats like "host", "user@host", "host:port", "user@host:port".

use super::error::{ProbeError, Result};
use std::fmt;

pub const DEFAULT_PORT: u16 = 22;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
}

impl Target {
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = |reason: &str| ProbeError::InvalidTarget {
            target: s.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid("address cannot be empty"));
        }

        // [user@]host[:port]
        let (user, rest) = match trimmed.split_once('@') {
            Some(("", _)) => return Err(invalid("user cannot be empty")),
            Some((user, rest)) => (Some(user.to_string()), rest),
            None => (None, trimmed),
        };

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| invalid(&format!("invalid port: {port}")))?;
                (host, port)
            }
            None => (rest, DEFAULT_PORT),
        };

        if host.is_empty() {
            return Err(invalid("hostname cannot be empty"));
        }

        Ok(Target {
            host: host.to_string(),
            port,
            user,
        })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{user}@")?;
        }
        write!(f, "{}", self.host)?;
        if self.port != DEFAULT_PORT {
            write!(f, ":{}", self.port)?;
        }
        Ok(())
    }
}
