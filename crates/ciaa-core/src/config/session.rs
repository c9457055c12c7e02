//! Remote shell session configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::serde_utils::{duration_secs, option_duration_secs};
use crate::error::ConfigError;

/// How to reach and authenticate against the acquisition board
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Board hostname or IP address
    pub host: String,

    /// SSH port
    pub port: u16,

    /// Login user
    pub username: String,

    /// Private keys tried in order during credential authentication
    pub identity_files: Vec<PathBuf>,

    /// Password tried after the keys, if set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Bound on each authentication attempt
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Deadline for a single command; unset blocks until the command ends
    #[serde(with = "option_duration_secs", skip_serializing_if = "Option::is_none")]
    pub command_timeout: Option<Duration>,

    /// known_hosts file (defaults to `~/.ssh/known_hosts`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_hosts_path: Option<PathBuf>,

    /// Fall back to `none` authentication and accept an unknown host key.
    ///
    /// This weakens host authenticity: the first key seen is trusted and
    /// recorded. A key that differs from a recorded one is still rejected.
    pub trust_on_first_use: bool,

    /// TERM value sent with the PTY request
    pub term: String,

    /// PTY width in columns
    pub term_cols: u32,

    /// PTY height in rows
    pub term_rows: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let ssh_dir = dirs::home_dir().unwrap_or_default().join(".ssh");
        Self {
            host: "192.168.0.22".to_string(),
            port: 22,
            username: "root".to_string(),
            identity_files: vec![
                ssh_dir.join("id_ed25519"),
                ssh_dir.join("id_rsa"),
                ssh_dir.join("id_ecdsa"),
            ],
            password: None,
            connect_timeout: Duration::from_secs(3),
            command_timeout: None,
            known_hosts_path: None,
            trust_on_first_use: true,
            term: "vt100".to_string(),
            term_cols: 80,
            term_rows: 24,
        }
    }
}

impl SessionConfig {
    /// Create a config for `host` and `username` with default settings
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            ..Default::default()
        }
    }

    /// `host:port` socket address string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Effective known_hosts path
    pub fn known_hosts(&self) -> PathBuf {
        self.known_hosts_path.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_default()
                .join(".ssh")
                .join("known_hosts")
        })
    }

    /// Reject settings that would make every connection or command fail
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "connect_timeout must be at least one second".to_string(),
            ));
        }
        if self.command_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::Invalid(
                "command_timeout must be at least one second; omit it to wait indefinitely"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
