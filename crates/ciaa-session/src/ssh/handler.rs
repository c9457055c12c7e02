//! SSH client handler with known_hosts verification

use std::path::PathBuf;

use async_trait::async_trait;
use russh::client;
use russh_keys::key::PublicKey;
use thiserror::Error;

/// How to treat a host key that is not in known_hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// Reject unknown hosts
    Strict,
    /// Accept and record unknown hosts
    TrustOnFirstUse,
}

/// Errors raised during the SSH handshake
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// Transport-level SSH error
    #[error(transparent)]
    Ssh(#[from] russh::Error),

    /// known_hosts could not be read or parsed
    #[error("known_hosts: {0}")]
    Keys(#[from] russh_keys::Error),

    /// Host presented a different key than the recorded one
    #[error("host key for {host} changed (known_hosts line {line})")]
    KeyChanged { host: String, line: usize },
}

/// Client handler checking the board's host key
pub(crate) struct ClientHandler {
    host: String,
    port: u16,
    known_hosts: PathBuf,
    policy: HostKeyPolicy,
}

impl ClientHandler {
    pub(crate) fn new(
        host: String,
        port: u16,
        known_hosts: PathBuf,
        policy: HostKeyPolicy,
    ) -> Self {
        Self {
            host,
            port,
            known_hosts,
            policy,
        }
    }

    fn learn(&self, key: &PublicKey) {
        if let Some(parent) = self.known_hosts.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Cannot create {:?}: {}", parent, e);
                return;
            }
        }
        if let Err(e) =
            russh_keys::learn_known_hosts_path(&self.host, self.port, key, &self.known_hosts)
        {
            tracing::warn!("Failed to record host key for {}: {}", self.host, e);
        }
    }
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = HandshakeError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint();
        tracing::debug!("Server host key: {}", fingerprint);

        let known = if self.known_hosts.exists() {
            match russh_keys::check_known_hosts_path(
                &self.host,
                self.port,
                server_public_key,
                &self.known_hosts,
            ) {
                Ok(known) => known,
                Err(russh_keys::Error::KeyChanged { line }) => {
                    tracing::error!("Host key for {} changed", self.host);
                    return Err(HandshakeError::KeyChanged {
                        host: self.host.clone(),
                        line,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            false
        };

        if known {
            tracing::debug!("Host key verified against known_hosts");
            return Ok(true);
        }

        match self.policy {
            HostKeyPolicy::Strict => {
                tracing::debug!("Host {} not in known_hosts", self.host);
                Ok(false)
            }
            HostKeyPolicy::TrustOnFirstUse => {
                tracing::warn!(
                    "Trusting unknown host key for {} on first use ({})",
                    self.host,
                    fingerprint
                );
                self.learn(server_public_key);
                Ok(true)
            }
        }
    }
}
