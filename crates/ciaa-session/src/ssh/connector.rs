//! Connection establishment
//!
//! Two authentication attempts are made, each on its own connection and
//! bounded by the configured connect timeout:
//!
//! 1. Strict host key checking, then every configured identity file, then
//!    the password if one is set.
//! 2. If that fails and trust-on-first-use is enabled, an unknown host key
//!    is accepted and recorded, and the `none` method is tried.
//!
//! Nothing is retried beyond these two attempts.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use russh::client::{self, Config, Handle};

use ciaa_core::config::SessionConfig;
use ciaa_core::ConnectionError;

use super::handler::{ClientHandler, HandshakeError, HostKeyPolicy};
use crate::channel::ShellChannel;

/// Interval between SSH keepalive requests on an idle session.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Authenticate against the board and open an interactive shell on it
pub(crate) async fn establish(config: &SessionConfig) -> Result<ShellChannel, ConnectionError> {
    let handle = match bounded(config, with_credentials(config)).await {
        Ok(handle) => handle,
        Err(first) if config.trust_on_first_use => {
            tracing::warn!(
                "Credential authentication to {} failed: {}. Falling back to none authentication",
                config.address(),
                first
            );
            bounded(config, without_credentials(config)).await?
        }
        Err(first) => return Err(first),
    };

    open_shell(handle, config).await
}

async fn bounded<F>(
    config: &SessionConfig,
    attempt: F,
) -> Result<Handle<ClientHandler>, ConnectionError>
where
    F: Future<Output = Result<Handle<ClientHandler>, ConnectionError>>,
{
    tokio::time::timeout(config.connect_timeout, attempt)
        .await
        .map_err(|_| ConnectionError::Timeout(config.connect_timeout))?
}

fn ssh_config() -> Arc<Config> {
    Arc::new(Config {
        inactivity_timeout: None,
        keepalive_interval: Some(KEEPALIVE_INTERVAL),
        ..Default::default()
    })
}

async fn handshake(
    config: &SessionConfig,
    policy: HostKeyPolicy,
) -> Result<Handle<ClientHandler>, ConnectionError> {
    let handler = ClientHandler::new(
        config.host.clone(),
        config.port,
        config.known_hosts(),
        policy,
    );

    tracing::debug!("Connecting to {} ({:?} host keys)", config.address(), policy);
    client::connect(ssh_config(), config.address(), handler)
        .await
        .map_err(|e| handshake_error(config, e))
}

/// First attempt: verified host, real credentials
async fn with_credentials(
    config: &SessionConfig,
) -> Result<Handle<ClientHandler>, ConnectionError> {
    let mut handle = handshake(config, HostKeyPolicy::Strict).await?;

    for path in config.identity_files.iter().filter(|p| p.exists()) {
        let key = match russh_keys::load_secret_key(path, None) {
            Ok(key) => key,
            Err(e) => {
                tracing::debug!("Skipping identity {:?}: {}", path, e);
                continue;
            }
        };

        tracing::debug!("Trying public key {:?} for '{}'", path, config.username);
        let accepted = handle
            .authenticate_publickey(config.username.as_str(), Arc::new(key))
            .await
            .map_err(ssh_error)?;
        if accepted {
            return Ok(handle);
        }
    }

    if let Some(password) = &config.password {
        tracing::debug!("Trying password for '{}'", config.username);
        let accepted = handle
            .authenticate_password(config.username.as_str(), password.as_str())
            .await
            .map_err(ssh_error)?;
        if accepted {
            return Ok(handle);
        }
    }

    Err(ConnectionError::AuthenticationFailed {
        user: config.username.clone(),
    })
}

/// Second attempt: trust-on-first-use host key, `none` authentication
async fn without_credentials(
    config: &SessionConfig,
) -> Result<Handle<ClientHandler>, ConnectionError> {
    let mut handle = handshake(config, HostKeyPolicy::TrustOnFirstUse).await?;

    let accepted = handle
        .authenticate_none(config.username.as_str())
        .await
        .map_err(ssh_error)?;
    if accepted {
        Ok(handle)
    } else {
        Err(ConnectionError::AuthenticationFailed {
            user: config.username.clone(),
        })
    }
}

async fn open_shell(
    handle: Handle<ClientHandler>,
    config: &SessionConfig,
) -> Result<ShellChannel, ConnectionError> {
    let channel = handle
        .channel_open_session()
        .await
        .map_err(|e| ConnectionError::ShellRequest(format!("open session channel: {}", e)))?;

    channel
        .request_pty(
            false,
            &config.term,
            config.term_cols,
            config.term_rows,
            0,
            0,
            &[],
        )
        .await
        .map_err(|e| ConnectionError::ShellRequest(format!("pty: {}", e)))?;

    channel
        .request_shell(true)
        .await
        .map_err(|e| ConnectionError::ShellRequest(format!("shell: {}", e)))?;

    tracing::info!("Interactive shell open on {}", config.address());
    Ok(ShellChannel::new(channel.into_stream(), Some(handle)))
}

fn ssh_error(e: russh::Error) -> ConnectionError {
    ConnectionError::Ssh(e.to_string())
}

fn handshake_error(config: &SessionConfig, e: HandshakeError) -> ConnectionError {
    match e {
        HandshakeError::KeyChanged { host, line } => {
            ConnectionError::HostKeyMismatch { host, line }
        }
        HandshakeError::Ssh(russh::Error::UnknownKey) => ConnectionError::UnknownHostKey {
            host: config.host.clone(),
        },
        other => ConnectionError::Ssh(format!("{}: {}", config.address(), other)),
    }
}
