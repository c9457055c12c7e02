//! Remote shell session
//!
//! The session owns the only channel to the board. Commands are serialized
//! with an async mutex: output of interleaved commands would otherwise be
//! attributed to the wrong caller, since the shell returns everything on a
//! single stream.

use std::future::{self, Future};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use ciaa_core::config::SessionConfig;
use ciaa_core::{CommandExecutor, ConnectionError, ConnectionState, ExecutionError};
use ciaa_protocol::CommandOutput;

use crate::channel::ShellChannel;
use crate::ssh;

/// A persistent interactive shell on a remote host
pub struct ShellSession {
    /// How to (re)connect; `None` for sessions attached to a stream
    config: Option<SessionConfig>,
    /// Peer description used in logs
    label: String,
    /// Connection state, observable through [`ShellSession::subscribe_state`]
    state: watch::Sender<ConnectionState>,
    /// The shell channel; held for the whole of each command
    channel: Mutex<Option<ShellChannel>>,
    /// Deadline applied by [`ShellSession::execute`]
    command_timeout: Option<Duration>,
}

impl ShellSession {
    /// Create a disconnected session for `config`
    pub fn new(config: SessionConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            label: config.address(),
            command_timeout: config.command_timeout,
            config: Some(config),
            state,
            channel: Mutex::new(None),
        }
    }

    /// Connect to the host in `config` and open an interactive shell
    pub async fn connect(config: SessionConfig) -> Result<Self, ConnectionError> {
        let session = Self::new(config);
        session.open().await?;
        Ok(session)
    }

    /// Wrap an already-open duplex stream to a shell.
    ///
    /// The session starts connected and cannot reconnect.
    pub fn attach<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (state, _) = watch::channel(ConnectionState::Connected);
        Self {
            config: None,
            label: "attached stream".to_string(),
            state,
            channel: Mutex::new(Some(ShellChannel::new(stream, None))),
            command_timeout: None,
        }
    }

    /// Set the deadline applied by [`ShellSession::execute`]
    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// The configuration this session dials, if any
    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    /// (Re)establish the connection, replacing any existing channel.
    ///
    /// Waits for an in-flight command to finish first.
    pub async fn open(&self) -> Result<(), ConnectionError> {
        let config = self.config.as_ref().ok_or(ConnectionError::NoRemote)?;

        let mut guard = self.channel.lock().await;
        if let Some(old) = guard.take() {
            old.close().await;
        }

        self.set_state(ConnectionState::Connecting);
        tracing::info!("Connecting to {} as '{}'", self.label, config.username);

        match ssh::establish(config).await {
            Ok(channel) => {
                *guard = Some(channel);
                self.set_state(ConnectionState::Connected);
                tracing::info!("Connected to {}", self.label);
                Ok(())
            }
            Err(e) => {
                self.set_state(ConnectionState::Disconnected);
                tracing::warn!("Could not connect to {}: {}", self.label, e);
                Err(e)
            }
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Whether commands may be executed
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Watch connection state changes
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Run `command` and return its classified output.
    ///
    /// Blocks until the command finishes unless a command timeout is set.
    pub async fn execute(&self, command: &str) -> Result<CommandOutput, ExecutionError> {
        match self.command_timeout {
            Some(timeout) => self.execute_with_timeout(command, timeout).await,
            None => self.run(command, future::pending()).await,
        }
    }

    /// Run `command`, giving up after `timeout`.
    ///
    /// The clock starts once the channel is ours, not while queued behind
    /// another command. Expiry drops the connection.
    pub async fn execute_with_timeout(
        &self,
        command: &str,
        timeout: Duration,
    ) -> Result<CommandOutput, ExecutionError> {
        self.run(command, async move {
            tokio::time::sleep(timeout).await;
            ExecutionError::TimedOut(timeout)
        })
        .await
    }

    /// Run `command` until it finishes or `token` is cancelled.
    ///
    /// Cancellation drops the connection.
    pub async fn execute_cancellable(
        &self,
        command: &str,
        token: &CancellationToken,
    ) -> Result<CommandOutput, ExecutionError> {
        self.run(command, async move {
            token.cancelled().await;
            ExecutionError::Cancelled
        })
        .await
    }

    /// Close the channel. Idempotent.
    pub async fn disconnect(&self) {
        self.set_state(ConnectionState::Disconnected);

        let channel = self.channel.lock().await.take();
        if let Some(channel) = channel {
            channel.close().await;
            tracing::info!("Disconnected from {}", self.label);
        }
    }

    async fn run<F>(&self, command: &str, interrupt: F) -> Result<CommandOutput, ExecutionError>
    where
        F: Future<Output = ExecutionError>,
    {
        if !self.is_connected() {
            return Err(ExecutionError::NotConnected);
        }

        let mut guard = self.channel.lock().await;
        let Some(channel) = guard.as_mut() else {
            return Err(ExecutionError::NotConnected);
        };

        let abandoned = AbandonGuard::new(self);
        let result = tokio::select! {
            biased;
            result = channel.exchange(command) => result,
            err = interrupt => Err(err),
        };
        abandoned.disarm();

        if let Err(e) = &result {
            if e.closes_channel() {
                tracing::warn!("Dropping channel to {}: {}", self.label, e);
                self.set_state(ConnectionState::Disconnected);
                if let Some(channel) = guard.take() {
                    channel.close().await;
                }
            } else {
                tracing::debug!("Command {:?} failed: {}", command, e);
            }
        }

        result
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::debug!("Session {}: {} -> {}", self.label, previous, state);
        }
    }
}

/// Marks the session disconnected if a caller drops `execute` mid-command.
///
/// The dropped command's output and sentinel are still on the stream, so the
/// channel can no longer be trusted to line up with the next command.
struct AbandonGuard<'a> {
    session: &'a ShellSession,
    armed: bool,
}

impl<'a> AbandonGuard<'a> {
    fn new(session: &'a ShellSession) -> Self {
        Self {
            session,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!(
                "Command on {} abandoned before its sentinel was read",
                self.session.label
            );
            self.session.set_state(ConnectionState::Disconnected);
        }
    }
}

#[async_trait]
impl CommandExecutor for ShellSession {
    fn state(&self) -> ConnectionState {
        ShellSession::state(self)
    }

    async fn execute(&self, command: &str) -> Result<CommandOutput, ExecutionError> {
        ShellSession::execute(self, command).await
    }

    async fn disconnect(&self) {
        ShellSession::disconnect(self).await
    }
}
