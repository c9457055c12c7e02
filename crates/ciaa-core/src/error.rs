//! Error types for the remote shell

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use ciaa_protocol::ProtocolError;
use thiserror::Error;

/// Failures while establishing a session
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Handshake or authentication did not finish in time
    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),

    /// Every authentication method was rejected
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Host is not in known_hosts and unknown hosts are not trusted
    #[error("Unknown host key for {host}")]
    UnknownHostKey { host: String },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host} does not match known_hosts (line {line})")]
    HostKeyMismatch { host: String, line: usize },

    /// Transport-level SSH error
    #[error("SSH error: {0}")]
    Ssh(String),

    /// PTY or shell request refused
    #[error("Shell request failed: {0}")]
    ShellRequest(String),

    /// Session was attached to a stream and cannot dial a host
    #[error("Session has no remote host configured")]
    NoRemote,
}

/// Failures while executing a command on an open session
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The session has no open channel
    #[error("Not connected")]
    NotConnected,

    /// Write or read on the channel failed
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    /// The remote end closed the channel before the sentinel arrived
    #[error("Channel closed before command completed")]
    ChannelClosed,

    /// Output could not be interpreted
    #[error("Malformed response: {0}")]
    MalformedResponse(ProtocolError),

    /// Sentinel did not arrive before the deadline
    #[error("Command timed out after {0:?}")]
    TimedOut(Duration),

    /// Caller cancelled the command
    #[error("Command cancelled")]
    Cancelled,
}

impl ExecutionError {
    /// Whether the channel can no longer be used after this error.
    ///
    /// Deadlines and cancellations leave unread output in flight, which would
    /// be attributed to the next command, so they count as fatal too.
    pub fn closes_channel(&self) -> bool {
        match self {
            ExecutionError::NotConnected => false,
            ExecutionError::Transport(e) => matches!(
                e.kind(),
                io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::NotConnected
                    | io::ErrorKind::UnexpectedEof
            ),
            ExecutionError::ChannelClosed
            | ExecutionError::TimedOut(_)
            | ExecutionError::Cancelled => true,
            ExecutionError::MalformedResponse(e) => {
                !matches!(e, ProtocolError::MalformedExitStatus { .. })
            }
        }
    }
}

impl From<ProtocolError> for ExecutionError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Io(e) => ExecutionError::Transport(e),
            other => ExecutionError::MalformedResponse(other),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
