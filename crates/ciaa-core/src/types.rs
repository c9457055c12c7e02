//! Core type definitions

use std::fmt;

/// Connection state of a remote shell session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No usable channel
    #[default]
    Disconnected,
    /// Authentication or shell invocation in progress
    Connecting,
    /// Interactive shell open and ready for commands
    Connected,
}

impl ConnectionState {
    /// Whether commands may be executed
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}
