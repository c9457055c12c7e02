//! Command execution trait

use async_trait::async_trait;

use crate::error::ExecutionError;
use crate::types::ConnectionState;
use ciaa_protocol::CommandOutput;

/// Something that runs opaque command strings on a remote shell.
///
/// Front-ends hold a `dyn CommandExecutor` so they never depend on the
/// transport behind it.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Current connection state
    fn state(&self) -> ConnectionState;

    /// Whether commands may be executed
    fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Run one command and wait for its classified output
    async fn execute(&self, command: &str) -> Result<CommandOutput, ExecutionError>;

    /// Close the channel. Safe to call more than once.
    async fn disconnect(&self);
}
