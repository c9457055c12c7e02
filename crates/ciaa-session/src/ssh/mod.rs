//! SSH transport: authentication fallback and shell invocation

mod connector;
mod handler;

pub(crate) use connector::establish;
pub(crate) use handler::ClientHandler;
pub use handler::{HandshakeError, HostKeyPolicy};
