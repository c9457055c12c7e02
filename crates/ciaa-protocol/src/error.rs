//! Protocol error types

use thiserror::Error;

/// Errors that can occur while decoding shell output
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Sentinel line found but its trailing token is not an exit status
    #[error("Malformed sentinel line: {line:?}")]
    MalformedExitStatus { line: String },

    /// A single output line grew beyond the decoder limit
    #[error("Output line exceeds maximum of {max} bytes")]
    LineTooLong { max: usize },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
