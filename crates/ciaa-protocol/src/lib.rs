//! ciaa-protocol: Sentinel-delimited command protocol
//!
//! An interactive shell gives no framing: input is echoed back, stdout and
//! stderr share one stream, and nothing marks where a command's output ends.
//! This crate recovers command boundaries by writing a synthetic `echo` of a
//! fixed phrase and the shell's `$?` after every command, then scanning the
//! returned lines until that phrase appears.
//!
//! Everything here is synchronous and free of I/O. The session crate drives
//! an [`Invocation`] with lines decoded by [`ShellLineCodec`].

pub mod codec;
pub mod error;
pub mod invocation;
pub mod output;
pub mod sanitize;
pub mod sentinel;

pub use codec::{ShellLineCodec, DEFAULT_MAX_LINE_LENGTH};
pub use error::ProtocolError;
pub use invocation::{Invocation, Phase};
pub use output::CommandOutput;
pub use sanitize::strip_control;
pub use sentinel::{parse_exit_status, sentinel_command, FINISH_PHRASE};
