//! ciaa-session: Remote shell session for the CIAA-ACC board
//!
//! A [`ShellSession`] owns one long-lived interactive shell and serializes
//! command strings through it, using the sentinel protocol from
//! `ciaa-protocol` to find where each command's output ends.

mod channel;
mod session;
pub mod ssh;

pub use session::ShellSession;
