//! ciaa-shell: Command-line front-end for the CIAA-ACC remote shell
//!
//! Provides an interactive prompt and one-shot execution on top of a
//! [`ciaa_session::ShellSession`].

pub mod commands;
pub mod output;
