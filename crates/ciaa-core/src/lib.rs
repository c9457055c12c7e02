//! ciaa-core: Core abstractions and configuration for the CIAA-ACC remote shell
//!
//! This crate provides the error taxonomy, session configuration and the
//! executor trait shared by the session implementation and its front-ends.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{ConfigError, ConnectionError, ExecutionError};
pub use traits::CommandExecutor;
pub use types::ConnectionState;
