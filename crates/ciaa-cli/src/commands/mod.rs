//! CLI command implementations

mod config;
mod exec;
mod shell;

pub use config::{config_init, config_path, config_show};
pub use exec::exec_command;
pub use shell::{run_repl, shell_command, PROMPT};
