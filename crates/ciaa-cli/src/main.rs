//! CIAA-ACC remote shell
//!
//! Opens a persistent SSH shell on the acquisition board and runs
//! configuration commands through it, either interactively or one-shot.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ciaa_core::config::{self, SessionConfig};
use ciaa_session::ShellSession;
use ciaa_shell::commands;
use ciaa_shell::output::{print_error, print_success};

#[derive(Parser)]
#[command(name = "ciaa-shell")]
#[command(author, version, about = "Remote shell for configuring the CIAA-ACC acquisition board")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Board hostname or IP (overrides config)
    #[arg(long, global = true)]
    host: Option<String>,

    /// SSH port (overrides config)
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Login user (overrides config)
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Per-command timeout in seconds (default: wait indefinitely)
    #[arg(short, long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open an interactive prompt on the board (default)
    Shell,

    /// Run commands on the board and exit
    Exec {
        /// Commands to run, in order
        #[arg(required = true)]
        commands: Vec<String>,
        /// Print each result as a JSON object
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Show config file path
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);

    match &cli.command {
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => commands::config_show(&config_path),
            ConfigAction::Path => commands::config_path(&config_path),
            ConfigAction::Init { force } => commands::config_init(&config_path, *force),
        },
        Some(Commands::Exec { commands: to_run, json }) => {
            let session = connect(&cli, &config_path).await?;
            let all_succeeded = commands::exec_command(&session, to_run, *json).await?;
            if !all_succeeded {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Commands::Shell) | None => {
            let session = connect(&cli, &config_path).await?;
            commands::shell_command(&session).await
        }
    }
}

/// Build the effective session config from file and flags
fn session_config(cli: &Cli, config_path: &Path) -> Result<SessionConfig> {
    let mut config = if config_path.exists() {
        config::load_config(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        SessionConfig::default()
    };

    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(user) = &cli.user {
        config.username = user.clone();
    }
    if let Some(secs) = cli.timeout {
        config.command_timeout = Some(Duration::from_secs(secs));
    }

    config
        .validate()
        .with_context(|| format!("Invalid config in {:?}", config_path))?;
    Ok(config)
}

async fn connect(cli: &Cli, config_path: &Path) -> Result<ShellSession> {
    let config = session_config(cli, config_path)?;
    let address = config.address();

    match ShellSession::connect(config).await {
        Ok(session) => {
            if !cli.quiet {
                print_success(&format!("Connected to {}", address));
            }
            Ok(session)
        }
        Err(e) => {
            print_error(&format!("Could not connect to {}", address));
            Err(anyhow::Error::new(e).context(format!("Connection to {} failed", address)))
        }
    }
}
