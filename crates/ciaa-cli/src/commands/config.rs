//! Config command implementations

use std::path::Path;

use anyhow::{Context, Result};

use crate::output::{format_config, print_info, print_success, print_warning};
use ciaa_core::config::{self, SessionConfig};

/// Print the effective configuration
pub fn config_show(path: &Path) -> Result<()> {
    let config: SessionConfig = if path.exists() {
        config::load_config(path).with_context(|| format!("Failed to load {:?}", path))?
    } else {
        print_info(&format!("No config file at {:?}, showing defaults", path));
        SessionConfig::default()
    };

    print!("{}", format_config(&config)?);
    Ok(())
}

/// Print the configuration file path
pub fn config_path(path: &Path) -> Result<()> {
    println!("{}", path.display());
    Ok(())
}

/// Write a default configuration file
pub fn config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        print_warning(&format!("Config already exists at {:?}", path));
        print_info("Use --force to overwrite it");
        return Ok(());
    }

    config::save_config(path, &SessionConfig::default())
        .with_context(|| format!("Failed to write {:?}", path))?;
    print_success(&format!("Wrote default config to {:?}", path));
    Ok(())
}
