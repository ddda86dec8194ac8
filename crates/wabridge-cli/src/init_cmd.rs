//! `wabridge init` — write the default config file.

use anyhow::{Context, Result};
use colored::Colorize;

use wabridge_core::config::{get_config_path, save_config, Config};

/// Run the init command.
pub fn run() -> Result<()> {
    let path = get_config_path();

    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    save_config(&Config::default(), None).context("failed to write config")?;

    println!("{} {}", "Created".green().bold(), path.display());
    println!(
        "Edit it, then run {} to start the bridge.",
        "wabridge serve".bold()
    );
    Ok(())
}
