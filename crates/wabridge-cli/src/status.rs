//! `wabridge status` — show configuration and session status.

use anyhow::Result;
use colored::Colorize;

use wabridge_core::config::{get_config_path, load_config};
use wabridge_core::utils::expand_home;

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "Wabridge Status".cyan().bold());
    println!();

    let config_exists = config_path.exists();
    println!(
        "  {:<10} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_exists {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".dimmed().to_string()
        }
    );

    println!(
        "  {:<10} ws://{}:{}",
        "Listen:".bold(),
        config.server.host,
        config.server.port
    );

    println!(
        "  {:<10} {} {}",
        "Engine:".bold(),
        config.engine.command,
        config.engine.args.join(" ")
    );

    let session = expand_home(&config.engine.data_path);
    let linked = session.exists();
    println!(
        "  {:<10} {} {}",
        "Session:".bold(),
        session.display(),
        if linked {
            "✓".green().to_string()
        } else {
            "(not linked yet)".dimmed().to_string()
        }
    );

    println!();
    Ok(())
}
