//! Shared CLI helpers.

use colored::Colorize;

/// Print the banner shown at serve start.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!("  {}  v{}", "Wabridge".cyan().bold(), version.dimmed());
    println!(
        "  {}",
        "WhatsApp automation bridge for external controllers".dimmed()
    );
}
