//! Config command for validating sheetwright configuration

use anyhow::Result;
use colored::Colorize;

use sheetwright::config::{global_config_path, Config};

use super::ensure_initialized;

/// Validate config semantically and report issues
pub fn cmd_config_validate() -> Result<()> {
    let workspace = ensure_initialized()?;

    println!("{}", "Validating sheetwright configuration...".bold());
    println!();

    if let Some(global) = global_config_path().filter(|p| p.exists()) {
        println!("  {} global config: {}", "ℹ".blue(), global.display());
    }
    println!(
        "  {} project config: {}",
        "ℹ".blue(),
        workspace.config_path().display()
    );

    let config = workspace.load_config()?;

    let errors = check_config(&config);
    let warnings = config.warnings();
    for warning in &warnings {
        println!("  {} {}", "⚠".yellow(), warning);
    }

    println!();
    if errors == 0 && warnings.is_empty() {
        println!("{} Configuration is valid", "✓".green());
    } else if errors == 0 {
        println!(
            "{} Configuration valid with {} warning(s)",
            "✓".green(),
            warnings.len()
        );
    } else {
        println!(
            "{} Found {} error(s) and {} warning(s)",
            "✗".red(),
            errors,
            warnings.len()
        );
        std::process::exit(1);
    }

    Ok(())
}

/// Print the AI section and hard errors; returns the error count
fn check_config(config: &Config) -> usize {
    println!("{}", "Checking AI provider...".dimmed());
    println!(
        "  {} provider: {:?}, model: {}, timeout: {}s",
        "ℹ".blue(),
        config.ai.provider,
        config.ai.model(),
        config.ai.timeout_secs
    );

    match config.validate() {
        Ok(()) => {
            println!("  {} settings are usable", "✓".green());
            0
        }
        Err(e) => {
            println!("  {} {:#}", "✗".red(), e);
            1
        }
    }
}
