//! Command module structure for sheetwright CLI

use anyhow::Result;
use colored::Colorize;

use sheetwright::formatters::format_summary;
use sheetwright::validation::Report;
use sheetwright::workspace::Workspace;

pub mod config;
pub mod edit;
pub mod export;
pub mod import;
pub mod init;
pub mod priorities;
pub mod rule;
pub mod search;
pub mod util;
pub mod validate;

/// Ensure sheetwright is initialized and return the workspace.
///
/// Looks in the current directory and its ancestors for `.sheetwright/`.
pub fn ensure_initialized() -> Result<Workspace> {
    Workspace::discover()
}

/// Print the summary line of a fresh validation run after a change.
pub fn print_revalidation(report: &Report) {
    if sheetwright::ui::is_quiet() {
        return;
    }
    println!("{} {}", "Validation:".dimmed(), format_summary(report));
}
