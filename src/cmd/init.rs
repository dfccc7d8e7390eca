//! Init command: create the `.sheetwright/` workspace

use anyhow::{Context, Result};
use colored::Colorize;

use sheetwright::paths::WORKSPACE_DIR;
use sheetwright::ui;
use sheetwright::workspace::Workspace;

pub fn cmd_init(name: Option<String>, force: bool) -> Result<()> {
    let root = std::env::current_dir().context("Failed to read current directory")?;
    let project_name = name
        .or_else(|| {
            root.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.to_string())
        })
        .unwrap_or_else(|| "sheetwright-project".to_string());

    let workspace = Workspace::init(&root, &project_name, force)?;

    if !ui::is_quiet() {
        println!(
            "{} Initialized {} for {}",
            "✓".green(),
            WORKSPACE_DIR.cyan(),
            project_name.bold()
        );
        println!("  config: {}", workspace.config_path().display());
        println!();
        println!("Next: {}", "sheetwright import <files...>".cyan());
    }

    Ok(())
}
