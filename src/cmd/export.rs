//! Export command: write cleaned CSV files and rules.json
//!
//! Without --out, files go to `export.dir` from the config, relative to the
//! workspace root.

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use sheetwright::export::{export, ExportOptions};
use sheetwright::formatters::format_summary;
use sheetwright::ui;

use super::ensure_initialized;

pub fn cmd_export(out: Option<PathBuf>, force: bool) -> Result<()> {
    let workspace = ensure_initialized()?;
    let config = workspace.load_config()?;
    let dataset = workspace.load_dataset()?;
    let document = workspace.load_rules()?;

    let out_dir = out.unwrap_or_else(|| workspace.root().join(&config.export.dir));
    let options = ExportOptions {
        out_dir,
        force: force || !config.export.require_clean,
    };

    let summary = export(&dataset, &document.rule_set(), &document.priorities, &options)?;

    // Piped output gets bare paths, one per line
    if !atty::is(atty::Stream::Stdout) {
        for file in &summary.files {
            println!("{}", file.display());
        }
        return Ok(());
    }

    if !ui::is_quiet() {
        println!(
            "{} Exported to {}",
            "✓".green(),
            options.out_dir.display().to_string().cyan()
        );
        for file in &summary.files {
            println!("  {}", file.display());
        }
        println!("{}", format_summary(&summary.report));
    }

    Ok(())
}
