//! Import command: load, normalize and store spreadsheets

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use sheetwright::rules::RuleSet;
use sheetwright::schema::EntityKind;
use sheetwright::ui;
use sheetwright::validation::validate;
use sheetwright::workspace::import_files;

use super::{ensure_initialized, print_revalidation};

pub fn cmd_import(paths: &[PathBuf], kind: Option<EntityKind>) -> Result<()> {
    let workspace = ensure_initialized()?;
    let mut dataset = workspace.load_dataset()?;

    let imported = import_files(&mut dataset, paths, kind)?;
    workspace.save_dataset(&dataset)?;

    if !ui::is_quiet() {
        for item in &imported {
            let fixes = if item.fixes.is_empty() {
                String::new()
            } else {
                format!(" ({} value(s) normalized)", item.fixes.len())
            };
            println!(
                "{} {} → {} [{} row(s)]{}",
                "✓".green(),
                item.path.display(),
                item.entity.to_string().cyan(),
                item.rows,
                fixes.dimmed()
            );
        }
    }

    let rules: RuleSet = workspace.load_rules()?.rule_set();
    print_revalidation(&validate(&dataset, &rules));
    Ok(())
}
