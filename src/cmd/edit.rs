//! Edit and delete commands

use anyhow::Result;
use colored::Colorize;

use sheetwright::edit::{delete_row, set_cell};
use sheetwright::schema::EntityKind;
use sheetwright::ui;
use sheetwright::validation::validate;

use super::{ensure_initialized, print_revalidation};

pub fn cmd_edit(entity: EntityKind, row: &str, column: &str, value: &str) -> Result<()> {
    let workspace = ensure_initialized()?;
    let mut dataset = workspace.load_dataset()?;

    let fixes = set_cell(&mut dataset, entity, row, column, value)?;
    workspace.save_table(dataset.table(entity))?;

    if !ui::is_quiet() {
        println!("{} Updated {} {}", "✓".green(), entity, row.cyan());
        for fix in &fixes {
            println!(
                "  {} {} → {}",
                fix.column.dimmed(),
                fix.before,
                fix.after.green()
            );
        }
    }

    let rules = workspace.load_rules()?.rule_set();
    print_revalidation(&validate(&dataset, &rules));
    Ok(())
}

pub fn cmd_delete(entity: EntityKind, row: &str) -> Result<()> {
    let workspace = ensure_initialized()?;
    let mut dataset = workspace.load_dataset()?;

    delete_row(&mut dataset, entity, row)?;
    workspace.save_table(dataset.table(entity))?;

    if !ui::is_quiet() {
        println!("{} Deleted {} {}", "✓".green(), entity, row.cyan());
    }

    let rules = workspace.load_rules()?.rule_set();
    print_revalidation(&validate(&dataset, &rules));
    Ok(())
}
