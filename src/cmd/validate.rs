//! Validate and show commands

use anyhow::{Context, Result};
use colored::Colorize;

use sheetwright::formatters::{format_report, format_table};
use sheetwright::schema::EntityKind;
use sheetwright::validation::{validate, Report};

use super::ensure_initialized;
use crate::cli::OutputFormat;

/// Validate stored data and rules. Exits with status 1 when errors are found.
pub fn cmd_validate(format: OutputFormat, entity: Option<EntityKind>) -> Result<()> {
    let workspace = ensure_initialized()?;
    let dataset = workspace.load_dataset()?;
    let rules = workspace.load_rules()?.rule_set();

    let mut report = validate(&dataset, &rules);
    if let Some(kind) = entity {
        report = Report {
            issues: report.for_entity(kind).cloned().collect(),
        };
    }

    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{}", json);
        }
        OutputFormat::Text => println!("{}", format_report(&report)),
    }

    if report.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

/// Print one table with issue markers
pub fn cmd_show(entity: EntityKind, issues_only: bool) -> Result<()> {
    let workspace = ensure_initialized()?;
    let dataset = workspace.load_dataset()?;
    let rules = workspace.load_rules()?.rule_set();
    let report = validate(&dataset, &rules);

    let table = dataset.table(entity);
    println!(
        "{} {}",
        entity.to_string().bold(),
        format!("({} row(s))", table.len()).dimmed()
    );
    println!("{}", format_table(table, &report, issues_only));

    let row_issues: Vec<_> = report
        .for_entity(entity)
        .filter(|i| i.row.is_some())
        .collect();
    if !row_issues.is_empty() {
        println!();
        for issue in row_issues {
            println!(
                "  {} {}  {}",
                sheetwright::ui::severity_icon(issue.severity),
                issue.location().cyan(),
                issue.message
            );
        }
    }

    Ok(())
}
