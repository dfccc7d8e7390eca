//! Rule commands: add, add-json, list, remove, suggest

use anyhow::{Context, Result};
use colored::Colorize;

use sheetwright::ai::provider_from_config;
use sheetwright::formatters::format_rules;
use sheetwright::rules::author::rule_from_text;
use sheetwright::rules::schema::parse_rule_str;
use sheetwright::rules::suggest::suggest_rules;
use sheetwright::rules::Rule;
use sheetwright::ui;
use sheetwright::validation::validate;
use sheetwright::workspace::Workspace;

use super::{ensure_initialized, print_revalidation};

/// Author a rule from plain English via the configured AI provider
pub fn cmd_rule_add(description: &str) -> Result<()> {
    let workspace = ensure_initialized()?;
    let dataset = workspace.load_dataset()?;
    let provider = provider_from_config(&workspace.load_config()?.ai);

    let rule = rule_from_text(description, &dataset, provider.as_ref()).with_context(|| {
        "Could not create the rule with AI; add it as JSON with `sheetwright rule add-json`"
    })?;
    add_rule(&workspace, rule)
}

pub fn cmd_rule_add_json(json: &str) -> Result<()> {
    let workspace = ensure_initialized()?;
    let rule = parse_rule_str(json)?;
    add_rule(&workspace, rule)
}

fn add_rule(workspace: &Workspace, rule: Rule) -> Result<()> {
    let mut document = workspace.load_rules()?;
    let mut rules = document.rule_set();
    let index = rules.add(rule.clone())?;
    document.rules = rules.rules;
    workspace.save_rules(&document)?;

    if !ui::is_quiet() {
        println!("{} Added {} {}", "✓".green(), format!("#{}", index).cyan(), rule);
    }

    let dataset = workspace.load_dataset()?;
    let report = validate(&dataset, &document.rule_set());
    for issue in report.rule_issues().filter(|i| i.rule == Some(index)) {
        println!(
            "  {} {}",
            ui::severity_icon(issue.severity),
            issue.message
        );
    }
    print_revalidation(&report);
    Ok(())
}

pub fn cmd_rule_list() -> Result<()> {
    let workspace = ensure_initialized()?;
    let rules = workspace.load_rules()?.rule_set();
    println!("{}", format_rules(&rules));
    Ok(())
}

pub fn cmd_rule_remove(index: usize) -> Result<()> {
    let workspace = ensure_initialized()?;
    let mut document = workspace.load_rules()?;
    let mut rules = document.rule_set();
    let removed = rules.remove(index)?;
    document.rules = rules.rules;
    workspace.save_rules(&document)?;

    if !ui::is_quiet() {
        println!("{} Removed {}", "✓".green(), removed);
    }
    Ok(())
}

/// Print suggestions; with `apply`, add them all
pub fn cmd_rule_suggest(apply: bool) -> Result<()> {
    let workspace = ensure_initialized()?;
    let dataset = workspace.load_dataset()?;
    let mut document = workspace.load_rules()?;
    let mut rules = document.rule_set();

    let suggestions = suggest_rules(&dataset, &rules);
    if suggestions.is_empty() {
        println!("No rule suggestions");
        return Ok(());
    }

    for suggestion in &suggestions {
        println!("  {} {}", suggestion.rule, format!("({})", suggestion.reason).dimmed());
    }

    if apply {
        for suggestion in suggestions {
            rules.add(suggestion.rule)?;
        }
        document.rules = rules.rules;
        workspace.save_rules(&document)?;
        if !ui::is_quiet() {
            println!("{} Rules added", "✓".green());
        }
    } else if !ui::is_quiet() {
        println!("{}", "Run with --apply to add them".dimmed());
    }

    Ok(())
}
