//! Search command

use anyhow::{Context, Result};
use colored::Colorize;

use sheetwright::ai::{provider_from_config, ModelProvider, OfflineProvider};
use sheetwright::schema::EntityKind;
use sheetwright::search::{search, SearchSource};
use sheetwright::ui;

use super::ensure_initialized;
use crate::cli::OutputFormat;

pub fn cmd_search(
    query: &str,
    entity: Option<EntityKind>,
    offline: bool,
    format: OutputFormat,
) -> Result<()> {
    let workspace = ensure_initialized()?;
    let dataset = workspace.load_dataset()?;

    let provider: Box<dyn ModelProvider> = if offline {
        Box::new(OfflineProvider)
    } else {
        provider_from_config(&workspace.load_config()?.ai)
    };

    let outcome = search(&dataset, query, entity, provider.as_ref());

    if format == OutputFormat::Json {
        let json = serde_json::to_string_pretty(&outcome).context("Failed to serialize results")?;
        println!("{}", json);
        return Ok(());
    }

    if !ui::is_quiet() {
        match (&outcome.source, &outcome.fallback_reason) {
            (SearchSource::Ai, _) => println!("{}", format!("Matched by {}", provider.name()).dimmed()),
            (SearchSource::Substring, Some(reason)) if !offline => println!(
                "{} {}",
                "AI search unavailable, matched substrings:".yellow(),
                reason.dimmed()
            ),
            (SearchSource::Substring, _) => println!("{}", "Matched substrings".dimmed()),
        }
    }

    if outcome.hits.is_empty() {
        println!("No matches for '{}'", query);
        return Ok(());
    }

    for hit in &outcome.hits {
        let table = dataset.table(hit.entity);
        let id = hit.id.clone().unwrap_or_else(|| format!("#{}", hit.row));
        let name = table.cell(hit.row, hit.entity.name_column()).unwrap_or("");
        println!("  {:<8} {}  {}", hit.entity.to_string(), id.cyan(), name);
    }
    if !ui::is_quiet() {
        println!("{}", format!("{} match(es)", outcome.hits.len()).dimmed());
    }

    Ok(())
}
