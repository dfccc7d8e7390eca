//! Priority weight commands

use anyhow::Result;
use colored::Colorize;

use sheetwright::formatters::format_priorities;
use sheetwright::priorities::{Criterion, Preset, PriorityWeights};
use sheetwright::ui;
use sheetwright::workspace::Workspace;

use super::ensure_initialized;

pub fn cmd_priorities_show() -> Result<()> {
    let workspace = ensure_initialized()?;
    let document = workspace.load_rules()?;
    println!("{}", format_priorities(&document.priorities));
    Ok(())
}

pub fn cmd_priorities_set(criterion: &str, weight: f64) -> Result<()> {
    let criterion: Criterion = criterion.parse()?;
    update(|weights| weights.set(criterion, weight))
}

pub fn cmd_priorities_preset(name: &str) -> Result<()> {
    let preset: Preset = name.parse()?;
    update(|weights| {
        *weights = preset.weights();
        Ok(())
    })
}

pub fn cmd_priorities_rank(criteria: &[String]) -> Result<()> {
    let ranking = criteria
        .iter()
        .map(|c| c.parse::<Criterion>())
        .collect::<Result<Vec<_>>>()?;
    let ranked = PriorityWeights::from_ranking(&ranking)?;
    update(|weights| {
        *weights = ranked;
        Ok(())
    })
}

fn update(change: impl FnOnce(&mut PriorityWeights) -> Result<()>) -> Result<()> {
    let workspace: Workspace = ensure_initialized()?;
    let mut document = workspace.load_rules()?;
    change(&mut document.priorities)?;
    workspace.save_rules(&document)?;

    if !ui::is_quiet() {
        println!("{} Priorities updated", "✓".green());
        println!("{}", format_priorities(&document.priorities));
    }
    Ok(())
}
