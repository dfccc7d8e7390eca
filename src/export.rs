//! Export cleaned tables and the rules document.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::priorities::PriorityWeights;
use crate::rules::{RuleSet, RulesDocument};
use crate::schema::EntityKind;
use crate::table::Dataset;
use crate::validation::{validate, Report};

/// File name of the exported rules document
pub const RULES_FILE_NAME: &str = "rules.json";

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub out_dir: PathBuf,
    /// Export even when validation reports errors
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct ExportSummary {
    pub files: Vec<PathBuf>,
    pub report: Report,
}

/// Build the rules document written next to the tables
pub fn rules_document(rules: &RuleSet, priorities: &PriorityWeights) -> RulesDocument {
    RulesDocument {
        generated_at: Some(crate::utc_now_iso()),
        rules: rules.rules.clone(),
        priorities: priorities.clone(),
    }
}

/// Validate, then write `clients.csv`, `workers.csv`, `tasks.csv` and `rules.json`.
///
/// Errors (not warnings) block the export unless `options.force` is set.
pub fn export(
    dataset: &Dataset,
    rules: &RuleSet,
    priorities: &PriorityWeights,
    options: &ExportOptions,
) -> Result<ExportSummary> {
    let report = validate(dataset, rules);
    if report.has_errors() && !options.force {
        bail!(
            "Validation found {} error(s); fix them or export with --force",
            report.error_count()
        );
    }
    if report.has_errors() {
        tracing::warn!(errors = report.error_count(), "exporting data with validation errors");
    }

    fs::create_dir_all(&options.out_dir).with_context(|| {
        format!(
            "Failed to create export directory {}",
            options.out_dir.display()
        )
    })?;

    let mut files = Vec::new();
    for kind in EntityKind::ALL {
        let path = options.out_dir.join(kind.file_name());
        write_file(&path, &dataset.table(kind).to_csv())?;
        files.push(path);
    }

    let document = rules_document(rules, priorities);
    let json = serde_json::to_string_pretty(&document).context("Failed to serialize rules")?;
    let path = options.out_dir.join(RULES_FILE_NAME);
    write_file(&path, &format!("{}\n", json))?;
    files.push(path);

    tracing::info!(dir = %options.out_dir.display(), files = files.len(), "export finished");
    Ok(ExportSummary { files, report })
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
