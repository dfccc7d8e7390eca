//! Turn a plain-English description into a rule with the model's help.

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;

use super::schema::{parse_rule, RULE_SCHEMA};
use super::Rule;
use crate::ai::prompts::{dataset_summary, render, RULE_TEMPLATE};
use crate::ai::{extract_json, ModelProvider};
use crate::table::Dataset;

/// Ask the model for a rule matching `description` and check it against the rule schema.
///
/// The returned rule is shape-checked but not yet validated against the
/// dataset; adding it to a rule set and running validation reports
/// unknown tasks or groups.
pub fn rule_from_text(
    description: &str,
    dataset: &Dataset,
    provider: &dyn ModelProvider,
) -> Result<Rule> {
    let description = description.trim();
    if description.is_empty() {
        bail!("Rule description is empty");
    }

    let summary = dataset_summary(dataset);
    let prompt = render(
        RULE_TEMPLATE,
        &[
            ("dataset", summary.as_str()),
            ("schema", RULE_SCHEMA),
            ("description", description),
        ],
    );

    tracing::debug!(provider = provider.name(), "requesting rule from model");
    let answer = provider
        .complete(&prompt)
        .with_context(|| format!("{} could not convert the rule", provider.name()))?;

    let json = extract_json(&answer).ok_or_else(|| anyhow!("No JSON rule found in the AI answer"))?;
    let json = match json {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        Value::Array(items) => bail!("AI answered with {} rules; expected exactly one", items.len()),
        other => other,
    };

    parse_rule(&json)
}
