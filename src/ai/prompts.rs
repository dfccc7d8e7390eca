//! Prompt templates sent to the model.
//!
//! Templates use `{{name}}` placeholders filled by [`render`].

use std::collections::BTreeSet;

use crate::schema::EntityKind;
use crate::table::Dataset;

/// How many example IDs per entity go into a dataset summary
const SUMMARY_ID_LIMIT: usize = 25;

pub const SEARCH_TEMPLATE: &str = r#"You translate natural-language questions about a spreadsheet dataset into a JSON filter.

Dataset:
{{dataset}}

Answer with a single JSON object and nothing else:
{"entity": "clients" | "workers" | "tasks",
 "combinator": "all" | "any",
 "conditions": [{"column": "<column name>", "op": "=" | "!=" | ">" | ">=" | "<" | "<=" | "contains" | "includes", "value": <string or number>}]}

Use "includes" for list columns (skills, phases, requested task IDs) and "contains" for substring matches.
Only use column names listed above.
{{entity_hint}}
Question: {{query}}"#;

pub const RULE_TEMPLATE: &str = r#"You convert a plain-English allocation rule into a JSON rule object.

Dataset:
{{dataset}}

The rule must match this JSON schema:
```json
{{schema}}
```

Only reference task IDs, worker groups and client groups that appear in the dataset.
Answer with exactly one JSON object in a ```json fenced block.

Rule: {{description}}"#;

/// Substitute `{{key}}` placeholders. Unknown placeholders are left as-is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Compact description of the dataset: columns, sample IDs and groups.
pub fn dataset_summary(dataset: &Dataset) -> String {
    let mut lines = Vec::new();

    for kind in EntityKind::ALL {
        let table = dataset.table(kind);
        lines.push(format!(
            "- {} ({} rows) columns: {}",
            kind,
            table.len(),
            table.headers.join(", ")
        ));

        let ids: Vec<&str> = (0..table.len()).filter_map(|row| table.id_of(row)).collect();
        if !ids.is_empty() {
            let shown: Vec<&str> = ids.iter().take(SUMMARY_ID_LIMIT).copied().collect();
            let more = if ids.len() > SUMMARY_ID_LIMIT {
                format!(" (+{} more)", ids.len() - SUMMARY_ID_LIMIT)
            } else {
                String::new()
            };
            lines.push(format!("  IDs: {}{}", shown.join(", "), more));
        }
    }

    for (label, kind, column) in [
        ("Client groups", EntityKind::Clients, "GroupTag"),
        ("Worker groups", EntityKind::Workers, "WorkerGroup"),
    ] {
        let table = dataset.table(kind);
        let groups: BTreeSet<&str> = (0..table.len())
            .filter_map(|row| table.cell(row, column))
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .collect();
        if !groups.is_empty() {
            lines.push(format!(
                "- {}: {}",
                label,
                groups.into_iter().collect::<Vec<_>>().join(", ")
            ));
        }
    }

    lines.join("\n")
}
