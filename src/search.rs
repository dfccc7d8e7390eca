//! Natural-language search over the dataset.
//!
//! The model translates the question into a structured [`Filter`] that is
//! evaluated locally. Any failure on that path (HTTP error, no JSON in the
//! answer, unknown entity or column) falls back to a case-insensitive
//! substring search.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ai::prompts::{dataset_summary, render, SEARCH_TEMPLATE};
use crate::ai::{extract_json, ModelProvider};
use crate::schema::{ColumnType, EntityKind};
use crate::table::{Dataset, Table};
use crate::values::{parse_phase_list, split_list};

/// Comparison operator of a filter condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    #[serde(rename = "=", alias = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "includes")]
    Includes,
}

/// How conditions combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    #[default]
    All,
    Any,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub op: Op,
    pub value: Value,
}

/// Structured query produced by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub entity: EntityKind,
    #[serde(default)]
    pub combinator: Combinator,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Filter {
    /// Row indices of `table` matching the filter. Errors on unknown columns.
    pub fn apply(&self, table: &Table) -> Result<Vec<usize>> {
        if table.kind != self.entity {
            bail!("Filter is for {}, not {}", self.entity, table.kind);
        }

        let mut resolved = Vec::with_capacity(self.conditions.len());
        for condition in &self.conditions {
            let index = table
                .column_index(&condition.column)
                .ok_or_else(|| anyhow!("Unknown column '{}' in {}", condition.column, table.kind))?;
            let ty = table.kind.column(&table.headers[index]).map(|d| d.ty);
            resolved.push((index, ty, condition));
        }

        let rows = (0..table.len())
            .filter(|&row| {
                let mut results = resolved.iter().map(|(index, ty, condition)| {
                    let cell = table.rows[row].get(*index).map(|c| c.as_str()).unwrap_or("");
                    condition.matches(cell, *ty)
                });
                match self.combinator {
                    Combinator::All => results.all(|m| m),
                    Combinator::Any => results.any(|m| m),
                }
            })
            .collect();

        Ok(rows)
    }
}

impl Condition {
    fn matches(&self, cell: &str, ty: Option<ColumnType>) -> bool {
        let cell = cell.trim();
        let wanted = value_text(&self.value);

        match self.op {
            Op::Eq => text_eq(cell, &wanted),
            Op::Ne => !text_eq(cell, &wanted),
            Op::Gt | Op::Ge | Op::Lt | Op::Le => {
                let (Ok(a), Ok(b)) = (cell.parse::<f64>(), wanted.trim().parse::<f64>()) else {
                    return false;
                };
                match self.op {
                    Op::Gt => a > b,
                    Op::Ge => a >= b,
                    Op::Lt => a < b,
                    _ => a <= b,
                }
            }
            Op::Contains => cell.to_lowercase().contains(&wanted.to_lowercase()),
            Op::Includes => match ty {
                Some(ColumnType::PhaseList) => {
                    match (parse_phase_list(cell), wanted.trim().parse::<i64>()) {
                        (Ok(phases), Ok(phase)) => phases.contains(&phase),
                        _ => false,
                    }
                }
                _ => split_list(cell)
                    .iter()
                    .any(|item| item.eq_ignore_ascii_case(wanted.trim())),
            },
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn text_eq(cell: &str, wanted: &str) -> bool {
    let wanted = wanted.trim();
    match (cell.parse::<f64>(), wanted.parse::<f64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => cell.eq_ignore_ascii_case(wanted),
    }
}

/// Which path produced a search result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
    Ai,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub entity: EntityKind,
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub source: SearchSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub hits: Vec<SearchHit>,
}

/// Search the dataset, preferring the model and falling back to substring matching.
pub fn search(
    dataset: &Dataset,
    query: &str,
    entity: Option<EntityKind>,
    provider: &dyn ModelProvider,
) -> SearchOutcome {
    let query = query.trim();
    if query.is_empty() {
        return SearchOutcome {
            source: SearchSource::Substring,
            filter: None,
            fallback_reason: None,
            hits: Vec::new(),
        };
    }

    match ai_search(dataset, query, entity, provider) {
        Ok((filter, hits)) => SearchOutcome {
            source: SearchSource::Ai,
            filter: Some(filter),
            fallback_reason: None,
            hits,
        },
        Err(e) => {
            tracing::warn!(provider = provider.name(), error = %format!("{:#}", e), "AI search failed; using substring search");
            SearchOutcome {
                source: SearchSource::Substring,
                filter: None,
                fallback_reason: Some(format!("{:#}", e)),
                hits: substring_search(dataset, query, entity),
            }
        }
    }
}

fn ai_search(
    dataset: &Dataset,
    query: &str,
    entity: Option<EntityKind>,
    provider: &dyn ModelProvider,
) -> Result<(Filter, Vec<SearchHit>)> {
    let entity_hint = entity
        .map(|e| format!("The answer must use entity \"{}\".", e))
        .unwrap_or_default();
    let summary = dataset_summary(dataset);
    let prompt = render(
        SEARCH_TEMPLATE,
        &[
            ("dataset", summary.as_str()),
            ("entity_hint", entity_hint.as_str()),
            ("query", query),
        ],
    );

    let answer = provider.complete(&prompt).context("AI request failed")?;
    let json = extract_json(&answer).ok_or_else(|| anyhow!("No JSON found in AI answer"))?;
    let filter: Filter =
        serde_json::from_value(json).context("AI answer is not a valid filter")?;

    if let Some(entity) = entity {
        if filter.entity != entity {
            bail!("AI filtered {} but {} was requested", filter.entity, entity);
        }
    }

    let table = dataset.table(filter.entity);
    let hits = filter
        .apply(table)?
        .into_iter()
        .map(|row| hit(table, row))
        .collect();

    Ok((filter, hits))
}

fn hit(table: &Table, row: usize) -> SearchHit {
    SearchHit {
        entity: table.kind,
        row,
        id: table.id_of(row).map(|id| id.to_string()),
    }
}

/// Rows with any cell containing `query`, case-insensitively.
pub fn substring_search(dataset: &Dataset, query: &str, entity: Option<EntityKind>) -> Vec<SearchHit> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let kinds: Vec<EntityKind> = match entity {
        Some(kind) => vec![kind],
        None => EntityKind::ALL.to_vec(),
    };

    let mut hits = Vec::new();
    for kind in kinds {
        let table = dataset.table(kind);
        for (row, cells) in table.rows.iter().enumerate() {
            if cells.iter().any(|c| c.to_lowercase().contains(&needle)) {
                hits.push(hit(table, row));
            }
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::OfflineProvider;
    use crate::normalize::normalize_table;
    use std::cell::RefCell;

    struct ScriptedProvider {
        answer: String,
        prompts: RefCell<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(answer: &str) -> Self {
            Self {
                answer: answer.to_string(),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl ModelProvider for ScriptedProvider {
        fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            Ok(self.answer.clone())
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn dataset() -> Dataset {
        let mut tasks = Table::from_csv(
            EntityKind::Tasks,
            "TaskID,TaskName,Category,Duration,RequiredSkills,PreferredPhases,MaxConcurrent\n\
             T1,Build API,Dev,1,coding,1-2,1\n\
             T2,Mockups,Design,3,design,2-3,2\n\
             T3,Deploy,Ops,2,\"coding,ops\",4,1\n",
        )
        .unwrap();
        normalize_table(&mut tasks);
        let mut dataset = Dataset::default();
        dataset.replace(tasks);
        dataset
    }

    fn ids(hits: &[SearchHit]) -> Vec<&str> {
        hits.iter().filter_map(|h| h.id.as_deref()).collect()
    }

    #[test]
    fn test_ai_filter_is_applied_locally() {
        let provider = ScriptedProvider::new(
            r#"```json
{"entity": "tasks", "conditions": [{"column": "Duration", "op": ">", "value": 1}]}
```"#,
        );
        let outcome = search(&dataset(), "tasks longer than one phase", None, &provider);

        assert_eq!(outcome.source, SearchSource::Ai);
        assert_eq!(ids(&outcome.hits), vec!["T2", "T3"]);
        assert!(provider.prompts.borrow()[0].contains("tasks longer than one phase"));
    }

    #[test]
    fn test_includes_on_lists_and_phases() {
        let table = &dataset().tasks;
        let filter: Filter = serde_json::from_value(serde_json::json!({
            "entity": "tasks",
            "combinator": "any",
            "conditions": [
                {"column": "RequiredSkills", "op": "includes", "value": "OPS"},
                {"column": "PreferredPhases", "op": "includes", "value": 1}
            ]
        }))
        .unwrap();
        assert_eq!(filter.apply(table).unwrap(), vec![0, 2]);
    }

    #[test]
    fn test_eq_contains_and_ne() {
        let table = &dataset().tasks;
        let filter: Filter = serde_json::from_value(serde_json::json!({
            "entity": "tasks",
            "conditions": [
                {"column": "category", "op": "!=", "value": "design"},
                {"column": "TaskName", "op": "contains", "value": "api"}
            ]
        }))
        .unwrap();
        assert_eq!(filter.apply(table).unwrap(), vec![0]);
    }

    #[test]
    fn test_unknown_column_falls_back() {
        let provider = ScriptedProvider::new(
            r#"{"entity": "tasks", "conditions": [{"column": "Budget", "op": ">", "value": 5}]}"#,
        );
        let outcome = search(&dataset(), "deploy", None, &provider);

        assert_eq!(outcome.source, SearchSource::Substring);
        assert!(outcome.fallback_reason.unwrap().contains("Budget"));
        assert_eq!(ids(&outcome.hits), vec!["T3"]);
    }

    #[test]
    fn test_offline_provider_falls_back_to_substring() {
        let outcome = search(&dataset(), "DESIGN", None, &OfflineProvider);
        assert_eq!(outcome.source, SearchSource::Substring);
        assert_eq!(ids(&outcome.hits), vec!["T2"]);
    }

    #[test]
    fn test_answer_without_json_falls_back() {
        let provider = ScriptedProvider::new("I cannot help with that.");
        let outcome = search(&dataset(), "coding", Some(EntityKind::Tasks), &provider);
        assert_eq!(outcome.source, SearchSource::Substring);
        assert_eq!(ids(&outcome.hits), vec!["T1", "T3"]);
    }

    #[test]
    fn test_entity_mismatch_falls_back() {
        let provider = ScriptedProvider::new(r#"{"entity": "workers", "conditions": []}"#);
        let outcome = search(&dataset(), "ops", Some(EntityKind::Tasks), &provider);
        assert_eq!(outcome.source, SearchSource::Substring);
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        let provider = ScriptedProvider::new("{}");
        let outcome = search(&dataset(), "   ", None, &provider);
        assert!(outcome.hits.is_empty());
        assert!(provider.prompts.borrow().is_empty());
    }

    #[test]
    fn test_substring_search_scoped_to_entity() {
        let dataset = dataset();
        assert!(substring_search(&dataset, "T1", Some(EntityKind::Clients)).is_empty());
        assert_eq!(substring_search(&dataset, "t1", None).len(), 1);
    }
}
