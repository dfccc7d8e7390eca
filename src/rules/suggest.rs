//! Rule suggestions derived from patterns in the data.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::{Rule, RuleSet};
use crate::table::Dataset;
use crate::validation::cross::{task_views, worker_views};
use crate::values::split_list;

/// Clients that must request the same pair before a coRun is suggested
const MIN_SHARED_REQUESTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub rule: Rule,
    pub reason: String,
}

/// Suggest rules not already present in `existing`.
///
/// - Task pairs requested together by several clients become `coRun` rules.
/// - Worker groups containing an overloaded worker get a `loadLimit` at the
///   smallest slot count in the group.
pub fn suggest_rules(dataset: &Dataset, existing: &RuleSet) -> Vec<Suggestion> {
    let mut suggestions = suggest_co_runs(dataset, existing);
    suggestions.extend(suggest_load_limits(dataset, existing));
    suggestions
}

fn suggest_co_runs(dataset: &Dataset, existing: &RuleSet) -> Vec<Suggestion> {
    let known: BTreeSet<&str> = task_views(&dataset.tasks)
        .iter()
        .filter_map(|t| t.id)
        .collect();

    let mut pairs: BTreeMap<(String, String), usize> = BTreeMap::new();
    for row in 0..dataset.clients.len() {
        let requested: BTreeSet<String> = dataset
            .clients
            .cell(row, "RequestedTaskIDs")
            .map(split_list)
            .unwrap_or_default()
            .into_iter()
            .filter(|id| known.contains(id.as_str()))
            .collect();
        let requested: Vec<String> = requested.into_iter().collect();

        for (i, a) in requested.iter().enumerate() {
            for b in &requested[i + 1..] {
                *pairs.entry((a.clone(), b.clone())).or_default() += 1;
            }
        }
    }

    pairs
        .into_iter()
        .filter(|(_, count)| *count >= MIN_SHARED_REQUESTS)
        .filter(|((a, b), _)| !co_run_covers(existing, a, b))
        .map(|((a, b), count)| Suggestion {
            reason: format!("{} clients request both {} and {}", count, a, b),
            rule: Rule::CoRun { tasks: vec![a, b] },
        })
        .collect()
}

fn co_run_covers(existing: &RuleSet, a: &str, b: &str) -> bool {
    existing.iter().any(|rule| match rule {
        Rule::CoRun { tasks } => {
            tasks.iter().any(|t| t == a) && tasks.iter().any(|t| t == b)
        }
        _ => false,
    })
}

fn suggest_load_limits(dataset: &Dataset, existing: &RuleSet) -> Vec<Suggestion> {
    let limited: BTreeSet<&str> = existing
        .iter()
        .filter_map(|rule| match rule {
            Rule::LoadLimit { worker_group, .. } => Some(worker_group.as_str()),
            _ => None,
        })
        .collect();

    struct GroupStats {
        min_slots: usize,
        overloaded: Vec<String>,
    }

    let mut groups: BTreeMap<&str, GroupStats> = BTreeMap::new();
    for worker in worker_views(&dataset.workers) {
        let (Some(group), Some(slots)) = (worker.group, worker.slots.as_ref()) else {
            continue;
        };
        let stats = groups.entry(group).or_insert(GroupStats {
            min_slots: usize::MAX,
            overloaded: Vec::new(),
        });
        stats.min_slots = stats.min_slots.min(slots.len());
        if let Some(max_load) = worker.max_load {
            if (slots.len() as i64) < max_load {
                stats
                    .overloaded
                    .push(worker.id.unwrap_or("?").to_string());
            }
        }
    }

    groups
        .into_iter()
        .filter(|(group, stats)| !stats.overloaded.is_empty() && !limited.contains(group))
        .filter(|(_, stats)| stats.min_slots > 0)
        .map(|(group, stats)| Suggestion {
            reason: format!(
                "{} in {} exceed their available slots",
                stats.overloaded.join(", "),
                group
            ),
            rule: Rule::LoadLimit {
                worker_group: group.to_string(),
                max_slots_per_phase: stats.min_slots as u32,
            },
        })
        .collect()
}
