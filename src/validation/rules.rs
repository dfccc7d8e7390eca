//! Rule checks against the dataset.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::cross::task_views;
use super::{Issue, IssueKind};
use crate::rules::{GroupKind, OverrideScope, Rule, RuleSet};
use crate::table::Dataset;

pub(super) fn check_rules(dataset: &Dataset, rules: &RuleSet, issues: &mut Vec<Issue>) {
    if rules.is_empty() {
        return;
    }

    let tasks = task_views(&dataset.tasks);
    let task_phases: HashMap<&str, Option<&Vec<i64>>> = tasks
        .iter()
        .filter_map(|t| t.id.map(|id| (id, t.phases.as_ref())))
        .collect();

    let client_groups = column_values(dataset, GroupKind::Client);
    let worker_groups = column_values(dataset, GroupKind::Worker);
    let all_ids: HashSet<&str> = dataset
        .tables()
        .flat_map(|t| (0..t.len()).filter_map(move |row| t.id_of(row)))
        .collect();

    let mut co_run_groups = UnionFind::default();

    for (index, rule) in rules.iter().enumerate() {
        let invalid = |message: String| Issue::new(IssueKind::InvalidRule, message).rule(index);

        if let Err(e) = rule.check_shape() {
            issues.push(invalid(e.to_string()));
            continue;
        }

        match rule {
            Rule::CoRun { tasks } => {
                let tasks: Vec<String> = tasks.iter().map(|t| t.trim().to_string()).collect();
                let unknown: Vec<&str> = tasks
                    .iter()
                    .map(|t| t.as_str())
                    .filter(|t| !task_phases.contains_key(t))
                    .collect();
                if !unknown.is_empty() {
                    issues.push(invalid(format!(
                        "coRun references unknown task(s): {}",
                        unknown.join(", ")
                    )));
                    continue;
                }

                if !co_run_groups.link_all(&tasks) {
                    issues.push(
                        Issue::new(
                            IssueKind::CircularCoRun,
                            format!(
                                "coRun group {} closes a cycle with other coRun rules",
                                tasks.join(", ")
                            ),
                        )
                        .rule(index),
                    );
                }

                let common = common_phases(tasks.iter().filter_map(|t| {
                    task_phases.get(t.as_str()).copied().flatten()
                }));
                if common.is_some_and(|c| c.is_empty()) {
                    issues.push(
                        Issue::new(
                            IssueKind::PhaseWindowConflict,
                            format!(
                                "Tasks {} share no preferred phase, so they cannot run together",
                                tasks.join(", ")
                            ),
                        )
                        .rule(index),
                    );
                }
            }
            Rule::SlotRestriction {
                group_kind, group, ..
            } => {
                let known = match group_kind {
                    GroupKind::Client => &client_groups,
                    GroupKind::Worker => &worker_groups,
                };
                if !known.contains(group.trim()) {
                    issues.push(invalid(format!(
                        "slotRestriction references unknown group '{}'",
                        group
                    )));
                }
            }
            Rule::LoadLimit { worker_group, .. } => {
                if !worker_groups.contains(worker_group.trim()) {
                    issues.push(invalid(format!(
                        "loadLimit references unknown worker group '{}'",
                        worker_group
                    )));
                }
            }
            Rule::PhaseWindow {
                task,
                allowed_phases,
            } => match task_phases.get(task.trim()) {
                None => issues.push(invalid(format!(
                    "phaseWindow references unknown task '{}'",
                    task
                ))),
                Some(Some(preferred)) if !preferred.is_empty() => {
                    let overlaps = allowed_phases
                        .iter()
                        .any(|p| preferred.contains(&i64::from(*p)));
                    if !overlaps {
                        issues.push(
                            Issue::new(
                                IssueKind::PhaseWindowConflict,
                                format!(
                                    "phaseWindow for {} excludes all of its preferred phases",
                                    task
                                ),
                            )
                            .rule(index),
                        );
                    }
                }
                Some(_) => {}
            },
            Rule::PatternMatch { .. } => {}
            Rule::PrecedenceOverride { scope, target, .. } => {
                if let (OverrideScope::Specific, Some(target)) = (scope, target) {
                    if !all_ids.contains(target.trim()) {
                        issues.push(invalid(format!(
                            "precedenceOverride targets unknown ID '{}'",
                            target
                        )));
                    }
                }
            }
        }
    }
}

fn column_values(dataset: &Dataset, kind: GroupKind) -> HashSet<&str> {
    let (table, column) = match kind {
        GroupKind::Client => (&dataset.clients, "GroupTag"),
        GroupKind::Worker => (&dataset.workers, "WorkerGroup"),
    };
    (0..table.len())
        .filter_map(|row| table.cell(row, column))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect()
}

/// Intersection of phase lists; `None` when no task has preferred phases.
fn common_phases<'a>(lists: impl Iterator<Item = &'a Vec<i64>>) -> Option<BTreeSet<i64>> {
    lists
        .filter(|l| !l.is_empty())
        .map(|l| l.iter().copied().collect::<BTreeSet<i64>>())
        .reduce(|acc, next| acc.intersection(&next).copied().collect())
}

/// Disjoint sets over task IDs, used to spot co-run cycles
#[derive(Default)]
struct UnionFind {
    parent: HashMap<String, String>,
}

impl UnionFind {
    fn find(&mut self, id: &str) -> String {
        let parent = self
            .parent
            .entry(id.to_string())
            .or_insert_with(|| id.to_string())
            .clone();
        if parent == id {
            return parent;
        }
        let root = self.find(&parent);
        self.parent.insert(id.to_string(), root.clone());
        root
    }

    /// Link every task to the first one. Returns false when two of them were
    /// already connected through earlier rules.
    fn link_all(&mut self, tasks: &[String]) -> bool {
        let mut distinct: Vec<&str> = Vec::new();
        for task in tasks {
            if !distinct.contains(&task.as_str()) {
                distinct.push(task);
            }
        }

        let roots: Vec<String> = distinct.iter().map(|t| self.find(t)).collect();
        let unique_roots: HashSet<&String> = roots.iter().collect();
        let acyclic = unique_roots.len() == roots.len();

        let first = roots[0].clone();
        for root in &roots[1..] {
            if *root != first {
                self.parent.insert(root.clone(), first.clone());
            }
        }
        acyclic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::tests::sample_dataset;

    fn issues_for(rules: Vec<Rule>) -> Vec<Issue> {
        let mut issues = Vec::new();
        check_rules(&sample_dataset(), &RuleSet::new(rules), &mut issues);
        issues
    }

    fn co_run(tasks: &[&str]) -> Rule {
        Rule::CoRun {
            tasks: tasks.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_valid_rules_pass() {
        let issues = issues_for(vec![
            co_run(&["T1", "T2"]),
            Rule::LoadLimit {
                worker_group: "GroupA".to_string(),
                max_slots_per_phase: 1,
            },
            Rule::SlotRestriction {
                group_kind: GroupKind::Client,
                group: "GroupB".to_string(),
                min_common_slots: 1,
            },
            Rule::PhaseWindow {
                task: "T1".to_string(),
                allowed_phases: vec![2],
            },
            Rule::PrecedenceOverride {
                scope: OverrideScope::Specific,
                target: Some("C1".to_string()),
                priority: 1,
            },
        ]);
        assert!(issues.is_empty(), "{:?}", issues);
    }

    #[test]
    fn test_co_run_task_ids_are_trimmed() {
        let issues = issues_for(vec![co_run(&[" T1", "T2 "]), co_run(&["T2", "T1"])]);
        assert_eq!(issues.len(), 1, "{:?}", issues);
        assert_eq!(issues[0].kind, IssueKind::CircularCoRun);
        assert!(issues[0].message.contains("T2, T1"));
    }

    #[test]
    fn test_unknown_references() {
        let issues = issues_for(vec![
            co_run(&["T1", "T404"]),
            Rule::LoadLimit {
                worker_group: "Nobody".to_string(),
                max_slots_per_phase: 1,
            },
            Rule::PhaseWindow {
                task: "T404".to_string(),
                allowed_phases: vec![1],
            },
            Rule::PrecedenceOverride {
                scope: OverrideScope::Specific,
                target: Some("X1".to_string()),
                priority: 1,
            },
        ]);
        assert_eq!(issues.len(), 4);
        assert!(issues.iter().all(|i| i.kind == IssueKind::InvalidRule));
        assert_eq!(issues[1].rule, Some(1));
    }

    #[test]
    fn test_shape_errors_are_reported() {
        let issues = issues_for(vec![co_run(&["T1"])]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::InvalidRule);
    }

    #[test]
    fn test_circular_co_run() {
        let mut dataset = sample_dataset();
        dataset.tasks.rows.push(
            ["T3", "Ship", "Ops", "1", "", "2", "1"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        let rules = RuleSet::new(vec![
            co_run(&["T1", "T2"]),
            co_run(&["T2", "T3"]),
            co_run(&["T3", "T1"]),
        ]);

        let mut issues = Vec::new();
        check_rules(&dataset, &rules, &mut issues);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::CircularCoRun);
        assert_eq!(issues[0].rule, Some(2));
    }

    #[test]
    fn test_phase_window_conflict() {
        let issues = issues_for(vec![Rule::PhaseWindow {
            task: "T1".to_string(),
            allowed_phases: vec![5],
        }]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::PhaseWindowConflict);
    }

    #[test]
    fn test_co_run_without_common_phase() {
        let mut dataset = sample_dataset();
        dataset.tasks.rows[1][5] = "3".to_string();
        let mut issues = Vec::new();
        check_rules(&dataset, &RuleSet::new(vec![co_run(&["T1", "T2"])]), &mut issues);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::PhaseWindowConflict);
    }
}
