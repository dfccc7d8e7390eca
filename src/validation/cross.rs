//! Cross-entity checks between clients, workers and tasks.
//!
//! These checks only look at cells that parse; malformed cells were already
//! reported by the field checks and are skipped here.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::{Issue, IssueKind};
use crate::table::{Dataset, Table};
use crate::values::{parse_integer, parse_phase_list, split_list};

pub(crate) struct WorkerView<'a> {
    pub row: usize,
    pub id: Option<&'a str>,
    pub group: Option<&'a str>,
    pub skills: BTreeSet<String>,
    pub slots: Option<Vec<i64>>,
    pub max_load: Option<i64>,
}

pub(crate) struct TaskView<'a> {
    pub row: usize,
    pub id: Option<&'a str>,
    pub duration: Option<i64>,
    pub required_skills: BTreeSet<String>,
    pub phases: Option<Vec<i64>>,
    pub max_concurrent: Option<i64>,
}

fn non_empty<'a>(table: &'a Table, row: usize, column: &str) -> Option<&'a str> {
    table
        .cell(row, column)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn skill_set(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(split_list)
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.to_lowercase())
        .collect()
}

pub(crate) fn worker_views(table: &Table) -> Vec<WorkerView<'_>> {
    (0..table.len())
        .map(|row| WorkerView {
            row,
            id: table.id_of(row),
            group: non_empty(table, row, "WorkerGroup"),
            skills: skill_set(non_empty(table, row, "Skills")),
            slots: non_empty(table, row, "AvailableSlots").and_then(|v| parse_phase_list(v).ok()),
            max_load: non_empty(table, row, "MaxLoadPerPhase").and_then(parse_integer),
        })
        .collect()
}

pub(crate) fn task_views(table: &Table) -> Vec<TaskView<'_>> {
    (0..table.len())
        .map(|row| TaskView {
            row,
            id: table.id_of(row),
            duration: non_empty(table, row, "Duration").and_then(parse_integer),
            required_skills: skill_set(non_empty(table, row, "RequiredSkills")),
            phases: non_empty(table, row, "PreferredPhases").and_then(|v| parse_phase_list(v).ok()),
            max_concurrent: non_empty(table, row, "MaxConcurrent").and_then(parse_integer),
        })
        .collect()
}

pub(super) fn check_dataset(dataset: &Dataset, issues: &mut Vec<Issue>) {
    let workers = worker_views(&dataset.workers);
    let tasks = task_views(&dataset.tasks);

    check_requested_tasks(dataset, issues);
    check_overloaded_workers(&dataset.workers, &workers, issues);
    check_skills(&dataset.tasks, &workers, &tasks, issues);
    check_phase_saturation(&workers, &tasks, issues);
}

fn check_requested_tasks(dataset: &Dataset, issues: &mut Vec<Issue>) {
    let clients = &dataset.clients;
    if clients.column_index("RequestedTaskIDs").is_none()
        || dataset.tasks.column_index("TaskID").is_none()
    {
        return;
    }

    let task_ids: HashSet<&str> = (0..dataset.tasks.len())
        .filter_map(|row| dataset.tasks.id_of(row))
        .collect();

    for row in 0..clients.len() {
        let Some(requested) = non_empty(clients, row, "RequestedTaskIDs") else {
            continue;
        };
        for task_id in split_list(requested) {
            if !task_ids.contains(task_id.as_str()) {
                issues.push(
                    Issue::new(
                        IssueKind::UnknownReference,
                        format!("Requested task '{}' does not exist", task_id),
                    )
                    .at_row(clients, row)
                    .column("RequestedTaskIDs"),
                );
            }
        }
    }
}

fn check_overloaded_workers(table: &Table, workers: &[WorkerView<'_>], issues: &mut Vec<Issue>) {
    for worker in workers {
        let (Some(slots), Some(max_load)) = (&worker.slots, worker.max_load) else {
            continue;
        };
        if (slots.len() as i64) < max_load {
            issues.push(
                Issue::new(
                    IssueKind::OverloadedWorker,
                    format!(
                        "MaxLoadPerPhase is {} but only {} slot(s) are available",
                        max_load,
                        slots.len()
                    ),
                )
                .at_row(table, worker.row)
                .column("MaxLoadPerPhase"),
            );
        }
    }
}

fn check_skills(
    table: &Table,
    workers: &[WorkerView<'_>],
    tasks: &[TaskView<'_>],
    issues: &mut Vec<Issue>,
) {
    let available: BTreeSet<&str> = workers
        .iter()
        .flat_map(|w| w.skills.iter().map(|s| s.as_str()))
        .collect();

    for task in tasks {
        let missing: Vec<&str> = task
            .required_skills
            .iter()
            .map(|s| s.as_str())
            .filter(|s| !available.contains(s))
            .collect();

        if !missing.is_empty() {
            issues.push(
                Issue::new(
                    IssueKind::SkillCoverage,
                    format!("No worker has skill(s): {}", missing.join(", ")),
                )
                .at_row(table, task.row)
                .column("RequiredSkills"),
            );
            continue;
        }

        let Some(max_concurrent) = task.max_concurrent else {
            continue;
        };
        let qualified = workers
            .iter()
            .filter(|w| task.required_skills.is_subset(&w.skills))
            .count() as i64;
        if max_concurrent > qualified {
            issues.push(
                Issue::new(
                    IssueKind::ConcurrencyInfeasible,
                    format!(
                        "MaxConcurrent is {} but only {} worker(s) are qualified",
                        max_concurrent, qualified
                    ),
                )
                .at_row(table, task.row)
                .column("MaxConcurrent"),
            );
        }
    }
}

fn check_phase_saturation(
    workers: &[WorkerView<'_>],
    tasks: &[TaskView<'_>],
    issues: &mut Vec<Issue>,
) {
    let mut demand: BTreeMap<i64, i64> = BTreeMap::new();
    for task in tasks {
        let (Some(phases), Some(duration)) = (&task.phases, task.duration) else {
            continue;
        };
        for phase in phases {
            let total = demand.entry(*phase).or_default();
            *total = total.saturating_add(duration);
        }
    }

    let mut supply: BTreeMap<i64, i64> = BTreeMap::new();
    for worker in workers {
        let (Some(slots), Some(max_load)) = (&worker.slots, worker.max_load) else {
            continue;
        };
        for phase in slots {
            let total = supply.entry(*phase).or_default();
            *total = total.saturating_add(max_load);
        }
    }

    for (phase, needed) in demand {
        let offered = supply.get(&phase).copied().unwrap_or(0);
        if needed > offered {
            issues.push(
                Issue::new(
                    IssueKind::PhaseSaturation,
                    format!(
                        "Phase {} is saturated: tasks need {} slot(s) but workers offer {}",
                        phase, needed, offered
                    ),
                )
                .entity(crate::schema::EntityKind::Tasks)
                .column("PreferredPhases"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::tests::sample_dataset;

    fn issues_for(dataset: &Dataset) -> Vec<Issue> {
        let mut issues = Vec::new();
        check_dataset(dataset, &mut issues);
        issues
    }

    #[test]
    fn test_unknown_requested_task() {
        let mut dataset = sample_dataset();
        dataset.clients.rows[1][3] = "T2,T9".to_string();

        let issues = issues_for(&dataset);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::UnknownReference);
        assert_eq!(issues[0].id.as_deref(), Some("C2"));
        assert!(issues[0].message.contains("T9"));
    }

    #[test]
    fn test_overloaded_worker() {
        let mut dataset = sample_dataset();
        dataset.workers.rows[1][4] = "3".to_string();

        let issues = issues_for(&dataset);
        assert!(issues
            .iter()
            .any(|i| i.kind == IssueKind::OverloadedWorker && i.id.as_deref() == Some("W2")));
    }

    #[test]
    fn test_skill_coverage_is_case_insensitive() {
        let mut dataset = sample_dataset();
        dataset.tasks.rows[0][4] = "Coding".to_string();
        assert!(issues_for(&dataset).is_empty());

        dataset.tasks.rows[0][4] = "coding,welding".to_string();
        let issues = issues_for(&dataset);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::SkillCoverage);
        assert!(issues[0].message.contains("welding"));
    }

    #[test]
    fn test_concurrency_infeasible() {
        let mut dataset = sample_dataset();
        dataset.tasks.rows[1][6] = "2".to_string();

        let issues = issues_for(&dataset);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::ConcurrencyInfeasible);
        assert_eq!(issues[0].id.as_deref(), Some("T2"));
    }

    #[test]
    fn test_phase_saturation() {
        let mut dataset = sample_dataset();
        dataset.tasks.rows[1][3] = "4".to_string();

        let issues = issues_for(&dataset);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.kind == IssueKind::PhaseSaturation));
        assert!(issues[0].message.contains("Phase 2"));
        assert!(issues[1].message.contains("Phase 3"));
    }

    #[test]
    fn test_phase_saturation_with_extreme_durations() {
        let mut dataset = sample_dataset();
        for row in &mut dataset.tasks.rows {
            row[3] = i64::MAX.to_string();
            row[5] = "2".to_string();
        }

        let issues = issues_for(&dataset);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::PhaseSaturation);
        assert!(issues[0].message.contains(&i64::MAX.to_string()));
    }

    #[test]
    fn test_phase_supply_with_extreme_max_load() {
        let mut dataset = sample_dataset();
        for row in &mut dataset.workers.rows {
            row[4] = i64::MAX.to_string();
        }
        dataset.tasks.rows[1][3] = "4".to_string();

        let issues = issues_for(&dataset);
        assert!(issues.iter().all(|i| i.kind != IssueKind::PhaseSaturation));
    }

    #[test]
    fn test_missing_tables_are_skipped() {
        let dataset = Dataset::default();
        assert!(issues_for(&dataset).is_empty());
    }
}
