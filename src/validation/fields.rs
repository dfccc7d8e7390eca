//! Per-table field checks.

use std::collections::HashSet;

use super::{Issue, IssueKind};
use crate::schema::{ColumnDef, ColumnType};
use crate::table::Table;
use crate::values::{parse_integer, parse_json_object, parse_phase_list};

pub(super) fn check_table(table: &Table, issues: &mut Vec<Issue>) {
    let kind = table.kind;

    for def in kind.columns().iter().filter(|d| d.required) {
        if table.column_index(def.name).is_none() {
            issues.push(
                Issue::new(
                    IssueKind::MissingColumn,
                    format!("Required column {} is missing from {}", def.name, kind),
                )
                .entity(kind)
                .column(def.name),
            );
        }
    }

    for (row, def, value) in cells(table) {
        if value.is_empty() && def.required {
            issues.push(
                Issue::new(IssueKind::MissingValue, format!("{} is required", def.name))
                    .at_row(table, row)
                    .column(def.name),
            );
        }
    }

    check_duplicate_ids(table, issues);

    for (row, def, value) in cells(table) {
        if !value.is_empty() {
            check_cell(table, row, def, value, issues);
        }
    }
}

/// Trimmed cells of the canonical columns present in `table`, column by column
fn cells(table: &Table) -> impl Iterator<Item = (usize, &'static ColumnDef, &str)> {
    table.kind.columns().iter().flat_map(move |def| {
        let index = table.column_index(def.name);
        table.rows.iter().enumerate().filter_map(move |(row, record)| {
            let index = index?;
            Some((row, def, record.get(index).map(|c| c.trim()).unwrap_or_default()))
        })
    })
}

fn check_duplicate_ids(table: &Table, issues: &mut Vec<Issue>) {
    let id_column = table.kind.id_column();
    if table.column_index(id_column).is_none() {
        return;
    }

    let mut seen = HashSet::new();
    for row in 0..table.len() {
        let Some(id) = table.id_of(row) else {
            continue;
        };
        if !seen.insert(id) {
            issues.push(
                Issue::new(
                    IssueKind::DuplicateId,
                    format!("Duplicate {} '{}'", id_column, id),
                )
                .at_row(table, row)
                .column(id_column),
            );
        }
    }
}

fn check_cell(table: &Table, row: usize, def: &ColumnDef, value: &str, issues: &mut Vec<Issue>) {
    let issue = |kind: IssueKind, message: String| {
        Issue::new(kind, message).at_row(table, row).column(def.name)
    };

    match def.ty {
        ColumnType::Integer { min, max } => match parse_integer(value) {
            None => issues.push(issue(
                IssueKind::Malformed,
                format!("{} must be a whole number, got '{}'", def.name, value),
            )),
            Some(n) if n < min || max.is_some_and(|max| n > max) => {
                let range = match max {
                    Some(max) => format!("between {} and {}", min, max),
                    None => format!("at least {}", min),
                };
                issues.push(issue(
                    IssueKind::OutOfRange,
                    format!("{} must be {}, got {}", def.name, range, n),
                ));
            }
            Some(_) => {}
        },
        ColumnType::PhaseList => match parse_phase_list(value) {
            Err(reason) => issues.push(issue(
                IssueKind::Malformed,
                format!("{} is not a phase list: {}", def.name, reason),
            )),
            Ok(phases) => {
                if let Some(bad) = phases.iter().find(|p| **p < 1) {
                    issues.push(issue(
                        IssueKind::OutOfRange,
                        format!("{} phases start at 1, got {}", def.name, bad),
                    ));
                }
            }
        },
        ColumnType::Json => {
            if let Err(reason) = parse_json_object(value) {
                issues.push(issue(
                    IssueKind::InvalidJson,
                    format!("{}: {}", def.name, reason),
                ));
            }
        }
        ColumnType::Id | ColumnType::Text | ColumnType::List => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EntityKind;
    use crate::validation::tests::table;

    fn issues_for(table: &Table) -> Vec<Issue> {
        let mut issues = Vec::new();
        check_table(table, &mut issues);
        issues
    }

    #[test]
    fn test_missing_required_column() {
        let t = table(EntityKind::Tasks, "TaskID,TaskName,Duration\nT1,Build,1\n");
        let issues = issues_for(&t);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::MissingColumn);
        assert_eq!(issues[0].column.as_deref(), Some("MaxConcurrent"));
    }

    #[test]
    fn test_duplicate_ids_flag_later_rows() {
        let t = table(
            EntityKind::Tasks,
            "TaskID,TaskName,Duration,MaxConcurrent\nT1,A,1,1\nT2,B,1,1\nT1,C,1,1\n",
        );
        let issues = issues_for(&t);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::DuplicateId);
        assert_eq!(issues[0].row, Some(2));
        assert_eq!(issues[0].id.as_deref(), Some("T1"));
    }

    #[test]
    fn test_missing_values() {
        let t = table(
            EntityKind::Tasks,
            "TaskID,TaskName,Duration,MaxConcurrent\n,A,1,1\nT2,,1,1\n",
        );
        let issues = issues_for(&t);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.kind == IssueKind::MissingValue));
    }

    #[test]
    fn test_checks_run_in_order() {
        let t = table(
            EntityKind::Tasks,
            "TaskID,TaskName,Duration,MaxConcurrent
T1,A,x,1
T1,,1,1
",
        );
        let kinds: Vec<_> = issues_for(&t).iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![IssueKind::MissingValue, IssueKind::DuplicateId, IssueKind::Malformed]
        );
    }

    #[test]
    fn test_range_checks() {
        let t = table(
            EntityKind::Clients,
            "ClientID,ClientName,PriorityLevel\nC1,A,0\nC2,B,6\nC3,C,5\nC4,D,high\n",
        );
        let issues = issues_for(&t);
        let out_of_range: Vec<_> = issues
            .iter()
            .filter(|i| i.kind == IssueKind::OutOfRange)
            .collect();
        assert_eq!(out_of_range.len(), 2);
        assert!(out_of_range[0].message.contains("between 1 and 5"));
        assert_eq!(
            issues.iter().filter(|i| i.kind == IssueKind::Malformed).count(),
            1
        );
    }

    #[test]
    fn test_duration_must_be_positive() {
        let t = table(
            EntityKind::Tasks,
            "TaskID,TaskName,Duration,MaxConcurrent\nT1,A,0,1\n",
        );
        let issues = issues_for(&t);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("at least 1"));
    }

    #[test]
    fn test_phase_lists() {
        let t = table(
            EntityKind::Workers,
            "WorkerID,WorkerName,AvailableSlots,MaxLoadPerPhase\nW1,A,\"0,1\",1\nW2,B,\"x,y\",1\nW3,C,1-2,1\n",
        );
        let issues = issues_for(&t);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].kind, IssueKind::OutOfRange);
        assert_eq!(issues[1].kind, IssueKind::Malformed);
    }

    #[test]
    fn test_invalid_json() {
        let t = table(
            EntityKind::Clients,
            "ClientID,ClientName,PriorityLevel,AttributesJSON\nC1,A,1,{bad\nC2,B,1,\"[1,2]\"\nC3,C,1,\n",
        );
        let issues = issues_for(&t);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.kind == IssueKind::InvalidJson));
    }
}
