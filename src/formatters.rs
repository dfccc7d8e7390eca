//! Output formatters for reports, tables, rules and priorities
//!
//! Each formatter returns a string so commands decide where it goes.

use colored::Colorize;
use std::collections::HashSet;

use crate::priorities::PriorityWeights;
use crate::rules::RuleSet;
use crate::schema::EntityKind;
use crate::table::Table;
use crate::ui::format::{separator, truncate};
use crate::ui::{colors, severity_icon};
use crate::validation::{Issue, Report, Severity};

/// Widest a cell is drawn in a table grid
const MAX_CELL_WIDTH: usize = 24;

/// Width of the bar drawn for a weight of 1.0
const BAR_WIDTH: usize = 30;

/// Format a validation report grouped by entity, then rule issues
pub fn format_report(report: &Report) -> String {
    let mut output = vec![
        "Validation Report".bold().to_string(),
        "=================".to_string(),
        String::new(),
    ];

    if report.is_clean() {
        output.push(format!("{} No issues found", colors::success("✓")));
        return output.join("\n");
    }

    for kind in EntityKind::ALL {
        let issues: Vec<&Issue> = report.for_entity(kind).filter(|i| i.rule.is_none()).collect();
        if issues.is_empty() {
            continue;
        }
        let title = format!("{} ({})", kind, issues.len());
        output.push(title.bold().to_string());
        output.push(separator(title.chars().count()));
        for issue in issues {
            output.push(format_issue(issue));
        }
        output.push(String::new());
    }

    let rule_issues: Vec<&Issue> = report.rule_issues().collect();
    if !rule_issues.is_empty() {
        let title = format!("rules ({})", rule_issues.len());
        output.push(title.bold().to_string());
        output.push(separator(title.chars().count()));
        for issue in rule_issues {
            output.push(format_issue(issue));
        }
        output.push(String::new());
    }

    output.push(format_summary(report));
    output.join("\n")
}

/// One-line summary such as `2 error(s), 1 warning(s)`
pub fn format_summary(report: &Report) -> String {
    let errors = format!("{} error(s)", report.error_count());
    let warnings = format!("{} warning(s)", report.warning_count());
    format!(
        "{}, {}",
        if report.has_errors() { errors.red() } else { errors.green() },
        if report.warning_count() > 0 { warnings.yellow() } else { warnings.normal() }
    )
}

fn format_issue(issue: &Issue) -> String {
    format!(
        "  {} {}  {}",
        severity_icon(issue.severity),
        issue.location().cyan(),
        issue.message
    )
}

/// Render a table as an aligned grid. Cells with issues are colored by
/// severity and their rows marked in the left margin. With `issues_only`,
/// rows without issues are skipped.
pub fn format_table(table: &Table, report: &Report, issues_only: bool) -> String {
    let order = table.export_order();
    let headers: Vec<&str> = order.iter().map(|&i| table.headers[i].as_str()).collect();

    let rows: Vec<usize> = (0..table.len())
        .filter(|&row| !issues_only || report.for_row(table.kind, row).next().is_some())
        .collect();

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|&row| {
            order
                .iter()
                .map(|&i| truncate(table.rows[row].get(i).map(|s| s.as_str()).unwrap_or(""), MAX_CELL_WIDTH))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            cells
                .iter()
                .map(|r| r[col].chars().count())
                .chain(std::iter::once(truncate(header, MAX_CELL_WIDTH).chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut output = Vec::new();
    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| pad(&truncate(h, MAX_CELL_WIDTH), *w))
        .collect();
    output.push(format!("    {}", header_line.join("  ")).bold().to_string());
    output.push(format!(
        "    {}",
        widths.iter().map(|w| separator(*w)).collect::<Vec<_>>().join("  ")
    ));

    for (cells, &row) in cells.iter().zip(&rows) {
        let issues: Vec<&Issue> = report.for_row(table.kind, row).collect();
        let flagged_columns: HashSet<&str> =
            issues.iter().filter_map(|i| i.column.as_deref()).collect();
        let row_severity = issues.iter().map(|i| i.severity).min();

        let marker = match row_severity {
            Some(severity) => severity_icon(severity).to_string(),
            None => " ".to_string(),
        };

        let line: Vec<String> = cells
            .iter()
            .zip(&headers)
            .zip(&widths)
            .map(|((cell, header), w)| {
                let padded = pad(cell, *w);
                if !flagged_columns.contains(header) {
                    return padded;
                }
                let column_severity = issues
                    .iter()
                    .filter(|i| i.column.as_deref() == Some(*header))
                    .map(|i| i.severity)
                    .min();
                match column_severity {
                    Some(Severity::Error) => colors::error(&padded).to_string(),
                    _ => colors::warning(&padded).to_string(),
                }
            })
            .collect();
        output.push(format!("{:>3} {}", marker, line.join("  ")));
    }

    if rows.is_empty() {
        let empty = if issues_only { "(no rows with issues)" } else { "(no rows)" };
        output.push(format!("    {}", colors::secondary(empty)));
    }

    output.join("\n")
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

/// Numbered rule list
pub fn format_rules(rules: &RuleSet) -> String {
    if rules.is_empty() {
        return colors::secondary("(no rules)").to_string();
    }
    rules
        .iter()
        .enumerate()
        .map(|(index, rule)| format!("  {} {}", format!("#{}", index).cyan(), rule))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Weights with normalized share and a bar, highest first
pub fn format_priorities(weights: &PriorityWeights) -> String {
    let normalized = weights.normalized();
    weights
        .ranked()
        .into_iter()
        .map(|(criterion, weight)| {
            let share = normalized.get(criterion);
            let bar = "█".repeat((share * BAR_WIDTH as f64).round() as usize);
            format!(
                "  {:<26} {:>5.2}  {:>5.1}%  {}",
                criterion.as_str(),
                weight,
                share * 100.0,
                bar.blue()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priorities::Preset;
    use crate::rules::Rule;
    use crate::validation::tests::sample_dataset;
    use crate::validation::validate_dataset;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_format_report_clean() {
        plain();
        let result = format_report(&Report::default());
        assert!(result.contains("Validation Report"));
        assert!(result.contains("No issues found"));
    }

    #[test]
    fn test_format_report_groups_by_entity() {
        plain();
        let mut dataset = sample_dataset();
        dataset.clients.rows[1][2] = "9".to_string();
        let report = validate_dataset(&dataset);

        let result = format_report(&report);
        assert!(result.contains("clients (1)\n───────────\n"));
        assert!(result.contains("✗ clients C2 [PriorityLevel]"));
        assert!(result.contains("1 error(s), 0 warning(s)"));
        assert!(!result.contains("workers ("));
    }

    #[test]
    fn test_format_table_marks_flagged_rows() {
        plain();
        let mut dataset = sample_dataset();
        dataset.tasks.rows[1][3] = "0".to_string();
        let report = validate_dataset(&dataset);

        let all = format_table(&dataset.tasks, &report, false);
        assert!(all.contains("TaskID"));
        assert!(all.contains("T1"));
        let flagged_line = all.lines().find(|l| l.contains("T2")).unwrap();
        assert!(flagged_line.trim_start().starts_with('✗'));

        let only = format_table(&dataset.tasks, &report, true);
        assert!(!only.contains("Build"));
        assert!(only.contains("Mockups"));
    }

    #[test]
    fn test_format_table_empty() {
        plain();
        let table = Table::empty(EntityKind::Workers);
        let result = format_table(&table, &Report::default(), false);
        assert!(result.contains("WorkerID"));
        assert!(result.contains("(no rows)"));
    }

    #[test]
    fn test_format_rules() {
        plain();
        assert_eq!(format_rules(&RuleSet::default()), "(no rules)");
        let rules = RuleSet::new(vec![Rule::CoRun {
            tasks: vec!["T1".to_string(), "T2".to_string()],
        }]);
        assert_eq!(format_rules(&rules), "  #0 coRun: T1, T2 run together");
    }

    #[test]
    fn test_format_priorities_orders_by_weight() {
        plain();
        let result = format_priorities(&Preset::MaximizeFulfillment.weights());
        let first = result.lines().next().unwrap();
        assert!(first.contains("requestedTaskFulfillment"));
        assert!(result.contains('%'));
    }
}
