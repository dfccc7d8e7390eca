//! Dataset validation.
//!
//! Validation problems are data, not errors: [`validate`] always returns a
//! [`Report`] listing every issue found, in check order:
//!
//! 1. Per-table field checks: missing columns, missing values, duplicate
//!    IDs, malformed cells, out-of-range numbers, broken JSON
//! 2. Cross-entity checks: unknown task references, overloaded workers,
//!    skill coverage, concurrency feasibility, phase saturation
//! 3. Rule checks: unknown references, circular co-run groups, phase
//!    window conflicts

pub(crate) mod cross;
mod fields;
mod rules;

use serde::Serialize;
use std::fmt;

use crate::rules::RuleSet;
use crate::schema::EntityKind;
use crate::table::{Dataset, Table};

/// How serious an issue is. Errors block export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Category of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingColumn,
    MissingValue,
    DuplicateId,
    Malformed,
    OutOfRange,
    InvalidJson,
    UnknownReference,
    OverloadedWorker,
    SkillCoverage,
    ConcurrencyInfeasible,
    PhaseSaturation,
    InvalidRule,
    CircularCoRun,
    PhaseWindowConflict,
}

impl IssueKind {
    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::ConcurrencyInfeasible
            | IssueKind::PhaseSaturation
            | IssueKind::CircularCoRun
            | IssueKind::PhaseWindowConflict => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityKind>,
    /// Zero-based row index within the entity's table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Zero-based index into the rule set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<usize>,
    pub message: String,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            entity: None,
            row: None,
            id: None,
            column: None,
            rule: None,
            message: message.into(),
        }
    }

    pub fn entity(mut self, kind: EntityKind) -> Self {
        self.entity = Some(kind);
        self
    }

    /// Attach a table row, picking up its entity and ID
    pub fn at_row(mut self, table: &Table, row: usize) -> Self {
        self.entity = Some(table.kind);
        self.row = Some(row);
        self.id = table.id_of(row).map(|id| id.to_string());
        self
    }

    pub fn column(mut self, column: &str) -> Self {
        self.column = Some(column.to_string());
        self
    }

    pub fn rule(mut self, index: usize) -> Self {
        self.rule = Some(index);
        self
    }

    /// Short location label such as `tasks T3 [Duration]` or `rule #2`
    pub fn location(&self) -> String {
        let mut parts = Vec::new();
        if let Some(entity) = self.entity {
            parts.push(entity.to_string());
        }
        match (&self.id, self.row) {
            (Some(id), _) => parts.push(id.clone()),
            (None, Some(row)) => parts.push(format!("row #{}", row)),
            _ => {}
        }
        if let Some(column) = &self.column {
            parts.push(format!("[{}]", column));
        }
        if let Some(rule) = self.rule {
            parts.push(format!("rule #{}", rule));
        }
        parts.join(" ")
    }
}

/// Outcome of a validation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub issues: Vec<Issue>,
}

impl Report {
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn for_entity(&self, kind: EntityKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.entity == Some(kind))
    }

    pub fn for_row(&self, kind: EntityKind, row: usize) -> impl Iterator<Item = &Issue> {
        self.for_entity(kind).filter(move |i| i.row == Some(row))
    }

    pub fn count_of(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }

    /// Issues of rule checks (not tied to a table row)
    pub fn rule_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.rule.is_some())
    }
}

/// Validate the whole dataset against itself and the given rules.
pub fn validate(dataset: &Dataset, rules: &RuleSet) -> Report {
    let mut issues = Vec::new();

    for table in dataset.tables() {
        fields::check_table(table, &mut issues);
    }
    cross::check_dataset(dataset, &mut issues);
    rules::check_rules(dataset, rules, &mut issues);

    tracing::debug!(issues = issues.len(), "validation finished");
    Report { issues }
}

/// Validate the dataset with no rules
pub fn validate_dataset(dataset: &Dataset) -> Report {
    validate(dataset, &RuleSet::default())
}
