//! Entity definitions: canonical columns, column types and header aliases.
//!
//! Every table the tool handles is one of three entity kinds. The column
//! definitions here drive header canonicalization, cell normalization and
//! the per-field validation checks.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three related entity types a dataset is made of
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Clients,
    Workers,
    Tasks,
}

/// Type of a column's cells, used for normalization and validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Unique identifier of the row
    Id,
    /// Free text
    Text,
    /// Whole number with an inclusive lower bound and optional upper bound
    Integer { min: i64, max: Option<i64> },
    /// Comma-separated list of tokens
    List,
    /// List of phase numbers, ranges like `1-3` allowed on input
    PhaseList,
    /// JSON object
    Json,
}

/// A canonical column of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub required: bool,
}

const fn col(name: &'static str, ty: ColumnType, required: bool) -> ColumnDef {
    ColumnDef { name, ty, required }
}

const CLIENT_COLUMNS: &[ColumnDef] = &[
    col("ClientID", ColumnType::Id, true),
    col("ClientName", ColumnType::Text, true),
    col(
        "PriorityLevel",
        ColumnType::Integer {
            min: 1,
            max: Some(5),
        },
        true,
    ),
    col("RequestedTaskIDs", ColumnType::List, false),
    col("GroupTag", ColumnType::Text, false),
    col("AttributesJSON", ColumnType::Json, false),
];

const WORKER_COLUMNS: &[ColumnDef] = &[
    col("WorkerID", ColumnType::Id, true),
    col("WorkerName", ColumnType::Text, true),
    col("Skills", ColumnType::List, false),
    col("AvailableSlots", ColumnType::PhaseList, true),
    col(
        "MaxLoadPerPhase",
        ColumnType::Integer { min: 0, max: None },
        true,
    ),
    col("WorkerGroup", ColumnType::Text, false),
    col(
        "QualificationLevel",
        ColumnType::Integer { min: 0, max: None },
        false,
    ),
];

const TASK_COLUMNS: &[ColumnDef] = &[
    col("TaskID", ColumnType::Id, true),
    col("TaskName", ColumnType::Text, true),
    col("Category", ColumnType::Text, false),
    col("Duration", ColumnType::Integer { min: 1, max: None }, true),
    col("RequiredSkills", ColumnType::List, false),
    col("PreferredPhases", ColumnType::PhaseList, false),
    col(
        "MaxConcurrent",
        ColumnType::Integer { min: 1, max: None },
        true,
    ),
];

/// Extra header spellings seen in the wild, keyed by `header_key`
const ALIASES: &[(EntityKind, &str, &str)] = &[
    (EntityKind::Clients, "id", "ClientID"),
    (EntityKind::Clients, "name", "ClientName"),
    (EntityKind::Clients, "client", "ClientName"),
    (EntityKind::Clients, "priority", "PriorityLevel"),
    (EntityKind::Clients, "requestedtasks", "RequestedTaskIDs"),
    (EntityKind::Clients, "requestedtaskid", "RequestedTaskIDs"),
    (EntityKind::Clients, "tasks", "RequestedTaskIDs"),
    (EntityKind::Clients, "group", "GroupTag"),
    (EntityKind::Clients, "attributes", "AttributesJSON"),
    (EntityKind::Clients, "attrs", "AttributesJSON"),
    (EntityKind::Workers, "id", "WorkerID"),
    (EntityKind::Workers, "name", "WorkerName"),
    (EntityKind::Workers, "worker", "WorkerName"),
    (EntityKind::Workers, "skill", "Skills"),
    (EntityKind::Workers, "slots", "AvailableSlots"),
    (EntityKind::Workers, "availableslot", "AvailableSlots"),
    (EntityKind::Workers, "maxload", "MaxLoadPerPhase"),
    (EntityKind::Workers, "group", "WorkerGroup"),
    (EntityKind::Workers, "qualification", "QualificationLevel"),
    (EntityKind::Tasks, "id", "TaskID"),
    (EntityKind::Tasks, "name", "TaskName"),
    (EntityKind::Tasks, "task", "TaskName"),
    (EntityKind::Tasks, "skills", "RequiredSkills"),
    (EntityKind::Tasks, "requiredskill", "RequiredSkills"),
    (EntityKind::Tasks, "phases", "PreferredPhases"),
    (EntityKind::Tasks, "preferredphase", "PreferredPhases"),
    (EntityKind::Tasks, "maxconcurrency", "MaxConcurrent"),
];

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Clients, EntityKind::Workers, EntityKind::Tasks];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Clients => "clients",
            EntityKind::Workers => "workers",
            EntityKind::Tasks => "tasks",
        }
    }

    /// Canonical columns in export order
    pub fn columns(&self) -> &'static [ColumnDef] {
        match self {
            EntityKind::Clients => CLIENT_COLUMNS,
            EntityKind::Workers => WORKER_COLUMNS,
            EntityKind::Tasks => TASK_COLUMNS,
        }
    }

    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns().iter().find(|c| c.name == name)
    }

    pub fn id_column(&self) -> &'static str {
        self.columns()[0].name
    }

    pub fn name_column(&self) -> &'static str {
        self.columns()[1].name
    }

    /// File name used inside the workspace and in exports
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.as_str())
    }

    /// Guess the entity from a file stem such as `clients_v2` or `Worker-list`
    pub fn from_file_stem(stem: &str) -> Option<Self> {
        let stem = stem.to_lowercase();
        if stem.starts_with("client") {
            Some(EntityKind::Clients)
        } else if stem.starts_with("worker") {
            Some(EntityKind::Workers)
        } else if stem.starts_with("task") {
            Some(EntityKind::Tasks)
        } else {
            None
        }
    }

    /// Guess the entity from which ID column the headers contain
    pub fn infer_from_headers(headers: &[String]) -> Option<Self> {
        EntityKind::ALL.into_iter().find(|kind| {
            let id_key = header_key(kind.id_column());
            headers.iter().any(|h| header_key(h) == id_key)
        })
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "client" | "clients" => Ok(EntityKind::Clients),
            "worker" | "workers" => Ok(EntityKind::Workers),
            "task" | "tasks" => Ok(EntityKind::Tasks),
            other => Err(anyhow!(
                "Unknown entity '{}'. Expected one of: clients, workers, tasks",
                other
            )),
        }
    }
}

/// Comparison key for headers: lowercase ASCII alphanumerics only.
pub fn header_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Map a raw header to the canonical column name of `kind`, if it names one.
pub fn canonical_header(kind: EntityKind, raw: &str) -> Option<&'static str> {
    let key = header_key(raw);
    if key.is_empty() {
        return None;
    }

    if let Some(def) = kind.columns().iter().find(|c| header_key(c.name) == key) {
        return Some(def.name);
    }

    ALIASES
        .iter()
        .find(|(k, alias, _)| *k == kind && *alias == key)
        .map(|(_, _, canonical)| *canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_header_ignores_case_and_separators() {
        assert_eq!(
            canonical_header(EntityKind::Clients, "client_id"),
            Some("ClientID")
        );
        assert_eq!(
            canonical_header(EntityKind::Clients, "Priority Level"),
            Some("PriorityLevel")
        );
        assert_eq!(
            canonical_header(EntityKind::Tasks, "max-concurrent"),
            Some("MaxConcurrent")
        );
    }

    #[test]
    fn test_canonical_header_aliases_are_per_entity() {
        assert_eq!(canonical_header(EntityKind::Workers, "Name"), Some("WorkerName"));
        assert_eq!(canonical_header(EntityKind::Tasks, "Name"), Some("TaskName"));
        assert_eq!(canonical_header(EntityKind::Workers, "group"), Some("WorkerGroup"));
        assert_eq!(canonical_header(EntityKind::Clients, "group"), Some("GroupTag"));
    }

    #[test]
    fn test_canonical_header_unknown() {
        assert_eq!(canonical_header(EntityKind::Tasks, "Notes"), None);
        assert_eq!(canonical_header(EntityKind::Tasks, "  "), None);
    }

    #[test]
    fn test_entity_from_file_stem() {
        assert_eq!(EntityKind::from_file_stem("clients"), Some(EntityKind::Clients));
        assert_eq!(EntityKind::from_file_stem("Workers-2024"), Some(EntityKind::Workers));
        assert_eq!(EntityKind::from_file_stem("task_list"), Some(EntityKind::Tasks));
        assert_eq!(EntityKind::from_file_stem("data"), None);
    }

    #[test]
    fn test_infer_from_headers() {
        let headers = vec!["Task ID".to_string(), "Duration".to_string()];
        assert_eq!(EntityKind::infer_from_headers(&headers), Some(EntityKind::Tasks));

        let headers = vec!["whatever".to_string()];
        assert_eq!(EntityKind::infer_from_headers(&headers), None);
    }

    #[test]
    fn test_entity_from_str() {
        assert_eq!("worker".parse::<EntityKind>().unwrap(), EntityKind::Workers);
        assert_eq!("TASKS".parse::<EntityKind>().unwrap(), EntityKind::Tasks);
        assert!("jobs".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_id_and_name_columns() {
        assert_eq!(EntityKind::Clients.id_column(), "ClientID");
        assert_eq!(EntityKind::Workers.name_column(), "WorkerName");
        assert_eq!(EntityKind::Tasks.file_name(), "tasks.csv");
    }
}
