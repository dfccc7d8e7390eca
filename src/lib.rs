//! # Sheetwright - allocation data cleaning
//!
//! Sheetwright ingests client, worker and task spreadsheets, normalizes them,
//! validates them against each other and exports clean CSV files plus a
//! `rules.json` describing allocation rules and priority weights.
//!
//! ## Core Concepts
//!
//! - **Dataset**: three tables (clients, workers, tasks) of string cells
//! - **Issues**: validation findings attached to a row, column or rule
//! - **Rules**: typed allocation constraints, authored by hand or with AI help
//! - **Priorities**: inert weights exported alongside the rules
//!
//! ## Modules
//!
//! - [`schema`] - Entity columns, types and header aliases
//! - [`table`] - CSV/JSON ingest and the in-memory [`table::Dataset`]
//! - [`normalize`] - Canonical cell and header spelling
//! - [`validation`] - Field, cross-entity and rule checks
//! - [`edit`] - Cell edits and row deletion
//! - [`rules`] - Rule types, JSON Schema checks, AI authoring and suggestions
//! - [`priorities`] - Criterion weights and presets
//! - [`ai`] - Model providers, prompts and answer parsing
//! - [`search`] - Natural-language search with substring fallback
//! - [`export`] - Writing the cleaned files
//! - [`workspace`] - The `.sheetwright/` directory
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use sheetwright::validation::validate;
//! use sheetwright::workspace::Workspace;
//!
//! let workspace = Workspace::open(Path::new(".")).expect("not initialized");
//! let dataset = workspace.load_dataset().expect("failed to load data");
//! let rules = workspace.load_rules().expect("failed to load rules");
//!
//! let report = validate(&dataset, &rules.rule_set());
//! println!("{} error(s), {} warning(s)", report.error_count(), report.warning_count());
//! ```

pub mod ai;
pub mod config;
pub mod edit;
pub mod export;
pub mod formatters;
pub mod normalize;
pub mod priorities;
pub mod rules;
pub mod schema;
pub mod search;
pub mod table;
pub mod ui;
pub mod validation;
pub mod values;
pub mod workspace;

/// Default path constants for the workspace layout, relative to its root.
pub mod paths {
    /// Workspace directory: `.sheetwright`
    pub const WORKSPACE_DIR: &str = ".sheetwright";
    /// Project config: `.sheetwright/config.md`
    pub const CONFIG_FILE: &str = ".sheetwright/config.md";
    /// Stored tables: `.sheetwright/data`
    pub const DATA_DIR: &str = ".sheetwright/data";
    /// Rules and priorities: `.sheetwright/rules.json`
    pub const RULES_FILE: &str = ".sheetwright/rules.json";
}

/// Generate a UTC timestamp in ISO 8601 format: `YYYY-MM-DDTHH:MM:SSZ`
pub fn utc_now_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
