//! CLI argument definitions for sheetwright.

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

use sheetwright::schema::EntityKind;

#[derive(Parser)]
#[command(name = "sheetwright")]
#[command(version)]
#[command(about = "Clean, validate and export allocation spreadsheets", long_about = None)]
#[command(
    after_help = "GETTING STARTED:\n    sheetwright init\n    sheetwright import clients.csv workers.csv tasks.csv\n    sheetwright validate\n    sheetwright export"
)]
pub struct Cli {
    /// Suppress all non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Show debug logs and build details (SHEETWRIGHT_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for reports
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize sheetwright in the current directory
    Init {
        /// Override detected project name
        #[arg(long)]
        name: Option<String>,
        /// Overwrite existing .sheetwright/ directory
        #[arg(long)]
        force: bool,
    },
    /// Import CSV or JSON files (or directories of them)
    ///
    /// Each file replaces the stored table of its entity. The entity is taken
    /// from --kind, else the file name, else the headers.
    Import {
        /// Files or directories to import
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Entity of every imported file
        #[arg(long, value_parser = parse_entity)]
        kind: Option<EntityKind>,
    },
    /// Validate the stored data and rules
    Validate {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Only report issues for this entity
        #[arg(long, value_parser = parse_entity)]
        entity: Option<EntityKind>,
    },
    /// Show a table with flagged cells
    Show {
        /// clients, workers or tasks
        #[arg(value_parser = parse_entity)]
        entity: EntityKind,
        /// Only rows with issues
        #[arg(long)]
        issues: bool,
    },
    /// Set one cell and re-validate
    Edit {
        #[arg(value_parser = parse_entity)]
        entity: EntityKind,
        /// Row ID, or #index for rows without an ID
        row: String,
        /// Column name (aliases accepted)
        column: String,
        /// New value
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Delete a row and re-validate
    Delete {
        #[arg(value_parser = parse_entity)]
        entity: EntityKind,
        /// Row ID, or #index for rows without an ID
        row: String,
    },
    /// Search the data in plain English
    Search {
        /// What to look for
        query: String,
        /// Restrict results to one entity
        #[arg(long, value_parser = parse_entity)]
        entity: Option<EntityKind>,
        /// Skip the AI and match substrings only
        #[arg(long)]
        offline: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Manage allocation rules
    Rule {
        #[command(subcommand)]
        command: RuleCommands,
    },
    /// Manage priority weights
    Priorities {
        #[command(subcommand)]
        command: PriorityCommands,
    },
    /// Export cleaned CSV files and rules.json
    Export {
        /// Output directory (overrides config)
        #[arg(long, short)]
        out: Option<PathBuf>,
        /// Export even when validation reports errors
        #[arg(long)]
        force: bool,
    },
    /// Validate configuration
    Config {
        /// Check the configuration for problems
        #[arg(long)]
        validate: bool,
    },
    /// Show version information (-v adds build details)
    Version,
    /// Generate shell completion script
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum RuleCommands {
    /// Describe a rule in plain English and let the AI write it
    Add {
        /// Rule description, e.g. "T1 and T3 must run together"
        description: String,
    },
    /// Add a rule from its JSON form
    AddJson {
        /// Rule JSON, e.g. '{"type":"coRun","tasks":["T1","T2"]}'
        json: String,
    },
    /// List rules
    List,
    /// Remove a rule by index
    Remove {
        /// Index shown by `rule list`
        index: usize,
    },
    /// Suggest rules from patterns in the data
    Suggest {
        /// Add all suggestions to the rule set
        #[arg(long)]
        apply: bool,
    },
}

#[derive(Subcommand)]
pub enum PriorityCommands {
    /// Show current weights
    Show,
    /// Set one weight
    Set {
        /// Criterion, e.g. fairness
        criterion: String,
        /// Weight between 0 and 1
        weight: f64,
    },
    /// Apply a preset
    Preset {
        /// balanced, maximize-fulfillment, fair-distribution or minimize-workload
        name: String,
    },
    /// Derive weights from a ranking, most important first
    Rank {
        /// Criteria in order of importance
        #[arg(required = true)]
        criteria: Vec<String>,
    },
}

fn parse_entity(value: &str) -> Result<EntityKind, String> {
    value.parse().map_err(|e: anyhow::Error| e.to_string())
}
