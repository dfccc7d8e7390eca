//! On-disk workspace under `.sheetwright/`.
//!
//! ```text
//! .sheetwright/
//!   config.md
//!   rules.json
//!   data/clients.csv
//!   data/workers.csv
//!   data/tasks.csv
//! ```

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{default_config_content, global_config_path, Config};
use crate::normalize::{normalize_table, Fix};
use crate::paths::{CONFIG_FILE, DATA_DIR, RULES_FILE, WORKSPACE_DIR};
use crate::rules::RulesDocument;
use crate::schema::EntityKind;
use crate::table::{load_file, Dataset, Table};

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create the workspace directory layout under `root`.
    pub fn init(root: &Path, project_name: &str, force: bool) -> Result<Self> {
        let dir = root.join(WORKSPACE_DIR);
        if dir.exists() {
            if !force {
                bail!(
                    "{} already exists. Use --force to overwrite.",
                    dir.display()
                );
            }
            fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to remove {}", dir.display()))?;
        }

        let workspace = Self {
            root: root.to_path_buf(),
        };
        fs::create_dir_all(workspace.root.join(DATA_DIR))
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        write_atomic(
            &workspace.config_path(),
            &default_config_content(project_name),
        )?;
        workspace.save_dataset(&Dataset::default())?;
        workspace.save_rules(&RulesDocument::default())?;

        tracing::debug!(root = %root.display(), "workspace initialized");
        Ok(workspace)
    }

    /// Open an existing workspace rooted exactly at `root`.
    pub fn open(root: &Path) -> Result<Self> {
        if !root.join(WORKSPACE_DIR).is_dir() {
            bail!("Sheetwright not initialized. Run `sheetwright init` first.");
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Find the workspace in the current directory or one of its ancestors.
    pub fn discover() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        cwd.ancestors()
            .find(|dir| dir.join(WORKSPACE_DIR).is_dir())
            .map(|dir| Self {
                root: dir.to_path_buf(),
            })
            .ok_or_else(|| anyhow::anyhow!("Sheetwright not initialized. Run `sheetwright init` first."))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn rules_path(&self) -> PathBuf {
        self.root.join(RULES_FILE)
    }

    pub fn table_path(&self, kind: EntityKind) -> PathBuf {
        self.root.join(DATA_DIR).join(kind.file_name())
    }

    /// Global config merged with this workspace's config
    pub fn load_config(&self) -> Result<Config> {
        Config::load_merged_from(global_config_path().as_deref(), &self.config_path())
    }

    /// Load every stored table; a missing file is an empty table.
    pub fn load_dataset(&self) -> Result<Dataset> {
        let mut dataset = Dataset::default();
        for kind in EntityKind::ALL {
            let path = self.table_path(kind);
            if !path.exists() {
                continue;
            }
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let table = Table::from_csv(kind, &content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            dataset.replace(table);
        }
        Ok(dataset)
    }

    pub fn save_table(&self, table: &Table) -> Result<()> {
        write_atomic(&self.table_path(table.kind), &table.to_csv())
    }

    pub fn save_dataset(&self, dataset: &Dataset) -> Result<()> {
        for table in dataset.tables() {
            self.save_table(table)?;
        }
        Ok(())
    }

    /// Load `rules.json`; a missing file means no rules and default weights.
    pub fn load_rules(&self) -> Result<RulesDocument> {
        let path = self.rules_path();
        if !path.exists() {
            return Ok(RulesDocument::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save_rules(&self, document: &RulesDocument) -> Result<()> {
        let json = serde_json::to_string_pretty(document).context("Failed to serialize rules")?;
        write_atomic(&self.rules_path(), &format!("{}\n", json))
    }
}

/// Write through a temp file in the same directory, then rename over `path`.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;
    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Outcome of importing one file
#[derive(Debug, Clone, Serialize)]
pub struct Imported {
    pub path: PathBuf,
    pub entity: EntityKind,
    pub rows: usize,
    pub fixes: Vec<Fix>,
}

/// Expand directories into the CSV and JSON files they contain, sorted.
pub fn expand_import_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let mut found = Vec::new();
        for ext in ["csv", "json"] {
            let pattern = path.join(format!("*.{}", ext));
            let pattern = pattern.to_string_lossy();
            for entry in glob::glob(&pattern)
                .with_context(|| format!("Invalid import pattern {}", pattern))?
            {
                found.push(entry.context("Failed to read directory entry")?);
            }
        }
        if found.is_empty() {
            bail!("No .csv or .json files in {}", path.display());
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

/// Load, normalize and store files into `dataset`. An import replaces the
/// whole table of its entity.
pub fn import_files(
    dataset: &mut Dataset,
    paths: &[PathBuf],
    kind: Option<EntityKind>,
) -> Result<Vec<Imported>> {
    let files = expand_import_paths(paths)?;
    let mut imported: Vec<Imported> = Vec::with_capacity(files.len());

    for path in files {
        let mut table = load_file(&path, kind)?;
        let fixes = normalize_table(&mut table);

        if let Some(previous) = imported.iter().find(|i| i.entity == table.kind) {
            tracing::warn!(
                entity = %table.kind,
                replaced = %previous.path.display(),
                by = %path.display(),
                "entity imported twice; the later file wins"
            );
        }

        imported.push(Imported {
            path,
            entity: table.kind,
            rows: table.len(),
            fixes,
        });
        dataset.replace(table);
    }

    Ok(imported)
}
