//! In-memory tables and file ingest.
//!
//! A [`Table`] is the editable grid for one entity kind: headers plus rows
//! of cell strings aligned with them. A [`Dataset`] holds one table per
//! entity kind.

pub mod csv;
pub mod json;

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use crate::schema::{canonical_header, EntityKind};

/// Grid of cells for one entity kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub kind: EntityKind,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Empty table with the canonical headers of `kind`
    pub fn empty(kind: EntityKind) -> Self {
        Self {
            kind,
            headers: kind.columns().iter().map(|c| c.name.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from raw records, padding or truncating ragged rows to
    /// the header width.
    pub fn from_records(kind: EntityKind, headers: Vec<String>, records: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = records
            .into_iter()
            .enumerate()
            .map(|(index, mut row)| {
                if row.len() != width {
                    tracing::warn!(
                        entity = %kind,
                        row = index + 1,
                        cells = row.len(),
                        expected = width,
                        "ragged row"
                    );
                    row.resize(width, String::new());
                }
                row
            })
            .collect();

        Self {
            kind,
            headers,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column, matched exactly first and then by canonical name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        if let Some(index) = self.headers.iter().position(|h| h == name) {
            return Some(index);
        }
        let canonical = canonical_header(self.kind, name)?;
        self.headers.iter().position(|h| h == canonical)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index).map(|s| s.as_str())
    }

    /// Trimmed ID cell of a row, `None` if the column is missing or the cell empty
    pub fn id_of(&self, row: usize) -> Option<&str> {
        self.cell(row, self.kind.id_column())
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Resolve a row reference: `#3` is a zero-based index, anything else an ID.
    pub fn find_row(&self, row_ref: &str) -> Option<usize> {
        let row_ref = row_ref.trim();
        if let Some(index) = row_ref.strip_prefix('#') {
            return index.parse::<usize>().ok().filter(|i| *i < self.rows.len());
        }
        (0..self.rows.len()).find(|&row| self.id_of(row) == Some(row_ref))
    }

    /// Append an empty column and return its index
    pub fn add_column(&mut self, name: &str) -> usize {
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Column indices in export order: canonical columns first, extras after.
    pub fn export_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = self
            .kind
            .columns()
            .iter()
            .filter_map(|def| self.headers.iter().position(|h| h == def.name))
            .collect();
        for index in 0..self.headers.len() {
            if !order.contains(&index) {
                order.push(index);
            }
        }
        order
    }

    /// Render the table as CSV in export order
    pub fn to_csv(&self) -> String {
        let order = self.export_order();
        let headers: Vec<String> = order.iter().map(|&i| self.headers[i].clone()).collect();
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                order
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        csv::write(&headers, &rows)
    }

    /// Parse CSV text whose first record is the header row
    pub fn from_csv(kind: EntityKind, content: &str) -> Result<Self> {
        let mut records = csv::parse(content)?;
        if records.is_empty() {
            return Ok(Self {
                kind,
                headers: Vec::new(),
                rows: Vec::new(),
            });
        }
        let headers = records.remove(0);
        Ok(Self::from_records(kind, headers, records))
    }
}

/// One table per entity kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub clients: Table,
    pub workers: Table,
    pub tasks: Table,
}

impl Default for Dataset {
    fn default() -> Self {
        Self {
            clients: Table::empty(EntityKind::Clients),
            workers: Table::empty(EntityKind::Workers),
            tasks: Table::empty(EntityKind::Tasks),
        }
    }
}

impl Dataset {
    pub fn table(&self, kind: EntityKind) -> &Table {
        match kind {
            EntityKind::Clients => &self.clients,
            EntityKind::Workers => &self.workers,
            EntityKind::Tasks => &self.tasks,
        }
    }

    pub fn table_mut(&mut self, kind: EntityKind) -> &mut Table {
        match kind {
            EntityKind::Clients => &mut self.clients,
            EntityKind::Workers => &mut self.workers,
            EntityKind::Tasks => &mut self.tasks,
        }
    }

    /// Replace the table of the same kind
    pub fn replace(&mut self, table: Table) {
        let kind = table.kind;
        *self.table_mut(kind) = table;
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        EntityKind::ALL.into_iter().map(move |kind| self.table(kind))
    }
}

/// Load a CSV or JSON file as a raw (not yet normalized) table.
///
/// The entity kind is taken from `kind` when given, else guessed from the
/// file stem, else from the headers.
pub fn load_file(path: &Path, kind: Option<EntityKind>) -> Result<Table> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if matches!(extension.as_str(), "xlsx" | "xls" | "xlsm" | "ods") {
        bail!(
            "{}: spreadsheet workbooks are not supported; save the sheet as CSV first",
            path.display()
        );
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let (headers, records) = match extension.as_str() {
        "json" => json::parse(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?,
        "csv" | "txt" | "" => {
            let mut records = csv::parse(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            if records.is_empty() {
                bail!("{} is empty", path.display());
            }
            let headers = records.remove(0);
            (headers, records)
        }
        other => bail!("{}: unsupported file type '.{}'", path.display(), other),
    };

    let kind = kind
        .or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .and_then(EntityKind::from_file_stem)
        })
        .or_else(|| EntityKind::infer_from_headers(&headers))
        .with_context(|| {
            format!(
                "Cannot tell whether {} holds clients, workers or tasks; pass --kind",
                path.display()
            )
        })?;

    tracing::debug!(path = %path.display(), entity = %kind, rows = records.len(), "loaded file");
    Ok(Table::from_records(kind, headers, records))
}
