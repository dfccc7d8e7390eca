//! Cell edits and row deletion.
//!
//! Edits go through the same normalization as imports. Callers re-run
//! validation over the whole dataset afterwards since cross-entity results
//! can change with any edit.

use anyhow::{anyhow, bail, Result};

use crate::normalize::{column_type, normalize_cell, Fix};
use crate::schema::{canonical_header, EntityKind};
use crate::table::Dataset;

/// Set one cell. `row_ref` is an ID or `#index`; `column` may be any alias of
/// a known column. Returns the normalization applied to the new value.
pub fn set_cell(
    dataset: &mut Dataset,
    kind: EntityKind,
    row_ref: &str,
    column: &str,
    value: &str,
) -> Result<Vec<Fix>> {
    let table = dataset.table_mut(kind);
    let row = table
        .find_row(row_ref)
        .ok_or_else(|| anyhow!("No {} row matches '{}'", kind, row_ref))?;

    let index = match table.column_index(column) {
        Some(index) => index,
        None => match canonical_header(kind, column) {
            Some(canonical) => {
                tracing::debug!(entity = %kind, column = canonical, "adding missing column");
                table.add_column(canonical)
            }
            None => bail!(
                "Unknown column '{}' for {} (known: {})",
                column,
                kind,
                kind.columns()
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        },
    };

    let header = table.headers[index].clone();
    let after = normalize_cell(column_type(kind, &header), value);

    let mut fixes = Vec::new();
    if after != value {
        fixes.push(Fix {
            row: Some(row),
            column: header,
            before: value.to_string(),
            after: after.clone(),
        });
    }

    table.rows[row][index] = after;
    Ok(fixes)
}

/// Remove a row and return its cells
pub fn delete_row(dataset: &mut Dataset, kind: EntityKind, row_ref: &str) -> Result<Vec<String>> {
    let table = dataset.table_mut(kind);
    let row = table
        .find_row(row_ref)
        .ok_or_else(|| anyhow!("No {} row matches '{}'", kind, row_ref))?;
    Ok(table.rows.remove(row))
}
