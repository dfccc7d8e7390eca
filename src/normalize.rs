//! Normalization pipeline applied on import and on every cell edit.
//!
//! Normalization only rewrites values into their canonical spelling. It
//! never fills empty cells and leaves unparseable values untouched so the
//! validator can report them.

use serde::Serialize;

use crate::schema::{canonical_header, ColumnType, EntityKind};
use crate::table::Table;
use crate::values::{parse_integer, parse_phase_list, split_list};

/// A change made by normalization. `row` is `None` for header renames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fix {
    pub row: Option<usize>,
    pub column: String,
    pub before: String,
    pub after: String,
}

/// Normalize headers and every cell of `table` in place.
pub fn normalize_table(table: &mut Table) -> Vec<Fix> {
    let mut fixes = canonicalize_headers(table);

    let types: Vec<Option<ColumnType>> = table
        .headers
        .iter()
        .map(|h| column_type(table.kind, h))
        .collect();

    for (row_index, row) in table.rows.iter_mut().enumerate() {
        for (col_index, cell) in row.iter_mut().enumerate() {
            let ty = types.get(col_index).copied().flatten();
            let after = normalize_cell(ty, cell);
            if after != *cell {
                fixes.push(Fix {
                    row: Some(row_index),
                    column: table.headers[col_index].clone(),
                    before: std::mem::replace(cell, after.clone()),
                    after,
                });
            }
        }
    }

    fixes
}

fn canonicalize_headers(table: &mut Table) -> Vec<Fix> {
    let mut fixes = Vec::new();
    let mut taken: Vec<&'static str> = Vec::new();

    for index in 0..table.headers.len() {
        let raw = table.headers[index].trim().to_string();
        let Some(canonical) = canonical_header(table.kind, &raw) else {
            table.headers[index] = raw;
            continue;
        };

        if taken.contains(&canonical) {
            tracing::warn!(
                entity = %table.kind,
                header = %raw,
                column = canonical,
                "duplicate column; keeping header as-is"
            );
            table.headers[index] = raw;
            continue;
        }
        taken.push(canonical);

        if raw != canonical {
            fixes.push(Fix {
                row: None,
                column: canonical.to_string(),
                before: raw,
                after: canonical.to_string(),
            });
            table.headers[index] = canonical.to_string();
        }
    }

    fixes
}

/// Column type of a canonical header, `None` for extra columns
pub fn column_type(kind: EntityKind, header: &str) -> Option<ColumnType> {
    kind.column(header).map(|def| def.ty)
}

/// Canonical spelling of a single cell.
pub fn normalize_cell(ty: Option<ColumnType>, value: &str) -> String {
    let trimmed = value.trim();

    match ty {
        None => trimmed.to_string(),
        Some(ColumnType::Id) | Some(ColumnType::Text) => collapse_whitespace(trimmed),
        Some(ColumnType::Integer { .. }) => match parse_integer(trimmed) {
            Some(n) => n.to_string(),
            None => trimmed.to_string(),
        },
        Some(ColumnType::List) => split_list(trimmed).join(","),
        Some(ColumnType::PhaseList) => match parse_phase_list(trimmed) {
            Ok(phases) => phases
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(","),
            Err(_) => trimmed.to_string(),
        },
        Some(ColumnType::Json) => match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(value) if !trimmed.is_empty() => value.to_string(),
            _ => trimmed.to_string(),
        },
    }
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_cell_by_type() {
        assert_eq!(normalize_cell(Some(ColumnType::Text), "  Acme   Corp "), "Acme Corp");
        assert_eq!(
            normalize_cell(Some(ColumnType::Integer { min: 1, max: None }), "3.0"),
            "3"
        );
        assert_eq!(
            normalize_cell(Some(ColumnType::Integer { min: 1, max: None }), "lots"),
            "lots"
        );
        assert_eq!(normalize_cell(Some(ColumnType::List), "a; b ,c"), "a,b,c");
        assert_eq!(normalize_cell(Some(ColumnType::List), r#"["T1","T2"]"#), "T1,T2");
        assert_eq!(normalize_cell(Some(ColumnType::PhaseList), "[3, 1-2]"), "1,2,3");
        assert_eq!(normalize_cell(Some(ColumnType::PhaseList), "soon"), "soon");
        assert_eq!(
            normalize_cell(Some(ColumnType::Json), r#"{ "vip" : true }"#),
            r#"{"vip":true}"#
        );
        assert_eq!(normalize_cell(Some(ColumnType::Json), "{oops"), "{oops");
        assert_eq!(normalize_cell(None, "  free text  "), "free text");
    }

    #[test]
    fn test_normalize_never_fills_empty_cells() {
        for ty in [
            ColumnType::Id,
            ColumnType::Integer { min: 0, max: None },
            ColumnType::List,
            ColumnType::PhaseList,
            ColumnType::Json,
        ] {
            assert_eq!(normalize_cell(Some(ty), "  "), "");
        }
    }

    #[test]
    fn test_normalize_table_renames_headers_and_records_fixes() {
        let mut table = Table::from_csv(
            EntityKind::Workers,
            "worker_id,Name,slots,max load,Notes\n W1 ,Ada  Lovelace,\"1-3\",2.0,hi\n",
        )
        .unwrap();

        let fixes = normalize_table(&mut table);

        assert_eq!(
            table.headers,
            vec!["WorkerID", "WorkerName", "AvailableSlots", "MaxLoadPerPhase", "Notes"]
        );
        assert_eq!(table.rows[0], vec!["W1", "Ada Lovelace", "1,2,3", "2", "hi"]);

        let header_fixes = fixes.iter().filter(|f| f.row.is_none()).count();
        assert_eq!(header_fixes, 4);
        assert!(fixes.iter().any(|f| f.row == Some(0)
            && f.column == "AvailableSlots"
            && f.before == "1-3"
            && f.after == "1,2,3"));
    }

    #[test]
    fn test_normalize_table_keeps_duplicate_header() {
        let mut table =
            Table::from_csv(EntityKind::Tasks, "TaskID,task_id\nT1,T1\n").unwrap();
        normalize_table(&mut table);
        assert_eq!(table.headers, vec!["TaskID", "task_id"]);
    }

    #[test]
    fn test_normalize_table_is_idempotent() {
        let mut table = Table::from_csv(
            EntityKind::Tasks,
            "TaskID,TaskName,Duration,RequiredSkills,PreferredPhases,MaxConcurrent\nT1,Build,1,a;b,2-3,1\n",
        )
        .unwrap();
        normalize_table(&mut table);
        let again = normalize_table(&mut table);
        assert!(again.is_empty());
    }
}
