//! JSON ingest: an array of flat objects, one object per row.

use anyhow::{bail, Context, Result};
use serde_json::Value;

/// Parse a JSON document into headers and rows.
///
/// Headers are the union of object keys in first-seen order. Strings are
/// taken verbatim, `null` becomes an empty cell, and every other value is
/// stored as its compact JSON text.
pub fn parse(content: &str) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let document: Value = serde_json::from_str(content).context("Failed to parse JSON input")?;

    let items = match document {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => bail!("Expected a JSON array of objects or an object with a \"data\" array"),
        },
        _ => bail!("Expected a JSON array of objects or an object with a \"data\" array"),
    };

    let mut headers: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        let Value::Object(map) = item else {
            bail!("Row {} is not a JSON object", index + 1);
        };
        for key in map.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
        objects.push(map);
    }

    let rows = objects
        .iter()
        .map(|map| {
            headers
                .iter()
                .map(|header| map.get(header).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();

    Ok((headers, rows))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
