//! Cell value parsing shared by normalization, validation and search.

use std::collections::BTreeSet;

/// Widest phase range accepted in a single `a-b` item
const MAX_PHASE_RANGE: i64 = 1000;

/// Split a list cell into its items.
///
/// Accepts JSON arrays (`["a","b"]`, `[1,2]`) as well as items separated by
/// commas, semicolons or pipes. Items are trimmed, surrounding quotes are
/// stripped and empty items dropped.
pub fn split_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.starts_with('[') {
        if let Ok(serde_json::Value::Array(items)) = serde_json::from_str(trimmed) {
            return items
                .iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                })
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    trimmed
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split([',', ';', '|'])
        .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect()
}

/// Parse a whole number, tolerating a leading `+` and an integral float like `3.0`.
pub fn parse_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if unsigned.is_empty() {
        return None;
    }

    if let Ok(n) = unsigned.parse::<i64>() {
        return Some(n);
    }

    match unsigned.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(f as i64),
        _ => None,
    }
}

/// Parse a phase list into sorted, de-duplicated phase numbers.
///
/// Items are integers or inclusive ascending ranges (`2-4`). Bounds are not
/// range-checked here; a `-1` item parses as a negative phase.
pub fn parse_phase_list(raw: &str) -> Result<Vec<i64>, String> {
    let mut phases = BTreeSet::new();

    for item in split_list(raw) {
        if let Some((start, end)) = split_range(&item) {
            let start = parse_integer(start)
                .ok_or_else(|| format!("'{}' is not a valid phase range", item))?;
            let end = parse_integer(end)
                .ok_or_else(|| format!("'{}' is not a valid phase range", item))?;
            if start > end {
                return Err(format!("'{}' is a descending range", item));
            }
            if end.checked_sub(start).map_or(true, |width| width > MAX_PHASE_RANGE) {
                return Err(format!("'{}' spans more than {} phases", item, MAX_PHASE_RANGE));
            }
            phases.extend(start..=end);
        } else {
            let phase =
                parse_integer(&item).ok_or_else(|| format!("'{}' is not a phase number", item))?;
            phases.insert(phase);
        }
    }

    Ok(phases.into_iter().collect())
}

/// Split `a-b` into its bounds; a leading minus sign is a sign, not a range.
fn split_range(item: &str) -> Option<(&str, &str)> {
    let search_from = usize::from(item.starts_with('-'));
    item[search_from..]
        .find('-')
        .map(|pos| (&item[..search_from + pos], &item[search_from + pos + 1..]))
}

/// Parse a cell that must hold a JSON object.
pub fn parse_json_object(raw: &str) -> Result<serde_json::Map<String, serde_json::Value>, String> {
    match serde_json::from_str::<serde_json::Value>(raw.trim()) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, got {}", json_type_name(&other))),
        Err(e) => Err(format!("invalid JSON: {}", e)),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_separators() {
        assert_eq!(split_list("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(split_list("a;b|c"), vec!["a", "b", "c"]);
        assert_eq!(split_list(" , a ,, "), vec!["a"]);
        assert!(split_list("   ").is_empty());
    }

    #[test]
    fn test_split_list_json_array() {
        assert_eq!(split_list(r#"["T1", "T2"]"#), vec!["T1", "T2"]);
        assert_eq!(split_list("[1, 2, 3]"), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_split_list_loose_brackets_and_quotes() {
        assert_eq!(split_list("[T1, 'T2']"), vec!["T1", "T2"]);
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("3"), Some(3));
        assert_eq!(parse_integer(" +2 "), Some(2));
        assert_eq!(parse_integer("4.0"), Some(4));
        assert_eq!(parse_integer("-1"), Some(-1));
        assert_eq!(parse_integer("2.5"), None);
        assert_eq!(parse_integer("high"), None);
        assert_eq!(parse_integer(""), None);
    }

    #[test]
    fn test_parse_phase_list_ranges_and_dedup() {
        assert_eq!(parse_phase_list("1-3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_phase_list("[4, 1, 2]").unwrap(), vec![1, 2, 4]);
        assert_eq!(parse_phase_list("1,3-4,3").unwrap(), vec![1, 3, 4]);
        assert!(parse_phase_list("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_phase_list_errors() {
        assert!(parse_phase_list("3-1").unwrap_err().contains("descending"));
        assert!(parse_phase_list("one,two").unwrap_err().contains("not a phase"));
        assert!(parse_phase_list("1-x").unwrap_err().contains("range"));
        assert!(parse_phase_list("1-100000").unwrap_err().contains("spans"));
    }

    #[test]
    fn test_parse_phase_list_extreme_bounds() {
        let full = format!("{}-{}", i64::MIN, i64::MAX);
        assert!(parse_phase_list(&full).unwrap_err().contains("spans"));

        let top = format!("{}-{}", i64::MAX - 1, i64::MAX);
        assert_eq!(parse_phase_list(&top).unwrap(), vec![i64::MAX - 1, i64::MAX]);

        let bottom = format!("{}-{}", i64::MIN, i64::MIN + 2);
        assert_eq!(parse_phase_list(&bottom).unwrap().len(), 3);
    }

    #[test]
    fn test_parse_phase_list_negative_is_a_number() {
        assert_eq!(parse_phase_list("-1,2").unwrap(), vec![-1, 2]);
    }

    #[test]
    fn test_parse_json_object() {
        assert!(parse_json_object(r#"{"vip": true}"#).is_ok());
        assert!(parse_json_object("[1]").unwrap_err().contains("an array"));
        assert!(parse_json_object("{broken").unwrap_err().contains("invalid JSON"));
    }
}
