//! Minimal RFC 4180 reader and writer.

use anyhow::{bail, Result};

/// Parse CSV text into records.
///
/// Handles quoted fields with doubled quotes, embedded separators and
/// newlines, CRLF line endings and a leading UTF-8 byte order mark. Blank
/// lines are skipped.
pub fn parse(content: &str) -> Result<Vec<Vec<String>>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_was_quoted = false;
    let mut line = 1usize;
    let mut quote_opened_at = 0usize;
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(ch);
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' if field.is_empty() && !field_was_quoted => {
                in_quotes = true;
                field_was_quoted = true;
                quote_opened_at = line;
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                field_was_quoted = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                field_was_quoted = false;
                push_record(&mut records, std::mem::take(&mut record));
                line += 1;
            }
            _ => field.push(ch),
        }
    }

    if in_quotes {
        bail!("Unterminated quoted field starting on line {}", quote_opened_at);
    }

    if !field.is_empty() || field_was_quoted || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }

    Ok(records)
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.len() == 1 && record[0].trim().is_empty();
    if !blank {
        records.push(record);
    }
}

/// Render a header row and data rows as CSV text with `\n` line endings.
pub fn write(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut output = String::new();

    let header_cells: Vec<String> = headers.iter().map(|h| escape(h)).collect();
    output.push_str(&header_cells.join(","));
    output.push('\n');

    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| escape(c)).collect();
        output.push_str(&cells.join(","));
        output.push('\n');
    }

    output
}

/// Escape a value for CSV output
pub fn escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let records = parse("a,b\n1,2\n").unwrap();
        assert_eq!(records, vec![vec!["a", "b"], vec!["1", "2"]]);
    }

    #[test]
    fn test_parse_quoted_fields() {
        let records = parse("id,attrs\nC1,\"{\"\"vip\"\": true}\"\nC2,\"a, b\"\n").unwrap();
        assert_eq!(records[1], vec!["C1", "{\"vip\": true}"]);
        assert_eq!(records[2], vec!["C2", "a, b"]);
    }

    #[test]
    fn test_parse_embedded_newline_and_crlf() {
        let records = parse("id,note\r\nT1,\"line one\nline two\"\r\nT2,x").unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1][1], "line one\nline two");
        assert_eq!(records[2], vec!["T2", "x"]);
    }

    #[test]
    fn test_parse_skips_blank_lines_and_bom() {
        let records = parse("\u{feff}id\n\nW1\n   \nW2\n").unwrap();
        assert_eq!(records, vec![vec!["id"], vec!["W1"], vec!["W2"]]);
    }

    #[test]
    fn test_parse_trailing_empty_field() {
        let records = parse("a,b,\n").unwrap();
        assert_eq!(records, vec![vec!["a", "b", ""]]);
    }

    #[test]
    fn test_parse_unterminated_quote() {
        let err = parse("a,b\n\"open,2\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_write_escapes() {
        let headers = vec!["ClientID".to_string(), "AttributesJSON".to_string()];
        let rows = vec![vec!["C1".to_string(), r#"{"a":1,"b":2}"#.to_string()]];
        let text = write(&headers, &rows);
        assert_eq!(text, "ClientID,AttributesJSON\nC1,\"{\"\"a\"\":1,\"\"b\"\":2}\"\n");
        assert_eq!(parse(&text).unwrap()[1][1], r#"{"a":1,"b":2}"#);
    }
}
