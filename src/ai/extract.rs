//! Pull a JSON value out of a model's free-text answer.

use serde_json::Value;

/// Extract JSON from a model answer.
///
/// Tries, in order:
/// 1. ```json fenced blocks
/// 2. bare ``` fenced blocks
/// 3. the whole answer
/// 4. the first balanced `{...}` or `[...]` span that parses
pub fn extract_json(answer: &str) -> Option<Value> {
    if let Some(json) = fenced_block(answer, "json") {
        return Some(json);
    }

    if let Some(json) = fenced_block(answer, "") {
        return Some(json);
    }

    if let Ok(json) = serde_json::from_str::<Value>(answer.trim()) {
        return Some(json);
    }

    balanced_span(answer, '{', '}').or_else(|| balanced_span(answer, '[', ']'))
}

/// First fenced block whose language matches `lang` (any language when empty)
fn fenced_block(answer: &str, lang: &str) -> Option<Value> {
    let mut in_fence = false;
    let mut fence_lang = String::new();
    let mut content = String::new();

    let lang_matches =
        |fence_lang: &str| lang.is_empty() || fence_lang.is_empty() || fence_lang.eq_ignore_ascii_case(lang);

    for line in answer.lines() {
        let trimmed = line.trim_start();
        if let Some(after_fence) = trimmed.strip_prefix("```") {
            if in_fence {
                in_fence = false;
                if lang_matches(&fence_lang) {
                    if let Ok(json) = serde_json::from_str::<Value>(&content) {
                        return Some(json);
                    }
                }
                content.clear();
                fence_lang.clear();
            } else {
                in_fence = true;
                fence_lang = after_fence.trim().to_string();
            }
        } else if in_fence {
            if !content.is_empty() {
                content.push('\n');
            }
            content.push_str(line);
        }
    }

    // An unclosed fence still gets a chance
    if in_fence && !content.is_empty() && lang_matches(&fence_lang) {
        if let Ok(json) = serde_json::from_str::<Value>(&content) {
            return Some(json);
        }
    }

    None
}

/// First span delimited by balanced `open`/`close` characters that parses as JSON
fn balanced_span(text: &str, open: char, close: char) -> Option<Value> {
    let mut depth = 0usize;
    let mut start = None;

    for (index, ch) in text.char_indices() {
        if ch == open {
            if depth == 0 {
                start = Some(index);
            }
            depth += 1;
        } else if ch == close && depth > 0 {
            depth -= 1;
            if depth == 0 {
                if let Some(begin) = start.take() {
                    if let Ok(json) = serde_json::from_str::<Value>(&text[begin..=index]) {
                        return Some(json);
                    }
                }
            }
        }
    }

    None
}
