//! Centralized UI formatting and color utilities
//!
//! Colors, icons and small text helpers shared by the CLI output.

use colored::{ColoredString, Colorize};

use crate::validation::Severity;

/// Check if quiet mode is enabled via environment variable or --quiet flag
pub fn is_quiet() -> bool {
    std::env::var("SHEETWRIGHT_QUIET")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Colored icon for an issue severity: ✗ (red) for errors, ⚠ (yellow) for warnings
pub fn severity_icon(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "✗".red(),
        Severity::Warning => "⚠".yellow(),
    }
}

/// Color scheme for text output
pub mod colors {
    use colored::{ColoredString, Colorize};

    /// Green for success
    pub fn success(text: &str) -> ColoredString {
        text.green()
    }

    /// Yellow for warnings
    pub fn warning(text: &str) -> ColoredString {
        text.yellow()
    }

    /// Red for errors
    pub fn error(text: &str) -> ColoredString {
        text.red()
    }

    /// Dimmed for secondary text
    pub fn secondary(text: &str) -> ColoredString {
        text.dimmed()
    }
}

/// Common text formatting patterns
pub mod format {
    /// Truncate a cell to `max_len` characters
    pub fn truncate(text: &str, max_len: usize) -> String {
        if text.chars().count() <= max_len {
            text.to_string()
        } else {
            let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
            format!("{}...", kept)
        }
    }

    /// Format a separator line for sections
    pub fn separator(width: usize) -> String {
        "─".repeat(width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_severity_icon() {
        colored::control::set_override(false);
        assert_eq!(severity_icon(Severity::Error).to_string(), "✗");
        assert_eq!(severity_icon(Severity::Warning).to_string(), "⚠");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(format::truncate("short", 10), "short");
        assert_eq!(format::truncate("exactly ten", 11), "exactly ten");
        assert_eq!(format::truncate("this is a very long cell", 10), "this is...");
        assert_eq!(format::truncate("ünïcödé text", 6), "ünï...");
    }

    #[test]
    fn test_separator() {
        assert_eq!(format::separator(5), "─────");
    }

    #[test]
    #[serial]
    fn test_is_quiet() {
        std::env::remove_var("SHEETWRIGHT_QUIET");
        assert!(!is_quiet());
        std::env::set_var("SHEETWRIGHT_QUIET", "TRUE");
        assert!(is_quiet());
        std::env::remove_var("SHEETWRIGHT_QUIET");
    }
}
