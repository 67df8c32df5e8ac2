//! Common helper functions for output formatting.

use owo_colors::OwoColorize;

/// Truncates an ID to 8 characters for display.
pub fn truncate_id(id: &str) -> String {
    id.chars().take(8).collect()
}

/// Truncates a string to a maximum number of characters.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        s.to_string()
    }
}

/// Pass/fail marker.
pub fn status_mark(passed: bool, use_colors: bool) -> String {
    match (passed, use_colors) {
        (true, true) => "✓".green().to_string(),
        (false, true) => "✗".red().to_string(),
        (true, false) => "✓".to_string(),
        (false, false) => "✗".to_string(),
    }
}

/// Dims secondary text when colors are on.
pub fn dimmed(s: &str, use_colors: bool) -> String {
    if use_colors {
        s.dimmed().to_string()
    } else {
        s.to_string()
    }
}

/// Bold text when colors are on.
pub fn bold(s: &str, use_colors: bool) -> String {
    if use_colors {
        s.bold().to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_id() {
        assert_eq!(truncate_id("0f8fad5b-d9cb-469f-a165-70867728950e"), "0f8fad5b");
        assert_eq!(truncate_id("short"), "short");
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn test_plain_helpers() {
        assert_eq!(status_mark(true, false), "✓");
        assert_eq!(status_mark(false, false), "✗");
        assert_eq!(dimmed("x", false), "x");
        assert_eq!(bold("x", false), "x");
    }
}
