//! Text helpers for building Discord messages.
//!
//! Discord limits are counted in characters, so everything here slices on
//! `char` boundaries rather than bytes.

use chrono::{DateTime, Utc};

/// Zero-width space, used for blank embed field names and fence defusing.
pub const ZERO_WIDTH_SPACE: char = '\u{200b}';

/// Formats a timestamp for display.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Returns at most `max_chars` characters of `input`.
pub fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

/// Truncates a string to a maximum length, marking the cut with an ellipsis.
pub fn truncate_with_ellipsis(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        input.to_string()
    } else {
        format!("{}...", truncate_chars(input, max_chars.saturating_sub(3)))
    }
}

/// Splits `input` into consecutive pieces of at most `size` characters.
///
/// An empty input yields no chunks.
pub fn chunk_chars(input: &str, size: usize) -> Vec<String> {
    if size == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;
    for c in input.chars() {
        current.push(c);
        count += 1;
        if count == size {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Breaks up triple backticks so text can be embedded in a code block.
pub fn defuse_code_fences(input: &str) -> String {
    input.replace(
        "```",
        &format!("`{ZERO_WIDTH_SPACE}`{ZERO_WIDTH_SPACE}`"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(format_timestamp(timestamp), "2024-01-01 12:00:00 UTC");
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        let input = "This is a very long string that should be truncated";
        assert_eq!(truncate_with_ellipsis(input, 20), "This is a very lo...");
        assert_eq!(truncate_with_ellipsis("Short", 20), "Short");
    }

    #[test]
    fn test_chunk_chars() {
        let chunks = chunk_chars(&"a".repeat(2500), 1023);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 1023);
        assert_eq!(chunks[2].len(), 2500 - 2 * 1023);
        assert!(chunk_chars("", 1023).is_empty());
    }

    #[test]
    fn test_defuse_code_fences() {
        let defused = defuse_code_fences("before ```rust\ncode``` after");
        assert!(!defused.contains("```"));
        assert_eq!(defused.matches(ZERO_WIDTH_SPACE).count(), 4);
    }
}
