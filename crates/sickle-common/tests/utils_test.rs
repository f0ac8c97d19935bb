//! Tests for the message text helpers used across Sickle.

use sickle_common::utils::*;
use sickle_common::{ChannelId, SickleError};
use std::io;

#[test]
fn test_chunks_reassemble_to_truncated_input() {
    let text: String = "lorem ipsum ✓ ".repeat(600);
    let truncated = truncate_chars(&text, 5700);
    let chunks = chunk_chars(truncated, 1023);

    assert_eq!(chunks.len(), 6);
    assert!(chunks.iter().all(|c| c.chars().count() <= 1023));
    assert_eq!(chunks.concat(), truncated);
}

#[test]
fn test_defused_report_keeps_surrounding_text() {
    let report = format!("```\n{}\n```", defuse_code_fences("panic at ```foo```"));
    assert_eq!(report.matches("```").count(), 2);
    assert!(report.contains("panic at"));
}

#[test]
fn test_unset_ids_and_errors() {
    assert!(!ChannelId(0).is_set());
    let err: SickleError = io::Error::new(io::ErrorKind::NotFound, "logs").into();
    assert!(err.to_string().starts_with("I/O error"));
}
