//! Statement extraction from raw completion text.
//!
//! Models are instructed to return bare SQL, but in practice completions
//! arrive wrapped in markdown fences or surrounded by prose. This module
//! normalizes the raw text down to a single candidate statement.
//!
//! The candidate is still untrusted: nothing here validates SQL, it only
//! isolates the statement-like substring. The store remains the sole arbiter
//! of whether the text is executable.

use crate::error::{ParleyError, Result};

/// Keywords a SQL statement can start with.
///
/// Used only to locate where a statement begins inside surrounding prose,
/// not to decide whether it is allowed to run.
const LEADING_KEYWORDS: &[&str] = &[
    "SELECT", "WITH", "INSERT", "UPDATE", "DELETE", "EXPLAIN", "SHOW", "CREATE", "DROP", "ALTER",
    "TRUNCATE", "GRANT", "REVOKE", "MERGE",
];

/// Extracts the first statement-like substring from raw completion text.
///
/// Tolerates markdown code fences, leading/trailing prose the model ignored
/// its instructions about, and trailing semicolons. Idempotent: normalizing
/// an already-normalized statement yields the same statement.
///
/// Returns `EmptyStatement` when nothing non-whitespace remains, so callers
/// can distinguish "model refused" from "store rejected".
pub fn extract_statement(raw: &str) -> Result<String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ParleyError::empty_statement(
            "completion contained no SQL",
        ));
    }

    let candidate = extract_code_block(text, "sql")
        .or_else(|| extract_code_block(text, ""))
        .unwrap_or_else(|| text.to_string());

    let statement = strip_surrounding_prose(candidate.trim()).trim().to_string();

    if statement.is_empty() {
        return Err(ParleyError::empty_statement(
            "completion contained no SQL",
        ));
    }

    Ok(statement)
}

/// Extracts content from a markdown code block with the specified language.
///
/// Pass an empty string for `lang` to match blocks without a language
/// specifier.
fn extract_code_block(text: &str, lang: &str) -> Option<String> {
    let fence = format!("```{}", lang);
    let start_idx = text.find(&fence)?;
    let after_fence = start_idx + fence.len();

    let newline_rel = text[after_fence..].find('\n')?;

    // A bare fence followed by text before the newline is a language block,
    // not a generic one.
    if lang.is_empty() && !text[after_fence..after_fence + newline_rel].trim().is_empty() {
        return None;
    }

    let content_start = after_fence + newline_rel + 1;
    let end_rel = text[content_start..].find("```")?;

    Some(text[content_start..content_start + end_rel].to_string())
}

/// Trims prose around the first statement-like substring.
///
/// The statement starts at the first line opening with a SQL keyword (or,
/// failing that, the first keyword anywhere in the text) and runs through
/// the first terminating semicolon, or to the end when there is none. Text
/// with no recognizable keyword is returned unchanged so the store can
/// reject it itself.
fn strip_surrounding_prose(text: &str) -> &str {
    let Some(start) = find_statement_start(text) else {
        return text;
    };

    let tail = &text[start..];
    match tail.find(';') {
        Some(semi) => &tail[..=semi],
        None => tail,
    }
}

/// Finds the byte offset where the statement begins.
fn find_statement_start(text: &str) -> Option<usize> {
    // Prefer a line that opens with a keyword; prose rarely does.
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed_start = offset + (line.len() - line.trim_start().len());
        if let Some(first_word) = line.trim_start().split_whitespace().next() {
            if is_leading_keyword(first_word) {
                return Some(trimmed_start);
            }
        }
        offset += line.len();
    }

    // Fall back to the first keyword anywhere, e.g. "Sure: SELECT 1".
    let upper = text.to_ascii_uppercase();
    let bytes = upper.as_bytes();
    let mut best: Option<usize> = None;
    for keyword in LEADING_KEYWORDS {
        let mut from = 0;
        while let Some(pos) = upper[from..].find(*keyword) {
            let start = from + pos;
            let end = start + keyword.len();
            let bounded_before =
                start == 0 || (!bytes[start - 1].is_ascii_alphanumeric() && bytes[start - 1] != b'_');
            let bounded_after =
                end == upper.len() || (!bytes[end].is_ascii_alphanumeric() && bytes[end] != b'_');
            if bounded_before && bounded_after {
                if best.map_or(true, |b| start < b) {
                    best = Some(start);
                }
                break;
            }
            from = end;
        }
    }
    best
}

fn is_leading_keyword(word: &str) -> bool {
    let cleaned = word.trim_end_matches(|c: char| !c.is_ascii_alphanumeric());
    LEADING_KEYWORDS
        .iter()
        .any(|kw| cleaned.eq_ignore_ascii_case(kw))
}
