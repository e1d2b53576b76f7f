//! Statement guard for model-generated SQL.
//!
//! Everything upstream of execution is untrusted model output. Before a
//! candidate statement reaches the store, the guard checks its leading
//! keyword against a read-only allow-list, rejects multi-statement input and
//! data-modifying CTEs, and verifies that referenced tables exist in the
//! schema descriptor.
//!
//! Text the parser cannot understand is NOT rejected here (beyond the
//! keyword check): the store stays the sole arbiter of syntax.

mod parser;

pub use parser::check_statement;

/// Leading keywords of statements the pipeline will pass to the store.
pub const ALLOWED_KEYWORDS: &[&str] = &["SELECT", "WITH"];

/// Returns the statement's leading keyword, uppercased.
pub(crate) fn leading_keyword(sql: &str) -> Option<String> {
    let word: String = sql
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();

    if word.is_empty() {
        None
    } else {
        Some(word.to_ascii_uppercase())
    }
}
