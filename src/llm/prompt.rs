//! Prompt construction for completion requests.
//!
//! Composes the grounding prompt from the schema descriptor and the user's
//! question. Pure functions, no side effects.

use crate::db::Schema;
use crate::llm::types::Message;

/// System instruction fixing the assistant's role.
pub const SYSTEM_PROMPT: &str = "You are a SQL expert. Convert natural language questions to SQL queries. Return only the SQL query without explanations or markdown formatting.";

/// Builds the user prompt embedding the schema DDL and the question.
///
/// The schema rendering must exactly match the live store's identifiers, or
/// the generated SQL will reference nonexistent columns.
pub fn build_user_prompt(schema: &Schema, question: &str) -> String {
    format!(
        "Convert the following question into a SQL query for a sales database with this schema:\n{}\nQuestion: {}\nReturn only the SQL query without any explanations.",
        schema.to_ddl(),
        question
    )
}

/// Builds the complete message list for a completion request.
pub fn build_messages(schema: &Schema, question: &str) -> Vec<Message> {
    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(build_user_prompt(schema, question)),
    ]
}
