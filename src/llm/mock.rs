//! Mock completion client for testing.
//!
//! Provides deterministic responses based on input patterns.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Result;
use crate::llm::types::{Completion, Message};
use crate::llm::CompletionClient;

/// Mock completion client that returns canned SQL based on the question.
///
/// Used for unit testing without making real API calls. Calls are counted
/// so tests can assert whether the transport was touched at all.
#[derive(Debug, Default)]
pub struct MockCompletionClient {
    /// Custom response mappings (pattern -> response), checked first.
    custom_responses: Vec<(String, String)>,
    /// Number of complete() invocations.
    calls: AtomicUsize,
}

impl MockCompletionClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the question contains `pattern`, the mock returns `response`
    /// verbatim.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Returns how many completions have been requested.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Generates a mock response based on the question text.
    ///
    /// Default responses are fenced the way real models tend to answer even
    /// when told not to, so they exercise the extractor.
    fn mock_response(&self, input: &str) -> String {
        let input_lower = input.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if input_lower.contains("older than 40") {
            return "```sql\nSELECT * FROM sales WHERE Age > 40;\n```".to_string();
        }

        if input_lower.contains("how many") || input_lower.contains("count") {
            return "```sql\nSELECT COUNT(*) FROM sales;\n```".to_string();
        }

        if input_lower.contains("total") && input_lower.contains("amount") {
            return "```sql\nSELECT SUM(\"Total Amount\") FROM sales;\n```".to_string();
        }

        if input_lower.contains("category") {
            return "```sql\nSELECT \"Product Category\", COUNT(*) FROM sales GROUP BY \"Product Category\";\n```"
                .to_string();
        }

        "```sql\nSELECT * FROM sales;\n```".to_string()
    }

    /// Extracts the last user message content from a message list.
    fn extract_user_input(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == crate::llm::types::Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, messages: &[Message]) -> Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let input = Self::extract_user_input(messages);
        Ok(Completion::new(self.mock_response(&input), "mock"))
    }
}
