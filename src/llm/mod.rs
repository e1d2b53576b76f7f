//! Completion endpoint integration for Parley.
//!
//! Provides the trait and implementations for turning a composed prompt into
//! raw model output.

pub mod extract;
pub mod mock;
pub mod openai;
pub mod prompt;
pub mod types;

pub use extract::extract_statement;
pub use mock::MockCompletionClient;
pub use openai::{OpenAiClient, OpenAiConfig};
pub use prompt::{build_messages, build_user_prompt, SYSTEM_PROMPT};
pub use types::{Completion, Message, Role};

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;

/// Trait for clients that can generate completions.
///
/// Implementations must be thread-safe (Send + Sync) so concurrent
/// translation requests can share one client.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends the messages to the completion endpoint and returns the first
    /// choice's text.
    ///
    /// A single attempt: transient upstream failures are not retried here,
    /// they propagate to the caller.
    async fn complete(&self, messages: &[Message]) -> Result<Completion>;
}

#[async_trait]
impl<T: CompletionClient + ?Sized> CompletionClient for Arc<T> {
    async fn complete(&self, messages: &[Message]) -> Result<Completion> {
        (**self).complete(messages).await
    }
}
