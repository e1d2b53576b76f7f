//! OpenAI-compatible completion client.
//!
//! Implements the CompletionClient trait against any chat-completions API
//! that speaks the OpenAI wire format; the default endpoint is NVIDIA's
//! hosted service.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::{LlmConfig, API_KEY_ENV};
use crate::error::{ParleyError, Result};
use crate::llm::types::{Completion, Message};
use crate::llm::CompletionClient;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Completion client configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Base URL of the chat-completions API.
    pub base_url: String,
    /// API credential. `None` fails the request before any network call.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Sampling temperature; near zero keeps generated SQL stable across
    /// identical questions.
    pub temperature: f32,
    /// Cap on completion length, preventing runaway generation.
    pub max_tokens: u32,
}

impl OpenAiConfig {
    /// Creates a new config with the given base URL and model.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            model: model.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            temperature: 0.1,
            max_tokens: 150,
        }
    }

    /// Builds a config from settings plus the credential from the
    /// environment.
    pub fn from_settings(settings: &LlmConfig) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            api_key: LlmConfig::api_key_from_env(),
            model: settings.model.clone(),
            timeout_secs: settings.timeout_secs,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }

    /// Sets the API credential.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// OpenAI-compatible completion client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ParleyError::upstream(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Returns the chat-completions endpoint URL.
    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Converts internal messages to the wire format.
    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Parses an API error response into an upstream error.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> ParleyError {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return ParleyError::upstream(format!(
                "Authentication rejected by the completion endpoint. Check {API_KEY_ENV}."
            ));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return ParleyError::upstream("Rate limited by the completion endpoint.");
        }

        if let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(body) {
            return ParleyError::upstream(format!(
                "Completion endpoint error: {}",
                error_response.error.message
            ));
        }

        ParleyError::upstream(format!("Completion endpoint error ({}): {}", status, body))
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<Completion> {
        // Checked before anything touches the network.
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(ParleyError::config(format!(
                "{API_KEY_ENV} is not set; cannot reach the completion endpoint"
            )));
        };

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: Self::convert_messages(messages),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        };

        debug!(model = %self.config.model, "Sending completion request");

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ParleyError::upstream("Completion request timed out.")
                } else if e.is_connect() {
                    ParleyError::upstream(
                        "Failed to connect to the completion endpoint. Check your network.",
                    )
                } else {
                    ParleyError::upstream(format!("Completion request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ParleyError::upstream(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ParleyError::upstream(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| Completion::new(c.message.content, self.config.model.clone()))
            .ok_or_else(|| ParleyError::upstream("Completion returned no choices"))
    }
}

// Chat-completions wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}
