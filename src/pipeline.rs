//! The natural-language-to-SQL translation pipeline.
//!
//! Runs a question through prompt construction, completion, statement
//! extraction, the statement guard, and execution, then assembles the
//! outbound payload:
//!
//! `Received → Prompting → Completing → Extracting → Validating → Executing
//!  → Assembled | Failed`
//!
//! Each stage either advances or terminates the pipeline with an error
//! tagged with its stage of origin. No stage is retried: repeated model
//! sampling carries no idempotency guarantee, so a transient upstream
//! failure is the caller's to resubmit.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::db::{DatabaseClient, Schema};
use crate::error::ParleyError;
use crate::llm::{build_messages, extract_statement, CompletionClient};
use crate::response::{self, FailureBody, TranslationResponse};
use crate::safety::check_statement;

/// Pipeline stages, used to tag failures with their origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Composing the grounding prompt.
    Prompting,
    /// Waiting on the completion endpoint.
    Completing,
    /// Normalizing the raw completion into a candidate statement.
    Extracting,
    /// Checking the candidate against the read-only policy.
    Validating,
    /// Running the statement against the store.
    Executing,
}

impl Stage {
    /// Returns the stage name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompting => "prompting",
            Self::Completing => "completing",
            Self::Extracting => "extracting",
            Self::Validating => "validating",
            Self::Executing => "executing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A pipeline failure, tagged with the stage it originated from.
#[derive(Debug)]
pub struct PipelineError {
    /// Stage that terminated the pipeline.
    pub stage: Stage,
    /// The underlying error.
    pub source: ParleyError,
}

impl PipelineError {
    /// Converts the failure into the uniform outbound payload.
    pub fn failure_body(&self) -> FailureBody {
        FailureBody::new(self.source.to_string())
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (stage: {})", self.source, self.stage)
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// The translation pipeline.
///
/// Stateless per request: concurrent questions share only the completion
/// client and the pooled store connection.
pub struct Pipeline {
    completion: Box<dyn CompletionClient>,
    store: Arc<dyn DatabaseClient>,
    schema: Schema,
}

impl Pipeline {
    /// Creates a pipeline over the given completion client, store, and
    /// schema descriptor.
    pub fn new(
        completion: Box<dyn CompletionClient>,
        store: Arc<dyn DatabaseClient>,
        schema: Schema,
    ) -> Self {
        Self {
            completion,
            store,
            schema,
        }
    }

    /// Returns the schema descriptor the pipeline grounds prompts in.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Translates a question into SQL, executes it, and assembles the
    /// response.
    pub async fn ask(
        &self,
        question: &str,
    ) -> std::result::Result<TranslationResponse, PipelineError> {
        let started = Instant::now();

        // Prompting
        let messages = build_messages(&self.schema, question);
        debug!(question_len = question.len(), "Prompt composed");

        // Completing
        let completion = self
            .completion
            .complete(&messages)
            .await
            .map_err(|e| fail(question, Stage::Completing, e))?;
        debug!(
            model = %completion.model,
            completion_len = completion.text.len(),
            "Completion received"
        );

        // Extracting
        let sql = extract_statement(&completion.text)
            .map_err(|e| fail(question, Stage::Extracting, e))?;
        debug!(sql = %sql, "Candidate statement extracted");

        // Validating
        check_statement(&sql, &self.schema)
            .map_err(|e| fail(question, Stage::Validating, e))?;

        // Executing
        let result = self
            .store
            .execute_query(&sql)
            .await
            .map_err(|e| fail(question, Stage::Executing, e))?;

        info!(
            rows = result.row_count(),
            total_ms = started.elapsed().as_millis() as u64,
            "Translation complete"
        );

        Ok(response::assemble(sql, &result))
    }
}

/// Logs a stage failure with enough context to reproduce it, then tags it.
fn fail(question: &str, stage: Stage, source: ParleyError) -> PipelineError {
    error!(
        question = %question,
        stage = %stage,
        error = %source,
        "Translation pipeline failed"
    );
    PipelineError { stage, source }
}
