//! Boundary payloads for the translation pipeline.
//!
//! The response assembler combines the fixed preamble, the normalized SQL
//! text, and the query result into the outbound payload. Pure composition;
//! it only forwards already-validated inputs and never fails on its own.

use serde::{Deserialize, Serialize};

use crate::db::QueryResult;
use crate::error::{ParleyError, Result};

/// Fixed human-readable preamble for successful translations.
pub const PREAMBLE: &str = "Here is the data for your query:";

/// An inbound translation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    /// The free-form question about the sales data.
    #[serde(rename = "query")]
    pub question: String,
}

impl TranslationRequest {
    /// Creates a request for the given question.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }

    /// Rejects empty questions before the pipeline starts.
    pub fn validate(&self) -> Result<()> {
        if self.question.trim().is_empty() {
            return Err(ParleyError::config(
                "Query parameter is required and must be a non-empty string",
            ));
        }
        Ok(())
    }
}

/// Terminal success payload returned to the caller. Not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationResponse {
    /// Natural-language acknowledgement.
    #[serde(rename = "response")]
    pub preamble: String,

    /// The executed SQL, returned for transparency.
    #[serde(rename = "sqlQuery")]
    pub sql: String,

    /// Result rows as ordered column-name → value mappings.
    #[serde(rename = "data")]
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Uniform failure payload.
#[derive(Debug, Clone, Serialize)]
pub struct FailureBody {
    /// Fixed failure summary.
    pub error: String,

    /// Stage-specific error kind and detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FailureBody {
    /// Creates a failure body with the given detail message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: "Failed to process query".to_string(),
            message: Some(message.into()),
        }
    }
}

/// Packages the SQL text and query result into the outbound payload.
pub fn assemble(sql: impl Into<String>, result: &QueryResult) -> TranslationResponse {
    TranslationResponse {
        preamble: PREAMBLE.to_string(),
        sql: sql.into(),
        rows: result.row_objects(),
    }
}
