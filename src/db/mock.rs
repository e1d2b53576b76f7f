//! Mock store clients for testing.
//!
//! Provide canned query results without a running database.

use super::{DatabaseClient, QueryResult, Value};
use crate::error::{ParleyError, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// A mock store client that returns predefined results.
///
/// Statements are matched against registered patterns (case-insensitive
/// substring); unmatched SELECTs get a generic single-row result. Every
/// executed statement is recorded for assertions.
#[derive(Default)]
pub struct MockDatabaseClient {
    canned: Vec<(String, QueryResult)>,
    executed: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a new mock store client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a canned result for statements containing `pattern`.
    pub fn with_result(mut self, pattern: impl Into<String>, result: QueryResult) -> Self {
        self.canned.push((pattern.into(), result));
        self
    }

    /// Returns the statements executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.executed.lock().unwrap().push(sql.to_string());

        let sql_lower = sql.to_lowercase();
        for (pattern, result) in &self.canned {
            if sql_lower.contains(&pattern.to_lowercase()) {
                return Ok(result.clone());
            }
        }

        if sql_lower.trim_start().starts_with("select") {
            Ok(QueryResult {
                columns: vec!["result".to_string()],
                rows: vec![vec![Value::String(format!("Mock result for: {}", sql))]],
                execution_time: Duration::from_millis(1),
            })
        } else {
            Ok(QueryResult {
                columns: vec![],
                rows: vec![],
                execution_time: Duration::from_millis(1),
            })
        }
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A store client whose every execution fails.
///
/// Used to exercise the pipeline's failure path.
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    /// Creates a failing client that reports the given store message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for FailingDatabaseClient {
    fn default() -> Self {
        Self::new("ERROR: relation \"sales\" does not exist")
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(ParleyError::execution(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
