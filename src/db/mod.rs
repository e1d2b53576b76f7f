//! Database abstraction layer for Parley.
//!
//! Provides a trait-based interface for statement execution, allowing the
//! Postgres store to be swapped for mocks in tests.

mod mock;
mod postgres;
pub mod schema;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use schema::{Column, Schema, Table};
pub use types::{QueryResult, Row, Value};

use crate::config::StoreConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Connects to the configured store and returns a pooled client.
///
/// The pool is meant to be created once per process and shared; callers hold
/// it behind an `Arc` and drain it with [`DatabaseClient::close`] on
/// shutdown.
pub async fn connect(config: &StoreConfig) -> Result<Box<dyn DatabaseClient>> {
    let client = PostgresClient::connect(config).await?;
    Ok(Box::new(client))
}

/// Trait defining the interface for store clients.
///
/// All operations are async and return Results with ParleyError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes exactly one SQL statement string and returns column names
    /// plus rows.
    ///
    /// The statement is passed through unmodified; the store is the sole
    /// arbiter of its validity. Callers that accept model-generated text
    /// are expected to run the statement guard first.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the store connection, draining the pool.
    async fn close(&self) -> Result<()>;
}
