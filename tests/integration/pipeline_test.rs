//! End-to-end pipeline tests over mock clients.
//!
//! These exercise the full question → SQL → rows flow without a database
//! or a completion endpoint.

use std::sync::Arc;

use db_parley::db::{MockDatabaseClient, QueryResult, Schema, Value};
use db_parley::error::ParleyError;
use db_parley::llm::{MockCompletionClient, OpenAiClient, OpenAiConfig};
use db_parley::pipeline::{Pipeline, Stage};
use db_parley::response::PREAMBLE;

/// A five-row fixture, three of which have Age > 40.
fn age_filter_fixture() -> QueryResult {
    let columns = vec![
        "Transaction ID".to_string(),
        "Customer ID".to_string(),
        "Age".to_string(),
    ];
    let rows = vec![
        vec![Value::Int(2), Value::String("CUST002".into()), Value::Int(51)],
        vec![Value::Int(3), Value::String("CUST003".into()), Value::Int(64)],
        vec![Value::Int(5), Value::String("CUST005".into()), Value::Int(42)],
    ];
    QueryResult::with_data(columns, rows)
}

#[tokio::test]
async fn test_age_filter_question_end_to_end() {
    let store = MockDatabaseClient::new().with_result("age > 40", age_filter_fixture());
    let pipeline = Pipeline::new(
        Box::new(MockCompletionClient::new()),
        Arc::new(store),
        Schema::sales(),
    );

    let response = pipeline
        .ask("How many transactions happened for customers older than 40?")
        .await
        .unwrap();

    // The generated SQL is a SELECT against sales filtering on age.
    assert!(response.sql.to_uppercase().starts_with("SELECT"));
    assert!(response.sql.contains("sales"));
    assert!(response.sql.contains("Age > 40"));

    // Three of the five fixture rows match.
    assert_eq!(response.rows.len(), 3);
    assert_eq!(response.preamble, PREAMBLE);
    assert_eq!(response.rows[0]["Age"], serde_json::json!(51));
}

#[tokio::test]
async fn test_rows_preserve_store_column_order() {
    let store = MockDatabaseClient::new().with_result("age > 40", age_filter_fixture());
    let pipeline = Pipeline::new(
        Box::new(MockCompletionClient::new()),
        Arc::new(store),
        Schema::sales(),
    );

    let response = pipeline
        .ask("Which customers are older than 40?")
        .await
        .unwrap();

    let keys: Vec<&String> = response.rows[0].keys().collect();
    assert_eq!(keys, vec!["Transaction ID", "Customer ID", "Age"]);
}

#[tokio::test]
async fn test_completion_transport_called_exactly_once() {
    let completion = Arc::new(MockCompletionClient::new());
    let pipeline = Pipeline::new(
        Box::new(Arc::clone(&completion)),
        Arc::new(MockDatabaseClient::new()),
        Schema::sales(),
    );

    pipeline.ask("How many transactions are there?").await.unwrap();

    // One attempt, no pipeline-level retries.
    assert_eq!(completion.calls(), 1);
}

#[tokio::test]
async fn test_missing_credential_fails_before_any_call() {
    // Unroutable endpoint: reaching the network would yield an upstream
    // error rather than a configuration error.
    let completion =
        OpenAiClient::new(OpenAiConfig::new("http://127.0.0.1:9/v1", "test-model")).unwrap();
    let store = Arc::new(MockDatabaseClient::new());
    let pipeline = Pipeline::new(Box::new(completion), store.clone(), Schema::sales());

    let err = pipeline.ask("How many sales were there?").await.unwrap_err();

    assert_eq!(err.stage, Stage::Completing);
    assert!(matches!(err.source, ParleyError::Config(_)));

    // The store was never touched either.
    assert!(store.executed().is_empty());
}

#[tokio::test]
async fn test_generated_mutation_never_reaches_store() {
    let completion = MockCompletionClient::new()
        .with_response("clean up", "```sql\nDELETE FROM sales WHERE Age > 40;\n```");
    let store = Arc::new(MockDatabaseClient::new());
    let pipeline = Pipeline::new(Box::new(completion), store.clone(), Schema::sales());

    let err = pipeline.ask("Please clean up old customers").await.unwrap_err();

    assert_eq!(err.stage, Stage::Validating);
    assert!(matches!(err.source, ParleyError::Execution(_)));
    assert!(store.executed().is_empty());
}

#[tokio::test]
async fn test_unknown_table_never_reaches_store() {
    let completion = MockCompletionClient::new()
        .with_response("customer emails", "SELECT email FROM customers;");
    let store = Arc::new(MockDatabaseClient::new());
    let pipeline = Pipeline::new(Box::new(completion), store.clone(), Schema::sales());

    let err = pipeline.ask("List all customer emails").await.unwrap_err();

    assert_eq!(err.stage, Stage::Validating);
    assert!(err.source.to_string().contains("customers"));
    assert!(store.executed().is_empty());
}

#[tokio::test]
async fn test_empty_completion_is_a_distinct_error() {
    let completion = MockCompletionClient::new().with_response("say nothing", "  \n ");
    let store = Arc::new(MockDatabaseClient::new());
    let pipeline = Pipeline::new(Box::new(completion), store.clone(), Schema::sales());

    let err = pipeline.ask("Say nothing at all").await.unwrap_err();

    // "Model refused" is distinguishable from "store rejected".
    assert_eq!(err.stage, Stage::Extracting);
    assert!(matches!(err.source, ParleyError::EmptyStatement(_)));
    assert!(store.executed().is_empty());
}

#[tokio::test]
async fn test_failure_body_shape() {
    let completion = MockCompletionClient::new().with_response("say nothing", "");
    let pipeline = Pipeline::new(
        Box::new(completion),
        Arc::new(MockDatabaseClient::new()),
        Schema::sales(),
    );

    let err = pipeline.ask("Say nothing at all").await.unwrap_err();
    let body = err.failure_body();

    assert_eq!(body.error, "Failed to process query");
    let message = body.message.unwrap();
    assert!(message.contains("Empty statement"));
}

#[tokio::test]
async fn test_executed_sql_matches_reported_sql() {
    let store = Arc::new(MockDatabaseClient::new());
    let pipeline = Pipeline::new(
        Box::new(MockCompletionClient::new()),
        store.clone(),
        Schema::sales(),
    );

    let response = pipeline.ask("Show me everything").await.unwrap();

    // The SQL in the payload is exactly what ran against the store.
    assert_eq!(store.executed(), vec![response.sql.clone()]);
}
