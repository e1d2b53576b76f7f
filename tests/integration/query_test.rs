//! Statement execution integration tests.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL environment variable to run them; they are skipped
//! otherwise.

use std::sync::Arc;
use std::sync::OnceLock;

use tokio::sync::Mutex;

use db_parley::config::StoreConfig;
use db_parley::db::{DatabaseClient, PostgresClient, Schema, Value};
use db_parley::error::ParleyError;
use db_parley::llm::MockCompletionClient;
use db_parley::pipeline::Pipeline;

/// Serializes tests that rebuild the shared `sales` table.
fn sales_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Helper to create a test client.
async fn get_test_client() -> Option<PostgresClient> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let config = StoreConfig::from_connection_string(&url).ok()?;
    PostgresClient::connect(&config).await.ok()
}

/// A seed row for the sales fixture table.
struct SeedRow {
    transaction_id: i64,
    date: &'static str,
    customer_id: &'static str,
    gender: &'static str,
    age: i64,
    category: &'static str,
    quantity: i64,
    price_per_unit: i64,
    total_amount: i64,
}

/// Drops and recreates the sales table from the schema descriptor's DDL,
/// then inserts the given rows.
async fn reset_sales(client: &PostgresClient, rows: &[SeedRow]) {
    client
        .execute_query("DROP TABLE IF EXISTS sales")
        .await
        .unwrap();
    client
        .execute_query(&Schema::sales().to_ddl())
        .await
        .unwrap();

    for row in rows {
        let insert = format!(
            "INSERT INTO sales VALUES ({}, '{}', '{}', '{}', {}, '{}', {}, {}, {})",
            row.transaction_id,
            row.date,
            row.customer_id,
            row.gender,
            row.age,
            row.category,
            row.quantity,
            row.price_per_unit,
            row.total_amount,
        );
        client.execute_query(&insert).await.unwrap();
    }
}

async fn drop_sales(client: &PostgresClient) {
    let _ = client.execute_query("DROP TABLE IF EXISTS sales").await;
}

#[tokio::test]
async fn test_count_on_seeded_sales() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let _guard = sales_lock().lock().await;

    reset_sales(
        &client,
        &[
            SeedRow {
                transaction_id: 1,
                date: "2023-05-01",
                customer_id: "CUST001",
                gender: "Male",
                age: 34,
                category: "Beauty",
                quantity: 3,
                price_per_unit: 50,
                total_amount: 150,
            },
            SeedRow {
                transaction_id: 2,
                date: "2023-05-02",
                customer_id: "CUST002",
                gender: "Female",
                age: 26,
                category: "Clothing",
                quantity: 2,
                price_per_unit: 500,
                total_amount: 1000,
            },
        ],
    )
    .await;

    let result = client
        .execute_query("SELECT COUNT(*) FROM sales")
        .await
        .unwrap();

    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0][0], Value::Int(2));

    drop_sales(&client).await;
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_store_syntax_error_surfaces_native_message() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    // The executor imposes no statement-type restriction itself; the store
    // rejects the typo with its own message.
    let result = client.execute_query("SELEKT 1").await;

    let error = result.unwrap_err();
    assert!(matches!(error, ParleyError::Execution(_)));
    let message = error.to_string();
    assert!(
        message.to_lowercase().contains("syntax") || message.contains("SELEKT"),
        "expected the store's native message, got: {message}"
    );

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_age_filter_question_against_live_store() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let _guard = sales_lock().lock().await;

    // Five rows, three with Age > 40.
    reset_sales(
        &client,
        &[
            SeedRow {
                transaction_id: 1,
                date: "2023-05-01",
                customer_id: "CUST001",
                gender: "Male",
                age: 34,
                category: "Beauty",
                quantity: 3,
                price_per_unit: 50,
                total_amount: 150,
            },
            SeedRow {
                transaction_id: 2,
                date: "2023-05-02",
                customer_id: "CUST002",
                gender: "Female",
                age: 51,
                category: "Clothing",
                quantity: 2,
                price_per_unit: 500,
                total_amount: 1000,
            },
            SeedRow {
                transaction_id: 3,
                date: "2023-05-03",
                customer_id: "CUST003",
                gender: "Male",
                age: 64,
                category: "Electronics",
                quantity: 1,
                price_per_unit: 30,
                total_amount: 30,
            },
            SeedRow {
                transaction_id: 4,
                date: "2023-05-04",
                customer_id: "CUST004",
                gender: "Female",
                age: 19,
                category: "Beauty",
                quantity: 4,
                price_per_unit: 25,
                total_amount: 100,
            },
            SeedRow {
                transaction_id: 5,
                date: "2023-05-05",
                customer_id: "CUST005",
                gender: "Male",
                age: 42,
                category: "Clothing",
                quantity: 1,
                price_per_unit: 300,
                total_amount: 300,
            },
        ],
    )
    .await;

    let client = Arc::new(client);
    let pipeline = Pipeline::new(
        Box::new(MockCompletionClient::new()),
        client.clone(),
        Schema::sales(),
    );

    let response = pipeline
        .ask("How many transactions happened for customers older than 40?")
        .await
        .unwrap();

    assert!(response.sql.to_uppercase().starts_with("SELECT"));
    assert!(response.sql.contains("sales"));
    assert!(response.sql.contains("Age > 40"));
    assert_eq!(response.rows.len(), 3);

    // Rows carry the live store's exact column names.
    assert!(response.rows[0].contains_key("Transaction ID"));
    assert!(response.rows[0].contains_key("age"));

    drop_sales(&client).await;
    client.close().await.unwrap();
}
