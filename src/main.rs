//! Parley - ask questions of a sales database in plain English.

mod cli;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, OutputFormat};
use db_parley::config::{Config, StoreConfig};
use db_parley::db::{self, DatabaseClient, MockDatabaseClient, Schema};
use db_parley::error::Result;
use db_parley::llm::{CompletionClient, MockCompletionClient, OpenAiClient, OpenAiConfig};
use db_parley::pipeline::Pipeline;
use db_parley::response::{TranslationRequest, TranslationResponse};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(code) = run().await {
        std::process::exit(code);
    }
}

async fn run() -> std::result::Result<(), i32> {
    let cli = Cli::parse_args();

    let format = match cli.parse_output_format() {
        Ok(format) => format,
        Err(e) => {
            error!("{e}");
            return Err(2);
        }
    };

    let request = TranslationRequest::new(cli.question_text());
    if let Err(e) = request.validate() {
        error!("{e}");
        return Err(2);
    }

    let config = match Config::load_from_file(&cli.config_path()) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return Err(2);
        }
    };

    let (completion, store) = match build_clients(&cli, &config).await {
        Ok(clients) => clients,
        Err(e) => {
            error!("{}: {}", e.category(), e);
            return Err(1);
        }
    };

    let pipeline = Pipeline::new(completion, Arc::clone(&store), Schema::sales());
    let outcome = pipeline.ask(&request.question).await;

    // Drain the pool before reporting, success or not.
    if let Err(e) = store.close().await {
        warn!("Failed to close store connection: {e}");
    }

    match outcome {
        Ok(response) => {
            print_response(&response, format);
            Ok(())
        }
        Err(e) => {
            match format {
                OutputFormat::Json => match serde_json::to_string_pretty(&e.failure_body()) {
                    Ok(body) => println!("{body}"),
                    Err(e) => error!("Failed to serialize failure body: {e}"),
                },
                OutputFormat::Text => eprintln!("{e}"),
            }
            Err(1)
        }
    }
}

/// Builds the completion client and the store client from CLI and config.
async fn build_clients(
    cli: &Cli,
    config: &Config,
) -> Result<(Box<dyn CompletionClient>, Arc<dyn DatabaseClient>)> {
    if cli.mock {
        info!("Using mock completion and store clients");
        return Ok((
            Box::new(MockCompletionClient::new()),
            Arc::new(MockDatabaseClient::new()),
        ));
    }

    let completion = OpenAiClient::new(OpenAiConfig::from_settings(&config.llm))?;

    let mut store_config = match &cli.database_url {
        Some(url) => StoreConfig::from_connection_string(url)?,
        None => config.store.clone(),
    };
    store_config.apply_env_defaults();

    info!("Connecting to {}", store_config.display_string());
    let store = db::connect(&store_config).await?;

    Ok((Box::new(completion), Arc::from(store)))
}

fn print_response(response: &TranslationResponse, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            match serde_json::to_string_pretty(response) {
                Ok(body) => println!("{body}"),
                Err(e) => error!("Failed to serialize response: {e}"),
            }
        }
        OutputFormat::Text => {
            println!("{}", response.preamble);
            println!();
            println!("SQL: {}", response.sql);
            println!();
            print_rows(&response.rows);
        }
    }
}

/// Renders rows as a simple aligned table.
fn print_rows(rows: &[serde_json::Map<String, serde_json::Value>]) {
    let Some(first) = rows.first() else {
        println!("(no rows)");
        return;
    };

    let columns: Vec<&String> = first.keys().collect();
    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();

    let rendered: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| cell_text(row.get(*column)))
                .collect()
        })
        .collect();

    for row in &rendered {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let header = columns
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{:width$}", column, width = widths[i]))
        .collect::<Vec<_>>()
        .join(" | ");
    println!("{header}");
    println!(
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    );

    for row in rendered {
        let line = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join(" | ");
        println!("{line}");
    }

    println!("({} rows)", rows.len());
}

fn cell_text(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => "NULL".to_string(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
