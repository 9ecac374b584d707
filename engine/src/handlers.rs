//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - serve: Run the HTTP adapter
//! - analyze: Run one utterance through the pipeline
//! - seed: Seed an empty knowledge base
//! - records: List catalogued symptoms
//! - secret: Manage the OpenRouter API key

use anyhow::{Context, Result};
use sdk::types::ResponsePayload;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use crate::cli::SecretAction;
use crate::config::Config;
use crate::db::{load_seed, Database};
use crate::llm::build_oracle;
use crate::secrets::{SecretManager, OPENROUTER_KEY};
use crate::triage::{TriagePipeline, TriageSettings};

/// Keychain service name
pub const KEYCHAIN_SERVICE: &str = "leafdoc";

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Everything a request needs, built once per process
pub struct Runtime {
    pub database: Database,
    pub pipeline: Arc<TriagePipeline>,
    pub oracle_name: String,
}

/// Open the knowledge base, seed it if empty and build the pipeline.
///
/// The API key is resolved here; a missing key stops startup.
pub async fn bootstrap(config: &Config) -> Result<Runtime> {
    let database = open_seeded(config, config.core.seed_path.as_deref()).await?;

    let secrets = SecretManager::new(KEYCHAIN_SERVICE);
    let oracle = build_oracle(&config.oracle, &secrets).context("Failed to build AI oracle")?;
    let oracle_name = oracle.name().to_string();
    tracing::info!(
        "Using {} oracle ({})",
        oracle_name,
        if oracle.is_local() { "local" } else { "remote" }
    );

    let pipeline = Arc::new(TriagePipeline::new(
        oracle,
        Arc::new(database.symptoms()),
        TriageSettings::from(&config.oracle),
    ));

    Ok(Runtime {
        database,
        pipeline,
        oracle_name,
    })
}

/// Open the database and seed it from `seed_path` (or the bundled seed) when empty
async fn open_seeded(config: &Config, seed_path: Option<&Path>) -> Result<Database> {
    let database = Database::new(&config.database_path())
        .await
        .context("Failed to open database")?;

    let records = load_seed(seed_path)
        .await
        .context("Failed to load seed data")?;
    let inserted = database
        .symptoms()
        .seed_if_empty(&records)
        .await
        .context("Failed to seed knowledge base")?;

    if inserted > 0 {
        tracing::info!("Seeded knowledge base with {} records", inserted);
    }

    Ok(database)
}

/// Run the HTTP adapter until Ctrl-C
pub async fn handle_serve(bind: Option<String>, config: &Config) -> Result<()> {
    let runtime = bootstrap(config).await?;

    let mut server_config = config.server.clone();
    if let Some(bind) = bind {
        server_config.bind_addr = bind;
    }

    crate::server::serve(runtime.pipeline, &runtime.oracle_name, &server_config)
        .await
        .context("HTTP server failed")?;

    runtime.database.close().await
}

/// Analyze one utterance and print the payload
pub async fn handle_analyze(symptoms: String, config: &Config, format: OutputFormat) -> Result<()> {
    let runtime = bootstrap(config).await?;
    let payload = runtime.pipeline.analyze(&symptoms).await;

    match format {
        OutputFormat::Text => print_payload(&payload),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&payload)?),
    }

    runtime.database.close().await?;

    match payload.failure_class() {
        Some(class) => Err(anyhow::anyhow!(
            "Analysis failed with status {}",
            class.status_code()
        )),
        None => Ok(()),
    }
}

fn print_payload(payload: &ResponsePayload) {
    match payload {
        ResponsePayload::Message { message, .. } => println!("{}", message),
        ResponsePayload::Diagnosis { diagnosis, .. } => {
            println!("Diagnosis: {}", diagnosis.disease);
            println!("  Source:     {:?}", diagnosis.source);
            println!("  Organic:    {}", diagnosis.organic);
            println!("  Chemical:   {}", diagnosis.chemical);
            println!("  Prevention: {}", diagnosis.prevention);
        }
        ResponsePayload::Error { error, .. } => println!("✗ {}", error),
    }
}

/// Seed an empty knowledge base and report how many rows were added
pub async fn handle_seed(file: Option<&Path>, config: &Config, format: OutputFormat) -> Result<()> {
    let database = Database::new(&config.database_path())
        .await
        .context("Failed to open database")?;
    let repo = database.symptoms();

    let seed_path = file.or(config.core.seed_path.as_deref());
    let records = load_seed(seed_path)
        .await
        .context("Failed to load seed data")?;
    let inserted = repo
        .seed_if_empty(&records)
        .await
        .context("Failed to seed knowledge base")?;
    let total = repo.count().await.context("Failed to count records")?;

    match format {
        OutputFormat::Text => {
            if inserted == 0 {
                println!("Knowledge base already holds {} records; nothing seeded", total);
            } else {
                println!("✓ Seeded {} records", inserted);
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "inserted": inserted,
                "total": total
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    database.close().await
}

/// List catalogued symptoms
pub async fn handle_records(limit: usize, config: &Config, format: OutputFormat) -> Result<()> {
    let database = open_seeded(config, config.core.seed_path.as_deref()).await?;

    let records = database
        .symptoms()
        .list(limit as i64)
        .await
        .context("Failed to list records")?;

    match format {
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No records in knowledge base");
            } else {
                println!("Knowledge base (first {} records):", limit);
                println!();
                for record in &records {
                    println!("{}", record.symptom);
                    println!("  Disease: {}", record.disease);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "records": records,
                "count": records.len(),
                "limit": limit
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    database.close().await
}

/// Store or remove the OpenRouter API key
pub fn handle_secret(action: SecretAction) -> Result<()> {
    let secrets = SecretManager::new(KEYCHAIN_SERVICE);

    match action {
        SecretAction::Set { value } => {
            secrets
                .set_secret(OPENROUTER_KEY, &value)
                .context("Failed to store API key")?;
            println!("✓ API key stored in keychain");
        }
        SecretAction::Delete => {
            secrets
                .delete_secret(OPENROUTER_KEY)
                .context("Failed to delete API key")?;
            println!("✓ API key removed from keychain");
        }
    }

    Ok(())
}
