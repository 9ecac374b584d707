// Leafdoc plant symptom triage
// Main entry point for the leafdoc binary

use clap::Parser;
use leafdoc_engine::cli::{Cli, Command};
use leafdoc_engine::config::Config;
use leafdoc_engine::handlers::{
    handle_analyze, handle_records, handle_secret, handle_seed, handle_serve, OutputFormat,
};
use leafdoc_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Pick up OPENROUTER_API_KEY and friends from .env
    dotenvy::dotenv().ok();

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // --log wins over the config file; RUST_LOG wins over both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("Leafdoc v{} ({} - {})", version, commit, timestamp);

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Handle commands
    match cli.command {
        Command::Serve { bind } => {
            tracing::info!("Starting HTTP adapter...");
            handle_serve(bind, &config).await
        }

        Command::Analyze { symptoms } => {
            tracing::debug!("Analyzing: {}", symptoms);
            handle_analyze(symptoms, &config, format).await
        }

        Command::Seed { file } => {
            tracing::info!("Seeding knowledge base...");
            handle_seed(file.as_deref(), &config, format).await
        }

        Command::Records { limit } => {
            tracing::debug!("Listing {} records", limit);
            handle_records(limit, &config, format).await
        }

        Command::Secret { action } => handle_secret(action),
    }
}
