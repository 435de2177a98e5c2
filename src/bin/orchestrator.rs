//! Orchestrator Service
//!
//! Main service binary that runs one batch of value-transfer operations to
//! completion: prepares an operation per batch item, resolves burn/mint
//! steps through the attestation service, runs the merged authorization
//! pass, and tracks every operation concurrently.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin orchestrator -- --config orchestrator.toml --batch batch.json
//! ```
//!
//! Or set the config path via environment variable:
//!
//! ```bash
//! ORCHESTRATOR_CONFIG_PATH=orchestrator.toml cargo run --bin orchestrator -- --batch batch.json
//! ```
//!
//! The batch file is a JSON array of items:
//!
//! ```json
//! [{"label": "alice", "request": {"kind": "send", "destinationDomain": 6,
//!   "token": "0x...", "recipient": "0x...", "value": "250000"}}]
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use orchestrator::{
    account::HttpAccountBackend,
    config::OrchestratorConfig,
    crypto::IntentSigner,
    service::{BatchItem, BatchOrchestrator, ItemOutcome},
};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "orchestrator")]
#[command(about = "Cross-chain transfer orchestrator - prepares, signs, attests, and tracks operation batches")]
struct Args {
    /// Path to orchestrator configuration file (default: config/orchestrator.toml or ORCHESTRATOR_CONFIG_PATH env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Path to the batch description file (JSON array of batch items)
    #[arg(short, long)]
    batch: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments first (before initializing logging)
    let args = Args::parse();

    // Initialize structured logging
    tracing_subscriber::fmt::init();

    info!("Starting Orchestrator Service");

    // Load configuration
    // Priority: CLI arg > env var > default
    let config = if let Some(path) = args.config {
        info!("Loading configuration from: {}", path);
        OrchestratorConfig::load_from_path(Some(&path))?
    } else {
        if let Ok(path) = std::env::var("ORCHESTRATOR_CONFIG_PATH") {
            info!("Loading configuration from ORCHESTRATOR_CONFIG_PATH: {}", path);
        } else {
            info!("Loading configuration from default location");
        }
        OrchestratorConfig::load()?
    };

    info!("Configuration loaded successfully");
    info!("Control-plane URL: {}", config.service.control_plane_url);
    info!("Attestation URL: {}", config.service.attestation_url);
    info!("Account service URL: {}", config.service.account_service_url);
    info!(
        "Poll interval: {}s, finality timeout: {}s, tracking budget: {} attempt(s)",
        config.service.poll_interval_secs,
        config.service.finality_timeout_secs,
        config.service.max_track_attempts
    );
    for domain in &config.domain {
        info!("Known domain: {} (id {})", domain.name, domain.domain);
    }

    let signer = IntentSigner::from_config(&config.signer)
        .context("Failed to load intent signing key")?;
    info!(
        "Intent signer ready (public key 0x{})",
        hex::encode(signer.public_key())
    );

    let backend = Arc::new(
        HttpAccountBackend::new(
            &config.service.account_service_url,
            config.service.request_timeout(),
        )
        .context("Failed to create account backend")?,
    );

    let orchestrator = BatchOrchestrator::new(&config, backend, signer)
        .context("Failed to create batch orchestrator")?;

    // Load the batch description
    let batch_content = std::fs::read_to_string(&args.batch)
        .with_context(|| format!("Failed to read batch file: {}", args.batch))?;
    let items: Vec<BatchItem> =
        serde_json::from_str(&batch_content).context("Failed to parse batch file")?;
    info!("Loaded {} batch item(s) from {}", items.len(), args.batch);

    let report = orchestrator.run(items).await?;

    if let Some(estimate) = report.estimated_time_secs {
        info!("Worst-case completion estimate was {}s", estimate);
    }
    for item in &report.items {
        let operation = item.operation_id.as_deref().unwrap_or("-");
        match &item.outcome {
            ItemOutcome::Completed => {
                info!("Item '{}' completed (operation {})", item.label, operation);
            }
            ItemOutcome::TimedOut => {
                warn!(
                    "Item '{}' timed out (operation {}); it may still complete later",
                    item.label, operation
                );
            }
            outcome => {
                error!(
                    "Item '{}' did not complete (operation {}): {:?}",
                    item.label, operation, outcome
                );
            }
        }
    }

    report.ensure_completed()?;
    info!("All batch items completed");
    Ok(())
}
