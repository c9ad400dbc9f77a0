//! Fraud Check - Main Entry Point
//!
//! Loads the model and encoder artifacts, then serves the check form and
//! prediction history over HTTP.

use anyhow::{Context, Result};
use fraud_check::{
    config::AppConfig,
    history::PredictionLog,
    metrics::{MetricsReporter, PipelineMetrics},
    models::ArtifactLoader,
    web, FraudService,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    init_tracing(&config)?;
    info!("Starting Fraud Check");
    info!(
        model = %config.artifacts.model_path,
        encoder = %config.artifacts.encoder_path,
        log = %config.history.log_path,
        "Configuration loaded successfully"
    );

    // Initialize metrics
    let metrics = Arc::new(PipelineMetrics::new());

    // Artifacts are required; there is no fallback model
    let artifacts =
        ArtifactLoader::load(&config.artifacts).context("Failed to load model artifacts")?;
    info!(model = %artifacts.classifier.name(), "Artifacts loaded");

    let log = PredictionLog::new(&config.history.log_path);
    let service = Arc::new(FraudService::from_artifacts(artifacts, log, metrics.clone()));

    // Start metrics reporter
    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    web::serve(service, &config.server.bind_addr(), shutdown_signal()).await?;

    // Print final summary
    info!("Fraud Check shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_tracing(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.is_json() {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
