//! Fraud Scoring Service - Main Entry Point
//!
//! Loads the fitted encoder and model once, then serves `POST /predict`.

use anyhow::{Context, Result};
use fraud_scoring_service::{
    api::{create_router, AppState},
    config::{AppConfig, LoggingConfig},
    metrics::MetricsReporter,
    models::ModelLoader,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    init_tracing(&config.logging)?;
    info!("Starting Fraud Scoring Service");
    info!(
        "Risk tiers: review>={:.2}, fraud>={:.2}, top_k={}",
        config.detection.review_threshold, config.detection.fraud_threshold, config.detection.top_k
    );

    // Load artifacts and build the pipeline
    let pipeline = ModelLoader::new(&config.models).load_pipeline(&config.detection)?;
    let state = AppState::new(pipeline);
    let metrics = state.metrics.clone();

    // Start metrics reporter
    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let app = create_router(state, &config.server);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Print final summary
    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!(
            "fraud_scoring_service={level},tower_http={level}",
            level = logging.level
        ))
    })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format.as_str() {
        "json" => builder.json().init(),
        _ => builder.pretty().init(),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
