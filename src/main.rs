//! Cardio Risk Service - Main Entry Point
//!
//! Serves cardiovascular risk predictions over HTTP from a pre-trained
//! ONNX classifier.

use anyhow::{Context, Result};
use cardio_risk_service::{
    config::{AppConfig, LoggingConfig},
    metrics::{MetricsReporter, ServiceMetrics},
    models::{OnnxBackend, Predictor},
    server::{router, AppState},
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)
            .context(format!("Invalid log level {:?}", logging.level))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format.as_str() {
        "json" => builder.json().init(),
        _ => builder.init(),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Cardio Risk Service");
    info!(
        base_dir = %config.model.base_dir.display(),
        default_filename = %config.model.default_filename,
        onnx_threads = config.model.onnx_threads,
        "Configuration loaded"
    );

    let backend = OnnxBackend::with_threads(config.model.onnx_threads)?;
    let predictor = Arc::new(Predictor::new(
        Box::new(backend),
        &config.model.base_dir,
        &config.model.default_filename,
    ));

    if config.model.preload {
        let preload = predictor.clone();
        match tokio::task::spawn_blocking(move || preload.ensure_loaded()).await? {
            Ok(()) => info!("Scoring artifact preloaded"),
            Err(e) => warn!(error = %e, "Preload failed, will retry on first request"),
        }
    }

    let metrics = Arc::new(ServiceMetrics::new());
    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let app = router(AppState::new(predictor, metrics.clone()));

    let addr = config.server.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}
