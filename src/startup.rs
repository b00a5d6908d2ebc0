//! Application startup and server initialization.
//!
//! Builds the metrics registry, starts the reporting loop and serves the
//! HTTP routes until ctrl-c.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ConfigV1;
use crate::metrics::{HostSampler, HttpTransport, MetricsRegistry, Reporter, SysinfoHost};
use crate::routes;
use crate::state::AppState;

/// Starts the background reporter for `registry` unless pushing is disabled.
///
/// # Errors
///
/// Returns an error if the interval or the push timeout is zero, or the HTTP
/// client cannot be built.
pub fn start_reporter(
    config: &ConfigV1,
    registry: Arc<MetricsRegistry>,
    host: Arc<dyn HostSampler>,
) -> Result<Option<tokio::task::JoinHandle<()>>, Box<dyn std::error::Error>> {
    let metrics_config = &config.metrics;
    if !metrics_config.enabled {
        warn!("Metrics push is disabled; metrics will only be accumulated");
        return Ok(None);
    }
    if metrics_config.interval_in_seconds == 0 {
        return Err("metrics.interval_in_seconds must be greater than zero".into());
    }
    if metrics_config.timeout_in_ms == 0 {
        return Err("metrics.timeout_in_ms must be greater than zero".into());
    }

    let transport = Arc::new(HttpTransport::from_config(metrics_config)?);
    let reporter = Reporter::new(registry, host, transport, metrics_config.source.clone());

    info!(
        "Pushing metrics for source '{}' every {}s",
        metrics_config.source, metrics_config.interval_in_seconds
    );
    Ok(Some(reporter.spawn(metrics_config.interval())))
}

/// Initializes and runs the application server.
///
/// # Errors
///
/// Returns an error if the reporter cannot be started, the server fails to
/// bind to the configured address, or serving fails.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let registry = Arc::new(MetricsRegistry::new());
    let host: Arc<dyn HostSampler> = Arc::new(SysinfoHost::new());

    // Dropped with the runtime once the server future completes.
    let _reporter = start_reporter(&config, registry.clone(), host.clone())?;

    let state = AppState {
        config: config.clone(),
        metrics: registry,
        host,
    };
    let app = routes::create_router(state);

    info!("Starting server on {}", config.bind_address);
    let listener = TcpListener::bind(&config.bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
