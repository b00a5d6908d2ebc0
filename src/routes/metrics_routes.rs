//! Preview of the next metrics payload.

use crate::metrics::host::{cpu_usage_percentage, memory_usage_percentage};
use crate::metrics::line_protocol::{render, ResourceUsage};
use crate::metrics::MetricsError;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};

/// Creates the metrics route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Handler for the /metrics endpoint.
///
/// Renders the lines the next reporting cycle would push, from current state.
/// Latency samples are left in place.
async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, HTTPError> {
    let body = render_preview(&state).map_err(|e| {
        tracing::error!("Failed to render metrics preview: {}", e);
        HTTPError::internal(e.to_string())
    })?;

    Ok((
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        body,
    ))
}

fn render_preview(state: &AppState) -> Result<String, MetricsError> {
    let usage = state.host.sample()?;
    let resources = ResourceUsage {
        cpu_percentage: cpu_usage_percentage(&usage)?,
        memory_percentage: memory_usage_percentage(&usage)?,
    };
    Ok(render(
        &state.config.metrics.source,
        &state.metrics.peek(),
        &resources,
    ))
}
