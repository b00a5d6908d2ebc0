//! Request-tracking middleware feeding the metrics registry.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http::Method;

use crate::metrics::MetricsRegistry;
use crate::state::AppState;

/// Counts the request by verb and records its latency in milliseconds.
pub async fn track_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    record_method(&state.metrics, request.method());

    let started = Instant::now();
    let response = next.run(request).await;
    state
        .metrics
        .add_request_latency(started.elapsed().as_secs_f64() * 1000.0);

    response
}

/// Only GET, POST, PUT and DELETE have counters; other verbs are ignored.
pub fn record_method(metrics: &MetricsRegistry, method: &Method) {
    match method.as_str() {
        "GET" => metrics.increment_get_requests(),
        "POST" => metrics.increment_post_requests(),
        "PUT" => metrics.increment_put_requests(),
        "DELETE" => metrics.increment_delete_requests(),
        _ => {}
    }
}
