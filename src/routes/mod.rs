//! HTTP route definitions and handlers.
//!
//! Business routes (auth, franchises, orders) plug into the same router and
//! reach the registry through `AppState`; every route passes through the
//! request-tracking middleware.

mod health_routes;
mod metrics_routes;
pub mod tracking;

use crate::state::AppState;
use axum::{middleware, Router};

/// Creates the application router with all configured routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health_routes::routes())
        .merge(metrics_routes::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            tracking::track_requests,
        ))
        .with_state(state)
}
