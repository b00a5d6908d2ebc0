//! Shared application state.
//!
//! Contains the state that is shared across all request handlers.

use crate::config::ConfigV1;
use crate::metrics::{HostSampler, MetricsRegistry};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// The single metrics registry of the process.
    pub metrics: Arc<MetricsRegistry>,
    /// Host sampler used for previews of the next payload.
    pub host: Arc<dyn HostSampler>,
}
