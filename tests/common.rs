#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use pizza_metrics::config::{extract, ConfigV1};
use pizza_metrics::metrics::{HostSampler, HostUsage, MetricsError, MetricsRegistry};
use pizza_metrics::routes::create_router;
use pizza_metrics::state::AppState;

pub const TEST_CONFIG: &str = r#"
version: "1.0.0"
bind_address: 127.0.0.1:8081
logging:
  level: "debug"
  format: "json"
metrics:
  source: jwt-pizza-service-test
  url: http://127.0.0.1:1/push
  user_id: "1234"
  api_key: test-key
  interval_in_seconds: 10
"#;

/// Host with fixed readings: 25% CPU, 50.00% memory.
pub struct FixedHost;

impl HostSampler for FixedHost {
    fn sample(&self) -> Result<HostUsage, MetricsError> {
        Ok(HostUsage {
            load_average: 1.0,
            logical_cores: 4,
            total_memory: 2048,
            free_memory: 1024,
        })
    }
}

pub fn load_test_config() -> ConfigV1 {
    let figment = Figment::new().merge(Yaml::string(TEST_CONFIG));
    extract(&figment).expect("Failed to parse test config YAML")
}

pub fn build_app(config: ConfigV1) -> (Router, Arc<MetricsRegistry>) {
    let registry = Arc::new(MetricsRegistry::new());
    let state = AppState {
        config: Arc::new(config),
        metrics: registry.clone(),
        host: Arc::new(FixedHost),
    };
    (create_router(state), registry)
}

pub fn request(path: &str, method: Method) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}
