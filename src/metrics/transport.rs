//! Delivery of line-protocol payloads to the collector.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use super::error::MetricsError;
use crate::config::MetricsConfig;

/// Something that can take a formatted payload to the collector.
///
/// One call is one delivery attempt: implementations never retry.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn push(&self, payload: String) -> Result<(), MetricsError>;
}

/// Pushes payloads with an HTTP POST and a bearer credential.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    bearer: String,
}

impl HttpTransport {
    pub fn new(
        url: impl Into<String>,
        bearer: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MetricsError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            bearer: bearer.into(),
        })
    }

    pub fn from_config(config: &MetricsConfig) -> Result<Self, MetricsError> {
        Self::new(config.url.clone(), config.bearer_token(), config.timeout())
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn push(&self, payload: String) -> Result<(), MetricsError> {
        debug!("Pushing metrics to: {}", self.url);
        let response = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, format!("Bearer {}", self.bearer))
            .header(CONTENT_TYPE, "text/plain")
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(MetricsError::Delivery {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
