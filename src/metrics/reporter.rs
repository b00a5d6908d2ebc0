//! Periodic reporting loop.
//!
//! Each tick samples the host, snapshots the registry (resetting latency
//! samples), formats the lines and hands the payload to the transport on a
//! detached task. Nothing that happens during a tick can stop later ticks.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

use super::error::MetricsError;
use super::host::{cpu_usage_percentage, memory_usage_percentage, HostSampler};
use super::line_protocol::{LineBuffer, ResourceUsage};
use super::registry::MetricsRegistry;
use super::transport::Transport;
use crate::utils::log_throttle::LogThrottle;

const PUSH_FAILURE_LOG_WINDOW: Duration = Duration::from_secs(60);
const MIN_PERIOD: Duration = Duration::from_millis(1);

pub struct Reporter {
    registry: Arc<MetricsRegistry>,
    host: Arc<dyn HostSampler>,
    transport: Arc<dyn Transport>,
    buffer: LineBuffer,
    throttle: Arc<LogThrottle>,
}

impl Reporter {
    pub fn new(
        registry: Arc<MetricsRegistry>,
        host: Arc<dyn HostSampler>,
        transport: Arc<dyn Transport>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            host,
            transport,
            buffer: LineBuffer::new(source),
            throttle: Arc::new(LogThrottle::new(PUSH_FAILURE_LOG_WINDOW)),
        }
    }

    /// Runs one reporting cycle and returns the handle of the detached push.
    ///
    /// On error nothing is pushed and the pending buffer is discarded. Latency
    /// samples are only reset once the host has been sampled successfully.
    pub fn report_cycle(&mut self) -> Result<JoinHandle<()>, MetricsError> {
        if let Err(e) = self.queue_cycle() {
            self.buffer.clear();
            return Err(e);
        }

        let lines = self.buffer.len();
        let payload = self.buffer.flush();
        Ok(self.dispatch(payload, lines))
    }

    fn queue_cycle(&mut self) -> Result<(), MetricsError> {
        let usage = self.host.sample()?;
        let resources = ResourceUsage {
            cpu_percentage: cpu_usage_percentage(&usage)?,
            memory_percentage: memory_usage_percentage(&usage)?,
        };

        let snapshot = self.registry.take_snapshot();
        self.buffer.queue_snapshot(&snapshot, &resources);
        Ok(())
    }

    fn dispatch(&self, payload: String, lines: usize) -> JoinHandle<()> {
        let transport = self.transport.clone();
        let throttle = self.throttle.clone();

        tokio::spawn(async move {
            match transport.push(payload).await {
                Ok(()) => debug!(
                    event_name = "metrics.push.succeeded",
                    event_domain = "metrics",
                    lines,
                    "pushed metrics"
                ),
                Err(e) => {
                    if let Some(suppressed_count) = throttle.should_emit("metrics.push.failed") {
                        warn!(
                            event_name = "metrics.push.failed",
                            event_domain = "metrics",
                            error = %e,
                            suppressed_count,
                            "failed to push metrics data"
                        );
                    }
                }
            }
        })
    }

    /// One tick of the loop: a reporting cycle inside a boundary that logs and
    /// swallows both errors and panics.
    pub fn tick(&mut self) -> Option<JoinHandle<()>> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.report_cycle()))
            .unwrap_or_else(|panic| Err(MetricsError::Panicked(panic_message(panic.as_ref()))));

        match outcome {
            Ok(handle) => Some(handle),
            Err(e) => {
                self.buffer.clear();
                error!(
                    event_name = "metrics.cycle.failed",
                    event_domain = "metrics",
                    error = %e,
                    "error sending metrics"
                );
                None
            }
        }
    }

    /// Moves the reporter onto a background task that ticks every `period`.
    ///
    /// The first tick fires one full period after the call. The task holds no
    /// resources that keep the runtime alive; it ends when the runtime shuts
    /// down.
    pub fn spawn(mut self, period: Duration) -> JoinHandle<()> {
        let period = period.max(MIN_PERIOD);
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.tick();
            }
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
