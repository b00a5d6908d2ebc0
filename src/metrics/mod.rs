//! Metrics aggregation and push-based emission.
//!
//! Request handlers update a shared [`MetricsRegistry`]; a [`Reporter`] turns
//! its state into line-protocol payloads on a fixed schedule and pushes them
//! to the collector.

mod error;
pub mod host;
pub mod line_protocol;
mod registry;
mod reporter;
pub mod transport;

pub use error::MetricsError;
pub use host::{HostSampler, HostUsage, SysinfoHost};
pub use registry::{MetricsRegistry, Snapshot};
pub use reporter::Reporter;
pub use transport::{HttpTransport, Transport};
