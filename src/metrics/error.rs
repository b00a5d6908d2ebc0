use thiserror::Error;

/// Everything that can go wrong between sampling and delivery.
///
/// None of these ever reach request handlers; they are logged and dropped at
/// the reporting-cycle or transport boundary.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("host sampling failed: {0}")]
    Host(String),

    #[error("failed to format metric '{metric}': {reason}")]
    Format { metric: &'static str, reason: String },

    #[error("collector rejected payload with status {status}")]
    Delivery { status: u16 },

    #[error("error pushing metrics: {0}")]
    Network(#[from] reqwest::Error),

    #[error("reporting cycle panicked: {0}")]
    Panicked(String),
}
