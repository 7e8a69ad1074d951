//! Telemetry for collection outcomes.
//!
//! The collector reports exactly one event per terminal per-source
//! outcome through a [`CollectionTelemetry`] handed to it at
//! construction. The default writes structured `tracing` events.

use tracing::{error, info};

use crate::types::SourceFailure;

pub trait CollectionTelemetry: Send + Sync {
    /// The source answered 200 with a JSON payload.
    fn source_succeeded(&self, source: &str, status: u16);

    /// The source answered, but was excluded from the result.
    fn source_failed(&self, failure: &SourceFailure);

    /// No response could be obtained; the batch is about to abort.
    fn transport_failed(&self, source: &str, error: &reqwest::Error);
}

/// Emits INFO for successes and ERROR for failures.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl CollectionTelemetry for TracingTelemetry {
    fn source_succeeded(&self, source: &str, status: u16) {
        info!(source, status, "Request succeeded");
    }

    fn source_failed(&self, failure: &SourceFailure) {
        error!(
            source = %failure.source,
            reason = %failure.reason,
            response = "<none>",
            "Request failed"
        );
    }

    fn transport_failed(&self, source: &str, error: &reqwest::Error) {
        error!(
            source,
            error = %error,
            timeout = error.is_timeout(),
            "Data collection error"
        );
    }
}
