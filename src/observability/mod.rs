//! Observability
//!
//! - Structured logging through `tracing`
//! - Engine counters ([`EngineMetrics`])
//!
//! Field values never appear in log events; paths and counts do.

mod metrics;

pub use metrics::{DenialKind, EngineMetrics, MetricsSnapshot};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the configured log filter
pub const LOG_ENV: &str = "FIELDGUARD_LOG";

/// Build the log filter: `FIELDGUARD_LOG` wins over `configured`.
///
/// An unparsable directive falls back to `warn`.
pub fn log_filter(configured: &str) -> EnvFilter {
    let directive = std::env::var(LOG_ENV).unwrap_or_else(|_| configured.to_string());
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global subscriber. Logs go to stderr so stdout stays JSON.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(configured: &str) {
    let _ = tracing_subscriber::registry()
        .with(log_filter(configured))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_does_not_panic() {
        init_tracing("info");
        init_tracing("debug");
    }

    #[test]
    fn test_invalid_filter_falls_back() {
        let filter = log_filter("fieldguard=[[[");
        assert!(!filter.to_string().is_empty());
    }
}
