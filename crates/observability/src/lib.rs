//! Tracing, logging and metrics shared by every process.

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Counter sinks.
pub mod metrics;

pub use metrics::{InMemoryMetrics, Metric, MetricsSink, TracingMetrics};
