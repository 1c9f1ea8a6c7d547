//! flavtag Telemetry
//!
//! Counters and tagging-performance bookkeeping for a reduction run.
//!
//! Provides:
//! - Event and diagnostic counters, mirrored to the `metrics` facade
//! - Per-output tagging efficiency, dilution and effective tagging power

pub mod metrics;
pub mod performance;

pub use crate::metrics::{describe_metrics, MetricsCollector, MetricsSnapshot};
pub use performance::{PerformanceTally, TaggingPerformance};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::metrics::MetricsCollector;
    pub use crate::performance::{PerformanceTally, TaggingPerformance};
}
