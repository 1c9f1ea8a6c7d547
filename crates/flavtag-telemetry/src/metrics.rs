//! Run counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counter of events by processing stage (`read`, `written`, `malformed`)
pub const EVENTS_TOTAL: &str = "flavtag_events_total";

/// Counter of per-event diagnostics
pub const DIAGNOSTICS_TOTAL: &str = "flavtag_diagnostics_total";

/// Register descriptions with the installed recorder
pub fn describe_metrics() {
    ::metrics::describe_counter!(EVENTS_TOTAL, "Total number of events by processing stage");
    ::metrics::describe_counter!(
        DIAGNOSTICS_TOTAL,
        "Total number of outputs degraded to untagged"
    );
}

/// Metrics collector for a reduction run
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    events_read: AtomicU64,
    events_written: AtomicU64,
    malformed_events: AtomicU64,
    events_with_diagnostics: AtomicU64,
    diagnostics: AtomicU64,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                events_read: AtomicU64::new(0),
                events_written: AtomicU64::new(0),
                malformed_events: AtomicU64::new(0),
                events_with_diagnostics: AtomicU64::new(0),
                diagnostics: AtomicU64::new(0),
            }),
        }
    }

    /// Record an event read from the input
    pub fn record_read(&self) {
        self.inner.events_read.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!(EVENTS_TOTAL, "stage" => "read").increment(1);
    }

    /// Record an event written to the output
    pub fn record_written(&self) {
        self.inner.events_written.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!(EVENTS_TOTAL, "stage" => "written").increment(1);
    }

    /// Record an input line that could not be parsed as an event
    pub fn record_malformed(&self) {
        self.inner.malformed_events.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!(EVENTS_TOTAL, "stage" => "malformed").increment(1);
    }

    /// Record the diagnostics of one event
    pub fn record_diagnostics(&self, count: u64) {
        if count == 0 {
            return;
        }
        self.inner
            .events_with_diagnostics
            .fetch_add(1, Ordering::Relaxed);
        self.inner.diagnostics.fetch_add(count, Ordering::Relaxed);
        ::metrics::counter!(DIAGNOSTICS_TOTAL).increment(count);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_read: self.inner.events_read.load(Ordering::Relaxed),
            events_written: self.inner.events_written.load(Ordering::Relaxed),
            malformed_events: self.inner.malformed_events.load(Ordering::Relaxed),
            events_with_diagnostics: self.inner.events_with_diagnostics.load(Ordering::Relaxed),
            diagnostics: self.inner.diagnostics.load(Ordering::Relaxed),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub events_read: u64,
    pub events_written: u64,
    pub malformed_events: u64,
    pub events_with_diagnostics: u64,
    pub diagnostics: u64,
}

impl MetricsSnapshot {
    /// Fraction of read events that had at least one degraded output
    pub fn diagnostic_rate(&self) -> f64 {
        if self.events_read == 0 {
            0.0
        } else {
            self.events_with_diagnostics as f64 / self.events_read as f64
        }
    }
}
