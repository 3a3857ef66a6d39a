//! Metrics for store observability.
//!
//! Metrics go through the `metrics` facade. Nothing is recorded anywhere
//! until the application installs a recorder (a Prometheus exporter, for
//! example); without one every call below is a no-op.
//!
//! All metrics carry a `store` label with the store's configured label.

use crate::StoreConfig;
use holdfast_core::StoreError;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

/// Dispatches that reached the reducer.
pub const DISPATCH_TOTAL: &str = "holdfast_dispatch_total";
/// Dispatches refused with an error, labelled by error code and by whether
/// the call was made from inside the reducer.
pub const DISPATCH_REJECTED_TOTAL: &str = "holdfast_dispatch_rejected_total";
/// Time spent inside the root reducer.
pub const REDUCER_DURATION_SECONDS: &str = "holdfast_reducer_duration_seconds";
/// Listener invocations after successful dispatches.
pub const LISTENERS_NOTIFIED_TOTAL: &str = "holdfast_listeners_notified_total";
/// Listeners currently subscribed.
pub const LISTENERS_ACTIVE: &str = "holdfast_listeners_active";

/// Register all metric descriptions.
///
/// Call once after installing a recorder.
pub fn describe_metrics() {
    describe_counter!(DISPATCH_TOTAL, "Total number of actions reduced by the store");
    describe_counter!(
        DISPATCH_REJECTED_TOTAL,
        "Total number of dispatches refused with an error"
    );
    describe_histogram!(
        REDUCER_DURATION_SECONDS,
        "Time taken by the root reducer per dispatch"
    );
    describe_counter!(
        LISTENERS_NOTIFIED_TOTAL,
        "Total number of listener invocations"
    );
    describe_gauge!(LISTENERS_ACTIVE, "Number of subscribed listeners");
}

/// Per-store metrics recorder.
#[derive(Debug, Clone)]
pub struct StoreMetrics {
    label: String,
    enabled: bool,
}

impl StoreMetrics {
    /// Recorder for a store with the given configuration.
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            label: config.label.clone(),
            enabled: config.record_metrics,
        }
    }

    /// Record a reduction.
    pub fn record_dispatch(&self, duration: Duration) {
        if !self.enabled {
            return;
        }
        counter!(DISPATCH_TOTAL, "store" => self.label.clone()).increment(1);
        histogram!(REDUCER_DURATION_SECONDS, "store" => self.label.clone())
            .record(duration.as_secs_f64());
    }

    /// Record a refused dispatch.
    pub fn record_rejected(&self, error: &StoreError) {
        if !self.enabled {
            return;
        }
        counter!(
            DISPATCH_REJECTED_TOTAL,
            "store" => self.label.clone(),
            "error" => error.code(),
            "reentrant" => if error.is_reentrancy() { "true" } else { "false" }
        )
        .increment(1);
    }

    /// Record a notification pass over `count` listeners.
    pub fn record_notified(&self, count: usize) {
        if !self.enabled || count == 0 {
            return;
        }
        counter!(LISTENERS_NOTIFIED_TOTAL, "store" => self.label.clone()).increment(count as u64);
    }

    /// Record the current number of subscribed listeners.
    #[allow(clippy::cast_precision_loss)] // Listener counts stay far below 2^52
    pub fn record_listeners(&self, count: usize) {
        if !self.enabled {
            return;
        }
        gauge!(LISTENERS_ACTIVE, "store" => self.label.clone()).set(count as f64);
    }
}
