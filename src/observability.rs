//! Metrics for message flow, using metrics-rs.

use metrics::{counter, Unit};
use std::sync::atomic::{AtomicBool, Ordering};

/// Whether metric descriptions have been registered.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

// Metric names as constants for consistency
const MESSAGES_POSTED: &str = "chronoflow_messages_posted";
const MESSAGES_DELIVERED: &str = "chronoflow_messages_delivered";
const MESSAGES_DROPPED: &str = "chronoflow_messages_dropped";

/// Register metric descriptions.
///
/// Call this once at application startup before using any metrics.
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    metrics::describe_counter!(
        MESSAGES_POSTED,
        Unit::Count,
        "Total number of messages posted by producers"
    );
    metrics::describe_counter!(
        MESSAGES_DELIVERED,
        Unit::Count,
        "Total number of deliveries processed by component callbacks"
    );
    metrics::describe_counter!(
        MESSAGES_DROPPED,
        Unit::Count,
        "Total number of deliveries dropped because the component had finished"
    );
}

/// Record a message posted by a producer.
#[inline]
pub(crate) fn record_posted(port: &str) {
    counter!(MESSAGES_POSTED, "port" => port.to_string()).increment(1);
}

/// Record a delivery processed by a component.
#[inline]
pub(crate) fn record_delivered(component: &str) {
    counter!(MESSAGES_DELIVERED, "component" => component.to_string()).increment(1);
}

/// Record a delivery dropped after its component finished.
#[inline]
pub(crate) fn record_dropped(component: &str) {
    counter!(MESSAGES_DROPPED, "component" => component.to_string()).increment(1);
}
