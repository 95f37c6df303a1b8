//! Prometheus metrics for event consumption

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, CounterVec, HistogramVec,
    IntCounter,
};

/// Messaging metrics
pub struct MessagingMetrics {
    /// Events applied to the index
    pub events_applied: CounterVec,

    /// Index write failures per attempt
    pub apply_failures: CounterVec,

    /// Messages routed to the dead-letter topic
    pub events_dead_lettered: IntCounter,

    /// Messages dropped for an unknown event shape
    pub unknown_events: IntCounter,

    /// Apply latency
    pub apply_latency: HistogramVec,
}

lazy_static! {
    pub static ref MESSAGING_METRICS: MessagingMetrics = MessagingMetrics {
        events_applied: register_counter_vec!(
            "messaging_events_applied_total",
            "Total number of events applied to the index",
            &["event"]
        )
        .unwrap(),

        apply_failures: register_counter_vec!(
            "messaging_apply_failures_total",
            "Total number of failed index write attempts",
            &["event"]
        )
        .unwrap(),

        events_dead_lettered: register_int_counter!(
            "messaging_events_dead_lettered_total",
            "Total number of messages routed to the dead-letter topic"
        )
        .unwrap(),

        unknown_events: register_int_counter!(
            "messaging_unknown_events_total",
            "Total number of messages dropped for an unknown event shape"
        )
        .unwrap(),

        apply_latency: register_histogram_vec!(
            "messaging_apply_latency_seconds",
            "Event apply latency in seconds",
            &["event"]
        )
        .unwrap(),
    };
}

/// Initialize messaging metrics
pub fn init_messaging_metrics() {
    lazy_static::initialize(&MESSAGING_METRICS);
}
