//! Metric helpers for `fragmux`.
//!
//! This module defines metric names and simple helper functions wrapping
//! the [`metrics`](https://docs.rs/metrics) crate. Without the `metrics`
//! feature the helpers compile to no-ops.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the gauge tracking active connections.
pub const CONNECTIONS_ACTIVE: &str = "fragmux_connections_active";
/// Name of the counter tracking rejected connections.
pub const CONNECTIONS_REJECTED: &str = "fragmux_connections_rejected_total";
/// Name of the counter tracking frames handed to the sink.
pub const FRAMES_DELIVERED: &str = "fragmux_frames_delivered_total";
/// Name of the counter tracking discarded fragments.
pub const FRAGMENTS_DROPPED: &str = "fragmux_fragments_dropped_total";
/// Name of the counter tracking panics raised by the frame sink.
pub const SINK_PANICS: &str = "fragmux_sink_panics_total";

/// Increment the active connections gauge.
pub fn inc_connections() {
    #[cfg(feature = "metrics")]
    gauge!(CONNECTIONS_ACTIVE).increment(1.0);
}

/// Decrement the active connections gauge.
pub fn dec_connections() {
    #[cfg(feature = "metrics")]
    gauge!(CONNECTIONS_ACTIVE).decrement(1.0);
}

/// Record a rejected connection.
pub fn inc_rejections(reason: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(CONNECTIONS_REJECTED, "reason" => reason).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = reason;
}

/// Record a frame delivered to the sink.
pub fn inc_frames_delivered(broken: bool) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_DELIVERED, "broken" => if broken { "true" } else { "false" }).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = broken;
}

/// Record a discarded fragment.
pub fn inc_fragments_dropped(reason: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(FRAGMENTS_DROPPED, "reason" => reason).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = reason;
}

/// Record a panic raised by the frame sink.
pub fn inc_sink_panics() {
    #[cfg(feature = "metrics")]
    counter!(SINK_PANICS).increment(1);
}
