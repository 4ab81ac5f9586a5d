//! Metric helpers for `tcpstitch`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to nothing.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

use crate::pool::Termination;

/// Name of the gauge tracking messages currently held by pools.
pub const FLOWS_ACTIVE: &str = "tcpstitch_flows_active";
/// Name of the counter tracking messages handed to consumers.
pub const MESSAGES_DISPATCHED: &str = "tcpstitch_messages_dispatched_total";
/// Name of the counter tracking messages cut at the size cap.
pub const MESSAGES_TRUNCATED: &str = "tcpstitch_messages_truncated_total";
/// Name of the counter tracking packets that failed to decode.
pub const DECODE_ERRORS: &str = "tcpstitch_decode_errors_total";

/// Increment the active flows gauge.
pub fn inc_flows() {
    #[cfg(feature = "metrics")]
    gauge!(FLOWS_ACTIVE).increment(1.0);
}

/// Decrement the active flows gauge.
pub fn dec_flows() {
    #[cfg(feature = "metrics")]
    gauge!(FLOWS_ACTIVE).decrement(1.0);
}

/// Record a dispatched message with the trigger that ended it.
pub fn inc_dispatched(termination: Termination) {
    #[cfg(feature = "metrics")]
    counter!(MESSAGES_DISPATCHED, "termination" => termination.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = termination;
}

/// Record a truncated message.
pub fn inc_truncated() {
    #[cfg(feature = "metrics")]
    counter!(MESSAGES_TRUNCATED).increment(1);
}

/// Record a packet that could not be decoded.
pub fn inc_decode_errors() {
    #[cfg(feature = "metrics")]
    counter!(DECODE_ERRORS).increment(1);
}
