//! Metric helpers for `scorewire`.
//!
//! This module defines metric names and thin helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to no-ops.

/// Name of the gauge tracking active connections.
pub const CONNECTIONS_ACTIVE: &str = "scorewire_connections_active";
/// Name of the counter tracking encoded and decoded frames.
pub const FRAMES_PROCESSED: &str = "scorewire_frames_processed_total";
/// Name of the counter tracking discarded corrupted frames.
pub const FRAMES_CORRUPTED: &str = "scorewire_frames_corrupted_total";
/// Name of the counter tracking router and encoding failures.
pub const ERRORS_TOTAL: &str = "scorewire_errors_total";

/// Direction of frame processing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Frames received from a peer.
    Inbound,
    /// Frames sent to a peer.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), expect(dead_code, reason = "only labels metrics"))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

#[cfg(feature = "metrics")]
mod enabled {
    use metrics::{counter, gauge};

    use super::*;

    pub fn inc_connections() { gauge!(CONNECTIONS_ACTIVE).increment(1.0); }

    pub fn dec_connections() { gauge!(CONNECTIONS_ACTIVE).decrement(1.0); }

    pub fn inc_frames(direction: Direction) {
        counter!(FRAMES_PROCESSED, "direction" => direction.as_str()).increment(1);
    }

    pub fn inc_corrupted() { counter!(FRAMES_CORRUPTED).increment(1); }

    pub fn inc_errors() { counter!(ERRORS_TOTAL).increment(1); }
}

#[cfg(not(feature = "metrics"))]
mod enabled {
    use super::Direction;

    pub fn inc_connections() {}

    pub fn dec_connections() {}

    pub fn inc_frames(_direction: Direction) {}

    pub fn inc_corrupted() {}

    pub fn inc_errors() {}
}

/// Increment the active connections gauge.
pub fn inc_connections() { enabled::inc_connections(); }

/// Decrement the active connections gauge.
pub fn dec_connections() { enabled::dec_connections(); }

/// Record a processed frame for the given direction.
pub fn inc_frames(direction: Direction) { enabled::inc_frames(direction); }

/// Record a corrupted frame that was discarded.
pub fn inc_corrupted() { enabled::inc_corrupted(); }

/// Record a router or encoding failure.
pub fn inc_errors() { enabled::inc_errors(); }
