//! Connection lifecycle state.

use std::fmt;

/// Lifecycle of one accepted connection.
///
/// Transitions only move forward:
/// `Pending -> Active -> Closing -> Closed`. `Closed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accepted but not yet driving I/O.
    Pending,
    /// Reading requests and writing replies.
    Active,
    /// Finishing in-flight work and draining queued replies.
    Closing,
    /// The socket has been shut down.
    Closed,
}

impl ConnectionState {
    /// Move to `Active` if still `Pending`.
    pub(super) fn activate(&mut self) {
        if matches!(self, Self::Pending) {
            *self = Self::Active;
        }
    }

    /// Move to `Closing` unless already closing or closed.
    pub(super) fn start_closing(&mut self) {
        if matches!(self, Self::Pending | Self::Active) {
            *self = Self::Closing;
        }
    }

    /// Enter the terminal state.
    pub(super) fn finish(&mut self) { *self = Self::Closed; }

    /// Returns `true` while requests are being read.
    #[must_use]
    pub fn is_active(self) -> bool { matches!(self, Self::Active) }

    /// Returns `true` once the connection reached its terminal state.
    #[must_use]
    pub fn is_closed(self) -> bool { matches!(self, Self::Closed) }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Closing => "closing",
            Self::Closed => "closed",
        })
    }
}
