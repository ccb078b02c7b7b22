//! Notifications emitted as the pool's registry changes size.

use crate::connection::{CloseReason, ConnectionId};

/// Registry size change or terminal pool signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolEvent {
    /// A connection started; `size` is the registry size afterwards.
    Increased {
        /// Connection that joined.
        id: ConnectionId,
        /// Live connections after the change.
        size: usize,
    },
    /// A connection reached its terminal state and left the registry.
    Decreased {
        /// Connection that left.
        id: ConnectionId,
        /// Live connections after the change.
        size: usize,
        /// Why the connection closed.
        reason: CloseReason,
    },
    /// The pool was closed and every connection has finished.
    Finished,
}

impl PoolEvent {
    /// Registry size carried by the event; `Finished` implies zero.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Increased { size, .. } | Self::Decreased { size, .. } => *size,
            Self::Finished => 0,
        }
    }
}
