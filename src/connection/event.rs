//! Internal event types for the connection actor select loop.

use std::io;

use crate::{codec::Decoded, message::Message};

/// Events returned by `Connection::next_event`.
#[derive(Debug)]
pub(super) enum Event {
    Shutdown,
    /// A reply queued by the worker serving this connection.
    Reply(Message),
    /// The worker finished the in-flight request.
    RequestDone,
    Inbound(Option<io::Result<Decoded>>),
    IdleTimeout,
}
