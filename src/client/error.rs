//! Errors returned by [`Client`](super::Client).

use thiserror::Error;

use crate::{
    codec::{CorruptionError, EncodeError},
    connection::SocketError,
    message::MessageId,
};

/// Failures seen by a client.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Connecting, reading or writing failed.
    #[error("socket error: {0}")]
    Socket(#[from] SocketError),
    /// The outbound message could not be framed.
    #[error("failed to encode message: {0}")]
    Encode(#[from] EncodeError),
    /// The server closed the connection.
    #[error("connection closed by server")]
    Disconnected,
    /// A frame from the server was discarded.
    #[error("corrupted frame: {0}")]
    Corrupted(#[from] CorruptionError),
    /// The server answered with an `ERROR` reply.
    #[error("server error: {0}")]
    Rejected(String),
    /// A reply did not belong to the expected response.
    #[error("unexpected reply {0}")]
    Unexpected(MessageId),
    /// A data chunk held something other than a row.
    #[error("malformed row in reply {0}")]
    MalformedRow(MessageId),
}
