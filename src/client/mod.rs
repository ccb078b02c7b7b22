//! Client side of the packet protocol.
//!
//! [`Client`] frames outgoing messages with the same [`PacketCodec`] the
//! server uses and surfaces corrupted inbound frames as
//! [`Decoded::Corrupted`] rather than errors, mirroring the server's
//! tolerance for bad frames.

use std::net::SocketAddr;

use bytes::BytesMut;
use futures::StreamExt;
use log::debug;
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
    time::{Duration, timeout},
};
use tokio_util::codec::Framed;

use crate::{
    chunker::ChunkSpec,
    codec::{Decoded, PacketCodec},
    connection::SocketError,
    message::{Message, catalog},
    value::{Row, Value},
};

mod error;

pub use error::ClientError;

/// Connection to a packet-protocol server.
///
/// # Examples
///
/// ```no_run
/// use scorewire::{
///     chunker::ChunkSpec,
///     client::Client,
///     message::{Message, catalog},
/// };
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), scorewire::client::ClientError> {
/// let mut client = Client::connect("127.0.0.1:7000".parse().expect("addr"), None).await?;
/// client
///     .send(&Message::new(catalog::PULL_MATCHES).with("Cup").with("host").with("Final"))
///     .await?;
/// let matches = client.recv_rows(&ChunkSpec::matches()).await?;
/// println!("{} matches", matches.len());
/// # Ok(())
/// # }
/// ```
pub struct Client<S = TcpStream> {
    framed: Framed<S, PacketCodec>,
}

impl Client<TcpStream> {
    /// Connect to `addr`, giving up after `connect_timeout` if set.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Socket`] with the classified failure.
    pub async fn connect(
        addr: SocketAddr,
        connect_timeout: Option<Duration>,
    ) -> Result<Self, ClientError> {
        let attempt = TcpStream::connect(addr);
        let stream = match connect_timeout {
            Some(limit) => timeout(limit, attempt)
                .await
                .map_err(|_| ClientError::Socket(SocketError::Timeout))?,
            None => attempt.await,
        }
        .map_err(|e| {
            debug!("connect failed: addr={addr}, error={e}");
            ClientError::Socket(SocketError::from(&e))
        })?;
        Ok(Self::new(stream, PacketCodec::default()))
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an established stream.
    pub fn new(stream: S, codec: PacketCodec) -> Self {
        Self {
            framed: Framed::new(stream, codec),
        }
    }

    /// Send one message.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Encode`] when the message exceeds the codec
    /// limits, or [`ClientError::Socket`] when the write fails.
    pub async fn send(&mut self, message: &Message) -> Result<(), ClientError> {
        let mut buf = BytesMut::new();
        self.framed.codec().encode_message(message, &mut buf)?;
        self.send_raw(&buf).await
    }

    /// Write raw bytes to the socket, bypassing the encoder.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Socket`] when the write fails.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        let stream = self.framed.get_mut();
        stream.write_all(bytes).await.map_err(SocketError::from)?;
        stream.flush().await.map_err(SocketError::from)?;
        Ok(())
    }

    /// Receive the next decoded item.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Disconnected`] at end of stream and
    /// [`ClientError::Socket`] on read failures.
    pub async fn recv(&mut self) -> Result<Decoded, ClientError> {
        match self.framed.next().await {
            Some(Ok(item)) => Ok(item),
            Some(Err(e)) => Err(SocketError::from(e).into()),
            None => Err(ClientError::Disconnected),
        }
    }

    /// Receive the next well-formed message.
    ///
    /// # Errors
    ///
    /// As [`Client::recv`], plus [`ClientError::Corrupted`] for a discarded
    /// frame.
    pub async fn recv_message(&mut self) -> Result<Message, ClientError> {
        match self.recv().await? {
            Decoded::Message(message) => Ok(message),
            Decoded::Corrupted(reason) => Err(reason.into()),
        }
    }

    /// Collect a chunked collection described by `spec`.
    ///
    /// Returns an empty collection when the server sends the zero-results
    /// message.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] for an `ERROR` reply and
    /// [`ClientError::Unexpected`] for a message outside `spec`.
    pub async fn recv_rows(&mut self, spec: &ChunkSpec) -> Result<Vec<Row>, ClientError> {
        let mut rows = Vec::new();
        loop {
            let message = self.recv_message().await?;
            let id = message.id();
            if id == spec.empty && rows.is_empty() {
                return Ok(rows);
            }
            if id == spec.end {
                return Ok(rows);
            }
            if id == spec.data {
                for value in message.into_parts().1 {
                    match value {
                        Value::List(row) => rows.push(row),
                        _ => return Err(ClientError::MalformedRow(id)),
                    }
                }
                continue;
            }
            if id == catalog::ERROR {
                let reason = message.text(0).unwrap_or_default().to_owned();
                return Err(ClientError::Rejected(reason));
            }
            return Err(ClientError::Unexpected(id));
        }
    }

    /// Shut down the write half, signalling end of requests.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Socket`] when the shutdown fails.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        self.framed
            .get_mut()
            .shutdown()
            .await
            .map_err(|e| ClientError::Socket(e.into()))
    }

    /// Underlying stream.
    pub fn get_mut(&mut self) -> &mut S { self.framed.get_mut() }
}
