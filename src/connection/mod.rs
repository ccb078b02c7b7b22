//! Connection actor driving one accepted socket.
//!
//! The actor decodes inbound frames, hands requests to the worker pool one
//! at a time and writes replies from a single ordered outbox, so replies to
//! different requests never interleave on the wire. It polls a shutdown
//! token, the outbox, the in-flight request and the socket with a biased
//! `tokio::select!` loop.

mod counter;
mod dispatch;
mod error;
mod event;
mod replies;
mod shutdown;
mod state;

use std::{collections::VecDeque, fmt, net::SocketAddr, time::Duration};

use counter::ActiveConnection;
pub use error::{CloseReason, SocketError};
use event::Event;
use futures::StreamExt;
use log::info;
pub(crate) use replies::Job;
pub use replies::{ConnectionGone, Replies};
pub use state::ConnectionState;
use tokio::{
    io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf},
    sync::{mpsc, oneshot},
    time::Instant,
};
use tokio_util::{
    codec::{FramedRead, FramedWrite},
    sync::CancellationToken,
};

use crate::{
    codec::{CodecConfig, PacketCodec},
    message::Message,
};

/// Default capacity of a connection's outbound queue.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 64;

/// Default number of decoded requests waiting behind the in-flight one.
pub const DEFAULT_MAX_PENDING_REQUESTS: usize = 16;

/// Reply sent in place of a response that could not be encoded.
pub const REPLY_TOO_LARGE_TEXT: &str = "The reply could not be sent. Try again later.";

/// Identifier assigned to a connection by its pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a new [`ConnectionId`] with the provided value.
    #[must_use]
    pub const fn new(id: u64) -> Self { Self(id) }

    /// Return the inner `u64` representation.
    #[must_use]
    pub const fn as_u64(self) -> u64 { self.0 }
}

impl From<u64> for ConnectionId {
    fn from(value: u64) -> Self { Self(value) }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Per-connection limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Capacity of the ordered outbound queue.
    pub outbox_capacity: usize,
    /// Decoded requests allowed to wait behind the in-flight one. Reading
    /// pauses while this many are queued.
    pub max_pending_requests: usize,
    /// Close the connection after this long without inbound frames.
    pub idle_timeout: Option<Duration>,
    /// Framing limits for this connection.
    pub codec: CodecConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
            max_pending_requests: DEFAULT_MAX_PENDING_REQUESTS,
            idle_timeout: None,
            codec: CodecConfig::default(),
        }
    }
}

/// Actor owning one accepted stream.
///
/// Construct connections through
/// [`ConnectionPool::accept`](crate::pool::ConnectionPool::accept); the
/// actor needs the pool's worker queue to serve requests.
pub struct Connection<S> {
    id: ConnectionId,
    peer: Option<SocketAddr>,
    reader: FramedRead<ReadHalf<S>, PacketCodec>,
    writer: FramedWrite<WriteHalf<S>, PacketCodec>,
    outbox_tx: mpsc::Sender<Message>,
    outbox_rx: mpsc::Receiver<Message>,
    jobs: mpsc::Sender<Job>,
    /// Decoded requests waiting for the in-flight one to finish.
    pending: VecDeque<Message>,
    in_flight: Option<oneshot::Receiver<()>>,
    /// Cancelled when the in-flight response is abandoned.
    response: Option<CancellationToken>,
    reading: bool,
    last_activity: Instant,
    state: ConnectionState,
    config: ConnectionConfig,
    shutdown: CancellationToken,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    pub(crate) fn new(
        id: ConnectionId,
        stream: S,
        peer: Option<SocketAddr>,
        jobs: mpsc::Sender<Job>,
        config: ConnectionConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        let (outbox_tx, outbox_rx) = mpsc::channel(config.outbox_capacity.max(1));
        Self {
            id,
            peer,
            reader: FramedRead::new(read_half, PacketCodec::new(config.codec)),
            writer: FramedWrite::new(write_half, PacketCodec::new(config.codec)),
            outbox_tx,
            outbox_rx,
            jobs,
            pending: VecDeque::new(),
            in_flight: None,
            response: None,
            reading: true,
            last_activity: Instant::now(),
            state: ConnectionState::Pending,
            config,
            shutdown,
        }
    }

    /// Identifier assigned by the pool.
    #[must_use]
    pub fn id(&self) -> ConnectionId { self.id }

    /// Remote address, when known.
    #[must_use]
    pub fn peer(&self) -> Option<SocketAddr> { self.peer }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState { self.state }

    /// Drive the connection until it reaches [`ConnectionState::Closed`].
    ///
    /// Returns the reason the connection stopped reading.
    pub async fn run(mut self) -> CloseReason {
        let _active = ActiveConnection::new();
        self.state.activate();
        info!("connection opened: id={}, peer={:?}", self.id, self.peer);

        let reason = loop {
            let event = self.next_event().await;
            if let Some(reason) = self.handle_event(event).await {
                break reason;
            }
        };

        self.close(reason).await;
        info!(
            "connection closed: id={}, peer={:?}, reason={reason}",
            self.id, self.peer
        );
        reason
    }

    async fn next_event(&mut self) -> Event {
        let can_read =
            self.reading && self.pending.len() < self.config.max_pending_requests.max(1);
        let waiting = self.in_flight.is_some();
        let idle_deadline = self
            .config
            .idle_timeout
            .map(|timeout| self.last_activity + timeout);

        tokio::select! {
            biased;

            () = self.shutdown.cancelled() => Event::Shutdown,
            Some(reply) = self.outbox_rx.recv() => Event::Reply(reply),
            () = wait_done(self.in_flight.as_mut()), if waiting => Event::RequestDone,
            item = self.reader.next(), if can_read => Event::Inbound(item),
            () = sleep_until(idle_deadline), if idle_deadline.is_some() => Event::IdleTimeout,
        }
    }
}

/// Resolve once the worker has finished with the in-flight request.
async fn wait_done(done: Option<&mut oneshot::Receiver<()>>) {
    match done {
        // A dropped sender also means the worker is finished.
        Some(rx) => {
            let _ = rx.await;
        }
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
