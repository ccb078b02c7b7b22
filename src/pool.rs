//! Connection pool: registry, lifecycle bookkeeping and workers.
//!
//! [`ConnectionPool::accept`] turns an accepted stream into a running
//! [`Connection`](crate::connection::Connection). Connection tasks report
//! `Started` and `Finished` over a channel to a single bookkeeping task,
//! which performs every registry mutation and publishes [`PoolEvent`]s, so
//! the accepting path never waits on per-connection work.
//!
//! Requests are served by a fixed set of blocking workers, each owning one
//! [`Router`]. [`ConnectionPool::close`] asks every live connection to shut
//! down gracefully; once the last one finishes the pool emits
//! [`PoolEvent::Finished`].

use std::{
    net::SocketAddr,
    num::NonZeroUsize,
    panic::AssertUnwindSafe,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use futures::FutureExt;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{
    connection::{
        CloseReason,
        Connection,
        ConnectionConfig,
        ConnectionId,
        Job,
        SocketError,
    },
    panic::format_panic,
    router::Router,
};

mod event;
mod registry;
mod worker;

pub use event::PoolEvent;
use registry::RegistryEntry;
pub use registry::Registry;
pub use worker::INTERNAL_ERROR_TEXT;

/// Default capacity of the shared job queue.
pub const DEFAULT_JOB_QUEUE_CAPACITY: usize = 256;

/// Default capacity of the pool event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Pool sizing and per-connection limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of blocking worker threads.
    pub workers: usize,
    /// Requests that may wait for a free worker.
    pub job_queue_capacity: usize,
    /// Buffered [`PoolEvent`]s per subscriber.
    pub event_capacity: usize,
    /// Limits applied to every connection.
    pub connection: ConnectionConfig,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
            job_queue_capacity: DEFAULT_JOB_QUEUE_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            connection: ConnectionConfig::default(),
        }
    }
}

/// Errors returned by [`ConnectionPool`].
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// The pool no longer accepts connections.
    #[error("connection pool is closed")]
    Closed,
}

/// Lifecycle messages consumed by the bookkeeping task.
enum Lifecycle {
    Accepted,
    Started(ConnectionId, RegistryEntry),
    Finished(ConnectionId, CloseReason),
    Close,
}

/// Admission state, guarded so `accept` and `close` never race.
struct Gate {
    closed: bool,
    jobs: Option<mpsc::Sender<Job>>,
}

struct Inner {
    config: PoolConfig,
    registry: Registry,
    gate: Mutex<Gate>,
    lifecycle: mpsc::UnboundedSender<Lifecycle>,
    events: broadcast::Sender<PoolEvent>,
    finished: watch::Receiver<bool>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    next_id: AtomicU64,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

/// Handle to a running connection pool.
///
/// Cloning the handle shares the pool.
///
/// # Examples
///
/// ```no_run
/// use scorewire::{
///     connection::Replies,
///     message::Message,
///     pool::{ConnectionPool, PoolConfig},
/// };
///
/// # async fn run() {
/// let pool = ConnectionPool::start(PoolConfig::default(), || {
///     |request: Message, replies: &mut Replies| {
///         let _ = replies.send(request);
///     }
/// });
/// let (client, server) = tokio::io::duplex(1024);
/// pool.accept_stream(server, None).expect("pool open");
/// # drop(client);
/// pool.shutdown().await;
/// # }
/// ```
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<Inner>,
}

impl ConnectionPool {
    /// Start the bookkeeping task and the worker threads.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<R, F>(config: PoolConfig, factory: F) -> Self
    where
        R: Router,
        F: Fn() -> R + Send + Sync + 'static,
    {
        let (jobs_tx, jobs_rx) = mpsc::channel(config.job_queue_capacity.max(1));
        let (lifecycle_tx, lifecycle_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let (finished_tx, finished_rx) = watch::channel(false);
        let registry = Registry::default();
        let shutdown = CancellationToken::new();

        let workers = worker::spawn_workers(config.workers, Arc::new(factory), jobs_rx);
        tokio::spawn(bookkeeping(
            lifecycle_rx,
            registry.clone(),
            events.clone(),
            finished_tx,
            shutdown.clone(),
        ));
        info!("connection pool started: workers={}", workers.len());

        Self {
            inner: Arc::new(Inner {
                config,
                registry,
                gate: Mutex::new(Gate {
                    closed: false,
                    jobs: Some(jobs_tx),
                }),
                lifecycle: lifecycle_tx,
                events,
                finished: finished_rx,
                shutdown,
                tracker: TaskTracker::new(),
                next_id: AtomicU64::new(1),
                workers: Mutex::new(workers),
            }),
        }
    }

    /// Adopt an accepted TCP stream.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Closed`] once [`ConnectionPool::close`] has been
    /// called.
    pub fn accept(&self, stream: TcpStream) -> Result<ConnectionId, PoolError> {
        let peer = match stream.peer_addr() {
            Ok(addr) => Some(addr),
            Err(e) => {
                warn!("failed to retrieve peer address: error={e}");
                None
            }
        };
        self.accept_stream(stream, peer)
    }

    /// Adopt any bidirectional byte stream.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Closed`] once [`ConnectionPool::close`] has been
    /// called.
    pub fn accept_stream<S>(
        &self,
        stream: S,
        peer: Option<SocketAddr>,
    ) -> Result<ConnectionId, PoolError>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let inner = &self.inner;
        let gate = inner.gate.lock();
        let jobs = match (&gate.jobs, gate.closed) {
            (Some(jobs), false) => jobs.clone(),
            _ => return Err(PoolError::Closed),
        };
        inner
            .lifecycle
            .send(Lifecycle::Accepted)
            .map_err(|_| PoolError::Closed)?;
        drop(gate);

        let id = ConnectionId::new(inner.next_id.fetch_add(1, Ordering::Relaxed));
        let token = inner.shutdown.child_token();
        let connection = Connection::new(
            id,
            stream,
            peer,
            jobs,
            inner.config.connection,
            token.clone(),
        );
        let lifecycle = inner.lifecycle.clone();
        inner.tracker.spawn(async move {
            let entry = RegistryEntry {
                peer,
                shutdown: token,
            };
            let _ = lifecycle.send(Lifecycle::Started(id, entry));
            let reason = match AssertUnwindSafe(connection.run()).catch_unwind().await {
                Ok(reason) => reason,
                Err(panic) => {
                    let panic_msg = format_panic(panic.as_ref());
                    crate::metrics::inc_errors();
                    error!("connection task panicked: id={id}, panic={panic_msg}, peer={peer:?}");
                    tracing::error!(%id, panic = %panic_msg, ?peer, "connection task panicked");
                    CloseReason::Socket(SocketError::Unidentified)
                }
            };
            let _ = lifecycle.send(Lifecycle::Finished(id, reason));
        });
        Ok(id)
    }

    /// Number of live connections.
    #[must_use]
    pub fn len(&self) -> usize { self.inner.registry.len() }

    /// Returns `true` when no connection is live.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.inner.registry.is_empty() }

    /// Read-only view of the live connections.
    #[must_use]
    pub fn registry(&self) -> &Registry { &self.inner.registry }

    /// Subscribe to registry size changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> { self.inner.events.subscribe() }

    /// Returns `true` once [`ConnectionPool::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.inner.gate.lock().closed }

    /// Stop accepting connections and ask every live one to shut down.
    ///
    /// Idempotent.
    pub fn close(&self) {
        let mut gate = self.inner.gate.lock();
        if gate.closed {
            return;
        }
        gate.closed = true;
        if self.inner.lifecycle.send(Lifecycle::Close).is_err() {
            debug!("bookkeeping task already stopped");
        }
    }

    /// Wait until the pool has been closed and every connection finished.
    pub async fn finished(&self) {
        let mut finished = self.inner.finished.clone();
        // An error means the bookkeeping task is gone, which only happens
        // after it reported completion or the runtime is shutting down.
        let _ = finished.wait_for(|done| *done).await;
    }

    /// Close the pool, wait for every connection, then stop the workers.
    pub async fn shutdown(&self) {
        self.close();
        self.finished().await;
        self.inner.tracker.close();
        self.inner.tracker.wait().await;

        drop(self.inner.gate.lock().jobs.take());
        let workers = std::mem::take(&mut *self.inner.workers.lock());
        for worker in workers {
            if let Err(e) = worker.await {
                error!("worker task failed: error={e}");
            }
        }
        info!("connection pool stopped");
    }
}

/// Single consumer of lifecycle messages; owns every registry mutation.
async fn bookkeeping(
    mut lifecycle: mpsc::UnboundedReceiver<Lifecycle>,
    registry: Registry,
    events: broadcast::Sender<PoolEvent>,
    finished: watch::Sender<bool>,
    shutdown: CancellationToken,
) {
    // Connections accepted but not yet finished, including ones not started.
    let mut outstanding = 0_usize;
    let mut closing = false;

    while let Some(message) = lifecycle.recv().await {
        match message {
            Lifecycle::Accepted => outstanding += 1,
            Lifecycle::Started(id, entry) => match registry.insert(id, entry) {
                Some(size) => {
                    debug!("pool size increased: id={id}, size={size}");
                    let _ = events.send(PoolEvent::Increased { id, size });
                }
                None => warn!("duplicate connection id ignored: id={id}"),
            },
            Lifecycle::Finished(id, reason) => {
                outstanding = outstanding.saturating_sub(1);
                if let Some((size, entry)) = registry.remove(id) {
                    debug!(
                        "pool size decreased: id={id}, size={size}, reason={reason}, peer={:?}",
                        entry.peer
                    );
                    let _ = events.send(PoolEvent::Decreased { id, size, reason });
                }
            }
            Lifecycle::Close => {
                if !closing {
                    closing = true;
                    let signalled = registry.cancel_all();
                    shutdown.cancel();
                    info!("connection pool closing: connections={signalled}");
                }
            }
        }

        if closing && outstanding == 0 {
            info!("connection pool finished");
            let _ = events.send(PoolEvent::Finished);
            finished.send_replace(true);
            break;
        }
    }
}
