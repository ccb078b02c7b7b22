//! Tokio TCP server feeding accepted sockets into a [`ConnectionPool`].
//!
//! [`Server`] carries a typestate `S` recording whether it is [`Unbound`]
//! or [`Bound`]. New servers start unbound and must call
//! [`Server::bind`] or [`Server::bind_existing_listener`] before they can
//! run. Running starts a [`ConnectionPool`], whose workers each own a router
//! built by the factory, and an accept loop that hands every stream to the
//! pool.
//!
//! [`ConnectionPool`]: crate::pool::ConnectionPool

use std::sync::Arc;

use tokio::{net::TcpListener, sync::oneshot};

use crate::{pool::PoolConfig, router::Router};

mod binding;
pub mod error;
mod runtime;

pub use error::ServerError;
pub use runtime::BackoffConfig;

/// Builds one [`Router`] per pool worker.
///
/// Implemented for every `Fn() -> R` closure that is `Send + Sync`.
pub trait RouterFactory: Send + Sync + 'static {
    /// Router produced by the factory.
    type Router: Router;

    /// Build a fresh router.
    fn build(&self) -> Self::Router;
}

impl<F, R> RouterFactory for F
where
    F: Fn() -> R + Send + Sync + 'static,
    R: Router,
{
    type Router = R;

    fn build(&self) -> R { self() }
}

/// TCP server for the packet protocol.
///
/// # Examples
///
/// ```no_run
/// use std::net::SocketAddr;
///
/// use scorewire::{
///     database::MemoryDatabase,
///     router::TournamentRouter,
///     server::{Server, ServerError},
/// };
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), ServerError> {
/// let db = MemoryDatabase::default();
/// let addr: SocketAddr = ([127, 0, 0, 1], 8080).into();
/// Server::new(move || TournamentRouter::new(db.clone()))
///     .workers(4)
///     .bind(addr)?
///     .run()
///     .await
/// # }
/// ```
pub struct Server<F, S = Unbound>
where
    F: RouterFactory,
    S: ServerState,
{
    pub(crate) factory: F,
    pub(crate) config: PoolConfig,
    pub(crate) backoff: BackoffConfig,
    /// Fired once the accept loop is running. Single use: a new sender is
    /// needed for every run.
    pub(crate) ready_tx: Option<oneshot::Sender<()>>,
    pub(crate) state: S,
}

/// Marker indicating the server has not yet bound a listener.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbound;

/// Marker indicating the server is bound to a TCP listener.
#[derive(Debug, Clone)]
pub struct Bound {
    pub(crate) listener: Arc<TcpListener>,
}

/// Implemented by [`Unbound`] and [`Bound`] to model binding typestate.
pub trait ServerState: sealed::Sealed {}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Unbound {}
    impl Sealed for super::Bound {}
}

impl ServerState for Unbound {}
impl ServerState for Bound {}

impl<F: RouterFactory> Server<F, Unbound> {
    /// Create a server from a router factory.
    ///
    /// The worker count defaults to the available parallelism.
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            config: PoolConfig::default(),
            backoff: BackoffConfig::default(),
            ready_tx: None,
            state: Unbound,
        }
    }
}

impl<F: RouterFactory, S: ServerState> Server<F, S> {
    /// Set the number of pool workers (at least one).
    #[must_use]
    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count.max(1);
        self
    }

    /// Replace the pool configuration.
    #[must_use]
    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = PoolConfig {
            workers: config.workers.max(1),
            ..config
        };
        self
    }

    /// Configure the accept-loop back-off.
    #[must_use]
    pub fn backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff.normalized();
        self
    }

    /// Signal `tx` once the server is accepting connections.
    #[must_use]
    pub fn ready_signal(mut self, tx: oneshot::Sender<()>) -> Self {
        self.ready_tx = Some(tx);
        self
    }

    /// Configured number of pool workers.
    #[must_use]
    pub const fn worker_count(&self) -> usize { self.config.workers }

    /// Pool configuration used when the server runs.
    #[must_use]
    pub const fn pool_config(&self) -> &PoolConfig { &self.config }
}

#[cfg(test)]
pub(crate) mod test_util;
