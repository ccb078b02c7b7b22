//! Aggregate service configuration.
//!
//! Every layer keeps its own `Default`-backed settings struct; [`Config`]
//! gathers them so the binary can map command-line flags onto one value.

use std::{
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    time::Duration,
};

use crate::{
    chunker::ChunkSizes,
    pool::PoolConfig,
    server::{BackoffConfig, RouterFactory, Server, Unbound},
};

/// Default listening port.
pub const DEFAULT_PORT: u16 = 7000;

/// Default listening address, all interfaces on [`DEFAULT_PORT`].
pub const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DEFAULT_PORT));

/// Settings for one server instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Address the server listens on.
    pub bind: SocketAddr,
    /// Workers, queues and per-connection limits.
    pub pool: PoolConfig,
    /// Rows per chunk for collection replies.
    pub chunks: ChunkSizes,
    /// Accept-loop retry timing.
    pub backoff: BackoffConfig,
    /// Prometheus listener, when metrics export is wanted.
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND_ADDR,
            pool: PoolConfig::default(),
            chunks: ChunkSizes::default(),
            backoff: BackoffConfig::default(),
            metrics_addr: None,
        }
    }
}

impl Config {
    /// Set the listening address.
    #[must_use]
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind = addr;
        self
    }

    /// Set the number of pool workers (at least one).
    #[must_use]
    pub fn workers(mut self, count: usize) -> Self {
        self.pool.workers = count.max(1);
        self
    }

    /// Close connections that stay silent for `timeout`.
    #[must_use]
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.pool.connection.idle_timeout = timeout;
        self
    }

    /// Cap the escaped size of a single frame.
    #[must_use]
    pub fn max_frame_length(mut self, max: usize) -> Self {
        self.pool.connection.codec = self.pool.connection.codec.max_frame_length(max);
        self
    }

    /// Override the rows per chunk.
    #[must_use]
    pub fn chunk_sizes(mut self, chunks: ChunkSizes) -> Self {
        self.chunks = chunks;
        self
    }

    /// Export metrics over HTTP on `addr`.
    #[must_use]
    pub fn metrics_addr(mut self, addr: Option<SocketAddr>) -> Self {
        self.metrics_addr = addr;
        self
    }

    /// Build an unbound server carrying the pool and back-off settings.
    pub fn server<F: RouterFactory>(&self, factory: F) -> Server<F, Unbound> {
        Server::new(factory).config(self.pool).backoff(self.backoff)
    }
}
