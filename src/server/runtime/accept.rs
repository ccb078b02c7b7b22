//! Accept loop feeding the connection pool.

use std::{io, net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use log::{debug, warn};
use tokio::{
    net::{TcpListener, TcpStream},
    select,
    time::{Duration, sleep},
};
use tokio_util::sync::CancellationToken;

use super::backoff::BackoffConfig;
use crate::pool::ConnectionPool;

/// Source of incoming connections consumed by the accept loop.
///
/// Implementations must be cancellation-safe: dropping a pending `accept()`
/// future must not leak resources.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub(in crate::server) trait AcceptListener: Send + Sync {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)>;
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

#[async_trait]
impl AcceptListener for TcpListener {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> { TcpListener::local_addr(self) }
}

/// Accept connections until `shutdown` is cancelled or the pool closes.
///
/// Failed `accept()` calls sleep for the current back-off delay, which
/// doubles up to `backoff.max_delay` and resets after a success.
pub(in crate::server) async fn accept_loop<L>(
    listener: Arc<L>,
    pool: ConnectionPool,
    shutdown: CancellationToken,
    backoff: BackoffConfig,
) where
    L: AcceptListener + 'static,
{
    let backoff = backoff.normalized();
    let mut delay = backoff.initial_delay;
    while let Some(next) = accept_once(&*listener, &pool, &shutdown, &backoff, delay).await {
        delay = next;
    }
    debug!("accept loop stopped");
}

async fn accept_once<L: AcceptListener>(
    listener: &L,
    pool: &ConnectionPool,
    shutdown: &CancellationToken,
    backoff: &BackoffConfig,
    delay: Duration,
) -> Option<Duration> {
    select! {
        biased;

        () = shutdown.cancelled() => None,
        res = listener.accept() => match res {
            Ok((stream, peer)) => match pool.accept_stream(stream, Some(peer)) {
                Ok(id) => {
                    debug!("connection accepted: id={id}, peer={peer}");
                    Some(backoff.initial_delay)
                }
                Err(e) => {
                    debug!("connection refused: peer={peer}, error={e}");
                    None
                }
            },
            Err(e) => {
                let local_addr = listener.local_addr().ok();
                warn!("accept error: error={e:?}, local_addr={local_addr:?}");
                crate::metrics::inc_errors();
                select! {
                    biased;

                    () = shutdown.cancelled() => None,
                    () = sleep(delay) => Some((delay * 2).min(backoff.max_delay)),
                }
            }
        },
    }
}
