//! Runtime control for [`Server`].

mod accept;
mod backoff;
#[cfg(test)]
mod tests;

use std::future::Future;

use accept::accept_loop;
pub use backoff::BackoffConfig;
use log::{debug, info, warn};
use tokio::{
    signal,
    sync::broadcast::{self, error::RecvError},
};
use tokio_util::sync::CancellationToken;

use super::{Bound, RouterFactory, Server, ServerError};
use crate::pool::{ConnectionPool, PoolEvent};

impl<F: RouterFactory> Server<F, Bound> {
    /// Run the server until Ctrl+C is received.
    ///
    /// # Errors
    ///
    /// See [`Server::run_with_shutdown`].
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(async {
            let _ = signal::ctrl_c().await;
        })
        .await
    }

    /// Run the server until `shutdown` resolves, then close the pool and
    /// wait for every connection to finish.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio::sync::oneshot;
    /// use scorewire::{connection::Replies, message::Message, server::Server};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), scorewire::server::ServerError> {
    /// let server = Server::new(|| |_: Message, _: &mut Replies| {})
    ///     .workers(1)
    ///     .bind(([127, 0, 0, 1], 0).into())?;
    ///
    /// let (tx, rx) = oneshot::channel::<()>();
    /// let handle = tokio::spawn(server.run_with_shutdown(async {
    ///     let _ = rx.await;
    /// }));
    /// let _ = tx.send(());
    /// handle.await.expect("join server task")?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Accept failures are retried with exponential back-off and never
    /// surface; the result is reserved for future startup failures.
    pub async fn run_with_shutdown<S>(self, shutdown: S) -> Result<(), ServerError>
    where
        S: Future<Output = ()> + Send,
    {
        let Server {
            factory,
            config,
            backoff,
            ready_tx,
            state: Bound { listener },
        } = self;

        let pool = ConnectionPool::start(config, move || factory.build());
        let supervisor = tokio::spawn(supervise(pool.subscribe()));
        let stop_accepting = CancellationToken::new();
        let acceptor = tokio::spawn(accept_loop(
            listener,
            pool.clone(),
            stop_accepting.clone(),
            backoff,
        ));
        info!("server started: workers={}", config.workers);

        if let Some(tx) = ready_tx
            && tx.send(()).is_err()
        {
            warn!("failed to send readiness signal: receiver dropped");
        }

        shutdown.await;
        info!("server shutting down");
        stop_accepting.cancel();
        if let Err(e) = acceptor.await {
            warn!("accept loop failed: error={e}");
        }
        pool.shutdown().await;
        if let Err(e) = supervisor.await {
            warn!("pool supervisor failed: error={e}");
        }
        info!("server stopped");
        Ok(())
    }
}

/// Log pool size changes until the pool finishes.
async fn supervise(mut events: broadcast::Receiver<PoolEvent>) {
    loop {
        match events.recv().await {
            Ok(PoolEvent::Increased { id, size }) => {
                info!("connection opened: id={id}, connections={size}");
            }
            Ok(PoolEvent::Decreased { id, size, reason }) => {
                info!("connection closed: id={id}, reason={reason}, connections={size}");
            }
            Ok(PoolEvent::Finished) | Err(RecvError::Closed) => break,
            Err(RecvError::Lagged(n)) => debug!("pool supervisor lagged: skipped={n}"),
        }
    }
}
