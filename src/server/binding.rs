//! Listener binding for [`Server`].

use std::{
    net::{SocketAddr, TcpListener as StdTcpListener},
    sync::Arc,
};

use tokio::net::TcpListener;

use super::{Bound, RouterFactory, Server, ServerError, ServerState, Unbound};

impl<F: RouterFactory, S: ServerState> Server<F, S> {
    fn into_bound(self, std_listener: StdTcpListener) -> Result<Server<F, Bound>, ServerError> {
        let Server {
            factory,
            config,
            backoff,
            ready_tx,
            ..
        } = self;

        std_listener
            .set_nonblocking(true)
            .map_err(ServerError::Bind)?;
        let listener = TcpListener::from_std(std_listener).map_err(ServerError::Bind)?;

        Ok(Server {
            factory,
            config,
            backoff,
            ready_tx,
            state: Bound {
                listener: Arc::new(listener),
            },
        })
    }
}

impl<F: RouterFactory> Server<F, Unbound> {
    /// Always `None`: the server is not bound yet.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> { None }

    /// Bind to `addr`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::net::{Ipv4Addr, SocketAddr};
    ///
    /// use scorewire::{connection::Replies, message::Message, server::Server};
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let server = Server::new(|| |_: Message, _: &mut Replies| {})
    ///     .bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
    ///     .expect("bind failed");
    /// assert!(server.local_addr().is_some());
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if binding or configuring the listener
    /// fails.
    pub fn bind(self, addr: SocketAddr) -> Result<Server<F, Bound>, ServerError> {
        let std_listener = StdTcpListener::bind(addr).map_err(ServerError::Bind)?;
        self.into_bound(std_listener)
    }

    /// Adopt an already bound listener.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if configuring the listener fails.
    pub fn bind_existing_listener(
        self,
        std_listener: StdTcpListener,
    ) -> Result<Server<F, Bound>, ServerError> {
        self.into_bound(std_listener)
    }
}

impl<F: RouterFactory> Server<F, Bound> {
    /// The bound address, or `None` if it cannot be read.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> { self.state.listener.local_addr().ok() }

    /// Rebind to `addr`, dropping the current listener.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if binding or configuring the listener
    /// fails.
    pub fn bind(self, addr: SocketAddr) -> Result<Self, ServerError> {
        let std_listener = StdTcpListener::bind(addr).map_err(ServerError::Bind)?;
        self.into_bound(std_listener)
    }
}
