//! Test helpers shared across server modules.

use std::net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener};

use rstest::fixture;

use super::{Bound, RouterFactory, Server};
use crate::{connection::Replies, message::Message, router::Router};

/// Router that answers every request with itself.
pub fn echo() -> impl Router {
    |request: Message, replies: &mut Replies| {
        let _ = replies.send(request);
    }
}

/// Factory building [`echo`] routers.
#[fixture]
pub fn factory() -> impl RouterFactory { echo }

/// A bound listener on a free port.
///
/// Keeping the listener bound prevents another process from claiming the
/// port before the server adopts it.
#[fixture]
pub fn free_listener() -> StdTcpListener {
    let addr = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0);
    StdTcpListener::bind(addr).expect("failed to bind free port listener")
}

/// Bind a two-worker server to `listener`.
pub fn bind_server<F: RouterFactory>(factory: F, listener: StdTcpListener) -> Server<F, Bound> {
    Server::new(factory)
        .workers(2)
        .bind_existing_listener(listener)
        .expect("failed to bind existing listener")
}
