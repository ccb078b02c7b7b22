//! Drive routers through a connection pool over duplex streams.

use std::{
    io,
    net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener},
};

use scorewire::{
    pool::{ConnectionPool, PoolConfig},
    router::Router,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

/// Duplex buffer size used by [`drive_router`].
pub const DEFAULT_CAPACITY: usize = 4096;

/// Write `frames` to a fresh pool connection, close the client's write
/// half and return every byte the server sent back.
///
/// The pool runs one worker with a router built by `factory` and is shut
/// down before returning.
///
/// # Errors
///
/// Returns any I/O error raised while writing frames or reading replies.
pub async fn drive_router<R, F>(factory: F, frames: Vec<Vec<u8>>) -> io::Result<Vec<u8>>
where
    R: Router,
    F: Fn() -> R + Send + Sync + 'static,
{
    drive_router_with_capacity(factory, frames, DEFAULT_CAPACITY).await
}

/// As [`drive_router`], with an explicit duplex buffer size.
///
/// # Errors
///
/// Returns any I/O error raised while writing frames or reading replies.
pub async fn drive_router_with_capacity<R, F>(
    factory: F,
    frames: Vec<Vec<u8>>,
    capacity: usize,
) -> io::Result<Vec<u8>>
where
    R: Router,
    F: Fn() -> R + Send + Sync + 'static,
{
    let pool = ConnectionPool::start(
        PoolConfig {
            workers: 1,
            ..PoolConfig::default()
        },
        factory,
    );
    let (mut client, server) = duplex(capacity);
    pool.accept_stream(server, None)
        .map_err(|e| io::Error::other(e.to_string()))?;

    // Read concurrently so large replies cannot fill the duplex buffer while
    // frames are still being written.
    let writer = async {
        let (mut rx, mut tx) = tokio::io::split(&mut client);
        let write = async {
            for frame in &frames {
                tx.write_all(frame).await?;
            }
            tx.shutdown().await
        };
        let mut buf = Vec::new();
        let read = rx.read_to_end(&mut buf);
        tokio::try_join!(write, read)?;
        io::Result::Ok(buf)
    };
    let output = writer.await;
    pool.shutdown().await;
    output
}

/// Bind a listener on a free localhost port.
///
/// # Errors
///
/// Returns any I/O error raised while binding.
pub fn unused_listener() -> io::Result<StdTcpListener> {
    StdTcpListener::bind(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0))
}
