//! Tests for server runtime behaviour.

use std::{
    io,
    sync::{Arc, Mutex},
};

use futures::{SinkExt, StreamExt};
use rstest::rstest;
use tokio::{
    net::TcpStream,
    sync::oneshot,
    task::yield_now,
    time::{Duration, Instant, advance, timeout},
};
use tokio_util::{codec::Framed, sync::CancellationToken};

use super::{
    BackoffConfig,
    accept::{MockAcceptListener, accept_loop},
};
use crate::{
    codec::{Decoded, PacketCodec},
    message::{Message, catalog},
    pool::{ConnectionPool, PoolConfig},
    server::{
        RouterFactory,
        test_util::{bind_server, echo, factory, free_listener},
    },
};

fn small_pool() -> ConnectionPool {
    ConnectionPool::start(
        PoolConfig {
            workers: 1,
            ..PoolConfig::default()
        },
        echo,
    )
}

#[rstest]
#[tokio::test]
async fn run_with_immediate_shutdown(
    factory: impl RouterFactory,
    free_listener: std::net::TcpListener,
) {
    let server = bind_server(factory, free_listener);
    let shutdown = async { tokio::time::sleep(Duration::from_millis(10)).await };
    let result = timeout(Duration::from_secs(1), server.run_with_shutdown(shutdown)).await;
    assert!(result.expect("server did not finish in time").is_ok());
}

#[rstest]
#[tokio::test]
async fn serves_requests_until_shutdown(
    factory: impl RouterFactory,
    free_listener: std::net::TcpListener,
) {
    let (ready_tx, ready_rx) = oneshot::channel();
    let server = bind_server(factory, free_listener).ready_signal(ready_tx);
    let addr = server.local_addr().expect("bound address");
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.run_with_shutdown(async {
        let _ = stop_rx.await;
    }));
    ready_rx.await.expect("server ready");

    let stream = TcpStream::connect(addr).await.expect("connect");
    let mut client = Framed::new(stream, PacketCodec::default());
    let login = Message::new(catalog::LOGIN).with("alice").with("pw");
    client.send(login.clone()).await.expect("send");
    match client.next().await {
        Some(Ok(Decoded::Message(reply))) => assert_eq!(reply, login),
        other => panic!("expected echo, got {other:?}"),
    }

    let _ = stop_tx.send(());
    assert!(client.next().await.is_none(), "server closes the connection");
    handle
        .await
        .expect("join server task")
        .expect("server run failed");
}

#[rstest]
#[tokio::test]
async fn accept_loop_stops_on_shutdown() {
    let pool = small_pool();
    let token = CancellationToken::new();
    let listener = Arc::new(
        tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener"),
    );
    let handle = tokio::spawn(accept_loop(
        listener,
        pool.clone(),
        token.clone(),
        BackoffConfig::default(),
    ));

    token.cancel();
    let result = timeout(Duration::from_millis(100), handle).await;
    assert!(result.is_ok());
    pool.shutdown().await;
}

#[rstest]
#[tokio::test]
async fn accept_loop_stops_when_pool_closed() {
    let pool = small_pool();
    pool.close();
    let listener = Arc::new(
        tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener"),
    );
    let addr = listener.local_addr().expect("listener address");
    let handle = tokio::spawn(accept_loop(
        listener,
        pool.clone(),
        CancellationToken::new(),
        BackoffConfig::default(),
    ));

    let _client = TcpStream::connect(addr).await.expect("connect");
    let result = timeout(Duration::from_secs(1), handle).await;
    assert!(result.is_ok(), "closed pool ends the accept loop");
    pool.shutdown().await;
}

/// Mock listener whose `accept` always fails, recording call times.
fn failing_listener(calls: &Arc<Mutex<Vec<Instant>>>, num_calls: usize) -> MockAcceptListener {
    let mut listener = MockAcceptListener::new();
    let call_log = Arc::clone(calls);
    listener
        .expect_accept()
        .returning(move || {
            let call_log = Arc::clone(&call_log);
            Box::pin(async move {
                call_log.lock().expect("lock").push(Instant::now());
                Err(io::Error::other("mock error"))
            })
        })
        .times(num_calls);
    listener
        .expect_local_addr()
        .returning(|| Ok("127.0.0.1:0".parse().expect("addr parse")))
        .times(num_calls);
    listener
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn accept_failures_back_off_exponentially() {
    let pool = small_pool();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let listener = Arc::new(failing_listener(&calls, 4));
    let token = CancellationToken::new();
    let backoff = BackoffConfig {
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    };
    let handle = tokio::spawn(accept_loop(listener, pool.clone(), token.clone(), backoff));

    yield_now().await;
    assert_eq!(calls.lock().expect("lock").len(), 1);
    for ms in [5, 10, 20] {
        advance(Duration::from_millis(ms)).await;
        yield_now().await;
    }
    token.cancel();
    handle.await.expect("accept loop task");

    let calls = calls.lock().expect("lock");
    let intervals: Vec<_> = calls.windows(2).map(|w| w[1] - w[0]).collect();
    assert_eq!(
        intervals,
        [
            Duration::from_millis(5),
            Duration::from_millis(10),
            Duration::from_millis(20),
        ]
    );
    drop(calls);
    pool.shutdown().await;
}
