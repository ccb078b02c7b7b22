//! End-to-end protocol behaviour over TCP.

mod common;

use std::time::Duration;

use common::{CUP, FINAL, HOST, db, serve};
use log::Level;
use rstest::rstest;
use scorewire::{
    ChunkSpec,
    Client,
    ClientError,
    Config,
    database::MemoryDatabase,
    message::{Message, catalog},
    value::Value,
};
use scorewire_testing::{LoggerHandle, TestResult, assert_error_reply, frame_bytes, recv_expect};
use serial_test::serial;

const CONNECT_TIMEOUT: Option<Duration> = Some(Duration::from_secs(5));

fn login(nick: &str, password: &str) -> Message {
    Message::new(catalog::LOGIN).with(nick).with(password)
}

/// A frame cut short by the next start marker is dropped with a warning
/// and the request after it is still served.
#[rstest]
#[serial]
#[tokio::test]
async fn frame_missing_end_marker_is_skipped(db: MemoryDatabase) -> TestResult {
    drop(LoggerHandle::new());
    let server = serve(db, Config::default().workers(1)).await?;
    let mut client = Client::connect(server.addr, CONNECT_TIMEOUT).await?;

    let mut truncated = frame_bytes(&login("p1", "pw"));
    truncated.pop();
    client.send_raw(&truncated).await?;
    client.send(&login("p1", "pw")).await?;

    let reply = recv_expect!(client.recv_message());
    assert_eq!(reply.id(), catalog::LOGIN);
    assert_eq!(reply.get(0), Some(&Value::Bool(true)));
    assert_eq!(reply.get(1), Some(&Value::Bool(true)));
    assert_eq!(reply.text(2), Some("p1"));

    // Still open after the corruption.
    client.send(&login("p1", "wrong")).await?;
    let reply = recv_expect!(client.recv_message());
    assert_eq!(reply.get(1), Some(&Value::Bool(false)));
    assert_eq!(reply.text(2), Some("Invalid password"));

    client.close().await?;
    server.stop().await?;

    let warnings = LoggerHandle::resume().take_matching(Level::Warn, "corrupted frame discarded");
    assert_eq!(warnings.len(), 1, "one warning per discarded frame: {warnings:?}");
    Ok(())
}

#[rstest]
#[tokio::test]
async fn register_then_login(db: MemoryDatabase) -> TestResult {
    let server = serve(db, Config::default()).await?;
    let mut client = Client::connect(server.addr, CONNECT_TIMEOUT).await?;

    let register = Message::new(catalog::REGISTER).with("newcomer").with("s3cret");
    client.send(&register).await?;
    let reply = recv_expect!(client.recv_message());
    assert_eq!(reply.get(0), Some(&Value::Bool(true)));

    client.send(&register).await?;
    let reply = recv_expect!(client.recv_message());
    assert_eq!(reply.get(0), Some(&Value::Bool(false)));
    assert_eq!(reply.text(1), Some("This nickname is already occupied"));

    client.send(&login("newcomer", "s3cret")).await?;
    let reply = recv_expect!(client.recv_message());
    assert_eq!(reply.text(2), Some("newcomer"));

    client.send(&login("ghost", "x")).await?;
    let reply = recv_expect!(client.recv_message());
    assert_eq!(reply.get(0), Some(&Value::Bool(false)));

    client.close().await?;
    server.stop().await
}

#[rstest]
#[tokio::test]
async fn collections_arrive_in_configured_chunks(db: MemoryDatabase) -> TestResult {
    let config = Config::default().chunk_sizes(scorewire::ChunkSizes {
        leaderboard: 3,
        matches: 2,
        predictions: 2,
    });
    let server = serve(db, config).await?;
    let mut client = Client::connect(server.addr, CONNECT_TIMEOUT).await?;

    client
        .send(&Message::new(catalog::DOWNLOAD_TOURNAMENT_LEADERBOARD).with(CUP).with(HOST))
        .await?;
    let mut sizes = Vec::new();
    loop {
        let message = recv_expect!(client.recv_message());
        if message.id() == catalog::TOURNAMENT_LEADERBOARD_PULLED {
            assert!(message.is_empty(), "end marker carries no payload");
            break;
        }
        assert_eq!(message.id(), catalog::DOWNLOAD_TOURNAMENT_LEADERBOARD);
        sizes.push(message.len());
    }
    assert_eq!(sizes, [3, 3, 1]);

    let matches = Message::new(catalog::PULL_MATCHES).with(CUP).with(HOST).with(FINAL);
    client.send(&matches).await?;
    let rows = client.recv_rows(&ChunkSpec::matches()).await?;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][2], Value::Int(1));
    assert_eq!(rows[1][2], Value::Int(-1), "unplayed fixtures report -1");

    client.close().await?;
    server.stop().await
}

#[rstest]
#[case::tournament(
    Message::new(catalog::DOWNLOAD_ROUND_LEADERBOARD).with("Nope").with(HOST).with(FINAL),
    "This tournament does not exist."
)]
#[case::round(
    Message::new(catalog::PULL_MATCHES).with(CUP).with(HOST).with("Semi"),
    "This round does not exist."
)]
#[case::user(
    Message::new(catalog::PULL_MATCHES_PREDICTIONS).with("ghost").with(CUP).with(HOST).with(FINAL),
    "User does not exist."
)]
#[case::unsupported(Message::new(catalog::CREATE_TOURNAMENT).with(CUP), "Unsupported request.")]
#[tokio::test]
async fn failures_reply_with_error(
    db: MemoryDatabase,
    #[case] request: Message,
    #[case] text: &str,
) -> TestResult {
    let server = serve(db, Config::default()).await?;
    let mut client = Client::connect(server.addr, CONNECT_TIMEOUT).await?;

    client.send(&request).await?;
    let reply = recv_expect!(client.recv_message());
    assert_error_reply!(reply, text);

    client.close().await?;
    server.stop().await
}

#[rstest]
#[tokio::test]
async fn unavailable_store_is_reported(db: MemoryDatabase) -> TestResult {
    let server = serve(db.clone(), Config::default()).await?;
    let mut client = Client::connect(server.addr, CONNECT_TIMEOUT).await?;
    db.set_available(false);

    client
        .send(&Message::new(catalog::DOWNLOAD_TOURNAMENT_LEADERBOARD).with(CUP).with(HOST))
        .await?;
    let err = client
        .recv_rows(&ChunkSpec::tournament_leaderboard())
        .await
        .expect_err("store offline");
    assert_eq!(
        err,
        ClientError::Rejected("A problem occurred. Try again later.".into())
    );

    client.close().await?;
    server.stop().await
}

#[rstest]
#[tokio::test]
async fn shutdown_closes_open_clients(db: MemoryDatabase) -> TestResult {
    let server = serve(db, Config::default()).await?;
    let mut client = Client::connect(server.addr, CONNECT_TIMEOUT).await?;
    client.send(&login("p2", "pw")).await?;
    let _ = recv_expect!(client.recv_message());

    server.stop().await?;
    assert_eq!(client.recv().await, Err(ClientError::Disconnected));
    Ok(())
}
