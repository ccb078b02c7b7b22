//! Shared fixtures for integration tests.
//!
//! Provides a seeded in-memory store and a helper that runs the tournament
//! server on a free local port until the returned guard is shut down.

// Not every test binary uses every helper.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::net::SocketAddr;

use chrono::{TimeZone, Utc};
use rstest::fixture;
use scorewire::{
    ChunkSizes,
    Config,
    ServerError,
    TournamentRouter,
    database::{
        MemoryDatabase,
        memory::{Fixture, Prediction, Score},
    },
};
use scorewire_testing::{TestResult, unused_listener};
use tokio::{sync::oneshot, task::JoinHandle};

pub const CUP: &str = "Cup";
pub const HOST: &str = "host";
pub const FINAL: &str = "Final";

/// Store with one tournament, one round, `players` scored participants and
/// three fixtures each with a prediction by `p0`.
pub fn seeded(players: i64) -> MemoryDatabase {
    let db = MemoryDatabase::default();
    db.add_user(HOST, "pw");
    db.add_tournament(CUP, HOST).expect("host registered");
    db.add_round(CUP, HOST, FINAL).expect("tournament exists");
    let end = Utc
        .with_ymd_and_hms(2030, 6, 1, 18, 0, 0)
        .single()
        .expect("valid timestamp");
    for n in 0..3 {
        db.add_fixture(
            CUP,
            HOST,
            FINAL,
            Fixture {
                competitor_1: format!("home{n}"),
                competitor_2: format!("away{n}"),
                score: (n == 0).then_some((1, 0)),
                predictions_end: end,
            },
        )
        .expect("round exists");
    }
    for n in 0..players {
        let nick = format!("p{n}");
        db.add_user(&nick, "pw");
        db.add_participant(CUP, HOST, &nick).expect("tournament exists");
        let score = Score {
            points: n,
            ..Score::default()
        };
        db.record_score(CUP, HOST, FINAL, &nick, score)
            .expect("round exists");
    }
    if players > 0 {
        for n in 0..3 {
            let prediction = Prediction {
                competitor_1: format!("home{n}"),
                competitor_2: format!("away{n}"),
                score: (2, 2),
            };
            db.add_prediction(CUP, HOST, FINAL, "p0", prediction)
                .expect("participant exists");
        }
    }
    db
}

#[fixture]
pub fn db() -> MemoryDatabase { seeded(7) }

/// A server running in the background.
pub struct Running {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl Running {
    /// Signal shutdown and wait for the server to drain.
    pub async fn stop(mut self) -> TestResult {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await??;
        Ok(())
    }
}

/// Serve `db` through `config` on a free port.
pub async fn serve(db: MemoryDatabase, config: Config) -> TestResult<Running> {
    let chunks: ChunkSizes = config.chunks;
    let (ready_tx, ready_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = config
        .server(move || TournamentRouter::new(db.clone()).chunk_sizes(chunks))
        .ready_signal(ready_tx)
        .bind_existing_listener(unused_listener()?)?;
    let addr = server.local_addr().ok_or("bound server has an address")?;
    let handle = tokio::spawn(server.run_with_shutdown(async {
        let _ = shutdown_rx.await;
    }));
    ready_rx.await?;
    Ok(Running {
        addr,
        shutdown: Some(shutdown_tx),
        handle,
    })
}
