//! `scorewire` server binary.
//!
//! Serves the tournament router over an in-memory store. Pass `--demo` to
//! start with a small seeded tournament.

mod cli;

use std::error::Error;

use chrono::{Duration as ChronoDuration, Utc};
use clap::Parser;
use log::info;
use scorewire::{
    ChunkSizes,
    Config,
    TournamentRouter,
    database::{
        DatabaseError,
        MemoryDatabase,
        memory::{Fixture, Prediction, Score},
    },
};

const DEMO_TOURNAMENT: &str = "Spring Cup";
const DEMO_HOST: &str = "admin";

fn seed_demo(db: &MemoryDatabase) -> Result<(), DatabaseError> {
    for nick in [DEMO_HOST, "alice", "bob", "carol"] {
        db.add_user(nick, "password");
    }
    db.add_tournament(DEMO_TOURNAMENT, DEMO_HOST)?;
    db.add_round(DEMO_TOURNAMENT, DEMO_HOST, "Round 1")?;
    let kickoff = Utc::now() + ChronoDuration::days(1);
    for (home, away, score) in [
        ("Lions", "Tigers", Some((2, 1))),
        ("Bears", "Wolves", None),
    ] {
        db.add_fixture(
            DEMO_TOURNAMENT,
            DEMO_HOST,
            "Round 1",
            Fixture {
                competitor_1: home.into(),
                competitor_2: away.into(),
                score,
                predictions_end: kickoff,
            },
        )?;
    }
    for (points, nick) in [(3, "alice"), (1, "bob"), (0, "carol")] {
        db.add_participant(DEMO_TOURNAMENT, DEMO_HOST, nick)?;
        let score = Score {
            exact_scores: i64::from(points == 3),
            predicted_results: i64::from(points > 0),
            points,
        };
        db.record_score(DEMO_TOURNAMENT, DEMO_HOST, "Round 1", nick, score)?;
        db.add_prediction(
            DEMO_TOURNAMENT,
            DEMO_HOST,
            "Round 1",
            nick,
            Prediction {
                competitor_1: "Lions".into(),
                competitor_2: "Tigers".into(),
                score: (2, 1),
            },
        )?;
    }
    Ok(())
}

#[cfg(feature = "metrics")]
fn install_metrics(addr: Option<std::net::SocketAddr>) -> Result<(), Box<dyn Error>> {
    if let Some(addr) = addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!("metrics exporter listening: addr={addr}");
    }
    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn install_metrics(addr: Option<std::net::SocketAddr>) -> Result<(), Box<dyn Error>> {
    if addr.is_some() {
        log::warn!("metrics support not compiled in; ignoring --metrics-addr");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    let mut config = Config::default()
        .bind(cli.bind)
        .idle_timeout(cli.idle_timeout)
        .metrics_addr(cli.metrics_addr)
        .chunk_sizes(ChunkSizes {
            leaderboard: cli.leaderboard_chunk,
            matches: cli.match_chunk,
            predictions: cli.match_chunk,
        });
    if let Some(workers) = cli.workers {
        config = config.workers(workers);
    }
    install_metrics(config.metrics_addr)?;

    let db = MemoryDatabase::default();
    if cli.demo {
        seed_demo(&db)?;
        info!("demo data seeded: tournament={DEMO_TOURNAMENT}, host={DEMO_HOST}");
    }

    let chunks = config.chunks;
    let server = config
        .server(move || TournamentRouter::new(db.clone()).chunk_sizes(chunks))
        .bind(config.bind)?;
    if let Some(addr) = server.local_addr() {
        info!("listening: addr={addr}");
    }
    server.run().await?;
    Ok(())
}
