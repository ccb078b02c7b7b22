//! Command line interface for the `scorewire` server binary.
//!
//! Shared with `build.rs`, which renders the man page from it, so this file
//! must not depend on the library crate.

use std::{net::SocketAddr, time::Duration};

use clap::Parser;

/// Command line arguments for the `scorewire` binary.
#[derive(Debug, Parser)]
#[command(
    name = "scorewire",
    version,
    about = "Tournament prediction server speaking the scorewire packet protocol"
)]
pub struct Cli {
    /// Address to listen on.
    #[arg(short, long, default_value = "0.0.0.0:7000")]
    pub bind: SocketAddr,

    /// Number of request workers; defaults to the available parallelism.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Rows per leaderboard chunk.
    #[arg(long, default_value_t = 50)]
    pub leaderboard_chunk: usize,

    /// Rows per match or prediction chunk.
    #[arg(long, default_value_t = 40)]
    pub match_chunk: usize,

    /// Close connections idle for this many seconds.
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub idle_timeout: Option<Duration>,

    /// Serve Prometheus metrics on this address.
    #[arg(long, value_name = "ADDR")]
    pub metrics_addr: Option<SocketAddr>,

    /// Seed the in-memory store with a demo tournament.
    #[arg(long)]
    pub demo: bool,
}

fn parse_seconds(raw: &str) -> Result<Duration, String> {
    match raw.parse::<u64>() {
        Ok(0) => Err("timeout must be positive".into()),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn defaults_match_protocol_constants() {
        let cli = Cli::parse_from(["scorewire"]);
        assert_eq!(cli.bind.port(), 7000);
        assert_eq!(cli.leaderboard_chunk, 50);
        assert_eq!(cli.match_chunk, 40);
        assert!(cli.idle_timeout.is_none());
        assert!(!cli.demo);
    }

    #[test]
    fn parses_overrides() {
        let cli = Cli::parse_from([
            "scorewire",
            "--bind",
            "127.0.0.1:9000",
            "--workers",
            "3",
            "--idle-timeout",
            "30",
            "--demo",
        ]);
        assert_eq!(cli.workers, Some(3));
        assert_eq!(cli.idle_timeout, Some(Duration::from_secs(30)));
        assert!(cli.demo);
    }

    #[test]
    fn rejects_zero_idle_timeout() {
        assert!(Cli::try_parse_from(["scorewire", "--idle-timeout", "0"]).is_err());
    }
}
