//! Database collaborator consumed by the tournament router.
//!
//! The store is reached through two entry points: [`Database::check`] for
//! existence and success questions, and [`Database::rows`] for forward-only
//! row cursors that the router hands straight to a
//! [`ResponseChunker`](crate::chunker::ResponseChunker).
//!
//! Each pool worker owns its own router and therefore its own handle, so an
//! implementation never sees two concurrent calls through the same value.

use thiserror::Error;

use crate::value::Row;

pub mod memory;

pub use memory::MemoryDatabase;

/// Forward-only cursor over query results.
pub type Rows<'a> = Box<dyn Iterator<Item = Row> + Send + 'a>;

/// Parametrized queries understood by a [`Database`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Query<'a> {
    /// Is `nickname` registered?
    UserExists { nickname: &'a str },
    /// Does `password` belong to `nickname`?
    PasswordMatches { nickname: &'a str, password: &'a str },
    /// Create an account; `false` when it could not be created.
    RegisterUser { nickname: &'a str, password: &'a str },
    /// Does `host` run a tournament called `name`?
    TournamentExists { name: &'a str, host: &'a str },
    /// Does the tournament have a round called `round`?
    RoundExists {
        tournament: &'a str,
        host: &'a str,
        round: &'a str,
    },
    /// Tournaments `nickname` takes part in: `[name, host]`, ongoing ones
    /// when `ongoing` is set and finished ones otherwise.
    UserTournaments { nickname: &'a str, ongoing: bool },
    /// Overall standings: `[nickname, exact_scores, predicted_results, points]`.
    TournamentLeaderboard { name: &'a str, host: &'a str },
    /// Standings of one round, same shape as the tournament leaderboard.
    RoundLeaderboard {
        tournament: &'a str,
        host: &'a str,
        round: &'a str,
    },
    /// Matches of a round: `[competitor_1, competitor_2, score_1, score_2,
    /// predictions_end]`.
    Matches {
        tournament: &'a str,
        host: &'a str,
        round: &'a str,
    },
    /// Predictions `requester` made in a round: `[competitor_1,
    /// competitor_2, predicted_1, predicted_2]`.
    Predictions {
        requester: &'a str,
        tournament: &'a str,
        host: &'a str,
        round: &'a str,
    },
}

impl Query<'_> {
    /// Short name used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserExists { .. } => "user_exists",
            Self::PasswordMatches { .. } => "password_matches",
            Self::RegisterUser { .. } => "register_user",
            Self::TournamentExists { .. } => "tournament_exists",
            Self::RoundExists { .. } => "round_exists",
            Self::UserTournaments { .. } => "user_tournaments",
            Self::TournamentLeaderboard { .. } => "tournament_leaderboard",
            Self::RoundLeaderboard { .. } => "round_leaderboard",
            Self::Matches { .. } => "matches",
            Self::Predictions { .. } => "predictions",
        }
    }

    /// Returns `true` for queries answered by [`Database::rows`].
    #[must_use]
    pub fn returns_rows(&self) -> bool {
        matches!(
            self,
            Self::UserTournaments { .. }
                | Self::TournamentLeaderboard { .. }
                | Self::RoundLeaderboard { .. }
                | Self::Matches { .. }
                | Self::Predictions { .. }
        )
    }
}

/// Failures reported by a [`Database`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DatabaseError {
    /// The query was sent to the wrong entry point.
    #[error("query {query} is not supported by this entry point")]
    Unsupported { query: &'static str },
    /// Seeding referred to a record that does not exist.
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },
    /// The backing store could not be reached.
    #[error("database unavailable: {0}")]
    Unavailable(String),
}

/// Store queried by the router.
pub trait Database: Send + 'static {
    /// Answer an existence or success query.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] when the store fails or the query returns
    /// rows.
    fn check(&mut self, query: Query<'_>) -> Result<bool, DatabaseError>;

    /// Open a cursor over the rows of `query`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] when the store fails or the query is a
    /// check.
    fn rows(&mut self, query: Query<'_>) -> Result<Rows<'_>, DatabaseError>;
}
