//! In-memory [`Database`] used by tests and the demo binary.
//!
//! Clones share one store, so every worker's router observes the same
//! accounts and tournaments.

use std::{cmp::Reverse, collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use log::debug;
use parking_lot::RwLock;

use super::{Database, DatabaseError, Query, Rows};
use crate::value::{Row, Value};

/// Score sent for a match that has not been played yet.
pub const UNPLAYED_SCORE: i64 = -1;

/// Points a participant earned, per round or in total.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Score {
    /// Predictions that matched the final score exactly.
    pub exact_scores: i64,
    /// Predictions that only matched the winner or a draw.
    pub predicted_results: i64,
    /// Points awarded.
    pub points: i64,
}

impl Score {
    fn add(&mut self, other: Score) {
        self.exact_scores += other.exact_scores;
        self.predicted_results += other.predicted_results;
        self.points += other.points;
    }
}

/// A match scheduled in a round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fixture {
    /// Home side.
    pub competitor_1: String,
    /// Away side.
    pub competitor_2: String,
    /// Final score, `None` until played.
    pub score: Option<(i64, i64)>,
    /// Deadline for predictions.
    pub predictions_end: DateTime<Utc>,
}

impl Fixture {
    fn to_row(&self) -> Row {
        let (s1, s2) = self.score.unwrap_or((UNPLAYED_SCORE, UNPLAYED_SCORE));
        vec![
            Value::from(self.competitor_1.as_str()),
            Value::from(self.competitor_2.as_str()),
            Value::Int(s1),
            Value::Int(s2),
            Value::from(self.predictions_end),
        ]
    }
}

/// A participant's predicted score for one match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prediction {
    /// Home side of the predicted match.
    pub competitor_1: String,
    /// Away side of the predicted match.
    pub competitor_2: String,
    /// Predicted goals, home then away.
    pub score: (i64, i64),
}

impl Prediction {
    fn to_row(&self) -> Row {
        vec![
            Value::from(self.competitor_1.as_str()),
            Value::from(self.competitor_2.as_str()),
            Value::Int(self.score.0),
            Value::Int(self.score.1),
        ]
    }
}

#[derive(Default)]
struct Round {
    name: String,
    fixtures: Vec<Fixture>,
    scores: HashMap<String, Score>,
    predictions: HashMap<String, Vec<Prediction>>,
}

#[derive(Default)]
struct Tournament {
    participants: Vec<String>,
    rounds: Vec<Round>,
    finished: bool,
}

impl Tournament {
    fn round(&self, name: &str) -> Option<&Round> { self.rounds.iter().find(|r| r.name == name) }

    fn round_mut(&mut self, name: &str) -> Option<&mut Round> {
        self.rounds.iter_mut().find(|r| r.name == name)
    }

    fn standings(&self, score: impl Fn(&str) -> Score) -> Vec<Row> {
        let mut table: Vec<_> = self
            .participants
            .iter()
            .map(|nick| (nick.as_str(), score(nick.as_str())))
            .collect();
        table.sort_by_key(|(nick, s)| (Reverse(s.points), Reverse(s.exact_scores), *nick));
        table
            .into_iter()
            .map(|(nick, s)| {
                vec![
                    Value::from(nick),
                    Value::Int(s.exact_scores),
                    Value::Int(s.predicted_results),
                    Value::Int(s.points),
                ]
            })
            .collect()
    }
}

#[derive(Default)]
struct State {
    offline: bool,
    users: HashMap<String, String>,
    tournaments: HashMap<(String, String), Tournament>,
}

impl State {
    fn tournament(&self, name: &str, host: &str) -> Option<&Tournament> {
        self.tournaments.get(&(name.to_owned(), host.to_owned()))
    }

    fn tournament_mut(&mut self, name: &str, host: &str) -> Result<&mut Tournament, DatabaseError> {
        self.tournaments
            .get_mut(&(name.to_owned(), host.to_owned()))
            .ok_or_else(|| DatabaseError::NotFound {
                kind: "tournament",
                name: format!("{name}@{host}"),
            })
    }

    fn round_mut(&mut self, name: &str, host: &str, round: &str) -> Result<&mut Round, DatabaseError> {
        self.tournament_mut(name, host)?
            .round_mut(round)
            .ok_or_else(|| DatabaseError::NotFound {
                kind: "round",
                name: round.to_owned(),
            })
    }
}

/// Shared in-memory store.
///
/// # Examples
///
/// ```
/// use scorewire::database::{Database, MemoryDatabase, Query};
///
/// let db = MemoryDatabase::default();
/// assert!(db.add_user("alice", "secret"));
///
/// let mut handle = db.clone();
/// let known = handle.check(Query::UserExists { nickname: "alice" });
/// assert_eq!(known, Ok(true));
/// ```
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<RwLock<State>>,
}

impl MemoryDatabase {
    /// Register an account. Returns `false` if the nickname is taken.
    pub fn add_user(&self, nickname: &str, password: &str) -> bool {
        let mut state = self.state.write();
        if state.users.contains_key(nickname) {
            return false;
        }
        state.users.insert(nickname.to_owned(), password.to_owned());
        true
    }

    /// Create a tournament hosted by a registered user.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NotFound`] when `host` is not registered.
    pub fn add_tournament(&self, name: &str, host: &str) -> Result<(), DatabaseError> {
        let mut state = self.state.write();
        if !state.users.contains_key(host) {
            return Err(DatabaseError::NotFound {
                kind: "user",
                name: host.to_owned(),
            });
        }
        state
            .tournaments
            .entry((name.to_owned(), host.to_owned()))
            .or_default();
        Ok(())
    }

    /// Add a participant to a tournament; repeated joins are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NotFound`] for an unknown tournament.
    pub fn add_participant(&self, name: &str, host: &str, nickname: &str) -> Result<(), DatabaseError> {
        let mut state = self.state.write();
        let tournament = state.tournament_mut(name, host)?;
        if !tournament.participants.iter().any(|p| p == nickname) {
            tournament.participants.push(nickname.to_owned());
        }
        Ok(())
    }

    /// Append a round to a tournament.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NotFound`] for an unknown tournament.
    pub fn add_round(&self, name: &str, host: &str, round: &str) -> Result<(), DatabaseError> {
        let mut state = self.state.write();
        let tournament = state.tournament_mut(name, host)?;
        if tournament.round(round).is_none() {
            tournament.rounds.push(Round {
                name: round.to_owned(),
                ..Round::default()
            });
        }
        Ok(())
    }

    /// Mark a tournament as finished.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NotFound`] for an unknown tournament.
    pub fn finish_tournament(&self, name: &str, host: &str) -> Result<(), DatabaseError> {
        self.state.write().tournament_mut(name, host)?.finished = true;
        Ok(())
    }

    /// Schedule a match in a round.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NotFound`] for an unknown tournament or round.
    pub fn add_fixture(&self, name: &str, host: &str, round: &str, fixture: Fixture) -> Result<(), DatabaseError> {
        self.state
            .write()
            .round_mut(name, host, round)?
            .fixtures
            .push(fixture);
        Ok(())
    }

    /// Add `score` to a participant's result in a round.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NotFound`] for an unknown tournament or round.
    pub fn record_score(
        &self,
        name: &str,
        host: &str,
        round: &str,
        nickname: &str,
        score: Score,
    ) -> Result<(), DatabaseError> {
        self.state
            .write()
            .round_mut(name, host, round)?
            .scores
            .entry(nickname.to_owned())
            .or_default()
            .add(score);
        Ok(())
    }

    /// Store a participant's prediction in a round.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NotFound`] for an unknown tournament or round.
    pub fn add_prediction(
        &self,
        name: &str,
        host: &str,
        round: &str,
        nickname: &str,
        prediction: Prediction,
    ) -> Result<(), DatabaseError> {
        self.state
            .write()
            .round_mut(name, host, round)?
            .predictions
            .entry(nickname.to_owned())
            .or_default()
            .push(prediction);
        Ok(())
    }

    /// Simulate losing (or regaining) the backing store.
    pub fn set_available(&self, available: bool) { self.state.write().offline = !available; }

    fn rows_for(state: &State, query: Query<'_>) -> Result<Vec<Row>, DatabaseError> {
        let rows = match query {
            Query::UserTournaments { nickname, ongoing } => {
                let mut joined: Vec<_> = state
                    .tournaments
                    .iter()
                    .filter(|(_, t)| t.finished != ongoing && t.participants.iter().any(|p| p == nickname))
                    .map(|((name, host), _)| (name.as_str(), host.as_str()))
                    .collect();
                joined.sort_unstable();
                Some(
                    joined
                        .into_iter()
                        .map(|(name, host)| vec![Value::from(name), Value::from(host)])
                        .collect(),
                )
            }
            Query::TournamentLeaderboard { name, host } => state
                .tournament(name, host)
                .map(|t| {
                    t.standings(|nick| {
                        let mut total = Score::default();
                        for round in &t.rounds {
                            total.add(round.scores.get(nick).copied().unwrap_or_default());
                        }
                        total
                    })
                }),
            Query::RoundLeaderboard {
                tournament,
                host,
                round,
            } => state.tournament(tournament, host).and_then(|t| {
                t.round(round).map(|r| {
                    t.standings(|nick| r.scores.get(nick).copied().unwrap_or_default())
                })
            }),
            Query::Matches {
                tournament,
                host,
                round,
            } => state
                .tournament(tournament, host)
                .and_then(|t| t.round(round))
                .map(|r| r.fixtures.iter().map(Fixture::to_row).collect()),
            Query::Predictions {
                requester,
                tournament,
                host,
                round,
            } => state
                .tournament(tournament, host)
                .and_then(|t| t.round(round))
                .map(|r| {
                    r.predictions
                        .get(requester)
                        .map(|p| p.iter().map(Prediction::to_row).collect())
                        .unwrap_or_default()
                }),
            other => {
                return Err(DatabaseError::Unsupported {
                    query: other.name(),
                });
            }
        };
        Ok(rows.unwrap_or_default())
    }
}

impl Database for MemoryDatabase {
    fn check(&mut self, query: Query<'_>) -> Result<bool, DatabaseError> {
        if self.state.read().offline {
            return Err(DatabaseError::Unavailable("memory store offline".into()));
        }
        debug!("database check: query={}", query.name());
        match query {
            Query::RegisterUser { nickname, password } => Ok(self.add_user(nickname, password)),
            Query::UserExists { nickname } => Ok(self.state.read().users.contains_key(nickname)),
            Query::PasswordMatches { nickname, password } => {
                Ok(self.state.read().users.get(nickname).is_some_and(|p| p == password))
            }
            Query::TournamentExists { name, host } => {
                Ok(self.state.read().tournament(name, host).is_some())
            }
            Query::RoundExists {
                tournament,
                host,
                round,
            } => Ok(self
                .state
                .read()
                .tournament(tournament, host)
                .is_some_and(|t| t.round(round).is_some())),
            other => Err(DatabaseError::Unsupported {
                query: other.name(),
            }),
        }
    }

    fn rows(&mut self, query: Query<'_>) -> Result<Rows<'_>, DatabaseError> {
        let state = self.state.read();
        if state.offline {
            return Err(DatabaseError::Unavailable("memory store offline".into()));
        }
        debug!("database rows: query={}", query.name());
        let rows = Self::rows_for(&state, query)?;
        Ok(Box::new(rows.into_iter()))
    }
}
