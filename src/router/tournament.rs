//! Router for the tournament-prediction requests.
//!
//! Request arguments are positional text values:
//!
//! | Request | Arguments |
//! |---|---|
//! | `REGISTER`, `LOGIN` | nickname, password |
//! | `DOWNLOAD_TOURNAMENT_LEADERBOARD` | tournament, host |
//! | `DOWNLOAD_ROUND_LEADERBOARD`, `PULL_MATCHES` | tournament, host, round |
//! | `PULL_MATCHES_PREDICTIONS` | requester, tournament, host, round |
//! | `PULL_ONGOING_TOURNAMENTS`, `PULL_FINISHED_TOURNAMENTS` | nickname |
//!
//! Leaderboards, matches and predictions are streamed through
//! [`ChunkSizes`]; a user's tournament list is one reply. Application
//! failures such as a wrong password are ordinary replies; unknown or
//! malformed requests and database failures produce an [`catalog::ERROR`]
//! reply.

use log::{debug, warn};
use thiserror::Error;

use crate::{
    chunker::{ChunkSizes, ChunkSpec},
    connection::{ConnectionGone, Replies},
    database::{Database, DatabaseError, Query},
    message::{Message, MessageId, catalog},
    router::Router,
    value::Value,
};

/// Reply when the named tournament is unknown.
pub const TOURNAMENT_MISSING: &str = "This tournament does not exist.";
/// Reply when the named round is unknown.
pub const ROUND_MISSING: &str = "This round does not exist.";
/// Reply when the named user is unknown.
pub const USER_MISSING: &str = "User does not exist.";
/// Reply to a request id this router does not serve.
pub const UNSUPPORTED_REQUEST: &str = "Unsupported request.";
/// Reply to an id that only ever travels from server to client.
pub const NOT_A_REQUEST: &str = "This message type cannot be sent as a request.";
/// Reply to a request whose arguments have the wrong shape.
pub const MALFORMED_REQUEST: &str = "Malformed request.";
/// Reply when the store fails before anything was sent.
pub const DATABASE_FAILURE: &str = "A problem occurred. Try again later.";

#[derive(Debug, Error)]
enum RouteError {
    #[error("unsupported request {0}")]
    Unsupported(MessageId),
    #[error("reply-only id {0} sent as a request")]
    NotARequest(MessageId),
    #[error("request {id} expects {expected} text arguments")]
    Malformed { id: MessageId, expected: usize },
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Gone(#[from] ConnectionGone),
}

impl RouteError {
    fn reply_text(&self) -> &'static str {
        match self {
            Self::Unsupported(_) => UNSUPPORTED_REQUEST,
            Self::NotARequest(_) => NOT_A_REQUEST,
            Self::Malformed { .. } => MALFORMED_REQUEST,
            Self::Database(_) | Self::Gone(_) => DATABASE_FAILURE,
        }
    }
}

type RouteResult = Result<(), RouteError>;

/// Extract exactly `N` text arguments.
fn texts<const N: usize>(request: &Message) -> Result<[&str; N], RouteError> {
    let malformed = || RouteError::Malformed {
        id: request.id(),
        expected: N,
    };
    let args: Vec<&str> = request
        .values()
        .iter()
        .map(Value::as_text)
        .collect::<Option<_>>()
        .ok_or_else(malformed)?;
    <[&str; N]>::try_from(args).map_err(|_| malformed())
}

fn error_reply(text: &str) -> Message { Message::new(catalog::ERROR).with(text) }

/// Business router backed by a [`Database`].
///
/// # Examples
///
/// ```
/// use scorewire::{
///     connection::Replies,
///     database::MemoryDatabase,
///     message::{Message, catalog},
///     router::{Router, TournamentRouter},
///     value::Value,
/// };
///
/// let db = MemoryDatabase::default();
/// db.add_user("alice", "secret");
/// let mut router = TournamentRouter::new(db);
///
/// let mut replies = Replies::buffered();
/// router.deliver(
///     Message::new(catalog::LOGIN).with("alice").with("secret"),
///     &mut replies,
/// );
/// let reply = &replies.into_messages()[0];
/// assert_eq!(reply.get(1), Some(&Value::Bool(true)));
/// ```
pub struct TournamentRouter<D> {
    db: D,
    chunks: ChunkSizes,
}

impl<D: Database> TournamentRouter<D> {
    /// Route requests against `db` with default chunk sizes.
    pub fn new(db: D) -> Self {
        Self {
            db,
            chunks: ChunkSizes::default(),
        }
    }

    /// Override the rows sent per chunk.
    #[must_use]
    pub fn chunk_sizes(mut self, chunks: ChunkSizes) -> Self {
        self.chunks = chunks;
        self
    }

    fn route(&mut self, request: &Message, replies: &mut Replies) -> RouteResult {
        if !catalog::is_request(request.id()) {
            return Err(RouteError::NotARequest(request.id()));
        }
        match request.id() {
            catalog::REGISTER => self.register(request, replies),
            catalog::LOGIN => self.login(request, replies),
            catalog::DOWNLOAD_TOURNAMENT_LEADERBOARD => self.tournament_leaderboard(request, replies),
            catalog::DOWNLOAD_ROUND_LEADERBOARD => self.round_leaderboard(request, replies),
            catalog::PULL_MATCHES => self.matches(request, replies),
            catalog::PULL_MATCHES_PREDICTIONS => self.predictions(request, replies),
            catalog::PULL_ONGOING_TOURNAMENTS => self.user_tournaments(request, true, replies),
            catalog::PULL_FINISHED_TOURNAMENTS => self.user_tournaments(request, false, replies),
            other => Err(RouteError::Unsupported(other)),
        }
    }

    fn register(&mut self, request: &Message, replies: &mut Replies) -> RouteResult {
        let [nickname, password] = texts(request)?;
        let reply = Message::new(catalog::REGISTER);
        let reply = if self.db.check(Query::UserExists { nickname })? {
            reply.with(false).with("This nickname is already occupied")
        } else if self.db.check(Query::RegisterUser { nickname, password })? {
            debug!("user registered: nickname={nickname}");
            reply.with(true).with("Your account has been successfully created")
        } else {
            reply.with(false).with("Account could not be created")
        };
        Ok(replies.send(reply)?)
    }

    fn login(&mut self, request: &Message, replies: &mut Replies) -> RouteResult {
        let [nickname, password] = texts(request)?;
        let reply = Message::new(catalog::LOGIN);
        let reply = if !self.db.check(Query::UserExists { nickname })? {
            reply.with(false).with(false).with("Invalid nickname")
        } else if self.db.check(Query::PasswordMatches { nickname, password })? {
            reply.with(true).with(true).with(nickname)
        } else {
            reply.with(true).with(false).with("Invalid password")
        };
        Ok(replies.send(reply)?)
    }

    fn user_tournaments(&mut self, request: &Message, ongoing: bool, replies: &mut Replies) -> RouteResult {
        let [nickname] = texts(request)?;
        if !self.db.check(Query::UserExists { nickname })? {
            return Ok(replies.send(error_reply(USER_MISSING))?);
        }
        let rows = self.db.rows(Query::UserTournaments { nickname, ongoing })?;
        let reply = Message::from_values(request.id(), rows.map(Value::List).collect());
        Ok(replies.send(reply)?)
    }

    /// Reply with `ERROR` and return `false` unless the tournament and, if
    /// given, the round exist.
    fn require(
        &mut self,
        tournament: &str,
        host: &str,
        round: Option<&str>,
        replies: &mut Replies,
    ) -> Result<bool, RouteError> {
        if !self.db.check(Query::TournamentExists {
            name: tournament,
            host,
        })? {
            replies.send(error_reply(TOURNAMENT_MISSING))?;
            return Ok(false);
        }
        if let Some(round) = round
            && !self.db.check(Query::RoundExists {
                tournament,
                host,
                round,
            })?
        {
            replies.send(error_reply(ROUND_MISSING))?;
            return Ok(false);
        }
        Ok(true)
    }

    fn stream(&mut self, spec: ChunkSpec, query: Query<'_>, replies: &mut Replies) -> RouteResult {
        let rows = self.db.rows(query)?;
        Ok(replies.send_all(spec.chunk(rows))?)
    }

    fn tournament_leaderboard(&mut self, request: &Message, replies: &mut Replies) -> RouteResult {
        let [name, host] = texts(request)?;
        if !self.require(name, host, None, replies)? {
            return Ok(());
        }
        let spec = self.chunks.tournament_leaderboard();
        self.stream(spec, Query::TournamentLeaderboard { name, host }, replies)
    }

    fn round_leaderboard(&mut self, request: &Message, replies: &mut Replies) -> RouteResult {
        let [tournament, host, round] = texts(request)?;
        if !self.require(tournament, host, Some(round), replies)? {
            return Ok(());
        }
        let spec = self.chunks.round_leaderboard();
        let query = Query::RoundLeaderboard {
            tournament,
            host,
            round,
        };
        self.stream(spec, query, replies)
    }

    fn matches(&mut self, request: &Message, replies: &mut Replies) -> RouteResult {
        let [tournament, host, round] = texts(request)?;
        if !self.require(tournament, host, Some(round), replies)? {
            return Ok(());
        }
        let spec = self.chunks.matches();
        let query = Query::Matches {
            tournament,
            host,
            round,
        };
        self.stream(spec, query, replies)
    }

    fn predictions(&mut self, request: &Message, replies: &mut Replies) -> RouteResult {
        let [requester, tournament, host, round] = texts(request)?;
        if !self.db.check(Query::UserExists {
            nickname: requester,
        })? {
            return Ok(replies.send(error_reply(USER_MISSING))?);
        }
        if !self.require(tournament, host, Some(round), replies)? {
            return Ok(());
        }
        let spec = self.chunks.predictions();
        let query = Query::Predictions {
            requester,
            tournament,
            host,
            round,
        };
        self.stream(spec, query, replies)
    }
}

impl<D: Database> Router for TournamentRouter<D> {
    fn deliver(&mut self, request: Message, replies: &mut Replies) {
        let err = match self.route(&request, replies) {
            Ok(()) => return,
            Err(RouteError::Gone(_)) => {
                debug!("connection gone while replying: id={}", request.id());
                return;
            }
            Err(err) => err,
        };
        // A partially streamed collection cannot be retracted.
        if replies.sent() > 0 {
            warn!("request failed mid-reply: id={}, error={err}", request.id());
            return;
        }
        warn!("request failed: id={}, error={err}", request.id());
        if replies.send(error_reply(err.reply_text())).is_err() {
            debug!("connection gone before error reply: id={}", request.id());
        }
    }
}
