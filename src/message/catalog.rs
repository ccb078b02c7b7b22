//! Message-type identifiers of the tournament-prediction service.
//!
//! Several identifiers are used in both directions: a request carries the
//! caller's arguments and the reply with the same id carries the outcome.
//! [`ERROR`] is the generic failure reply. The `*_PULLED` and `ZERO_*`/
//! [`NO_PARTICIPANTS`] ids terminate chunked collection replies.

use super::MessageId;

/// Generic error reply carrying a human-readable reason.
pub const ERROR: MessageId = MessageId::new(0);
/// Greeting shown to a client after connecting.
pub const DOWNLOAD_STARTING_MESSAGE: MessageId = MessageId::new(1);
/// Create an account; the reply reports success and a reason.
pub const REGISTER: MessageId = MessageId::new(2);
/// Authenticate a nickname and password.
pub const LOGIN: MessageId = MessageId::new(3);
/// Fetch a user's profile.
pub const DOWNLOAD_USER_PROFILE_INFO: MessageId = MessageId::new(4);
/// List tournaments a user took part in that have finished.
pub const PULL_FINISHED_TOURNAMENTS: MessageId = MessageId::new(5);
/// List tournaments a user takes part in that are still running.
pub const PULL_ONGOING_TOURNAMENTS: MessageId = MessageId::new(6);
/// Change a profile description.
pub const UPDATE_USER_PROFILE_DESCRIPTION: MessageId = MessageId::new(7);
/// Profile description could not be changed.
pub const UPDATE_USER_PROFILE_DESCRIPTION_ERROR: MessageId = MessageId::new(8);
/// Change a profile avatar.
pub const UPDATE_USER_PROFILE_AVATAR: MessageId = MessageId::new(9);
/// Profile avatar could not be changed.
pub const UPDATE_USER_PROFILE_AVATAR_ERROR: MessageId = MessageId::new(10);
/// Create a tournament.
pub const CREATE_TOURNAMENT: MessageId = MessageId::new(11);
/// Search tournaments by name.
pub const PULL_TOURNAMENTS: MessageId = MessageId::new(12);
/// Join an open tournament.
pub const JOIN_TOURNAMENT: MessageId = MessageId::new(13);
/// Join a password-protected tournament.
pub const JOIN_TOURNAMENT_PASSWORD: MessageId = MessageId::new(14);
/// Fetch a tournament's details.
pub const DOWNLOAD_TOURNAMENT_INFO: MessageId = MessageId::new(15);
/// Close a tournament.
pub const FINISH_TOURNAMENT: MessageId = MessageId::new(16);
/// Add a round to a tournament.
pub const ADD_NEW_ROUND: MessageId = MessageId::new(17);
/// Tournament standings; replies are leaderboard chunks.
pub const DOWNLOAD_TOURNAMENT_LEADERBOARD: MessageId = MessageId::new(18);
/// Round standings; replies are leaderboard chunks.
pub const DOWNLOAD_ROUND_LEADERBOARD: MessageId = MessageId::new(19);
/// Fixtures of a round; replies are match chunks.
pub const PULL_MATCHES: MessageId = MessageId::new(20);
/// Add a fixture to a round.
pub const CREATE_MATCH: MessageId = MessageId::new(21);
/// Remove a fixture.
pub const DELETE_MATCH: MessageId = MessageId::new(22);
/// A fixture was removed.
pub const MATCH_DELETED: MessageId = MessageId::new(23);
/// A fixture could not be removed.
pub const MATCH_DELETING_ERROR: MessageId = MessageId::new(24);
/// Record a fixture's final score.
pub const UPDATE_MATCH_SCORE: MessageId = MessageId::new(25);
/// A user's predictions for a round; replies are prediction chunks.
pub const PULL_MATCHES_PREDICTIONS: MessageId = MessageId::new(26);
/// Submit a prediction.
pub const MAKE_PREDICTION: MessageId = MessageId::new(27);
/// Change a prediction.
pub const UPDATE_PREDICTION: MessageId = MessageId::new(28);
/// The requested round has no fixtures.
pub const ZERO_MATCHES_TO_PULL: MessageId = MessageId::new(29);
/// Last message of a match collection.
pub const ALL_MATCHES_PULLED: MessageId = MessageId::new(30);
/// The requested round has no predictions.
pub const ZERO_PREDICTIONS_TO_PULL: MessageId = MessageId::new(31);
/// Last message of a prediction collection.
pub const ALL_PREDICTIONS_PULLED: MessageId = MessageId::new(32);
/// The requested leaderboard is empty.
pub const NO_PARTICIPANTS: MessageId = MessageId::new(33);
/// Last message of a tournament leaderboard.
pub const TOURNAMENT_LEADERBOARD_PULLED: MessageId = MessageId::new(34);
/// Last message of a round leaderboard.
pub const ROUND_LEADERBOARD_PULLED: MessageId = MessageId::new(35);

/// Lowest identifier in the catalog.
pub const ID_MIN: MessageId = ERROR;
/// Highest identifier in the catalog.
pub const ID_MAX: MessageId = ROUND_LEADERBOARD_PULLED;

const NAMES: [&str; 36] = [
    "ERROR",
    "DOWNLOAD_STARTING_MESSAGE",
    "REGISTER",
    "LOGIN",
    "DOWNLOAD_USER_PROFILE_INFO",
    "PULL_FINISHED_TOURNAMENTS",
    "PULL_ONGOING_TOURNAMENTS",
    "UPDATE_USER_PROFILE_DESCRIPTION",
    "UPDATE_USER_PROFILE_DESCRIPTION_ERROR",
    "UPDATE_USER_PROFILE_AVATAR",
    "UPDATE_USER_PROFILE_AVATAR_ERROR",
    "CREATE_TOURNAMENT",
    "PULL_TOURNAMENTS",
    "JOIN_TOURNAMENT",
    "JOIN_TOURNAMENT_PASSWORD",
    "DOWNLOAD_TOURNAMENT_INFO",
    "FINISH_TOURNAMENT",
    "ADD_NEW_ROUND",
    "DOWNLOAD_TOURNAMENT_LEADERBOARD",
    "DOWNLOAD_ROUND_LEADERBOARD",
    "PULL_MATCHES",
    "CREATE_MATCH",
    "DELETE_MATCH",
    "MATCH_DELETED",
    "MATCH_DELETING_ERROR",
    "UPDATE_MATCH_SCORE",
    "PULL_MATCHES_PREDICTIONS",
    "MAKE_PREDICTION",
    "UPDATE_PREDICTION",
    "ZERO_MATCHES_TO_PULL",
    "ALL_MATCHES_PULLED",
    "ZERO_PREDICTIONS_TO_PULL",
    "ALL_PREDICTIONS_PULLED",
    "NO_PARTICIPANTS",
    "TOURNAMENT_LEADERBOARD_PULLED",
    "ROUND_LEADERBOARD_PULLED",
];

/// Identifiers that only ever travel from server to client.
const REPLY_ONLY: [MessageId; 12] = [
    ERROR,
    UPDATE_USER_PROFILE_DESCRIPTION_ERROR,
    UPDATE_USER_PROFILE_AVATAR_ERROR,
    MATCH_DELETED,
    MATCH_DELETING_ERROR,
    ZERO_MATCHES_TO_PULL,
    ALL_MATCHES_PULLED,
    ZERO_PREDICTIONS_TO_PULL,
    ALL_PREDICTIONS_PULLED,
    NO_PARTICIPANTS,
    TOURNAMENT_LEADERBOARD_PULLED,
    ROUND_LEADERBOARD_PULLED,
];

/// Catalog name of `id`, used in logs.
///
/// ```
/// use scorewire::message::{MessageId, catalog};
///
/// assert_eq!(catalog::name(catalog::LOGIN), Some("LOGIN"));
/// assert_eq!(catalog::name(MessageId::new(500)), None);
/// ```
#[must_use]
pub fn name(id: MessageId) -> Option<&'static str> { NAMES.get(usize::from(id.get())).copied() }

/// Returns `true` when a client may send `id` as a request.
#[must_use]
pub fn is_request(id: MessageId) -> bool {
    id >= ID_MIN && id <= ID_MAX && !REPLY_ONLY.contains(&id)
}
