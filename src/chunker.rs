//! Streaming of unbounded row collections as bounded packets.
//!
//! A [`ResponseChunker`] pulls rows lazily from a source iterator and yields
//! data messages holding at most `capacity` rows each, followed by a
//! zero-payload end message. An empty source yields only the "zero results"
//! message, so the receiver never waits for an end marker in that case.

use std::iter::Peekable;

use crate::{
    message::{Message, MessageId, catalog},
    value::{Row, Value},
};

/// Default rows per leaderboard chunk.
pub const LEADERBOARD_CHUNK_ROWS: usize = 50;

/// Default rows per match or prediction chunk.
pub const MATCH_CHUNK_ROWS: usize = 40;

/// Message ids and capacity of one kind of chunked response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkSpec {
    /// Id shared by every data message.
    pub data: MessageId,
    /// Id of the end-of-stream message.
    pub end: MessageId,
    /// Id sent instead of everything else when the source is empty.
    pub empty: MessageId,
    /// Maximum rows per data message.
    pub capacity: usize,
}

impl ChunkSpec {
    /// Tournament leaderboard rows.
    #[must_use]
    pub const fn tournament_leaderboard() -> Self {
        Self {
            data: catalog::DOWNLOAD_TOURNAMENT_LEADERBOARD,
            end: catalog::TOURNAMENT_LEADERBOARD_PULLED,
            empty: catalog::NO_PARTICIPANTS,
            capacity: LEADERBOARD_CHUNK_ROWS,
        }
    }

    /// Round leaderboard rows.
    #[must_use]
    pub const fn round_leaderboard() -> Self {
        Self {
            data: catalog::DOWNLOAD_ROUND_LEADERBOARD,
            end: catalog::ROUND_LEADERBOARD_PULLED,
            empty: catalog::NO_PARTICIPANTS,
            capacity: LEADERBOARD_CHUNK_ROWS,
        }
    }

    /// Match rows of a round.
    #[must_use]
    pub const fn matches() -> Self {
        Self {
            data: catalog::PULL_MATCHES,
            end: catalog::ALL_MATCHES_PULLED,
            empty: catalog::ZERO_MATCHES_TO_PULL,
            capacity: MATCH_CHUNK_ROWS,
        }
    }

    /// Prediction rows of a round.
    #[must_use]
    pub const fn predictions() -> Self {
        Self {
            data: catalog::PULL_MATCHES_PREDICTIONS,
            end: catalog::ALL_PREDICTIONS_PULLED,
            empty: catalog::ZERO_PREDICTIONS_TO_PULL,
            capacity: MATCH_CHUNK_ROWS,
        }
    }

    /// Override the capacity; zero is treated as one.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = if capacity == 0 { 1 } else { capacity };
        self
    }

    /// Chunk `rows` according to this spec.
    pub fn chunk<I>(self, rows: I) -> ResponseChunker<I::IntoIter>
    where
        I: IntoIterator<Item = Row>,
    {
        ResponseChunker::new(self, rows)
    }
}

/// Per-response chunk capacities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkSizes {
    /// Rows per tournament or round leaderboard chunk.
    pub leaderboard: usize,
    /// Rows per match chunk.
    pub matches: usize,
    /// Rows per prediction chunk.
    pub predictions: usize,
}

impl Default for ChunkSizes {
    fn default() -> Self {
        Self {
            leaderboard: LEADERBOARD_CHUNK_ROWS,
            matches: MATCH_CHUNK_ROWS,
            predictions: MATCH_CHUNK_ROWS,
        }
    }
}

impl ChunkSizes {
    /// Tournament leaderboard preset at the configured capacity.
    #[must_use]
    pub fn tournament_leaderboard(&self) -> ChunkSpec {
        ChunkSpec::tournament_leaderboard().with_capacity(self.leaderboard)
    }

    /// Round leaderboard preset at the configured capacity.
    #[must_use]
    pub fn round_leaderboard(&self) -> ChunkSpec {
        ChunkSpec::round_leaderboard().with_capacity(self.leaderboard)
    }

    /// Match preset at the configured capacity.
    #[must_use]
    pub fn matches(&self) -> ChunkSpec { ChunkSpec::matches().with_capacity(self.matches) }

    /// Prediction preset at the configured capacity.
    #[must_use]
    pub fn predictions(&self) -> ChunkSpec {
        ChunkSpec::predictions().with_capacity(self.predictions)
    }
}

enum Phase {
    Fresh,
    Streaming,
    Done,
}

/// Lazy iterator of chunk messages over a row source.
///
/// # Examples
///
/// ```
/// use scorewire::{chunker::ChunkSpec, value::Value};
///
/// let rows = (0..5).map(|n| vec![Value::Int(n)]);
/// let messages: Vec<_> = ChunkSpec::matches().with_capacity(2).chunk(rows).collect();
///
/// let sizes: Vec<_> = messages.iter().map(|m| m.len()).collect();
/// assert_eq!(sizes, [2, 2, 1, 0]);
/// ```
pub struct ResponseChunker<I: Iterator<Item = Row>> {
    spec: ChunkSpec,
    rows: Peekable<I>,
    phase: Phase,
}

impl<I: Iterator<Item = Row>> ResponseChunker<I> {
    /// Wrap `rows` for chunking under `spec`.
    pub fn new(spec: ChunkSpec, rows: impl IntoIterator<Item = Row, IntoIter = I>) -> Self {
        Self {
            spec: spec.with_capacity(spec.capacity),
            rows: rows.into_iter().peekable(),
            phase: Phase::Fresh,
        }
    }

    fn next_chunk(&mut self) -> Message {
        let mut values = Vec::with_capacity(self.spec.capacity);
        while values.len() < self.spec.capacity {
            match self.rows.next() {
                Some(row) => values.push(Value::List(row)),
                None => break,
            }
        }
        Message::from_values(self.spec.data, values)
    }
}

impl<I: Iterator<Item = Row>> Iterator for ResponseChunker<I> {
    type Item = Message;

    fn next(&mut self) -> Option<Message> {
        match self.phase {
            Phase::Fresh => {
                if self.rows.peek().is_none() {
                    self.phase = Phase::Done;
                    return Some(Message::new(self.spec.empty));
                }
                self.phase = Phase::Streaming;
                Some(self.next_chunk())
            }
            Phase::Streaming => {
                if self.rows.peek().is_none() {
                    self.phase = Phase::Done;
                    return Some(Message::new(self.spec.end));
                }
                Some(self.next_chunk())
            }
            Phase::Done => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn rows(n: usize) -> impl Iterator<Item = Row> {
        (0..n).map(|i| vec![Value::from(format!("user{i}")), Value::Int(i64::try_from(i).unwrap_or(0))])
    }

    fn row_counts(messages: &[Message], spec: ChunkSpec) -> Vec<usize> {
        messages
            .iter()
            .filter(|m| m.id() == spec.data)
            .map(Message::len)
            .collect()
    }

    #[test]
    fn empty_source_yields_only_zero_results() {
        let spec = ChunkSpec::matches();
        let messages: Vec<_> = spec.chunk(rows(0)).collect();
        assert_eq!(messages, vec![Message::new(catalog::ZERO_MATCHES_TO_PULL)]);
    }

    #[rstest]
    #[case(1)]
    #[case(17)]
    #[case(40)]
    fn up_to_capacity_yields_one_chunk_and_end(#[case] n: usize) {
        let spec = ChunkSpec::matches();
        let messages: Vec<_> = spec.chunk(rows(n)).collect();

        assert_eq!(messages.len(), 2);
        assert_eq!(row_counts(&messages, spec), vec![n]);
        assert_eq!(messages[1], Message::new(catalog::ALL_MATCHES_PULLED));
    }

    #[rstest]
    #[case(ChunkSpec::tournament_leaderboard())]
    #[case(ChunkSpec::round_leaderboard())]
    #[case(ChunkSpec::matches())]
    #[case(ChunkSpec::predictions())]
    fn two_full_chunks_and_remainder(#[case] spec: ChunkSpec) {
        let c = spec.capacity;
        let messages: Vec<_> = spec.chunk(rows(2 * c + 5)).collect();

        assert_eq!(row_counts(&messages, spec), vec![c, c, 5]);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages.last().map(Message::id), Some(spec.end));
        assert!(messages.last().is_some_and(Message::is_empty));
    }

    #[test]
    fn rows_keep_source_order_and_shape() {
        let spec = ChunkSpec::predictions().with_capacity(3);
        let messages: Vec<_> = spec.chunk(rows(7)).collect();

        let flattened: Vec<_> = messages
            .iter()
            .filter(|m| m.id() == spec.data)
            .flat_map(|m| m.values().iter().cloned())
            .collect();
        let expected: Vec<_> = rows(7).map(Value::List).collect();
        assert_eq!(flattened, expected);
    }

    #[test]
    fn source_is_pulled_lazily() {
        let mut pulled = 0;
        let source = std::iter::from_fn(|| {
            pulled += 1;
            Some(vec![Value::Int(1)])
        });
        let first = ChunkSpec::matches().with_capacity(4).chunk(source).next();

        assert_eq!(first.map(|m| m.len()), Some(4));
        assert_eq!(pulled, 4);
    }

    #[test]
    fn sizes_override_preset_capacities() {
        let sizes = ChunkSizes {
            leaderboard: 10,
            matches: 0,
            predictions: 7,
        };
        assert_eq!(sizes.tournament_leaderboard().capacity, 10);
        assert_eq!(sizes.round_leaderboard().data, catalog::DOWNLOAD_ROUND_LEADERBOARD);
        assert_eq!(sizes.matches().capacity, 1);
        assert_eq!(sizes.predictions().capacity, 7);
    }
}
