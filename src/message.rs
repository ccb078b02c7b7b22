//! Logical messages exchanged between client and server.
//!
//! A [`Message`] is an ordered list of [`Value`]s headed by a
//! [`MessageId`]. The numeric ids of the tournament service live in
//! [`catalog`].

use std::fmt;

use crate::value::Value;

pub mod catalog;

/// Message-type identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(u16);

impl MessageId {
    /// Create a new identifier from its raw value.
    #[must_use]
    pub const fn new(raw: u16) -> Self { Self(raw) }

    /// Return the raw `u16` representation.
    #[must_use]
    pub const fn get(self) -> u16 { self.0 }
}

impl From<u16> for MessageId {
    fn from(value: u16) -> Self { Self(value) }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match catalog::name(*self) {
            Some(name) => write!(f, "{}({name})", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Inclusive range of identifiers the decoder accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdRange {
    min: MessageId,
    max: MessageId,
}

impl IdRange {
    /// Build a range, swapping the bounds when given in reverse.
    #[must_use]
    pub fn new(min: MessageId, max: MessageId) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Lowest accepted identifier.
    #[must_use]
    pub const fn min(self) -> MessageId { self.min }

    /// Highest accepted identifier.
    #[must_use]
    pub const fn max(self) -> MessageId { self.max }

    /// Returns `true` when `id` lies inside the range.
    #[must_use]
    pub fn contains(self, id: MessageId) -> bool { self.min <= id && id <= self.max }
}

impl Default for IdRange {
    fn default() -> Self { Self::new(catalog::ID_MIN, catalog::ID_MAX) }
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min.get(), self.max.get())
    }
}

/// An ordered sequence of typed values headed by a message-type id.
///
/// # Examples
///
/// ```
/// use scorewire::message::{Message, catalog};
///
/// let login = Message::new(catalog::LOGIN).with("alice").with("secret");
/// assert_eq!(login.id(), catalog::LOGIN);
/// assert_eq!(login.text(0), Some("alice"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    values: Vec<Value>,
}

impl Message {
    /// Create a message with no payload values.
    #[must_use]
    pub fn new(id: MessageId) -> Self {
        Self {
            id,
            values: Vec::new(),
        }
    }

    /// Create a message from an id and its payload values.
    #[must_use]
    pub fn from_values(id: MessageId, values: Vec<Value>) -> Self { Self { id, values } }

    /// Append a value, consuming and returning the message.
    #[must_use]
    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Append a value in place.
    pub fn push(&mut self, value: impl Into<Value>) { self.values.push(value.into()); }

    /// Message-type identifier.
    #[must_use]
    pub fn id(&self) -> MessageId { self.id }

    /// Payload values in order.
    #[must_use]
    pub fn values(&self) -> &[Value] { &self.values }

    /// Number of payload values.
    #[must_use]
    pub fn len(&self) -> usize { self.values.len() }

    /// Returns `true` when the message carries no payload values.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Payload value at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> { self.values.get(index) }

    /// Text payload value at `index`.
    #[must_use]
    pub fn text(&self, index: usize) -> Option<&str> { self.get(index).and_then(Value::as_text) }

    /// Split the message into its id and values.
    #[must_use]
    pub fn into_parts(self) -> (MessageId, Vec<Value>) { (self.id, self.values) }
}
