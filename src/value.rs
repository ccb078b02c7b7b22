//! Typed values carried inside a [`Message`](crate::message::Message).
//!
//! Every value on the wire is self-describing: it is preceded by a one-byte
//! tag naming its [`ValueKind`], so a receiver can parse a frame without an
//! external schema.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// One row produced by the database collaborator.
///
/// Rows travel inside data chunks as a single [`Value::List`].
pub type Row = Vec<Value>;

/// A single typed value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// UTF-8 text.
    Text(String),
    /// Signed 64-bit integer.
    Int(i64),
    /// Boolean flag.
    Bool(bool),
    /// Point in time, carried on the wire as Unix milliseconds.
    DateTime(Timestamp),
    /// Opaque binary blob.
    Bytes(Bytes),
    /// Nested ordered sequence, used for composite rows.
    List(Vec<Value>),
}

/// A UTC point in time at millisecond precision.
///
/// Construction truncates anything finer than a millisecond, so a timestamp
/// always survives the wire unchanged.
///
/// ```
/// use chrono::DateTime;
/// use scorewire::value::Timestamp;
///
/// let at = DateTime::from_timestamp(1_700_000_000, 123_456_789).expect("in range");
/// assert_eq!(Timestamp::new(at).unix_millis(), 1_700_000_000_123);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Truncate `at` to whole milliseconds.
    #[must_use]
    pub fn new(at: DateTime<Utc>) -> Self {
        let millis = at.timestamp_millis();
        Self(DateTime::from_timestamp_millis(millis).unwrap_or(at))
    }

    /// Build from Unix milliseconds, or `None` outside chrono's range.
    #[must_use]
    pub fn from_unix_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(Self)
    }

    /// Unix milliseconds as written on the wire.
    #[must_use]
    pub fn unix_millis(self) -> i64 { self.0.timestamp_millis() }

    /// The wrapped chrono value.
    #[must_use]
    pub fn as_date_time(self) -> DateTime<Utc> { self.0 }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self { Self::new(at) }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// Discriminator written before each encoded value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`Value::Text`].
    Text,
    /// [`Value::Int`].
    Int,
    /// [`Value::Bool`].
    Bool,
    /// [`Value::DateTime`].
    DateTime,
    /// [`Value::Bytes`].
    Bytes,
    /// [`Value::List`].
    List,
}

impl ValueKind {
    /// Wire tag for this kind.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Text => 0x10,
            Self::Int => 0x11,
            Self::Bool => 0x12,
            Self::DateTime => 0x13,
            Self::Bytes => 0x14,
            Self::List => 0x15,
        }
    }

    /// Resolve a wire tag, returning `None` for unknown tags.
    ///
    /// ```
    /// use scorewire::value::ValueKind;
    ///
    /// assert_eq!(ValueKind::from_tag(0x11), Some(ValueKind::Int));
    /// assert_eq!(ValueKind::from_tag(0x7f), None);
    /// ```
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x10 => Some(Self::Text),
            0x11 => Some(Self::Int),
            0x12 => Some(Self::Bool),
            0x13 => Some(Self::DateTime),
            0x14 => Some(Self::Bytes),
            0x15 => Some(Self::List),
            _ => None,
        }
    }

    /// Lower-case name used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::DateTime => "date/time",
            Self::Bytes => "blob",
            Self::List => "list",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl Value {
    /// Kind discriminator for this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Int(_) => ValueKind::Int,
            Self::Bool(_) => ValueKind::Bool,
            Self::DateTime(_) => ValueKind::DateTime,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::List(_) => ValueKind::List,
        }
    }

    /// Build a date/time value from Unix milliseconds.
    ///
    /// Returns `None` when the timestamp is outside chrono's supported range.
    #[must_use]
    pub fn from_unix_millis(millis: i64) -> Option<Self> {
        Timestamp::from_unix_millis(millis).map(Self::DateTime)
    }

    /// Borrow the text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Integer content, if this is an integer value.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Boolean content, if this is a boolean value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Date/time content, if this is a date/time value.
    #[must_use]
    pub fn as_date_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(value) => Some(value.as_date_time()),
            _ => None,
        }
    }

    /// Borrow the nested values, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    /// Nesting depth of this value: scalars are `0`, a flat list is `1`.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::List(values) => 1 + values.iter().map(Value::depth).max().unwrap_or(0),
            _ => 0,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self { Self::Text(value.to_owned()) }
}

impl From<String> for Value {
    fn from(value: String) -> Self { Self::Text(value) }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self { Self::Int(value) }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self { Self::Int(i64::from(value)) }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self { Self::Int(i64::from(value)) }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self { Self::Bool(value) }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self { Self::DateTime(Timestamp::new(value)) }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self { Self::DateTime(value) }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self { Self::Bytes(value) }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self { Self::List(value) }
}
