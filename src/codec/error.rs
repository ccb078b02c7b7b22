//! Error types for the packet codec.
//!
//! Decoding never fails with an error value: malformed input is reported as a
//! [`CorruptionError`] carried inside a decode outcome, and the codec
//! resynchronises at the next start marker. Encoding can only fail when a
//! message exceeds the configured limits ([`EncodeError`]).

use std::io;

use thiserror::Error;

use crate::{message::IdRange, value::ValueKind};

/// Reason a run of inbound bytes was discarded instead of decoded.
///
/// Every variant displays a non-empty, human-readable reason suitable for
/// logs.
///
/// # Examples
///
/// ```
/// use scorewire::codec::CorruptionError;
///
/// let err = CorruptionError::MissingEndMarker { discarded: 12 };
/// assert_eq!(err.to_string(), "missing end marker (12 bytes discarded)");
/// ```
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CorruptionError {
    /// Bytes arrived that were not preceded by a start marker.
    #[error("{skipped} bytes before start marker")]
    BytesBeforeStart {
        /// Number of bytes skipped.
        skipped: usize,
    },

    /// A new start marker appeared before the current frame's end marker.
    #[error("missing end marker ({discarded} bytes discarded)")]
    MissingEndMarker {
        /// Length of the abandoned partial frame.
        discarded: usize,
    },

    /// No end marker arrived within the frame length limit.
    #[error("frame exceeds max length: {size} > {max}")]
    OversizedFrame {
        /// Bytes buffered when the limit was hit.
        size: usize,
        /// Configured maximum escaped frame length.
        max: usize,
    },

    /// An escape byte was last in the body or escaped a non-reserved byte.
    #[error("invalid escape sequence at body offset {offset}")]
    InvalidEscape {
        /// Offset of the escape byte inside the escaped body.
        offset: usize,
    },

    /// The body was too short to hold a message id.
    #[error("missing message id")]
    MissingId,

    /// The message id lies outside the accepted range.
    #[error("id {id} out of range {range}")]
    IdOutOfRange {
        /// Raw id read from the frame.
        id: u16,
        /// Range the decoder accepts.
        range: IdRange,
    },

    /// A value tag did not name a known value kind.
    #[error("unknown value tag {tag:#04x}")]
    UnknownTag {
        /// The unrecognised tag byte.
        tag: u8,
    },

    /// The body ended in the middle of a value.
    #[error("truncated {kind} value")]
    TruncatedValue {
        /// Kind of the value being read.
        kind: ValueKind,
    },

    /// A boolean value was neither `0x00` nor `0x01`.
    #[error("invalid boolean byte {byte:#04x}")]
    InvalidBool {
        /// The offending byte.
        byte: u8,
    },

    /// A text value was not valid UTF-8.
    #[error("invalid UTF-8 in text value")]
    InvalidUtf8,

    /// A date/time value lay outside the representable range.
    #[error("invalid timestamp {millis} ms")]
    InvalidTimestamp {
        /// Unix milliseconds read from the frame.
        millis: i64,
    },

    /// Lists were nested deeper than the configured limit.
    #[error("list nesting exceeds {max}")]
    NestingTooDeep {
        /// Configured maximum nesting depth.
        max: usize,
    },

    /// The stream ended while a frame was still incomplete.
    #[error("truncated frame at end of stream ({bytes} bytes)")]
    TruncatedAtEof {
        /// Bytes left in the buffer.
        bytes: usize,
    },
}

/// Failure to encode a message.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// The escaped frame would exceed the configured maximum length.
    #[error("frame exceeds max length: {size} > {max}")]
    OversizedFrame {
        /// Escaped frame length that was produced.
        size: usize,
        /// Configured maximum escaped frame length.
        max: usize,
    },

    /// A value nests lists deeper than the configured limit.
    #[error("list nesting {depth} exceeds {max}")]
    NestingTooDeep {
        /// Nesting depth of the offending value.
        depth: usize,
        /// Configured maximum nesting depth.
        max: usize,
    },
}

impl From<EncodeError> for io::Error {
    fn from(value: EncodeError) -> Self { io::Error::new(io::ErrorKind::InvalidInput, value) }
}

/// Rejected marker configuration.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MarkerError {
    /// Two of the reserved bytes are equal.
    #[error("reserved bytes must be distinct")]
    NotDistinct,

    /// The escaped form of a reserved byte is itself reserved.
    #[error("escaped form {escaped:#04x} of {byte:#04x} is reserved")]
    EscapeCollision {
        /// Reserved byte being escaped.
        byte: u8,
        /// Its escaped form.
        escaped: u8,
    },
}
