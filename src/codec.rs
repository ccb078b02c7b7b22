//! Marker-delimited packet codec.
//!
//! Frames carry no length prefix. The decoder scans for the start and end
//! markers, so it can report a malformed frame and resynchronise at the next
//! start marker instead of giving up on the stream.
//!
//! # Decode outcomes
//!
//! [`PacketCodec::decode_next`] always returns a definite
//! [`DecodeOutcome`]: a message, a corrupted frame with its reason, or a
//! request for more bytes. The [`Decoder`] implementation maps these onto
//! [`Decoded`] items so a corrupted frame never terminates a
//! [`FramedRead`](tokio_util::codec::FramedRead).

use std::io;

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::message::{IdRange, Message};

pub mod error;
mod wire;

pub use error::{CorruptionError, EncodeError, MarkerError};
pub use wire::{ESCAPE_MASK, Markers};

/// Minimum frame length in bytes.
///
/// Configured limits are clamped to at least this value.
pub const MIN_FRAME_LENGTH: usize = 64;

/// Maximum frame length in bytes (16 MiB).
///
/// Configured limits are clamped to at most this value to bound buffering.
pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

/// Default maximum escaped frame length (1 MiB).
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 1024 * 1024;

/// Default maximum list nesting depth.
pub const DEFAULT_MAX_NESTING: usize = 8;

pub(crate) fn clamp_frame_length(value: usize) -> usize {
    value.clamp(MIN_FRAME_LENGTH, MAX_FRAME_LENGTH)
}

/// Limits and reserved bytes used by a [`PacketCodec`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecConfig {
    id_range: IdRange,
    max_frame_length: usize,
    max_nesting: usize,
    markers: Markers,
}

impl CodecConfig {
    /// Accept only ids inside `range`.
    #[must_use]
    pub fn id_range(mut self, range: IdRange) -> Self {
        self.id_range = range;
        self
    }

    /// Set the maximum escaped frame length, clamped to
    /// [`MIN_FRAME_LENGTH`]`..=`[`MAX_FRAME_LENGTH`].
    #[must_use]
    pub fn max_frame_length(mut self, max: usize) -> Self {
        self.max_frame_length = clamp_frame_length(max);
        self
    }

    /// Set the maximum list nesting depth.
    #[must_use]
    pub fn max_nesting(mut self, max: usize) -> Self {
        self.max_nesting = max;
        self
    }

    /// Replace the reserved marker bytes.
    #[must_use]
    pub fn markers(mut self, markers: Markers) -> Self {
        self.markers = markers;
        self
    }

    /// Accepted id range.
    #[must_use]
    pub fn accepted_ids(&self) -> IdRange { self.id_range }

    /// Maximum escaped frame length.
    #[must_use]
    pub fn frame_length_limit(&self) -> usize { self.max_frame_length }

    /// Maximum list nesting depth.
    #[must_use]
    pub fn nesting_limit(&self) -> usize { self.max_nesting }

    /// Reserved marker bytes.
    #[must_use]
    pub fn reserved(&self) -> Markers { self.markers }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            id_range: IdRange::default(),
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            max_nesting: DEFAULT_MAX_NESTING,
            markers: Markers::default(),
        }
    }
}

/// Result of one decode attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A well-formed message was consumed from the buffer.
    Message(Message),
    /// Malformed bytes were consumed and discarded.
    Corrupted(CorruptionError),
    /// The buffer holds no complete frame yet.
    NeedMore,
}

/// Item produced by the [`Decoder`] implementation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decoded {
    /// A well-formed message.
    Message(Message),
    /// A frame that was discarded.
    Corrupted(CorruptionError),
}

impl Decoded {
    /// Return the message, discarding corruption reports.
    #[must_use]
    pub fn into_message(self) -> Option<Message> {
        match self {
            Self::Message(message) => Some(message),
            Self::Corrupted(_) => None,
        }
    }
}

/// Stateful encoder/decoder for marker-delimited frames.
///
/// # Examples
///
/// ```
/// use bytes::BytesMut;
/// use scorewire::{
///     codec::{DecodeOutcome, PacketCodec},
///     message::{Message, catalog},
/// };
///
/// let mut codec = PacketCodec::default();
/// let login = Message::new(catalog::LOGIN).with("alice").with("secret");
///
/// let mut buf = BytesMut::new();
/// codec.encode_message(&login, &mut buf).expect("encode login");
/// assert_eq!(codec.decode_next(&mut buf), DecodeOutcome::Message(login));
/// assert_eq!(codec.decode_next(&mut buf), DecodeOutcome::NeedMore);
/// ```
#[derive(Clone, Debug, Default)]
pub struct PacketCodec {
    config: CodecConfig,
    /// Offset from which the next scan for a marker resumes.
    scan_from: usize,
    /// Set after an oversized frame until the next start marker.
    discarding: bool,
}

impl PacketCodec {
    /// Create a codec with the given configuration.
    #[must_use]
    pub fn new(config: CodecConfig) -> Self {
        Self {
            config,
            scan_from: 0,
            discarding: false,
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &CodecConfig { &self.config }

    /// Append the frame for `message` to `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] when the frame would exceed the configured
    /// length or nesting limits. `dst` is left unchanged in that case.
    pub fn encode_message(&self, message: &Message, dst: &mut BytesMut) -> Result<(), EncodeError> {
        wire::write_frame(
            message,
            dst,
            self.config.markers,
            self.config.max_frame_length,
            self.config.max_nesting,
        )
    }

    /// Encode `message` into a standalone frame.
    ///
    /// # Errors
    ///
    /// See [`PacketCodec::encode_message`].
    pub fn to_frame(&self, message: &Message) -> Result<Bytes, EncodeError> {
        let mut buf = BytesMut::new();
        self.encode_message(message, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Consume at most one frame (or one run of garbage) from `src`.
    pub fn decode_next(&mut self, src: &mut BytesMut) -> DecodeOutcome {
        let markers = self.config.markers;

        if self.discarding {
            let Some(start) = src.iter().position(|b| *b == markers.start()) else {
                src.clear();
                return DecodeOutcome::NeedMore;
            };
            src.advance(start);
            self.discarding = false;
            self.scan_from = 0;
        }

        let Some(&first) = src.first() else {
            return DecodeOutcome::NeedMore;
        };
        if first != markers.start() {
            let skipped = src
                .iter()
                .position(|b| *b == markers.start())
                .unwrap_or(src.len());
            src.advance(skipped);
            self.scan_from = 0;
            return DecodeOutcome::Corrupted(CorruptionError::BytesBeforeStart { skipped });
        }

        let from = self.scan_from.max(1);
        let boundary = src
            .get(from..)
            .and_then(|tail| {
                tail.iter()
                    .position(|b| *b == markers.end() || *b == markers.start())
            })
            .map(|offset| from + offset);

        let Some(index) = boundary else {
            if src.len() > self.config.max_frame_length {
                let size = src.len();
                src.clear();
                self.scan_from = 0;
                self.discarding = true;
                return DecodeOutcome::Corrupted(CorruptionError::OversizedFrame {
                    size,
                    max: self.config.max_frame_length,
                });
            }
            self.scan_from = src.len();
            return DecodeOutcome::NeedMore;
        };
        self.scan_from = 0;

        if src[index] == markers.start() {
            src.advance(index);
            return DecodeOutcome::Corrupted(CorruptionError::MissingEndMarker { discarded: index });
        }

        let frame = src.split_to(index + 1);
        if frame.len() > self.config.max_frame_length {
            return DecodeOutcome::Corrupted(CorruptionError::OversizedFrame {
                size: frame.len(),
                max: self.config.max_frame_length,
            });
        }
        match wire::parse_body(
            &frame[1..index],
            markers,
            self.config.id_range,
            self.config.max_nesting,
        ) {
            Ok(message) => DecodeOutcome::Message(message),
            Err(err) => DecodeOutcome::Corrupted(err),
        }
    }
}

impl Decoder for PacketCodec {
    type Item = Decoded;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(match self.decode_next(src) {
            DecodeOutcome::Message(message) => Some(Decoded::Message(message)),
            DecodeOutcome::Corrupted(err) => Some(Decoded::Corrupted(err)),
            DecodeOutcome::NeedMore => None,
        })
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(item) = self.decode(src)? {
            return Ok(Some(item));
        }
        // Clean close at a frame boundary.
        if src.is_empty() {
            return Ok(None);
        }

        let bytes = src.len();
        src.clear();
        self.scan_from = 0;
        if std::mem::take(&mut self.discarding) {
            return Ok(None);
        }
        Ok(Some(Decoded::Corrupted(CorruptionError::TruncatedAtEof {
            bytes,
        })))
    }
}

impl Encoder<Message> for PacketCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.encode_message(&item, dst).map_err(io::Error::from)
    }
}
