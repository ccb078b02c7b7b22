//! Byte-level frame layout: reserved markers, escaping and body parsing.
//!
//! A frame is `start, escaped body, end`. Inside the body any reserved byte
//! `b` is written as `escape, b ^ 0x20`, so the markers can only appear at
//! frame boundaries.

use bytes::{BufMut, Bytes, BytesMut};

use super::error::{CorruptionError, EncodeError, MarkerError};
use crate::{
    byte_order::{
        read_network_i64,
        read_network_u16,
        read_network_u32,
        write_network_i64,
        write_network_u16,
        write_network_u32,
    },
    message::{IdRange, Message, MessageId},
    value::{Value, ValueKind},
};

/// XOR mask applied to a reserved byte after an escape byte.
pub const ESCAPE_MASK: u8 = 0x20;

/// The three reserved bytes of the framing layer.
///
/// # Examples
///
/// ```
/// use scorewire::codec::Markers;
///
/// let markers = Markers::default();
/// assert_eq!((markers.start(), markers.end(), markers.escape()), (0x02, 0x03, 0x1b));
/// assert!(Markers::new(0x02, 0x02, 0x1b).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Markers {
    start: u8,
    end: u8,
    escape: u8,
}

impl Markers {
    /// Build a marker set.
    ///
    /// # Errors
    ///
    /// Returns [`MarkerError`] when the bytes are not distinct or when the
    /// escaped form of one of them is itself reserved.
    pub fn new(start: u8, end: u8, escape: u8) -> Result<Self, MarkerError> {
        if start == end || start == escape || end == escape {
            return Err(MarkerError::NotDistinct);
        }
        let markers = Self { start, end, escape };
        for byte in [start, end, escape] {
            let escaped = byte ^ ESCAPE_MASK;
            if markers.is_reserved(escaped) {
                return Err(MarkerError::EscapeCollision { byte, escaped });
            }
        }
        Ok(markers)
    }

    /// Start-of-frame marker.
    #[must_use]
    pub const fn start(self) -> u8 { self.start }

    /// End-of-frame marker.
    #[must_use]
    pub const fn end(self) -> u8 { self.end }

    /// Escape byte.
    #[must_use]
    pub const fn escape(self) -> u8 { self.escape }

    /// Returns `true` for any of the three reserved bytes.
    #[must_use]
    pub const fn is_reserved(self, byte: u8) -> bool {
        byte == self.start || byte == self.end || byte == self.escape
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            start: 0x02,
            end: 0x03,
            escape: 0x1b,
        }
    }
}

/// Writes body bytes into a buffer, escaping reserved bytes.
struct EscapingWriter<'a> {
    dst: &'a mut BytesMut,
    markers: Markers,
}

impl EscapingWriter<'_> {
    fn put(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if self.markers.is_reserved(byte) {
                self.dst.put_u8(self.markers.escape);
                self.dst.put_u8(byte ^ ESCAPE_MASK);
            } else {
                self.dst.put_u8(byte);
            }
        }
    }

    fn put_len(&mut self, len: usize) {
        // Saturated lengths always trip the frame length check.
        let len = u32::try_from(len).unwrap_or(u32::MAX);
        self.put(&write_network_u32(len));
    }

    fn put_value(&mut self, value: &Value) {
        self.put(&[value.kind().tag()]);
        match value {
            Value::Text(text) => {
                self.put_len(text.len());
                self.put(text.as_bytes());
            }
            Value::Int(int) => self.put(&write_network_i64(*int)),
            Value::Bool(flag) => self.put(&[u8::from(*flag)]),
            Value::DateTime(at) => self.put(&write_network_i64(at.unix_millis())),
            Value::Bytes(bytes) => {
                self.put_len(bytes.len());
                self.put(bytes);
            }
            Value::List(values) => {
                self.put_len(values.len());
                for nested in values {
                    self.put_value(nested);
                }
            }
        }
    }
}

/// Append the frame for `message` to `dst`.
///
/// On error `dst` is restored to its previous length.
pub(crate) fn write_frame(
    message: &Message,
    dst: &mut BytesMut,
    markers: Markers,
    max_frame_length: usize,
    max_nesting: usize,
) -> Result<(), EncodeError> {
    if let Some(depth) = message
        .values()
        .iter()
        .map(Value::depth)
        .max()
        .filter(|depth| *depth > max_nesting)
    {
        return Err(EncodeError::NestingTooDeep {
            depth,
            max: max_nesting,
        });
    }

    let origin = dst.len();
    dst.put_u8(markers.start);
    let mut writer = EscapingWriter {
        dst: &mut *dst,
        markers,
    };
    writer.put(&write_network_u16(message.id().get()));
    for value in message.values() {
        writer.put_value(value);
    }
    dst.put_u8(markers.end);

    let size = dst.len() - origin;
    if size > max_frame_length {
        dst.truncate(origin);
        return Err(EncodeError::OversizedFrame {
            size,
            max: max_frame_length,
        });
    }
    Ok(())
}

/// Remove escaping from a frame body.
fn unescape(body: &[u8], markers: Markers) -> Result<Vec<u8>, CorruptionError> {
    let mut out = Vec::with_capacity(body.len());
    let mut iter = body.iter().copied().enumerate();
    while let Some((offset, byte)) = iter.next() {
        if byte != markers.escape {
            out.push(byte);
            continue;
        }
        let original = iter
            .next()
            .map(|(_, escaped)| escaped ^ ESCAPE_MASK)
            .filter(|original| markers.is_reserved(*original))
            .ok_or(CorruptionError::InvalidEscape { offset })?;
        out.push(original);
    }
    Ok(out)
}

/// Cursor over an unescaped body.
struct BodyReader<'a> {
    bytes: &'a [u8],
    max_nesting: usize,
}

impl<'a> BodyReader<'a> {
    fn take(&mut self, n: usize, kind: ValueKind) -> Result<&'a [u8], CorruptionError> {
        if self.bytes.len() < n {
            return Err(CorruptionError::TruncatedValue { kind });
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        Ok(head)
    }

    fn take_array<const N: usize>(&mut self, kind: ValueKind) -> Result<[u8; N], CorruptionError> {
        let mut array = [0_u8; N];
        array.copy_from_slice(self.take(N, kind)?);
        Ok(array)
    }

    fn take_len(&mut self, kind: ValueKind) -> Result<usize, CorruptionError> {
        let len = read_network_u32(self.take_array(kind)?);
        usize::try_from(len).map_err(|_| CorruptionError::TruncatedValue { kind })
    }

    fn value(&mut self, depth: usize) -> Result<Value, CorruptionError> {
        // Only list elements can find the body empty here.
        let Some((&tag, rest)) = self.bytes.split_first() else {
            return Err(CorruptionError::TruncatedValue {
                kind: ValueKind::List,
            });
        };
        self.bytes = rest;
        let kind = ValueKind::from_tag(tag).ok_or(CorruptionError::UnknownTag { tag })?;
        match kind {
            ValueKind::Text => {
                let len = self.take_len(kind)?;
                let bytes = self.take(len, kind)?;
                let text = std::str::from_utf8(bytes).map_err(|_| CorruptionError::InvalidUtf8)?;
                Ok(Value::Text(text.to_owned()))
            }
            ValueKind::Int => Ok(Value::Int(read_network_i64(self.take_array(kind)?))),
            ValueKind::Bool => match self.take_array(kind)? {
                [0] => Ok(Value::Bool(false)),
                [1] => Ok(Value::Bool(true)),
                [byte] => Err(CorruptionError::InvalidBool { byte }),
            },
            ValueKind::DateTime => {
                let millis = read_network_i64(self.take_array(kind)?);
                Value::from_unix_millis(millis).ok_or(CorruptionError::InvalidTimestamp { millis })
            }
            ValueKind::Bytes => {
                let len = self.take_len(kind)?;
                Ok(Value::Bytes(Bytes::copy_from_slice(self.take(len, kind)?)))
            }
            ValueKind::List => {
                let count = self.take_len(kind)?;
                let depth = depth + 1;
                if depth > self.max_nesting {
                    return Err(CorruptionError::NestingTooDeep {
                        max: self.max_nesting,
                    });
                }
                // Each element needs at least two bytes; never trust the count.
                let mut values = Vec::with_capacity(count.min(self.bytes.len() / 2));
                for _ in 0..count {
                    values.push(self.value(depth)?);
                }
                Ok(Value::List(values))
            }
        }
    }
}

/// Parse an escaped frame body (the bytes between the markers).
pub(crate) fn parse_body(
    body: &[u8],
    markers: Markers,
    id_range: IdRange,
    max_nesting: usize,
) -> Result<Message, CorruptionError> {
    let plain = unescape(body, markers)?;
    let (id, rest) = plain
        .split_first_chunk::<2>()
        .ok_or(CorruptionError::MissingId)?;
    let id = MessageId::new(read_network_u16(*id));
    if !id_range.contains(id) {
        return Err(CorruptionError::IdOutOfRange {
            id: id.get(),
            range: id_range,
        });
    }

    let mut reader = BodyReader {
        bytes: rest,
        max_nesting,
    };
    let mut values = Vec::new();
    while !reader.bytes.is_empty() {
        values.push(reader.value(0)?);
    }
    Ok(Message::from_values(id, values))
}
