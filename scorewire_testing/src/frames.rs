//! Raw frame helpers.
//!
//! Tests that feed malformed input build byte vectors by hand; these helpers
//! cover the well-formed parts and decode whatever the server wrote back.

use bytes::BytesMut;
use scorewire::{
    codec::{DecodeOutcome, Decoded, PacketCodec},
    message::Message,
};
use tokio_util::codec::Decoder;

/// Encode `message` with the default codec.
///
/// # Panics
///
/// Panics if the message exceeds the default frame limits.
#[must_use]
pub fn frame_bytes(message: &Message) -> Vec<u8> {
    PacketCodec::default()
        .to_frame(message)
        .expect("message fits default frame limits")
        .to_vec()
}

/// Decode every item in `bytes`, including a trailing partial frame.
#[must_use]
pub fn decode_all(bytes: &[u8]) -> Vec<Decoded> {
    let mut codec = PacketCodec::default();
    let mut buf = BytesMut::from(bytes);
    let mut items = Vec::new();
    loop {
        match codec.decode_next(&mut buf) {
            DecodeOutcome::Message(message) => items.push(Decoded::Message(message)),
            DecodeOutcome::Corrupted(err) => items.push(Decoded::Corrupted(err)),
            DecodeOutcome::NeedMore => break,
        }
    }
    if let Ok(Some(tail)) = codec.decode_eof(&mut buf) {
        items.push(tail);
    }
    items
}

/// Decode `bytes` and keep only the well-formed messages.
#[must_use]
pub fn messages(bytes: &[u8]) -> Vec<Message> {
    decode_all(bytes)
        .into_iter()
        .filter_map(Decoded::into_message)
        .collect()
}
