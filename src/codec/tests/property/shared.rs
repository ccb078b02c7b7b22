//! Shared proptest helpers for codec property tests.

use bytes::{Bytes, BytesMut};
use chrono::DateTime;
use proptest::{
    collection::vec,
    prelude::{Just, Strategy, any, prop_oneof},
    test_runner::{Config as ProptestConfig, RngAlgorithm, TestCaseError, TestRng, TestRunner},
};

use crate::{
    codec::{DecodeOutcome, PacketCodec},
    message::{Message, MessageId, catalog},
    value::Value,
};

pub fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    let rng = TestRng::deterministic_rng(RngAlgorithm::ChaCha);
    TestRunner::new_with_rng(config, rng)
}

fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        ".{0,24}".prop_map(Value::Text),
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        // chrono's representable range in milliseconds, kept well inside.
        (-8_000_000_000_000_000_i64..8_000_000_000_000_000_i64).prop_filter_map(
            "timestamp must be representable",
            |millis| DateTime::from_timestamp_millis(millis).map(Value::from)
        ),
        // Nanosecond inputs, truncated to milliseconds on construction.
        (-8_000_000_000_000_i64..8_000_000_000_000_i64, 0..1_000_000_000_u32).prop_filter_map(
            "timestamp must be representable",
            |(secs, nanos)| DateTime::from_timestamp(secs, nanos).map(Value::from)
        ),
        vec(any::<u8>(), 0..32).prop_map(|bytes| Value::Bytes(Bytes::from(bytes))),
        // Reserved bytes appear often enough to exercise escaping.
        vec(prop_oneof![Just(0x02_u8), Just(0x03_u8), Just(0x1b_u8)], 1..8)
            .prop_map(|bytes| Value::Bytes(Bytes::from(bytes))),
    ]
}

pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 24, 6, |inner| vec(inner, 0..6).prop_map(Value::List))
}

pub fn message_strategy() -> impl Strategy<Value = Message> {
    (
        catalog::ID_MIN.get()..=catalog::ID_MAX.get(),
        vec(value_strategy(), 0..6),
    )
        .prop_map(|(id, values)| Message::from_values(MessageId::new(id), values))
}

pub fn encode(message: &Message) -> Result<BytesMut, TestCaseError> {
    let mut buf = BytesMut::new();
    PacketCodec::default()
        .encode_message(message, &mut buf)
        .map_err(|err| TestCaseError::fail(format!("encode failed: {err}")))?;
    Ok(buf)
}

/// Drain every definite outcome currently decodable from `buf`.
pub fn drain(codec: &mut PacketCodec, buf: &mut BytesMut) -> Vec<DecodeOutcome> {
    let mut outcomes = Vec::new();
    loop {
        match codec.decode_next(buf) {
            DecodeOutcome::NeedMore => return outcomes,
            outcome => outcomes.push(outcome),
        }
    }
}
