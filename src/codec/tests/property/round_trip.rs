//! Generated round-trip and id-bound checks.

use bytes::BytesMut;
use proptest::{prop_assert, prop_assert_eq, test_runner::TestCaseError};
use rstest::rstest;

use super::shared::{deterministic_runner, drain, encode, message_strategy};
use crate::{
    codec::{CodecConfig, CorruptionError, DecodeOutcome, PacketCodec},
    message::{IdRange, Message, MessageId, catalog},
};

#[rstest]
#[case(128)]
fn generated_messages_round_trip(#[case] cases: u32) {
    let mut runner = deterministic_runner(cases);

    runner
        .run(&proptest::collection::vec(message_strategy(), 1..6), |messages| {
            let mut wire = BytesMut::new();
            for message in &messages {
                wire.extend_from_slice(&encode(message)?);
            }

            let mut codec = PacketCodec::default();
            let outcomes = drain(&mut codec, &mut wire);
            let expected: Vec<_> = messages.into_iter().map(DecodeOutcome::Message).collect();
            prop_assert_eq!(outcomes, expected);
            prop_assert!(wire.is_empty());
            Ok(())
        })
        .expect("generated messages should round-trip");
}

#[rstest]
#[case(96)]
fn ids_outside_range_are_always_corrupted(#[case] cases: u32) {
    let mut runner = deterministic_runner(cases);
    let strategy = (
        (catalog::ID_MAX.get() + 1)..=u16::MAX,
        message_strategy(),
    );
    let everything = IdRange::new(MessageId::new(0), MessageId::new(u16::MAX));
    let permissive = PacketCodec::new(CodecConfig::default().id_range(everything));

    runner
        .run(&strategy, |(id, template)| {
            let (_, values) = template.into_parts();
            let message = Message::from_values(MessageId::new(id), values);
            let mut wire = BytesMut::new();
            permissive
                .encode_message(&message, &mut wire)
                .map_err(|err| TestCaseError::fail(format!("encode failed: {err}")))?;

            let mut codec = PacketCodec::default();
            prop_assert_eq!(
                codec.decode_next(&mut wire),
                DecodeOutcome::Corrupted(CorruptionError::IdOutOfRange {
                    id,
                    range: IdRange::default(),
                })
            );
            prop_assert!(wire.is_empty());
            Ok(())
        })
        .expect("out-of-range ids should be flagged");
}
