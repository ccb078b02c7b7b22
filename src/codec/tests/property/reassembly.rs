//! Generated checks for partial reads, truncation and resynchronisation.

use bytes::BytesMut;
use proptest::{prop_assert, prop_assert_eq, test_runner::TestCaseError};
use rstest::rstest;
use tokio_util::codec::Decoder;

use super::shared::{deterministic_runner, drain, encode, message_strategy};
use crate::codec::{DecodeOutcome, Decoded, PacketCodec};

#[rstest]
#[case(48)]
fn every_split_offset_reassembles(#[case] cases: u32) {
    let mut runner = deterministic_runner(cases);

    runner
        .run(&message_strategy(), |message| {
            let wire = encode(&message)?;
            for offset in 0..=wire.len() {
                let mut codec = PacketCodec::default();
                let mut buf = BytesMut::from(&wire[..offset]);
                let mut outcomes = drain(&mut codec, &mut buf);
                buf.extend_from_slice(&wire[offset..]);
                outcomes.extend(drain(&mut codec, &mut buf));

                prop_assert_eq!(outcomes, vec![DecodeOutcome::Message(message.clone())]);
                prop_assert!(buf.is_empty());
            }
            Ok(())
        })
        .expect("split reads should reassemble");
}

#[rstest]
#[case(64)]
fn byte_at_a_time_matches_whole_delivery(#[case] cases: u32) {
    let mut runner = deterministic_runner(cases);

    runner
        .run(&message_strategy(), |message| {
            let wire = encode(&message)?;
            let mut codec = PacketCodec::default();
            let mut buf = BytesMut::new();
            let mut outcomes = Vec::new();
            for byte in wire.iter() {
                buf.extend_from_slice(&[*byte]);
                outcomes.extend(drain(&mut codec, &mut buf));
            }

            prop_assert_eq!(outcomes, vec![DecodeOutcome::Message(message)]);
            Ok(())
        })
        .expect("byte-wise delivery should reassemble");
}

#[rstest]
#[case(64)]
fn truncated_frame_is_flagged_and_decoding_resumes(#[case] cases: u32) {
    let mut runner = deterministic_runner(cases);
    let strategy = (message_strategy(), message_strategy(), 0.0_f64..1.0);

    runner
        .run(&strategy, |(first, second, cut)| {
            let wire = encode(&first)?;
            // Keep the start marker and drop at least the end marker.
            #[expect(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                clippy::cast_precision_loss,
                reason = "test-only proportional cut point"
            )]
            let keep = 1 + ((wire.len() - 2) as f64 * cut) as usize;
            let mut buf = BytesMut::from(&wire[..keep]);

            let mut codec = PacketCodec::default();
            prop_assert_eq!(drain(&mut codec, &mut buf), Vec::new());

            let eof = codec
                .clone()
                .decode_eof(&mut buf.clone())
                .map_err(|err| TestCaseError::fail(format!("decode_eof failed: {err}")))?;
            match eof {
                Some(Decoded::Corrupted(err)) => prop_assert!(!err.to_string().is_empty()),
                other => return Err(TestCaseError::fail(format!("expected corruption, got {other:?}"))),
            }

            buf.extend_from_slice(&encode(&second)?);
            let outcomes = drain(&mut codec, &mut buf);
            prop_assert_eq!(outcomes.len(), 2);
            prop_assert!(matches!(outcomes[0], DecodeOutcome::Corrupted(_)));
            prop_assert_eq!(&outcomes[1], &DecodeOutcome::Message(second));
            Ok(())
        })
        .expect("truncated frames should be flagged");
}
