//! Criterion benchmarks for frame encoding, decoding and response chunking.

use std::hint::black_box;

use bytes::{Bytes, BytesMut};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use scorewire::{
    chunker::ChunkSpec,
    codec::{DecodeOutcome, PacketCodec},
    message::{Message, catalog},
    value::{Row, Value},
};

fn leaderboard_rows(count: i64) -> impl Iterator<Item = Row> {
    (0..count).map(|n| {
        vec![
            Value::Text(format!("player{n}")),
            Value::Int(n % 7),
            Value::Int(n % 11),
            Value::Int(n),
        ]
    })
}

/// A chunk message with `rows` leaderboard rows, including bytes that need
/// escaping.
fn chunk_message(rows: i64) -> Message {
    let values = leaderboard_rows(rows)
        .map(Value::List)
        .chain([Value::Bytes(Bytes::from_static(&[0x02, 0x03, 0x1b, 0x00]))])
        .collect();
    Message::from_values(catalog::DOWNLOAD_TOURNAMENT_LEADERBOARD, values)
}

fn benchmark_codec(c: &mut Criterion) {
    let codec = PacketCodec::default();
    let mut group = c.benchmark_group("codec");

    for rows in [1_i64, 50] {
        let message = chunk_message(rows);
        let frame = codec.to_frame(&message).expect("benchmark message encodes");
        group.throughput(Throughput::Bytes(frame.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", rows), &message, |b, message| {
            let mut buf = BytesMut::with_capacity(frame.len());
            b.iter(|| {
                buf.clear();
                codec
                    .encode_message(black_box(message), &mut buf)
                    .expect("encode");
            });
        });

        group.bench_with_input(BenchmarkId::new("decode", rows), &frame, |b, frame| {
            let mut decoder = PacketCodec::default();
            b.iter(|| {
                let mut buf = BytesMut::from(&frame[..]);
                match decoder.decode_next(&mut buf) {
                    DecodeOutcome::Message(message) => black_box(message),
                    other => panic!("benchmark frame failed to decode: {other:?}"),
                }
            });
        });
    }
    group.finish();
}

fn benchmark_chunker(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunker");
    for rows in [0_i64, 1_000] {
        group.bench_function(BenchmarkId::new("leaderboard", rows), |b| {
            b.iter(|| {
                ChunkSpec::tournament_leaderboard()
                    .chunk(leaderboard_rows(black_box(rows)))
                    .count()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_codec, benchmark_chunker);
criterion_main!(benches);
