//! Codec benchmarks for hermod-protocol.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use hermod_protocol::{codec, ChatMessage};

fn bench_encode_private(c: &mut Criterion) {
    let message = ChatMessage::private("alice", "bob", "x".repeat(64));

    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Bytes(64));
    group.bench_function("private_64B", |b| {
        b.iter(|| codec::encode(black_box(&message)))
    });
    group.finish();
}

fn bench_decode_private(c: &mut Criterion) {
    let message = ChatMessage::private("alice", "bob", "x".repeat(64));
    let encoded = codec::encode(&message).unwrap();

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(encoded.len() as u64));
    group.bench_function("private_64B", |b| b.iter(|| codec::decode(black_box(&encoded))));
    group.finish();
}

fn bench_roundtrip_user_list(c: &mut Criterion) {
    let users = (0..100).map(|i| format!("user-{i}")).collect();
    let message = ChatMessage::user_list(users);

    c.bench_function("roundtrip_user_list_100", |b| {
        b.iter(|| {
            let encoded = codec::encode(black_box(&message)).unwrap();
            codec::decode(black_box(&encoded)).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_encode_private,
    bench_decode_private,
    bench_roundtrip_user_list
);
criterion_main!(benches);
