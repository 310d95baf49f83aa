// Cryptography benchmarks for the WISP protocol.
//
// Covers the SPAKE2 round (the slow part the drivers push onto blocking
// threads), channel key derivation, and sealed-frame throughput at
// payload-chunk sizes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use wisp_protocol::crypto::channel::derive_key;
use wisp_protocol::crypto::{KeyExchange, Password, SessionCipher};

fn bench_pake_initiate(c: &mut Criterion) {
    let password = Password::new("7-apple-river-lagoon");

    c.bench_function("pake/initiate", |b| {
        b.iter(|| KeyExchange::initiate(&password));
    });
}

fn bench_pake_full_round(c: &mut Criterion) {
    let password = Password::new("7-apple-river-lagoon");

    c.bench_function("pake/full_round", |b| {
        b.iter(|| {
            let mut ours = KeyExchange::initiate(&password);
            let theirs = KeyExchange::initiate(&password);
            ours.absorb(theirs.outbound_bytes()).unwrap();
            ours.session_key().unwrap()
        });
    });
}

fn bench_key_derivation(c: &mut Criterion) {
    let session_key = session_key();
    let salt = [0x5A; 16];

    c.bench_function("channel/derive_key", |b| {
        b.iter(|| derive_key(&session_key, &salt));
    });
}

fn bench_seal_open(c: &mut Criterion) {
    let cipher = SessionCipher::new(&session_key());
    let mut group = c.benchmark_group("channel/seal_open");

    for size in [256usize, 4 * 1024, 64 * 1024, 1024 * 1024] {
        let chunk = vec![0xAB; size];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &chunk, |b, chunk| {
            b.iter(|| {
                let sealed = cipher.encrypt(chunk).unwrap();
                cipher.decrypt(&sealed).unwrap()
            });
        });
    }

    group.finish();
}

fn session_key() -> wisp_protocol::crypto::SessionKey {
    let password = Password::new("7-apple-river-lagoon");
    let mut ours = KeyExchange::initiate(&password);
    let theirs = KeyExchange::initiate(&password);
    ours.absorb(theirs.outbound_bytes()).unwrap();
    ours.session_key().unwrap()
}

criterion_group!(
    benches,
    bench_pake_initiate,
    bench_pake_full_round,
    bench_key_derivation,
    bench_seal_open,
);
criterion_main!(benches);
