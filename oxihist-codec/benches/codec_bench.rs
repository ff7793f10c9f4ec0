//! Throughput benchmarks for the long-range codec.
//!
//! Three corpora: noise (worst case for the matcher), periodic text-like
//! data, and a pair of large near-identical snapshots (the target
//! workload).

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use oxihist_codec::{compress, decompress};
use std::hint::black_box;

/// Deterministic noise from a 64-bit LCG.
fn noise(len: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(len);
    let mut seed = 0x9E3779B97F4A7C15u64;
    for _ in 0..len {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        data.push((seed >> 56) as u8);
    }
    data
}

/// Word-salad with heavy long-range repetition.
fn text_like(len: usize) -> Vec<u8> {
    let sentence = b"the revision differs from the previous revision in only a few places ";
    let mut data = Vec::with_capacity(len);
    while data.len() < len {
        data.extend_from_slice(sentence);
    }
    data.truncate(len);
    data
}

/// Two snapshots of the same page, a handful of bytes apart.
fn snapshots(len: usize) -> Vec<u8> {
    let mut page = noise(len / 2);
    let mut second = page.clone();
    for at in (0..second.len()).step_by(10_000) {
        second[at] ^= 0x5A;
    }
    page.extend_from_slice(&second);
    page
}

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");
    for (name, data) in [
        ("noise_1m", noise(1 << 20)),
        ("text_1m", text_like(1 << 20)),
        ("snapshots_2m", snapshots(2 << 20)),
    ] {
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| compress(black_box(&data)).unwrap());
        });
    }
    group.finish();
}

fn bench_decompress(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompress");
    for (name, data) in [
        ("text_1m", text_like(1 << 20)),
        ("snapshots_2m", snapshots(2 << 20)),
    ] {
        let packed = compress(&data).unwrap();
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| decompress(black_box(&packed)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compress, bench_decompress);
criterion_main!(benches);
