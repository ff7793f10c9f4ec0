//! End-to-end round-trip coverage for the codec: the concrete corpora the
//! format was built for (snapshots, runs, diffs, ring-sized streams), both
//! end-of-stream conventions, and randomized inputs.

use oxihist_codec::{
    compress, decompress, Compressor, Decompressor, StopAfter, COMP_HIST_BITS, MAX_LITERAL,
};
use proptest::prelude::*;
use std::io::{Read, Write};

/// RC4 keystream; deterministic filler that compresses like noise.
fn rc4_keystream(key: &[u8], len: usize) -> Vec<u8> {
    let mut s: Vec<u8> = (0..=255).collect();
    let mut j = 0u8;
    for i in 0..256 {
        j = j
            .wrapping_add(s[i])
            .wrapping_add(key[i % key.len()]);
        s.swap(i, j as usize);
    }
    let mut out = Vec::with_capacity(len);
    let (mut i, mut j) = (0u8, 0u8);
    for _ in 0..len {
        i = i.wrapping_add(1);
        j = j.wrapping_add(s[i as usize]);
        s.swap(i as usize, j as usize);
        out.push(s[(s[i as usize].wrapping_add(s[j as usize])) as usize]);
    }
    out
}

/// Compress to a bare (unframed) instruction stream.
fn pack(data: &[u8]) -> Vec<u8> {
    let mut c = Compressor::new(Vec::new());
    c.write_all(data).unwrap();
    c.finish().unwrap()
}

/// Decode a bare instruction stream produced by `pack`.
fn unpack(stream: &[u8]) -> Vec<u8> {
    let mut d = Decompressor::new(stream, COMP_HIST_BITS, StopAfter::OneBlock);
    let mut out = Vec::new();
    while d.copy_block(&mut out).unwrap().is_some() {}
    out
}

/// Instruction-stream length excluding the end-of-block marker and checksum.
fn body_len(stream: &[u8]) -> usize {
    stream.len() - 5
}

#[test]
fn empty_input() {
    let stream = pack(b"");
    assert_eq!(body_len(&stream), 0);
    assert_eq!(unpack(&stream), b"");
}

#[test]
fn all_zero_input_compresses_hard() {
    let data = vec![0u8; 10_000];
    let stream = pack(&data);
    assert!(
        body_len(&stream) + 1 <= 100,
        "10k zeros left a {}-byte body",
        body_len(&stream)
    );
    assert_eq!(unpack(&stream), data);
}

#[test]
fn overlapping_repeat() {
    let unit = b"abcdefghijklmnopqrstuvwxyz9876543210ABCDEFG";
    let mut data = Vec::new();
    for _ in 0..8 {
        data.extend_from_slice(unit);
    }
    assert_eq!(data.len(), 344);

    let stream = pack(&data);
    assert!(
        body_len(&stream) < data.len() / 6,
        "periodic input left a {}-byte body",
        body_len(&stream)
    );
    assert_eq!(unpack(&stream), data);
}

#[test]
fn dictionary_diff() {
    let base = rc4_keystream(b"hello", 5000);
    let mut edited = base.clone();
    edited[10] = 0;
    edited[11] = 0;
    edited[12] = 0;

    let mut c = Compressor::new(Vec::new());
    c.load(&base);
    c.write_all(&edited).unwrap();
    let diff = c.finish().unwrap();
    let body = body_len(&diff);
    assert!((9..=50).contains(&body), "diff body was {body} bytes");

    let mut d = Decompressor::new(diff.as_slice(), COMP_HIST_BITS, StopAfter::OneBlock);
    d.load(&base);
    let mut out = Vec::new();
    assert_eq!(d.write_to(&mut out).unwrap(), edited.len() as u64);
    assert_eq!(out, edited);
}

#[test]
fn dictionary_diff_through_read_adapter() {
    let base = rc4_keystream(b"hello", 5000);
    let mut edited = base.clone();
    edited[10] = 0;
    edited[11] = 0;
    edited[12] = 0;

    let mut c = Compressor::new(Vec::new());
    c.load(&base);
    c.write_all(&edited).unwrap();
    let diff = c.finish().unwrap();

    let mut d = Decompressor::new(diff.as_slice(), COMP_HIST_BITS, StopAfter::OneBlock);
    d.load(&base);
    let mut out = Vec::new();
    d.read_to_end(&mut out).unwrap();
    assert_eq!(out, edited);
}

#[test]
fn reset_fences_off_history() {
    let data = rc4_keystream(b"hello", 5000);
    let mut c = Compressor::new(Vec::new());
    c.write_all(&data).unwrap();
    c.reset();
    let emitted_before = c.get_ref().len();
    c.write_all(&data).unwrap();
    let stream = c.finish().unwrap();
    assert!(
        stream.len() - emitted_before >= data.len(),
        "a back-reference crossed the reset"
    );
}

#[test]
fn ring_wrap() {
    let ring = 1usize << COMP_HIST_BITS;
    let mut data = rc4_keystream(b"hello", ring + 1000);
    // One repeat whose destination wraps the ring, one whose source does.
    let (src, dst) = (100_000, ring - 200);
    data.copy_within(src..src + 400, dst);
    data.copy_within(dst..dst + 400, ring + 600);

    let stream = pack(&data);
    assert!(
        stream.len() < data.len() - 500,
        "compression only saved {} bytes",
        data.len() - stream.len()
    );
    assert_eq!(unpack(&stream), data);
}

#[test]
fn literal_boundary_roundtrip() {
    // Incompressible input straddling the single-literal limit.
    let data = rc4_keystream(b"hello", MAX_LITERAL as usize + 100);
    let stream = pack(&data);
    assert_eq!(unpack(&stream), data);
}

#[test]
fn multi_block_stream() {
    let chunk = rc4_keystream(b"hello", 3000);
    let mut c = Compressor::new(Vec::new());
    c.write_all(&chunk).unwrap();
    c.delimit().unwrap();
    c.write_all(&chunk).unwrap();
    let stream = c.finish().unwrap();

    // The second block may reach back into the first block's history.
    let mut d = Decompressor::new(stream.as_slice(), COMP_HIST_BITS, StopAfter::OneBlock);
    let mut out = Vec::new();
    let first = d.copy_block(&mut out).unwrap().unwrap();
    let second = d.copy_block(&mut out).unwrap().unwrap();
    assert_eq!(d.copy_block(&mut out).unwrap(), None);
    assert_eq!(first, 3000);
    assert_eq!(second, 3000);
    assert_eq!(out, [chunk.clone(), chunk].concat());
}

#[test]
fn concatenated_mode_stops_at_empty_block() {
    let chunk = rc4_keystream(b"hello", 2000);
    let mut c = Compressor::new(Vec::new());
    c.write_all(&chunk).unwrap();
    c.delimit().unwrap();
    c.delimit().unwrap(); // empty block sentinel
    let mut stream = c.finish().unwrap();
    stream.extend_from_slice(b"trailing garbage the decoder must never touch");

    let mut d = Decompressor::new(stream.as_slice(), COMP_HIST_BITS, StopAfter::EmptyBlock);
    let mut out = Vec::new();
    assert_eq!(d.write_to(&mut out).unwrap(), 2000);
    assert_eq!(out, chunk);
}

#[test]
fn concatenated_mode_through_read_adapter() {
    let chunk = rc4_keystream(b"hello", 2000);
    let mut c = Compressor::new(Vec::new());
    c.write_all(&chunk).unwrap();
    c.delimit().unwrap();
    c.delimit().unwrap();
    let stream = c.finish().unwrap();

    let mut d = Decompressor::new(stream.as_slice(), COMP_HIST_BITS, StopAfter::EmptyBlock);
    let mut out = Vec::new();
    d.read_to_end(&mut out).unwrap();
    assert_eq!(out, chunk);
}

#[test]
fn decompressor_reset_between_independent_streams() {
    let first = rc4_keystream(b"hello", 1000);
    let second = rc4_keystream(b"world", 1500);
    let joined = [pack(&first), pack(&second)].concat();

    // Each stream came from a fresh compressor, so the decoder must drop
    // its state at the seam.
    let mut d = Decompressor::new(joined.as_slice(), COMP_HIST_BITS, StopAfter::OneBlock);
    let mut out = Vec::new();
    assert_eq!(d.write_to(&mut out).unwrap(), 1000);
    assert_eq!(out, first);

    d.reset();
    let mut out = Vec::new();
    assert_eq!(d.write_to(&mut out).unwrap(), 1500);
    assert_eq!(out, second);
}

#[test]
fn framed_helpers_roundtrip_snapshots() {
    // Two near-identical "snapshots" back to back, the shape this codec
    // is actually for.
    let page = rc4_keystream(b"hello", 40_000);
    let mut revision = page.clone();
    revision[20_000] ^= 0xFF;
    let mut data = page;
    data.extend_from_slice(&revision);
    data.extend_from_slice(&revision);

    let packed = compress(&data).unwrap();
    assert!(packed.len() < data.len() / 2);
    assert_eq!(decompress(&packed).unwrap(), data);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn roundtrip_random(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let packed = compress(&data).unwrap();
        prop_assert_eq!(decompress(&packed).unwrap(), data);
    }

    #[test]
    fn roundtrip_structured(
        unit in proptest::collection::vec(any::<u8>(), 1..200),
        repeats in 1usize..40,
        noise in proptest::collection::vec(any::<u8>(), 0..256),
    ) {
        let mut data = Vec::new();
        for _ in 0..repeats {
            data.extend_from_slice(&unit);
        }
        data.extend_from_slice(&noise);
        let packed = compress(&data).unwrap();
        prop_assert_eq!(decompress(&packed).unwrap(), data);
    }
}
