//! Streaming xxHash32, the default block checksum.
//!
//! xxHash32 is used rather than a CRC because it stays fast on builds and
//! CPUs without hardware CRC support. Seed 0, serialized big-endian.

use crate::checksum::Checksum;

const PRIME_1: u32 = 0x9E3779B1;
const PRIME_2: u32 = 0x85EBCA77;
const PRIME_3: u32 = 0xC2B2AE3D;
const PRIME_4: u32 = 0x27D4EB2F;
const PRIME_5: u32 = 0x165667B1;

#[inline]
fn round(acc: u32, lane: u32) -> u32 {
    acc.wrapping_add(lane.wrapping_mul(PRIME_2))
        .rotate_left(13)
        .wrapping_mul(PRIME_1)
}

#[inline]
fn word(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Incremental xxHash32 hasher.
#[derive(Debug, Clone)]
pub struct XxHash32 {
    seed: u32,
    lanes: [u32; 4],
    /// Partial stripe carried between `update` calls; never holds 16 bytes.
    tail: [u8; 16],
    tail_len: usize,
    total_len: u64,
}

impl XxHash32 {
    /// Create a hasher with seed 0.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Create a hasher with a custom seed.
    pub fn with_seed(seed: u32) -> Self {
        Self {
            seed,
            lanes: Self::fresh_lanes(seed),
            tail: [0; 16],
            tail_len: 0,
            total_len: 0,
        }
    }

    fn fresh_lanes(seed: u32) -> [u32; 4] {
        [
            seed.wrapping_add(PRIME_1).wrapping_add(PRIME_2),
            seed.wrapping_add(PRIME_2),
            seed,
            seed.wrapping_sub(PRIME_1),
        ]
    }

    #[inline]
    fn stripe(&mut self, block: &[u8]) {
        self.lanes[0] = round(self.lanes[0], word(&block[0..]));
        self.lanes[1] = round(self.lanes[1], word(&block[4..]));
        self.lanes[2] = round(self.lanes[2], word(&block[8..]));
        self.lanes[3] = round(self.lanes[3], word(&block[12..]));
    }

    /// Absorb `data` into the running hash.
    pub fn update(&mut self, data: &[u8]) {
        self.total_len += data.len() as u64;
        let mut rest = data;

        if self.tail_len > 0 {
            let take = rest.len().min(16 - self.tail_len);
            self.tail[self.tail_len..self.tail_len + take].copy_from_slice(&rest[..take]);
            self.tail_len += take;
            rest = &rest[take..];
            if self.tail_len < 16 {
                return;
            }
            let full = self.tail;
            self.stripe(&full);
            self.tail_len = 0;
        }

        let mut stripes = rest.chunks_exact(16);
        for block in &mut stripes {
            self.stripe(block);
        }
        let leftover = stripes.remainder();
        self.tail[..leftover.len()].copy_from_slice(leftover);
        self.tail_len = leftover.len();
    }

    /// Finalize the hash without disturbing the running state.
    pub fn finish(&self) -> u32 {
        let mut acc = if self.total_len >= 16 {
            self.lanes[0]
                .rotate_left(1)
                .wrapping_add(self.lanes[1].rotate_left(7))
                .wrapping_add(self.lanes[2].rotate_left(12))
                .wrapping_add(self.lanes[3].rotate_left(18))
        } else {
            self.seed.wrapping_add(PRIME_5)
        };

        acc = acc.wrapping_add(self.total_len as u32);

        let tail = &self.tail[..self.tail_len];
        let mut words = tail.chunks_exact(4);
        for w in &mut words {
            acc = acc.wrapping_add(word(w).wrapping_mul(PRIME_3));
            acc = acc.rotate_left(17).wrapping_mul(PRIME_4);
        }
        for &byte in words.remainder() {
            acc = acc.wrapping_add(u32::from(byte).wrapping_mul(PRIME_5));
            acc = acc.rotate_left(11).wrapping_mul(PRIME_1);
        }

        acc ^= acc >> 15;
        acc = acc.wrapping_mul(PRIME_2);
        acc ^= acc >> 13;
        acc = acc.wrapping_mul(PRIME_3);
        acc ^= acc >> 16;
        acc
    }

    /// Reset to the initial state.
    pub fn reset(&mut self) {
        self.lanes = Self::fresh_lanes(self.seed);
        self.tail_len = 0;
        self.total_len = 0;
    }
}

impl Default for XxHash32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Checksum for XxHash32 {
    fn size(&self) -> usize {
        4
    }

    fn update(&mut self, data: &[u8]) {
        XxHash32::update(self, data);
    }

    fn sum(&self) -> Vec<u8> {
        self.finish().to_be_bytes().to_vec()
    }

    fn reset(&mut self) {
        XxHash32::reset(self);
    }
}

/// One-shot xxHash32 with seed 0.
pub fn xxhash32(data: &[u8]) -> u32 {
    let mut hasher = XxHash32::new();
    hasher.update(data);
    hasher.finish()
}
