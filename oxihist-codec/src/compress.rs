//! Single-pass streaming compressor.
//!
//! The compressor is a `Write` sink: bytes go in, instructions come out.
//! Per input byte it updates a multiplicative rolling hash, probes (at most
//! once) a sparsely-populated hash table of earlier positions, and either
//! extends a pending match, extends a pending literal, or converts the tail
//! of the literal into a match by extending a candidate backwards.

use crate::{COMP_HIST_BITS, MAX_LITERAL, MAX_MATCH, WINDOW};
use oxihist_core::checksum::Checksum;
use oxihist_core::error::Result;
use oxihist_core::varint;
use oxihist_core::xxhash::XxHash32;
use std::io::{self, Write};

const RING_LEN: usize = 1 << COMP_HIST_BITS;
const R_MASK: i64 = (RING_LEN - 1) as i64;

// Hash table: single probe, positions sampled so the table sits about half
// full over a full window of history.
const H_BITS: u32 = 18;
const H_MASK: u32 = (1 << H_BITS) - 1;
const H_SHIFT: u32 = 32 - H_BITS;
const F_BITS: u32 = COMP_HIST_BITS - H_BITS + 1;
const F_MASK: u32 = (1 << F_BITS) - 1;

// Any odd constant times two works here as long as some high bits are set;
// low bits mix upward over successive multiplications.
const HASH_MUL: u32 = ((0x703a_03ac | 1) * 2) | (1 << 31);

/// Streaming compressor writing instructions to `W`.
///
/// Created against an output sink, fed through [`std::io::Write`], and
/// finished with [`Compressor::finish`] (or [`Compressor::delimit`] for a
/// block boundary that keeps the history for the next block).
pub struct Compressor<W: Write, C: Checksum = XxHash32> {
    out: W,
    /// Count of bytes ever consumed, plus one: position 0 is the hash
    /// table's "empty slot" sentinel.
    pos: i64,
    /// Position implied after the last emitted instruction; copies encode
    /// their source as a delta from here.
    cursor: i64,
    h: u32,
    match_pos: i64,
    match_len: i64,
    literal_len: i64,
    /// Candidates at or below this position are ignored; raised by
    /// [`Compressor::reset`] to fence off pre-reset history.
    min_match: i64,
    /// Length of the run of identical bytes ending at the last byte.
    run: i64,
    prev_byte: i32,
    ring: Box<[u8]>,
    table: Box<[i64]>,
    cksum: C,
}

impl<W: Write> Compressor<W> {
    /// Create a compressor with 4 MiB of history, writing to `out`.
    pub fn new(out: W) -> Self {
        Self::with_checksum(out, XxHash32::new())
    }
}

impl<W: Write, C: Checksum> Compressor<W, C> {
    /// Create a compressor sealing blocks with a caller-supplied checksum.
    pub fn with_checksum(out: W, cksum: C) -> Self {
        Self {
            out,
            pos: 1,
            cursor: 1,
            h: 0,
            match_pos: 0,
            match_len: 0,
            literal_len: 0,
            min_match: 0,
            run: 0,
            prev_byte: -1,
            ring: vec![0; RING_LEN].into_boxed_slice(),
            table: vec![0; 1 << H_BITS].into_boxed_slice(),
            cksum,
        }
    }

    /// Prime the ring, rolling hash, and hash table with `dict`, emitting
    /// nothing.
    ///
    /// A decompressor for this stream must load the identical bytes; the
    /// block checksum covers them on both sides.
    pub fn load(&mut self, dict: &[u8]) {
        self.cksum.update(dict);
        for &b in dict {
            self.h = self.h.wrapping_mul(HASH_MUL) ^ u32::from(b);
            self.ring[(self.pos & R_MASK) as usize] = b;
            if self.h & F_MASK == F_MASK {
                self.table[((self.h >> H_SHIFT) & H_MASK) as usize] = self.pos;
            }
            self.pos += 1;
            self.track_run(b);
        }
    }

    /// Start a fresh encode at the current position.
    ///
    /// Pending match/literal state and the checksum are dropped and no
    /// future copy will reference bytes consumed before the reset. The ring
    /// contents themselves are retained.
    pub fn reset(&mut self) {
        self.match_pos = 0;
        self.match_len = 0;
        self.literal_len = 0;
        self.cursor = self.pos;
        self.min_match = self.pos - 1;
        self.run = 0;
        self.prev_byte = -1;
        self.cksum.reset();
    }

    /// Flush the pending match or literal, write the end-of-block marker and
    /// block checksum, and reset the checksum.
    ///
    /// Compressor history (ring, hash, table, position) is preserved, so
    /// later blocks can still reference earlier bytes.
    pub fn delimit(&mut self) -> Result<()> {
        if self.match_len > 0 {
            let (match_pos, match_len) = (self.match_pos, self.match_len);
            self.put_match(match_pos, match_len)?;
            self.match_pos = 0;
            self.match_len = 0;
        } else {
            let (pos, literal_len) = (self.pos, self.literal_len);
            self.put_literal(pos, literal_len)?;
            self.literal_len = 0;
        }
        varint::write(&mut self.out, 0)?;
        let sum = self.cksum.sum();
        self.out.write_all(&sum)?;
        self.cksum.reset();
        Ok(())
    }

    /// Delimit the final block and hand back the sink.
    pub fn finish(mut self) -> Result<W> {
        self.delimit()?;
        Ok(self.out)
    }

    /// The sink this compressor writes to.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn consume(&mut self, buf: &[u8]) -> Result<()> {
        self.cksum.update(buf);
        for &b in buf {
            self.h = self.h.wrapping_mul(HASH_MUL) ^ u32::from(b);

            // In a match: extend it or flush it.
            if self.match_len > 0 {
                if self.ring[((self.match_pos + self.match_len) & R_MASK) as usize] == b
                    && self.match_len < MAX_MATCH
                {
                    self.match_len += 1;
                } else {
                    let (match_pos, match_len) = (self.match_pos, self.match_len);
                    self.put_match(match_pos, match_len)?;
                    self.match_pos = 0;
                    self.match_len = 0;
                }
            }

            // Not in a match: see if one can start here. The pending literal
            // must already be longer than the acceptance window so backward
            // extension has something to consume.
            if self.match_len == 0 && self.literal_len > WINDOW {
                if self.h & F_MASK == F_MASK {
                    let cand = self.table[((self.h >> H_SHIFT) & H_MASK) as usize];
                    if cand > self.min_match
                        && b == self.ring[(cand & R_MASK) as usize]
                        && cand > self.pos - R_MASK + MAX_LITERAL
                    {
                        self.start_match(cand)?;
                    }
                }
                // The table gate cannot fire inside a constant-byte run (the
                // even multiplier drains the low hash bits), so long runs get
                // their own candidate: the previous byte, which turns into a
                // self-overlapping copy when accepted.
                if self.match_len == 0 && self.run > WINDOW {
                    let cand = self.pos - 1;
                    if cand > self.min_match && b == self.ring[(cand & R_MASK) as usize] {
                        self.start_match(cand)?;
                    }
                }
            }

            // Still not in a match: extend the literal.
            if self.match_len == 0 {
                if self.literal_len == MAX_LITERAL {
                    let (pos, literal_len) = (self.pos, self.literal_len);
                    self.put_literal(pos, literal_len)?;
                    self.literal_len = 0;
                }
                self.literal_len += 1;
            }

            // Record the byte and sample the position into the table.
            self.ring[(self.pos & R_MASK) as usize] = b;
            if self.h & F_MASK == F_MASK {
                self.table[((self.h >> H_SHIFT) & H_MASK) as usize] = self.pos;
            }
            self.pos += 1;
            self.track_run(b);
        }
        Ok(())
    }

    /// Grow a candidate backwards through the pending literal; keep it if it
    /// clears the window, otherwise leave all state untouched.
    fn start_match(&mut self, cand: i64) -> Result<()> {
        let mut match_pos = cand;
        let mut match_len: i64 = 1; // current byte already matched
        let mut literal_len = self.literal_len;
        let floor = (self.pos - R_MASK + MAX_LITERAL)
            .max(self.min_match)
            .max(0);
        while literal_len > 0
            && match_pos - 1 > floor
            && self.ring[((self.pos - match_len) & R_MASK) as usize]
                == self.ring[((match_pos - 1) & R_MASK) as usize]
        {
            literal_len -= 1;
            match_pos -= 1;
            match_len += 1;
        }
        if match_len < WINDOW {
            return Ok(());
        }
        // The surviving literal ends where the match begins, not at pos.
        let literal_end = self.pos - match_len + 1;
        self.put_literal(literal_end, literal_len)?;
        self.match_pos = match_pos;
        self.match_len = match_len;
        self.literal_len = 0;
        Ok(())
    }

    fn put_match(&mut self, match_pos: i64, match_len: i64) -> Result<()> {
        varint::write(&mut self.out, match_len)?;
        varint::write(&mut self.out, match_pos - self.cursor)?;
        self.cursor = match_pos + match_len;
        Ok(())
    }

    fn put_literal(&mut self, pos: i64, literal_len: i64) -> Result<()> {
        if literal_len == 0 {
            return Ok(());
        }
        varint::write(&mut self.out, -literal_len)?;
        let end = (pos & R_MASK) as usize;
        if literal_len > (pos & R_MASK) {
            // The literal wraps the physical end of the ring.
            let start = ((pos - literal_len) & R_MASK) as usize;
            self.out.write_all(&self.ring[start..])?;
            self.out.write_all(&self.ring[..end])?;
        } else {
            let start = ((pos - literal_len) & R_MASK) as usize;
            self.out.write_all(&self.ring[start..end])?;
        }
        self.cursor += literal_len;
        Ok(())
    }

    #[inline]
    fn track_run(&mut self, b: u8) {
        if i32::from(b) == self.prev_byte {
            self.run += 1;
        } else {
            self.run = 1;
            self.prev_byte = i32::from(b);
        }
    }
}

impl<W: Write, C: Checksum> Write for Compressor<W, C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.consume(buf).map_err(io::Error::from)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
