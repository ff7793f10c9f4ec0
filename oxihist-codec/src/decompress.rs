//! Streaming instruction interpreter.
//!
//! The decompressor reads the instruction stream, replays literals and
//! copies into its own history ring (teeing every byte to the output sink),
//! and verifies the checksum carried by each end-of-block marker.

use crate::MAX_LITERAL;
use oxihist_core::checksum::Checksum;
use oxihist_core::error::{OxihistError, Result};
use oxihist_core::ringbuffer::HistoryRing;
use oxihist_core::varint;
use oxihist_core::xxhash::XxHash32;
use std::io::{self, BufRead, Read, Write};

/// Where a stream is considered finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopAfter {
    /// Finish after a single end-of-block; the caller restarts per block.
    OneBlock,
    /// Keep consuming blocks until one decodes to zero bytes (the empty
    /// block sentinel used when streams are concatenated).
    EmptyBlock,
}

/// Outcome of interpreting one instruction.
enum Instr {
    /// A literal or copy produced this many bytes.
    Emitted(u64),
    /// End-of-block marker, checksum verified.
    BlockEnd,
    /// Input cleanly exhausted at a block boundary.
    CleanEof,
}

/// Streaming decompressor reading instructions from `R`.
pub struct Decompressor<R: BufRead, C: Checksum = XxHash32> {
    input: R,
    ring: HistoryRing,
    cursor: i64,
    cksum: C,
    stop: StopAfter,
    lit_buf: Box<[u8]>,
    // State for the pull adapter (`impl Read`).
    pending: Vec<u8>,
    pending_at: usize,
    block_len: u64,
    at_block_start: bool,
    finished: bool,
}

impl<R: BufRead> Decompressor<R> {
    /// Create a decompressor with a `2^hist_bits`-byte ring.
    pub fn new(input: R, hist_bits: u32, stop: StopAfter) -> Self {
        Self::with_checksum(input, hist_bits, stop, XxHash32::new())
    }
}

impl<R: BufRead, C: Checksum> Decompressor<R, C> {
    /// Create a decompressor verifying blocks with a caller-supplied
    /// checksum.
    pub fn with_checksum(input: R, hist_bits: u32, stop: StopAfter, cksum: C) -> Self {
        Self {
            input,
            ring: HistoryRing::new(hist_bits),
            cursor: 0,
            cksum,
            stop,
            lit_buf: vec![0; MAX_LITERAL as usize].into_boxed_slice(),
            pending: Vec::new(),
            pending_at: 0,
            block_len: 0,
            at_block_start: true,
            finished: false,
        }
    }

    /// Prime the ring and checksum with `dict`, in lockstep with the
    /// compressor's `load`.
    pub fn load(&mut self, dict: &[u8]) {
        self.ring.load(dict);
        self.cksum.update(dict);
    }

    /// Drop all state, keeping the allocations.
    pub fn reset(&mut self) {
        self.ring.clear();
        self.cursor = 0;
        self.cksum.reset();
        self.pending.clear();
        self.pending_at = 0;
        self.block_len = 0;
        self.at_block_start = true;
        self.finished = false;
    }

    /// Give back the underlying reader.
    pub fn into_inner(self) -> R {
        self.input
    }

    /// Decode one block into `sink`, returning the decoded byte count.
    ///
    /// `Ok(None)` means the input was cleanly exhausted before the block's
    /// first instruction; EOF anywhere later in the block is an error.
    pub fn copy_block<W: Write>(&mut self, sink: &mut W) -> Result<Option<u64>> {
        let mut total: u64 = 0;
        let mut first = true;
        loop {
            match self.next_instruction(sink, first)? {
                Instr::CleanEof => return Ok(None),
                Instr::Emitted(n) => {
                    total += n;
                    first = false;
                }
                Instr::BlockEnd => return Ok(Some(total)),
            }
        }
    }

    /// Decode into `sink` until the configured stop condition, returning the
    /// total byte count.
    pub fn write_to<W: Write>(&mut self, sink: &mut W) -> Result<u64> {
        match self.stop {
            StopAfter::OneBlock => self
                .copy_block(sink)?
                .ok_or_else(|| OxihistError::unexpected_eof("block")),
            StopAfter::EmptyBlock => {
                let mut total = 0;
                loop {
                    match self.copy_block(sink)? {
                        Some(0) => return Ok(total),
                        Some(n) => total += n,
                        None => {
                            return Err(OxihistError::unexpected_eof("empty end-of-block sentinel"))
                        }
                    }
                }
            }
        }
    }

    fn next_instruction<W: Write>(&mut self, sink: &mut W, at_block_start: bool) -> Result<Instr> {
        let n = if at_block_start {
            match varint::try_read(&mut self.input)? {
                None => return Ok(Instr::CleanEof),
                Some(n) => n,
            }
        } else {
            varint::read(&mut self.input)?
        };

        let ring_len = self.ring.capacity() as i64;
        if n > 0 {
            // Copy: length, then the cursor delta locating the source.
            if n > ring_len {
                return Err(OxihistError::copy_too_long(n, ring_len as usize));
            }
            let delta = varint::read(&mut self.input)?;
            self.cursor += delta;
            let mut tee = TeeChecksum {
                sink,
                cksum: &mut self.cksum,
            };
            self.ring.copy(&mut tee, self.cursor, n)?;
            self.cursor += n;
            Ok(Instr::Emitted(n as u64))
        } else if n < 0 {
            // Literal: |n| raw bytes follow, streamed in bounded slices.
            if n == i64::MIN || -n > ring_len {
                return Err(OxihistError::literal_too_long(n, ring_len as usize));
            }
            let len = -n;
            let mut remaining = len;
            while remaining > 0 {
                let chunk = remaining.min(MAX_LITERAL) as usize;
                read_exact(&mut self.input, &mut self.lit_buf[..chunk], "literal bytes")?;
                let mut tee = TeeChecksum {
                    sink,
                    cksum: &mut self.cksum,
                };
                self.ring.write(&mut tee, &self.lit_buf[..chunk])?;
                remaining -= chunk as i64;
            }
            self.cursor += len;
            Ok(Instr::Emitted(len as u64))
        } else {
            // End of block: the checksum of the decoded bytes follows.
            let mut carried = vec![0u8; self.cksum.size()];
            read_exact(&mut self.input, &mut carried, "block checksum")?;
            let computed = self.cksum.sum();
            if carried != computed {
                return Err(OxihistError::checksum_mismatch(carried, computed));
            }
            self.cksum.reset();
            Ok(Instr::BlockEnd)
        }
    }

    /// Decode one instruction into the pending buffer for `Read`.
    fn pump(&mut self) -> Result<()> {
        self.pending.clear();
        self.pending_at = 0;
        let mut out = std::mem::take(&mut self.pending);
        let instr = self.next_instruction(&mut out, self.at_block_start);
        self.pending = out;
        match instr? {
            Instr::Emitted(n) => {
                self.at_block_start = false;
                self.block_len += n;
            }
            Instr::BlockEnd => {
                let ended = match self.stop {
                    StopAfter::OneBlock => true,
                    StopAfter::EmptyBlock => self.block_len == 0,
                };
                self.at_block_start = true;
                self.block_len = 0;
                if ended {
                    self.finished = true;
                }
            }
            Instr::CleanEof => match self.stop {
                StopAfter::OneBlock => self.finished = true,
                StopAfter::EmptyBlock => {
                    return Err(OxihistError::unexpected_eof("empty end-of-block sentinel"))
                }
            },
        }
        Ok(())
    }
}

impl<R: BufRead, C: Checksum> Read for Decompressor<R, C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.pending_at == self.pending.len() {
            if self.finished {
                return Ok(0);
            }
            self.pump().map_err(io::Error::from)?;
        }
        let n = (self.pending.len() - self.pending_at).min(buf.len());
        buf[..n].copy_from_slice(&self.pending[self.pending_at..self.pending_at + n]);
        self.pending_at += n;
        Ok(n)
    }
}

/// Splits the decoded byte stream between the output sink and the block
/// checksum.
struct TeeChecksum<'a, W: Write, C: Checksum> {
    sink: &'a mut W,
    cksum: &'a mut C,
}

impl<W: Write, C: Checksum> Write for TeeChecksum<'_, W, C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.sink.write(buf)?;
        self.cksum.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

fn read_exact<R: Read>(r: &mut R, buf: &mut [u8], what: &'static str) -> Result<()> {
    r.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            OxihistError::unexpected_eof(what)
        } else {
            OxihistError::Io(e)
        }
    })
}
