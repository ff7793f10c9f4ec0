//! Outer frame: signature, ring size, format version.
//!
//! ```text
//! offset  size  meaning
//! 0       4     signature: AC 9A DC F0
//! 4       1     log2 of the history ring (18..=26 on decode, 22 on encode)
//! 5       1     format major version (reject if newer than supported)
//! 6       1     format minor version (informational)
//! 7       1     count of extra header bytes that follow
//! 8       n     reserved, skipped
//! 8+n     ...   instruction stream
//! ```
//!
//! The frame itself carries no trailing checksum; every end-of-block marker
//! inside the stream carries one. Frames written as minor version 1 used to
//! append a whole-stream checksum after the body, which decoders here simply
//! never require.

use crate::compress::Compressor;
use crate::decompress::{Decompressor, StopAfter};
use crate::{COMP_HIST_BITS, MAX_HIST_BITS, MIN_HIST_BITS};
use oxihist_core::error::{OxihistError, Result};
use std::io::{self, Read, Write};

/// Stream signature (randomly chosen, no mnemonic).
pub const MAGIC: [u8; 4] = [0xAC, 0x9A, 0xDC, 0xF0];

/// Newest format major version this build reads and writes.
pub const FORMAT_MAJOR: u8 = 0;

/// Format minor version written by this build.
pub const FORMAT_MINOR: u8 = 2;

/// Fixed portion of the frame header.
pub const HEADER_LEN: usize = 8;

/// Parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// log2 of the history ring the stream was encoded against.
    pub hist_bits: u32,
    /// Format major version.
    pub major: u8,
    /// Format minor version.
    pub minor: u8,
    /// Count of reserved bytes between the header and the stream.
    pub extra: u8,
}

impl FrameHeader {
    /// Header for a stream written by this build.
    pub fn current() -> Self {
        Self {
            hist_bits: COMP_HIST_BITS,
            major: FORMAT_MAJOR,
            minor: FORMAT_MINOR,
            extra: 0,
        }
    }

    /// Serialize the fixed header.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        [
            MAGIC[0],
            MAGIC[1],
            MAGIC[2],
            MAGIC[3],
            self.hist_bits as u8,
            self.major,
            self.minor,
            self.extra,
        ]
    }

    /// Validate and parse the fixed header.
    pub fn parse(head: &[u8; HEADER_LEN]) -> Result<Self> {
        if head[..4] != MAGIC {
            return Err(OxihistError::invalid_magic(&head[..4]));
        }
        let (bits, major, minor, extra) = (head[4], head[5], head[6], head[7]);
        if major > FORMAT_MAJOR {
            return Err(OxihistError::unsupported_version(major, FORMAT_MAJOR));
        }
        if u32::from(bits) > MAX_HIST_BITS {
            return Err(OxihistError::window_too_large(bits, MAX_HIST_BITS as u8));
        }
        if u32::from(bits) < MIN_HIST_BITS {
            return Err(OxihistError::invalid_header(format!(
                "history ring of 2^{bits} bytes is below the 2^{MIN_HIST_BITS} minimum"
            )));
        }
        Ok(Self {
            hist_bits: u32::from(bits),
            major,
            minor,
            extra,
        })
    }
}

/// Write the current frame header to `w`.
pub fn write_header<W: Write>(w: &mut W) -> Result<()> {
    w.write_all(&FrameHeader::current().encode())?;
    Ok(())
}

/// Read, validate, and skip past a frame header.
pub fn read_header<R: Read>(r: &mut R) -> Result<FrameHeader> {
    let mut head = [0u8; HEADER_LEN];
    r.read_exact(&mut head).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            OxihistError::unexpected_eof("frame header")
        } else {
            OxihistError::Io(e)
        }
    })?;
    let header = FrameHeader::parse(&head)?;
    if header.extra > 0 {
        let mut reserved = (&mut *r).take(u64::from(header.extra));
        let skipped = io::copy(&mut reserved, &mut io::sink())?;
        if skipped != u64::from(header.extra) {
            return Err(OxihistError::unexpected_eof("reserved header bytes"));
        }
    }
    Ok(header)
}

/// Leading signatures of formats the compressor refuses to re-compress.
const FOREIGN_SIGNATURES: &[(&[u8], &str)] = &[
    (b"BZh", "bzip2"),
    (b"7z", "7-zip"),
    (&[0x1F, 0x8B], "gzip"),
    (b"PK", "zip"),
    (&[0xFD, b'7', b'z', b'X', b'Z'], "xz"),
];

/// Identify input that already carries another compressor's signature.
pub fn foreign_signature(head: &[u8]) -> Option<&'static str> {
    FOREIGN_SIGNATURES
        .iter()
        .find(|(sig, _)| head.starts_with(sig))
        .map(|&(_, name)| name)
}

/// Compress `input` into a complete framed stream.
pub fn compress(input: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_LEN + input.len() / 4 + 16);
    write_header(&mut out)?;
    let mut compressor = Compressor::new(out);
    compressor.write_all(input)?;
    compressor.finish()
}

/// Decompress a complete framed stream.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>> {
    let mut reader = input;
    let header = read_header(&mut reader)?;
    let mut decompressor = Decompressor::new(reader, header.hist_bits, StopAfter::OneBlock);
    let mut out = Vec::new();
    while decompressor.copy_block(&mut out)?.is_some() {}
    Ok(out)
}
