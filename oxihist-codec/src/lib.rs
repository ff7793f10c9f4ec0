//! Pure Rust long-range compression.
//!
//! OxiHist exploits long, byte-identical repetitions inside a large sliding
//! window (4 MiB on the compression side). It is built for corpora like
//! successive snapshots of a growing text dump, where multi-hundred-byte
//! runs recur far apart. Short matches are deliberately ignored so a
//! single-probe hash table can cover the whole window at streaming speed;
//! the byte-aligned output is meant to be piped through a general-purpose
//! compressor afterwards.
//!
//! The stream is a sequence of blocks. Each block is a run of instructions,
//! each introduced by a signed varint: a negative value is a literal (that
//! many raw bytes follow), a positive value is a copy (length, then the
//! signed delta from the decoder's cursor to the copy source), and zero ends
//! the block, followed by the xxHash32 of the block's decoded bytes.
//!
//! # Example
//!
//! ```
//! use oxihist_codec::{compress, decompress};
//!
//! let data = b"one snapshot of a page... one snapshot of a page...";
//! let packed = compress(data).unwrap();
//! let unpacked = decompress(&packed).unwrap();
//! assert_eq!(unpacked, data);
//! ```

mod compress;
mod decompress;
pub mod frame;

pub use compress::Compressor;
pub use decompress::{Decompressor, StopAfter};
pub use frame::{compress, decompress, FrameHeader, FORMAT_MAJOR, FORMAT_MINOR, MAGIC};

/// log2 of the history ring used for compression.
pub const COMP_HIST_BITS: u32 = 22;

/// Smallest ring size a frame may declare.
pub const MIN_HIST_BITS: u32 = 18;

/// Largest ring size this build will allocate for decompression.
pub const MAX_HIST_BITS: u32 = 26;

/// Bytes that must overlap before a repetition is worth a copy instruction.
pub const WINDOW: i64 = 64;

/// Largest literal emitted in one instruction.
pub const MAX_LITERAL: i64 = 1 << 16;

/// Largest copy emitted in one instruction (decoders accept up to the ring).
pub const MAX_MATCH: i64 = 1 << 18;
