//! # OxiHist Core
//!
//! Core components for the OxiHist long-range compressor.
//!
//! This crate provides the fundamental building blocks the codec is built
//! from:
//!
//! - [`varint`]: Signed variable-length integers (zigzag + LEB128)
//! - [`checksum`]: The checksum capability used to seal each block
//! - [`xxhash`]: Streaming xxHash32, the default block checksum
//! - [`ringbuffer`]: History ring addressed by absolute stream position
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! OxiHist is a layered pipeline:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Driver                                              │
//! │     stdin/stdout CLI, mirror self-check pipeline        │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     Compressor / Decompressor, frame header             │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Primitives (this crate)                             │
//! │     Varints, HistoryRing, Checksum, xxHash32            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxihist_core::varint;
//! use oxihist_core::xxhash::xxhash32;
//!
//! let mut buf = Vec::new();
//! varint::write(&mut buf, -42).unwrap();
//! assert_eq!(varint::read(&mut buf.as_slice()).unwrap(), -42);
//!
//! assert_eq!(xxhash32(b""), 0x02CC5D05);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod checksum;
pub mod error;
pub mod ringbuffer;
pub mod varint;
pub mod xxhash;

// Re-exports for convenience
pub use checksum::Checksum;
pub use error::{OxihistError, Result};
pub use ringbuffer::HistoryRing;
pub use xxhash::XxHash32;
