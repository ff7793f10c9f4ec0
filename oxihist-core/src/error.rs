//! Error types for OxiHist operations.
//!
//! One error enum covers the whole pipeline: I/O failures from the
//! underlying reader/writer, malformed instruction streams, frame
//! validation, and checksum verification.

use std::io;
use thiserror::Error;

/// The main error type for OxiHist operations.
#[derive(Debug, Error)]
pub enum OxihistError {
    /// I/O error from the underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input does not start with the OxiHist signature.
    #[error("invalid signature: found {found:02x?}")]
    InvalidMagic {
        /// Actual leading bytes found.
        found: Vec<u8>,
    },

    /// The frame was written by a newer, incompatible format revision.
    #[error("format major version {major} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Major version found in the frame.
        major: u8,
        /// Newest major version this build understands.
        supported: u8,
    },

    /// The frame asks for a larger history ring than this build will allocate.
    #[error("frame needs a 2^{bits}-byte history ring for decompression (this build accepts up to 2^{max})")]
    WindowTooLarge {
        /// log2 of the requested ring size.
        bits: u8,
        /// log2 of the largest accepted ring size.
        max: u8,
    },

    /// Structurally invalid frame header.
    #[error("invalid header: {message}")]
    InvalidHeader {
        /// Description of the header error.
        message: String,
    },

    /// A copy instruction referenced the current or a future position.
    #[error("copy source {src} is at or after the current position {pos}")]
    CopyFromFuture {
        /// Absolute source position of the copy.
        src: i64,
        /// Current absolute write position.
        pos: i64,
    },

    /// A copy instruction referenced bytes already evicted from the ring.
    #[error("copy source {src} is too far back (oldest retained position is {oldest})")]
    CopyTooFarBack {
        /// Absolute source position of the copy.
        src: i64,
        /// Oldest position still held by the ring.
        oldest: i64,
    },

    /// A copy instruction was longer than the history ring.
    #[error("copy length {length} exceeds the {max}-byte history ring")]
    CopyTooLong {
        /// Encoded copy length.
        length: i64,
        /// Ring capacity in bytes.
        max: usize,
    },

    /// A literal instruction was longer than the history ring.
    #[error("literal length {length} exceeds the {max}-byte history ring")]
    LiteralTooLong {
        /// Encoded literal length.
        length: i64,
        /// Ring capacity in bytes.
        max: usize,
    },

    /// Block checksum disagreed with the checksum of the decoded bytes.
    #[error("checksum mismatch: stream carries {expected:02x?}, decoded data hashes to {computed:02x?}")]
    ChecksumMismatch {
        /// Checksum bytes read from the stream.
        expected: Vec<u8>,
        /// Checksum computed over the decoded bytes.
        computed: Vec<u8>,
    },

    /// The stream ended in the middle of an instruction or its payload.
    #[error("unexpected end of input while reading {what}")]
    UnexpectedEof {
        /// What was being read when the input ran out.
        what: &'static str,
    },

    /// A variable-length integer did not fit in 64 bits.
    #[error("variable-length integer overflows 64 bits")]
    VarintOverflow,

    /// The mirror decompressor rejected the compressor's own output.
    #[error("self-check decompression failed: {0}")]
    SelfCheck(#[source] Box<OxihistError>),
}

/// Result type alias for OxiHist operations.
pub type Result<T> = std::result::Result<T, OxihistError>;

impl OxihistError {
    /// Create an invalid magic error.
    pub fn invalid_magic(found: impl Into<Vec<u8>>) -> Self {
        Self::InvalidMagic {
            found: found.into(),
        }
    }

    /// Create an unsupported version error.
    pub fn unsupported_version(major: u8, supported: u8) -> Self {
        Self::UnsupportedVersion { major, supported }
    }

    /// Create a window-too-large error.
    pub fn window_too_large(bits: u8, max: u8) -> Self {
        Self::WindowTooLarge { bits, max }
    }

    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create a copy-from-future error.
    pub fn copy_from_future(src: i64, pos: i64) -> Self {
        Self::CopyFromFuture { src, pos }
    }

    /// Create a copy-too-far-back error.
    pub fn copy_too_far_back(src: i64, oldest: i64) -> Self {
        Self::CopyTooFarBack { src, oldest }
    }

    /// Create a copy-too-long error.
    pub fn copy_too_long(length: i64, max: usize) -> Self {
        Self::CopyTooLong { length, max }
    }

    /// Create a literal-too-long error.
    pub fn literal_too_long(length: i64, max: usize) -> Self {
        Self::LiteralTooLong { length, max }
    }

    /// Create a checksum mismatch error.
    pub fn checksum_mismatch(expected: impl Into<Vec<u8>>, computed: impl Into<Vec<u8>>) -> Self {
        Self::ChecksumMismatch {
            expected: expected.into(),
            computed: computed.into(),
        }
    }

    /// Create an unexpected EOF error.
    pub fn unexpected_eof(what: &'static str) -> Self {
        Self::UnexpectedEof { what }
    }

    /// Wrap an error reported by the mirror decompressor.
    pub fn self_check(inner: OxihistError) -> Self {
        Self::SelfCheck(Box::new(inner))
    }
}

impl From<OxihistError> for io::Error {
    fn from(err: OxihistError) -> Self {
        match err {
            OxihistError::Io(e) => e,
            OxihistError::UnexpectedEof { .. } => {
                io::Error::new(io::ErrorKind::UnexpectedEof, err)
            }
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
