//! Compression envelope error types.

use thiserror::Error;

use crate::frame::CompressionMethod;

/// Errors raised while framing, compressing, or decompressing the
/// CityHash128-checksummed compression envelope.
#[derive(Debug, Error)]
pub enum CompressError {
    /// The stream ended before a full 25-byte frame header could be read.
    #[error("truncated frame header: expected {expected} bytes, found {actual}")]
    TruncatedHeader {
        /// Bytes the header requires.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// The stream ended before `compressed_size - 9` payload bytes could be read.
    #[error("truncated frame payload: expected {expected} bytes, found {actual}")]
    TruncatedPayload {
        /// Bytes the payload requires.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// `compressed_size` in the header was smaller than the 9-byte method+sizes prefix.
    #[error("invalid compressed_size {0}: must be at least 9")]
    InvalidCompressedSize(u32),

    /// The recomputed CityHash128 didn't match the frame's header hash, and
    /// the caller requested strict validation.
    #[error("hash mismatch: frame checksum does not match recomputed CityHash128")]
    HashMismatch,

    /// A recognized but unimplemented compression method was used to compress/decompress.
    #[error("compression method not supported: {0:?}")]
    MethodNotSupported(CompressionMethod),

    /// The LZ4 or ZSTD backend failed to compress or decompress a payload.
    #[error("codec failure: {0}")]
    CodecFailure(String),

    /// Propagated I/O failure from the underlying reader/writer.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
