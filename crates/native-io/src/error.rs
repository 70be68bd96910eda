//! The top-level error type aggregating every lower crate's error.

use thiserror::Error;

use native_compress::CompressError;
use native_protocol::ProtocolError;
use native_types::TypeError;

/// Errors surfaced by the Native reader/writer driver.
///
/// Wraps each lower crate's error type behind a single `From` conversion so
/// callers can match on one top-level enum instead of three.
#[derive(Debug, Error)]
pub enum NativeError {
    /// A Native block or column failed to decode/encode.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The compression envelope failed to frame, compress, or decompress.
    #[error("compression error: {0}")]
    Compress(#[from] CompressError),

    /// Type inference could not derive a Native type descriptor.
    #[error("type inference error: {0}")]
    Type(#[from] TypeError),

    /// A configuration value was out of its documented range.
    #[error("configuration error: {0}")]
    Config(String),

    /// A compressed frame's checksum did not match under strict validation.
    #[error("hash mismatch in compressed frame (strict mode)")]
    HashMismatch,

    /// Propagated I/O failure from the underlying reader/writer.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for `native-io` operations.
pub type Result<T> = std::result::Result<T, NativeError>;
