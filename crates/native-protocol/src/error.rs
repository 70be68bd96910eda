//! Protocol-level error types.

use thiserror::Error;

/// Errors raised while decoding or encoding the Native wire format.
///
/// Variants are grouped per the taxonomy used throughout the codec: format
/// errors (malformed bytes), domain errors (a value doesn't fit its type),
/// and unsupported-operation errors (a recognized but unimplemented case).
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A VarInt did not terminate within 10 bytes, or the stream ended mid-value.
    #[error("invalid VarInt")]
    InvalidVarInt,

    /// The stream ended in the middle of a block (after the header was read).
    #[error("truncated block: expected {expected} more bytes, found {actual}")]
    TruncatedBlock {
        /// Bytes still expected.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// A type descriptor string could not be parsed.
    #[error("invalid type descriptor: {0}")]
    InvalidTypeDescriptor(String),

    /// A type descriptor named a type this codec doesn't recognize.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// An `Enum8`/`Enum16` descriptor's `name = code` list could not be parsed.
    #[error("invalid enum descriptor: {0}")]
    InvalidEnumDescriptor(String),

    /// `Decimal` precision outside `[1, 76]` or `DateTime64` precision outside `[1, 8]`.
    #[error("precision out of range: {0}")]
    PrecisionOutOfRange(String),

    /// A value does not fit the range of its declared type.
    #[error("value out of range for {type_name}: {detail}")]
    ValueOutOfRange {
        /// The declared Native type.
        type_name: &'static str,
        /// Human-readable detail.
        detail: String,
    },

    /// A value's Rust representation doesn't match what the codec expects.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected variant/type name.
        expected: &'static str,
        /// Actual variant/type name found.
        actual: String,
    },

    /// A string value was not valid UTF-8 or otherwise failed to encode.
    #[error("string encoding error: {0}")]
    StringEncoding(String),

    /// An interval descriptor named a unit this codec doesn't recognize.
    #[error("unknown interval unit: {0}")]
    UnknownIntervalUnit(String),

    /// Writing `LowCardinality` was attempted; it is read-only by design.
    #[error("writing LowCardinality is not supported")]
    LowCardinalityWriteUnsupported,

    /// A Non-goal composite/parametric type was named in a descriptor.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// Propagated I/O failure from the underlying reader/writer.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
