//! The `ColumnCodec` trait each scalar and composite type implements.

use std::io::{Read, Write};

use crate::descriptor::TypeDescriptor;
use crate::error::ProtocolError;
use crate::value::Value;

/// Column-level read/write/skip behaviour for one [`TypeDescriptor`] variant.
///
/// A block's column payload is always `num_rows` consecutive values (or, for
/// composites, a structured encoding of `num_rows` logical values); every
/// codec operates in terms of that row count rather than a byte length, since
/// the wire format carries no explicit column byte-length prefix.
pub trait ColumnCodec {
    /// Read `num_rows` values from `reader`.
    fn read_column(
        &self,
        reader: &mut dyn Read,
        num_rows: u64,
    ) -> Result<Vec<Value>, ProtocolError>;

    /// Write `values` (expected to number exactly `num_rows` at the block
    /// level, though individual codecs don't enforce that themselves) to
    /// `writer`.
    fn write_column(&self, writer: &mut dyn Write, values: &[Value]) -> Result<(), ProtocolError>;

    /// Advance `reader` past `num_rows` values without materializing them.
    fn skip_column(&self, reader: &mut dyn Read, num_rows: u64) -> Result<(), ProtocolError>;
}

/// Build the [`ColumnCodec`] implementation for a parsed [`TypeDescriptor`].
///
/// This is the single dispatch point that turns a parsed type descriptor
/// (produced by [`TypeDescriptor::parse`]) into executable read/write/skip
/// behaviour. Scalar variants dispatch into [`crate::scalar`]; `Array`,
/// `Nullable`, and `LowCardinality` dispatch into [`crate::composite`],
/// which recurses back into this function for their inner type.
pub fn codec_for(descriptor: &TypeDescriptor) -> Result<Box<dyn ColumnCodec>, ProtocolError> {
    match descriptor {
        TypeDescriptor::Array(inner) => crate::composite::array_codec(inner),
        TypeDescriptor::Nullable(inner) => crate::composite::nullable_codec(inner),
        TypeDescriptor::LowCardinality(inner) => crate::composite::low_cardinality_codec(inner),
        other => crate::scalar::scalar_codec_for(other),
    }
}
