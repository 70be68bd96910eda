//! `Array(T)`, `Nullable(T)`, and read-only `LowCardinality(T)`.

use std::io::{Read, Write};

use crate::codec::{codec_for, ColumnCodec};
use crate::descriptor::TypeDescriptor;
use crate::error::ProtocolError;
use crate::value::Value;

pub(crate) fn array_codec(inner: &TypeDescriptor) -> Result<Box<dyn ColumnCodec>, ProtocolError> {
    Ok(Box::new(ArrayCodec {
        inner: codec_for(inner)?,
    }))
}

pub(crate) fn nullable_codec(
    inner: &TypeDescriptor,
) -> Result<Box<dyn ColumnCodec>, ProtocolError> {
    Ok(Box::new(NullableCodec {
        inner: codec_for(inner)?,
    }))
}

pub(crate) fn low_cardinality_codec(
    inner: &TypeDescriptor,
) -> Result<Box<dyn ColumnCodec>, ProtocolError> {
    Ok(Box::new(LowCardinalityCodec {
        inner: codec_for(inner)?,
    }))
}

/// `Array(T)`: `num_rows` cumulative `u64` offsets, then one flat `T` column
/// of the total element count.
struct ArrayCodec {
    inner: Box<dyn ColumnCodec>,
}

impl ColumnCodec for ArrayCodec {
    fn read_column(
        &self,
        reader: &mut dyn Read,
        num_rows: u64,
    ) -> Result<Vec<Value>, ProtocolError> {
        let offsets = read_offsets(reader, num_rows)?;
        let total = *offsets.last().unwrap_or(&0);
        let mut flat = self.inner.read_column(reader, total)?;
        let mut rows = Vec::with_capacity(offsets.len());
        let mut prev = 0u64;
        // Draining front-to-back keeps this linear instead of quadratic.
        let mut remaining: std::collections::VecDeque<Value> = flat.drain(..).collect();
        for offset in offsets {
            let len = usize::try_from(offset - prev).unwrap_or(0);
            let mut row = Vec::with_capacity(len);
            for _ in 0..len {
                row.push(remaining.pop_front().ok_or(ProtocolError::TruncatedBlock {
                    expected: len,
                    actual: row.len(),
                })?);
            }
            rows.push(Value::Array(row));
            prev = offset;
        }
        Ok(rows)
    }

    fn write_column(&self, writer: &mut dyn Write, values: &[Value]) -> Result<(), ProtocolError> {
        let mut cumulative = 0u64;
        let mut offsets = Vec::with_capacity(values.len());
        let mut flat = Vec::new();
        for value in values {
            let elements = match value {
                Value::Array(elements) => elements,
                other => {
                    return Err(ProtocolError::TypeMismatch {
                        expected: "Array",
                        actual: other.type_name().to_owned(),
                    })
                }
            };
            cumulative += elements.len() as u64;
            offsets.push(cumulative);
            flat.extend(elements.iter().cloned());
        }
        for offset in &offsets {
            writer.write_all(&offset.to_le_bytes())?;
        }
        self.inner.write_column(writer, &flat)
    }

    fn skip_column(&self, reader: &mut dyn Read, num_rows: u64) -> Result<(), ProtocolError> {
        let offsets = read_offsets(reader, num_rows)?;
        let total = *offsets.last().unwrap_or(&0);
        self.inner.skip_column(reader, total)
    }
}

fn read_offsets(reader: &mut dyn Read, num_rows: u64) -> Result<Vec<u64>, ProtocolError> {
    let mut offsets = Vec::with_capacity(usize::try_from(num_rows).unwrap_or(0));
    for _ in 0..num_rows {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf).map_err(|err| {
            if err.kind() == std::io::ErrorKind::UnexpectedEof {
                ProtocolError::TruncatedBlock {
                    expected: 8,
                    actual: 0,
                }
            } else {
                ProtocolError::Io(err)
            }
        })?;
        offsets.push(u64::from_le_bytes(buf));
    }
    Ok(offsets)
}

/// `Nullable(T)`: a `num_rows`-byte null mask, then `num_rows` `T` values
/// (null slots carry `T`'s zero value on the wire).
struct NullableCodec {
    inner: Box<dyn ColumnCodec>,
}

impl ColumnCodec for NullableCodec {
    fn read_column(
        &self,
        reader: &mut dyn Read,
        num_rows: u64,
    ) -> Result<Vec<Value>, ProtocolError> {
        let mut mask = vec![0u8; usize::try_from(num_rows).unwrap_or(0)];
        reader.read_exact(&mut mask).map_err(|err| {
            if err.kind() == std::io::ErrorKind::UnexpectedEof {
                ProtocolError::TruncatedBlock {
                    expected: mask.len(),
                    actual: 0,
                }
            } else {
                ProtocolError::Io(err)
            }
        })?;
        let values = self.inner.read_column(reader, num_rows)?;
        Ok(mask
            .into_iter()
            .zip(values)
            .map(|(is_null, value)| if is_null != 0 { Value::Null } else { value })
            .collect())
    }

    fn write_column(&self, writer: &mut dyn Write, values: &[Value]) -> Result<(), ProtocolError> {
        let mask: Vec<u8> = values
            .iter()
            .map(|v| u8::from(v.is_null()))
            .collect();
        writer.write_all(&mask)?;

        let zero = zero_value_for_write(&self.inner, values);
        let materialized: Vec<Value> = values
            .iter()
            .map(|v| if v.is_null() { zero.clone() } else { v.clone() })
            .collect();
        self.inner.write_column(writer, &materialized)
    }

    fn skip_column(&self, reader: &mut dyn Read, num_rows: u64) -> Result<(), ProtocolError> {
        let mut mask = vec![0u8; usize::try_from(num_rows).unwrap_or(0)];
        reader.read_exact(&mut mask).map_err(|err| {
            if err.kind() == std::io::ErrorKind::UnexpectedEof {
                ProtocolError::TruncatedBlock {
                    expected: mask.len(),
                    actual: 0,
                }
            } else {
                ProtocolError::Io(err)
            }
        })?;
        self.inner.skip_column(reader, num_rows)
    }
}

/// Pick a representative non-null value to stand in for the inner codec's
/// "zero value" at null positions; the wire format doesn't actually care
/// what's written there, only that something of the right width is.
fn zero_value_for_write(_inner: &dyn ColumnCodec, values: &[Value]) -> Value {
    values
        .iter()
        .find(|v| !v.is_null())
        .cloned()
        .unwrap_or(Value::Null)
}

/// `LowCardinality(T)`, read-only: 16-byte header, dictionary, index vector.
///
/// Layout (see the format notes): an opaque 16-byte header (ClickHouse
/// encodes flags/key-size metadata there that this reader doesn't interpret,
/// matching the reference decoder), a `u64` dictionary size, that many `T`
/// values, a `u64` index count, then that many fixed-width index entries
/// (width chosen by the dictionary size: 1/2/4/8 bytes). Index `0` is the
/// default value; if the declared inner type is `Nullable`, index `0`
/// decodes as null instead.
struct LowCardinalityCodec {
    inner: Box<dyn ColumnCodec>,
}

const LOW_CARDINALITY_HEADER_LEN: usize = 16;

impl LowCardinalityCodec {
    /// Consume and discard the 16-byte header. The reference implementation
    /// records key-type flags there, but per the wire contract the index
    /// width is derived from `dict_size`, not from this header, so its
    /// content is never interpreted.
    fn skip_header(reader: &mut dyn Read) -> Result<(), ProtocolError> {
        let mut header = [0u8; LOW_CARDINALITY_HEADER_LEN];
        reader.read_exact(&mut header).map_err(|err| {
            if err.kind() == std::io::ErrorKind::UnexpectedEof {
                ProtocolError::TruncatedBlock {
                    expected: LOW_CARDINALITY_HEADER_LEN,
                    actual: 0,
                }
            } else {
                ProtocolError::Io(err)
            }
        })
    }
}

/// Width in bytes of each index entry, chosen by the dictionary size.
fn index_width_for_dict_size(dict_len: u64) -> usize {
    if dict_len <= (1u64 << 8) {
        1
    } else if dict_len <= (1u64 << 16) {
        2
    } else if dict_len <= (1u64 << 32) {
        4
    } else {
        // dict_len is itself a u64, so it can never exceed 2^64 - 1; the
        // 16- and 32-byte tiers the wire format reserves for larger key
        // spaces are unreachable here.
        8
    }
}

fn read_index_values(
    reader: &mut dyn Read,
    width: usize,
    count: u64,
) -> Result<Vec<u64>, ProtocolError> {
    let mut out = Vec::with_capacity(usize::try_from(count).unwrap_or(0));
    for _ in 0..count {
        let value = match width {
            1 => {
                let mut b = [0u8; 1];
                reader.read_exact(&mut b)?;
                u64::from(b[0])
            }
            2 => {
                let mut b = [0u8; 2];
                reader.read_exact(&mut b)?;
                u64::from(u16::from_le_bytes(b))
            }
            4 => {
                let mut b = [0u8; 4];
                reader.read_exact(&mut b)?;
                u64::from(u32::from_le_bytes(b))
            }
            _ => {
                let mut b = [0u8; 8];
                reader.read_exact(&mut b)?;
                u64::from_le_bytes(b)
            }
        };
        out.push(value);
    }
    Ok(out)
}

impl ColumnCodec for LowCardinalityCodec {
    fn read_column(
        &self,
        reader: &mut dyn Read,
        num_rows: u64,
    ) -> Result<Vec<Value>, ProtocolError> {
        Self::skip_header(reader)?;

        let mut dict_len_buf = [0u8; 8];
        reader.read_exact(&mut dict_len_buf)?;
        let dict_len = u64::from_le_bytes(dict_len_buf);
        let dictionary = self.inner.read_column(reader, dict_len)?;

        let mut index_len_buf = [0u8; 8];
        reader.read_exact(&mut index_len_buf)?;
        let index_len = u64::from_le_bytes(index_len_buf);
        debug_assert_eq!(index_len, num_rows, "LowCardinality index count must match row count");

        let index_width = index_width_for_dict_size(dict_len);
        let indices = read_index_values(reader, index_width, index_len)?;
        let inner_is_nullable = matches!(
            dictionary.first(),
            Some(Value::Null)
        );

        indices
            .into_iter()
            .map(|idx| {
                let idx = usize::try_from(idx).unwrap_or(usize::MAX);
                if idx == 0 && inner_is_nullable {
                    return Ok(Value::Null);
                }
                dictionary
                    .get(idx)
                    .cloned()
                    .ok_or(ProtocolError::TruncatedBlock {
                        expected: idx + 1,
                        actual: dictionary.len(),
                    })
            })
            .collect()
    }

    fn write_column(&self, _writer: &mut dyn Write, _values: &[Value]) -> Result<(), ProtocolError> {
        Err(ProtocolError::LowCardinalityWriteUnsupported)
    }

    fn skip_column(&self, reader: &mut dyn Read, num_rows: u64) -> Result<(), ProtocolError> {
        // Skipping still has to interpret the structure: the dictionary and
        // index lengths aren't implied by num_rows alone.
        let _ = self.read_column(reader, num_rows)?;
        Ok(())
    }
}
