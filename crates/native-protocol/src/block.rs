//! The Native block engine: read/write/skip one `(num_columns, num_rows,
//! columns)` record, and detect clean stream termination at a block boundary.

use std::io::{Read, Write};

use crate::codec::codec_for;
use crate::descriptor::TypeDescriptor;
use crate::error::ProtocolError;
use crate::value::Value;
use crate::varint::{read_varint, write_varint};

/// One decoded column of a [`Block`]: its declared name, its textual type
/// descriptor, and its materialized values (one per block row).
#[derive(Debug, Clone, PartialEq)]
pub struct BlockColumn {
    /// Column name as it appeared on the wire.
    pub name: String,
    /// Textual type descriptor, e.g. `"Array(Nullable(String))"`.
    pub type_name: String,
    /// Decoded values, `num_rows` long.
    pub values: Vec<Value>,
}

/// A single Native block: a row count shared by every column, and the
/// columns themselves in wire order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    /// Row count shared by every column in this block.
    pub num_rows: u64,
    /// Columns in the order they appear on the wire.
    pub columns: Vec<BlockColumn>,
}

impl Block {
    /// An empty block: zero columns, zero rows.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of columns in this block.
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }
}

fn read_exact_or_truncated(reader: &mut dyn Read, buf: &mut [u8]) -> Result<(), ProtocolError> {
    reader.read_exact(buf).map_err(|err| {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            ProtocolError::TruncatedBlock {
                expected: buf.len(),
                actual: 0,
            }
        } else {
            ProtocolError::Io(err)
        }
    })
}

/// Read one `VarInt`-prefixed `String` (`len: VarInt` then `len` UTF-8 bytes).
fn read_wire_string(reader: &mut dyn Read) -> Result<String, ProtocolError> {
    let len = read_varint(reader)? as usize;
    if len == 0 {
        return Ok(String::new());
    }
    let mut buf = vec![0u8; len];
    read_exact_or_truncated(reader, &mut buf)?;
    String::from_utf8(buf).map_err(|err| ProtocolError::StringEncoding(err.to_string()))
}

fn write_wire_string(s: &str, writer: &mut dyn Write) -> Result<(), ProtocolError> {
    let bytes = s.as_bytes();
    write_varint(bytes.len() as u64, writer)?;
    if !bytes.is_empty() {
        writer.write_all(bytes)?;
    }
    Ok(())
}

/// Read one block from `reader`.
///
/// Returns `Ok(None)` if the stream ended cleanly at a block boundary (no
/// bytes at all could be read for `num_columns`) — this is the documented
/// end-of-stream signal, not an error. Any EOF once the header has started is
/// a [`ProtocolError::TruncatedBlock`].
pub fn read_block(reader: &mut dyn Read) -> Result<Option<Block>, ProtocolError> {
    let num_columns = match read_varint_or_eof(reader)? {
        None => return Ok(None),
        Some(n) => n,
    };
    let num_rows = read_varint(reader)?;

    let mut columns = Vec::with_capacity(usize::try_from(num_columns).unwrap_or(0));
    for _ in 0..num_columns {
        let name = read_wire_string(reader)?;
        let type_name = read_wire_string(reader)?;
        let descriptor = TypeDescriptor::parse(&type_name)?;
        let codec = codec_for(&descriptor)?;
        let values = codec.read_column(reader, num_rows)?;
        columns.push(BlockColumn {
            name,
            type_name,
            values,
        });
    }

    tracing::trace!(num_columns, num_rows, "read native block");

    Ok(Some(Block { num_rows, columns }))
}

/// Peek a `VarInt`, treating a zero-byte read at its very first byte as clean
/// EOF (`Ok(None)`) and any other truncation as [`ProtocolError::InvalidVarInt`]
/// (which callers should treat as a malformed stream, not a clean boundary).
fn read_varint_or_eof(reader: &mut dyn Read) -> Result<Option<u64>, ProtocolError> {
    let mut first = [0u8; 1];
    match reader.read(&mut first) {
        Ok(0) => return Ok(None),
        Ok(_) => {}
        Err(err) => return Err(ProtocolError::Io(err)),
    }
    if first[0] & 0x80 == 0 {
        return Ok(Some(u64::from(first[0])));
    }
    // Continuation bit set: finish decoding the rest of the VarInt through
    // the shared reader, seeding it with the byte already consumed.
    let mut value = u64::from(first[0] & 0x7f);
    let mut shift = 7u32;
    let mut byte = [0u8; 1];
    for i in 1..10 {
        if reader.read(&mut byte)? == 0 {
            return Err(ProtocolError::InvalidVarInt);
        }
        let b = byte[0];
        value |= u64::from(b & 0x7f) << shift;
        if b & 0x80 == 0 {
            return Ok(Some(value));
        }
        if i == 9 {
            return Err(ProtocolError::InvalidVarInt);
        }
        shift += 7;
    }
    Err(ProtocolError::InvalidVarInt)
}

/// Write one block to `writer`.
///
/// The block is assembled in an in-memory buffer first and flushed in one
/// `write_all` call, so a compression envelope downstream always sees whole
/// blocks rather than a scattering of small writes.
pub fn write_block(block: &Block, writer: &mut dyn Write) -> Result<(), ProtocolError> {
    let mut buf = Vec::new();
    write_varint(block.num_columns() as u64, &mut buf)?;
    write_varint(block.num_rows, &mut buf)?;

    for column in &block.columns {
        write_wire_string(&column.name, &mut buf)?;
        write_wire_string(&column.type_name, &mut buf)?;
        let descriptor = TypeDescriptor::parse(&column.type_name)?;
        let codec = codec_for(&descriptor)?;
        codec.write_column(&mut buf, &column.values)?;
    }

    writer.write_all(&buf)?;
    tracing::trace!(
        num_columns = block.num_columns(),
        num_rows = block.num_rows,
        bytes = buf.len(),
        "wrote native block"
    );
    Ok(())
}

/// Advance past one block without materializing its values, using each
/// column's `skip` path. Returns `Ok(false)` at a clean stream boundary.
pub fn skip_block(reader: &mut dyn Read) -> Result<bool, ProtocolError> {
    Ok(skip_block_header(reader)?.is_some())
}

/// A block's row count and per-column `(name, type descriptor)` pairs,
/// without any decoded values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// Row count shared by every column in this block.
    pub num_rows: u64,
    /// `(name, type_name)` per column, in wire order.
    pub columns: Vec<(String, String)>,
}

/// Advance past one block like [`skip_block`], but return its schema instead
/// of discarding it. Used by stream inspection to describe a Native stream's
/// columns and row count without paying the cost of materializing values.
pub fn skip_block_header(reader: &mut dyn Read) -> Result<Option<BlockHeader>, ProtocolError> {
    let num_columns = match read_varint_or_eof(reader)? {
        None => return Ok(None),
        Some(n) => n,
    };
    let num_rows = read_varint(reader)?;

    let mut columns = Vec::with_capacity(usize::try_from(num_columns).unwrap_or(0));
    for _ in 0..num_columns {
        let name = read_wire_string(reader)?;
        let type_name = read_wire_string(reader)?;
        let descriptor = TypeDescriptor::parse(&type_name)?;
        let codec = codec_for(&descriptor)?;
        codec.skip_column(reader, num_rows)?;
        columns.push((name, type_name));
    }
    Ok(Some(BlockHeader { num_rows, columns }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> Block {
        Block {
            num_rows: 3,
            columns: vec![
                BlockColumn {
                    name: "id".to_owned(),
                    type_name: "UInt32".to_owned(),
                    values: vec![Value::UInt32(1), Value::UInt32(2), Value::UInt32(3)],
                },
                BlockColumn {
                    name: "name".to_owned(),
                    type_name: "String".to_owned(),
                    values: vec![
                        Value::String("a".to_owned()),
                        Value::String("bb".to_owned()),
                        Value::String("".to_owned()),
                    ],
                },
            ],
        }
    }

    #[test]
    fn roundtrip_block() {
        let block = sample_block();
        let mut buf = Vec::new();
        write_block(&block, &mut buf).unwrap();
        let mut cursor = buf.as_slice();
        let decoded = read_block(&mut cursor).unwrap().unwrap();
        assert_eq!(decoded, block);
        assert!(cursor.is_empty());
    }

    #[test]
    fn empty_block_roundtrips() {
        let block = Block::empty();
        let mut buf = Vec::new();
        write_block(&block, &mut buf).unwrap();
        assert_eq!(buf, vec![0x00, 0x00]);
        let mut cursor = buf.as_slice();
        let decoded = read_block(&mut cursor).unwrap().unwrap();
        assert_eq!(decoded, block);
    }

    #[test]
    fn clean_eof_at_block_boundary() {
        let mut cursor: &[u8] = &[];
        assert_eq!(read_block(&mut cursor).unwrap(), None);
    }

    #[test]
    fn truncated_mid_header_is_an_error() {
        // num_columns says 1, but the stream ends before num_rows.
        let mut cursor: &[u8] = &[0x01];
        let err = read_block(&mut cursor).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidVarInt));
    }

    #[test]
    fn truncated_mid_column_payload_is_truncated_block() {
        let mut buf = Vec::new();
        write_varint(1, &mut buf).unwrap(); // num_columns
        write_varint(2, &mut buf).unwrap(); // num_rows
        write_wire_string("id", &mut buf).unwrap();
        write_wire_string("UInt32", &mut buf).unwrap();
        buf.extend_from_slice(&1u32.to_le_bytes()); // only one of two rows present

        let mut cursor = buf.as_slice();
        let err = read_block(&mut cursor).unwrap_err();
        assert!(matches!(err, ProtocolError::TruncatedBlock { .. }));
    }

    #[test]
    fn skip_advances_same_as_read() {
        let block = sample_block();
        let mut buf = Vec::new();
        write_block(&block, &mut buf).unwrap();

        let mut read_cursor = buf.as_slice();
        read_block(&mut read_cursor).unwrap();

        let mut skip_cursor = buf.as_slice();
        skip_block(&mut skip_cursor).unwrap();

        assert_eq!(read_cursor.len(), skip_cursor.len());
    }

    #[test]
    fn skip_block_header_reports_schema_without_values() {
        let block = sample_block();
        let mut buf = Vec::new();
        write_block(&block, &mut buf).unwrap();

        let mut cursor = buf.as_slice();
        let header = skip_block_header(&mut cursor).unwrap().unwrap();
        assert_eq!(header.num_rows, 3);
        assert_eq!(
            header.columns,
            vec![
                ("id".to_owned(), "UInt32".to_owned()),
                ("name".to_owned(), "String".to_owned()),
            ]
        );
        assert!(cursor.is_empty());
    }

    #[test]
    fn stream_of_two_blocks() {
        let block = sample_block();
        let mut buf = Vec::new();
        write_block(&block, &mut buf).unwrap();
        write_block(&block, &mut buf).unwrap();

        let mut cursor = buf.as_slice();
        let first = read_block(&mut cursor).unwrap().unwrap();
        let second = read_block(&mut cursor).unwrap().unwrap();
        assert_eq!(first, block);
        assert_eq!(second, block);
        assert_eq!(read_block(&mut cursor).unwrap(), None);
    }
}
