//! Reading a Native block stream, with optional gzip transport sniffing and
//! compression-envelope decoding.

use std::io::{Cursor, Read};

use native_compress::{decompress_block, read_frame};
use native_protocol::{read_block, skip_block, Block};
use native_types::{ColumnSchema, VecTable};

use crate::config::Config;
use crate::error::{NativeError, Result};
use crate::sniff::sniff;

enum Source<'a> {
    Blocks(Box<dyn Read + 'a>),
    Decompressed(Cursor<Vec<u8>>),
}

/// Reads a Native block stream from an underlying [`Read`] source.
///
/// The source is sniffed for a gzip wrapper on construction regardless of
/// [`Config::make_compress`], since the transport-level gzip layer and the
/// Native compression envelope are independent of each other (spec.md §6).
/// When [`Config::make_compress`] is set, every compressed frame is decoded
/// up front into one in-memory buffer, exactly as [`native_compress::Envelope`]
/// does; this reader additionally offers [`NativeReader::new_strict`] to
/// surface a checksum mismatch as [`NativeError::HashMismatch`] instead of
/// silently accepting a tampered frame.
pub struct NativeReader<'a> {
    source: Source<'a>,
}

impl<'a> NativeReader<'a> {
    /// Open `reader` for reading, trusting frame checksums (the default:
    /// hash mismatches are not fatal).
    pub fn new<R: Read + 'a>(reader: R, config: Config) -> Result<Self> {
        Self::open(reader, config, false)
    }

    /// Open `reader` for reading, treating any checksum mismatch in a
    /// compressed frame as a fatal [`NativeError::HashMismatch`].
    pub fn new_strict<R: Read + 'a>(reader: R, config: Config) -> Result<Self> {
        Self::open(reader, config, true)
    }

    fn open<R: Read + 'a>(reader: R, config: Config, strict: bool) -> Result<Self> {
        config.validate()?;
        let sniffed = sniff(reader)?;

        let source = if config.make_compress() {
            let mut boxed: Box<dyn Read + 'a> = Box::new(sniffed);
            let buffer = Self::decompress_all(boxed.as_mut(), strict)?;
            Source::Decompressed(Cursor::new(buffer))
        } else {
            Source::Blocks(Box::new(sniffed))
        };

        Ok(Self { source })
    }

    fn decompress_all(reader: &mut dyn Read, strict: bool) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        while let Some(frame) = read_frame(reader)? {
            if strict && !frame.is_valid() {
                return Err(NativeError::HashMismatch);
            }
            buffer.extend_from_slice(&decompress_block(&frame)?);
        }
        Ok(buffer)
    }

    fn reader_mut(&mut self) -> &mut dyn Read {
        match &mut self.source {
            Source::Blocks(reader) => reader.as_mut(),
            Source::Decompressed(cursor) => cursor,
        }
    }

    /// Read the next block, or `None` at a clean end of stream.
    pub fn read_block(&mut self) -> Result<Option<Block>> {
        Ok(read_block(self.reader_mut())?)
    }

    /// Advance past the next block without materializing its values.
    pub fn skip_block(&mut self) -> Result<bool> {
        Ok(skip_block(self.reader_mut())?)
    }

    /// Read every remaining block and concatenate them into one [`VecTable`].
    ///
    /// The column schema is taken from the first block seen; a stream with
    /// no blocks at all yields an empty table.
    pub fn read_table(&mut self) -> Result<VecTable> {
        let mut schema: Option<Vec<ColumnSchema>> = None;
        let mut columns: Vec<Vec<native_protocol::Value>> = Vec::new();

        while let Some(block) = self.read_block()? {
            if schema.is_none() {
                schema = Some(
                    block
                        .columns
                        .iter()
                        .map(|column| ColumnSchema::new(column.name.clone(), column.type_name.clone()))
                        .collect(),
                );
                columns = vec![Vec::new(); block.num_columns()];
            }
            for (index, column) in block.columns.into_iter().enumerate() {
                columns[index].extend(column.values);
            }
        }

        Ok(VecTable::new(schema.unwrap_or_default(), columns))
    }
}

#[cfg(test)]
mod tests {
    use native_protocol::{write_block, BlockColumn, Value};

    use super::*;

    fn two_block_stream() -> Vec<u8> {
        let block_a = Block {
            num_rows: 2,
            columns: vec![BlockColumn {
                name: "id".to_owned(),
                type_name: "UInt32".to_owned(),
                values: vec![Value::UInt32(1), Value::UInt32(2)],
            }],
        };
        let block_b = Block {
            num_rows: 1,
            columns: vec![BlockColumn {
                name: "id".to_owned(),
                type_name: "UInt32".to_owned(),
                values: vec![Value::UInt32(3)],
            }],
        };
        let mut buf = Vec::new();
        write_block(&block_a, &mut buf).unwrap();
        write_block(&block_b, &mut buf).unwrap();
        buf
    }

    #[test]
    fn reads_blocks_one_at_a_time() {
        let buf = two_block_stream();
        let mut reader = NativeReader::new(buf.as_slice(), Config::new()).unwrap();
        assert_eq!(reader.read_block().unwrap().unwrap().num_rows, 2);
        assert_eq!(reader.read_block().unwrap().unwrap().num_rows, 1);
        assert!(reader.read_block().unwrap().is_none());
    }

    #[test]
    fn read_table_concatenates_all_blocks() {
        let buf = two_block_stream();
        let mut reader = NativeReader::new(buf.as_slice(), Config::new()).unwrap();
        let table = reader.read_table().unwrap();
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn empty_stream_yields_empty_table() {
        let buf: Vec<u8> = Vec::new();
        let mut reader = NativeReader::new(buf.as_slice(), Config::new()).unwrap();
        let table = reader.read_table().unwrap();
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn strict_mode_rejects_tampered_frame() {
        use native_compress::{compress_block, write_frame, CompressionMethod};

        let mut frame = compress_block(b"not really a block", CompressionMethod::None, 0).unwrap();
        frame.payload[0] ^= 0xff;
        let mut buf = Vec::new();
        write_frame(&frame, &mut buf).unwrap();

        let config = Config::new().with_make_compress(true);
        let err = NativeReader::new_strict(buf.as_slice(), config).unwrap_err();
        assert!(matches!(err, NativeError::HashMismatch));
    }

    #[test]
    fn non_strict_mode_tolerates_tampered_frame() {
        use native_compress::{compress_block, write_frame, CompressionMethod};

        let mut frame = compress_block(b"not really a block", CompressionMethod::None, 0).unwrap();
        frame.payload[0] ^= 0xff;
        let mut buf = Vec::new();
        write_frame(&frame, &mut buf).unwrap();

        let config = Config::new().with_make_compress(true);
        assert!(NativeReader::new(buf.as_slice(), config).is_ok());
    }
}
