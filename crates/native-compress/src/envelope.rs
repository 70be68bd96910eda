//! A seekable, in-memory view over a CityHash128-framed compressed stream:
//! every frame is decompressed up front into one contiguous buffer on
//! [`Envelope::open`], and writes are framed one call at a time.

use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use crate::error::CompressError;
use crate::frame::{compress_block, decompress_block, read_frame, write_frame, CompressionMethod};

/// The fully decompressed contents of a framed stream, readable and
/// seekable like any in-memory buffer.
///
/// Mirrors the reference implementation's approach of eagerly decompressing
/// every frame into one buffer on open rather than decompressing lazily
/// per-read; Native files are block-oriented and rarely large enough for
/// that to matter.
#[derive(Debug)]
pub struct Envelope {
    buffer: Cursor<Vec<u8>>,
    frame_count: usize,
    compressed_len: usize,
}

impl Envelope {
    /// Read every frame from `reader` until a clean end-of-stream and
    /// decompress them into one contiguous buffer.
    pub fn open(reader: &mut dyn Read) -> Result<Self, CompressError> {
        let mut buffer = Vec::new();
        let mut frame_count = 0;
        let mut compressed_len = 0;

        while let Some(frame) = read_frame(reader)? {
            compressed_len += frame.wire_len();
            buffer.extend_from_slice(&decompress_block(&frame)?);
            frame_count += 1;
        }

        tracing::debug!(
            frame_count,
            compressed_len,
            decompressed_len = buffer.len(),
            "opened compression envelope"
        );

        Ok(Self {
            buffer: Cursor::new(buffer),
            frame_count,
            compressed_len,
        })
    }

    /// Number of frames the stream was made of.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Total on-wire size of all frames, header bytes included.
    #[must_use]
    pub fn compressed_len(&self) -> usize {
        self.compressed_len
    }

    /// Total decompressed size.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.get_ref().len()
    }

    /// Whether the decompressed buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the envelope and return the decompressed bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer.into_inner()
    }
}

impl Read for Envelope {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.buffer.read(buf)
    }
}

impl Seek for Envelope {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.buffer.seek(pos)
    }
}

/// Writes raw blocks to an underlying sink, framing each `write_block` call
/// as its own checksummed, compressed frame.
#[derive(Debug)]
pub struct EnvelopeWriter<W> {
    writer: W,
    method: CompressionMethod,
    level: i32,
}

impl<W: Write> EnvelopeWriter<W> {
    /// Wrap `writer`, compressing every block with `method` at `level`.
    pub fn new(writer: W, method: CompressionMethod, level: i32) -> Self {
        Self {
            writer,
            method,
            level,
        }
    }

    /// Compress `data` into one frame and write it out. Returns the number
    /// of uncompressed bytes consumed, matching `std::io::Write::write`'s
    /// contract even though every byte given is always framed as a whole.
    pub fn write_block(&mut self, data: &[u8]) -> Result<usize, CompressError> {
        let frame = compress_block(data, self.method, self.level)?;
        write_frame(&frame, &mut self.writer)?;
        Ok(data.len())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Consume the writer and return the underlying sink.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_multiple_blocks() {
        let mut raw = Vec::new();
        {
            let mut writer = EnvelopeWriter::new(&mut raw, CompressionMethod::Lz4, 0);
            writer.write_block(b"first block of data").unwrap();
            writer.write_block(b"second, rather different block").unwrap();
        }

        let mut cursor = raw.as_slice();
        let mut envelope = Envelope::open(&mut cursor).unwrap();
        assert_eq!(envelope.frame_count(), 2);

        let mut out = Vec::new();
        envelope.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"first block of datasecond, rather different block");
    }

    #[test]
    fn seek_within_decompressed_buffer() {
        let mut raw = Vec::new();
        {
            let mut writer = EnvelopeWriter::new(&mut raw, CompressionMethod::None, 0);
            writer.write_block(b"0123456789").unwrap();
        }

        let mut cursor = raw.as_slice();
        let mut envelope = Envelope::open(&mut cursor).unwrap();
        envelope.seek(SeekFrom::Start(5)).unwrap();
        let mut out = Vec::new();
        envelope.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"56789");
    }

    #[test]
    fn empty_stream_is_empty_envelope() {
        let mut cursor: &[u8] = &[];
        let envelope = Envelope::open(&mut cursor).unwrap();
        assert!(envelope.is_empty());
        assert_eq!(envelope.frame_count(), 0);
    }
}
