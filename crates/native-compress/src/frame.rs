//! The CityHash128-checksummed compression frame: method byte, compressed
//! and uncompressed sizes, payload, and the hash that covers all three.

use std::io::{Read, Write};

use crate::error::CompressError;

/// Compression codecs recognized on the wire.
///
/// Only [`CompressionMethod::None`], [`CompressionMethod::Lz4`], and
/// [`CompressionMethod::Zstd`] can be compressed or decompressed here; the
/// remaining variants are recognized so a frame header can still be parsed
/// and reported on, but [`compress_block`]/[`decompress_block`] reject them
/// with [`CompressError::MethodNotSupported`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CompressionMethod {
    /// No compression; payload is the raw block bytes.
    None = 0x02,
    /// LZ4 block compression.
    Lz4 = 0x82,
    /// Zstandard compression.
    Zstd = 0x90,
    /// Multiple codecs chained (ClickHouse `CODEC(...)` composition).
    Multiple = 0x91,
    /// Delta encoding.
    Delta = 0x92,
    /// Narrow integer encoding (T64).
    T64 = 0x93,
    /// Double-delta encoding.
    DoubleDelta = 0x94,
    /// Gorilla floating-point encoding.
    Gorilla = 0x95,
    /// AES-128-GCM-SIV encryption.
    Aes128GcmSiv = 0x96,
    /// AES-256-GCM-SIV encryption.
    Aes256GcmSiv = 0x97,
    /// Floating-point compression (FPC).
    Fpc = 0x98,
    /// Deflate via Intel QPL.
    DeflateQpl = 0x99,
    /// Greatest-common-divisor encoding.
    Gcd = 0x9a,
    /// Zstandard via Intel QPL.
    ZstdQpl = 0x9b,
    /// SZ3 scientific-data compression.
    Sz3 = 0x9c,
}

impl CompressionMethod {
    /// The wire byte for this method.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for CompressionMethod {
    type Error = CompressError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0x02 => Self::None,
            0x82 => Self::Lz4,
            0x90 => Self::Zstd,
            0x91 => Self::Multiple,
            0x92 => Self::Delta,
            0x93 => Self::T64,
            0x94 => Self::DoubleDelta,
            0x95 => Self::Gorilla,
            0x96 => Self::Aes128GcmSiv,
            0x97 => Self::Aes256GcmSiv,
            0x98 => Self::Fpc,
            0x99 => Self::DeflateQpl,
            0x9a => Self::Gcd,
            0x9b => Self::ZstdQpl,
            0x9c => Self::Sz3,
            other => {
                return Err(CompressError::CodecFailure(format!(
                    "unrecognized compression method byte 0x{other:02x}"
                )))
            }
        })
    }
}

/// Number of bytes in the method + compressed_size + uncompressed_size
/// prefix that precedes the payload and is itself covered by the hash.
const PREFIX_LEN: usize = 1 + 4 + 4;

/// Number of bytes in the leading CityHash128 checksum.
const HASH_LEN: usize = 16;

/// CityHash128 of `data`, reordered into ClickHouse's on-wire byte order:
/// the big-endian 16-byte hash with each 8-byte half reversed.
///
/// This is the same "reverse each half" idiom `native-protocol` uses for
/// UUID encoding, applied here to the hash output instead of a literal
/// UUID value.
#[must_use]
pub fn cityhash128_wire(data: &[u8]) -> [u8; HASH_LEN] {
    let value = clickhouse_rs_cityhash_sys::city_hash_128(data);
    let mut be = [0u8; HASH_LEN];
    be[0..8].copy_from_slice(&value.hi.to_be_bytes());
    be[8..16].copy_from_slice(&value.lo.to_be_bytes());
    let mut wire = [0u8; HASH_LEN];
    wire[0..8].copy_from_slice(&be[0..8]);
    wire[0..8].reverse();
    wire[8..16].copy_from_slice(&be[8..16]);
    wire[8..16].reverse();
    wire
}

/// Hash of the method byte, sizes, and compressed payload, in the exact
/// layout that's written to the wire after the hash itself.
fn frame_hash(method: CompressionMethod, compressed_size: u32, uncompressed_size: u32, payload: &[u8]) -> [u8; HASH_LEN] {
    let mut buf = Vec::with_capacity(PREFIX_LEN + payload.len());
    buf.push(method.code());
    buf.extend_from_slice(&compressed_size.to_le_bytes());
    buf.extend_from_slice(&uncompressed_size.to_le_bytes());
    buf.extend_from_slice(payload);
    cityhash128_wire(&buf)
}

/// One decoded compression frame: checksum, method, sizes, and the
/// (still-compressed) payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// CityHash128 checksum read from (or computed for) the wire.
    pub hash: [u8; HASH_LEN],
    /// Compression method the payload was encoded with.
    pub method: CompressionMethod,
    /// `9 + payload.len()`: the method byte, two u32 sizes, and the payload.
    pub compressed_size: u32,
    /// Size of the block before compression.
    pub uncompressed_size: u32,
    /// Compressed bytes, exactly `compressed_size - 9` long.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Recompute the checksum over this frame's fields and compare it to
    /// [`Frame::hash`]. `false` means the frame is corrupt or was tampered
    /// with; whether that's fatal is left to the caller (see the
    /// strict-validation mode in `native-io`).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        frame_hash(self.method, self.compressed_size, self.uncompressed_size, &self.payload) == self.hash
    }

    /// Total size of this frame once serialized: hash + prefix + payload.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        HASH_LEN + PREFIX_LEN + self.payload.len()
    }
}

/// Compress `data` with `method` and build the checksummed frame around it.
///
/// `level` is forwarded to ZSTD (`0` selects its library default) and
/// ignored for `None`/`Lz4`, matching the reference codec's signature.
pub fn compress_block(data: &[u8], method: CompressionMethod, level: i32) -> Result<Frame, CompressError> {
    let payload = match method {
        CompressionMethod::None => data.to_vec(),
        CompressionMethod::Lz4 => lz4_flex::block::compress(data),
        CompressionMethod::Zstd => zstd::bulk::compress(data, level)
            .map_err(|err| CompressError::CodecFailure(err.to_string()))?,
        other => return Err(CompressError::MethodNotSupported(other)),
    };

    let uncompressed_size = data.len() as u32;
    let compressed_size = (PREFIX_LEN + payload.len()) as u32;
    let hash = frame_hash(method, compressed_size, uncompressed_size, &payload);

    tracing::trace!(?method, uncompressed_size, compressed_size, "compressed block");

    Ok(Frame {
        hash,
        method,
        compressed_size,
        uncompressed_size,
        payload,
    })
}

/// Decompress a [`Frame`] back to its original bytes.
///
/// LZ4 first tries the size-hinted fast path and falls back to
/// size-prepended decompression if the hint doesn't match, mirroring the
/// reference implementation's `LZ4BlockError` fallback.
pub fn decompress_block(frame: &Frame) -> Result<Vec<u8>, CompressError> {
    match frame.method {
        CompressionMethod::None => Ok(frame.payload.clone()),
        CompressionMethod::Lz4 => {
            lz4_flex::block::decompress(&frame.payload, frame.uncompressed_size as usize)
                .or_else(|_| lz4_flex::block::decompress_size_prepended(&frame.payload))
                .map_err(|err| CompressError::CodecFailure(err.to_string()))
        }
        CompressionMethod::Zstd => {
            zstd::bulk::decompress(&frame.payload, frame.uncompressed_size as usize)
                .map_err(|err| CompressError::CodecFailure(err.to_string()))
        }
        other => Err(CompressError::MethodNotSupported(other)),
    }
}

/// Read one frame from `reader`.
///
/// Returns `Ok(None)` if the stream ended cleanly before any header bytes
/// were available (end of the compressed stream); any EOF once the header
/// has started is a [`CompressError::TruncatedHeader`] or
/// [`CompressError::TruncatedPayload`].
pub fn read_frame(reader: &mut dyn Read) -> Result<Option<Frame>, CompressError> {
    let mut hash = [0u8; HASH_LEN];
    let first = read_partial(reader, &mut hash)?;
    if first == 0 {
        return Ok(None);
    }
    if first != HASH_LEN {
        return Err(CompressError::TruncatedHeader {
            expected: HASH_LEN,
            actual: first,
        });
    }

    let mut prefix = [0u8; PREFIX_LEN];
    reader
        .read_exact(&mut prefix)
        .map_err(|_| CompressError::TruncatedHeader {
            expected: HASH_LEN + PREFIX_LEN,
            actual: HASH_LEN,
        })?;

    let method = CompressionMethod::try_from(prefix[0])?;
    let compressed_size = u32::from_le_bytes([prefix[1], prefix[2], prefix[3], prefix[4]]);
    let uncompressed_size = u32::from_le_bytes([prefix[5], prefix[6], prefix[7], prefix[8]]);

    let payload_len = (compressed_size as usize)
        .checked_sub(PREFIX_LEN)
        .ok_or(CompressError::InvalidCompressedSize(compressed_size))?;

    let mut payload = vec![0u8; payload_len];
    reader
        .read_exact(&mut payload)
        .map_err(|_| CompressError::TruncatedPayload {
            expected: payload_len,
            actual: 0,
        })?;

    Ok(Some(Frame {
        hash,
        method,
        compressed_size,
        uncompressed_size,
        payload,
    }))
}

/// Like `read`, but treats a zero-byte result as `Ok(0)` instead of an
/// error, so callers can tell "clean EOF" apart from "partial header".
fn read_partial(reader: &mut dyn Read, buf: &mut [u8]) -> Result<usize, CompressError> {
    let mut total = 0;
    while total < buf.len() {
        let n = reader.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}

/// Write one frame to `writer` as `[hash][method][compressed_size][uncompressed_size][payload]`.
pub fn write_frame(frame: &Frame, writer: &mut dyn Write) -> Result<(), CompressError> {
    writer.write_all(&frame.hash)?;
    writer.write_all(&[frame.method.code()])?;
    writer.write_all(&frame.compressed_size.to_le_bytes())?;
    writer.write_all(&frame.uncompressed_size.to_le_bytes())?;
    writer.write_all(&frame.payload)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_roundtrips_through_code() {
        for method in [
            CompressionMethod::None,
            CompressionMethod::Lz4,
            CompressionMethod::Zstd,
            CompressionMethod::Sz3,
        ] {
            assert_eq!(CompressionMethod::try_from(method.code()).unwrap(), method);
        }
    }

    #[test]
    fn unrecognized_method_byte_errors() {
        assert!(CompressionMethod::try_from(0x00).is_err());
    }

    #[test]
    fn none_roundtrip_is_valid_and_identity() {
        let data = b"hello native world".to_vec();
        let frame = compress_block(&data, CompressionMethod::None, 0).unwrap();
        assert!(frame.is_valid());
        assert_eq!(decompress_block(&frame).unwrap(), data);
    }

    #[test]
    fn lz4_roundtrip() {
        let data = vec![42u8; 4096];
        let frame = compress_block(&data, CompressionMethod::Lz4, 0).unwrap();
        assert!(frame.is_valid());
        assert_eq!(decompress_block(&frame).unwrap(), data);
    }

    #[test]
    fn zstd_roundtrip() {
        let data: Vec<u8> = (0..10_000u32).flat_map(u32::to_le_bytes).collect();
        let frame = compress_block(&data, CompressionMethod::Zstd, 3).unwrap();
        assert!(frame.is_valid());
        assert_eq!(decompress_block(&frame).unwrap(), data);
    }

    #[test]
    fn tampered_payload_is_invalid() {
        let data = b"some block payload".to_vec();
        let mut frame = compress_block(&data, CompressionMethod::None, 0).unwrap();
        frame.payload[0] ^= 0xff;
        assert!(!frame.is_valid());
    }

    #[test]
    fn wire_roundtrip() {
        let data = vec![7u8; 512];
        let frame = compress_block(&data, CompressionMethod::Lz4, 0).unwrap();
        let mut buf = Vec::new();
        write_frame(&frame, &mut buf).unwrap();

        let mut cursor = buf.as_slice();
        let decoded = read_frame(&mut cursor).unwrap().unwrap();
        assert_eq!(decoded, frame);
        assert!(cursor.is_empty());
    }

    #[test]
    fn clean_eof_between_frames() {
        let mut cursor: &[u8] = &[];
        assert_eq!(read_frame(&mut cursor).unwrap(), None);
    }

    #[test]
    fn truncated_header_errors() {
        let bytes = [0u8; 10];
        let mut cursor = bytes.as_slice();
        let err = read_frame(&mut cursor).unwrap_err();
        assert!(matches!(err, CompressError::TruncatedHeader { .. }));
    }

    #[test]
    fn method_not_supported_for_unimplemented_codec() {
        let err = compress_block(b"x", CompressionMethod::Gorilla, 0).unwrap_err();
        assert!(matches!(err, CompressError::MethodNotSupported(CompressionMethod::Gorilla)));
    }
}
