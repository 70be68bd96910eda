//! Transport-level gzip detection: a Native stream is sometimes wrapped in a
//! plain gzip envelope by the caller rather than the Native compression
//! frame format, so the first two bytes are sniffed before any block is read.

use std::io::{self, BufRead, BufReader, Read};

use flate2::read::GzDecoder;

/// Magic bytes every gzip member begins with.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Either the original reader, unmodified, or a [`GzDecoder`] wrapped around
/// it once its magic bytes are recognized.
///
/// Constructed by [`sniff`]; callers read from it exactly like any other
/// `Read` implementation without needing to branch on the transport.
pub enum Sniffed<R: BufRead> {
    /// No gzip magic bytes found; read straight through.
    Plain(R),
    /// Magic bytes found; transparently inflated.
    Gzip(GzDecoder<R>),
}

impl<R: BufRead> Read for Sniffed<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(reader) => reader.read(buf),
            Self::Gzip(decoder) => decoder.read(buf),
        }
    }
}

/// Peek the first two bytes of `reader` and wrap it in a [`GzDecoder`] if
/// they match the gzip magic number, otherwise pass it through untouched.
///
/// `reader` must already be (or be wrapped into) a [`BufRead`] so the peeked
/// bytes aren't consumed from the underlying source.
pub fn sniff<R: Read>(reader: R) -> io::Result<Sniffed<BufReader<R>>> {
    let mut buffered = BufReader::new(reader);
    let prefix = buffered.fill_buf()?;
    if prefix.starts_with(&GZIP_MAGIC) {
        tracing::debug!("detected gzip-wrapped native stream");
        Ok(Sniffed::Gzip(GzDecoder::new(buffered)))
    } else {
        Ok(Sniffed::Plain(buffered))
    }
}
