//! Writing a [`Table`] out as a Native block stream, optionally wrapped in
//! the compression envelope.

use std::io::Write;

use native_compress::EnvelopeWriter;
use native_protocol::write_block;
use native_types::Table;

use crate::config::Config;
use crate::error::Result;
use crate::streamer::Streamer;

enum Sink<W: Write> {
    Plain(W),
    Compressed(EnvelopeWriter<W>),
}

/// Writes [`Table`]s to an underlying sink as a sequence of Native blocks.
///
/// When [`Config::make_compress`] is set, every block is serialized into a
/// buffer first and handed to an [`EnvelopeWriter`] as one compressed frame;
/// otherwise blocks are written to `writer` directly.
pub struct NativeWriter<W: Write> {
    sink: Sink<W>,
    config: Config,
}

impl<W: Write> NativeWriter<W> {
    /// Build a writer over `writer` using `config`.
    pub fn new(writer: W, config: Config) -> Result<Self> {
        config.validate()?;
        let sink = if config.make_compress() {
            Sink::Compressed(EnvelopeWriter::new(
                writer,
                config.compress_method(),
                config.compress_level(),
            ))
        } else {
            Sink::Plain(writer)
        };
        Ok(Self { sink, config })
    }

    /// Write every row of `table`, chunked into blocks of at most
    /// [`Config::block_rows`] rows.
    pub fn write_table(&mut self, table: &dyn Table) -> Result<()> {
        for block in Streamer::new(table, self.config.block_rows()) {
            match &mut self.sink {
                Sink::Plain(writer) => write_block(&block, writer)?,
                Sink::Compressed(envelope) => {
                    let mut buf = Vec::new();
                    write_block(&block, &mut buf)?;
                    envelope.write_block(&buf)?;
                }
            }
        }
        tracing::debug!(rows = table.row_count(), "wrote native table");
        Ok(())
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        match &mut self.sink {
            Sink::Plain(writer) => writer.flush()?,
            Sink::Compressed(envelope) => envelope.flush()?,
        }
        Ok(())
    }

    /// Consume the writer and return the underlying sink.
    #[must_use]
    pub fn into_inner(self) -> W {
        match self.sink {
            Sink::Plain(writer) => writer,
            Sink::Compressed(envelope) => envelope.into_inner(),
        }
    }
}
