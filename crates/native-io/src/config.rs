//! Reader/writer configuration: row chunking and the compression envelope.

use native_compress::CompressionMethod;

use crate::error::{NativeError, Result};

/// Upper bound on [`Config::block_rows`], matching the largest block size the
/// reference implementation ever produced.
pub const MAX_BLOCK_ROWS: u64 = 1_048_576;

/// Default row count per block, chosen to match the reference implementation's
/// default chunk size.
pub const DEFAULT_BLOCK_ROWS: u64 = 65_400;

/// Behaviour shared by [`crate::reader::NativeReader`] and
/// [`crate::writer::NativeWriter`]: how many rows to pack per block, and
/// whether/how to compress the stream.
///
/// Built with [`Config::new`] or [`Config::default`] and customized through
/// chainable setters.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    block_rows: u64,
    make_compress: bool,
    compress_method: CompressionMethod,
    compress_level: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            block_rows: DEFAULT_BLOCK_ROWS,
            make_compress: false,
            compress_method: CompressionMethod::None,
            compress_level: 0,
        }
    }
}

impl Config {
    /// A config with every field at its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows written per block. Must be in `1..=MAX_BLOCK_ROWS`.
    #[must_use]
    pub fn block_rows(&self) -> u64 {
        self.block_rows
    }

    /// Set the rows written per block.
    #[must_use]
    pub fn with_block_rows(mut self, block_rows: u64) -> Self {
        self.block_rows = block_rows;
        self
    }

    /// Whether the writer frames blocks through a compression envelope.
    #[must_use]
    pub fn make_compress(&self) -> bool {
        self.make_compress
    }

    /// Enable or disable the compression envelope on write.
    #[must_use]
    pub fn with_make_compress(mut self, make_compress: bool) -> Self {
        self.make_compress = make_compress;
        self
    }

    /// The compression method used when [`Config::make_compress`] is set.
    #[must_use]
    pub fn compress_method(&self) -> CompressionMethod {
        self.compress_method
    }

    /// Set the compression method used when writing with compression enabled.
    ///
    /// Only [`CompressionMethod::None`], [`CompressionMethod::Lz4`], and
    /// [`CompressionMethod::Zstd`] can actually be produced; validated by
    /// [`Config::validate`].
    #[must_use]
    pub fn with_compress_method(mut self, method: CompressionMethod) -> Self {
        self.compress_method = method;
        self
    }

    /// Compression level forwarded to the chosen codec (ignored by methods
    /// that don't use one).
    #[must_use]
    pub fn compress_level(&self) -> i32 {
        self.compress_level
    }

    /// Set the compression level forwarded to the chosen codec.
    #[must_use]
    pub fn with_compress_level(mut self, level: i32) -> Self {
        self.compress_level = level;
        self
    }

    /// Check that every field holds a value the reader/writer can act on.
    pub fn validate(&self) -> Result<()> {
        if self.block_rows == 0 || self.block_rows > MAX_BLOCK_ROWS {
            return Err(NativeError::Config(format!(
                "block_rows must be in 1..={MAX_BLOCK_ROWS}, got {}",
                self.block_rows
            )));
        }
        if self.make_compress
            && !matches!(
                self.compress_method,
                CompressionMethod::None | CompressionMethod::Lz4 | CompressionMethod::Zstd
            )
        {
            return Err(NativeError::Config(format!(
                "compress_method {:?} cannot be produced by this writer",
                self.compress_method
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn zero_block_rows_rejected() {
        let config = Config::new().with_block_rows(0);
        assert!(matches!(config.validate(), Err(NativeError::Config(_))));
    }

    #[test]
    fn block_rows_above_max_rejected() {
        let config = Config::new().with_block_rows(MAX_BLOCK_ROWS + 1);
        assert!(matches!(config.validate(), Err(NativeError::Config(_))));
    }

    #[test]
    fn unsupported_compress_method_rejected_only_when_compressing() {
        let config = Config::new().with_compress_method(CompressionMethod::Gorilla);
        config.clone().validate().unwrap();
        let config = config.with_make_compress(true);
        assert!(matches!(config.validate(), Err(NativeError::Config(_))));
    }

    #[test]
    fn builder_chain_sets_all_fields() {
        let config = Config::new()
            .with_block_rows(10)
            .with_make_compress(true)
            .with_compress_method(CompressionMethod::Zstd)
            .with_compress_level(5);
        assert_eq!(config.block_rows(), 10);
        assert!(config.make_compress());
        assert_eq!(config.compress_method(), CompressionMethod::Zstd);
        assert_eq!(config.compress_level(), 5);
    }
}
