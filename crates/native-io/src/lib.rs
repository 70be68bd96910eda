//! # native-io
//!
//! The top-level reader/writer/config driver for the ClickHouse Native
//! columnar format.
//!
//! This is the user-facing crate: it chunks a [`native_types::Table`] into
//! [`native_protocol::Block`]s and writes them out, optionally through the
//! compression envelope ([`native_compress::Envelope`]); reads them back the
//! same way; sniffs a gzip transport wrapper; and can describe a stream's
//! shape without materializing its values.
//!
//! ```no_run
//! use native_io::{Config, NativeReader, NativeWriter};
//! use native_protocol::Value;
//! use native_types::{ColumnSchema, VecTable};
//!
//! # fn run() -> native_io::error::Result<()> {
//! let table = VecTable::new(
//!     vec![ColumnSchema::new("id", "UInt32")],
//!     vec![vec![Value::UInt32(1), Value::UInt32(2)]],
//! );
//!
//! let mut buf = Vec::new();
//! let config = Config::new().with_block_rows(1_000);
//! let mut writer = NativeWriter::new(&mut buf, config.clone())?;
//! writer.write_table(&table)?;
//! writer.flush()?;
//!
//! let mut reader = NativeReader::new(buf.as_slice(), config)?;
//! let round_tripped = reader.read_table()?;
//! assert_eq!(round_tripped.row_count(), 2);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod info;
pub mod reader;
pub mod sniff;
pub mod streamer;
pub mod writer;

pub use config::Config;
pub use error::NativeError;
pub use info::{describe, ColumnInfo, DataFormat, StreamInfo};
pub use reader::NativeReader;
pub use sniff::{sniff, Sniffed};
pub use streamer::Streamer;
pub use writer::NativeWriter;

// Re-export the sibling crates' central types so callers building a `Table`
// don't need to depend on `native-protocol`/`native-types` directly for the
// common path.
pub use native_protocol::Value;
pub use native_types::{ColumnSchema, Table, VecTable};
