//! # native-compress
//!
//! The CityHash128-checksummed compression envelope wrapped around Native
//! blocks: `[16-byte hash][method][compressed_size][uncompressed_size][payload]`,
//! repeated once per compressed block.
//!
//! - [`frame`] — the frame format itself: [`frame::CompressionMethod`],
//!   [`frame::Frame`], hashing, and per-method compress/decompress.
//! - [`envelope`] — a seekable, fully-decompressed view over a framed
//!   stream ([`envelope::Envelope`]) and a block-at-a-time writer
//!   ([`envelope::EnvelopeWriter`]).
//! - [`error`] — the [`error::CompressError`] taxonomy.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod envelope;
pub mod error;
pub mod frame;

pub use envelope::{Envelope, EnvelopeWriter};
pub use error::CompressError;
pub use frame::{
    cityhash128_wire, compress_block, decompress_block, read_frame, write_frame,
    CompressionMethod, Frame,
};
