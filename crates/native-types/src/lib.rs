//! # native-types
//!
//! The tabular front-end boundary and automatic type inference for the
//! ClickHouse Native format: a [`Table`] trait any caller's data can
//! implement, an in-memory [`VecTable`] reference implementation, and
//! [`infer_schema`] to derive Native type descriptors from observed values.
//!
//! Inference is advisory — callers may always supply their own
//! [`ColumnSchema`] type descriptors instead of calling [`infer_schema`].

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod infer;
pub mod schema;
pub mod table;

pub use error::TypeError;
pub use infer::{infer_column, infer_schema};
pub use schema::ColumnSchema;
pub use table::{Table, VecTable};
