//! Type inference error types.

use thiserror::Error;

/// Errors that can occur while deriving a Native type descriptor from
/// tabular data.
#[derive(Debug, Error)]
pub enum TypeError {
    /// A column mixed value variants that don't share an inference rule
    /// (e.g. a `String` next to an `Int64` in the same column).
    #[error("column {column:?} mixes incompatible value kinds: {first} and {second}")]
    MixedKinds {
        /// Column name, if known.
        column: Option<String>,
        /// The first kind seen.
        first: &'static str,
        /// The conflicting kind seen later.
        second: &'static str,
    },

    /// An `Array` column's elements could not be inferred because no
    /// non-null element was ever observed and the array itself was also
    /// all-null or empty.
    #[error("cannot infer element type for column {0:?}: no non-null array elements observed")]
    EmptyArrayElements(Option<String>),

    /// A table reported a different row count for a column than its
    /// declared `row_count()`.
    #[error("column {0:?} has {1} values but the table declares {2} rows")]
    RowCountMismatch(Option<String>, usize, usize),

    /// A value kind with no defined inference rule (e.g. a bare `Interval`
    /// tick count, whose unit can't be recovered from the value alone).
    #[error("cannot infer a Native type for column {0:?}: {1} values have no inference rule")]
    UninferableKind(Option<String>, &'static str),
}
