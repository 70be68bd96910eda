//! The tabular front-end boundary: a small trait the block engine's callers
//! implement over whatever frame type they already have, plus an in-memory
//! reference implementation for testing and simple producers.

use native_protocol::Value;

use crate::schema::ColumnSchema;

/// A read-only view over tabular data: a fixed set of named, typed columns
/// sharing one row count.
///
/// This is the boundary the Native writer and the type-inference pass
/// compile against; a caller backed by a `DataFrame`-like type of their own
/// only needs to implement these three methods.
pub trait Table {
    /// The table's columns, in wire order.
    fn columns(&self) -> &[ColumnSchema];

    /// Number of rows shared by every column.
    fn row_count(&self) -> usize;

    /// The values of the column at `index`, `row_count()` long.
    fn column_values(&self, index: usize) -> &[Value];
}

/// An owned, in-memory [`Table`] backed by `Vec<Vec<Value>>`.
///
/// Serves as the reference implementation so the crate is independently
/// testable without an external DataFrame library, and as a convenient
/// sink for callers who already have their data as plain `Value`s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VecTable {
    columns: Vec<ColumnSchema>,
    rows: usize,
    values: Vec<Vec<Value>>,
}

impl VecTable {
    /// Build a table from parallel column schemas and value vectors.
    ///
    /// # Panics
    ///
    /// Panics if `columns.len() != values.len()`, or if any column's values
    /// don't all share the same length.
    #[must_use]
    pub fn new(columns: Vec<ColumnSchema>, values: Vec<Vec<Value>>) -> Self {
        assert_eq!(
            columns.len(),
            values.len(),
            "column schema count must match value column count"
        );
        let rows = values.first().map_or(0, Vec::len);
        assert!(
            values.iter().all(|col| col.len() == rows),
            "every column must have the same row count"
        );
        Self {
            columns,
            rows,
            values,
        }
    }

    /// An empty table with no columns and no rows.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

impl Table for VecTable {
    fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    fn row_count(&self) -> usize {
        self.rows
    }

    fn column_values(&self, index: usize) -> &[Value] {
        &self.values[index]
    }
}
