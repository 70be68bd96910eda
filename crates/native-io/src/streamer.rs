//! Row-chunking of a [`Table`] into fixed-size [`Block`]s for writing.
//!
//! Grounded in the reference implementation's `chunk_frame` dispatcher, which
//! picked a chunking strategy per input frame type (`pandas`, `polars`, ...).
//! Here there's a single [`Table`] boundary instead of a handful of
//! DataFrame libraries, so the dispatch collapses to one iterator that works
//! over any `Table` implementation.

use native_protocol::{Block, BlockColumn};
use native_types::Table;

/// Splits a [`Table`]'s rows into successive [`Block`]s of at most
/// `block_rows` rows each, in column-schema order.
///
/// An empty table yields exactly one empty block, matching the reference
/// behaviour of always sending at least one (possibly zero-row) block so a
/// reader can still observe the column schema for an empty result set.
pub struct Streamer<'a> {
    table: &'a dyn Table,
    block_rows: usize,
    next_row: usize,
    done: bool,
}

impl<'a> Streamer<'a> {
    /// Build a streamer over `table`, chunking at `block_rows` rows per block.
    #[must_use]
    pub fn new(table: &'a dyn Table, block_rows: u64) -> Self {
        Self {
            table,
            block_rows: usize::try_from(block_rows).unwrap_or(usize::MAX),
            next_row: 0,
            done: false,
        }
    }
}

impl Iterator for Streamer<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        if self.done {
            return None;
        }

        let total_rows = self.table.row_count();
        let start = self.next_row;
        let end = (start + self.block_rows).min(total_rows);
        let num_rows = (end - start) as u64;

        let columns = self
            .table
            .columns()
            .iter()
            .enumerate()
            .map(|(index, schema)| {
                let values = self.table.column_values(index)[start..end].to_vec();
                BlockColumn {
                    name: schema.name.clone(),
                    type_name: schema.type_name.clone(),
                    values,
                }
            })
            .collect();

        self.next_row = end;
        if end >= total_rows {
            self.done = true;
        }

        Some(Block { num_rows, columns })
    }
}

#[cfg(test)]
mod tests {
    use native_protocol::Value;
    use native_types::{ColumnSchema, VecTable};

    use super::*;

    fn table_of(rows: usize) -> VecTable {
        let values: Vec<Value> = (0..rows as u32).map(Value::UInt32).collect();
        VecTable::new(vec![ColumnSchema::new("n", "UInt32")], vec![values])
    }

    #[test]
    fn chunks_exact_multiple() {
        let table = table_of(10);
        let blocks: Vec<Block> = Streamer::new(&table, 5).collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].num_rows, 5);
        assert_eq!(blocks[1].num_rows, 5);
    }

    #[test]
    fn chunks_with_remainder() {
        let table = table_of(11);
        let blocks: Vec<Block> = Streamer::new(&table, 5).collect();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[2].num_rows, 1);
    }

    #[test]
    fn empty_table_yields_one_empty_block() {
        let table = table_of(0);
        let blocks: Vec<Block> = Streamer::new(&table, 5).collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].num_rows, 0);
        assert_eq!(blocks[0].columns.len(), 1);
    }

    #[test]
    fn preserves_row_order_across_chunks() {
        let table = table_of(7);
        let blocks: Vec<Block> = Streamer::new(&table, 3).collect();
        let mut seen = Vec::new();
        for block in &blocks {
            for value in &block.columns[0].values {
                if let Value::UInt32(n) = value {
                    seen.push(*n);
                }
            }
        }
        assert_eq!(seen, (0..7).collect::<Vec<_>>());
    }

    proptest::proptest! {
        #[test]
        fn chunking_preserves_row_count_and_order(rows in 0usize..500, block_rows in 1u64..64) {
            let table = table_of(rows);
            let blocks: Vec<Block> = Streamer::new(&table, block_rows).collect();

            let total_rows: u64 = blocks.iter().map(|b| b.num_rows).sum();
            proptest::prop_assert_eq!(total_rows, rows as u64);

            for block in &blocks[..blocks.len().saturating_sub(1)] {
                proptest::prop_assert!(block.num_rows <= block_rows);
            }

            let mut seen = Vec::new();
            for block in &blocks {
                for value in &block.columns[0].values {
                    if let Value::UInt32(n) = value {
                        seen.push(*n);
                    }
                }
            }
            proptest::prop_assert_eq!(seen, (0..rows as u32).collect::<Vec<_>>());
        }
    }
}
