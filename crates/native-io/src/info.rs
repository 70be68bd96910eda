//! Stream inspection: describe a Native stream's columns and row count
//! without materializing any values.

use std::fmt;
use std::io::Read;

use native_protocol::skip_block_header;

use crate::error::Result;
use crate::sniff::sniff;

/// The container format detected around a Native stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// A plain Native block stream.
    Native,
    /// A Native block stream wrapped in a gzip transport layer.
    GzipNative,
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Native => "Native",
            Self::GzipNative => "GzipNative",
        })
    }
}

/// A column's name and declared type descriptor, as reported by
/// [`StreamInfo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Textual type descriptor, e.g. `"Array(Nullable(String))"`.
    pub type_name: String,
}

/// A description of a Native stream's shape, gathered by walking every block
/// with the skip path: column schema, total row count, and the detected
/// container format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// Detected transport wrapper around the Native stream.
    pub data_format: DataFormat,
    /// Column schema taken from the first block seen.
    pub columns: Vec<ColumnInfo>,
    /// Row count summed across every block in the stream.
    pub total_rows: u64,
}

impl fmt::Display for StreamInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .columns
            .iter()
            .map(|column| column.name.len() + column.type_name.len() + 3)
            .chain(std::iter::once(format!("format: {}", self.data_format).len()))
            .chain(std::iter::once(format!("rows: {}", self.total_rows).len()))
            .max()
            .unwrap_or(0)
            .max(20);

        let border = "─".repeat(width + 2);
        writeln!(f, "┌{border}┐")?;
        writeln!(f, "│ {:<width$} │", format!("format: {}", self.data_format))?;
        writeln!(f, "│ {:<width$} │", format!("rows: {}", self.total_rows))?;
        for column in &self.columns {
            writeln!(
                f,
                "│ {:<width$} │",
                format!("{}: {}", column.name, column.type_name)
            )?;
        }
        write!(f, "└{border}┘")
    }
}

/// Walk every block of `reader`, collecting column schema and total row
/// count without decoding any column values.
pub fn describe<R: Read>(reader: R) -> Result<StreamInfo> {
    let sniffed = sniff(reader)?;
    let data_format = if matches!(sniffed, crate::sniff::Sniffed::Gzip(_)) {
        DataFormat::GzipNative
    } else {
        DataFormat::Native
    };

    let mut reader = sniffed;
    let mut columns = Vec::new();
    let mut total_rows = 0u64;
    let mut schema_seen = false;

    while let Some(header) = skip_block_header(&mut reader)? {
        total_rows += header.num_rows;
        if !schema_seen {
            columns = header
                .columns
                .into_iter()
                .map(|(name, type_name)| ColumnInfo { name, type_name })
                .collect();
            schema_seen = true;
        }
    }

    Ok(StreamInfo {
        data_format,
        columns,
        total_rows,
    })
}

#[cfg(test)]
mod tests {
    use native_protocol::{write_block, Block, BlockColumn, Value};

    use super::*;

    fn sample_stream() -> Vec<u8> {
        let block = Block {
            num_rows: 2,
            columns: vec![BlockColumn {
                name: "id".to_owned(),
                type_name: "UInt32".to_owned(),
                values: vec![Value::UInt32(1), Value::UInt32(2)],
            }],
        };
        let mut buf = Vec::new();
        write_block(&block, &mut buf).unwrap();
        write_block(&block, &mut buf).unwrap();
        buf
    }

    #[test]
    fn describes_plain_stream() {
        let buf = sample_stream();
        let info = describe(buf.as_slice()).unwrap();
        assert_eq!(info.data_format, DataFormat::Native);
        assert_eq!(info.total_rows, 4);
        assert_eq!(info.columns.len(), 1);
        assert_eq!(info.columns[0].name, "id");
        assert_eq!(info.columns[0].type_name, "UInt32");
    }

    #[test]
    fn describes_gzip_wrapped_stream() {
        use std::io::Write as _;

        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&sample_stream()).unwrap();
        let gzipped = encoder.finish().unwrap();

        let info = describe(gzipped.as_slice()).unwrap();
        assert_eq!(info.data_format, DataFormat::GzipNative);
        assert_eq!(info.total_rows, 4);
    }

    #[test]
    fn display_includes_format_rows_and_columns() {
        let buf = sample_stream();
        let info = describe(buf.as_slice()).unwrap();
        let rendered = info.to_string();
        assert!(rendered.contains("format: Native"));
        assert!(rendered.contains("rows: 4"));
        assert!(rendered.contains("id: UInt32"));
    }

    #[test]
    fn empty_stream_has_no_columns_and_zero_rows() {
        let buf: Vec<u8> = Vec::new();
        let info = describe(buf.as_slice()).unwrap();
        assert_eq!(info.total_rows, 0);
        assert!(info.columns.is_empty());
    }
}
