//! Benchmarks for the top-level reader/writer over a full table.

#![allow(clippy::unwrap_used, missing_docs)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use native_compress::CompressionMethod;
use native_io::{Config, NativeReader, NativeWriter};
use native_protocol::Value;
use native_types::{ColumnSchema, VecTable};

fn table_of(rows: usize) -> VecTable {
    VecTable::new(
        vec![
            ColumnSchema::new("id", "UInt32"),
            ColumnSchema::new("label", "String"),
        ],
        vec![
            (0..rows as u32).map(Value::UInt32).collect(),
            (0..rows).map(|i| Value::String(format!("row-{i}"))).collect(),
        ],
    )
}

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("native_io_write");

    for rows in [64usize, 4_096, 65_400] {
        let table = table_of(rows);

        group.bench_function(format!("uncompressed_{rows}_rows"), |b| {
            b.iter(|| {
                let mut buf = Vec::new();
                let config = Config::new().with_block_rows(rows as u64);
                let mut writer = NativeWriter::new(&mut buf, config).unwrap();
                writer.write_table(black_box(&table)).unwrap();
                writer.flush().unwrap();
                black_box(buf)
            })
        });

        group.bench_function(format!("lz4_{rows}_rows"), |b| {
            b.iter(|| {
                let mut buf = Vec::new();
                let config = Config::new()
                    .with_block_rows(rows as u64)
                    .with_make_compress(true)
                    .with_compress_method(CompressionMethod::Lz4);
                let mut writer = NativeWriter::new(&mut buf, config).unwrap();
                writer.write_table(black_box(&table)).unwrap();
                writer.flush().unwrap();
                black_box(buf)
            })
        });
    }

    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("native_io_read");

    for rows in [64usize, 4_096, 65_400] {
        let table = table_of(rows);
        let config = Config::new().with_block_rows(rows as u64);

        let mut encoded = Vec::new();
        {
            let mut writer = NativeWriter::new(&mut encoded, config.clone()).unwrap();
            writer.write_table(&table).unwrap();
            writer.flush().unwrap();
        }
        group.throughput(Throughput::Bytes(encoded.len() as u64));

        group.bench_function(format!("read_table_{rows}_rows"), |b| {
            b.iter(|| {
                let mut reader = NativeReader::new(encoded.as_slice(), config.clone()).unwrap();
                black_box(reader.read_table().unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_write, bench_read);
criterion_main!(benches);
