//! Benchmarks for Native type inference over tabular columns.

#![allow(clippy::unwrap_used, missing_docs)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use native_protocol::Value;
use native_types::infer_column;

fn int_column(rows: usize) -> Vec<Value> {
    (0..rows as u32).map(Value::UInt32).collect()
}

fn string_column(rows: usize) -> Vec<Value> {
    (0..rows).map(|i| Value::String(format!("row-{i}"))).collect()
}

fn nullable_int_column(rows: usize) -> Vec<Value> {
    (0..rows as u32)
        .map(|i| if i % 7 == 0 { Value::Null } else { Value::UInt32(i) })
        .collect()
}

fn bench_infer(c: &mut Criterion) {
    let mut group = c.benchmark_group("infer_column");

    for rows in [64usize, 4_096, 65_400] {
        let ints = int_column(rows);
        let strings = string_column(rows);
        let nullable = nullable_int_column(rows);

        group.throughput(Throughput::Elements(rows as u64));

        group.bench_function(format!("uint32_{rows}"), |b| {
            b.iter(|| black_box(infer_column(None, black_box(&ints)).unwrap()))
        });
        group.bench_function(format!("string_{rows}"), |b| {
            b.iter(|| black_box(infer_column(None, black_box(&strings)).unwrap()))
        });
        group.bench_function(format!("nullable_uint32_{rows}"), |b| {
            b.iter(|| black_box(infer_column(None, black_box(&nullable)).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_infer);
criterion_main!(benches);
