//! Benchmarks for ColumnStore update batches.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pivotal_core::schema::{SchemaBuilder, TableSchema};
use pivotal_core::{DataType, Payload};
use pivotal_storage::{ColumnStore, Transaction};

fn schema(keyed: bool) -> TableSchema {
    let builder = SchemaBuilder::new("ticks")
        .add_column("id", DataType::Int64)
        .unwrap()
        .add_column("price", DataType::Float64)
        .unwrap()
        .add_column("sector", DataType::String)
        .unwrap();
    let builder = if keyed {
        builder.add_primary_key("id").unwrap()
    } else {
        builder
    };
    builder.build().unwrap()
}

fn payloads(count: usize) -> Vec<Payload> {
    let sectors = ["Tech", "Finance", "Health", "Energy", "Consumer"];
    (0..count)
        .map(|i| {
            Payload::new()
                .with("id", i as i64)
                .with("price", 100.0 + i as f64 * 0.1)
                .with("sector", sectors[i % sectors.len()])
        })
        .collect()
}

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");

    for size in [100, 1_000, 10_000] {
        let batch = payloads(size);
        group.bench_with_input(BenchmarkId::new("unkeyed", size), &batch, |b, batch| {
            b.iter(|| {
                let mut store = ColumnStore::new(schema(false));
                let mut tx = Transaction::begin(&mut store, 1);
                tx.apply_all(black_box(batch)).unwrap();
                black_box(tx.commit().unwrap())
            })
        });
    }

    group.finish();
}

fn bench_keyed_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyed_update");

    for size in [1_000, 10_000] {
        let mut store = ColumnStore::new(schema(true));
        let mut tx = Transaction::begin(&mut store, 1);
        tx.apply_all(&payloads(size)).unwrap();
        tx.commit().unwrap();

        let mut epoch = 1;
        group.bench_with_input(BenchmarkId::new("single_row", size), &size, |b, &size| {
            b.iter(|| {
                epoch += 1;
                let id = (epoch as usize * 7919) % size;
                let payload = Payload::new().with("id", id as i64).with("price", epoch as f64);
                let mut tx = Transaction::begin(&mut store, epoch);
                tx.apply_payload(black_box(&payload)).unwrap();
                black_box(tx.commit().unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_append, bench_keyed_update);
criterion_main!(benches);
