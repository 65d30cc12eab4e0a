//! Spatial index benchmarks

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use geodoc_spatial::{BoundingBox, IndexShape, NamedIndexes, NodeKey};
use std::hint::black_box;

fn key(position: u64) -> NodeKey {
    NodeKey::from_store_name("bench-001", position).unwrap()
}

fn grid_shape(i: u64) -> IndexShape {
    let x = (i % 100) as f32;
    let y = (i / 100) as f32;
    IndexShape::rect(x, y, x + 1.0, y + 1.0)
}

fn bench_incremental_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("Index Incremental Insert");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut indexes = NamedIndexes::new();
                for i in 0..size {
                    indexes.insert("bench", key(i), grid_shape(i));
                }
                black_box(indexes.size("bench"))
            });
        });
    }

    group.finish();
}

fn bench_bulk_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("Index Bulk Build");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut indexes = NamedIndexes::new();
                for i in 0..size {
                    indexes.stage("bench", key(i), grid_shape(i));
                }
                indexes.build("bench").unwrap();
                black_box(indexes.size("bench"))
            });
        });
    }

    group.finish();
}

fn bench_intersection_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("Index Search");

    let mut indexes = NamedIndexes::new();
    for i in 0..10000u64 {
        indexes.stage("bench", key(i), grid_shape(i));
    }
    indexes.build("bench").unwrap();

    group.bench_function("search_10k", |b| {
        b.iter(|| {
            let query = BoundingBox::new(25.0, 75.0, 25.0, 75.0);
            black_box(indexes.keys_intersecting("bench", &query).count())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_incremental_insert,
    bench_bulk_build,
    bench_intersection_query
);
criterion_main!(benches);
