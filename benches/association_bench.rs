//! Benchmark for Association vs standard HashMap.
//!
//! Compares the persistent hash-trie map against Rust's standard HashMap
//! for common operations, and measures the cost of keeping old versions.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::collections::HashMap;
use std::hint::black_box;
use thicket::Association;

// =============================================================================
// insert Benchmark
// =============================================================================

fn benchmark_insert(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("association_insert");

    for size in [1_000, 10_000, 100_000] {
        group.bench_with_input(
            BenchmarkId::new("Association", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut map = Association::new();
                    for index in 0..size {
                        map = map.insert(black_box(index), black_box(index * 2));
                    }
                    black_box(map)
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("HashMap", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut map = HashMap::new();
                    for index in 0..size {
                        map.insert(black_box(index), black_box(index * 2));
                    }
                    black_box(map)
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// get Benchmark
// =============================================================================

fn benchmark_get(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("association_get");

    for size in [100, 1_000, 10_000] {
        let persistent: Association<i32, i32> =
            (0..size).map(|index| (index, index * 2)).collect();
        let standard: HashMap<i32, i32> = (0..size).map(|index| (index, index * 2)).collect();

        group.bench_with_input(
            BenchmarkId::new("Association", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    for index in 0..size {
                        black_box(persistent.get(&index));
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("HashMap", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    for index in 0..size {
                        black_box(standard.get(&index));
                    }
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// remove Benchmark
// =============================================================================

fn benchmark_remove(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("association_remove");

    for size in [1_000, 10_000] {
        let persistent: Association<i32, i32> =
            (0..size).map(|index| (index, index)).collect();

        group.bench_with_input(
            BenchmarkId::new("Association", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut map = persistent.clone();
                    for index in 0..size {
                        map = map.remove(black_box(&index));
                    }
                    black_box(map)
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// versioning Benchmark
// =============================================================================

fn benchmark_versioning(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("association_versioning");

    // Keep every intermediate version alive; structural sharing should
    // keep this far below size * versions memory traffic.
    for size in [1_000, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("Association", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut versions = Vec::with_capacity(size as usize);
                    let mut map = Association::new();
                    for index in 0..size {
                        map = map.insert(black_box(index), black_box(index));
                        versions.push(map.clone());
                    }
                    black_box(versions)
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// iteration Benchmark
// =============================================================================

fn benchmark_iteration(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("association_iteration");

    for size in [1_000, 10_000] {
        let persistent: Association<i32, i32> =
            (0..size).map(|index| (index, index)).collect();

        group.bench_with_input(
            BenchmarkId::new("Association", size),
            &size,
            |bencher, _| {
                bencher.iter(|| {
                    let sum: i64 = persistent.iter().map(|(_, value)| i64::from(*value)).sum();
                    black_box(sum)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_insert,
    benchmark_get,
    benchmark_remove,
    benchmark_versioning,
    benchmark_iteration
);
criterion_main!(benches);
