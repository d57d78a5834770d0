//! Buffer pool benchmarks.
//!
//! Measures buffer pool performance for:
//! - Pin/unpin operations on a cold (empty-frame) pool
//! - Cache hit/miss scenarios
//! - Eviction under pressure, across all three replacement policies

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use framepool::storage::buffer_pool::ReplacementPolicy;
use framepool::{BufferPoolBuilder, PageFile, PageNumber, PAGE_SIZE};
use tempfile::TempDir;

/// Creates a page file with `num_pages` zero-filled pages and returns its
/// path alongside the `TempDir` guarding it.
fn seeded_file(num_pages: u64) -> (TempDir, String) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("pages.db");
    let mut file = PageFile::create(&path).expect("create page file");
    file.ensure_capacity(num_pages).expect("grow page file");
    (dir, path.to_str().unwrap().to_string())
}

/// Benchmark cold pins (empty-frame install) across pool capacities.
fn bench_cold_pin(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_pool_cold_pin");

    for &capacity in &[64usize, 128, 256, 512] {
        let (_dir, file_name) = seeded_file(capacity as u64);

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &capacity| {
            b.iter_batched(
                || {
                    BufferPoolBuilder::new()
                        .file_name(file_name.clone())
                        .num_pages(capacity)
                        .policy(ReplacementPolicy::Lru)
                        .build()
                        .expect("build pool")
                },
                |mut pool| {
                    let handle = pool.pin(PageNumber::new(0)).expect("pin page");
                    black_box(pool.page_data(handle).expect("resident")[0]);
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark sequential re-access of a resident working set (cache hits).
fn bench_sequential_hits(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_pool_sequential_hits");

    let (_dir, file_name) = seeded_file(100);
    let mut pool = BufferPoolBuilder::new()
        .file_name(file_name)
        .num_pages(256)
        .policy(ReplacementPolicy::Lru)
        .build()
        .expect("build pool");

    let page_numbers: Vec<PageNumber> = (0..100).map(PageNumber::new).collect();
    for &page_number in &page_numbers {
        let handle = pool.pin(page_number).expect("pin page");
        pool.unpin(handle).expect("unpin page");
    }

    group.throughput(Throughput::Elements(100));
    group.bench_function("100_pages_sequential", |b| {
        b.iter(|| {
            for &page_number in &page_numbers {
                let handle = pool.pin(page_number).expect("pin page");
                black_box(pool.page_data(handle).expect("resident")[0]);
                pool.unpin(handle).expect("unpin page");
            }
        });
    });

    group.finish();
}

/// Benchmark pseudo-random page access over a resident working set.
fn bench_random_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_pool_random");

    let (_dir, file_name) = seeded_file(100);
    let mut pool = BufferPoolBuilder::new()
        .file_name(file_name)
        .num_pages(128)
        .policy(ReplacementPolicy::Clock)
        .build()
        .expect("build pool");

    let page_numbers: Vec<PageNumber> = (0..100).map(PageNumber::new).collect();
    for &page_number in &page_numbers {
        let handle = pool.pin(page_number).expect("pin page");
        pool.unpin(handle).expect("unpin page");
    }

    let mut access_pattern = Vec::new();
    let mut seed: u32 = 12345;
    for _ in 0..1000 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
        access_pattern.push(page_numbers[(seed as usize) % page_numbers.len()]);
    }

    group.throughput(Throughput::Elements(1000));
    group.bench_function("1000_random_accesses", |b| {
        b.iter(|| {
            for &page_number in &access_pattern {
                let handle = pool.pin(page_number).expect("pin page");
                black_box(pool.page_data(handle).expect("resident")[0]);
                pool.unpin(handle).expect("unpin page");
            }
        });
    });

    group.finish();
}

/// Benchmark dirtying and unpinning pages (the write path up to, but not
/// including, write-back).
fn bench_mark_dirty(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_pool_mark_dirty");

    let (_dir, file_name) = seeded_file(50);
    let mut pool = BufferPoolBuilder::new()
        .file_name(file_name)
        .num_pages(256)
        .policy(ReplacementPolicy::Fifo)
        .build()
        .expect("build pool");

    let page_numbers: Vec<PageNumber> = (0..50).map(PageNumber::new).collect();

    group.throughput(Throughput::Bytes(PAGE_SIZE as u64 * 50));
    group.bench_function("50_pages_write", |b| {
        b.iter(|| {
            for &page_number in &page_numbers {
                let handle = pool.pin(page_number).expect("pin page");
                for byte in pool.page_data_mut(handle).expect("resident").iter_mut() {
                    *byte = 0x42;
                }
                pool.mark_dirty(handle).expect("mark dirty");
                pool.unpin(handle).expect("unpin page");
            }
            pool.force_flush_pool().expect("flush dirty frames");
        });
    });

    group.finish();
}

/// Benchmark eviction under memory pressure, one run per replacement policy.
fn bench_eviction_pressure(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_pool_eviction");

    let pool_size = 32;
    let access_pages = 100u64; // more pages than the pool can hold resident
    let (_dir, file_name) = seeded_file(access_pages);

    for policy in [ReplacementPolicy::Fifo, ReplacementPolicy::Lru, ReplacementPolicy::Clock] {
        group.throughput(Throughput::Elements(access_pages));
        group.bench_function(format!("{policy:?}"), |b| {
            b.iter_batched(
                || {
                    BufferPoolBuilder::new()
                        .file_name(file_name.clone())
                        .num_pages(pool_size)
                        .policy(policy)
                        .build()
                        .expect("build pool")
                },
                |mut pool| {
                    for n in 0..access_pages {
                        let handle = pool.pin(PageNumber::new(n)).expect("pin page");
                        black_box(pool.page_data(handle).expect("resident")[0]);
                        pool.unpin(handle).expect("unpin page");
                    }
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_cold_pin,
    bench_sequential_hits,
    bench_random_access,
    bench_mark_dirty,
    bench_eviction_pressure
);
criterion_main!(benches);
