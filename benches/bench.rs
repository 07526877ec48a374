use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use btreedb::Database;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Opens a fresh database under `target/` for one benchmark iteration.
/// Returns the path alongside the handle so callers can reopen it later.
fn create_db() -> (Database, PathBuf) {
    let counter = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = PathBuf::from(format!("target/bench_db_{counter}.bin"));
    let _ = std::fs::remove_file(&path);
    let db = Database::open_path(&path).expect("failed to open bench database");
    (db, path)
}

/// A value near the 255-byte cap, to exercise realistic leaf occupancy.
fn bench_value() -> String {
    "x".repeat(200)
}

/// Insertion latency once the tree already holds `num_keys - 1` entries —
/// shows how insert cost changes as the tree grows and splits propagate.
fn bench_insertion_at_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("insertion_at_size");
    group.sample_size(10);

    // `MAX_PAGES` caps a database at 100 resident pages (see `page.rs`), so
    // key counts here stay well under the roughly 14-per-leaf-page ceiling
    // that implies for the production capacity configuration.
    let key_counts = vec![50, 200, 500, 800];
    let value = bench_value();

    for &num_keys in &key_counts {
        group.bench_with_input(
            BenchmarkId::new("insert_into_tree", num_keys),
            &num_keys,
            |b, &num_keys| {
                b.iter_with_setup(
                    || {
                        let (db, path) = create_db();
                        for i in 0..num_keys - 1 {
                            let key = format!("key_{i:08}");
                            db.set(&key, &value).expect("setup insert failed");
                        }
                        (db, path)
                    },
                    |(db, path)| {
                        let key = format!("key_{:08}", num_keys - 1);
                        db.set(black_box(&key), black_box(&value))
                            .expect("benchmark insert failed");
                        black_box(&db);
                        let _ = std::fs::remove_file(path);
                    },
                );
            },
        );
    }

    group.finish();
}

/// Time to insert `num_keys` keys sequentially into a fresh tree.
fn bench_sequential_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_insertion");
    group.sample_size(10);

    let key_counts = vec![50, 200, 500, 800];
    let value = bench_value();

    for &num_keys in &key_counts {
        group.bench_with_input(
            BenchmarkId::new("sequential", num_keys),
            &num_keys,
            |b, &num_keys| {
                b.iter_with_setup(create_db, |(db, path)| {
                    for i in 0..num_keys {
                        let key = format!("key_{i:08}");
                        db.set(black_box(&key), black_box(&value))
                            .expect("insert failed");
                    }
                    black_box(&db);
                    let _ = std::fs::remove_file(path);
                });
            },
        );
    }

    group.finish();
}

/// Point-lookup latency against databases of increasing size, reopened from
/// disk so the benchmark measures a cold pager, not a warm one.
fn bench_lookup_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup_latency");
    group.sample_size(50);

    let db_sizes = vec![50, 200, 500, 800];
    let value = bench_value();

    for &db_size in &db_sizes {
        group.bench_with_input(
            BenchmarkId::new("get", db_size),
            &db_size,
            |b, &db_size| {
                b.iter_with_setup(
                    || {
                        let (db, path) = create_db();
                        for i in 0..db_size {
                            db.set(&format!("key_{i:08}"), &value).expect("insert failed");
                        }
                        db.close().expect("close failed");
                        let test_key = format!("key_{:08}", db_size / 2);
                        (path, test_key)
                    },
                    |(path, test_key)| {
                        let db = Database::open_path(&path).expect("reopen failed");
                        let result = db.get(black_box(&test_key)).expect("lookup failed");
                        black_box(result);
                        let _ = std::fs::remove_file(path);
                    },
                );
            },
        );
    }

    group.finish();
}

/// Time to reopen a populated database file (re-reading the root page and
/// making it resident) as a proxy for startup cost after a restart.
fn bench_reopen_time(c: &mut Criterion) {
    let mut group = c.benchmark_group("reopen_time");
    group.sample_size(10);

    let db_sizes = vec![100, 400, 800];
    let value = bench_value();

    for &db_size in &db_sizes {
        group.bench_with_input(
            BenchmarkId::new("reopen", db_size),
            &db_size,
            |b, &db_size| {
                b.iter_with_setup(
                    || {
                        let (db, path) = create_db();
                        for i in 0..db_size {
                            db.set(&format!("key_{i:08}"), &value).expect("insert failed");
                        }
                        db.close().expect("close failed");
                        path
                    },
                    |path| {
                        let start = Instant::now();
                        let db = Database::open_path(&path).expect("reopen failed");
                        black_box(db.get("key_00000000").unwrap());
                        let elapsed = start.elapsed();
                        eprintln!("reopen with {db_size} records: {elapsed:?}");
                        let _ = std::fs::remove_file(path);
                    },
                );
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insertion_at_size,
    bench_sequential_insertion,
    bench_lookup_latency,
    bench_reopen_time
);
criterion_main!(benches);
