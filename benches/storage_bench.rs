//! Benchmarks for LazyKV engine operations

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lazykv::{Config, Engine, WalSyncStrategy};
use tempfile::TempDir;

fn open_engine(cache_capacity: usize) -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .wal_sync_strategy(WalSyncStrategy::OsBuffered)
        .cache_capacity(cache_capacity)
        .disable_periodic_snapshots()
        .build();
    let engine = Engine::open(config).unwrap();
    (temp_dir, engine)
}

fn storage_benchmarks(c: &mut Criterion) {
    // Single key write throughput (WAL append without fsync)
    c.bench_function("set_buffered", |b| {
        let (_temp, engine) = open_engine(1024);
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            engine.set(&format!("key{}", i % 10_000), "value").unwrap();
        });
    });

    // Read throughput served from the cache
    c.bench_function("get_cache_hit", |b| {
        let (_temp, engine) = open_engine(1024);
        engine.set("hot", "value").unwrap();
        b.iter(|| black_box(engine.get("hot").unwrap()));
    });

    // Read throughput served from the map
    c.bench_function("get_cache_disabled", |b| {
        let (_temp, engine) = open_engine(0);
        engine.set("cold", "value").unwrap();
        b.iter(|| black_box(engine.get("cold").unwrap()));
    });

    // Full dump of 10k entries
    c.bench_function("snapshot_10k", |b| {
        let (_temp, engine) = open_engine(0);
        for i in 0..10_000 {
            engine.set(&format!("key{}", i), "value").unwrap();
        }
        b.iter(|| engine.snapshot().unwrap());
    });
}

criterion_group!(benches, storage_benchmarks);
criterion_main!(benches);
