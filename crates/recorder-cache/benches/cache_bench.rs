//! Cache benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use recorder_cache::{GenerationalCache, SharedCache};

fn generational_churn_benchmark(c: &mut Criterion) {
    c.bench_function("generational_put_1000", |b| {
        b.iter(|| {
            let mut cache = GenerationalCache::new(30, 10);
            for i in 0..1000u64 {
                cache.put(i, i * 2);
            }
            black_box(cache.len())
        })
    });
}

fn generational_hot_get_benchmark(c: &mut Criterion) {
    let mut cache = GenerationalCache::new(30, 10);
    for i in 0..30u64 {
        cache.put(i, i * 2);
    }

    c.bench_function("generational_get_30", |b| {
        b.iter(|| {
            for i in 0..30u64 {
                black_box(cache.get(&i));
            }
        })
    });
}

fn shared_get_benchmark(c: &mut Criterion) {
    let cache = SharedCache::new("bench");
    for i in 0..100u64 {
        cache.publish(i, i * 2);
    }

    c.bench_function("shared_get_100", |b| {
        b.iter(|| {
            for i in 0..100u64 {
                black_box(cache.get_or_insert_with(&i, || 0));
            }
        })
    });
}

criterion_group!(
    benches,
    generational_churn_benchmark,
    generational_hot_get_benchmark,
    shared_get_benchmark
);
criterion_main!(benches);
