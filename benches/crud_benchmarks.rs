use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rank_tree::{SortedBag, SortedMap, SortedSet};
use std::collections::{BTreeMap, BTreeSet};

const N: usize = 10_000;

// ─── Helper functions to generate key sequences ─────────────────────────────

fn ordered_keys(n: usize) -> Vec<i64> {
    (0..n as i64).collect()
}

fn random_keys(n: usize) -> Vec<i64> {
    // Simple LCG for a deterministic pseudo-random sequence
    let mut keys = Vec::with_capacity(n);
    let mut x: u64 = 12345;
    for _ in 0..n {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        keys.push((x >> 33) as i64);
    }
    keys
}

// ─── Map Benchmarks ─────────────────────────────────────────────────────────

fn bench_map_insert(c: &mut Criterion) {
    for (label, keys) in [("ordered", ordered_keys(N)), ("random", random_keys(N))] {
        let mut group = c.benchmark_group(format!("map_insert_{label}"));

        group.bench_function(BenchmarkId::new("SortedMap", N), |b| {
            b.iter(|| {
                let mut map = SortedMap::new();
                for &key in &keys {
                    map.insert_or_assign(key, key);
                }
                map
            });
        });

        group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
            b.iter(|| {
                let mut map = BTreeMap::new();
                for &key in &keys {
                    map.insert(key, key);
                }
                map
            });
        });

        group.finish();
    }
}

fn bench_map_get(c: &mut Criterion) {
    let keys = random_keys(N);
    let sorted: SortedMap<i64, i64> = keys.iter().map(|&key| (key, key)).collect();
    let std: BTreeMap<i64, i64> = keys.iter().map(|&key| (key, key)).collect();

    let mut group = c.benchmark_group("map_get_random");

    group.bench_function(BenchmarkId::new("SortedMap", N), |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for key in &keys {
                if sorted.get(key).is_some() {
                    hits += 1;
                }
            }
            hits
        });
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for key in &keys {
                if std.get(key).is_some() {
                    hits += 1;
                }
            }
            hits
        });
    });

    group.finish();
}

fn bench_map_remove(c: &mut Criterion) {
    let keys = random_keys(N);

    let mut group = c.benchmark_group("map_remove_random");

    group.bench_function(BenchmarkId::new("SortedMap", N), |b| {
        b.iter_with_setup(
            || keys.iter().map(|&key| (key, key)).collect::<SortedMap<i64, i64>>(),
            |mut map| {
                for key in &keys {
                    map.remove(key);
                }
                map
            },
        );
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter_with_setup(
            || keys.iter().map(|&key| (key, key)).collect::<BTreeMap<i64, i64>>(),
            |mut map| {
                for key in &keys {
                    map.remove(key);
                }
                map
            },
        );
    });

    group.finish();
}

// ─── Rank Benchmarks ────────────────────────────────────────────────────────

fn bench_rank_access(c: &mut Criterion) {
    let set: SortedSet<i64> = ordered_keys(N).into_iter().collect();

    let mut group = c.benchmark_group("rank_access");

    group.bench_function(BenchmarkId::new("element_at", N), |b| {
        b.iter(|| {
            let mut total = 0i64;
            for rank in (0..N).step_by(7) {
                total += *set.element_at(rank).unwrap();
            }
            total
        });
    });

    group.bench_function(BenchmarkId::new("index_of", N), |b| {
        b.iter(|| {
            let mut total = 0isize;
            for key in (0..N as i64).step_by(7) {
                total += set.index_of(&key);
            }
            total
        });
    });

    group.finish();
}

// ─── Set Benchmarks ─────────────────────────────────────────────────────────

fn bench_set_insert(c: &mut Criterion) {
    let keys = random_keys(N);

    let mut group = c.benchmark_group("set_insert_random");

    group.bench_function(BenchmarkId::new("SortedSet", N), |b| {
        b.iter(|| {
            let mut set = SortedSet::new();
            for &key in &keys {
                set.insert(key);
            }
            set
        });
    });

    group.bench_function(BenchmarkId::new("BTreeSet", N), |b| {
        b.iter(|| {
            let mut set = BTreeSet::new();
            for &key in &keys {
                set.insert(key);
            }
            set
        });
    });

    group.finish();
}

fn bench_bag_duplicates(c: &mut Criterion) {
    let keys: Vec<i64> = random_keys(N).into_iter().map(|key| key % 512).collect();

    let mut group = c.benchmark_group("bag_insert_duplicates");

    group.bench_function(BenchmarkId::new("SortedBag", N), |b| {
        b.iter(|| {
            let mut bag = SortedBag::new();
            for &key in &keys {
                bag.insert(key);
            }
            bag
        });
    });

    group.finish();
}

criterion_group!(map_benches, bench_map_insert, bench_map_get, bench_map_remove);
criterion_group!(rank_benches, bench_rank_access);
criterion_group!(set_benches, bench_set_insert, bench_bag_duplicates);

criterion_main!(map_benches, rank_benches, set_benches);
