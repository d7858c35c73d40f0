use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use wabi_ostree::{OSTree, Outcome};

const N: usize = 10_000;

// ─── Helper functions to generate key sequences ─────────────────────────────

fn ordered_keys(n: usize) -> Vec<i64> {
    (0..n as i64).collect()
}

fn random_keys(n: usize) -> Vec<i64> {
    // Use a simple LCG for deterministic pseudo-random sequence
    let mut keys = Vec::with_capacity(n);
    let mut x: u64 = 12345;
    for _ in 0..n {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        keys.push((x >> 33) as i64);
    }
    keys
}

fn weighted_tree(keys: &[i64]) -> OSTree<i64> {
    keys.iter().map(|&k| Outcome::from_key(k).with_weight((k.rem_euclid(7) + 1) as f64)).collect()
}

// ─── Insert and delete ──────────────────────────────────────────────────────

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for (name, keys) in [("ordered", ordered_keys(N)), ("random", random_keys(N))] {
        group.bench_function(BenchmarkId::new("OSTree", name), |b| {
            b.iter(|| {
                let mut tree = OSTree::new();
                for &k in &keys {
                    tree.add(k, k, 1.0).unwrap();
                }
                tree
            });
        });

        group.bench_function(BenchmarkId::new("BTreeMap", name), |b| {
            b.iter(|| {
                let mut map = BTreeMap::new();
                for &k in &keys {
                    map.insert(k, k);
                }
                map
            });
        });
    }

    group.finish();
}

fn bench_delete(c: &mut Criterion) {
    let keys = random_keys(N);
    let mut group = c.benchmark_group("delete");

    group.bench_function(BenchmarkId::new("OSTree", N), |b| {
        b.iter_batched(
            || {
                let mut tree = OSTree::new();
                let nodes: Vec<_> = keys.iter().map(|&k| tree.add(k, k, 1.0).unwrap()).collect();
                (tree, nodes)
            },
            |(mut tree, nodes)| {
                for node in nodes {
                    tree.delete(node).unwrap();
                }
                tree
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter_batched(
            || keys.iter().map(|&k| (k, k)).collect::<BTreeMap<i64, i64>>(),
            |mut map| {
                for &k in &keys {
                    map.remove(&k);
                }
                map
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ─── Selection and sampling ─────────────────────────────────────────────────

fn bench_select(c: &mut Criterion) {
    let tree = weighted_tree(&random_keys(N));
    let total = tree.total_weight();
    let mut group = c.benchmark_group("select");

    group.bench_function(BenchmarkId::new("rank_select", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for rank in 1..=tree.count() {
                sum = sum.wrapping_add(*tree.rank_select(rank).unwrap().key());
            }
            sum
        });
    });

    group.bench_function(BenchmarkId::new("weight_select", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for i in 1..=N {
                let w = total * (i as f64 - 0.5) / N as f64;
                sum = sum.wrapping_add(*tree.weight_select(w).unwrap().key());
            }
            sum
        });
    });

    group.finish();
}

fn bench_sample(c: &mut Criterion) {
    let mut tree = weighted_tree(&random_keys(N));
    let mut group = c.benchmark_group("sample");

    group.bench_function(BenchmarkId::new("sample", N), |b| {
        let mut rng = StdRng::seed_from_u64(7);
        b.iter(|| tree.sample_iter(&mut rng).take(N).map(|n| *n.key()).fold(0i64, i64::wrapping_add));
    });

    group.bench_function(BenchmarkId::new("set_weight_then_sample", N), |b| {
        let mut rng = StdRng::seed_from_u64(7);
        let nodes: Vec<_> = tree.iter().map(|n| n.node_ref()).collect();
        b.iter(|| {
            let mut sum = 0i64;
            for (i, &node) in nodes.iter().enumerate() {
                tree.set_weight(node, (i % 5) as f64).unwrap();
                sum = sum.wrapping_add(*tree.sample(&mut rng).unwrap().key());
            }
            sum
        });
    });

    group.finish();
}

criterion_group!(update_benches, bench_insert, bench_delete);

criterion_group!(query_benches, bench_select, bench_sample);

criterion_main!(update_benches, query_benches);
