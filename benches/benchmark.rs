// Ingest and query benchmarks over a synthetic purchase population
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use finrec_core::{RecommenderStore, DEFAULT_TOP_K};
use rand::prelude::*;

/// Builds a population where consecutive users occasionally split a
/// transaction, so similarity scores are nonzero for most neighbors.
fn populate(store: &RecommenderStore, users: usize, transactions_per_user: usize) {
    let mut rng = rand::rng();
    for user in 0..users {
        for t in 0..transactions_per_user {
            let transaction = format!("u{user}-t{t}");
            let items: Vec<String> = (0..rng.random_range(1..6))
                .map(|_| format!("item{}", rng.random_range(0..200)))
                .collect();
            store.add_transaction(&format!("user{user}"), &transaction, items.clone());
            if user > 0 && rng.random_bool(0.3) {
                // Shared household purchase with the previous user.
                store.add_transaction(&format!("user{}", user - 1), &transaction, items);
            }
        }
    }
}

fn benchmark_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");

    for size in [100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("add_transaction", size), size, |b, &size| {
            b.iter(|| {
                let store = RecommenderStore::new();
                populate(&store, size, 5);
                black_box(store.transaction_count())
            });
        });
    }

    group.finish();
}

fn benchmark_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");

    let store = RecommenderStore::new();
    populate(&store, 1000, 5);

    group.bench_function("user_similarity_cold", |b| {
        let mut rng = rand::rng();
        b.iter(|| {
            let a = format!("user{}", rng.random_range(0..1000));
            let other = format!("user{}", rng.random_range(0..1000));
            black_box(store.user_similarity(&a, &other))
        });
    });

    group.bench_function("recommendations", |b| {
        b.iter(|| black_box(store.recommendations("user500", DEFAULT_TOP_K)));
    });

    group.bench_function("history_recommendations", |b| {
        b.iter(|| black_box(store.history_recommendations("user500", DEFAULT_TOP_K)));
    });

    group.finish();
}

criterion_group!(benches, benchmark_ingest, benchmark_queries);
criterion_main!(benches);
