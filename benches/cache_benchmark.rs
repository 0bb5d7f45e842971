//! Performance benchmarks for folio-cache
//!
//! This benchmark suite measures:
//! - CacheStore operations (set, get hit/miss, clear_pattern)
//! - Memoized calls on a warm key
//! - Entity tag computation across payload sizes
//!
//! Run with: cargo bench
//! View results: open target/criterion/report/index.html

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use folio_cache::conditional::{is_fresh, EntityTag};
use folio_cache::{memoize, CacheStore, FreshnessPolicy, KeyNamespace};
use http::header::IF_NONE_MATCH;
use http::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::hint::black_box;

// ============================================================================
// Benchmark Fixtures
// ============================================================================

/// Rendered portfolio with a configurable body size
#[derive(Clone, Serialize, Deserialize)]
struct BenchPortfolio {
    id: String,
    title: String,
    body: Vec<u8>,
}

impl BenchPortfolio {
    fn new(id: &str, size: usize) -> Self {
        BenchPortfolio {
            id: id.to_string(),
            title: "Benchmark portfolio".to_string(),
            body: vec![7u8; size],
        }
    }
}

// ============================================================================
// Group 1: CacheStore
// ============================================================================

fn store_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_store");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    for size in [100, 1_000, 10_000, 100_000].iter() {
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("set", size), size, |b, &size| {
                let store = CacheStore::local();
                let portfolio = BenchPortfolio::new("p_1", size);
                let key = KeyNamespace::Portfolio.key("p_1");

                b.to_async(&rt).iter(|| async {
                    store.set(black_box(&key), black_box(&portfolio), None).await
                });
            });

        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("get_hit", size), size, |b, &size| {
                let store = CacheStore::local();
                let key = KeyNamespace::Portfolio.key("p_1");
                rt.block_on(store.set(&key, &BenchPortfolio::new("p_1", size), None));

                b.to_async(&rt)
                    .iter(|| async { store.get::<BenchPortfolio>(black_box(&key)).await });
            });
    }

    // size doesn't matter for misses
    group.bench_function("get_miss", |b| {
        let store = CacheStore::local();

        b.to_async(&rt).iter(|| async {
            store
                .get::<BenchPortfolio>(black_box("portfolio:missing"))
                .await
        });
    });

    group.bench_function("clear_pattern_1000_keys", |b| {
        let store = CacheStore::local();

        b.to_async(&rt).iter(|| async {
            for i in 0..500 {
                store.set(&KeyNamespace::Portfolio.key(i), &i, None).await;
                store.set(&KeyNamespace::Analytics.key(i), &i, None).await;
            }
            store.clear_pattern(KeyNamespace::Portfolio.pattern()).await;
        });
    });

    group.finish();
}

// ============================================================================
// Group 2: Memoization
// ============================================================================

fn memoize_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("memoize");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    group.bench_function("warm_call", |b| {
        let summarize = memoize(
            CacheStore::local(),
            KeyNamespace::AiResult.prefix(),
            None,
            |bio: String| async move { Ok::<_, Infallible>(bio.to_uppercase()) },
        );
        rt.block_on(summarize.call("a short bio".to_string()))
            .expect("infallible");

        b.to_async(&rt)
            .iter(|| async { summarize.call(black_box("a short bio".to_string())).await });
    });

    group.finish();
}

// ============================================================================
// Group 3: HTTP validators
// ============================================================================

fn http_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("http");

    for size in [1_000, 10_000, 100_000].iter() {
        let portfolio = BenchPortfolio::new("p_1", *size);
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(
                BenchmarkId::new("entity_tag", size),
                &portfolio,
                |b, portfolio| {
                    b.iter(|| EntityTag::compute(black_box(portfolio)));
                },
            );
    }

    let tag = EntityTag::from_bytes(b"portfolio body");
    let mut request = HeaderMap::new();
    request.insert(
        IF_NONE_MATCH,
        HeaderValue::from_str(tag.as_str()).expect("valid etag"),
    );
    group.bench_function("is_fresh_match", |b| {
        b.iter(|| is_fresh(black_box(&request), Some(&tag), None));
    });

    let policy = FreshnessPolicy::default();
    group.bench_function("headers_for", |b| {
        b.iter(|| policy.headers_for(black_box("templates"), None));
    });

    group.finish();
}

// ============================================================================
// Benchmark Registration
// ============================================================================

criterion_group!(benches, store_benchmarks, memoize_benchmarks, http_benchmarks);
criterion_main!(benches);
