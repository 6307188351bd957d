//! Benchmarks for key canonicalization and cross-entry patching.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use viewsync::cache::store::ResponseCache;
use viewsync::model::{UserPage, UserStatus};
use viewsync::query::key::{QueryParams, StatusFilter};
use viewsync::transport::mock::seed_users;

fn bench_canonicalize(c: &mut Criterion) {
    let params = QueryParams {
        page: 7,
        page_size: 25,
        query: Some("jane".to_string()),
        status: None,
    };

    c.bench_function("canonicalize", |b| {
        b.iter(|| black_box(&params).canonicalize())
    });
}

fn populated_cache() -> ResponseCache {
    let users = seed_users(100);
    let mut cache = ResponseCache::new();

    // 50 entries across pages, sizes, and filters, each holding 10 users.
    for page in 1..=10u32 {
        for (i, status) in [
            StatusFilter::All,
            StatusFilter::Active,
            StatusFilter::Inactive,
            StatusFilter::All,
            StatusFilter::Active,
        ]
        .iter()
        .enumerate()
        {
            let key = QueryParams {
                page,
                page_size: 10 + i as u32,
                query: None,
                status: Some(*status),
            }
            .canonicalize();

            let start = ((page as usize - 1) * 10) % 90;
            cache.put(
                &key,
                UserPage {
                    items: users[start..start + 10].to_vec(),
                    total_count: 100,
                },
            );
        }
    }
    cache
}

fn bench_patch_where(c: &mut Criterion) {
    let mut cache = populated_cache();

    c.bench_function("patch_where_50_entries", |b| {
        b.iter(|| {
            let snapshot = cache.patch_where(
                |u| u.user_id == black_box("user-5"),
                |u| u.status = UserStatus::Inactive,
            );
            black_box(snapshot.len())
        })
    });
}

criterion_group!(benches, bench_canonicalize, bench_patch_where);
criterion_main!(benches);
