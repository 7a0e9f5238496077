use std::collections::HashMap;
use std::hint::black_box;

use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use roadmapper::ranking::{rank, BayesianParams, ScoredItem};
use roadmapper::thread::{build_tree, CommentRecord, VoteTally};

fn items(n: usize) -> Vec<ScoredItem> {
    (0..n)
        .map(|i| ScoredItem::new(format!("roadmap-{}", i), (i as u64 * 7919) % 1000, (i as u64 * 104_729) % 400))
        .collect()
}

/// Every comment answers one of the previous ten, giving a bushy forest.
fn comments(n: usize) -> Vec<CommentRecord> {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().unwrap_or_else(Utc::now);
    (0..n as i64)
        .map(|id| CommentRecord {
            id,
            author_id: id % 50,
            author: format!("user{}", id % 50),
            text: "some reply text".to_string(),
            created_at,
            edited: false,
            parent_id: if id % 10 == 0 { None } else { Some(id - 1 - (id % 3)) },
        })
        .collect()
}

fn bench_rank(c: &mut Criterion) {
    let params = BayesianParams::default();
    let mut group = c.benchmark_group("rank");
    for size in [100usize, 10_000] {
        let input = items(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| rank(black_box(input.clone()), &params))
        });
    }
    group.finish();
}

fn bench_build_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_tree");
    for size in [1_000usize, 50_000] {
        let records = comments(size);
        let votes: HashMap<i64, VoteTally> = (0..size as i64)
            .step_by(3)
            .map(|id| (id, VoteTally { likes: 3, dislikes: 1, viewer_vote: Some(true) }))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| build_tree(black_box(records), &votes, Some(7)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rank, bench_build_tree);
criterion_main!(benches);
