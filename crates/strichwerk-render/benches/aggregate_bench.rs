// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for batch aggregation and container assembly in the
// strichwerk-render crate.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use strichwerk_core::types::{FetchOutcome, FragmentBody, Generation};
use strichwerk_render::Aggregator;

/// Outcomes for `n` slots, arriving in reverse index order.
fn reversed_outcomes(n: u32) -> Vec<FetchOutcome> {
    (0..n)
        .rev()
        .enumerate()
        .map(|(ordinal, index)| FetchOutcome {
            generation: Generation(1),
            index,
            body: FragmentBody::Rendered(format!(
                r#"<img src="data:image/png;base64,iVBORw0KGgo=" alt="{index}">"#
            )),
            completed_at: ordinal as u64,
        })
        .collect()
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    for n in [10u32, 100, 1_000] {
        let outcomes = reversed_outcomes(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &outcomes, |b, outcomes| {
            b.iter(|| {
                let mut agg = Aggregator::new(Generation(1), n);
                let mut commit = None;
                for outcome in outcomes.iter().cloned() {
                    if let Some(c) = agg.on_fetch_settled(outcome) {
                        commit = Some(c);
                    }
                }
                black_box(commit)
            });
        });
    }
    group.finish();
}

fn bench_container_html(c: &mut Criterion) {
    let outcomes = reversed_outcomes(500);
    let mut agg = Aggregator::new(Generation(1), 500);
    let mut commit = None;
    for outcome in outcomes {
        if let Some(c) = agg.on_fetch_settled(outcome) {
            commit = Some(c);
        }
    }
    let Some(commit) = commit else {
        return;
    };

    c.bench_function("container_html_500", |b| {
        b.iter(|| black_box(commit.container_html()))
    });
}

criterion_group!(benches, bench_aggregate, bench_container_html);
criterion_main!(benches);
