// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::expect_used)]
//! Benchmark: end-to-end filter evaluation through a loaded session.
//!
//! Covers a bounds-only query (index path), a time-plus-attribute query
//! (linear path), and the combined query the dashboard issues most.
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use oxy_benches::synthetic_container;
use oxy_core::{FilterSpec, Session, Value};
use oxy_wasm_abi::{AttributePredicate, Bounds, PredicateOp};
use std::hint::black_box;

fn specs() -> Vec<(&'static str, FilterSpec)> {
    let bounds = Bounds {
        min_x: -20.0,
        min_y: -10.0,
        max_x: 40.0,
        max_y: 35.0,
    };
    let attrs = vec![
        AttributePredicate {
            name: "org".into(),
            op: PredicateOp::Eq {
                value: Value::Str("ACLED".into()),
            },
        },
        AttributePredicate {
            name: "sentiment".into(),
            op: PredicateOp::Range {
                min: Some(0.0),
                max: Some(0.5),
            },
        },
    ];
    vec![
        (
            "bounds",
            FilterSpec {
                bounds: Some(bounds),
                ..FilterSpec::default()
            },
        ),
        (
            "time_attrs",
            FilterSpec {
                time_min: Some(250_000),
                time_max: Some(750_000),
                attributes: attrs.clone(),
                ..FilterSpec::default()
            },
        ),
        (
            "combined",
            FilterSpec {
                bounds: Some(bounds),
                time_min: Some(250_000),
                time_max: Some(750_000),
                attributes: attrs,
                ..FilterSpec::default()
            },
        ),
    ]
}

fn bench_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");
    for &n in &[10_000usize, 100_000] {
        let mut session = Session::new();
        session
            .load(&synthetic_container(n).expect("fixture"))
            .expect("load");
        for (name, spec) in specs() {
            group.bench_with_input(BenchmarkId::new(name, n), &spec, |b, spec| {
                b.iter(|| session.apply_filters(black_box(spec)).expect("filter").len());
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_filters);
criterion_main!(benches);
