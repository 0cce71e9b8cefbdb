// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::expect_used)]
//! Benchmark: BVH construction and box queries.
//!
//! Query windows cover roughly 1% of the world so most subtrees are pruned;
//! the linear baseline tests every box against the same window.
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use oxy_benches::synthetic_records;
use oxy_geom::{Aabb, Bvh, Coord};
use std::hint::black_box;

fn boxes(n: usize) -> Vec<Aabb> {
    synthetic_records(n)
        .expect("fixture")
        .iter()
        .map(|r| *r.geometry.bbox())
        .collect()
}

fn window() -> Aabb {
    Aabb::new(Coord::new(10.0, 10.0), Coord::new(46.0, 28.0)).expect("ordered window")
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("bvh_build");
    for &n in &[1_000usize, 10_000, 100_000] {
        let items = boxes(n);
        group.throughput(Throughput::Elements(n as u64));
        for &leaf in &[4usize, 8, 16] {
            group.bench_with_input(
                BenchmarkId::new(format!("leaf{leaf}"), n),
                &items,
                |b, items| b.iter(|| Bvh::build(black_box(items), leaf)),
            );
        }
    }
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("bvh_query");
    let q = window();
    for &n in &[10_000usize, 100_000] {
        let items = boxes(n);
        let bvh = Bvh::build(&items, 8);
        group.bench_with_input(BenchmarkId::new("indexed", n), &bvh, |b, bvh| {
            b.iter(|| bvh.query(black_box(&q)).len());
        });
        group.bench_with_input(BenchmarkId::new("linear", n), &items, |b, items| {
            b.iter(|| items.iter().filter(|bx| bx.overlaps(black_box(&q))).count());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_query);
criterion_main!(benches);
