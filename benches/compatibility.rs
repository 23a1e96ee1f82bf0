// SPDX-License-Identifier: MIT OR Apache-2.0
//! Benchmarks for compatibility filtering, reports, and statistics over
//! collections of flat tests.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use ctl_capability::{CapabilityDeclaration, filter_compatible, generate_report, is_compatible};
use ctl_core::{Behavior, ConflictSet, ExpectedPayload, Feature, Function, TestCase};
use ctl_loader::statistics;
use serde_json::json;

// ── Helpers ─────────────────────────────────────────────────────────────

fn collection(n: usize) -> Vec<TestCase> {
    (0..n)
        .map(|i| {
            let function = Function::ALL[i % Function::ALL.len()];
            let mut t = TestCase::flat(
                format!("t{i}"),
                "key = value",
                function,
                ExpectedPayload::Scalar(json!(i)),
            );
            if i % 3 == 0 {
                t = t.with_features([Feature::ALL[i % Feature::ALL.len()]]);
            }
            if i % 4 == 0 {
                t = t.with_behaviors([Behavior::ALL[i % Behavior::ALL.len()]]);
            }
            if i % 7 == 0 {
                t = t.with_conflicts(ConflictSet::behaviors([
                    Behavior::ALL[(i + 1) % Behavior::ALL.len()],
                ]));
            }
            t
        })
        .collect()
}

fn permissive() -> CapabilityDeclaration {
    CapabilityDeclaration::new("full", "1")
        .with_functions(Function::ALL)
        .with_features(Feature::ALL)
        .with_behaviors([
            Behavior::CrlfNormalizeToLf,
            Behavior::TabsToSpaces,
            Behavior::LooseSpacing,
            Behavior::BooleanLenient,
            Behavior::ListCoercionEnabled,
            Behavior::ArrayOrderInsertion,
        ])
}

fn parse_only() -> CapabilityDeclaration {
    CapabilityDeclaration::new("parse-only", "1").with_functions([Function::Parse])
}

// ── is_compatible() ─────────────────────────────────────────────────────

fn bench_is_compatible(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_compatible");
    let tests = collection(64);
    let full = permissive();
    let narrow = parse_only();

    group.bench_function("permissive_declaration", |b| {
        b.iter(|| tests.iter().filter(|t| is_compatible(black_box(&full), t)).count());
    });
    group.bench_function("parse_only_declaration", |b| {
        b.iter(|| tests.iter().filter(|t| is_compatible(black_box(&narrow), t)).count());
    });
    group.finish();
}

// ── filter_compatible() scaling ─────────────────────────────────────────

fn bench_filter_compatible(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_compatible");
    let decl = permissive();

    for count in [10, 100, 1_000, 10_000] {
        let tests = collection(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("flat", count), &tests, |b, tests| {
            b.iter(|| filter_compatible(black_box(&decl), black_box(tests)).len());
        });
    }
    group.finish();
}

// ── generate_report() and statistics() ──────────────────────────────────

fn bench_summaries(c: &mut Criterion) {
    let mut group = c.benchmark_group("summaries");
    let decl = permissive();

    for count in [100, 1_000] {
        let tests = collection(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("report", count), &tests, |b, tests| {
            b.iter(|| generate_report(black_box(&decl), black_box(tests)));
        });
        group.bench_with_input(BenchmarkId::new("statistics", count), &tests, |b, tests| {
            b.iter(|| statistics(black_box(&decl), black_box(tests)));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_is_compatible,
    bench_filter_compatible,
    bench_summaries
);
criterion_main!(benches);
