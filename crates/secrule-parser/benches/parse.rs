//! Parser benchmarks for secrule-parser.
//!
//! Measures tokenizing and parsing throughput at various rule counts.

mod datagen;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use secrule_parser::{parse, tokenize};

// ---------------------------------------------------------------------------
// Benchmark: parse single rule
// ---------------------------------------------------------------------------

fn bench_parse_single_rule(c: &mut Criterion) {
    let conf = datagen::gen_n_rules(1);

    c.bench_function("parse_single_rule", |b| {
        b.iter(|| {
            let result = parse("bench.conf", black_box(&conf)).unwrap();
            black_box(result);
        });
    });
}

// ---------------------------------------------------------------------------
// Benchmark: parse N rules (scaling)
// ---------------------------------------------------------------------------

fn bench_parse_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_rules");

    for n in [10, 100, 500, 1000] {
        let conf = datagen::gen_n_rules(n);
        group.throughput(criterion::Throughput::Bytes(conf.len() as u64));

        group.bench_with_input(BenchmarkId::new("count", n), &conf, |b, conf| {
            b.iter(|| {
                let result = parse("bench.conf", black_box(conf)).unwrap();
                black_box(result);
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: lexer only
// ---------------------------------------------------------------------------

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");

    for n in [100, 1000] {
        let conf = datagen::gen_n_rules(n);
        group.throughput(criterion::Throughput::Bytes(conf.len() as u64));

        group.bench_with_input(BenchmarkId::new("count", n), &conf, |b, conf| {
            b.iter(|| {
                let tokens = tokenize("bench.conf", black_box(conf)).unwrap();
                black_box(tokens);
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: macro-heavy actions
// ---------------------------------------------------------------------------

fn bench_parse_macro_rules(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_macro_rules");

    for n in [100, 500] {
        let conf = datagen::gen_n_macro_rules(n);

        group.bench_with_input(BenchmarkId::new("count", n), &conf, |b, conf| {
            b.iter(|| {
                let result = parse("bench.conf", black_box(conf)).unwrap();
                black_box(result);
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Criterion harness
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_parse_single_rule,
    bench_parse_scaling,
    bench_tokenize,
    bench_parse_macro_rules,
);
criterion_main!(benches);
