//! Benchmarks for scaled-number arithmetic, formatting and ledger snapshots.
//!
//! Run with: cargo bench --bench scaled_number

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use currency_core::{CurrencyDefinition, CurrencyLedger, MemoryStorage, ScaledNumber};

fn benchmark_arithmetic(c: &mut Criterion) {
    let a = ScaledNumber::new(123.456, 12);
    let b = ScaledNumber::new(987.654, 11);

    c.bench_function("scaled_add", |bench| {
        bench.iter(|| black_box(a) + black_box(b))
    });
    c.bench_function("scaled_mul", |bench| {
        bench.iter(|| black_box(a) * black_box(b))
    });
    c.bench_function("scaled_from_raw", |bench| {
        bench.iter(|| ScaledNumber::from_raw(black_box(6.02e23)))
    });
}

fn benchmark_formatting(c: &mut Criterion) {
    let value = ScaledNumber::new(42.5, 57);

    c.bench_function("format_compact", |bench| {
        bench.iter(|| black_box(value).format_compact(2))
    });
    c.bench_function("transport_round_trip", |bench| {
        bench.iter(|| {
            let text = black_box(value).to_transport_string();
            ScaledNumber::from_transport_string(&text)
        })
    });
}

fn benchmark_snapshot(c: &mut Criterion) {
    let definitions: Vec<CurrencyDefinition> = (0..64)
        .map(|i| CurrencyDefinition::new(format!("currency_{i}"), ScaledNumber::new(1.5, i)))
        .collect();
    let mut ledger: CurrencyLedger = CurrencyLedger::new(Box::new(MemoryStorage::new()));
    ledger.initialize(&definitions).expect("initialize ledger");
    let blob = ledger.save_all().expect("save ledger");

    c.bench_function("save_all_64", |bench| bench.iter(|| ledger.save_all()));
    c.bench_function("load_all_64", |bench| {
        bench.iter(|| ledger.load_all(black_box(&blob)))
    });
}

criterion_group!(
    benches,
    benchmark_arithmetic,
    benchmark_formatting,
    benchmark_snapshot
);
criterion_main!(benches);
