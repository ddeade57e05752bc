//! Benchmarks for the SMA and the crossover signal series.

use chrono::DateTime;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trading_core::traits::Indicator;
use trading_core::types::PriceBar;
use trading_indicators::Sma;
use trading_strategies::compute_signals;

fn generate_test_data(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 1.08 + (i as f64 * 0.1).sin() * 0.01)
        .collect()
}

fn generate_bars(size: usize) -> Vec<PriceBar> {
    generate_test_data(size)
        .into_iter()
        .enumerate()
        .filter_map(|(i, close)| {
            DateTime::from_timestamp(1_700_000_000 + i as i64 * 60, 0)
                .map(|ts| PriceBar::new(ts, close))
        })
        .collect()
}

fn benchmark_sma(c: &mut Criterion) {
    let mut group = c.benchmark_group("SMA");

    for size in [100, 1000, 10000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("compact", size), &data, |b, data| {
            let sma = Sma::new(10);
            b.iter(|| sma.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("aligned", size), &data, |b, data| {
            let sma = Sma::new(10);
            b.iter(|| sma.calculate_aligned(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_signals(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_signals");

    for size in [100, 1000, 10000].iter() {
        let bars = generate_bars(*size);

        group.bench_with_input(BenchmarkId::new("5/10", size), &bars, |b, bars| {
            b.iter(|| compute_signals(black_box(bars), 5, 10))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_sma, benchmark_signals);
criterion_main!(benches);
