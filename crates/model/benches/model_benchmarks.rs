//! Benchmarks for resmom-model pipeline stages.
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use polars::prelude::*;
use rand::Rng;
use resmom_model::{
    FactorModelFitter, MomentumScorer, ResidualComputer, ResidualMomentumPipeline,
    compute_returns, symbol_columns,
};
use resmom_primitives::Date;

fn month_starts(n_months: usize) -> Vec<Date> {
    (0..n_months)
        .filter_map(|i| Date::from_ymd_opt(2000 + (i / 12) as i32, (i % 12) as u32 + 1, 1))
        .collect()
}

fn random_factors(n_months: usize) -> DataFrame {
    let mut rng = rand::thread_rng();
    let mut series = |scale: f64| -> Vec<f64> {
        (0..n_months).map(|_| (rng.r#gen::<f64>() - 0.5) * scale).collect()
    };
    let mkt = series(0.08);
    let smb = series(0.04);
    let hml = series(0.04);
    DataFrame::new(vec![
        Column::new("date".into(), month_starts(n_months)),
        Column::new("mkt_rf".into(), mkt),
        Column::new("smb".into(), smb),
        Column::new("hml".into(), hml),
    ])
    .unwrap()
}

fn random_prices(n_months: usize, n_assets: usize) -> DataFrame {
    let mut rng = rand::thread_rng();
    let mut columns = vec![Column::new("date".into(), month_starts(n_months))];
    for j in 0..n_assets {
        let mut price = 50.0 + rng.r#gen::<f64>() * 100.0;
        let path: Vec<f64> = (0..n_months)
            .map(|_| {
                price *= 1.0 + (rng.r#gen::<f64>() - 0.48) * 0.1;
                price
            })
            .collect();
        columns.push(Column::new(format!("T{j:04}").into(), path));
    }
    DataFrame::new(columns).unwrap()
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("factor_model_fit");
    group.sample_size(30);

    // 5 years of monthly history
    let n_months = 60;
    for n_assets in [10, 100, 500] {
        group.throughput(Throughput::Elements(n_assets as u64));
        group.bench_with_input(BenchmarkId::new("n_assets", n_assets), &n_assets, |b, &n| {
            let returns = compute_returns(&random_prices(n_months, n)).unwrap();
            let factors = random_factors(n_months);
            let symbols = symbol_columns(&returns);
            let fitter = FactorModelFitter::new();

            b.iter(|| fitter.fit(black_box(&returns), black_box(&factors), &symbols).unwrap());
        });
    }

    group.finish();
}

fn bench_residuals_and_scores(c: &mut Criterion) {
    let mut group = c.benchmark_group("residuals_and_scores");
    group.sample_size(30);

    let n_months = 60;
    for n_assets in [10, 100, 500] {
        group.throughput(Throughput::Elements(n_assets as u64));
        group.bench_with_input(BenchmarkId::new("n_assets", n_assets), &n_assets, |b, &n| {
            let returns = compute_returns(&random_prices(n_months, n)).unwrap();
            let factors = random_factors(n_months);
            let symbols = symbol_columns(&returns);
            let models = FactorModelFitter::new().fit(&returns, &factors, &symbols).unwrap().value;
            let computer = ResidualComputer::new();
            let scorer = MomentumScorer::new();

            b.iter(|| {
                let residuals = computer
                    .compute(black_box(&returns), black_box(&factors), &models)
                    .unwrap()
                    .value;
                scorer.score(&residuals)
            });
        });
    }

    group.finish();
}

fn bench_pipeline_history_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_history_length");
    group.sample_size(20);

    let n_assets = 100;
    // 3, 10 and 30 years
    for n_months in [36, 120, 360] {
        group.bench_with_input(BenchmarkId::new("n_months", n_months), &n_months, |b, &m| {
            let prices = random_prices(m, n_assets);
            let factors = random_factors(m);
            let pipeline = ResidualMomentumPipeline::new();

            b.iter(|| pipeline.run(black_box(&prices), black_box(&factors), None).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fit, bench_residuals_and_scores, bench_pipeline_history_length);
criterion_main!(benches);
