use chrono::{Duration, NaiveDate};
use consumption_prep::preprocessing::{FeaturePipeline, PipelineConfig};
use consumption_prep::timeseries::{smooth, SmoothingSpec};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array1;
use polars::prelude::*;
use rand::prelude::*;

fn create_raw_dataframe(n_rows: usize, offset: usize) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(7);
    let origin = NaiveDate::from_ymd_opt(2016, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    let stamps: Vec<String> = (0..n_rows)
        .map(|i| {
            (origin + Duration::hours((offset + i) as i64))
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .collect();
    let mut noise = |base: f64, spread: f64| -> Vec<f64> {
        (0..n_rows)
            .map(|_| base + rng.gen_range(-spread..spread))
            .collect()
    };
    let temp_1 = noise(12.0, 8.0);
    let temp_2 = noise(14.0, 8.0);
    let humidity_1 = noise(70.0, 20.0);
    let humidity_2 = noise(65.0, 20.0);
    let national = noise(13.0, 6.0);
    let secondary_1 = noise(400.0, 150.0);
    let secondary_2 = noise(250.0, 100.0);
    let secondary_3 = noise(320.0, 120.0);
    let loc = vec![0.0; n_rows];

    df!(
        "timestamp" => &stamps,
        "loc_1" => &loc,
        "loc_2" => &loc,
        "loc_secondary_1" => &loc,
        "loc_secondary_2" => &loc,
        "loc_secondary_3" => &loc,
        "temp_1" => &temp_1,
        "temp_2" => &temp_2,
        "humidity_1" => &humidity_1,
        "humidity_2" => &humidity_2,
        "mean_national_temp" => &national,
        "consumption_secondary_1" => &secondary_1,
        "consumption_secondary_2" => &secondary_2,
        "consumption_secondary_3" => &secondary_3,
    )
    .unwrap()
}

fn create_targets(n_rows: usize) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(11);
    let c1: Vec<f64> = (0..n_rows).map(|_| rng.gen_range(100.0..900.0)).collect();
    let c2: Vec<f64> = (0..n_rows).map(|_| rng.gen_range(50.0..600.0)).collect();
    df!("consumption_1" => &c1, "consumption_2" => &c2).unwrap()
}

fn bench_smoothing(c: &mut Criterion) {
    let mut group = c.benchmark_group("smoothing");
    let mut rng = StdRng::seed_from_u64(3);

    for n_rows in [1_000, 10_000, 50_000].iter() {
        let series: Array1<f64> = (0..*n_rows).map(|_| rng.gen_range(-5.0..25.0)).collect();

        group.bench_with_input(BenchmarkId::new("week_window", n_rows), &series, |b, s| {
            b.iter(|| smooth(black_box(s), &SmoothingSpec::default()).unwrap())
        });
    }

    group.finish();
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process");
    group.sample_size(20);

    for n_rows in [1_000, 10_000].iter() {
        let df = create_raw_dataframe(*n_rows, 0);

        group.bench_with_input(BenchmarkId::new("single_table", n_rows), &df, |b, df| {
            let pipeline = FeaturePipeline::new();
            b.iter(|| pipeline.process(black_box(df)).unwrap())
        });
    }

    group.finish();
}

fn bench_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("run");
    group.sample_size(10);

    let train = create_raw_dataframe(8_760, 0);
    let test = create_raw_dataframe(2_000, 8_760);
    let targets = create_targets(8_760);

    for (name, config) in [
        ("baseline", PipelineConfig::baseline()),
        ("extended", PipelineConfig::extended()),
    ] {
        let pipeline = FeaturePipeline::with_config(config);
        group.bench_function(name, |b| {
            b.iter(|| {
                pipeline
                    .run(black_box(&train), black_box(&test), black_box(&targets))
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_smoothing, bench_process, bench_run);
criterion_main!(benches);
