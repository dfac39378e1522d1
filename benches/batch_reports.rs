use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use soil_report_rust::ingest::build_reports;
use soil_report_rust::{ReportGenerator, SoilParameter, SoilSample};

fn samples(count: usize) -> Vec<SoilSample> {
    (0..count)
        .map(|i| {
            let step = (i % 10) as f64;
            SoilSample::new(format!("BENCH-{:05}", i))
                .with_reading(SoilParameter::Ph, 5.5 + step * 0.2)
                .with_reading(SoilParameter::AvailableP, 20.0 + step * 8.0)
                .with_reading(SoilParameter::ExchangeableK, 60.0 + step * 20.0)
                .with_reading(SoilParameter::Calcium, 350.0 + step * 70.0)
                .with_reading(SoilParameter::Zinc, 0.05 + step)
                .with_reading(SoilParameter::OrganicMatter, 1.2 + step * 0.1)
        })
        .collect()
}

fn bench_build_reports(c: &mut Criterion) {
    let generator = ReportGenerator::new();
    let mut group = c.benchmark_group("build_reports");

    for count in [50, 1_000, 10_000] {
        let input = samples(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &input, |b, input| {
            b.iter(|| build_reports(black_box(input), &generator))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build_reports);
criterion_main!(benches);
