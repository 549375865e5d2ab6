//! Benchmarks for filter performance

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use head_gesture_control::filters::ExponentialFilter;

fn benchmark_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters");

    // Test data - simulating noisy yaw readings in degrees
    let test_data: Vec<f64> = (0..100)
        .map(|i| {
            let t = f64::from(i) * 0.1;
            15.0 * t.cos() + 0.5 * rand::random::<f64>()
        })
        .collect();

    for alpha in [0.2, 0.5, 0.8] {
        let mut filter = ExponentialFilter::new(alpha);

        group.bench_with_input(BenchmarkId::new("single_update", alpha), &test_data[0], |b, &yaw| {
            b.iter(|| black_box(filter.apply(black_box(yaw))));
        });

        group.bench_with_input(BenchmarkId::new("sequence_100", alpha), &test_data, |b, data| {
            b.iter(|| {
                filter.reset();
                for &yaw in data {
                    black_box(filter.apply(black_box(yaw)));
                }
            });
        });
    }

    group.finish();
}

fn benchmark_filter_reset(c: &mut Criterion) {
    let mut filter = ExponentialFilter::default();
    filter.apply(10.0);

    c.bench_function("filter_reset", |b| {
        b.iter(|| {
            filter.reset();
            black_box(filter.value())
        });
    });
}

criterion_group!(benches, benchmark_filters, benchmark_filter_reset);
criterion_main!(benches);
