use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ppi_power::analysis::{cheap_pair, powerful_pair};
use ppi_power::{Costs, MeanPower, PowerParams};

fn pilot(n: usize, big_n: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let y: Vec<f64> = (0..n).map(|i| (i % 17) as f64).collect();
    let yhat: Vec<f64> = y
        .iter()
        .enumerate()
        .map(|(i, v)| v + ((i % 5) as f64 - 2.0) * 0.3)
        .collect();
    let yhat_unlabeled: Vec<f64> = (0..big_n).map(|i| ((i * 7) % 17) as f64).collect();
    (y, yhat, yhat_unlabeled)
}

fn bench_mean_power(c: &mut Criterion) {
    let mut group = c.benchmark_group("mean_power");
    group.sample_size(20);

    let (y, yhat, yhat_unlabeled) = pilot(1_000, 50_000);
    group.bench_function("budget_from_pilot", |b| {
        b.iter(|| {
            let alloc = MeanPower::new(10.0, 1.0)
                .budget(10_000.0)
                .run(black_box(&y), black_box(&yhat), black_box(&yhat_unlabeled));
            black_box(alloc)
        });
    });

    let params = PowerParams::from_scalars(1.0, 0.64);
    let costs = Costs::new(10.0, 1.0);
    group.bench_function("powerful_pair", |b| {
        b.iter(|| black_box(powerful_pair(&params, &costs, black_box(10_000.0))));
    });
    group.bench_function("cheap_pair", |b| {
        b.iter(|| black_box(cheap_pair(&params, &costs, black_box(0.03))));
    });
    group.finish();
}

criterion_group!(benches, bench_mean_power);
criterion_main!(benches);
