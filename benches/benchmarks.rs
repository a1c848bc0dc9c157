use criterion::{black_box, criterion_group, criterion_main, Criterion};
use num_complex::Complex64;
use numseq::{plan_for, RealSeq, Sequence};

fn bench_fft(c: &mut Criterion) {
    let mut group = c.benchmark_group("fft");
    for &n in &[64usize, 360, 1021, 4096] {
        let plan = plan_for(n);
        let mut data: Vec<Complex64> = (0..n)
            .map(|k| Complex64::new((k % 17) as f64, (k % 5) as f64))
            .collect();
        group.bench_function(format!("execute/{}", n), |b| {
            b.iter(|| plan.execute(black_box(&mut data)))
        });
    }
    group.finish();
}

fn bench_sequences(c: &mut Criterion) {
    let mut group = c.benchmark_group("seq");
    group.bench_function("fused_map_filter_sum", |b| {
        b.iter(|| {
            RealSeq::range(1, 10_000)
                .filter(|x| x % 3.0 != 0.0)
                .map(|x| x * x)
                .sum()
        })
    });

    let stored = RealSeq::from_values((0..10_000).map(|i| i as f64 * 0.25).collect());
    group.bench_function("vector_dot", |b| {
        b.iter(|| black_box(stored.clone().dot(stored.clone())))
    });
    group.finish();
}

criterion_group!(benches, bench_fft, bench_sequences);
criterion_main!(benches);
