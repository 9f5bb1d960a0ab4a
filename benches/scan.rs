//! Benchmarks comparing sequential, naive and work-efficient scan and compaction

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use stream_compaction::{cpu, efficient, naive, Device, DeviceConfig};

const SIZES: [usize; 4] = [1 << 10, 1 << 14, 1 << 18, (1 << 18) - 3];

/// Random values in 0..50, roughly one in fifty of them zero
fn create_input(n: usize) -> Vec<i32> {
    let mut rng = ChaCha8Rng::seed_from_u64(n as u64);
    (0..n).map(|_| rng.gen_range(0..50)).collect()
}

fn bench_scan(c: &mut Criterion) {
    let device = Device::new(DeviceConfig::from_env()).unwrap();
    let mut group = c.benchmark_group("scan");

    for &n in &SIZES {
        let input = create_input(n);
        let mut output = vec![0; n];

        group.bench_with_input(BenchmarkId::new("cpu", n), &input, |b, input| {
            b.iter(|| cpu::scan(n, black_box(&mut output), black_box(input), None))
        });
        group.bench_with_input(BenchmarkId::new("naive", n), &input, |b, input| {
            b.iter(|| {
                naive::scan(&device, n, black_box(&mut output), black_box(input), None).unwrap()
            })
        });
        group.bench_with_input(BenchmarkId::new("efficient", n), &input, |b, input| {
            b.iter(|| {
                efficient::scan(&device, n, black_box(&mut output), black_box(input), None)
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_compact(c: &mut Criterion) {
    let device = Device::new(DeviceConfig::from_env()).unwrap();
    let mut group = c.benchmark_group("compact");

    for &n in &SIZES {
        let input = create_input(n);
        let mut output = vec![0; n];

        group.bench_with_input(BenchmarkId::new("cpu_without_scan", n), &input, |b, input| {
            b.iter(|| cpu::compact_without_scan(n, black_box(&mut output), black_box(input)))
        });
        group.bench_with_input(BenchmarkId::new("cpu_with_scan", n), &input, |b, input| {
            b.iter(|| cpu::compact_with_scan(n, black_box(&mut output), black_box(input)))
        });
        group.bench_with_input(BenchmarkId::new("efficient", n), &input, |b, input| {
            b.iter(|| {
                efficient::compact(&device, n, black_box(&mut output), black_box(input), None)
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scan, bench_compact);
criterion_main!(benches);
