/* benches/kernel_ops.rs */
/*▫~•◦────────────────────────────────────────────────────────────────────────────────────‣
 * © 2025 ArcMoon Studios ◦ SPDX-License-Identifier MIT OR Apache-2.0 ◦ Author: Lord Xyn ✶
 *///◦────────────────────────────────────────────────────────────────────────────────────‣

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use specula::{
    rotate_algebraic, AlgebraicState, Complex, RotationConvention, SpeculativeKernel, StateVector,
};
use std::sync::Arc;
use std::thread;

/// Rotation and interaction on three-dimensional states
fn bench_state_vector(c: &mut Criterion) {
    let mut group = c.benchmark_group("state_vector");

    for convention in [RotationConvention::FullAngle, RotationConvention::HalfAngle] {
        group.bench_with_input(
            BenchmarkId::new("rotate", format!("{convention:?}")),
            &convention,
            |b, &convention| {
                let mut state = StateVector::seeded(3, 42).unwrap();
                b.iter(|| {
                    state
                        .rotate_with(black_box([1.0, 0.5, 0.25]), black_box(0.031), convention)
                        .unwrap();
                })
            },
        );
    }

    group.bench_function("interact", |b| {
        let mut left = StateVector::seeded(3, 1).unwrap();
        let mut right = StateVector::seeded(3, 2).unwrap();
        b.iter(|| black_box(left.interact(&mut right).unwrap()))
    });

    group.finish();
}

/// Quaternion product and component-wise rotation
fn bench_algebraic(c: &mut Criterion) {
    let mut group = c.benchmark_group("algebraic");
    let p = AlgebraicState::new(
        Complex::new(0.5, 0.1),
        Complex::new(-0.3, 0.7),
        Complex::new(0.2, -0.4),
        Complex::new(0.9, 0.0),
    );
    let q = p.conjugate();

    group.bench_function("multiply", |b| b.iter(|| black_box(black_box(p).multiply(&black_box(q)))));
    group.bench_function("rotate_algebraic", |b| {
        b.iter(|| black_box(rotate_algebraic(black_box(&p), [0.0, 0.0, 1.0], 0.5)))
    });
    group.finish();
}

/// Contended appends into a single arena
fn bench_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena_allocation");
    let snapshot = StateVector::seeded(3, 7).unwrap().snapshot();

    for &writers in &[1usize, 2, 4, 8] {
        let per_writer = 1_000;
        group.throughput(Throughput::Elements((writers * per_writer) as u64));
        group.bench_with_input(BenchmarkId::new("writers", writers), &writers, |b, &writers| {
            b.iter(|| {
                let kernel = Arc::new(SpeculativeKernel::with_defaults());
                kernel.create_arena("bench");
                let handles: Vec<_> = (0..writers)
                    .map(|_| {
                        let handle = kernel.handle();
                        let snapshot = snapshot.clone();
                        thread::spawn(move || {
                            for _ in 0..per_writer {
                                handle.allocate("bench", snapshot.clone());
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
                black_box(kernel.arena_len("bench"))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_state_vector, bench_algebraic, bench_allocation);
criterion_main!(benches);
