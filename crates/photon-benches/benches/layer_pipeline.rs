// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
// criterion_group!/criterion_main! expand to undocumented functions that cannot
// carry #[allow] (attributes on macro invocations are ignored). Crate-level
// suppress is required for benchmark binaries using Criterion.
#![allow(missing_docs)]
//! Per-layer hot paths on a full-size 1440×2560 layer.
//!
//! # Running
//!
//! ```sh
//! cargo bench --package photon-benches --bench layer_pipeline
//! ```
//!
//! - `reduce`: two-pass island reduction on a freshly classified layer
//! - `pack` / `unpack`: layer RLE in both directions
//! - `analyze_layers`: reduction plus packing across a stack of layers, by
//!   worker count
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use photon_file::{analyze_layers, island, rle, LayerBitmap};

const WIDTH: u32 = 1440;
const HEIGHT: u32 = 2560;

/// Supported pillars on a 64 px grid, each with an island skirt that is
/// reachable from the pillar, plus a band of unreachable specks.
fn synthetic_layer() -> LayerBitmap {
    let mut b = LayerBitmap::new(WIDTH, HEIGHT);
    for cy in (32..HEIGHT - 32).step_by(64) {
        for cx in (32..WIDTH - 32).step_by(64) {
            for y in cy - 8..cy + 8 {
                for x in cx - 8..cx + 8 {
                    b.mark_supported(x, y);
                }
            }
            for y in cy - 16..cy + 16 {
                for x in cx - 16..cx + 16 {
                    if b.state(x, y) == photon_file::PixelState::Off {
                        b.mark_island(x, y);
                    }
                }
            }
        }
    }
    for x in (0..WIDTH).step_by(7) {
        b.mark_island(x, HEIGHT - 1);
    }
    b
}

fn bench_reduce(c: &mut Criterion) {
    let layer = synthetic_layer();
    let mut group = c.benchmark_group("reduce");
    group.throughput(Throughput::Elements(u64::from(WIDTH * HEIGHT)));
    group.bench_function("1440x2560", |b| {
        b.iter_batched(
            || layer.clone(),
            |mut l| island::reduce(&mut l),
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn bench_rle(c: &mut Criterion) {
    let mut layer = synthetic_layer();
    island::reduce(&mut layer);
    let packed = rle::pack(&layer);
    let mut group = c.benchmark_group("rle");
    group.throughput(Throughput::Elements(u64::from(WIDTH * HEIGHT)));
    group.bench_function("pack", |b| b.iter(|| rle::pack(&layer)));
    group.bench_function("unpack", |b| {
        b.iter(|| rle::unpack(&packed, WIDTH, HEIGHT));
    });
    group.finish();
}

fn bench_analyze(c: &mut Criterion) {
    let stack: Vec<_> = (0..16).map(|_| synthetic_layer()).collect();
    let mut group = c.benchmark_group("analyze_layers");
    group.sample_size(10);
    for workers in [1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &w| {
            b.iter_batched(
                || stack.clone(),
                |mut layers| analyze_layers(&mut layers, w),
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_reduce, bench_rle, bench_analyze);
criterion_main!(benches);
