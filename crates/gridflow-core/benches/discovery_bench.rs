//! Criterion benchmarks for discovery and network ticking.
//!
//! Three benchmark groups:
//! - `discovery`: full flood of a 64x64 cable sheet with scattered loads
//! - `incremental`: one removal in the sheet, rebuilt from its neighbours
//! - `distribution`: one tick of a single network with 1000 participants

use criterion::{Criterion, criterion_group, criterion_main};
use gridflow_core::capability::Electrical;
use gridflow_core::config::EngineConfig;
use gridflow_core::discovery::discover_all;
use gridflow_core::manager::NetworkManager;
use gridflow_core::test_utils::*;

// ===========================================================================
// Layout builders
// ===========================================================================

/// A flat sheet of conductors with a source in one corner and a load every
/// seventh cell.
fn build_sheet(side: i32) -> MapHost {
    let mut host = MapHost::new();
    for x in 0..side {
        for z in 0..side {
            let p = pos(x, 0, z);
            if x == 0 && z == 0 {
                host.place(p, TestCell::source(240.0, 1_000.0));
            } else if (x * side + z) % 7 == 0 {
                host.place(p, TestCell::sink(1.5));
            } else {
                host.place(p, TestCell::conductor());
            }
        }
    }
    host
}

fn instant() -> EngineConfig {
    EngineConfig {
        debounce_ticks: 0,
        ..Default::default()
    }
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_discovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("discovery");
    group.sample_size(30);

    let host = build_sheet(64);
    group.bench_function("full_flood_64x64", |b| {
        b.iter(|| discover_all::<Electrical, _>(&host));
    });

    group.finish();
}

fn bench_incremental(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental");
    group.sample_size(30);

    group.bench_function("remove_and_rebuild_64x64", |b| {
        b.iter_batched(
            || {
                let mut host = build_sheet(64);
                let mut manager = NetworkManager::<Electrical>::new(&instant());
                manager.mark_dirty_all();
                manager.step(&mut host, 0);
                host.remove(pos(32, 0, 32));
                for n in pos(32, 0, 32).neighbors() {
                    manager.mark_dirty(n);
                }
                (host, manager)
            },
            |(mut host, mut manager)| {
                manager.step(&mut host, 1);
                manager.step(&mut host, 2);
            },
            criterion::BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn bench_distribution(c: &mut Criterion) {
    let mut group = c.benchmark_group("distribution");
    group.sample_size(50);

    let mut host = MapHost::new();
    for x in 0..1000 {
        let cell = match x % 3 {
            0 => TestCell::source(120.0, 5.0),
            1 => TestCell::sink(4.0),
            _ => TestCell::storage(48.0, 2.0),
        };
        host.place(pos(x, 0, 0), cell);
    }
    let mut manager = NetworkManager::<Electrical>::new(&instant());
    manager.mark_dirty_all();
    manager.step(&mut host, 0);

    let mut tick = 1;
    group.bench_function("tick_1000_participants", |b| {
        b.iter(|| {
            manager.step(&mut host, tick);
            tick += 1;
        });
    });

    group.finish();
}

criterion_group!(benches, bench_discovery, bench_incremental, bench_distribution);
criterion_main!(benches);
