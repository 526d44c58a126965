//! Property-based tests for discovery, scheduling, and distribution.
//!
//! Uses proptest to generate random block layouts on a small grid, then
//! verifies the structural invariants the managers promise.

use std::collections::BTreeSet;

use gridflow_core::capability::{Electrical, Fluid, Quantity};
use gridflow_core::config::EngineConfig;
use gridflow_core::discovery::discover_all;
use gridflow_core::host::NodeHost;
use gridflow_core::id::{BlockPos, MediumId};
use gridflow_core::manager::NetworkManager;
use gridflow_core::test_utils::*;
use proptest::prelude::*;

const SIDE: i32 = 6;

// ===========================================================================
// Generators
// ===========================================================================

/// One cell of a layout: 0 empty, 1 conductor, 2 source, 3 sink, 4 storage.
fn arb_layout() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(0..5u8, (SIDE * SIDE) as usize)
}

fn arb_fluid_layout() -> impl Strategy<Value = Vec<(u8, u16, i64)>> {
    proptest::collection::vec((0..3u8, 0..2u16, 0..200i64), (SIDE * SIDE) as usize)
}

fn cell_pos(i: usize) -> BlockPos {
    pos(i as i32 % SIDE, 0, i as i32 / SIDE)
}

fn build_electric(layout: &[u8]) -> MapHost {
    let mut host = MapHost::new();
    for (i, cell) in layout.iter().enumerate() {
        let p = cell_pos(i);
        match cell {
            1 => host.place(p, TestCell::conductor()),
            2 => host.place(p, TestCell::source(120.0, 3.0 + i as f64)),
            3 => host.place(p, TestCell::sink(1.0 + (i % 7) as f64)),
            4 => host.place(p, TestCell::storage(48.0, 2.5)),
            _ => {}
        }
    }
    host
}

fn build_fluid(layout: &[(u8, u16, i64)]) -> MapHost {
    let mut host = MapHost::new();
    for (i, &(cell, medium, amount)) in layout.iter().enumerate() {
        let p = cell_pos(i);
        match cell {
            1 => host.place(p, TestTank::pipe(MediumId(medium))),
            2 => host.place(p, TestTank::new(MediumId(medium), 200, amount).with_rate(37)),
            _ => {}
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

fn member_sets<I>(sets: I) -> BTreeSet<BTreeSet<BlockPos>>
where
    I: IntoIterator<Item = BTreeSet<BlockPos>>,
{
    sets.into_iter().collect()
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every node is in exactly one component, and components are closed
    /// under adjacency.
    #[test]
    fn discovery_partitions_nodes(layout in arb_layout()) {
        let host = build_electric(&layout);
        let components = discover_all::<Electrical, _>(&host);
        let nodes = NodeHost::<Electrical>::nodes(&host);

        let total: usize = components.iter().map(|c| c.len()).sum();
        prop_assert_eq!(total, nodes.len());

        let mut seen = BTreeSet::new();
        for component in &components {
            for &p in &component.members {
                prop_assert!(seen.insert(p), "node {:?} in two components", p);
                for n in NodeHost::<Electrical>::neighbors(&host, p) {
                    prop_assert!(component.contains(n));
                }
            }
        }
    }

    /// Fluid components never mix media.
    #[test]
    fn fluid_components_are_single_medium(layout in arb_fluid_layout()) {
        let host = build_fluid(&layout);
        for component in discover_all::<Fluid, _>(&host) {
            for &p in &component.members {
                let tank = host.get::<TestTank>(p).unwrap();
                prop_assert_eq!(tank.medium, component.partition);
            }
        }
    }

    /// Running discovery twice on an unchanged graph yields the same sets.
    #[test]
    fn discovery_is_idempotent(layout in arb_layout()) {
        let host = build_electric(&layout);
        let first = member_sets(discover_all::<Electrical, _>(&host).into_iter().map(|c| c.members));
        let second = member_sets(discover_all::<Electrical, _>(&host).into_iter().map(|c| c.members));
        prop_assert_eq!(first, second);
    }

    /// No tick ever assigns more than `min(supply, demand)` on either side.
    #[test]
    fn distribution_never_over_allocates(layout in arb_layout(), ticks in 1..5u64) {
        let mut host = build_electric(&layout);
        let mut manager = NetworkManager::<Electrical>::new(&instant());
        manager.mark_dirty_all();
        for tick in 0..ticks {
            let report = manager.step(&mut host, tick);
            for (_, flow) in &report.flows {
                prop_assert!(flow.flow <= flow.total_supply.smaller(flow.total_demand));
                prop_assert!(flow.sink_shares <= flow.flow);
                prop_assert!(flow.source_shares <= flow.flow);
                prop_assert!(flow.delivered <= flow.sink_shares);
            }
        }
    }

    /// Integer fluid allocation obeys the same bounds. Sources and sinks are
    /// truncated independently, so the net volume drift of one tick is below
    /// one millibucket per source share.
    #[test]
    fn fluid_rounding_drift_is_bounded(layout in arb_fluid_layout()) {
        let mut host = build_fluid(&layout);
        let before: i64 = layout.iter().filter(|c| c.0 == 2).map(|c| c.2).sum();
        let mut manager = NetworkManager::<Fluid>::new(&instant());
        manager.mark_dirty_all();
        let report = manager.step(&mut host, 0);
        let mut sources = 0i64;
        for (_, flow) in &report.flows {
            prop_assert!(flow.sink_shares <= flow.flow);
            prop_assert!(flow.source_shares <= flow.flow);
            prop_assert!(flow.residual >= 0);
            sources += flow.sources as i64;
        }
        let after: i64 = layout
            .iter()
            .enumerate()
            .filter(|(_, c)| c.0 == 2)
            .map(|(i, _)| host.get::<TestTank>(cell_pos(i)).unwrap().amount)
            .sum();
        prop_assert!(after - before <= sources);
    }

    /// After removals are marked and the debounce window has elapsed, the
    /// incrementally maintained networks match a fresh full discovery.
    #[test]
    fn incremental_rebuild_matches_full_discovery(
        layout in arb_layout(),
        removals in proptest::collection::vec(0..(SIDE * SIDE) as usize, 1..6),
    ) {
        let mut host = build_electric(&layout);
        let mut manager = NetworkManager::<Electrical>::new(&instant());
        manager.mark_dirty_all();
        manager.step(&mut host, 0);

        for &i in &removals {
            let p = cell_pos(i);
            if host.remove(p).is_some() {
                manager.mark_dirty(p);
                for n in p.neighbors() {
                    manager.mark_dirty(n);
                }
            }
        }
        let mut tick = 1;
        while manager.tracker().is_dirty() {
            manager.step(&mut host, tick);
            tick += 1;
        }

        let expected = member_sets(discover_all::<Electrical, _>(&host).into_iter().map(|c| c.members));
        let actual = member_sets(manager.networks().map(|n| n.members().clone()));
        prop_assert_eq!(actual, expected);
    }

    /// A burst of marks never releases more than the budget in one step.
    #[test]
    fn rebuilds_respect_budget(layout in arb_layout(), budget in 1..4usize) {
        let mut host = build_electric(&layout);
        let config = EngineConfig {
            debounce_ticks: 0,
            max_rebuilds_per_step: budget,
            requeue_delay: 1,
            ..Default::default()
        };
        let mut manager = NetworkManager::<Electrical>::new(&config);
        for i in 0..layout.len() {
            manager.mark_dirty(cell_pos(i));
        }
        let mut tick = 0;
        while manager.tracker().is_dirty() && tick < 200 {
            let report = manager.step(&mut host, tick);
            prop_assert!(report.rebuilt_origins <= budget);
            tick += 1;
        }
        prop_assert!(!manager.tracker().is_dirty());
    }
}
