//! Integration test: debounced, budgeted rebuild scheduling.
//!
//! Uses the default engine configuration (4 tick debounce, 2 rebuilds per
//! step) against a real world, so every edit goes through the world's dirty
//! signals rather than direct `mark_dirty` calls.

use gridflow_core::config::EngineConfig;
use gridflow_core::event::NetworkEvent;
use gridflow_core::fixed::Fixed64;
use gridflow_core::id::{BlockPos, ChunkPos, ResourceKind};
use gridflow_fluid::medium::WATER;
use gridflow_fluid::{ElectricPump, Pipe};
use gridflow_spatial::{GridWorld, Simulation, SimulationReport};

fn settled_sim() -> Simulation {
    let mut world = GridWorld::new();
    world.load_chunk(ChunkPos::new(0, 0));
    let mut sim = Simulation::with_world(world, &EngineConfig::default()).unwrap();
    // The initial rescan is debounced like any other rebuild.
    sim.run(4);
    assert!(!sim.registry().fluid().tracker().is_dirty());
    sim
}

fn formed(report: &SimulationReport, kind: ResourceKind) -> usize {
    report
        .networks
        .events()
        .filter(|e| matches!(e, NetworkEvent::Formed { .. }) && e.kind() == kind)
        .count()
}

#[test]
fn burst_of_edits_rebuilds_once() {
    let mut sim = settled_sim();
    let p = BlockPos::new(3, 0, 3);
    let mut rebuilds = 0;
    let mut networks_formed = 0;

    // Place, then pull and re-place the same pipe on each of the next ticks.
    for i in 0..3 {
        if i > 0 {
            sim.world_mut().remove(p).unwrap();
        }
        sim.world_mut().place(p, Pipe::new(WATER)).unwrap();
        let report = sim.step();
        rebuilds += report.networks.fluid.rebuilt_origins;
        networks_formed += formed(&report, ResourceKind::Fluid);
    }
    assert_eq!(rebuilds, 0);

    for _ in 0..6 {
        let report = sim.step();
        rebuilds += report.networks.fluid.rebuilt_origins;
        networks_formed += formed(&report, ResourceKind::Fluid);
    }
    assert_eq!(rebuilds, 1);
    assert_eq!(networks_formed, 1);
    assert_eq!(sim.registry().networks(ResourceKind::Fluid).len(), 1);
}

#[test]
fn rebuilds_per_step_respect_budget() {
    let mut sim = settled_sim();
    for i in 0..5 {
        sim.world_mut()
            .place(BlockPos::new(i * 2, 0, 0), Pipe::new(WATER))
            .unwrap();
    }

    let mut total = 0;
    for _ in 0..20 {
        let report = sim.step();
        assert!(report.networks.fluid.rebuilt_origins <= 2);
        assert!(!report.networks.fluid.rescanned);
        total += report.networks.fluid.rebuilt_origins;
    }
    assert_eq!(total, 5);
    assert_eq!(sim.registry().networks(ResourceKind::Fluid).len(), 5);
    assert!(!sim.registry().fluid().tracker().is_dirty());
}

#[test]
fn over_budget_origins_are_requeued_not_lost() {
    let mut sim = settled_sim();
    for i in 0..3 {
        sim.world_mut()
            .place(BlockPos::new(i * 2, 0, 0), Pipe::new(WATER))
            .unwrap();
    }
    sim.run(3);
    assert_eq!(sim.registry().fluid().tracker().pending(), 3);

    let report = sim.step();
    assert_eq!(report.networks.fluid.rebuilt_origins, 2);
    let tracker = sim.registry().fluid().tracker();
    assert_eq!(tracker.pending(), 1);
    assert!(tracker.is_pending(BlockPos::new(4, 0, 0)));
    assert!(tracker.entries().all(|e| e.countdown == EngineConfig::default().requeue_delay));
}

#[test]
fn kinds_are_scheduled_independently() {
    let mut sim = settled_sim();
    let p = BlockPos::new(0, 0, 0);
    sim.world_mut()
        .place(p, ElectricPump::new(WATER, 100, Fixed64::from_num(10)))
        .unwrap();
    sim.step();
    assert!(sim.registry().electrical().tracker().is_pending(p));
    assert!(sim.registry().fluid().tracker().is_pending(p));

    // A full rescan of one kind leaves the other's queue alone.
    sim.registry_mut().electrical_mut().mark_dirty_all();
    assert!(sim.registry().electrical().tracker().rescan_pending());
    assert!(!sim.registry().fluid().tracker().rescan_pending());
    assert!(sim.registry().fluid().tracker().is_pending(p));

    let reports: Vec<SimulationReport> = (0..4).map(|_| sim.step()).collect();
    assert_eq!(reports[2].networks.fluid.rebuilt_origins, 1);
    assert!(reports[3].networks.electrical.rescanned);
    assert!(reports.iter().all(|r| !r.networks.fluid.rescanned));
    assert!(sim.registry().network_of(p, ResourceKind::Electrical).is_some());
    assert!(sim.registry().network_of(p, ResourceKind::Fluid).is_some());
}
