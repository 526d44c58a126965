//! Power network example: discovery, proportional sharing, a breaker trip,
//! and recovery.
//!
//! Builds a small world with a generator, a battery, two loads, and a
//! circuit breaker, then steps it while printing each network's flow.
//! Overloading the breaker splits the network; resetting it merges the
//! halves again.
//!
//! Run with: `RUST_LOG=debug cargo run -p gridflow-examples --example power_network`

use gridflow_core::config::EngineConfig;
use gridflow_core::fixed::Fixed64;
use gridflow_core::id::{BlockPos, ChunkPos, ResourceKind};
use gridflow_power::{Battery, Cable, CircuitBreaker, Generator, Load};
use gridflow_spatial::{GridWorld, Simulation};
use log::info;

fn at(x: i32) -> BlockPos {
    BlockPos::new(x, 0, 0)
}

fn print_networks(sim: &Simulation) {
    for net in sim.registry().networks(ResourceKind::Electrical) {
        match &net.last_flow {
            Some(flow) => println!(
                "  network {:?}: {} members, supply={:.1} A, demand={:.1} A, flow={:.1} A",
                net.id, net.size, flow.supply, flow.demand, flow.flow
            ),
            None => println!("  network {:?}: {} members, not yet ticked", net.id, net.size),
        }
    }
}

fn main() {
    env_logger::init();

    // Generator -- cable -- battery -- cable -- breaker -- cable -- lamp
    //                                                  \-- furnace (above)
    let mut world = GridWorld::new();
    world.load_chunk(ChunkPos::new(0, 0));
    world
        .place(at(0), Generator::new(Fixed64::from_num(240), Fixed64::from_num(40)))
        .unwrap();
    world.place(at(1), Cable::default()).unwrap();
    world
        .place(
            at(2),
            Battery::new(Fixed64::from_num(48), Fixed64::from_num(400), Fixed64::from_num(20)),
        )
        .unwrap();
    world.place(at(3), Cable::default()).unwrap();
    world.place(at(4), CircuitBreaker::new(Fixed64::from_num(45))).unwrap();
    world.place(at(5), Cable::default()).unwrap();
    world.place(at(6), Load::new(Fixed64::from_num(10))).unwrap();
    world
        .place(BlockPos::new(5, 1, 0), Load::new(Fixed64::from_num(20)))
        .unwrap();

    let mut sim = Simulation::with_world(world, &EngineConfig::default()).unwrap();

    // --- Scenario 1: normal operation ---

    println!("=== Scenario 1: Normal operation ===\n");
    for _ in 0..8 {
        let report = sim.step();
        for event in report.networks.events() {
            println!("  Event: {:?}", event);
        }
        let lamp = sim.world().get::<Load>(at(6)).unwrap();
        let battery = sim.world().get::<Battery>(at(2)).unwrap();
        println!(
            "Tick {}: lamp satisfaction={:.2}, battery charge={:.1}",
            report.tick,
            lamp.satisfaction(),
            battery.charge
        );
    }
    print_networks(&sim);

    // --- Scenario 2: overload trips the breaker ---

    println!("\n=== Scenario 2: Overload ===\n");
    sim.world_mut()
        .place(BlockPos::new(6, 1, 0), Load::new(Fixed64::from_num(30)))
        .unwrap();
    info!("placed a 30 A load behind the breaker");

    for _ in 0..8 {
        let report = sim.step();
        for event in report.networks.events() {
            println!("  Event: {:?}", event);
        }
        let breaker = sim.world().get::<CircuitBreaker>(at(4)).unwrap();
        println!("Tick {}: breaker tripped={}", report.tick, breaker.tripped);
    }
    print_networks(&sim);

    // --- Scenario 3: remove the extra load and reset ---

    println!("\n=== Scenario 3: Recovery ===\n");
    sim.world_mut().remove(BlockPos::new(6, 1, 0)).unwrap();
    if let Some(breaker) = sim.world_mut().get_mut::<CircuitBreaker>(at(4)) {
        breaker.reset();
    }

    for _ in 0..8 {
        let report = sim.step();
        for event in report.networks.events() {
            println!("  Event: {:?}", event);
        }
        let lamp = sim.world().get::<Load>(at(6)).unwrap();
        println!(
            "Tick {}: lamp satisfaction={:.2}, received={:.1}",
            report.tick,
            lamp.satisfaction(),
            lamp.received
        );
    }
    print_networks(&sim);

    println!("\nPower network demo complete.");
}
