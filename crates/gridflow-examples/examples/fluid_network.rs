//! Fluid network example: media separation, an electric pump, and a relief
//! valve, loaded from data files.
//!
//! Writes a small project (engine config, an extra medium, and a scene) to a
//! temporary directory, loads it, and steps the simulation while printing
//! tank levels and valve releases. Finishes with a save and restore.
//!
//! Run with: `RUST_LOG=debug cargo run -p gridflow-examples --example fluid_network`

use std::error::Error;
use std::fs;

use gridflow_core::id::{BlockPos, ResourceKind};
use gridflow_data::{load_engine_config, load_project, standard_block};
use gridflow_fluid::{ElectricPump, ReliefValve, Tank};
use gridflow_spatial::Simulation;
use log::info;

const ENGINE: &str = "debounce_ticks = 2\nmax_rebuilds_per_step = 4\n";

const MEDIA: &str = r#"
[[media]]
name = "brine"
phase = "liquid"
density = 1200.0
viscosity = 0.0014
"#;

// Power line along y = 1 feeding the pump; water line along y = 0 from the
// pump to a tank and a relief valve; an unconnected brine tank touching the
// water line.
const SCENE: &str = r#"{
  "blocks": [
    {"at": [0, 1, 0], "block": {"kind": "generator", "emf": 240.0, "max_output": 12.0}},
    {"at": [1, 1, 0], "block": {"kind": "cable"}},
    {"at": [1, 0, 0], "block": {"kind": "electric_pump", "medium": "water", "rate": 300, "motor_demand": 12.0}},
    {"at": [2, 0, 0], "block": {"kind": "pipe", "medium": "water"}},
    {"at": [3, 0, 0], "block": {"kind": "relief_valve", "medium": "water", "threshold": 200.0}},
    {"at": [4, 0, 0], "block": {"kind": "tank", "medium": "water"}},
    {"at": [2, 0, 1], "block": {"kind": "tank", "medium": "brine", "amount": 4000}}
  ]
}"#;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let dir = std::env::temp_dir().join(format!("gridflow_fluid_example_{}", std::process::id()));
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("engine.toml"), ENGINE)?;
    fs::write(dir.join("media.toml"), MEDIA)?;
    fs::write(dir.join("scene.json"), SCENE)?;

    let project = load_project(&dir)?;
    info!("project loaded from {}", dir.display());
    let mut sim = project.into_simulation()?;

    // --- Scenario 1: pump into the water line ---

    println!("=== Scenario 1: Electric pump filling the line ===\n");
    for _ in 0..16 {
        let report = sim.step();
        let pump = sim.world().get::<ElectricPump>(BlockPos::new(1, 0, 0)).unwrap();
        let valve = sim.world().get::<ReliefValve>(BlockPos::new(3, 0, 0)).unwrap();
        let tank = sim.world().get::<Tank>(BlockPos::new(4, 0, 0)).unwrap();
        println!(
            "Tick {}: pumped={}, valve={} mB ({:.1} kPa), tank={} mB, released={}, vented={}",
            report.tick,
            pump.pump.pumped,
            valve.store.amount,
            valve.store.pressure(),
            tank.store.amount,
            report.blocks.released,
            report.blocks.vented
        );
        for event in report.networks.events() {
            println!("  Event: {:?}", event);
        }
    }

    println!();
    for net in sim.registry().networks(ResourceKind::Fluid) {
        println!(
            "  fluid network {:?}: medium={:?}, {} members",
            net.id, net.medium, net.size
        );
    }

    // --- Scenario 2: save and restore ---

    println!("\n=== Scenario 2: Save and restore ===\n");
    let saved = sim.save()?;
    println!("Snapshot: {} bytes at tick {}", saved.len(), sim.tick());

    let config = load_engine_config(&dir)?;
    let mut restored = Simulation::restore(&saved, &standard_block, &config)?;
    let report = restored.run(4);
    let tank = restored.world().get::<Tank>(BlockPos::new(4, 0, 0)).unwrap();
    println!(
        "Restored at tick {}, ran to tick {:?}: tank={} mB",
        sim.tick(),
        report.map(|r| r.tick),
        tank.store.amount
    );

    let _ = fs::remove_dir_all(&dir);
    println!("\nFluid network demo complete.");
    Ok(())
}
