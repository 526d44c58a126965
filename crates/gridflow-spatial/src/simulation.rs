//! The step loop that drives a world and its networks together.

use gridflow_core::config::{ConfigError, EngineConfig};
use gridflow_core::fixed::Ticks;
use gridflow_core::id::ResourceKind;
use gridflow_core::registry::{NetworkRegistry, RegistryReport};
use log::{debug, trace};

use crate::snapshot::{BlockFactory, SnapshotError, WorldSnapshot};
use crate::world::{BlockTickSummary, GridWorld};

/// What one [`Simulation::step`] did.
#[derive(Debug)]
pub struct SimulationReport {
    pub tick: Ticks,
    pub blocks: BlockTickSummary,
    /// Dirty signals forwarded to the registry this step.
    pub forwarded: usize,
    pub networks: RegistryReport,
}

/// A world, its network registry, and a tick counter.
///
/// Each [`step`](Self::step):
///
/// 1. runs every loaded block's own tick,
/// 2. forwards the world's dirty signals to the registry,
/// 3. steps the registry (electrical, then fluid),
/// 4. advances the tick counter.
///
/// Edits made through [`world_mut`](Self::world_mut) between steps are
/// picked up by the next step.
#[derive(Debug)]
pub struct Simulation {
    world: GridWorld,
    registry: NetworkRegistry,
    tick: Ticks,
}

impl Simulation {
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        Self::with_world(GridWorld::new(), config)
    }

    pub fn with_world(world: GridWorld, config: &EngineConfig) -> Result<Self, ConfigError> {
        let mut registry = NetworkRegistry::new(config)?;
        for kind in ResourceKind::all() {
            registry.mark_dirty_all(kind);
        }
        let mut world = world;
        world.take_dirty();
        Ok(Self {
            world,
            registry,
            tick: 0,
        })
    }

    /// Rebuild a simulation from [`save`](Self::save) output. Networks are
    /// rediscovered on the first step.
    pub fn restore(
        data: &[u8],
        factory: &dyn BlockFactory,
        config: &EngineConfig,
    ) -> Result<Self, SnapshotError> {
        let snapshot = WorldSnapshot::decode(data)?;
        let world = snapshot.restore(factory)?;
        let mut sim = Self::with_world(world, config)?;
        sim.tick = snapshot.header.tick;
        debug!(
            "restored {} block(s) at tick {}",
            sim.world.len(),
            sim.tick
        );
        Ok(sim)
    }

    pub fn save(&self) -> Result<Vec<u8>, SnapshotError> {
        self.world.snapshot(self.tick)
    }

    pub fn step(&mut self) -> SimulationReport {
        let tick = self.tick;
        let blocks = self.world.tick_blocks(tick);

        let signals = self.world.take_dirty();
        let forwarded = signals.len();
        for signal in signals {
            self.registry.mark_dirty(signal.pos, signal.kind);
        }

        let networks = self.registry.step(&mut self.world, tick);
        trace!(
            "tick {}: {} block(s) ticked, {} signal(s) forwarded, {} event(s)",
            tick,
            blocks.ticked,
            forwarded,
            networks.events().count()
        );
        self.tick += 1;

        SimulationReport {
            tick,
            blocks,
            forwarded,
            networks,
        }
    }

    /// Step `ticks` times, returning the last report.
    pub fn run(&mut self, ticks: u32) -> Option<SimulationReport> {
        let mut last = None;
        for _ in 0..ticks {
            last = Some(self.step());
        }
        last
    }

    pub fn tick(&self) -> Ticks {
        self.tick
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut GridWorld {
        &mut self.world
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut NetworkRegistry {
        &mut self.registry
    }
}
