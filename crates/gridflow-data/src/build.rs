//! Resolution: turn parsed data files into media, blocks, and a world.

use std::collections::BTreeSet;
use std::path::Path;

use gridflow_core::block::Block;
use gridflow_core::fixed::Fixed64;
use gridflow_core::id::{BlockPos, ChunkPos, MediumId};
use gridflow_fluid::medium::WATER;
use gridflow_fluid::{Drain, ElectricPump, Medium, MediumCatalog, Pipe, Pump, ReliefValve, Tank};
use gridflow_power::{Battery, Cable, CircuitBreaker, Generator, Load};
use gridflow_spatial::GridWorld;
use log::debug;

use crate::loader::DataLoadError;
use crate::schema::{BlockData, MediaFile, SceneData};

/// The built-in media plus any defined in `file`.
pub fn build_media(file: &MediaFile, origin: &Path) -> Result<MediumCatalog, DataLoadError> {
    let mut catalog = MediumCatalog::standard();
    let mut seen = BTreeSet::new();
    for data in &file.media {
        if !seen.insert(data.name.as_str()) {
            return Err(DataLoadError::DuplicateName {
                file: origin.to_path_buf(),
                name: data.name.clone(),
            });
        }
        catalog.register(Medium::new(
            &data.name,
            data.phase.into(),
            data.density,
            data.viscosity,
            data.compressibility,
        ));
    }
    Ok(catalog)
}

fn resolve_medium(media: &MediumCatalog, name: &str, origin: &Path) -> Result<MediumId, DataLoadError> {
    media.id(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: origin.to_path_buf(),
        name: name.to_string(),
        expected_kind: "medium",
    })
}

/// Electrical values must be finite and fit the fixed-point range.
fn fixed_field(value: f64, field: &'static str, origin: &Path) -> Result<Fixed64, DataLoadError> {
    match Fixed64::checked_from_num(value) {
        Some(v) if value.is_finite() => Ok(v),
        _ => Err(DataLoadError::OutOfRange {
            file: origin.to_path_buf(),
            field,
            value,
        }),
    }
}

/// Construct one block from its definition.
pub fn build_block(data: &BlockData, media: &MediumCatalog, origin: &Path) -> Result<Box<dyn Block>, DataLoadError> {
    let medium = match data.medium() {
        Some(name) => resolve_medium(media, name, origin)?,
        None => WATER,
    };
    let fx = |field: &'static str, value: f64| fixed_field(value, field, origin);

    let block: Box<dyn Block> = match data {
        BlockData::Cable {
            resistance,
            rated_current,
        } => {
            let mut cable = Cable::default();
            if let Some(r) = resistance {
                cable.resistance = fx("resistance", *r)?;
            }
            if let Some(rating) = rated_current {
                cable.rated_current = fx("rated_current", *rating)?;
            }
            Box::new(cable)
        }
        BlockData::Generator {
            emf,
            max_output,
            buffered,
        } => {
            let emf = fx("emf", *emf)?;
            let max_output = fx("max_output", *max_output)?;
            let generator = if *buffered {
                let coal = Generator::coal();
                Generator {
                    emf,
                    max_output,
                    ..coal
                }
            } else {
                Generator::new(emf, max_output)
            };
            Box::new(generator)
        }
        BlockData::Load { max_intake } => Box::new(Load::new(fx("max_intake", *max_intake)?)),
        BlockData::Battery {
            voltage,
            capacity,
            max_rate,
            charge,
        } => Box::new(
            Battery::new(
                fx("voltage", *voltage)?,
                fx("capacity", *capacity)?,
                fx("max_rate", *max_rate)?,
            )
            .with_charge(fx("charge", *charge)?),
        ),
        BlockData::CircuitBreaker { rated_current } => {
            Box::new(CircuitBreaker::new(fx("rated_current", *rated_current)?))
        }
        BlockData::Tank { amount, .. } => Box::new(Tank::new(medium).with_amount(*amount)),
        BlockData::Pipe { amount, .. } => Box::new(Pipe::new(medium).with_amount(*amount)),
        BlockData::Pump { rate, pressure, .. } => {
            let pump = Pump::new(medium, *rate);
            match pressure {
                Some(p) => Box::new(pump.with_pressure(fx("pressure", *p)?)),
                None => Box::new(pump),
            }
        }
        BlockData::ElectricPump {
            rate, motor_demand, ..
        } => Box::new(ElectricPump::new(medium, *rate, fx("motor_demand", *motor_demand)?)),
        BlockData::Drain { max_intake, .. } => Box::new(Drain::new(medium, *max_intake)),
        BlockData::ReliefValve {
            threshold, amount, ..
        } => {
            let mut valve = ReliefValve::new(medium).with_amount(*amount);
            if let Some(t) = threshold {
                valve = valve.with_threshold(fx("threshold", *t)?);
            }
            Box::new(valve)
        }
    };
    Ok(block)
}

/// Build a world from a scene. Every chunk listed in the scene and every
/// chunk holding a placement is loaded.
pub fn build_world(scene: &SceneData, media: &MediumCatalog, origin: &Path) -> Result<GridWorld, DataLoadError> {
    let mut world = GridWorld::new();
    for &(x, z) in &scene.chunks {
        world.load_chunk(ChunkPos::new(x, z));
    }
    for placement in &scene.blocks {
        let (x, y, z) = placement.at;
        let pos = BlockPos::new(x, y, z);
        let block = build_block(&placement.block, media, origin)?;
        world.load_chunk(pos.chunk());
        world
            .place_boxed(pos, block)
            .map_err(|source| DataLoadError::Placement {
                file: origin.to_path_buf(),
                source,
            })?;
    }
    debug!(
        "built world from {}: {} block(s) in {} chunk(s)",
        origin.display(),
        world.len(),
        world.loaded_chunks().count()
    );
    Ok(world)
}

/// A default block for each name the node crates define. Used to restore
/// snapshots, whose saved state then overwrites every field.
pub fn standard_block(name: &str) -> Option<Box<dyn Block>> {
    let water = WATER;
    let zero = Fixed64::ZERO;
    let block: Box<dyn Block> = match name {
        "cable" => Box::new(Cable::default()),
        "generator" => Box::new(Generator::new(zero, zero)),
        "load" => Box::new(Load::new(zero)),
        "battery" => Box::new(Battery::new(zero, zero, zero)),
        "circuit_breaker" => Box::new(CircuitBreaker::default()),
        "tank" => Box::new(Tank::new(water)),
        "pipe" => Box::new(Pipe::new(water)),
        "pump" => Box::new(Pump::new(water, 0)),
        "electric_pump" => Box::new(ElectricPump::new(water, 0, zero)),
        "drain" => Box::new(Drain::new(water, 0)),
        "relief_valve" => Box::new(ReliefValve::new(water)),
        _ => return None,
    };
    Some(block)
}
