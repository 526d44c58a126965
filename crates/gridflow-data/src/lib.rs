//! Data-driven setup for Gridflow simulations.
//!
//! A project directory holds up to three files, each in RON, TOML, or JSON:
//!
//! - `engine.*` -- [`EngineConfig`] (optional; defaults apply)
//! - `media.*` -- extra media (optional; the built-in six are always present)
//! - `scene.*` -- chunks and block placements (required)

pub mod build;
pub mod loader;
pub mod schema;

use std::path::Path;

use gridflow_core::config::EngineConfig;
use gridflow_fluid::MediumCatalog;
use gridflow_spatial::{GridWorld, Simulation};
use log::info;

pub use build::{build_block, build_media, build_world, standard_block};
pub use loader::{DataLoadError, Format};
pub use schema::{BlockData, MediaFile, PlacementData, SceneData};

/// Everything loaded from a project directory, resolved and validated.
#[derive(Debug)]
pub struct ProjectData {
    pub config: EngineConfig,
    pub media: MediumCatalog,
    pub world: GridWorld,
}

impl ProjectData {
    /// Start a simulation over the loaded world. The first steps discover
    /// every network.
    pub fn into_simulation(self) -> Result<Simulation, DataLoadError> {
        Ok(Simulation::with_world(self.world, &self.config)?)
    }
}

/// Load `engine.*` from `dir`, or the defaults if absent.
pub fn load_engine_config(dir: &Path) -> Result<EngineConfig, DataLoadError> {
    let config: EngineConfig = loader::load_optional(dir, "engine")?.unwrap_or_default();
    config.validate()?;
    Ok(config)
}

/// Load `media.*` from `dir` on top of the built-in media.
pub fn load_media(dir: &Path) -> Result<MediumCatalog, DataLoadError> {
    match loader::find_data_file(dir, "media")? {
        Some(path) => {
            let file: MediaFile = loader::deserialize_file(&path)?;
            build_media(&file, &path)
        }
        None => Ok(MediumCatalog::standard()),
    }
}

/// Load a project directory.
pub fn load_project(dir: &Path) -> Result<ProjectData, DataLoadError> {
    let config = load_engine_config(dir)?;
    let media = load_media(dir)?;
    let scene_path = loader::require_data_file(dir, "scene")?;
    let scene: SceneData = loader::deserialize_file(&scene_path)?;
    let world = build_world(&scene, &media, &scene_path)?;
    info!(
        "loaded project {}: {} block(s), {} media",
        dir.display(),
        world.len(),
        media.len()
    );
    Ok(ProjectData { config, media, world })
}
