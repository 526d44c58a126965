//! Serde data file structs for media and scenes.
//!
//! These define the on-disk format. They are deserialized from RON, JSON, or
//! TOML and then resolved into blocks and a world by [`crate::build`].

use gridflow_fluid::Phase;
use serde::{Deserialize, Serialize};

// ===========================================================================
// Media
// ===========================================================================

/// `media.{ron,toml,json}`: extra media, or overrides of built-in ones by
/// name.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MediaFile {
    #[serde(default)]
    pub media: Vec<MediumData>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediumData {
    pub name: String,
    pub phase: PhaseData,
    pub density: f64,
    pub viscosity: f64,
    #[serde(default = "default_compressibility")]
    pub compressibility: f64,
}

fn default_compressibility() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseData {
    Liquid,
    Gas,
}

impl From<PhaseData> for Phase {
    fn from(phase: PhaseData) -> Self {
        match phase {
            PhaseData::Liquid => Phase::Liquid,
            PhaseData::Gas => Phase::Gas,
        }
    }
}

// ===========================================================================
// Scenes
// ===========================================================================

/// `scene.{ron,toml,json}`: chunks to load and blocks to place.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SceneData {
    /// Chunk columns to load in addition to those holding placements.
    #[serde(default)]
    pub chunks: Vec<(i32, i32)>,
    #[serde(default)]
    pub blocks: Vec<PlacementData>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlacementData {
    pub at: (i32, i32, i32),
    pub block: BlockData,
}

/// One block definition, tagged by `kind`. Optional fields fall back to the
/// block's own defaults; electrical values are in volts, amperes, and ohms,
/// fluid values in mB and kPa.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockData {
    Cable {
        #[serde(default)]
        resistance: Option<f64>,
        #[serde(default)]
        rated_current: Option<f64>,
    },
    Generator {
        emf: f64,
        max_output: f64,
        /// Start with an empty energy buffer that fills while running.
        #[serde(default)]
        buffered: bool,
    },
    Load {
        max_intake: f64,
    },
    Battery {
        voltage: f64,
        capacity: f64,
        max_rate: f64,
        #[serde(default)]
        charge: f64,
    },
    CircuitBreaker {
        rated_current: f64,
    },
    Tank {
        medium: String,
        #[serde(default)]
        amount: i64,
    },
    Pipe {
        medium: String,
        #[serde(default)]
        amount: i64,
    },
    Pump {
        medium: String,
        rate: i64,
        #[serde(default)]
        pressure: Option<f64>,
    },
    ElectricPump {
        medium: String,
        rate: i64,
        motor_demand: f64,
    },
    Drain {
        medium: String,
        max_intake: i64,
    },
    ReliefValve {
        medium: String,
        #[serde(default)]
        threshold: Option<f64>,
        #[serde(default)]
        amount: i64,
    },
}

impl BlockData {
    /// The medium name a fluid block refers to.
    pub fn medium(&self) -> Option<&str> {
        match self {
            BlockData::Tank { medium, .. }
            | BlockData::Pipe { medium, .. }
            | BlockData::Pump { medium, .. }
            | BlockData::ElectricPump { medium, .. }
            | BlockData::Drain { medium, .. }
            | BlockData::ReliefValve { medium, .. } => Some(medium),
            _ => None,
        }
    }
}
