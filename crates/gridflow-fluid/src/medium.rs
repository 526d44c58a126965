//! Fluid media and their physical properties.
//!
//! Networks only compare [`MediumId`]s; the catalog maps those ids to the
//! descriptive properties used by blocks and data files.

use gridflow_core::id::MediumId;
use serde::{Deserialize, Serialize};

pub const WATER: MediumId = MediumId(0);
pub const OIL: MediumId = MediumId(1);
pub const STEAM: MediumId = MediumId(2);
pub const OXYGEN: MediumId = MediumId(3);
pub const HYDROGEN: MediumId = MediumId(4);
pub const NITROGEN: MediumId = MediumId(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Liquid,
    Gas,
}

/// Physical properties of one medium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medium {
    pub name: String,
    pub phase: Phase,
    /// kg/m^3.
    pub density: f64,
    /// Dynamic viscosity in Pa*s.
    pub viscosity: f64,
    /// Compressibility factor Z; 1 for an ideal gas, near 0 for liquids.
    pub compressibility: f64,
}

impl Medium {
    pub fn new(name: &str, phase: Phase, density: f64, viscosity: f64, compressibility: f64) -> Self {
        Self {
            name: name.to_string(),
            phase,
            density,
            viscosity,
            compressibility,
        }
    }

    pub fn is_gas(&self) -> bool {
        self.phase == Phase::Gas
    }
}

/// Registry of media, indexed by [`MediumId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediumCatalog {
    media: Vec<Medium>,
}

impl MediumCatalog {
    pub fn empty() -> Self {
        Self { media: Vec::new() }
    }

    /// The six built-in media, at the ids of the constants in this module.
    pub fn standard() -> Self {
        let mut catalog = Self::empty();
        catalog.register(Medium::new("water", Phase::Liquid, 1000.0, 0.001, 0.02));
        catalog.register(Medium::new("oil", Phase::Liquid, 850.0, 0.05, 0.02));
        catalog.register(Medium::new("steam", Phase::Gas, 0.6, 0.000_02, 1.0));
        catalog.register(Medium::new("oxygen", Phase::Gas, 1.4, 0.000_02, 1.0));
        catalog.register(Medium::new("hydrogen", Phase::Gas, 0.09, 0.000_009, 1.0));
        catalog.register(Medium::new("nitrogen", Phase::Gas, 1.2, 0.000_018, 1.0));
        catalog
    }

    /// Add a medium, or replace the properties of one with the same name.
    pub fn register(&mut self, medium: Medium) -> MediumId {
        if let Some(id) = self.id(&medium.name) {
            self.media[id.0 as usize] = medium;
            return id;
        }
        let id = MediumId(self.media.len() as u16);
        self.media.push(medium);
        id
    }

    pub fn get(&self, id: MediumId) -> Option<&Medium> {
        self.media.get(id.0 as usize)
    }

    pub fn id(&self, name: &str) -> Option<MediumId> {
        self.media
            .iter()
            .position(|m| m.name == name)
            .map(|i| MediumId(i as u16))
    }

    pub fn len(&self) -> usize {
        self.media.len()
    }

    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MediumId, &Medium)> {
        self.media
            .iter()
            .enumerate()
            .map(|(i, m)| (MediumId(i as u16), m))
    }
}

impl Default for MediumCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
