//! The per-world registry of electrical and fluid networks.
//!
//! One [`NetworkRegistry`] is owned by each simulated world and passed
//! alongside it; there is no process-wide instance. The host calls
//! [`NetworkRegistry::mark_dirty`] from its placement and removal paths and
//! [`NetworkRegistry::step`] once per tick after its own block updates.

use serde::{Deserialize, Serialize};

use crate::capability::{Electrical, Fluid, Quantity, Resource};
use crate::config::{ConfigError, EngineConfig};
use crate::event::NetworkEvent;
use crate::fixed::{Ticks, fixed64_to_f64};
use crate::host::NodeHost;
use crate::id::{BlockPos, MediumId, NetworkId, ResourceKind};
use crate::manager::{NetworkManager, StepReport};
use crate::network::{FlowReport, Network};

/// Kind-erased view of a network for diagnostics and UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub id: NetworkId,
    pub kind: ResourceKind,
    pub size: usize,
    /// Fluid networks only.
    pub medium: Option<MediumId>,
    pub formed_at: Ticks,
    pub members: Vec<BlockPos>,
    pub last_flow: Option<FlowSummary>,
}

/// Kind-erased [`FlowReport`], amounts as `f64` (amperes or mB per tick).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSummary {
    pub tick: Ticks,
    pub sources: usize,
    pub sinks: usize,
    pub conductors: usize,
    pub supply: f64,
    pub demand: f64,
    pub flow: f64,
    pub delivered: f64,
    pub residual: f64,
    pub loss: f64,
}

fn amount_f64<A: Quantity>(amount: A) -> f64 {
    fixed64_to_f64(amount.to_fixed())
}

impl<R: Resource> From<&FlowReport<R>> for FlowSummary {
    fn from(report: &FlowReport<R>) -> Self {
        Self {
            tick: report.tick,
            sources: report.sources,
            sinks: report.sinks,
            conductors: report.conductors,
            supply: amount_f64(report.total_supply),
            demand: amount_f64(report.total_demand),
            flow: amount_f64(report.flow),
            delivered: amount_f64(report.delivered),
            residual: amount_f64(report.residual),
            loss: fixed64_to_f64(report.loss),
        }
    }
}

impl<R: Resource> From<&Network<R>> for NetworkSummary {
    fn from(network: &Network<R>) -> Self {
        Self {
            id: network.id(),
            kind: R::KIND,
            size: network.len(),
            medium: R::medium(&network.partition()),
            formed_at: network.formed_at(),
            members: network.members().iter().copied().collect(),
            last_flow: network.last_flow().map(FlowSummary::from),
        }
    }
}

/// Both kinds' results for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryReport {
    pub electrical: StepReport<Electrical>,
    pub fluid: StepReport<Fluid>,
}

impl RegistryReport {
    pub fn events(&self) -> impl Iterator<Item = &NetworkEvent> {
        self.electrical.events.iter().chain(self.fluid.events.iter())
    }
}

#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    electrical: NetworkManager<Electrical>,
    fluid: NetworkManager<Fluid>,
}

impl NetworkRegistry {
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            electrical: NetworkManager::new(config),
            fluid: NetworkManager::new(config),
        })
    }

    /// Queue `origin` for rebuild in `kind`'s networks.
    pub fn mark_dirty(&mut self, origin: BlockPos, kind: ResourceKind) {
        match kind {
            ResourceKind::Electrical => self.electrical.mark_dirty(origin),
            ResourceKind::Fluid => self.fluid.mark_dirty(origin),
        }
    }

    /// Queue a full rediscovery of `kind`'s networks.
    pub fn mark_dirty_all(&mut self, kind: ResourceKind) {
        match kind {
            ResourceKind::Electrical => self.electrical.mark_dirty_all(),
            ResourceKind::Fluid => self.fluid.mark_dirty_all(),
        }
    }

    /// One simulation tick: electrical networks first, then fluid.
    pub fn step<H>(&mut self, host: &mut H, tick: Ticks) -> RegistryReport
    where
        H: NodeHost<Electrical> + NodeHost<Fluid> + ?Sized,
    {
        let electrical = self.electrical.step(host, tick);
        let fluid = self.fluid.step(host, tick);
        RegistryReport { electrical, fluid }
    }

    pub fn networks(&self, kind: ResourceKind) -> Vec<NetworkSummary> {
        match kind {
            ResourceKind::Electrical => self.electrical.networks().map(NetworkSummary::from).collect(),
            ResourceKind::Fluid => self.fluid.networks().map(NetworkSummary::from).collect(),
        }
    }

    pub fn network_of(&self, pos: BlockPos, kind: ResourceKind) -> Option<NetworkSummary> {
        match kind {
            ResourceKind::Electrical => self.electrical.network_of(pos).map(NetworkSummary::from),
            ResourceKind::Fluid => self.fluid.network_of(pos).map(NetworkSummary::from),
        }
    }

    pub fn electrical(&self) -> &NetworkManager<Electrical> {
        &self.electrical
    }

    pub fn fluid(&self) -> &NetworkManager<Fluid> {
        &self.fluid
    }

    pub fn electrical_mut(&mut self) -> &mut NetworkManager<Electrical> {
        &mut self.electrical
    }

    pub fn fluid_mut(&mut self) -> &mut NetworkManager<Fluid> {
        &mut self.fluid
    }
}
