//! Electrical blocks for Gridflow networks.
//!
//! Each block implements [`FlowNode<Electrical>`] and exposes it through its
//! [`Block`] capability table. Currents are amperes per tick; stored charge
//! is in ampere-ticks.
//!
//! # Blocks
//!
//! - [`Cable`] -- conductor; tracks a displayed voltage and its own heating.
//! - [`Generator`] -- source at a fixed EMF, optionally fed from an energy buffer.
//! - [`Load`] -- sink that meters received current and energy.
//! - [`Battery`] -- hybrid storage, both source and sink.
//! - [`CircuitBreaker`] -- conductor that opens when its network carries more
//!   than its rating.

pub mod units;

use std::any::Any;

use gridflow_core::block::{Block, BlockError, BlockTick};
use gridflow_core::capability::{ElectricState, Electrical, FlowNode, RateLimits};
use gridflow_core::fixed::{Fixed64, Ticks};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::units::{TICKS_PER_SECOND, energy_per_tick_j, heat_rise, is_overheated, resistive_loss_j};

fn clip(requested: Fixed64, limit: Fixed64) -> Fixed64 {
    requested.min(limit).max(Fixed64::ZERO)
}

fn encode<T: Serialize>(value: &T) -> Vec<u8> {
    bitcode::serialize(value).unwrap_or_default()
}

fn decode<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, BlockError> {
    bitcode::deserialize(data).map_err(|e| BlockError::DeserializeFailed(e.to_string()))
}

/// Implements the capability-table half of [`Block`] for a block whose
/// electrical capability is always present.
macro_rules! electric_block {
    ($ty:ty, $name:literal) => {
        fn name(&self) -> &str {
            $name
        }

        fn electric(&self) -> Option<&dyn FlowNode<Electrical>> {
            Some(self)
        }

        fn electric_mut(&mut self) -> Option<&mut dyn FlowNode<Electrical>> {
            Some(self)
        }

        fn serialize_state(&self) -> Vec<u8> {
            encode(self)
        }

        fn load_state(&mut self, data: &[u8]) -> Result<(), BlockError> {
            *self = decode::<$ty>(data)?;
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    };
}

// ---------------------------------------------------------------------------
// Cable
// ---------------------------------------------------------------------------

/// A passive conductor.
///
/// The displayed voltage relaxes 20% of the way toward the network's driving
/// voltage every tick and decays by 0.1% on the cable's own tick, so an
/// unpowered cable drains slowly. Carried current heats the cable through
/// its resistance; it cools 5% of the way toward ambient per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cable {
    pub resistance: Fixed64,
    /// Current above which the cable heats past its rating.
    pub rated_current: Fixed64,
    pub voltage: Fixed64,
    /// Network flow sensed on the last tick.
    pub carried: Fixed64,
    pub temperature: Fixed64,
}

impl Cable {
    pub const AMBIENT_C: i32 = 20;
    pub const OVERHEAT_C: i32 = 150;
    /// Copper, 1 kg per block.
    const MASS_KG: i32 = 1;
    const SPECIFIC_HEAT: i32 = 385;

    pub fn new(resistance: Fixed64, rated_current: Fixed64) -> Self {
        Self {
            resistance,
            rated_current,
            voltage: Fixed64::ZERO,
            carried: Fixed64::ZERO,
            temperature: Fixed64::from_num(Self::AMBIENT_C),
        }
    }

    pub fn is_overheated(&self) -> bool {
        is_overheated(self.temperature, Fixed64::from_num(Self::OVERHEAT_C))
    }

    pub fn is_overloaded(&self) -> bool {
        self.carried > self.rated_current
    }
}

impl Default for Cable {
    fn default() -> Self {
        Self::new(Fixed64::from_num(0.02), Fixed64::from_num(200))
    }
}

impl FlowNode<Electrical> for Cable {
    fn rate_limits(&self) -> RateLimits<Fixed64> {
        RateLimits::none()
    }

    fn level_state(&self) -> ElectricState {
        ElectricState {
            voltage: self.voltage,
            internal_resistance: self.resistance,
        }
    }

    fn transfer(&mut self, _drive: Fixed64, _requested: Fixed64) -> Fixed64 {
        Fixed64::ZERO
    }

    fn sense(&mut self, drive: Fixed64, flow: Fixed64) {
        let relax = Fixed64::from_num(0.2);
        self.voltage += (drive - self.voltage).saturating_mul(relax);
        self.carried = flow;
        let joules = resistive_loss_j(flow, self.resistance, 1);
        self.temperature = self.temperature.saturating_add(heat_rise(
            joules,
            Fixed64::from_num(Self::MASS_KG),
            Fixed64::from_num(Self::SPECIFIC_HEAT),
        ));
    }
}

impl Block for Cable {
    electric_block!(Cable, "cable");

    fn on_tick(&mut self, _tick: Ticks) -> BlockTick {
        self.voltage = self.voltage.saturating_mul(Fixed64::from_num(0.999));
        let ambient = Fixed64::from_num(Self::AMBIENT_C);
        self.temperature -= (self.temperature - ambient).saturating_mul(Fixed64::from_num(0.05));
        BlockTick::default()
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Energy a generator produces into before it can supply current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyBuffer {
    pub stored_j: Fixed64,
    pub capacity_j: Fixed64,
    /// Joules added per tick while running.
    pub production_j: Fixed64,
}

/// A source at a fixed EMF.
///
/// Without a buffer the generator can always supply `max_output`. With one,
/// output is further limited to what the stored energy covers at the EMF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub emf: Fixed64,
    pub max_output: Fixed64,
    pub internal_resistance: Fixed64,
    pub buffer: Option<EnergyBuffer>,
    /// Total current supplied, in ampere-ticks.
    pub supplied: Fixed64,
}

impl Generator {
    pub fn new(emf: Fixed64, max_output: Fixed64) -> Self {
        Self {
            emf,
            max_output,
            internal_resistance: Fixed64::from_num(0.1),
            buffer: None,
            supplied: Fixed64::ZERO,
        }
    }

    /// A fuel-burning generator: 240 V, 200 A, 500 kJ buffer filled at
    /// 120 J per tick.
    pub fn coal() -> Self {
        Self::new(Fixed64::from_num(240), Fixed64::from_num(200)).with_buffer(EnergyBuffer {
            stored_j: Fixed64::ZERO,
            capacity_j: Fixed64::from_num(500_000),
            production_j: Fixed64::from_num(120),
        })
    }

    pub fn with_buffer(mut self, buffer: EnergyBuffer) -> Self {
        self.buffer = Some(buffer);
        self
    }

    fn output_limit(&self) -> Fixed64 {
        match &self.buffer {
            Some(buffer) if self.emf > Fixed64::ZERO => {
                let covered = buffer
                    .stored_j
                    .saturating_mul(Fixed64::from_num(TICKS_PER_SECOND))
                    .saturating_div(self.emf);
                self.max_output.min(covered)
            }
            _ => self.max_output,
        }
    }
}

impl FlowNode<Electrical> for Generator {
    fn rate_limits(&self) -> RateLimits<Fixed64> {
        RateLimits::new(Fixed64::ZERO, self.output_limit())
    }

    fn level_state(&self) -> ElectricState {
        ElectricState {
            voltage: self.emf,
            internal_resistance: self.internal_resistance,
        }
    }

    fn transfer(&mut self, _drive: Fixed64, requested: Fixed64) -> Fixed64 {
        if requested >= Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        let moved = clip(-requested, self.output_limit());
        if let Some(buffer) = self.buffer.as_mut() {
            let spent = energy_per_tick_j(self.emf, moved);
            buffer.stored_j = (buffer.stored_j - spent).max(Fixed64::ZERO);
        }
        self.supplied = self.supplied.saturating_add(moved);
        -moved
    }
}

impl Block for Generator {
    electric_block!(Generator, "generator");

    fn on_tick(&mut self, _tick: Ticks) -> BlockTick {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.stored_j = buffer.stored_j.saturating_add(buffer.production_j).min(buffer.capacity_j);
        }
        BlockTick::default()
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// A consumer that meters what it receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub max_intake: Fixed64,
    /// Current received on the last tick it was fed.
    pub last_received: Fixed64,
    /// Total received, in ampere-ticks.
    pub received: Fixed64,
    /// Total energy received at the network's driving voltage.
    pub energy_j: Fixed64,
}

impl Load {
    pub fn new(max_intake: Fixed64) -> Self {
        Self {
            max_intake,
            last_received: Fixed64::ZERO,
            received: Fixed64::ZERO,
            energy_j: Fixed64::ZERO,
        }
    }

    /// Fraction of demand met on the last tick it was fed, in `[0, 1]`.
    pub fn satisfaction(&self) -> Fixed64 {
        if self.max_intake <= Fixed64::ZERO {
            return Fixed64::ONE;
        }
        (self.last_received / self.max_intake).min(Fixed64::ONE)
    }
}

impl FlowNode<Electrical> for Load {
    fn rate_limits(&self) -> RateLimits<Fixed64> {
        RateLimits::new(self.max_intake, Fixed64::ZERO)
    }

    fn level_state(&self) -> ElectricState {
        ElectricState {
            voltage: Fixed64::ZERO,
            internal_resistance: Fixed64::ZERO,
        }
    }

    fn transfer(&mut self, drive: Fixed64, requested: Fixed64) -> Fixed64 {
        let moved = clip(requested, self.max_intake);
        self.last_received = moved;
        self.received = self.received.saturating_add(moved);
        self.energy_j = self.energy_j.saturating_add(energy_per_tick_j(drive, moved));
        moved
    }
}

impl Block for Load {
    electric_block!(Load, "load");
}

// ---------------------------------------------------------------------------
// Battery
// ---------------------------------------------------------------------------

/// Hybrid storage: a source while charged, a sink while not full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battery {
    pub voltage: Fixed64,
    pub internal_resistance: Fixed64,
    /// Capacity in ampere-ticks.
    pub capacity: Fixed64,
    /// Stored charge in ampere-ticks, within `[0, capacity]`.
    pub charge: Fixed64,
    /// Maximum charge or discharge current per tick.
    pub max_rate: Fixed64,
}

impl Battery {
    pub fn new(voltage: Fixed64, capacity: Fixed64, max_rate: Fixed64) -> Self {
        Self {
            voltage,
            internal_resistance: Fixed64::from_num(0.05),
            capacity,
            charge: Fixed64::ZERO,
            max_rate,
        }
    }

    pub fn with_charge(mut self, charge: Fixed64) -> Self {
        self.charge = charge.min(self.capacity).max(Fixed64::ZERO);
        self
    }

    pub fn fill_ratio(&self) -> Fixed64 {
        if self.capacity <= Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        self.charge / self.capacity
    }
}

impl FlowNode<Electrical> for Battery {
    fn rate_limits(&self) -> RateLimits<Fixed64> {
        RateLimits::new(
            self.max_rate.min(self.capacity - self.charge),
            self.max_rate.min(self.charge),
        )
    }

    fn level_state(&self) -> ElectricState {
        ElectricState {
            voltage: self.voltage,
            internal_resistance: self.internal_resistance,
        }
    }

    fn transfer(&mut self, _drive: Fixed64, requested: Fixed64) -> Fixed64 {
        let limits = FlowNode::<Electrical>::rate_limits(self);
        if requested > Fixed64::ZERO {
            let moved = clip(requested, limits.max_intake);
            self.charge += moved;
            moved
        } else {
            let moved = clip(-requested, limits.max_output);
            self.charge -= moved;
            -moved
        }
    }
}

impl Block for Battery {
    electric_block!(Battery, "battery");
}

// ---------------------------------------------------------------------------
// Circuit breaker
// ---------------------------------------------------------------------------

/// A conductor that opens when its network carries more than its rating.
///
/// An open breaker drops its electrical capability, so the next rebuild
/// splits the network around it. The sensed flow is the whole network's
/// flow, not the current through this block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreaker {
    pub rated_current: Fixed64,
    pub tripped: bool,
    #[serde(skip)]
    topology_pending: bool,
}

impl CircuitBreaker {
    pub fn new(rated_current: Fixed64) -> Self {
        Self {
            rated_current,
            tripped: false,
            topology_pending: false,
        }
    }

    /// Close the breaker again. The surrounding networks merge on the next
    /// rebuild.
    pub fn reset(&mut self) {
        if self.tripped {
            info!("circuit breaker reset (rated {} A)", self.rated_current);
            self.tripped = false;
            self.topology_pending = true;
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(Fixed64::from_num(200))
    }
}

impl FlowNode<Electrical> for CircuitBreaker {
    fn rate_limits(&self) -> RateLimits<Fixed64> {
        RateLimits::none()
    }

    fn level_state(&self) -> ElectricState {
        ElectricState {
            voltage: Fixed64::ZERO,
            internal_resistance: Fixed64::from_num(0.001),
        }
    }

    fn transfer(&mut self, _drive: Fixed64, _requested: Fixed64) -> Fixed64 {
        Fixed64::ZERO
    }

    fn sense(&mut self, _drive: Fixed64, flow: Fixed64) {
        if !self.tripped && flow > self.rated_current {
            warn!(
                "circuit breaker tripped: {} A exceeds rating of {} A",
                flow, self.rated_current
            );
            self.tripped = true;
            self.topology_pending = true;
        }
    }
}

impl Block for CircuitBreaker {
    fn name(&self) -> &str {
        "circuit_breaker"
    }

    fn electric(&self) -> Option<&dyn FlowNode<Electrical>> {
        if self.tripped { None } else { Some(self) }
    }

    fn electric_mut(&mut self) -> Option<&mut dyn FlowNode<Electrical>> {
        if self.tripped { None } else { Some(self) }
    }

    fn on_tick(&mut self, _tick: Ticks) -> BlockTick {
        if std::mem::take(&mut self.topology_pending) {
            BlockTick::topology_changed()
        } else {
            BlockTick::default()
        }
    }

    fn serialize_state(&self) -> Vec<u8> {
        encode(self)
    }

    fn load_state(&mut self, data: &[u8]) -> Result<(), BlockError> {
        let restored: CircuitBreaker = decode(data)?;
        self.rated_current = restored.rated_current;
        if restored.tripped != self.tripped {
            self.tripped = restored.tripped;
            self.topology_pending = true;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ===========================================================================
// Tests
// ===========================================================================
