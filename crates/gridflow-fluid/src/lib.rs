//! Fluid blocks for Gridflow networks.
//!
//! Volumes are whole millibuckets (mB). Pressure follows the fill level of a
//! store: atmospheric when empty, rising linearly by
//! [`PRESSURE_SPAN_KPA`] at full.
//!
//! # Blocks
//!
//! - [`Tank`] -- large hybrid store.
//! - [`Pipe`] -- small hybrid store that also carries flow between neighbours.
//! - [`Pump`] -- unlimited source of one medium at a fixed rate.
//! - [`ElectricPump`] -- a pump whose output follows the current its motor
//!   receives from an electrical network.
//! - [`Drain`] -- sink that meters and discards what it receives.
//! - [`ReliefValve`] -- small store that vents into its neighbours above a
//!   pressure threshold.

pub mod medium;

use std::any::Any;

use gridflow_core::block::{Block, BlockError, BlockTick};
use gridflow_core::capability::{ElectricState, Electrical, Fluid, FlowNode, FluidState, Quantity, RateLimits};
use gridflow_core::fixed::{Fixed64, Ticks};
use gridflow_core::id::MediumId;
use log::debug;
use serde::{Deserialize, Serialize};

pub use crate::medium::{Medium, MediumCatalog, Phase};

/// Pressure of an empty store, in kPa.
pub const ATMOSPHERIC_KPA: f64 = 101.3;
/// Pressure added between an empty and a full store, in kPa.
pub const PRESSURE_SPAN_KPA: i32 = 400;

fn atmospheric() -> Fixed64 {
    Fixed64::from_num(ATMOSPHERIC_KPA)
}

/// `scale * part / whole` for whole-mB volumes of any size, truncated.
fn scaled_ratio(scale: Fixed64, part: i64, whole: i64) -> Fixed64 {
    let bits = i128::from(scale.to_bits()) * i128::from(part) / i128::from(whole);
    Fixed64::from_bits(bits.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64)
}

fn encode<T: Serialize>(value: &T) -> Vec<u8> {
    bitcode::serialize(value).unwrap_or_default()
}

fn decode<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, BlockError> {
    bitcode::deserialize(data).map_err(|e| BlockError::DeserializeFailed(e.to_string()))
}

// ---------------------------------------------------------------------------
// FluidStore
// ---------------------------------------------------------------------------

/// A bounded volume of one medium with per-tick rate limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluidStore {
    pub medium: MediumId,
    pub capacity: i64,
    /// Always within `[0, capacity]`.
    pub amount: i64,
    pub max_intake: i64,
    pub max_output: i64,
}

impl FluidStore {
    pub fn new(medium: MediumId, capacity: i64, rate: i64) -> Self {
        Self {
            medium,
            capacity: capacity.max(0),
            amount: 0,
            max_intake: rate,
            max_output: rate,
        }
    }

    pub fn with_amount(mut self, amount: i64) -> Self {
        self.amount = amount.clamp(0, self.capacity);
        self
    }

    pub fn free(&self) -> i64 {
        self.capacity - self.amount
    }

    pub fn fill_ratio(&self) -> Fixed64 {
        if self.capacity <= 0 {
            return Fixed64::ZERO;
        }
        scaled_ratio(Fixed64::ONE, self.amount, self.capacity)
    }

    /// `101.3 + fill_ratio * 400` kPa.
    pub fn pressure(&self) -> Fixed64 {
        let rise = scaled_ratio(Fixed64::from_num(PRESSURE_SPAN_KPA), self.amount, self.capacity.max(1));
        atmospheric().saturating_add(rise)
    }

    /// Add up to `amount`, ignoring rate limits. Returns what was accepted.
    pub fn fill(&mut self, amount: i64) -> i64 {
        let accepted = amount.clamp(0, self.free());
        self.amount += accepted;
        accepted
    }

    /// Remove up to `amount`, ignoring rate limits. Returns what was removed.
    pub fn drain(&mut self, amount: i64) -> i64 {
        let removed = amount.clamp(0, self.amount);
        self.amount -= removed;
        removed
    }
}

impl FlowNode<Fluid> for FluidStore {
    fn rate_limits(&self) -> RateLimits<i64> {
        RateLimits::new(
            self.max_intake.min(self.free()).max(0),
            self.max_output.min(self.amount).max(0),
        )
    }

    fn level_state(&self) -> FluidState {
        FluidState {
            pressure: self.pressure(),
            capacity: self.capacity,
            amount: self.amount,
            medium: self.medium,
        }
    }

    fn transfer(&mut self, _drive: Fixed64, requested: i64) -> i64 {
        let limits = self.rate_limits();
        if requested > 0 {
            self.fill(requested.min(limits.max_intake))
        } else {
            -self.drain((-requested).min(limits.max_output))
        }
    }
}

/// Implements [`Block`] for a block whose fluid capability is its `store`.
macro_rules! store_block {
    ($ty:ty, $name:literal) => {
        fn name(&self) -> &str {
            $name
        }

        fn fluid(&self) -> Option<&dyn FlowNode<Fluid>> {
            Some(&self.store)
        }

        fn fluid_mut(&mut self) -> Option<&mut dyn FlowNode<Fluid>> {
            Some(&mut self.store)
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
// Tank and pipe
// ---------------------------------------------------------------------------

/// 16000 mB store, 1000 mB/tick in and out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tank {
    pub store: FluidStore,
}

impl Tank {
    pub const CAPACITY: i64 = 16_000;
    pub const RATE: i64 = 1_000;

    pub fn new(medium: MediumId) -> Self {
        Self {
            store: FluidStore::new(medium, Self::CAPACITY, Self::RATE),
        }
    }

    pub fn with_amount(mut self, amount: i64) -> Self {
        self.store = self.store.with_amount(amount);
        self
    }
}

impl Block for Tank {
    store_block!(Tank, "tank");
}

/// 2000 mB store, 250 mB/tick in and out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipe {
    pub store: FluidStore,
}

impl Pipe {
    pub const CAPACITY: i64 = 2_000;
    pub const RATE: i64 = 250;

    pub fn new(medium: MediumId) -> Self {
        Self {
            store: FluidStore::new(medium, Self::CAPACITY, Self::RATE),
        }
    }

    pub fn with_amount(mut self, amount: i64) -> Self {
        self.store = self.store.with_amount(amount);
        self
    }
}

impl Block for Pipe {
    store_block!(Pipe, "pipe");
}

// ---------------------------------------------------------------------------
// Pumps
// ---------------------------------------------------------------------------

/// Draws one medium from nowhere at a fixed rate and output pressure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pump {
    pub medium: MediumId,
    /// mB per tick.
    pub rate: i64,
    /// Output pressure in kPa.
    pub pressure: Fixed64,
    /// Total pumped, in mB.
    pub pumped: i64,
}

impl Pump {
    pub fn new(medium: MediumId, rate: i64) -> Self {
        Self {
            medium,
            rate: rate.max(0),
            pressure: Fixed64::from_num(300),
            pumped: 0,
        }
    }

    pub fn with_pressure(mut self, pressure: Fixed64) -> Self {
        self.pressure = pressure;
        self
    }

    fn state(&self, available: i64) -> FluidState {
        FluidState {
            pressure: self.pressure,
            capacity: available,
            amount: available,
            medium: self.medium,
        }
    }

    fn pull(&mut self, requested: i64, available: i64) -> i64 {
        if requested >= 0 {
            return 0;
        }
        let moved = (-requested).min(available);
        self.pumped = self.pumped.saturating_add(moved);
        -moved
    }
}

impl FlowNode<Fluid> for Pump {
    fn rate_limits(&self) -> RateLimits<i64> {
        RateLimits::new(0, self.rate)
    }

    fn level_state(&self) -> FluidState {
        self.state(self.rate)
    }

    fn transfer(&mut self, _drive: Fixed64, requested: i64) -> i64 {
        self.pull(requested, self.rate)
    }
}

impl Block for Pump {
    fn name(&self) -> &str {
        "pump"
    }

    fn fluid(&self) -> Option<&dyn FlowNode<Fluid>> {
        Some(self)
    }

    fn fluid_mut(&mut self) -> Option<&mut dyn FlowNode<Fluid>> {
        Some(self)
    }

    fn serialize_state(&self) -> Vec<u8> {
        encode(self)
    }

    fn load_state(&mut self, data: &[u8]) -> Result<(), BlockError> {
        *self = decode(data)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A pump driven by an electric motor.
///
/// The motor is an electrical sink. Fluid output on a tick is the pump rate
/// scaled by the fraction of motor demand met on that same tick, so the
/// electrical network must step before the fluid network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricPump {
    pub pump: Pump,
    /// Motor current at full output, in amperes.
    pub motor_demand: Fixed64,
    /// Motor current received this tick.
    pub powered: Fixed64,
}

impl ElectricPump {
    pub fn new(medium: MediumId, rate: i64, motor_demand: Fixed64) -> Self {
        Self {
            pump: Pump::new(medium, rate),
            motor_demand,
            powered: Fixed64::ZERO,
        }
    }

    /// Output available this tick, in mB.
    pub fn available(&self) -> i64 {
        let powered = self.powered.min(self.motor_demand).max(Fixed64::ZERO);
        self.pump
            .rate
            .share(powered.to_bits(), self.motor_demand.to_bits())
    }
}

impl FlowNode<Electrical> for ElectricPump {
    fn rate_limits(&self) -> RateLimits<Fixed64> {
        RateLimits::new(self.motor_demand, Fixed64::ZERO)
    }

    fn level_state(&self) -> ElectricState {
        ElectricState {
            voltage: Fixed64::ZERO,
            internal_resistance: Fixed64::ZERO,
        }
    }

    fn transfer(&mut self, _drive: Fixed64, requested: Fixed64) -> Fixed64 {
        let moved = requested.min(self.motor_demand).max(Fixed64::ZERO);
        self.powered = self.powered.saturating_add(moved);
        moved
    }
}

impl FlowNode<Fluid> for ElectricPump {
    fn rate_limits(&self) -> RateLimits<i64> {
        RateLimits::new(0, self.available())
    }

    fn level_state(&self) -> FluidState {
        self.pump.state(self.available())
    }

    fn transfer(&mut self, _drive: Fixed64, requested: i64) -> i64 {
        let available = self.available();
        self.pump.pull(requested, available)
    }
}

impl Block for ElectricPump {
    fn name(&self) -> &str {
        "electric_pump"
    }

    fn electric(&self) -> Option<&dyn FlowNode<Electrical>> {
        Some(self)
    }

    fn electric_mut(&mut self) -> Option<&mut dyn FlowNode<Electrical>> {
        Some(self)
    }

    fn fluid(&self) -> Option<&dyn FlowNode<Fluid>> {
        Some(self)
    }

    fn fluid_mut(&mut self) -> Option<&mut dyn FlowNode<Fluid>> {
        Some(self)
    }

    fn on_tick(&mut self, _tick: Ticks) -> BlockTick {
        self.powered = Fixed64::ZERO;
        BlockTick::default()
    }

    fn serialize_state(&self) -> Vec<u8> {
        encode(self)
    }

    fn load_state(&mut self, data: &[u8]) -> Result<(), BlockError> {
        *self = decode(data)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Drain
// ---------------------------------------------------------------------------

/// Discards up to `max_intake` mB per tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drain {
    pub medium: MediumId,
    pub max_intake: i64,
    /// Total discarded, in mB.
    pub drained: i64,
}

impl Drain {
    pub fn new(medium: MediumId, max_intake: i64) -> Self {
        Self {
            medium,
            max_intake: max_intake.max(0),
            drained: 0,
        }
    }
}

impl FlowNode<Fluid> for Drain {
    fn rate_limits(&self) -> RateLimits<i64> {
        RateLimits::new(self.max_intake, 0)
    }

    fn level_state(&self) -> FluidState {
        FluidState {
            pressure: atmospheric(),
            capacity: self.max_intake,
            amount: 0,
            medium: self.medium,
        }
    }

    fn transfer(&mut self, _drive: Fixed64, requested: i64) -> i64 {
        let moved = requested.clamp(0, self.max_intake);
        self.drained = self.drained.saturating_add(moved);
        moved
    }
}

impl Block for Drain {
    fn name(&self) -> &str {
        "drain"
    }

    fn fluid(&self) -> Option<&dyn FlowNode<Fluid>> {
        Some(self)
    }

    fn fluid_mut(&mut self) -> Option<&mut dyn FlowNode<Fluid>> {
        Some(self)
    }

    fn serialize_state(&self) -> Vec<u8> {
        encode(self)
    }

    fn load_state(&mut self, data: &[u8]) -> Result<(), BlockError> {
        *self = decode(data)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Relief valve
// ---------------------------------------------------------------------------

/// A small store that vents above a pressure threshold.
///
/// On its own tick, while its pressure exceeds `threshold`, the valve removes
/// up to `release_amount` mB and hands it to its host as a
/// [`FluidRelease`](gridflow_core::block::FluidRelease). The host offers the
/// volume to adjacent nodes of the same medium and returns what they reject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliefValve {
    pub store: FluidStore,
    /// kPa.
    pub threshold: Fixed64,
    pub release_amount: i64,
}

impl ReliefValve {
    pub const CAPACITY: i64 = 2_000;
    pub const RATE: i64 = 200;

    pub fn new(medium: MediumId) -> Self {
        Self {
            store: FluidStore::new(medium, Self::CAPACITY, Self::RATE),
            threshold: Fixed64::from_num(250),
            release_amount: 200,
        }
    }

    pub fn with_threshold(mut self, threshold: Fixed64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_amount(mut self, amount: i64) -> Self {
        self.store = self.store.with_amount(amount);
        self
    }

    pub fn is_venting(&self) -> bool {
        self.store.pressure() > self.threshold && self.store.amount > 0
    }
}

impl Block for ReliefValve {
    store_block!(ReliefValve, "relief_valve");

    fn on_tick(&mut self, tick: Ticks) -> BlockTick {
        if !self.is_venting() {
            return BlockTick::default();
        }
        let vented = self.store.drain(self.release_amount);
        debug!(
            "relief valve venting {} mB at {} kPa on tick {}",
            vented,
            self.store.pressure(),
            tick
        );
        BlockTick::release(self.store.medium, vented)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medium::{OIL, WATER};
    use gridflow_core::config::EngineConfig;
    use gridflow_core::manager::NetworkManager;
    use gridflow_core::registry::NetworkRegistry;
    use gridflow_core::test_utils::{MapHost, TestCell, fixed, pos};

    fn assert_near(actual: Fixed64, expected: f64) {
        let diff = (actual - fixed(expected)).abs();
        assert!(diff < fixed(0.0001), "{actual} is not near {expected}");
    }

    fn instant_config() -> EngineConfig {
        EngineConfig {
            debounce_ticks: 0,
            ..Default::default()
        }
    }

    // -----------------------------------------------------------------------
    // Stores
    // -----------------------------------------------------------------------

    #[test]
    fn pressure_follows_fill_ratio() {
        let tank = Tank::new(WATER);
        assert_near(tank.store.pressure(), 101.3);
        let half = Tank::new(WATER).with_amount(8_000);
        assert_near(half.store.pressure(), 301.3);
        let full = Tank::new(WATER).with_amount(16_000);
        assert_near(full.store.pressure(), 501.3);
    }

    #[test]
    fn pressure_of_huge_store_does_not_overflow() {
        let store = FluidStore::new(WATER, i64::MAX, 1_000).with_amount(i64::MAX / 2);
        assert_near(store.pressure(), 301.3);
        assert_near(store.fill_ratio(), 0.5);
    }

    #[test]
    fn electric_pump_scales_huge_rates() {
        let mut pump = ElectricPump::new(WATER, i64::MAX, fixed(10.0));
        assert_eq!(pump.available(), 0);
        FlowNode::<Electrical>::transfer(&mut pump, fixed(240.0), fixed(10.0));
        assert_eq!(pump.available(), i64::MAX);
        pump.pump.pumped = i64::MAX - 5;
        assert_eq!(FlowNode::<Fluid>::transfer(&mut pump, fixed(300.0), -100), -100);
        assert_eq!(pump.pump.pumped, i64::MAX);
    }

    #[test]
    fn amount_is_clamped_to_capacity() {
        let pipe = Pipe::new(WATER).with_amount(5_000);
        assert_eq!(pipe.store.amount, Pipe::CAPACITY);
        let pipe = Pipe::new(WATER).with_amount(-3);
        assert_eq!(pipe.store.amount, 0);
    }

    #[test]
    fn store_limits_follow_rate_and_room() {
        let pipe = Pipe::new(WATER).with_amount(1_900);
        let limits = pipe.store.rate_limits();
        assert_eq!(limits.max_intake, 100);
        assert_eq!(limits.max_output, 250);

        let empty = Pipe::new(WATER);
        let limits = empty.store.rate_limits();
        assert!(limits.is_sink());
        assert!(!limits.is_source());
    }

    #[test]
    fn store_transfer_clips() {
        let mut tank = Tank::new(WATER).with_amount(500);
        assert_eq!(tank.store.transfer(Fixed64::ZERO, 3_000), 1_000);
        assert_eq!(tank.store.amount, 1_500);
        assert_eq!(tank.store.transfer(Fixed64::ZERO, -3_000), -1_000);
        assert_eq!(tank.store.amount, 500);
        assert_eq!(tank.store.transfer(Fixed64::ZERO, 0), 0);
    }

    #[test]
    fn level_state_reports_medium() {
        let tank = Tank::new(OIL).with_amount(10);
        let level = tank.fluid().unwrap().level_state();
        assert_eq!(level.medium, OIL);
        assert_eq!(level.amount, 10);
        assert_eq!(level.capacity, Tank::CAPACITY);
    }

    #[test]
    fn tank_state_round_trips() {
        let tank = Tank::new(OIL).with_amount(1_234);
        let data = tank.serialize_state();
        let mut restored = Tank::new(WATER);
        restored.load_state(&data).unwrap();
        assert_eq!(restored, tank);
    }

    #[test]
    fn garbage_state_is_rejected() {
        let mut tank = Tank::new(WATER);
        assert!(tank.load_state(&[0xff]).is_err());
    }

    // -----------------------------------------------------------------------
    // Pumps and drains
    // -----------------------------------------------------------------------

    #[test]
    fn pump_is_an_unlimited_source() {
        let mut pump = Pump::new(WATER, 100);
        assert!(pump.rate_limits().is_source());
        assert_eq!(pump.transfer(Fixed64::ZERO, -250), -100);
        assert_eq!(pump.transfer(Fixed64::ZERO, 50), 0);
        assert_eq!(pump.transfer(Fixed64::ZERO, -40), -40);
        assert_eq!(pump.pumped, 140);
    }

    #[test]
    fn drain_meters_what_it_takes() {
        let mut drain = Drain::new(WATER, 60);
        assert_eq!(drain.transfer(Fixed64::ZERO, 100), 60);
        assert_eq!(drain.transfer(Fixed64::ZERO, -10), 0);
        assert_eq!(drain.drained, 60);
    }

    #[test]
    fn pump_fills_tank_through_pipes() {
        let mut host = MapHost::new();
        host.place(pos(0, 0, 0), Pump::new(WATER, 100));
        host.place(pos(1, 0, 0), Pipe::new(WATER).with_amount(2_000));
        host.place(pos(2, 0, 0), Tank::new(WATER));
        let mut manager = NetworkManager::<Fluid>::new(&instant_config());
        manager.mark_dirty_all();
        let report = manager.step(&mut host, 0);

        // A full pipe is a pure source: supply 100 + 250, demand 1000.
        let flow = &report.flows[0].1;
        assert_eq!(flow.sources, 2);
        assert_eq!(flow.sinks, 1);
        assert_eq!(flow.flow, 350);
        assert_eq!(host.get::<Tank>(pos(2, 0, 0)).unwrap().store.amount, 350);
        assert_eq!(host.get::<Pipe>(pos(1, 0, 0)).unwrap().store.amount, 1_750);
        assert_eq!(host.get::<Pump>(pos(0, 0, 0)).unwrap().pumped, 100);
    }

    #[test]
    fn media_do_not_mix() {
        let mut host = MapHost::new();
        host.place(pos(0, 0, 0), Pump::new(WATER, 100));
        host.place(pos(1, 0, 0), Drain::new(OIL, 100));
        let mut manager = NetworkManager::<Fluid>::new(&instant_config());
        manager.mark_dirty_all();
        let report = manager.step(&mut host, 0);
        assert_eq!(report.flows.len(), 2);
        assert!(report.flows.iter().all(|(_, f)| f.flow == 0));
        assert_eq!(host.get::<Drain>(pos(1, 0, 0)).unwrap().drained, 0);
    }

    #[test]
    fn electric_pump_output_follows_motor_current() {
        let mut host = MapHost::new();
        // Motor wants 10 A; the source supplies only 5 A.
        host.place(pos(0, 0, 0), TestCell::source(240.0, 5.0));
        host.place(pos(1, 0, 0), ElectricPump::new(WATER, 200, fixed(10.0)));
        host.place(pos(2, 0, 0), Drain::new(WATER, 1_000));
        let mut registry = NetworkRegistry::new(&instant_config()).unwrap();
        for kind in gridflow_core::id::ResourceKind::all() {
            registry.mark_dirty_all(kind);
        }

        host.get_mut::<ElectricPump>(pos(1, 0, 0)).unwrap().on_tick(0);
        registry.step(&mut host, 0);

        let pump = host.get::<ElectricPump>(pos(1, 0, 0)).unwrap();
        assert_eq!(pump.powered, fixed(5.0));
        assert_eq!(pump.pump.pumped, 100);
        assert_eq!(host.get::<Drain>(pos(2, 0, 0)).unwrap().drained, 100);
    }

    #[test]
    fn unpowered_electric_pump_is_inert() {
        let pump = ElectricPump::new(WATER, 200, fixed(10.0));
        assert!(FlowNode::<Fluid>::rate_limits(&pump).is_conductor());
        assert!(FlowNode::<Electrical>::rate_limits(&pump).is_sink());
        assert!(pump.capabilities().contains(gridflow_core::id::ResourceKind::Electrical));
        assert!(pump.capabilities().contains(gridflow_core::id::ResourceKind::Fluid));
    }

    // -----------------------------------------------------------------------
    // Relief valve
    // -----------------------------------------------------------------------

    #[test]
    fn relief_valve_vents_above_threshold() {
        // 250 kPa is crossed just above 743 mB.
        let mut quiet = ReliefValve::new(WATER).with_amount(743);
        assert_eq!(quiet.on_tick(0), BlockTick::default());

        let mut valve = ReliefValve::new(WATER).with_amount(1_000);
        let tick = valve.on_tick(0);
        let release = tick.release.unwrap();
        assert_eq!(release.medium, WATER);
        assert_eq!(release.amount, 200);
        assert_eq!(valve.store.amount, 800);
        assert!(!tick.topology_changed);
    }

    #[test]
    fn relief_valve_stops_below_threshold() {
        let mut valve = ReliefValve::new(WATER).with_amount(900);
        assert!(valve.on_tick(0).release.is_some());
        assert_eq!(valve.store.amount, 700);
        assert!(!valve.is_venting());
        assert!(valve.on_tick(1).release.is_none());
    }
}
