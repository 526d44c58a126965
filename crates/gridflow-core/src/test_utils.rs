//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use std::any::Any;
use std::collections::BTreeMap;

use crate::block::Block;
use crate::capability::{
    ElectricState, Electrical, FlowNode, Fluid, FluidState, RateLimits, Resource,
};
use crate::fixed::Fixed64;
use crate::host::NodeHost;
use crate::id::{BlockPos, MediumId};

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

pub fn pos(x: i32, y: i32, z: i32) -> BlockPos {
    BlockPos::new(x, y, z)
}

// ===========================================================================
// MapHost: a bare position -> block map with face adjacency
// ===========================================================================

#[derive(Debug, Default)]
pub struct MapHost {
    blocks: BTreeMap<BlockPos, Box<dyn Block>>,
}

impl MapHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(&mut self, pos: BlockPos, block: impl Block + 'static) {
        self.blocks.insert(pos, Box::new(block));
    }

    pub fn remove(&mut self, pos: BlockPos) -> Option<Box<dyn Block>> {
        self.blocks.remove(&pos)
    }

    pub fn get<T: Block + 'static>(&self, pos: BlockPos) -> Option<&T> {
        self.blocks.get(&pos)?.as_any().downcast_ref::<T>()
    }

    pub fn get_mut<T: Block + 'static>(&mut self, pos: BlockPos) -> Option<&mut T> {
        self.blocks.get_mut(&pos)?.as_any_mut().downcast_mut::<T>()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl<R: Resource> NodeHost<R> for MapHost {
    fn neighbors(&self, pos: BlockPos) -> Vec<BlockPos> {
        pos.neighbors()
            .into_iter()
            .filter(|n| {
                self.blocks
                    .get(n)
                    .is_some_and(|b| R::capability(b.as_ref()).is_some())
            })
            .collect()
    }

    fn node(&self, pos: BlockPos) -> Option<&dyn FlowNode<R>> {
        self.blocks.get(&pos).and_then(|b| R::capability(b.as_ref()))
    }

    fn node_mut(&mut self, pos: BlockPos) -> Option<&mut dyn FlowNode<R>> {
        self.blocks
            .get_mut(&pos)
            .and_then(|b| R::capability_mut(b.as_mut()))
    }

    fn nodes(&self) -> Vec<BlockPos> {
        self.blocks
            .iter()
            .filter(|(_, b)| R::capability(b.as_ref()).is_some())
            .map(|(p, _)| *p)
            .collect()
    }
}

// ===========================================================================
// TestCell: a configurable electrical node that records what it saw
// ===========================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TestCell {
    pub voltage: Fixed64,
    pub resistance: Fixed64,
    pub max_intake: Fixed64,
    pub max_output: Fixed64,
    pub received: Fixed64,
    pub supplied: Fixed64,
    pub sensed: Option<(Fixed64, Fixed64)>,
    pub transfers: u32,
}

impl TestCell {
    pub fn conductor() -> Self {
        Self {
            voltage: Fixed64::ZERO,
            resistance: Fixed64::ZERO,
            max_intake: Fixed64::ZERO,
            max_output: Fixed64::ZERO,
            received: Fixed64::ZERO,
            supplied: Fixed64::ZERO,
            sensed: None,
            transfers: 0,
        }
    }

    pub fn source(voltage: f64, max_output: f64) -> Self {
        Self {
            voltage: fixed(voltage),
            max_output: fixed(max_output),
            ..Self::conductor()
        }
    }

    pub fn sink(max_intake: f64) -> Self {
        Self {
            max_intake: fixed(max_intake),
            ..Self::conductor()
        }
    }

    pub fn storage(voltage: f64, rate: f64) -> Self {
        Self {
            voltage: fixed(voltage),
            max_intake: fixed(rate),
            max_output: fixed(rate),
            ..Self::conductor()
        }
    }

    pub fn with_resistance(mut self, ohms: f64) -> Self {
        self.resistance = fixed(ohms);
        self
    }
}

impl FlowNode<Electrical> for TestCell {
    fn rate_limits(&self) -> RateLimits<Fixed64> {
        RateLimits::new(self.max_intake, self.max_output)
    }

    fn level_state(&self) -> ElectricState {
        ElectricState {
            voltage: self.voltage,
            internal_resistance: self.resistance,
        }
    }

    fn transfer(&mut self, _drive: Fixed64, requested: Fixed64) -> Fixed64 {
        self.transfers += 1;
        if requested > Fixed64::ZERO {
            let moved = requested.min(self.max_intake);
            self.received += moved;
            moved
        } else {
            let moved = (-requested).min(self.max_output);
            self.supplied += moved;
            -moved
        }
    }

    fn sense(&mut self, drive: Fixed64, flow: Fixed64) {
        self.sensed = Some((drive, flow));
    }
}

impl Block for TestCell {
    fn name(&self) -> &str {
        "test_cell"
    }

    fn electric(&self) -> Option<&dyn FlowNode<Electrical>> {
        Some(self)
    }

    fn electric_mut(&mut self) -> Option<&mut dyn FlowNode<Electrical>> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ===========================================================================
// TestTank: a fluid store, optionally with an electrical side
// ===========================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TestTank {
    pub medium: MediumId,
    pub capacity: i64,
    pub amount: i64,
    pub max_rate: i64,
    pub pressure: Fixed64,
    pub transfers: u32,
    pub motor: Option<TestCell>,
}

impl TestTank {
    /// A store whose rate limit equals its capacity.
    pub fn new(medium: MediumId, capacity: i64, amount: i64) -> Self {
        Self {
            medium,
            capacity,
            amount,
            max_rate: capacity,
            pressure: Fixed64::ZERO,
            transfers: 0,
            motor: None,
        }
    }

    /// A zero-volume fluid conductor.
    pub fn pipe(medium: MediumId) -> Self {
        Self::new(medium, 0, 0)
    }

    /// A fluid conductor that is also an electrical sink.
    pub fn electric_pump(medium: MediumId) -> Self {
        Self {
            motor: Some(TestCell::sink(5.0)),
            ..Self::pipe(medium)
        }
    }

    pub fn with_rate(mut self, max_rate: i64) -> Self {
        self.max_rate = max_rate;
        self
    }
}

impl FlowNode<Fluid> for TestTank {
    fn rate_limits(&self) -> RateLimits<i64> {
        RateLimits::new(
            (self.capacity - self.amount).min(self.max_rate),
            self.amount.min(self.max_rate),
        )
    }

    fn level_state(&self) -> FluidState {
        FluidState {
            pressure: self.pressure,
            capacity: self.capacity,
            amount: self.amount,
            medium: self.medium,
        }
    }

    fn transfer(&mut self, _drive: Fixed64, requested: i64) -> i64 {
        self.transfers += 1;
        let limits = FlowNode::<Fluid>::rate_limits(self);
        if requested > 0 {
            let moved = requested.min(limits.max_intake);
            self.amount += moved;
            moved
        } else {
            let moved = (-requested).min(limits.max_output);
            self.amount -= moved;
            -moved
        }
    }
}

impl Block for TestTank {
    fn name(&self) -> &str {
        "test_tank"
    }

    fn electric(&self) -> Option<&dyn FlowNode<Electrical>> {
        self.motor.as_ref().map(|m| m as &dyn FlowNode<Electrical>)
    }

    fn electric_mut(&mut self) -> Option<&mut dyn FlowNode<Electrical>> {
        self.motor
            .as_mut()
            .map(|m| m as &mut dyn FlowNode<Electrical>)
    }

    fn fluid(&self) -> Option<&dyn FlowNode<Fluid>> {
        Some(self)
    }

    fn fluid_mut(&mut self) -> Option<&mut dyn FlowNode<Fluid>> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
