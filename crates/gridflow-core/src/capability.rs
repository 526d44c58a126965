//! The node capability model.
//!
//! Every participant in a resource graph exposes, per resource kind, a small
//! contract: its rate limits, its kind-specific level state, and a signed
//! `transfer` through which a network pushes resource in (positive) or pulls
//! it out (negative). The two kinds differ only in their quantity type and in
//! a handful of per-kind hooks, captured by the [`Resource`] trait so that
//! discovery, scheduling, and distribution are written once.

use std::fmt::Debug;
use std::hash::Hash;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::fixed::{Fixed64, mul_div_64, square_64};
use crate::id::{MediumId, ResourceKind};

// ---------------------------------------------------------------------------
// Quantities
// ---------------------------------------------------------------------------

/// A signed amount of resource moved in one tick.
pub trait Quantity:
    Copy + PartialEq + PartialOrd + Debug + Add<Output = Self> + Sub<Output = Self> + Neg<Output = Self>
{
    const ZERO: Self;

    /// `self * part / whole`, truncated toward zero. Zero when `whole` is zero.
    fn share(self, part: Self, whole: Self) -> Self;

    /// Absolute value.
    fn magnitude(self) -> Self;

    /// Addition clamped to the numeric bounds.
    fn saturating_add(self, other: Self) -> Self;

    /// Lossy conversion for diagnostics and instrumentation.
    fn to_fixed(self) -> Fixed64;

    fn smaller(self, other: Self) -> Self {
        if other < self { other } else { self }
    }
}

impl Quantity for Fixed64 {
    const ZERO: Self = Fixed64::ZERO;

    fn share(self, part: Self, whole: Self) -> Self {
        mul_div_64(self, part, whole)
    }

    fn magnitude(self) -> Self {
        self.saturating_abs()
    }

    fn saturating_add(self, other: Self) -> Self {
        Fixed64::saturating_add(self, other)
    }

    fn to_fixed(self) -> Fixed64 {
        self
    }
}

/// Fluid volumes are whole millibuckets.
impl Quantity for i64 {
    const ZERO: Self = 0;

    fn share(self, part: Self, whole: Self) -> Self {
        if whole == 0 {
            return 0;
        }
        let wide = i128::from(self) * i128::from(part) / i128::from(whole);
        wide.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    fn magnitude(self) -> Self {
        self.saturating_abs()
    }

    fn saturating_add(self, other: Self) -> Self {
        i64::saturating_add(self, other)
    }

    fn to_fixed(self) -> Fixed64 {
        Fixed64::saturating_from_num(self)
    }
}

/// Per-tick rate limits: how much a node can take in and give out.
///
/// A node with `max_output > 0` is a source, with `max_intake > 0` a sink;
/// both at once is a hybrid (storage). Neither makes it a conductor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits<A> {
    pub max_intake: A,
    pub max_output: A,
}

impl<A: Quantity> RateLimits<A> {
    pub fn new(max_intake: A, max_output: A) -> Self {
        Self {
            max_intake,
            max_output,
        }
    }

    pub fn none() -> Self {
        Self::new(A::ZERO, A::ZERO)
    }

    pub fn is_source(&self) -> bool {
        self.max_output > A::ZERO
    }

    pub fn is_sink(&self) -> bool {
        self.max_intake > A::ZERO
    }

    pub fn is_conductor(&self) -> bool {
        !self.is_source() && !self.is_sink()
    }
}

// ---------------------------------------------------------------------------
// Resource kinds
// ---------------------------------------------------------------------------

/// One simulation domain. Implemented by the [`Electrical`] and [`Fluid`]
/// marker types.
pub trait Resource: Debug + Clone + Copy + PartialEq + Default + 'static {
    const KIND: ResourceKind;

    /// Signed amount moved per tick.
    type Amount: Quantity;

    /// Kind-specific level state reported by a node.
    type Level: Clone + Debug;

    /// Key that must match for two adjacent nodes to share a network.
    type Partition: Copy + Eq + Ord + Hash + Debug;

    /// Network-wide driving level handed to `transfer`.
    type Drive: Copy + PartialEq + Debug + Default;

    fn partition(level: &Self::Level) -> Self::Partition;

    /// The driving level of a network, derived from its sources.
    fn drive<'a>(sources: impl IntoIterator<Item = &'a Self::Level>) -> Self::Drive;

    /// Instrumentation-only loss for a participant that moved `moved` this
    /// tick over `dt` seconds. Never fed back into allocation.
    fn loss(level: &Self::Level, moved: Self::Amount, dt: Fixed64) -> Fixed64;

    /// The medium a partition stands for, if the kind has media.
    fn medium(partition: &Self::Partition) -> Option<MediumId>;

    /// Look up this kind's capability in a block's capability table.
    fn capability<'a>(block: &'a dyn Block) -> Option<&'a dyn FlowNode<Self>>;

    fn capability_mut<'a>(block: &'a mut dyn Block) -> Option<&'a mut dyn FlowNode<Self>>;
}

/// Level state of an electrical node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectricState {
    /// Terminal voltage in volts.
    pub voltage: Fixed64,
    /// Internal resistance in ohms.
    pub internal_resistance: Fixed64,
}

/// Level state of a fluid node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluidState {
    /// Pressure in kPa.
    pub pressure: Fixed64,
    /// Internal volume in mB. `amount` is always within `[0, capacity]`.
    pub capacity: i64,
    /// Current volume in mB.
    pub amount: i64,
    pub medium: MediumId,
}

/// Voltage/current domain. Quantities are amperes per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Electrical;

/// Pressure/volume domain. Quantities are millibuckets per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Fluid;

impl Resource for Electrical {
    const KIND: ResourceKind = ResourceKind::Electrical;
    type Amount = Fixed64;
    type Level = ElectricState;
    type Partition = ();
    /// Volts: the highest source voltage in the network.
    type Drive = Fixed64;

    fn partition(_level: &ElectricState) -> Self::Partition {}

    fn drive<'a>(sources: impl IntoIterator<Item = &'a ElectricState>) -> Fixed64 {
        sources
            .into_iter()
            .map(|s| s.voltage)
            .fold(Fixed64::ZERO, Fixed64::max)
    }

    fn loss(level: &ElectricState, moved: Fixed64, dt: Fixed64) -> Fixed64 {
        square_64(moved)
            .saturating_mul(level.internal_resistance)
            .saturating_mul(dt)
    }

    fn medium(_partition: &()) -> Option<MediumId> {
        None
    }

    fn capability<'a>(block: &'a dyn Block) -> Option<&'a dyn FlowNode<Self>> {
        block.electric()
    }

    fn capability_mut<'a>(block: &'a mut dyn Block) -> Option<&'a mut dyn FlowNode<Self>> {
        block.electric_mut()
    }
}

impl Resource for Fluid {
    const KIND: ResourceKind = ResourceKind::Fluid;
    type Amount = i64;
    type Level = FluidState;
    type Partition = MediumId;
    /// kPa: the highest source pressure in the network.
    type Drive = Fixed64;

    fn partition(level: &FluidState) -> MediumId {
        level.medium
    }

    fn drive<'a>(sources: impl IntoIterator<Item = &'a FluidState>) -> Fixed64 {
        sources
            .into_iter()
            .map(|s| s.pressure)
            .fold(Fixed64::ZERO, Fixed64::max)
    }

    fn loss(_level: &FluidState, _moved: i64, _dt: Fixed64) -> Fixed64 {
        Fixed64::ZERO
    }

    fn medium(partition: &MediumId) -> Option<MediumId> {
        Some(*partition)
    }

    fn capability<'a>(block: &'a dyn Block) -> Option<&'a dyn FlowNode<Self>> {
        block.fluid()
    }

    fn capability_mut<'a>(block: &'a mut dyn Block) -> Option<&'a mut dyn FlowNode<Self>> {
        block.fluid_mut()
    }
}

// ---------------------------------------------------------------------------
// Node contract
// ---------------------------------------------------------------------------

/// The per-kind contract a network node implements.
///
/// Structural changes (placement, removal, neighbour change) are reported
/// by the host to the registry's `mark_dirty`; a node that changes its own
/// connectivity reports it through [`BlockTick`](crate::block::BlockTick).
pub trait FlowNode<R: Resource> {
    fn rate_limits(&self) -> RateLimits<R::Amount>;

    fn level_state(&self) -> R::Level;

    /// Push (`requested > 0`) or pull (`requested < 0`) resource. Returns the
    /// signed amount actually moved, clipped to capacity and rate limits.
    /// Called at most once per role per tick.
    fn transfer(&mut self, drive: R::Drive, requested: R::Amount) -> R::Amount;

    /// Called on conductors once per tick with the network's driving level
    /// and the flow carried through the component.
    fn sense(&mut self, drive: R::Drive, flow: R::Amount) {
        let _ = (drive, flow);
    }
}
