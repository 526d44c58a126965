//! Blocks: the things a host places at positions.
//!
//! A block declares which resource kinds it participates in through its
//! capability table ([`Block::electric`], [`Block::fluid`]). A block may
//! participate in both kinds at once (an electric pump); the two networks
//! never interact through it except via the block's own internal logic.

use std::any::Any;

use crate::capability::{Electrical, FlowNode, Fluid};
use crate::fixed::Ticks;
use crate::id::{KindSet, MediumId, ResourceKind};

// ---------------------------------------------------------------------------
// Block trait
// ---------------------------------------------------------------------------

/// A placeable block with an optional capability per resource kind.
///
/// The capability accessors are consulted every time discovery or a network
/// tick looks at the block, so a block may gain or lose a capability at
/// runtime (a tripped breaker stops conducting). When that happens it must
/// report `topology_changed` from [`on_tick`](Block::on_tick) so its host
/// marks the surrounding networks dirty.
pub trait Block: std::fmt::Debug {
    /// Human-readable name, used in logs and snapshots.
    fn name(&self) -> &str;

    fn electric(&self) -> Option<&dyn FlowNode<Electrical>> {
        None
    }

    fn electric_mut(&mut self) -> Option<&mut dyn FlowNode<Electrical>> {
        None
    }

    fn fluid(&self) -> Option<&dyn FlowNode<Fluid>> {
        None
    }

    fn fluid_mut(&mut self) -> Option<&mut dyn FlowNode<Fluid>> {
        None
    }

    /// The kinds this block currently participates in.
    fn capabilities(&self) -> KindSet {
        let mut set = KindSet::NONE;
        if self.electric().is_some() {
            set.insert(ResourceKind::Electrical);
        }
        if self.fluid().is_some() {
            set.insert(ResourceKind::Fluid);
        }
        set
    }

    /// Per-tick block logic, run by the host before networks distribute.
    fn on_tick(&mut self, tick: Ticks) -> BlockTick {
        let _ = tick;
        BlockTick::default()
    }

    /// Serialize this block's attributes for save games.
    /// Returns an empty vec by default (stateless block).
    fn serialize_state(&self) -> Vec<u8> {
        Vec::new()
    }

    /// Load previously serialized attributes. Returns `Ok(())` by default (no-op).
    fn load_state(&mut self, _data: &[u8]) -> Result<(), BlockError> {
        Ok(())
    }

    /// Downcast to `&dyn Any` for typed access to concrete blocks.
    fn as_any(&self) -> &dyn Any;

    /// Downcast to `&mut dyn Any` for typed mutable access to concrete blocks.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// What a block's own tick asks of its host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockTick {
    /// The block's connectivity changed; its position must be marked dirty.
    pub topology_changed: bool,
    /// Fluid the block vents into adjacent nodes of the same medium.
    pub release: Option<FluidRelease>,
}

impl BlockTick {
    pub fn topology_changed() -> Self {
        Self {
            topology_changed: true,
            release: None,
        }
    }

    pub fn release(medium: MediumId, amount: i64) -> Self {
        Self {
            topology_changed: false,
            release: Some(FluidRelease { medium, amount }),
        }
    }
}

/// Volume vented by a block outside of network distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FluidRelease {
    pub medium: MediumId,
    pub amount: i64,
}

/// Errors that can occur while restoring block state.
#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    /// Failed to deserialize block state from saved data.
    #[error("deserialize failed: {0}")]
    DeserializeFailed(String),
}
