use crate::capability::{FlowNode, Resource};
use crate::id::BlockPos;

/// The world-side view a network needs: adjacency and node lookup.
///
/// Implemented once per resource kind by whatever owns the blocks. Lookups
/// return `None` for positions that are empty, unloaded, or currently lack
/// the kind's capability; callers treat all three the same way.
pub trait NodeHost<R: Resource> {
    /// Positions adjacent to `pos` that currently hold a node of this kind.
    fn neighbors(&self, pos: BlockPos) -> Vec<BlockPos>;

    fn node(&self, pos: BlockPos) -> Option<&dyn FlowNode<R>>;

    fn node_mut(&mut self, pos: BlockPos) -> Option<&mut dyn FlowNode<R>>;

    /// Every position holding a node of this kind, in ascending order.
    fn nodes(&self) -> Vec<BlockPos>;
}
