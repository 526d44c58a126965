//! Block storage, chunk visibility, and structural change signals.

use std::collections::{BTreeMap, BTreeSet};

use gridflow_core::block::{Block, FluidRelease};
use gridflow_core::capability::{FlowNode, Fluid, Resource};
use gridflow_core::fixed::{Fixed64, Ticks};
use gridflow_core::host::NodeHost;
use gridflow_core::id::{BlockPos, ChunkPos, KindSet, ResourceKind};
use log::debug;
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap, new_key_type};

new_key_type! {
    /// Identifies a block in a [`GridWorld`]. Keys are never reused.
    pub struct BlockKey;
}

/// Errors from placement and chunk operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpatialError {
    #[error("position {0:?} is occupied")]
    Occupied(BlockPos),
    #[error("position {0:?} is empty")]
    Empty(BlockPos),
    #[error("chunk {0:?} is not loaded")]
    ChunkNotLoaded(ChunkPos),
}

/// A position whose networks of `kind` must be rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DirtySignal {
    pub pos: BlockPos,
    pub kind: ResourceKind,
}

/// What one pass of [`GridWorld::tick_blocks`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockTickSummary {
    pub ticked: usize,
    pub topology_changes: usize,
    /// Volume accepted by neighbours of venting blocks, in mB.
    pub released: i64,
    /// Volume no neighbour accepted and the venting block could not take
    /// back, in mB.
    pub vented: i64,
}

/// A 3-D grid of blocks.
///
/// Blocks live in a slot map keyed by [`BlockKey`]; a position index maps
/// occupied positions to keys. Only blocks in loaded chunks are visible
/// through the [`NodeHost`] interface and to [`tick_blocks`](Self::tick_blocks).
///
/// Every structural change (place, remove, replace, chunk load or unload, a
/// block's capability change) records [`DirtySignal`]s for the affected
/// position and its neighbours that hold a node of the same kind. The owner
/// drains them with [`take_dirty`](Self::take_dirty) and forwards them to its
/// network registry.
#[derive(Debug, Default)]
pub struct GridWorld {
    blocks: SlotMap<BlockKey, Box<dyn Block>>,
    index: BTreeMap<BlockPos, BlockKey>,
    positions: SecondaryMap<BlockKey, BlockPos>,
    /// Capabilities each block had when last observed.
    kinds: SecondaryMap<BlockKey, KindSet>,
    loaded: BTreeSet<ChunkPos>,
    dirty: BTreeSet<DirtySignal>,
}

impl GridWorld {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Chunks --

    pub fn is_loaded(&self, chunk: ChunkPos) -> bool {
        self.loaded.contains(&chunk)
    }

    pub fn loaded_chunks(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.loaded.iter().copied()
    }

    /// Make a chunk's blocks visible. Returns `false` if it was already loaded.
    pub fn load_chunk(&mut self, chunk: ChunkPos) -> bool {
        if !self.loaded.insert(chunk) {
            return false;
        }
        let inside = self.positions_in_chunk(chunk);
        debug!("chunk {:?} loaded with {} block(s)", chunk, inside.len());
        for pos in inside {
            let kinds = self.declared_kinds(pos);
            self.signal(pos, kinds);
        }
        true
    }

    /// Hide a chunk's blocks. Returns `false` if it was not loaded.
    pub fn unload_chunk(&mut self, chunk: ChunkPos) -> bool {
        if !self.loaded.contains(&chunk) {
            return false;
        }
        let inside = self.positions_in_chunk(chunk);
        // Signal while the blocks are still visible so neighbours are found.
        for &pos in &inside {
            let kinds = self.declared_kinds(pos);
            self.signal(pos, kinds);
        }
        self.loaded.remove(&chunk);
        debug!("chunk {:?} unloaded with {} block(s)", chunk, inside.len());
        true
    }

    /// Load every chunk covering the columns between `a` and `b` inclusive.
    pub fn load_area(&mut self, a: BlockPos, b: BlockPos) {
        let (lo, hi) = (a.chunk(), b.chunk());
        for x in lo.x.min(hi.x)..=lo.x.max(hi.x) {
            for z in lo.z.min(hi.z)..=lo.z.max(hi.z) {
                self.load_chunk(ChunkPos::new(x, z));
            }
        }
    }

    fn positions_in_chunk(&self, chunk: ChunkPos) -> Vec<BlockPos> {
        self.index
            .keys()
            .filter(|p| p.chunk() == chunk)
            .copied()
            .collect()
    }

    fn visible(&self, pos: BlockPos) -> bool {
        self.loaded.contains(&pos.chunk())
    }

    fn require_loaded(&self, pos: BlockPos) -> Result<(), SpatialError> {
        if self.visible(pos) {
            Ok(())
        } else {
            Err(SpatialError::ChunkNotLoaded(pos.chunk()))
        }
    }

    // -- Placement --

    pub fn place(&mut self, pos: BlockPos, block: impl Block + 'static) -> Result<BlockKey, SpatialError> {
        self.place_boxed(pos, Box::new(block))
    }

    pub fn place_boxed(&mut self, pos: BlockPos, block: Box<dyn Block>) -> Result<BlockKey, SpatialError> {
        self.require_loaded(pos)?;
        if self.index.contains_key(&pos) {
            return Err(SpatialError::Occupied(pos));
        }
        let kinds = block.capabilities();
        let key = self.blocks.insert(block);
        self.index.insert(pos, key);
        self.positions.insert(key, pos);
        self.kinds.insert(key, kinds);
        self.signal(pos, kinds);
        Ok(key)
    }

    pub fn remove(&mut self, pos: BlockPos) -> Result<Box<dyn Block>, SpatialError> {
        self.require_loaded(pos)?;
        let key = self.index.get(&pos).copied().ok_or(SpatialError::Empty(pos))?;
        let kinds = self.kinds.get(key).copied().unwrap_or_default();
        self.signal(pos, kinds);
        self.index.remove(&pos);
        self.positions.remove(key);
        self.kinds.remove(key);
        self.blocks.remove(key).ok_or(SpatialError::Empty(pos))
    }

    /// Swap the block at `pos` for another, returning the old one.
    pub fn replace(&mut self, pos: BlockPos, block: impl Block + 'static) -> Result<Box<dyn Block>, SpatialError> {
        self.require_loaded(pos)?;
        let key = self.index.get(&pos).copied().ok_or(SpatialError::Empty(pos))?;
        let slot = self.blocks.get_mut(key).ok_or(SpatialError::Empty(pos))?;
        let new_kinds = block.capabilities();
        let old = std::mem::replace(slot, Box::new(block));
        let old_kinds = self.kinds.insert(key, new_kinds).unwrap_or_default();
        self.signal(pos, union(old_kinds, new_kinds));
        Ok(old)
    }

    // -- Queries --

    pub fn block(&self, pos: BlockPos) -> Option<&dyn Block> {
        if !self.visible(pos) {
            return None;
        }
        let key = self.index.get(&pos)?;
        self.blocks.get(*key).map(|b| b.as_ref())
    }

    pub fn block_mut(&mut self, pos: BlockPos) -> Option<&mut dyn Block> {
        if !self.visible(pos) {
            return None;
        }
        let key = self.index.get(&pos)?;
        match self.blocks.get_mut(*key) {
            Some(block) => Some(block.as_mut()),
            None => None,
        }
    }

    pub fn get<T: Block + 'static>(&self, pos: BlockPos) -> Option<&T> {
        self.block(pos)?.as_any().downcast_ref()
    }

    pub fn get_mut<T: Block + 'static>(&mut self, pos: BlockPos) -> Option<&mut T> {
        self.block_mut(pos)?.as_any_mut().downcast_mut()
    }

    pub fn key_at(&self, pos: BlockPos) -> Option<BlockKey> {
        self.index.get(&pos).copied()
    }

    pub fn position_of(&self, key: BlockKey) -> Option<BlockPos> {
        self.positions.get(key).copied()
    }

    /// Capabilities the block at `pos` had when last observed.
    pub fn declared_kinds(&self, pos: BlockPos) -> KindSet {
        self.index
            .get(&pos)
            .and_then(|k| self.kinds.get(*k))
            .copied()
            .unwrap_or_default()
    }

    /// Every occupied position, loaded or not, in ascending order.
    pub fn positions(&self) -> impl Iterator<Item = BlockPos> + '_ {
        self.index.keys().copied()
    }

    /// Every occupied position with its block, loaded or not.
    pub fn iter(&self) -> impl Iterator<Item = (BlockPos, &dyn Block)> + '_ {
        self.index
            .iter()
            .filter_map(|(p, k)| self.blocks.get(*k).map(|b| (*p, b.as_ref())))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    // -- Dirty signals --

    /// Drain the recorded structural change signals, in position order.
    pub fn take_dirty(&mut self) -> Vec<DirtySignal> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Record `pos` for every kind in `kinds`, plus each visible neighbour
    /// that currently holds a node of that kind.
    fn signal(&mut self, pos: BlockPos, kinds: KindSet) {
        for kind in kinds.iter() {
            self.dirty.insert(DirtySignal { pos, kind });
            for n in pos.neighbors() {
                if self.has_kind(n, kind) {
                    self.dirty.insert(DirtySignal { pos: n, kind });
                }
            }
        }
    }

    fn has_kind(&self, pos: BlockPos, kind: ResourceKind) -> bool {
        self.block(pos)
            .is_some_and(|b| b.capabilities().contains(kind))
    }

    // -- Ticking --

    /// Run every visible block's own tick in position order.
    ///
    /// A block that reports a topology change, or whose capabilities differ
    /// from what was last observed, is signalled for the union of its old
    /// and new kinds. Fluid releases are offered to adjacent fluid nodes of
    /// the same medium in neighbour order; what they reject goes back to the
    /// releasing block, and what it cannot take back is vented.
    pub fn tick_blocks(&mut self, tick: Ticks) -> BlockTickSummary {
        let mut summary = BlockTickSummary::default();
        let visible: Vec<(BlockPos, BlockKey)> = self
            .index
            .iter()
            .filter(|(p, _)| self.visible(**p))
            .map(|(p, k)| (*p, *k))
            .collect();

        for (pos, key) in visible {
            let Some(block) = self.blocks.get_mut(key) else {
                continue;
            };
            let outcome = block.on_tick(tick);
            let now = block.capabilities();
            summary.ticked += 1;

            let before = self.kinds.insert(key, now).unwrap_or_default();
            if outcome.topology_changed || before != now {
                summary.topology_changes += 1;
                self.signal(pos, union(before, now));
            }
            if let Some(release) = outcome.release {
                let (accepted, vented) = self.route_release(pos, release);
                summary.released += accepted;
                summary.vented += vented;
            }
        }
        summary
    }

    /// Returns `(accepted by neighbours, vented)`.
    fn route_release(&mut self, from: BlockPos, release: FluidRelease) -> (i64, i64) {
        let drive = NodeHost::<Fluid>::node(self, from)
            .map(|n| n.level_state().pressure)
            .unwrap_or(Fixed64::ZERO);
        let mut remaining = release.amount.max(0);

        for n in from.neighbors() {
            if remaining == 0 {
                break;
            }
            let Some(node) = NodeHost::<Fluid>::node_mut(self, n) else {
                continue;
            };
            if node.level_state().medium != release.medium {
                continue;
            }
            let accepted = node.transfer(drive, remaining).clamp(0, remaining);
            remaining -= accepted;
        }

        let accepted = release.amount.max(0) - remaining;
        let mut vented = remaining;
        if remaining > 0 {
            if let Some(source) = NodeHost::<Fluid>::node_mut(self, from) {
                vented -= source.transfer(drive, remaining).clamp(0, remaining);
            }
        }
        if vented > 0 {
            debug!("{} mB vented at {:?}", vented, from);
        }
        (accepted, vented)
    }
}

fn union(a: KindSet, b: KindSet) -> KindSet {
    let mut set = a;
    for kind in b.iter() {
        set.insert(kind);
    }
    set
}

impl<R: Resource> NodeHost<R> for GridWorld {
    fn neighbors(&self, pos: BlockPos) -> Vec<BlockPos> {
        pos.neighbors()
            .into_iter()
            .filter(|n| NodeHost::<R>::node(self, *n).is_some())
            .collect()
    }

    fn node(&self, pos: BlockPos) -> Option<&dyn FlowNode<R>> {
        self.block(pos).and_then(R::capability)
    }

    fn node_mut(&mut self, pos: BlockPos) -> Option<&mut dyn FlowNode<R>> {
        self.block_mut(pos).and_then(R::capability_mut)
    }

    fn nodes(&self) -> Vec<BlockPos> {
        self.index
            .iter()
            .filter(|(p, _)| self.visible(**p))
            .filter(|(_, k)| {
                self.blocks
                    .get(**k)
                    .is_some_and(|b| R::capability(b.as_ref()).is_some())
            })
            .map(|(p, _)| *p)
            .collect()
    }
}
