//! Binary world snapshots.
//!
//! A snapshot records, per occupied position, the block's name and its own
//! serialized state (see [`Block::serialize_state`]). Restoring needs a
//! [`BlockFactory`] that turns a name back into a fresh block, onto which the
//! saved state is loaded. Networks are not saved: they are rediscovered from
//! the restored world.

use gridflow_core::block::{Block, BlockError};
use gridflow_core::config::ConfigError;
use gridflow_core::fixed::Ticks;
use gridflow_core::id::{BlockPos, ChunkPos};
use serde::{Deserialize, Serialize};

use crate::world::{GridWorld, SpatialError};

/// Magic number identifying a Gridflow world snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x6F1D_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("no block named {name:?} (at {pos:?})")]
    UnknownBlock { pos: BlockPos, name: String },
    #[error("block at {pos:?} rejected its saved state")]
    BlockState {
        pos: BlockPos,
        #[source]
        source: BlockError,
    },
    #[error(transparent)]
    Spatial(#[from] SpatialError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Creates blocks by name when restoring a snapshot.
pub trait BlockFactory {
    fn create(&self, name: &str) -> Option<Box<dyn Block>>;
}

impl<F> BlockFactory for F
where
    F: Fn(&str) -> Option<Box<dyn Block>>,
{
    fn create(&self, name: &str) -> Option<Box<dyn Block>> {
        self(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Tick count at the time the snapshot was taken.
    pub tick: Ticks,
}

impl SnapshotHeader {
    pub fn new(tick: Ticks) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(SnapshotError::InvalidMagic(self.magic));
        }
        if self.version != FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// One saved block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub pos: BlockPos,
    pub name: String,
    pub state: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub header: SnapshotHeader,
    pub loaded: Vec<ChunkPos>,
    pub blocks: Vec<BlockRecord>,
}

impl WorldSnapshot {
    /// Capture every block, loaded or not, in position order.
    pub fn capture(world: &GridWorld, tick: Ticks) -> Self {
        Self {
            header: SnapshotHeader::new(tick),
            loaded: world.loaded_chunks().collect(),
            blocks: world
                .iter()
                .map(|(pos, block)| BlockRecord {
                    pos,
                    name: block.name().to_string(),
                    state: block.serialize_state(),
                })
                .collect(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        bitcode::serialize(self).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    pub fn decode(data: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self =
            bitcode::deserialize(data).map_err(|e| SnapshotError::Decode(e.to_string()))?;
        snapshot.header.validate()?;
        Ok(snapshot)
    }

    /// Rebuild a world. Chunks that were unloaded when the snapshot was
    /// taken are loaded for placement and unloaded again afterwards.
    pub fn restore(&self, factory: &dyn BlockFactory) -> Result<GridWorld, SnapshotError> {
        let mut world = GridWorld::new();
        for record in &self.blocks {
            let mut block = factory
                .create(&record.name)
                .ok_or_else(|| SnapshotError::UnknownBlock {
                    pos: record.pos,
                    name: record.name.clone(),
                })?;
            block
                .load_state(&record.state)
                .map_err(|source| SnapshotError::BlockState {
                    pos: record.pos,
                    source,
                })?;
            world.load_chunk(record.pos.chunk());
            world.place_boxed(record.pos, block)?;
        }
        let chunks: Vec<ChunkPos> = world.loaded_chunks().collect();
        for chunk in chunks {
            if !self.loaded.contains(&chunk) {
                world.unload_chunk(chunk);
            }
        }
        for &chunk in &self.loaded {
            world.load_chunk(chunk);
        }
        world.take_dirty();
        Ok(world)
    }
}

impl GridWorld {
    /// Encode this world as a snapshot taken at `tick`.
    pub fn snapshot(&self, tick: Ticks) -> Result<Vec<u8>, SnapshotError> {
        WorldSnapshot::capture(self, tick).encode()
    }

    /// Decode and rebuild a world. Returns it with the tick it was saved at.
    pub fn restore(data: &[u8], factory: &dyn BlockFactory) -> Result<(GridWorld, Ticks), SnapshotError> {
        let snapshot = WorldSnapshot::decode(data)?;
        let world = snapshot.restore(factory)?;
        Ok((world, snapshot.header.tick))
    }
}
