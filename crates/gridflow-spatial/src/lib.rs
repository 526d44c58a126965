//! Reference host for Gridflow networks: a chunked 3-D block grid.
//!
//! [`GridWorld`] stores blocks, tracks which chunks are loaded, and records
//! dirty signals on every structural change. It implements
//! [`NodeHost`](gridflow_core::host::NodeHost) for both resource kinds, so a
//! [`NetworkRegistry`](gridflow_core::registry::NetworkRegistry) can discover
//! and tick networks over it directly. [`Simulation`] ties the two together
//! with a tick counter.

pub mod simulation;
pub mod snapshot;
pub mod world;

pub use simulation::{Simulation, SimulationReport};
pub use snapshot::{BlockFactory, SnapshotError, WorldSnapshot};
pub use world::{BlockKey, BlockTickSummary, DirtySignal, GridWorld, SpatialError};
