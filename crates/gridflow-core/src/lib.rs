//! Gridflow Core -- resource network simulation for block worlds.
//!
//! Electrical and fluid networks are discovered as connected components of
//! capability-bearing blocks, rebuilt lazily as the world changes, and
//! ticked once per simulation step with a proportional one-pass allocator.
//!
//! # Per-Tick Pipeline
//!
//! Each call to [`registry::NetworkRegistry::step`] runs, for electrical and
//! then fluid networks:
//!
//! 1. **Schedule** -- Advance the debounced dirty tracker and release at most
//!    a fixed budget of due origins.
//! 2. **Discover** -- Flood-fill from the due origins over same-kind,
//!    same-medium adjacency.
//! 3. **Merge** -- Dissolve every network the new components touch and form
//!    the new ones, so splits and merges are handled alike.
//! 4. **Distribute** -- Tick every live network: classify members, compute
//!    `min(supply, demand)`, and split it proportionally by rate capacity.
//!
//! # Key Types
//!
//! - [`capability::Resource`] -- per-kind quantity, level, and partition
//!   types, implemented by [`capability::Electrical`] and [`capability::Fluid`].
//! - [`capability::FlowNode`] -- the contract every network node implements.
//! - [`block::Block`] -- a placed block's capability table.
//! - [`host::NodeHost`] -- adjacency and node lookup, supplied by the world.
//! - [`manager::NetworkManager`] / [`registry::NetworkRegistry`] -- ownership
//!   of live networks, one registry per world.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for electrical quantities.

pub mod block;
pub mod capability;
pub mod config;
pub mod dirty;
pub mod discovery;
pub mod event;
pub mod fixed;
pub mod host;
pub mod id;
pub mod manager;
pub mod network;
pub mod registry;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
