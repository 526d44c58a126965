//! Network lifecycle events.
//!
//! Emitted by the managers while applying rebuilds, collected into the step
//! report so a host can drive UI, sound, or analytics without polling.

use serde::{Deserialize, Serialize};

use crate::fixed::Ticks;
use crate::id::{NetworkId, ResourceKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkEvent {
    /// A network was created by a rebuild or rescan.
    Formed {
        network: NetworkId,
        kind: ResourceKind,
        size: usize,
        tick: Ticks,
    },
    /// A network was replaced or its members disappeared.
    Dissolved {
        network: NetworkId,
        kind: ResourceKind,
        tick: Ticks,
    },
    /// Every network of a kind was rediscovered from scratch.
    Rescanned {
        kind: ResourceKind,
        networks: usize,
        tick: Ticks,
    },
}

impl NetworkEvent {
    pub fn kind(&self) -> ResourceKind {
        match self {
            NetworkEvent::Formed { kind, .. }
            | NetworkEvent::Dissolved { kind, .. }
            | NetworkEvent::Rescanned { kind, .. } => *kind,
        }
    }

    pub fn tick(&self) -> Ticks {
        match self {
            NetworkEvent::Formed { tick, .. }
            | NetworkEvent::Dissolved { tick, .. }
            | NetworkEvent::Rescanned { tick, .. } => *tick,
        }
    }
}
