//! Debounced, rate-limited dirty tracking.
//!
//! Topology edits mark an origin position dirty. Nothing is rebuilt until an
//! origin has stayed quiet for a debounce window, and at most a fixed budget
//! of rebuilds is handed out per step so a burst of edits is spread across
//! several ticks. One [`DirtyTracker`] exists per resource kind.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::id::BlockPos;

/// A queued origin and the ticks left before it becomes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyEntry {
    pub origin: BlockPos,
    pub countdown: u32,
}

/// Work released by one [`DirtyTracker::step`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DueWork {
    /// A full rescan is due. Supersedes every queued origin.
    pub full_rescan: bool,
    /// Due origins in queue order, at most the per-step budget.
    pub origins: Vec<BlockPos>,
}

impl DueWork {
    pub fn is_empty(&self) -> bool {
        !self.full_rescan && self.origins.is_empty()
    }
}

/// FIFO of dirty origins, deduplicated by position.
///
/// Re-marking a queued origin re-arms its countdown but keeps its place in
/// the queue.
#[derive(Debug, Clone)]
pub struct DirtyTracker {
    entries: VecDeque<DirtyEntry>,
    rescan: Option<u32>,
    debounce_ticks: u32,
    max_rebuilds_per_step: usize,
    requeue_delay: u32,
}

impl Default for DirtyTracker {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl DirtyTracker {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            entries: VecDeque::new(),
            rescan: None,
            debounce_ticks: config.debounce_ticks,
            max_rebuilds_per_step: config.max_rebuilds_per_step.max(1),
            requeue_delay: config.requeue_delay,
        }
    }

    /// Queue `origin` for rebuild, or re-arm it if already queued.
    pub fn mark(&mut self, origin: BlockPos) {
        let debounce = self.debounce_ticks;
        match self.entries.iter_mut().find(|e| e.origin == origin) {
            Some(entry) => entry.countdown = debounce,
            None => self.entries.push_back(DirtyEntry {
                origin,
                countdown: debounce,
            }),
        }
    }

    /// Queue a full rescan of every node of this kind.
    pub fn mark_all(&mut self) {
        self.rescan = Some(self.debounce_ticks);
    }

    /// Returns `true` if anything is queued.
    pub fn is_dirty(&self) -> bool {
        self.rescan.is_some() || !self.entries.is_empty()
    }

    pub fn is_pending(&self, origin: BlockPos) -> bool {
        self.entries.iter().any(|e| e.origin == origin)
    }

    pub fn rescan_pending(&self) -> bool {
        self.rescan.is_some()
    }

    /// Number of queued origins.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = &DirtyEntry> {
        self.entries.iter()
    }

    /// Advance every countdown by one tick and release due work.
    ///
    /// Due origins beyond the budget are re-armed with the requeue delay and
    /// keep their queue position. A due full rescan consumes one budget slot
    /// and clears the queue.
    pub fn step(&mut self) -> DueWork {
        for entry in self.entries.iter_mut() {
            entry.countdown = entry.countdown.saturating_sub(1);
        }
        if let Some(countdown) = self.rescan.as_mut() {
            *countdown = countdown.saturating_sub(1);
        }

        let mut due = DueWork::default();
        if self.rescan == Some(0) {
            self.rescan = None;
            self.entries.clear();
            due.full_rescan = true;
            return due;
        }

        let mut budget = self.max_rebuilds_per_step;
        for entry in self.entries.iter_mut() {
            if entry.countdown > 0 {
                continue;
            }
            if budget > 0 {
                due.origins.push(entry.origin);
                budget -= 1;
            } else {
                entry.countdown = self.requeue_delay;
            }
        }
        if !due.origins.is_empty() {
            self.entries.retain(|e| !due.origins.contains(&e.origin));
        }
        due
    }

    /// Drop all queued work.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.rescan = None;
    }
}
