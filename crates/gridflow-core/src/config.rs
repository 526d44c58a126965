use serde::{Deserialize, Serialize};

use crate::fixed::Fixed64;

/// Ticks per simulated second.
pub const TICKS_PER_SECOND: u32 = 20;

/// Tuning for the dirty scheduler and network ticks.
///
/// Loaded from data files by `gridflow-data`; every field has a default so a
/// partial file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ticks a dirty origin must stay quiet before it is rebuilt.
    pub debounce_ticks: u32,
    /// Rebuilds processed per kind per step. Must be at least 1.
    pub max_rebuilds_per_step: usize,
    /// Countdown given to a due origin that did not fit in the step budget.
    pub requeue_delay: u32,
    /// Seconds per tick, used only for loss instrumentation.
    pub tick_seconds: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ticks: 4,
            max_rebuilds_per_step: 2,
            requeue_delay: 4,
            tick_seconds: 1.0 / f64::from(TICKS_PER_SECOND),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rebuilds_per_step == 0 {
            return Err(ConfigError::ZeroRebuildBudget);
        }
        if !self.tick_seconds.is_finite()
            || self.tick_seconds <= 0.0
            || Fixed64::checked_from_num(self.tick_seconds).is_none()
        {
            return Err(ConfigError::InvalidTickSeconds(self.tick_seconds));
        }
        Ok(())
    }

    pub fn tick_seconds_fixed(&self) -> Fixed64 {
        if self.tick_seconds.is_finite() {
            Fixed64::saturating_from_num(self.tick_seconds)
        } else {
            Fixed64::ZERO
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_rebuilds_per_step must be at least 1")]
    ZeroRebuildBudget,
    #[error("tick_seconds must be a positive finite number in fixed-point range, got {0}")]
    InvalidTickSeconds(f64),
}
