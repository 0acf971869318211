//! Core configuration for vexi-machine-core.

use serde::{Deserialize, Serialize};

/// Configuration for engine sizing and feature flags.
/// Keep this minimal; expand as needed without breaking API.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Initial capacity hint for per-frame pose buffers.
    pub pose_capacity: usize,

    /// Number of reset-pool snapshot buffers to keep warm.
    pub reset_pool_warm: usize,

    /// Maximum reported events to retain per tick before older ones drop.
    pub max_events_per_tick: usize,

    /// Pointer hit-test tolerance in artboard units.
    pub pointer_tolerance: f32,

    /// Enable the listener early-out short-circuit. Observable behavior is
    /// identical either way; tests cover the equivalence.
    pub listener_early_out: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pose_capacity: 256,
            reset_pool_warm: 0,
            max_events_per_tick: 1024,
            pointer_tolerance: 2.0,
            listener_early_out: true,
        }
    }
}
