//! The machine context: owns the reset pool and creates instances.
//!
//! Every instance created from one context shares its pool, so baseline
//! snapshots are recycled across machines instead of growing per
//! instance. Contexts are single-threaded; a host wanting machines on
//! several threads creates one context per thread.

use std::rc::Rc;

use crate::artboard::ArtboardInstance;
use crate::config::Config;
use crate::def::{DefError, StateMachineDef};
use crate::instance::StateMachineInstance;
use crate::reset_pool::{new_pool_handle, PoolHandle};

pub struct MachineContext {
    pool: PoolHandle,
    config: Config,
    next_key: u64,
}

impl MachineContext {
    pub fn new(config: Config) -> Self {
        Self {
            pool: new_pool_handle(config.reset_pool_warm),
            config,
            next_key: 0,
        }
    }

    /// Create a live instance of `def` bound to `artboard`. Validates the
    /// definition; dangling references inside a valid definition degrade
    /// at runtime instead.
    pub fn instantiate(
        &mut self,
        def: Rc<StateMachineDef>,
        artboard: ArtboardInstance,
    ) -> Result<StateMachineInstance, DefError> {
        let key = self.next_key;
        self.next_key += 1;
        StateMachineInstance::new(def, artboard, self.pool.clone(), self.config, key)
    }

    /// Baseline snapshots currently held by live transitions and blends.
    pub fn resources_count(&self) -> usize {
        self.pool.borrow().resources_count()
    }

    /// Idle snapshot buffers waiting for reuse.
    pub fn pooled_count(&self) -> usize {
        self.pool.borrow().pooled_count()
    }

    /// Drop all pooled buffers and forget outstanding ones. Instances
    /// still alive keep working; their releases after this point are
    /// discarded instead of repooled.
    pub fn release_resources(&self) {
        self.pool.borrow_mut().release_resources();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Default for MachineContext {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
