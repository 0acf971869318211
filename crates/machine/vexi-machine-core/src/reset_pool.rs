//! Pooled pose snapshots used as interpolation baselines.
//!
//! A transition with nonzero duration captures the source state's pose the
//! instant it begins, so the destination blends from that snapshot rather
//! than from the live pose. Blend states flagged for baseline reset hold a
//! snapshot for their whole lifetime.
//!
//! The pool is an explicit service object owned by the context that
//! creates instances and shared by handle; it is single-threaded by
//! contract (all instances are driven from one thread).

use std::cell::RefCell;
use std::rc::Rc;

use crate::pose::PoseBuffer;

/// An acquired snapshot buffer. Must be given back via `ResetPool::release`;
/// a resource is never referenced after release.
#[derive(Debug)]
pub struct ResetResource {
    pub(crate) snapshot: PoseBuffer,
    /// Owner key, for diagnostics only.
    pub(crate) key: u64,
    epoch: u32,
}

impl ResetResource {
    #[inline]
    pub fn snapshot(&self) -> &PoseBuffer {
        &self.snapshot
    }

    #[inline]
    pub fn snapshot_mut(&mut self) -> &mut PoseBuffer {
        &mut self.snapshot
    }

    #[inline]
    pub fn key(&self) -> u64 {
        self.key
    }
}

#[derive(Debug, Default)]
pub struct ResetPool {
    free: Vec<PoseBuffer>,
    outstanding: usize,
    high_water: usize,
    /// Bumped by `release_resources`; releases from an older epoch are
    /// discarded instead of returning to the pool.
    epoch: u32,
}

impl ResetPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate `warm` snapshot buffers.
    pub fn with_warm(warm: usize) -> Self {
        let mut pool = Self::new();
        pool.free.resize_with(warm, PoseBuffer::new);
        pool
    }

    /// Take a snapshot buffer, reusing a pooled one when available.
    /// The pool only grows when more concurrent baselines are needed than
    /// have ever been needed before.
    pub fn acquire(&mut self, key: u64) -> ResetResource {
        let snapshot = self.free.pop().unwrap_or_default();
        self.outstanding += 1;
        self.high_water = self.high_water.max(self.outstanding);
        ResetResource {
            snapshot,
            key,
            epoch: self.epoch,
        }
    }

    /// Return a snapshot buffer to the pool.
    pub fn release(&mut self, mut resource: ResetResource) {
        if resource.epoch != self.epoch {
            // Acquired before a global reset; the pool already forgot it.
            return;
        }
        resource.snapshot.clear();
        self.outstanding = self.outstanding.saturating_sub(1);
        self.free.push(resource.snapshot);
    }

    /// Outstanding (acquired, not yet released) snapshot count. Equals the
    /// number of transitions/blends currently requiring a frozen baseline.
    #[inline]
    pub fn resources_count(&self) -> usize {
        self.outstanding
    }

    /// Buffers currently idle in the pool.
    #[inline]
    pub fn pooled_count(&self) -> usize {
        self.free.len()
    }

    #[inline]
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Global reset used by hosts and tests: outstanding count drops to
    /// zero and pooled buffers are discarded.
    pub fn release_resources(&mut self) {
        self.free.clear();
        self.outstanding = 0;
        self.high_water = 0;
        self.epoch = self.epoch.wrapping_add(1);
    }
}

/// Shared single-threaded handle to the pool.
pub type PoolHandle = Rc<RefCell<ResetPool>>;

pub fn new_pool_handle(warm: usize) -> PoolHandle {
    Rc::new(RefCell::new(ResetPool::with_warm(warm)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_release_pairs_track_outstanding() {
        let mut pool = ResetPool::new();
        assert_eq!(pool.resources_count(), 0);
        let a = pool.acquire(1);
        let b = pool.acquire(2);
        assert_eq!(pool.resources_count(), 2);
        pool.release(a);
        assert_eq!(pool.resources_count(), 1);
        assert_eq!(pool.pooled_count(), 1);
        pool.release(b);
        assert_eq!(pool.resources_count(), 0);
        assert_eq!(pool.pooled_count(), 2);
        assert_eq!(pool.high_water(), 2);
    }

    #[test]
    fn pool_reuses_buffers_instead_of_growing() {
        let mut pool = ResetPool::new();
        let a = pool.acquire(1);
        pool.release(a);
        let b = pool.acquire(2);
        assert_eq!(pool.pooled_count(), 0); // reused, not grown
        pool.release(b);
        assert_eq!(pool.pooled_count(), 1);
    }

    #[test]
    fn release_resources_resets_to_baseline() {
        let mut pool = ResetPool::new();
        let held = pool.acquire(1);
        let released = pool.acquire(2);
        pool.release(released);
        pool.release_resources();
        assert_eq!(pool.resources_count(), 0);
        assert_eq!(pool.pooled_count(), 0);
        // A stale release after the global reset is discarded.
        pool.release(held);
        assert_eq!(pool.resources_count(), 0);
        assert_eq!(pool.pooled_count(), 0);
    }
}
