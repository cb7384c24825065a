//! Byte-budget accounting layered on top of the collector's own
//! allocation-count threshold (`rt_gc::GcConfig::threshold`,
//! §4.5 "Allocation"). The collector already decides *when* to sweep
//! from object counts; `MemoryManager` answers a different question —
//! whether the embedder's configured byte ceiling has been exceeded —
//! and is consulted independently by call sites that know the size of
//! what they're about to allocate (e.g. a string concatenation or a
//! bigint grown past its previous limb count).

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::{RtError, RtResult};

const MIN_GC_THRESHOLD_BYTES: usize = 1024 * 1024;

pub struct MemoryManager {
    allocated: AtomicUsize,
    limit: usize,
    last_live_bytes: AtomicUsize,
    gc_requested: AtomicBool,
}

impl MemoryManager {
    pub fn new(limit: usize) -> Self {
        Self {
            allocated: AtomicUsize::new(0),
            limit,
            last_live_bytes: AtomicUsize::new(0),
            gc_requested: AtomicBool::new(false),
        }
    }

    /// A manager with an effectively unlimited budget, for tests and
    /// embeddings that don't want byte-level enforcement.
    pub fn unbounded() -> Self {
        Self::new(usize::MAX / 2)
    }

    /// Book `size` bytes against the budget. Fails with `RtError::Fatal`
    /// if that would exceed the configured limit; callers are expected
    /// to have already requested (or triggered) a collection first via
    /// [`MemoryManager::should_collect`].
    pub fn reserve(&self, size: usize) -> RtResult<()> {
        let current = self.allocated.load(Ordering::Relaxed);
        if current.saturating_add(size) > self.limit {
            return Err(RtError::Fatal(format!(
                "allocation of {size} bytes would exceed the {}-byte heap limit",
                self.limit
            )));
        }
        self.allocated.fetch_add(size, Ordering::Relaxed);
        Ok(())
    }

    pub fn release(&self, size: usize) {
        self.allocated.fetch_sub(size, Ordering::Relaxed);
    }

    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Adaptive byte threshold: twice the live set measured at the
    /// last collection, floored at 1MiB. Mirrors the collector's own
    /// count-based threshold, applied to bytes instead of object
    /// counts.
    pub fn gc_threshold(&self) -> usize {
        usize::max(MIN_GC_THRESHOLD_BYTES, self.last_live_bytes.load(Ordering::Relaxed).saturating_mul(2))
    }

    pub fn should_collect(&self) -> bool {
        self.gc_requested.load(Ordering::Relaxed) || self.allocated() >= self.gc_threshold()
    }

    pub fn request_gc(&self) {
        self.gc_requested.store(true, Ordering::Relaxed);
    }

    /// Record the outcome of a completed collection: the live-byte
    /// estimate for computing the next threshold, and clear any
    /// pending explicit request.
    pub fn on_gc_complete(&self, live_bytes: usize) {
        self.last_live_bytes.store(live_bytes, Ordering::Relaxed);
        self.gc_requested.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_fails_past_the_limit() {
        let mgr = MemoryManager::new(100);
        mgr.reserve(60).unwrap();
        assert!(mgr.reserve(60).is_err());
        assert_eq!(mgr.allocated(), 60);
    }

    #[test]
    fn release_frees_booked_bytes() {
        let mgr = MemoryManager::new(100);
        mgr.reserve(50).unwrap();
        mgr.release(50);
        assert_eq!(mgr.allocated(), 0);
    }

    #[test]
    fn explicit_request_forces_should_collect() {
        let mgr = MemoryManager::unbounded();
        assert!(!mgr.should_collect());
        mgr.request_gc();
        assert!(mgr.should_collect());
        mgr.on_gc_complete(0);
        assert!(!mgr.should_collect());
    }

    #[test]
    fn threshold_adapts_to_last_live_size() {
        let mgr = MemoryManager::unbounded();
        mgr.on_gc_complete(10 * 1024 * 1024);
        assert_eq!(mgr.gc_threshold(), 20 * 1024 * 1024);
    }
}
