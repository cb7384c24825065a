//! Cross-thread GC state: the four object-value queues, the deferred-free
//! queue, and the scheduling flags, all behind one mutex and one condvar
//! as specified in §5 ("Concurrency & Resource Model").
//!
//! Per-object marked/notified bits (see [`crate::header`]) are the only
//! lock-free synchronization on the hot path; everything here is coarser
//! because it is touched at allocation/sweep boundaries, not per-access.

use crate::object::ErasedGcRef;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// Tunable thresholds for when the mutator starts nudging the worker.
#[derive(Debug, Clone, Copy)]
pub struct GcConfig {
    /// Allocations since the last sweep before a collection is requested.
    pub threshold: usize,
    /// Growth-limit default used by the object/array slot-array growth
    /// policy (`clamp(capacity / 16, 4, 256)`); kept here because it is
    /// part of the same "how aggressively do we grow before asking the
    /// collector to catch up" tuning knob.
    pub array_growth_min: usize,
    pub array_growth_max: usize,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            threshold: 4096,
            array_growth_min: 4,
            array_growth_max: 256,
        }
    }
}

#[derive(Default)]
struct QueueState {
    /// Every live allocation, oldest-survivor-first after a sweep.
    all_values: Vec<ErasedGcRef>,
    /// Allocations made *during* a sweep; spliced onto `all_values` once
    /// the sweep completes (§4.5 "Sweep").
    all_values_2: Vec<ErasedGcRef>,
    /// Write-barrier queue: objects notified but not yet marked.
    ref_values: VecDeque<ErasedGcRef>,
    /// Notifications that arrive while a sweep is draining `ref_values`;
    /// spliced back in once the sweep ends.
    ref_values_2: VecDeque<ErasedGcRef>,
    /// Old slot arrays / buffers whose lifetime overlapped a possible
    /// concurrent mark and so could not be freed directly.
    free_void_ptrs: Vec<Box<dyn FnOnce() + Send>>,
    /// Sweep currently in progress (ref_values_2 bypass active).
    sweeping: bool,
    /// Worker is idle and waiting on the condvar.
    sleeping: bool,
    /// Mutator has requested a sweep.
    run_sweep_requested: bool,
    /// Mutator has completed this cycle's cooperative root scan and
    /// handed the root set to the worker.
    roots_ready: bool,
    pending_roots: Vec<ErasedGcRef>,
    /// Allocations since the last sweep completed.
    num_new_values: usize,
    /// Shutdown requested (environment teardown).
    shutdown: bool,
}

/// The shared heap: allocation bookkeeping plus the queues the worker
/// drains. Cheap to construct; expensive to have more than one of per
/// process (there is exactly one per [`crate::collector::Collector`]).
pub struct GcHeap {
    config: GcConfig,
    state: Mutex<QueueState>,
    condvar: Condvar,
}

impl GcHeap {
    pub fn new(config: GcConfig) -> Self {
        Self {
            config,
            state: Mutex::new(QueueState::default()),
            condvar: Condvar::new(),
        }
    }

    pub fn config(&self) -> GcConfig {
        self.config
    }

    /// `gc_manage(v)`: register a freshly allocated value. Pushes onto
    /// `all_values` (or the sweep-time shadow list) and bumps the
    /// allocation counter, returning `true` if the counter has crossed
    /// the mutator-side throttling threshold.
    pub fn manage(&self, value: ErasedGcRef) -> bool {
        let mut st = self.state.lock();
        if st.sweeping {
            st.all_values_2.push(value);
        } else {
            st.all_values.push(value);
        }
        st.num_new_values += 1;
        st.num_new_values >= self.config.threshold
    }

    /// Write barrier: `notify(v)`. Store-release semantics — the
    /// worker's dequeue acquire pairs with this.
    pub fn notify(&self, value: ErasedGcRef) {
        if !value.header().try_notify() {
            return;
        }
        let mut st = self.state.lock();
        if st.sweeping {
            st.ref_values_2.push_back(value);
        } else {
            st.ref_values.push_back(value);
        }
        self.condvar.notify_one();
    }

    /// Defer a free until the worker's idle-time drain, because the
    /// freed memory's lifetime overlaps a possible concurrent mark (old
    /// slot array after a shape grow, freed descriptor storage, ...).
    pub fn defer_free(&self, f: impl FnOnce() + Send + 'static) {
        self.state.lock().free_void_ptrs.push(Box::new(f));
    }

    /// Ask the worker to run a sweep once the mutator finishes its
    /// cooperative root scan. Blocks only long enough to hand off the
    /// root set; the actual mark/sweep runs on the worker thread.
    pub fn request_sweep(&self, roots: Vec<ErasedGcRef>) {
        let mut st = self.state.lock();
        st.pending_roots = roots;
        st.roots_ready = true;
        st.run_sweep_requested = true;
        st.num_new_values = 0;
        self.condvar.notify_one();
    }

    pub fn allocations_since_sweep(&self) -> usize {
        self.state.lock().num_new_values
    }

    pub fn live_count(&self) -> usize {
        self.state.lock().all_values.len()
    }

    pub fn request_shutdown(&self) {
        let mut st = self.state.lock();
        st.shutdown = true;
        self.condvar.notify_all();
    }

    // --- worker-side accessors -------------------------------------------------

    pub(crate) fn wait_for_work(&self) -> WorkerWakeReason {
        let mut st = self.state.lock();
        st.sleeping = true;
        loop {
            if st.shutdown {
                st.sleeping = false;
                return WorkerWakeReason::Shutdown;
            }
            if st.run_sweep_requested && st.roots_ready {
                st.sleeping = false;
                return WorkerWakeReason::SweepRequested;
            }
            if !st.ref_values.is_empty() {
                st.sleeping = false;
                return WorkerWakeReason::MarkWork;
            }
            self.condvar.wait(&mut st);
        }
    }

    pub(crate) fn drain_ref_values(&self, max: usize) -> Vec<ErasedGcRef> {
        let mut st = self.state.lock();
        let n = max.min(st.ref_values.len());
        st.ref_values.drain(..n).collect()
    }

    pub(crate) fn take_pending_roots(&self) -> Vec<ErasedGcRef> {
        let mut st = self.state.lock();
        st.run_sweep_requested = false;
        st.roots_ready = false;
        std::mem::take(&mut st.pending_roots)
    }

    pub(crate) fn begin_sweep(&self) {
        self.state.lock().sweeping = true;
    }

    /// Replace `all_values` with the survivor list, splice the `_2`
    /// shadow lists back in, and return the deferred frees to actually
    /// run.
    pub(crate) fn end_sweep(
        &self,
        survivors: Vec<ErasedGcRef>,
    ) -> Vec<Box<dyn FnOnce() + Send>> {
        let mut st = self.state.lock();
        let mut all = survivors;
        all.append(&mut st.all_values_2);
        st.all_values = all;

        let mut refs = std::mem::take(&mut st.ref_values_2);
        st.ref_values.append(&mut refs);

        st.sweeping = false;
        std::mem::take(&mut st.free_void_ptrs)
    }

    pub(crate) fn snapshot_all_values(&self) -> Vec<ErasedGcRef> {
        self.state.lock().all_values.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerWakeReason {
    MarkWork,
    SweepRequested,
    Shutdown,
}
