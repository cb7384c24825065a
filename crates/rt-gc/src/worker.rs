//! The dedicated GC thread.
//!
//! One worker per [`crate::collector::Collector`], spawned once and
//! parked on the heap's condvar between cycles. It has two jobs, chosen
//! by [`crate::heap::WorkerWakeReason`]:
//!
//! - drain `ref_values` and mark reachable children as they arrive
//!   (keeps the eventual stop-the-world mark phase short), and
//! - on a sweep request, mark from the handed-off root set, walk
//!   `all_values` partitioning live from dead, reclaim the dead, splice
//!   the sweep-time shadow lists back in, and run the deferred frees.

use crate::heap::{GcHeap, WorkerWakeReason};
use crate::object::ErasedGcRef;
use std::sync::Arc;

/// Mark `root` and everything transitively reachable from it, using
/// `header.is_marked()` as the visited set (a header that returns
/// `false` from `try_mark` has already been visited or queued).
fn mark_from(root: ErasedGcRef, worklist: &mut Vec<ErasedGcRef>) {
    if !root.header().try_mark() {
        return;
    }
    worklist.push(root);
    while let Some(cur) = worklist.pop() {
        cur.trace(&mut |child_header| {
            // SAFETY: a header reachable from a live, marked object is
            // itself live; `all_values` is the only owner so this
            // pointer's ErasedGcRef is just as valid as the one we hold.
            let child = unsafe { ErasedGcRef::from_raw(child_header) };
            if child.header().try_mark() {
                worklist.push(child);
            }
        });
    }
}

/// Run one worker iteration. Exposed directly (rather than only via
/// `run_forever`) so tests can drive the loop deterministically without
/// spawning a thread.
pub fn step(heap: &GcHeap) -> WorkerWakeReason {
    let reason = heap.wait_for_work();
    match reason {
        WorkerWakeReason::Shutdown => {}
        WorkerWakeReason::MarkWork => {
            let mut worklist = Vec::new();
            for obj in heap.drain_ref_values(usize::MAX) {
                mark_from(obj, &mut worklist);
            }
        }
        WorkerWakeReason::SweepRequested => {
            run_sweep(heap);
        }
    }
    reason
}

fn run_sweep(heap: &GcHeap) {
    heap.begin_sweep();

    #[cfg(feature = "gc_logging")]
    let before = heap.live_count();
    #[cfg(feature = "gc_logging")]
    tracing::debug!(target: "rt_gc", live_before = before, "sweep starting");

    let mut worklist = Vec::new();
    for root in heap.take_pending_roots() {
        mark_from(root, &mut worklist);
    }
    // Anything already notified-but-unmarked from the concurrent phase
    // is also a root for this final mark, since it was mutated after
    // the last sweep and might no longer be reachable from the roots we
    // just walked but still holds live children.
    for obj in heap.drain_ref_values(usize::MAX) {
        mark_from(obj, &mut worklist);
    }

    let all = heap.snapshot_all_values();
    let mut survivors = Vec::with_capacity(all.len());
    for obj in all {
        if obj.header().is_marked() {
            obj.header().clear();
            survivors.push(obj);
        } else {
            // SAFETY: unmarked after a full mark from every root means
            // unreachable; nothing holds a reference to reclaim.
            unsafe { obj.reclaim() };
        }
    }

    #[cfg(feature = "gc_logging")]
    let after = survivors.len();
    let deferred = heap.end_sweep(survivors);

    #[cfg(feature = "gc_logging")]
    tracing::info!(
        target: "rt_gc",
        live_before = before,
        live_after = after,
        reclaimed = before.saturating_sub(after),
        "sweep complete"
    );

    for f in deferred {
        f();
    }
}

/// Spawn the worker thread. The returned `JoinHandle` resolves once the
/// heap's shutdown flag is set and the worker observes it.
pub fn spawn(heap: Arc<GcHeap>) -> std::thread::JoinHandle<()> {
    std::thread::Builder::new()
        .name("rt-gc-worker".to_string())
        .spawn(move || loop {
            if step(&heap) == WorkerWakeReason::Shutdown {
                return;
            }
        })
        .expect("failed to spawn GC worker thread")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::GcTag;
    use crate::heap::GcConfig;
    use crate::object::{GcRef, GcTraceable};

    struct Leaf;
    impl GcTraceable for Leaf {
        const NEEDS_TRACE: bool = false;
        fn trace(&self, _: &mut dyn FnMut(*const crate::header::GcHeader)) {}
    }

    struct Pair {
        a: ErasedGcRef,
        b: Option<ErasedGcRef>,
    }
    impl GcTraceable for Pair {
        fn trace(&self, tracer: &mut dyn FnMut(*const crate::header::GcHeader)) {
            tracer(self.a.header_ptr());
            if let Some(b) = self.b {
                tracer(b.header_ptr());
            }
        }
    }

    #[test]
    fn sweep_reclaims_unreferenced_and_keeps_rooted() {
        let heap = GcHeap::new(GcConfig::default());

        let kept_leaf = GcRef::new_tagged(Leaf, GcTag::Object).erase();
        let garbage_leaf = GcRef::new_tagged(Leaf, GcTag::Object).erase();
        let root_pair = GcRef::new_tagged(
            Pair {
                a: kept_leaf,
                b: None,
            },
            GcTag::Object,
        )
        .erase();

        heap.manage(kept_leaf);
        heap.manage(garbage_leaf);
        heap.manage(root_pair);

        heap.request_sweep(vec![root_pair]);
        run_sweep(&heap);

        assert_eq!(heap.live_count(), 2);
        assert!(root_pair.header().is_marked() == false); // cleared after sweep
    }
}
