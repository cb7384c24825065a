//! The root-scan abstraction.
//!
//! `rt-gc` knows nothing about values, call stacks, try-handlers, or
//! coroutines — those live in `rt-core`. To run a stop-the-world root
//! scan anyway, the collector asks the mutator (through this trait) to
//! enumerate its own roots at a safepoint and hand back the flat list.
//! This mirrors the teacher's handshake-based safepoint design, but
//! trades "the collector walks mutator state directly" for "the mutator
//! walks its own state and reports back", which is what keeps `rt-gc`
//! decoupled from `rt-core`.

use crate::object::ErasedGcRef;

/// Implemented once, by the runtime environment, covering every place a
/// `GcHeader` pointer can be reachable from outside the heap:
/// interpreter stack slots, the active try-handler chain's saved
/// exception values, `new.target`, and every live coroutine's saved
/// context (registers + locals), visited round-robin so a coroutine
/// parked mid-yield still contributes its roots.
pub trait RootScanner {
    /// Called once per collection cycle, on the mutator thread, at a
    /// point where no root is being concurrently mutated. Must push
    /// every directly reachable `GcHeader` into `out`; the collector
    /// handles transitive reachability itself.
    fn scan_roots(&self, out: &mut Vec<ErasedGcRef>);
}

/// A scanner with no roots, useful for collector unit tests and for
/// hosts that manage their own root set externally.
pub struct NoRoots;

impl RootScanner for NoRoots {
    fn scan_roots(&self, _out: &mut Vec<ErasedGcRef>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_roots_contributes_nothing() {
        let mut out = Vec::new();
        NoRoots.scan_roots(&mut out);
        assert!(out.is_empty());
    }
}
