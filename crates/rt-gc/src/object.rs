//! The raw heap allocation and the handle the mutator passes around.
//!
//! `GcRef<T>` is deliberately *not* reference-counted. Per the ownership
//! discipline in the spec, a heap-owned value's only real owner is the
//! collector's `all_values` list; every other reference is a bare
//! pointer. That is what lets the mark-sweep cycle collector reclaim
//! cyclic graphs (prototype chains, closure environments, the
//! coroutine-context list) without a separate cycle collector.

use crate::header::{GcHeader, GcTag, GcVTable};
use std::fmt;
use std::ptr::NonNull;

/// Anything the collector can trace and, on reclaim, drop in place.
pub trait GcTraceable {
    /// Fast-path hint: objects that can never hold outgoing references
    /// (interned strings, bigints) skip the recursive trace entirely.
    const NEEDS_TRACE: bool = true;

    /// Invoke `tracer` once for every `GcHeader` this value directly
    /// references.
    fn trace(&self, tracer: &mut dyn FnMut(*const GcHeader));
}

#[repr(C)]
pub(crate) struct GcBox<T: ?Sized> {
    pub(crate) header: GcHeader,
    pub(crate) payload: T,
}

/// A handle to a GC-managed allocation of type `T`.
///
/// `Copy`, not `Clone`-deep: copying a `GcRef` copies the pointer, never
/// the payload. It dereferences like `&T` but carries no destructor —
/// the collector's sweep phase is solely responsible for freeing the
/// backing allocation.
pub struct GcRef<T: GcTraceable> {
    ptr: NonNull<GcBox<T>>,
}

impl<T: GcTraceable> Clone for GcRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: GcTraceable> Copy for GcRef<T> {}

// SAFETY: the runtime is single-mutator-threaded; the GC worker only
// touches header bits (atomic) and frees unreachable allocations after a
// synchronized sweep handoff, never payloads still reachable from the
// mutator.
unsafe impl<T: GcTraceable> Send for GcRef<T> {}
unsafe impl<T: GcTraceable> Sync for GcRef<T> {}

unsafe fn drop_erased<T: GcTraceable>(header: *const GcHeader) {
    // SAFETY: invoked only by the sweep worker on a header it found
    // unreached, which by construction is a `GcBox<T>` allocated through
    // `GcRef::<T>::new`, with `header` as its first field (`repr(C)`).
    unsafe {
        drop(Box::from_raw(header as *mut GcBox<T>));
    }
}

unsafe fn trace_erased<T: GcTraceable>(
    header: *const GcHeader,
    tracer: &mut dyn FnMut(*const GcHeader),
) {
    if !T::NEEDS_TRACE {
        return;
    }
    // SAFETY: see drop_erased.
    let payload = unsafe { &(*(header as *const GcBox<T>)).payload };
    payload.trace(tracer);
}

impl<T: GcTraceable> GcRef<T> {
    fn vtable() -> GcVTable {
        GcVTable {
            trace: trace_erased::<T>,
            drop_in_place: drop_erased::<T>,
        }
    }

    /// Allocate `value` on the heap and return an untracked handle to it.
    ///
    /// The returned handle is *not* registered with any collector; the
    /// caller (normally [`crate::heap::GcHeap::manage`]) must push its
    /// erased form onto `all_values` before the next safepoint, or the
    /// allocation will never be freed.
    pub fn new(value: T) -> Self {
        Self::new_tagged(value, GcTag::Object)
    }

    /// Allocate with an explicit tag (strings/bigints use this).
    pub fn new_tagged(value: T, tag: GcTag) -> Self {
        let boxed = Box::new(GcBox {
            header: GcHeader::new(tag, Self::vtable()),
            payload: value,
        });
        let ptr = unsafe { NonNull::new_unchecked(Box::into_raw(boxed)) };
        Self { ptr }
    }

    #[inline]
    pub fn header(&self) -> &GcHeader {
        // SAFETY: the allocation is kept alive by all_values until swept;
        // a live GcRef implies the sweep has not yet reclaimed it.
        unsafe { &self.ptr.as_ref().header }
    }

    #[inline]
    pub fn as_ptr(&self) -> *const () {
        self.ptr.as_ptr() as *const ()
    }

    /// Erase the type for storage in the collector's generic queues.
    pub fn erase(self) -> ErasedGcRef {
        ErasedGcRef {
            header: self.ptr.as_ptr() as *const GcHeader,
        }
    }

    /// Reconstruct a typed handle from a header pointer known (by the
    /// caller) to point at a `GcBox<T>`.
    ///
    /// # Safety
    /// `header` must have been produced by [`GcRef::<T>::erase`] for the
    /// same `T`, and the allocation must still be live.
    pub unsafe fn from_header(header: *const GcHeader) -> Self {
        Self {
            ptr: unsafe { NonNull::new_unchecked(header as *mut GcBox<T>) },
        }
    }
}

impl<T: GcTraceable> std::ops::Deref for GcRef<T> {
    type Target = T;
    fn deref(&self) -> &T {
        // SAFETY: see GcRef invariants above.
        unsafe { &self.ptr.as_ref().payload }
    }
}

impl<T: GcTraceable + fmt::Debug> fmt::Debug for GcRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: GcTraceable> PartialEq for GcRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}
impl<T: GcTraceable> Eq for GcRef<T> {}

impl<T: GcTraceable> std::hash::Hash for GcRef<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.ptr.as_ptr().hash(state);
    }
}

/// A type-erased handle the collector's queues store internally: just a
/// header pointer. Tracing and reclaiming go through the header's own
/// vtable (see [`crate::header::GcHeader`]), so this stays `Copy` and
/// needs no generic parameter.
#[derive(Clone, Copy)]
pub struct ErasedGcRef {
    header: *const GcHeader,
}

// SAFETY: guarded by the same single-mutator-plus-worker discipline as
// GcRef itself.
unsafe impl Send for ErasedGcRef {}
unsafe impl Sync for ErasedGcRef {}

impl ErasedGcRef {
    /// Build an erased reference directly from a raw header pointer,
    /// e.g. one captured during the conservative stack scan.
    ///
    /// # Safety
    /// `header` must point at a live `GcHeader`.
    pub unsafe fn from_raw(header: *const GcHeader) -> Self {
        Self { header }
    }

    #[inline]
    pub fn header_ptr(&self) -> *const GcHeader {
        self.header
    }

    #[inline]
    pub fn header(&self) -> &GcHeader {
        // SAFETY: callers only obtain an ErasedGcRef while the
        // allocation is still registered in all_values, i.e. still live.
        unsafe { &*self.header }
    }

    /// Trace this object's children into `tracer`.
    pub fn trace(&self, tracer: &mut dyn FnMut(*const GcHeader)) {
        self.header().trace(tracer)
    }

    /// Free the backing allocation. Only the sweep worker may call this,
    /// and only once the header has been confirmed unreached.
    ///
    /// # Safety
    /// Caller must guarantee no other reference to this allocation
    /// remains (mutator-visible or otherwise).
    pub unsafe fn reclaim(self) {
        unsafe { self.header().reclaim() }
    }
}

impl PartialEq for ErasedGcRef {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.header, other.header)
    }
}
impl Eq for ErasedGcRef {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaf(u32);
    impl GcTraceable for Leaf {
        const NEEDS_TRACE: bool = false;
        fn trace(&self, _tracer: &mut dyn FnMut(*const GcHeader)) {}
    }

    struct Node {
        child: Option<GcRef<Leaf>>,
    }
    impl GcTraceable for Node {
        fn trace(&self, tracer: &mut dyn FnMut(*const GcHeader)) {
            if let Some(c) = &self.child {
                tracer(c.header() as *const _);
            }
        }
    }

    #[test]
    fn deref_and_identity() {
        let a = GcRef::new(Leaf(7));
        let b = a;
        assert_eq!(a.0, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn erase_trace_round_trip_reaches_children() {
        let leaf = GcRef::new(Leaf(9));
        let node = GcRef::new(Node { child: Some(leaf) });
        let erased = node.erase();
        let mut seen = Vec::new();
        erased.trace(&mut |h| seen.push(h));
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], leaf.header() as *const _);
        unsafe {
            erased.reclaim();
            leaf.erase().reclaim();
        }
    }
}
