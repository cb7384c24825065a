//! The two-bit mark/notify metadata carried by every heap object, plus
//! the tiny vtable that lets a bare `*const GcHeader` — the only thing
//! that survives a trip through a generic tracer callback or the
//! conservative stack scan — be turned back into something the
//! collector can trace and free.

use std::sync::atomic::{AtomicU8, Ordering};

const MARKED: u8 = 0b01;
const NOTIFIED: u8 = 0b10;

/// Kind tag stored alongside the mark bits so the worker and the
/// conservative scanner can tell what a pointer refers to without
/// dereferencing through the vtable.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcTag {
    /// Ordinary/array/function/private/proxy object header.
    Object = 0,
    /// Interned or non-interned string/symbol record.
    StringLike = 1,
    /// Bigint limb vector.
    BigInt = 2,
    /// Closure variable cell, generator/coroutine context, or other
    /// runtime-internal allocation that needs tracing but has no other
    /// user-visible shape.
    Internal = 3,
}

/// Per-type function pointers, fixed at allocation time, that let the
/// collector operate on a type-erased `*const GcHeader`.
#[derive(Clone, Copy)]
pub struct GcVTable {
    pub(crate) trace: unsafe fn(*const GcHeader, &mut dyn FnMut(*const GcHeader)),
    pub(crate) drop_in_place: unsafe fn(*const GcHeader),
}

/// Mark/notify metadata for one heap allocation.
#[repr(C)]
pub struct GcHeader {
    bits: AtomicU8,
    tag: GcTag,
    vtable: GcVTable,
}

impl GcHeader {
    pub const fn new(tag: GcTag, vtable: GcVTable) -> Self {
        Self {
            bits: AtomicU8::new(0),
            tag,
            vtable,
        }
    }

    #[inline]
    pub fn tag(&self) -> GcTag {
        self.tag
    }

    #[inline]
    pub fn vtable(&self) -> GcVTable {
        self.vtable
    }

    #[inline]
    pub fn is_marked(&self) -> bool {
        self.bits.load(Ordering::Acquire) & MARKED != 0
    }

    #[inline]
    pub fn is_notified(&self) -> bool {
        self.bits.load(Ordering::Acquire) & NOTIFIED != 0
    }

    /// Try to set the `marked` bit. Returns `true` if this call was the
    /// one that set it (i.e. the object was previously unmarked) so the
    /// caller knows whether to recurse into its children.
    #[inline]
    pub fn try_mark(&self) -> bool {
        let prev = self.bits.fetch_or(MARKED, Ordering::AcqRel);
        prev & MARKED == 0
    }

    /// Write-barrier hook: set `notified` unless either bit is already
    /// set. Returns `true` if the caller should enqueue this object on
    /// `ref_values` (store-release semantics: the worker's dequeue
    /// acquire pairs with this release).
    #[inline]
    pub fn try_notify(&self) -> bool {
        let prev = self.bits.fetch_or(NOTIFIED, Ordering::AcqRel);
        prev & (MARKED | NOTIFIED) == 0
    }

    /// Clear both bits. Called by sweep on survivors so the next cycle
    /// starts white.
    #[inline]
    pub fn clear(&self) {
        self.bits.store(0, Ordering::Release);
    }

    /// Trace this object's children. Delegates through the vtable fixed
    /// at allocation time.
    pub fn trace(&self, tracer: &mut dyn FnMut(*const GcHeader)) {
        unsafe { (self.vtable.trace)(self as *const GcHeader, tracer) }
    }

    /// Free the backing allocation.
    ///
    /// # Safety
    /// No reference to this allocation may remain, mutator-visible or
    /// otherwise.
    pub unsafe fn reclaim(&self) {
        unsafe { (self.vtable.drop_in_place)(self as *const GcHeader) }
    }
}

impl std::fmt::Debug for GcHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcHeader")
            .field("tag", &self.tag)
            .field("marked", &self.is_marked())
            .field("notified", &self.is_notified())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn noop_trace(_: *const GcHeader, _: &mut dyn FnMut(*const GcHeader)) {}
    unsafe fn noop_drop(_: *const GcHeader) {}
    const NOOP_VTABLE: GcVTable = GcVTable {
        trace: noop_trace,
        drop_in_place: noop_drop,
    };

    #[test]
    fn notify_is_idempotent() {
        let h = GcHeader::new(GcTag::Object, NOOP_VTABLE);
        assert!(h.try_notify());
        assert!(!h.try_notify());
        assert!(h.is_notified());
    }

    #[test]
    fn mark_after_notify_still_reports_marked_once() {
        let h = GcHeader::new(GcTag::Object, NOOP_VTABLE);
        assert!(h.try_notify());
        assert!(h.try_mark());
        assert!(!h.try_mark());
        assert!(!h.try_notify());
    }

    #[test]
    fn clear_resets_both_bits() {
        let h = GcHeader::new(GcTag::Object, NOOP_VTABLE);
        h.try_mark();
        h.try_notify();
        h.clear();
        assert!(!h.is_marked());
        assert!(!h.is_notified());
    }
}
