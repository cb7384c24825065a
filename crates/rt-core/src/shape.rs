//! Hidden shapes: the structural transition tree that lets property
//! access bottom out in an offset lookup instead of a hash lookup once
//! a call site has seen a given shape before.
//!
//! Shapes form a tree, never a cycle (a shape's only strong edge is to
//! its parent; children are reached only through the weak transition
//! map), so the tree is plain `Arc`/`Weak` bookkeeping — it never needs
//! to go through the concurrent collector the way objects and closures
//! do.

use crate::error::{ErrorKind, RtResult};
use crate::object::PropertyKey;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};

/// Shapes with more properties than this raise
/// `RangeError_property_count` rather than silently wrapping the
/// 24-bit slot index packed into property-access cache keys.
pub const MAX_PROPERTIES: usize = (1 << 24) - 1;

static NEXT_SHAPE_ID: AtomicU32 = AtomicU32::new(1);

/// High bit of a cache key's slot-index half signals "this slot holds
/// a descriptor, not a plain value" — the idiomatic counterpart of the
/// tag bit `descr1.c`/`descr2.c` keep on the slot itself. See
/// [`Shape::cache_key`] and [`object::Slot`](crate::object::Slot).
pub const DESCRIPTOR_CACHE_BIT: u64 = 1 << 23;

pub struct Shape {
    pub parent: Option<Arc<Shape>>,
    pub key: Option<PropertyKey>,
    pub offset: Option<usize>,
    /// Globally unique id, monotonically assigned. Used as the high
    /// half of a property-access cache key so a cached `(shape_id,
    /// slot)` pair can be compared for staleness with a single integer
    /// equality check.
    pub shape_id: u32,

    transitions: RefCell<FxHashMap<PropertyKey, Weak<Shape>>>,
    property_map: FxHashMap<PropertyKey, usize>,
    keys_ordered: Vec<PropertyKey>,
}

// SAFETY: the runtime is single-mutator-threaded; `RefCell` usage here
// never crosses threads concurrently.
unsafe impl Send for Shape {}
unsafe impl Sync for Shape {}

impl Drop for Shape {
    /// Take `parent` out before the generated glue would otherwise
    /// recurse into it, and unwind the rest of the chain iteratively
    /// instead (see [`crate::drop_guard`]).
    fn drop(&mut self) {
        if let Some(parent) = self.parent.take() {
            crate::drop_guard::drop_shape_chain(parent);
        }
    }
}

impl Shape {
    pub fn root() -> Arc<Self> {
        Arc::new(Self {
            parent: None,
            key: None,
            offset: None,
            shape_id: NEXT_SHAPE_ID.fetch_add(1, Ordering::Relaxed),
            transitions: RefCell::new(FxHashMap::default()),
            property_map: FxHashMap::default(),
            keys_ordered: Vec::new(),
        })
    }

    /// Find or create the child shape reached by adding `key`.
    pub fn transition(self: &Arc<Self>, key: PropertyKey) -> RtResult<Arc<Self>> {
        {
            let transitions = self.transitions.borrow();
            if let Some(existing) = transitions.get(&key).and_then(Weak::upgrade) {
                return Ok(existing);
            }
        }

        let mut transitions = self.transitions.borrow_mut();
        if let Some(existing) = transitions.get(&key).and_then(Weak::upgrade) {
            return Ok(existing);
        }

        if self.property_map.len() >= MAX_PROPERTIES {
            return Err(ErrorKind::RangeErrorPropertyCount.into());
        }

        let next_offset = self.offset.map(|o| o + 1).unwrap_or(0);

        let mut next_property_map = self.property_map.clone();
        next_property_map.insert(key.clone(), next_offset);

        let mut next_keys_ordered = self.keys_ordered.clone();
        next_keys_ordered.push(key.clone());

        let new_shape = Arc::new(Self {
            parent: Some(Arc::clone(self)),
            key: Some(key.clone()),
            offset: Some(next_offset),
            shape_id: NEXT_SHAPE_ID.fetch_add(1, Ordering::Relaxed),
            transitions: RefCell::new(FxHashMap::default()),
            property_map: next_property_map,
            keys_ordered: next_keys_ordered,
        });

        transitions.insert(key, Arc::downgrade(&new_shape));
        Ok(new_shape)
    }

    pub fn get_offset(&self, key: &PropertyKey) -> Option<usize> {
        self.property_map.get(key).copied()
    }

    pub fn own_keys(&self) -> Vec<PropertyKey> {
        self.keys_ordered.clone()
    }

    pub fn property_count(&self) -> usize {
        self.property_map.len()
    }

    /// Encode `(shape_id, slot)` as a single cache key; bit 23 of the
    /// slot half is reserved to flag a descriptor slot, so `slot` must
    /// fit in 23 bits (guaranteed by [`MAX_PROPERTIES`]).
    pub fn cache_key(&self, slot: usize, is_descriptor: bool) -> u64 {
        let slot_bits = slot as u64 | if is_descriptor { DESCRIPTOR_CACHE_BIT } else { 0 };
        ((self.shape_id as u64) << 32) | slot_bits
    }
}

impl std::fmt::Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shape")
            .field("shape_id", &self.shape_id)
            .field("key", &self.key)
            .field("offset", &self.offset)
            .field("property_count", &self.property_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_are_shared_for_same_key_sequence() {
        let root = Shape::root();
        let a = root.transition(PropertyKey::from_str("a")).unwrap();
        let b = root.transition(PropertyKey::from_str("a")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn distinct_keys_produce_distinct_shapes() {
        let root = Shape::root();
        let a = root.transition(PropertyKey::from_str("a")).unwrap();
        let b = root.transition(PropertyKey::from_str("b")).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_ne!(a.shape_id, b.shape_id);
    }

    #[test]
    fn offsets_increase_along_a_chain() {
        let root = Shape::root();
        let a = root.transition(PropertyKey::from_str("a")).unwrap();
        let b = a.transition(PropertyKey::from_str("b")).unwrap();
        assert_eq!(a.get_offset(&PropertyKey::from_str("a")), Some(0));
        assert_eq!(b.get_offset(&PropertyKey::from_str("b")), Some(1));
        assert_eq!(b.own_keys().len(), 2);
    }

    #[test]
    fn cache_key_high_bit_flags_descriptor_slots() {
        let root = Shape::root();
        let value_key = root.cache_key(3, false);
        let descr_key = root.cache_key(3, true);
        assert_ne!(value_key, descr_key);
        assert_eq!(descr_key & DESCRIPTOR_CACHE_BIT, DESCRIPTOR_CACHE_BIT);
    }
}
