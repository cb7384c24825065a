//! The iterator protocol: `new_iter`/`next_iter1`/`next_iter2` and
//! `for_in_iterator` enumeration.
//!
//! `next_iter1` surfaces a single value per step (array/set
//! iteration); `next_iter2` surfaces a key/value pair (map iteration,
//! `Object.entries`-style consumers). `for_in_iterator` walks the
//! prototype chain collecting enumerable string keys, in the same
//! order `for...in` is observably specified to visit them: own keys
//! first, then each prototype's own keys, skipping any name already
//! seen further down the chain.

use crate::error::RtResult;
use crate::object::{JsObject, PropertyKey, PropertyLookup};
use crate::value::Value;
use rt_gc::GcRef;
use rustc_hash::FxHashSet;
use std::cell::Cell;

pub struct IteratorResult {
    pub value: Value,
    pub done: bool,
}

impl IteratorResult {
    pub fn done() -> Self {
        Self {
            value: Value::undefined(),
            done: true,
        }
    }
    pub fn yielded(value: Value) -> Self {
        Self { value, done: false }
    }
}

enum Source {
    ArrayValues(GcRef<JsObject>),
    MapEntries(Vec<(Value, Value)>),
    SetValues(Vec<Value>),
}

/// A live iterator over one of the built-in collection kinds. `Kind`
/// in the original is read off the iterator object's private data;
/// here it's simply which `Source` variant was constructed.
pub struct JsIterator {
    source: Source,
    cursor: Cell<u32>,
}

/// `new_iter`: create an iterator over `object`'s elements (arrays),
/// entries (maps), or values (sets).
pub fn new_iter(object: GcRef<JsObject>) -> JsIterator {
    let source = match object.kind() {
        crate::object::ObjectKind::Map(m) => {
            Source::MapEntries(m.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        }
        crate::object::ObjectKind::Set(s) => Source::SetValues(s.read().iter().cloned().collect()),
        _ => Source::ArrayValues(object),
    };
    JsIterator {
        source,
        cursor: Cell::new(0),
    }
}

/// Single-value step (array/set iteration).
pub fn next_iter1(iter: &JsIterator) -> RtResult<IteratorResult> {
    let i = iter.cursor.get();
    let result = match &iter.source {
        Source::ArrayValues(obj) => {
            if i >= obj.array_length() {
                IteratorResult::done()
            } else {
                // Go through the property protocol, not `arr_get`
                // directly: a demoted index (§4.3.5) holds
                // `Value::Deleted` in the dense vector and its real
                // value/accessor lives in the shape instead. A hole
                // yields `undefined`, matching array iteration over
                // sparse elements.
                let value = match obj.get_prop(&PropertyKey::index(i)) {
                    PropertyLookup::Value(v) => v,
                    PropertyLookup::Accessor { .. } | PropertyLookup::NotFound => Value::undefined(),
                };
                IteratorResult::yielded(value)
            }
        }
        Source::SetValues(values) => match values.get(i as usize) {
            Some(v) => IteratorResult::yielded(v.clone()),
            None => IteratorResult::done(),
        },
        Source::MapEntries(entries) => match entries.get(i as usize) {
            Some((k, _)) => IteratorResult::yielded(k.clone()),
            None => IteratorResult::done(),
        },
    };
    if !result.done {
        iter.cursor.set(i + 1);
    }
    Ok(result)
}

/// Key/value-pair step (map `.entries()`).
pub fn next_iter2(iter: &JsIterator) -> RtResult<Option<(Value, Value)>> {
    let i = iter.cursor.get();
    let Source::MapEntries(entries) = &iter.source else {
        return Ok(None);
    };
    match entries.get(i as usize) {
        Some((k, v)) => {
            iter.cursor.set(i + 1);
            Ok(Some((k.clone(), v.clone())))
        }
        None => Ok(None),
    }
}

/// Enumerable own string keys, own first, then each prototype level,
/// with names already seen suppressed.
pub struct ForInIterator {
    keys: Vec<PropertyKey>,
    cursor: Cell<usize>,
}

pub fn for_in_iterator(object: GcRef<JsObject>) -> ForInIterator {
    let mut seen: FxHashSet<PropertyKey> = FxHashSet::default();
    let mut keys = Vec::new();
    let mut current = Some(object);
    while let Some(obj) = current {
        for key in obj.own_keys() {
            if matches!(key, PropertyKey::Symbol(_)) {
                continue;
            }
            if !seen.insert(key.clone()) {
                continue;
            }
            if matches!(obj.get_prop(&key), PropertyLookup::NotFound) {
                continue;
            }
            keys.push(key);
        }
        current = obj.prototype().as_object();
    }
    ForInIterator {
        keys,
        cursor: Cell::new(0),
    }
}

impl ForInIterator {
    pub fn next(&self) -> Option<PropertyKey> {
        let i = self.cursor.get();
        let key = self.keys.get(i)?.clone();
        self.cursor.set(i + 1);
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Strictness;

    #[test]
    fn array_iteration_yields_elements_then_done() {
        let arr = GcRef::new(JsObject::array(Value::null(), 0));
        arr.arr_set(0, Value::int32(1));
        arr.arr_set(1, Value::int32(2));
        let iter = new_iter(arr);
        assert_eq!(next_iter1(&iter).unwrap().value, Value::int32(1));
        assert_eq!(next_iter1(&iter).unwrap().value, Value::int32(2));
        assert!(next_iter1(&iter).unwrap().done);
    }

    #[test]
    fn for_in_visits_own_keys_before_prototype_keys_without_duplicates() {
        let proto = GcRef::new(JsObject::ordinary(Value::null()));
        proto.set_prop(PropertyKey::from_str("shared"), Value::int32(0), Strictness::Sloppy).unwrap();
        proto.set_prop(PropertyKey::from_str("inherited"), Value::int32(1), Strictness::Sloppy).unwrap();

        let obj = GcRef::new(JsObject::ordinary(Value::object(proto)));
        obj.set_prop(PropertyKey::from_str("own"), Value::int32(2), Strictness::Sloppy).unwrap();
        obj.set_prop(PropertyKey::from_str("shared"), Value::int32(3), Strictness::Sloppy).unwrap();

        let iter = for_in_iterator(obj);
        let mut seen = Vec::new();
        while let Some(k) = iter.next() {
            seen.push(k);
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], PropertyKey::from_str("own"));
        assert_eq!(seen[1], PropertyKey::from_str("shared"));
        assert_eq!(seen[2], PropertyKey::from_str("inherited"));
    }
}
