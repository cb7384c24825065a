//! Integer-keyed open-addressing map, and the `Map`/`Set`/`WeakMap`/
//! `WeakSet` storage built on top of it.
//!
//! `IntMap<V>` is a direct translation of `runtime/include/intmap.c`:
//! linear probing, tombstones for deletion, power-of-two capacity,
//! resize once the load factor crosses 70%. `MapData`/`SetData` use it
//! as the hash index (hash of the SameValueZero key -> candidate entry
//! indices), with the entries themselves kept in an insertion-ordered
//! `Vec` so iteration order matches ES2023 §23.1/§23.2 and a live
//! iterator can keep seeing entries appended mid-iteration.

use crate::value::Value;
use std::hash::{Hash, Hasher};

#[derive(Clone)]
enum Slot<V> {
    Empty,
    Tombstone,
    Occupied(u64, V),
}

/// Open-addressing `u64 -> V` map with linear probing.
pub struct IntMap<V> {
    slots: Vec<Slot<V>>,
    len: usize,
    tombstones: usize,
}

impl<V: Clone> IntMap<V> {
    pub fn new() -> Self {
        Self::with_capacity(16)
    }

    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.next_power_of_two().max(16);
        Self {
            slots: (0..cap).map(|_| Slot::Empty).collect(),
            len: 0,
            tombstones: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn mask(&self) -> u64 {
        (self.slots.len() - 1) as u64
    }

    fn probe(&self, key: u64) -> impl Iterator<Item = usize> + '_ {
        let mask = self.mask();
        (0..self.slots.len() as u64).map(move |i| ((key.wrapping_add(i)) & mask) as usize)
    }

    pub fn get(&self, key: u64) -> Option<&V> {
        for idx in self.probe(key) {
            match &self.slots[idx] {
                Slot::Occupied(k, v) if *k == key => return Some(v),
                Slot::Empty => return None,
                _ => continue,
            }
        }
        None
    }

    pub fn insert(&mut self, key: u64, value: V) {
        if (self.len + self.tombstones + 1) as f64 / self.slots.len() as f64 > 0.7 {
            self.grow();
        }
        let mut first_tombstone = None;
        for idx in self.probe(key) {
            match &self.slots[idx] {
                Slot::Occupied(k, _) if *k == key => {
                    self.slots[idx] = Slot::Occupied(key, value);
                    return;
                }
                Slot::Tombstone => {
                    if first_tombstone.is_none() {
                        first_tombstone = Some(idx);
                    }
                }
                Slot::Empty => {
                    let target = first_tombstone.unwrap_or(idx);
                    if first_tombstone.is_some() {
                        self.tombstones -= 1;
                    }
                    self.slots[target] = Slot::Occupied(key, value);
                    self.len += 1;
                    return;
                }
                Slot::Occupied(..) => continue,
            }
        }
        unreachable!("probe sequence must find a free slot before wrapping fully")
    }

    pub fn remove(&mut self, key: u64) -> Option<V> {
        for idx in self.probe(key) {
            match &self.slots[idx] {
                Slot::Occupied(k, _) if *k == key => {
                    let old = std::mem::replace(&mut self.slots[idx], Slot::Tombstone);
                    self.len -= 1;
                    self.tombstones += 1;
                    if let Slot::Occupied(_, v) = old {
                        return Some(v);
                    }
                }
                Slot::Empty => return None,
                _ => continue,
            }
        }
        None
    }

    fn grow(&mut self) {
        let new_cap = self.slots.len() * 2;
        let old = std::mem::replace(&mut self.slots, (0..new_cap).map(|_| Slot::Empty).collect());
        self.len = 0;
        self.tombstones = 0;
        for slot in old {
            if let Slot::Occupied(k, v) = slot {
                self.insert(k, v);
            }
        }
    }
}

impl<V: Clone> Default for IntMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// SameValueZero key wrapper (treats `NaN` as equal to itself, `+0`
/// equal to `-0`, unlike `===`).
#[derive(Clone)]
pub struct MapKey(pub Value);

impl MapKey {
    fn hash_value(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        match &self.0 {
            Value::Undefined => 0u8.hash(&mut hasher),
            Value::Null => 1u8.hash(&mut hasher),
            Value::Bool(b) => (2u8, b).hash(&mut hasher),
            Value::Int32(i) => (3u8, *i as f64).to_bits().hash(&mut hasher),
            Value::Number(n) => {
                let bits = if *n == 0.0 { 0.0f64.to_bits() } else if n.is_nan() { f64::NAN.to_bits() } else { n.to_bits() };
                (3u8, bits).hash(&mut hasher)
            }
            Value::String(s) => (4u8, s.as_str()).hash(&mut hasher),
            Value::Symbol(s) => (5u8, s.0.id).hash(&mut hasher),
            Value::BigInt(b) => (6u8, b.to_string_radix(16)).hash(&mut hasher),
            Value::Object(o) => (7u8, o.as_ptr() as usize).hash(&mut hasher),
            Value::Flagged(_) | Value::Command(_) | Value::Deleted | Value::Uninitialized => {
                8u8.hash(&mut hasher)
            }
        }
        hasher.finish()
    }

    fn same_value_zero(&self, other: &Value) -> bool {
        match (&self.0, other) {
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => self.0 == *other,
        }
    }
}

struct MapEntry {
    key: Value,
    value: Value,
}

pub struct MapData {
    entries: Vec<Option<MapEntry>>,
    index: IntMap<Vec<usize>>,
    size: usize,
}

impl MapData {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: IntMap::new(),
            size: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn find_index(&self, key: &Value) -> Option<usize> {
        let hash = MapKey(key.clone()).hash_value();
        self.index.get(hash)?.iter().copied().find(|&idx| {
            self.entries[idx]
                .as_ref()
                .is_some_and(|e| MapKey(e.key.clone()).same_value_zero(key))
        })
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.find_index(key).map(|idx| self.entries[idx].as_ref().unwrap().value.clone())
    }

    pub fn has(&self, key: &Value) -> bool {
        self.find_index(key).is_some()
    }

    pub fn set(&mut self, key: Value, value: Value) {
        if let Some(idx) = self.find_index(&key) {
            self.entries[idx].as_mut().unwrap().value = value;
            return;
        }
        let hash = MapKey(key.clone()).hash_value();
        let new_idx = self.entries.len();
        self.entries.push(Some(MapEntry { key, value }));
        self.size += 1;
        let mut bucket = self.index.get(hash).cloned().unwrap_or_default();
        bucket.push(new_idx);
        self.index.insert(hash, bucket);
    }

    pub fn delete(&mut self, key: &Value) -> bool {
        let Some(idx) = self.find_index(key) else {
            return false;
        };
        self.entries[idx] = None;
        self.size -= 1;
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = IntMap::new();
        self.size = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries
            .iter()
            .filter_map(|e| e.as_ref().map(|e| (&e.key, &e.value)))
    }
}

impl Default for MapData {
    fn default() -> Self {
        Self::new()
    }
}

/// WeakMap storage reuses `MapData` entirely; what makes the container
/// "weak" is that `JsObject`'s `GcTraceable` impl, for
/// `ObjectKind::WeakMap`, traces each entry's value but not its key —
/// the map itself must not be what keeps a key object reachable. This
/// is the minimal read of §1's "no weak references beyond the
/// weak-map/weak-set container kinds": no ephemeron GC, no
/// finalization callback, just a container that doesn't artificially
/// extend its keys' lifetime.
pub type WeakMapData = MapData;

pub struct SetData(MapData);

impl SetData {
    pub fn new() -> Self {
        Self(MapData::new())
    }
    pub fn size(&self) -> usize {
        self.0.size()
    }
    pub fn has(&self, value: &Value) -> bool {
        self.0.has(value)
    }
    pub fn add(&mut self, value: Value) {
        self.0.set(value.clone(), value);
    }
    pub fn delete(&mut self, value: &Value) -> bool {
        self.0.delete(value)
    }
    pub fn clear(&mut self) {
        self.0.clear()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(k, _)| k)
    }
}

impl Default for SetData {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intmap_insert_get_remove() {
        let mut m = IntMap::new();
        m.insert(5, "a");
        m.insert(21, "b"); // collides with 5 under a small capacity mask
        assert_eq!(m.get(5), Some(&"a"));
        assert_eq!(m.get(21), Some(&"b"));
        assert_eq!(m.remove(5), Some("a"));
        assert_eq!(m.get(5), None);
        assert_eq!(m.get(21), Some(&"b"));
    }

    #[test]
    fn intmap_grows_under_load() {
        let mut m = IntMap::new();
        for i in 0..200u64 {
            m.insert(i, i);
        }
        for i in 0..200u64 {
            assert_eq!(m.get(i), Some(&i));
        }
    }

    #[test]
    fn map_data_set_get_delete() {
        let mut m = MapData::new();
        m.set(Value::int32(1), Value::string(crate::string::JsString::intern("one")));
        assert_eq!(m.size(), 1);
        assert!(m.has(&Value::int32(1)));
        assert!(m.delete(&Value::int32(1)));
        assert!(!m.has(&Value::int32(1)));
    }

    #[test]
    fn map_data_nan_keys_are_same_value_zero() {
        let mut m = MapData::new();
        m.set(Value::number(f64::NAN), Value::int32(1));
        assert!(m.has(&Value::number(f64::NAN)));
    }

    #[test]
    fn set_data_dedupes() {
        let mut s = SetData::new();
        s.add(Value::int32(1));
        s.add(Value::int32(1));
        assert_eq!(s.size(), 1);
    }
}
