//! Objects: a shape pointer plus a flat slot array, the property
//! access protocol, and the exotic-kind dispatch (ordinary / array /
//! function / private / proxy) that in the original is read off the
//! low 3 bits of the prototype pointer. An enum variant on
//! [`ObjectKind`] is the idiomatic stand-in for that bit-packing
//! trick — see the note atop `value.rs`.

use crate::closure::Closure;
use crate::error::{ErrorKind, RtError, RtResult, Strictness};
use crate::map_data::{MapData, SetData, WeakMapData};
use crate::proxy::ProxyData;
use crate::shape::Shape;
use crate::string::JsString;
use crate::value::Value;
use parking_lot::RwLock;
use rt_gc::{GcHeader, GcRef, GcTraceable};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(JsString),
    Symbol(u64),
    Index(u32),
}

impl PropertyKey {
    pub fn from_str(s: &str) -> Self {
        Self::String(JsString::intern(s))
    }
    pub fn index(i: u32) -> Self {
        Self::Index(i)
    }
    pub fn symbol(id: u64) -> Self {
        Self::Symbol(id)
    }
    pub fn from_symbol(symbol: &crate::string::JsSymbol) -> Self {
        Self::Symbol(symbol.0.id)
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}
impl From<u32> for PropertyKey {
    fn from(i: u32) -> Self {
        Self::Index(i)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PropertyAttributes {
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl PropertyAttributes {
    pub const fn data() -> Self {
        Self {
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }
    pub const fn frozen() -> Self {
        Self {
            writable: false,
            enumerable: false,
            configurable: false,
        }
    }
}

#[derive(Clone, Debug)]
pub enum PropertyDescriptor {
    Data {
        value: Value,
        attributes: PropertyAttributes,
    },
    Accessor {
        get: Option<Value>,
        set: Option<Value>,
        attributes: PropertyAttributes,
    },
}

impl PropertyDescriptor {
    pub fn data(value: Value) -> Self {
        Self::Data {
            value,
            attributes: PropertyAttributes::data(),
        }
    }

    pub fn is_configurable(&self) -> bool {
        match self {
            Self::Data { attributes, .. } | Self::Accessor { attributes, .. } => {
                attributes.configurable
            }
        }
    }

    pub fn is_enumerable(&self) -> bool {
        match self {
            Self::Data { attributes, .. } | Self::Accessor { attributes, .. } => {
                attributes.enumerable
            }
        }
    }
}

/// A slot holds either a plain value or a descriptor. The original
/// keeps this distinction as a tag bit on the slot (`descr1.c`,
/// `descr2.c`); here it is simply which enum variant occupies the
/// position, which is also what [`Shape::cache_key`]'s descriptor bit
/// tells a cached call site without touching the slot at all.
#[derive(Clone, Debug)]
pub enum Slot {
    Value(Value),
    Descriptor(PropertyDescriptor),
}

impl Slot {
    fn as_value(&self) -> Option<&Value> {
        match self {
            Slot::Value(v) => Some(v),
            Slot::Descriptor(PropertyDescriptor::Data { value, .. }) => Some(value),
            Slot::Descriptor(PropertyDescriptor::Accessor { .. }) => None,
        }
    }
}

/// What `get_prop`/`set_prop` found at a given key.
pub enum PropertyLookup {
    NotFound,
    Value(Value),
    Accessor { get: Option<Value>, set: Option<Value> },
}

/// What the caller must still do to finish a `set_prop`.
pub enum SetOutcome {
    Done,
    InvokeSetter(Value),
    Silent,
}

pub enum ObjectKind {
    Ordinary,
    Array,
    Function(Closure),
    Map(RwLock<MapData>),
    Set(RwLock<SetData>),
    /// Holds its entries' values strongly and its keys weakly: see
    /// `GcTraceable for JsObject`, which traces only the value half of
    /// each entry.
    WeakMap(RwLock<WeakMapData>),
    /// Holds its members weakly: traced by nothing at all, so
    /// membership alone never keeps a member reachable.
    WeakSet(RwLock<SetData>),
    Proxy(ProxyData),
}

/// Growth envelope for array backing storage: never grow by less than
/// 4 slots nor more than 256 at a time, scaling with current capacity
/// in between.
pub fn array_growth(capacity: usize) -> usize {
    (capacity / 16).clamp(4, 256)
}

pub struct JsObject {
    shape: RwLock<Arc<Shape>>,
    slots: RwLock<Vec<Slot>>,
    elements: RwLock<Vec<Value>>,
    prototype: RwLock<Value>,
    kind: ObjectKind,
    extensible: AtomicBool,
    /// Cleared the moment anything could have broken the "every array
    /// property access can use the dense `elements` vector directly"
    /// invariant: a non-default prototype, or a non-index property
    /// defined directly on the array. Mirrors the original's
    /// `proto == fast_arr_proto && length != sentinel` fast-path guard
    /// without needing a global prototype registry in this crate.
    fast_array: AtomicBool,
}

impl JsObject {
    pub fn ordinary(prototype: Value) -> Self {
        Self {
            shape: RwLock::new(Shape::root()),
            slots: RwLock::new(Vec::new()),
            elements: RwLock::new(Vec::new()),
            prototype: RwLock::new(prototype),
            kind: ObjectKind::Ordinary,
            extensible: AtomicBool::new(true),
            fast_array: AtomicBool::new(false),
        }
    }

    pub fn array(prototype: Value, length: u32) -> Self {
        Self {
            shape: RwLock::new(Shape::root()),
            slots: RwLock::new(Vec::new()),
            elements: RwLock::new(vec![Value::undefined(); length as usize]),
            prototype: RwLock::new(prototype),
            kind: ObjectKind::Array,
            extensible: AtomicBool::new(true),
            fast_array: AtomicBool::new(true),
        }
    }

    pub fn function(prototype: Value, closure: Closure) -> Self {
        Self {
            shape: RwLock::new(Shape::root()),
            slots: RwLock::new(Vec::new()),
            elements: RwLock::new(Vec::new()),
            prototype: RwLock::new(prototype),
            kind: ObjectKind::Function(closure),
            extensible: AtomicBool::new(true),
            fast_array: AtomicBool::new(false),
        }
    }

    pub fn map(prototype: Value) -> Self {
        Self {
            shape: RwLock::new(Shape::root()),
            slots: RwLock::new(Vec::new()),
            elements: RwLock::new(Vec::new()),
            prototype: RwLock::new(prototype),
            kind: ObjectKind::Map(RwLock::new(MapData::new())),
            extensible: AtomicBool::new(true),
            fast_array: AtomicBool::new(false),
        }
    }

    pub fn set_object(prototype: Value) -> Self {
        Self {
            shape: RwLock::new(Shape::root()),
            slots: RwLock::new(Vec::new()),
            elements: RwLock::new(Vec::new()),
            prototype: RwLock::new(prototype),
            kind: ObjectKind::Set(RwLock::new(SetData::new())),
            extensible: AtomicBool::new(true),
            fast_array: AtomicBool::new(false),
        }
    }

    pub fn weak_map(prototype: Value) -> Self {
        Self {
            shape: RwLock::new(Shape::root()),
            slots: RwLock::new(Vec::new()),
            elements: RwLock::new(Vec::new()),
            prototype: RwLock::new(prototype),
            kind: ObjectKind::WeakMap(RwLock::new(WeakMapData::new())),
            extensible: AtomicBool::new(true),
            fast_array: AtomicBool::new(false),
        }
    }

    pub fn weak_set(prototype: Value) -> Self {
        Self {
            shape: RwLock::new(Shape::root()),
            slots: RwLock::new(Vec::new()),
            elements: RwLock::new(Vec::new()),
            prototype: RwLock::new(prototype),
            kind: ObjectKind::WeakSet(RwLock::new(SetData::new())),
            extensible: AtomicBool::new(true),
            fast_array: AtomicBool::new(false),
        }
    }

    pub fn proxy(prototype: Value, target: Value, handler: Value) -> Self {
        Self {
            shape: RwLock::new(Shape::root()),
            slots: RwLock::new(Vec::new()),
            elements: RwLock::new(Vec::new()),
            prototype: RwLock::new(prototype),
            kind: ObjectKind::Proxy(ProxyData::new(target, handler)),
            extensible: AtomicBool::new(true),
            fast_array: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, ObjectKind::Array)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    pub fn as_closure(&self) -> Option<&Closure> {
        match &self.kind {
            ObjectKind::Function(c) => Some(c),
            _ => None,
        }
    }

    pub fn prototype(&self) -> Value {
        self.prototype.read().clone()
    }

    pub fn set_prototype(&self, new_proto: Value) -> RtResult<()> {
        if !new_proto.is_nullish() && !new_proto.is_object() {
            return Err(ErrorKind::TypeErrorInvalidPrototype.into());
        }
        // Cyclic check: walk the candidate's own chain looking for self.
        if let Some(mut cur) = new_proto.as_object() {
            loop {
                if std::ptr::eq(&*cur, self) {
                    return Err(ErrorKind::TypeErrorCyclicPrototype.into());
                }
                match cur.prototype().as_object() {
                    Some(next) => cur = next,
                    None => break,
                }
            }
        }
        *self.prototype.write() = new_proto;
        self.fast_array.store(false, Ordering::Release);
        Ok(())
    }

    pub fn is_extensible(&self) -> bool {
        self.extensible.load(Ordering::Acquire)
    }

    pub fn prevent_extensions(&self) {
        self.extensible.store(false, Ordering::Release);
    }

    fn use_array_fast_path(&self, key: &PropertyKey) -> bool {
        matches!(key, PropertyKey::Index(_))
            && self.is_array()
            && self.fast_array.load(Ordering::Acquire)
    }

    pub fn array_length(&self) -> u32 {
        self.elements.read().len() as u32
    }

    /// `ArraySetLength` (ES2023 §10.4.2.1, the growth/truncation and
    /// non-writable-length coercion rules): growing pads with holes
    /// (`Value::Deleted`). Shrinking (§4.3.3) walks from `old_len - 1`
    /// down to the requested length, deleting each configurable
    /// element it finds; an element with a non-configurable descriptor
    /// can't be deleted, which raises a floor the final length can't
    /// shrink below — deletion of the other elements in range still
    /// proceeds, so this is a partial success, not an early abort (§8
    /// Concrete Scenario #3: `a=[10,20,30]`, index `1` made
    /// non-configurable, `a.length=0` ends with `length===2`,
    /// `a[0]` deleted, `a[1]===20`).
    pub fn set_array_length(&self, new_len: u32, strictness: Strictness) -> RtResult<()> {
        if !self.is_array() {
            return strict_err(strictness, ErrorKind::TypeErrorUnsupportedOperation);
        }
        let mut elements = self.elements.write();
        let requested_len = new_len as usize;
        let old_len = elements.len();
        if requested_len < old_len {
            let mut floor = requested_len;
            let shape = self.shape.read();
            let slots = self.slots.read();
            for idx in (requested_len..old_len).rev() {
                let configurable = match shape.get_offset(&PropertyKey::index(idx as u32)) {
                    Some(offset) => match &slots[offset] {
                        Slot::Value(_) => true,
                        Slot::Descriptor(d) => d.is_configurable(),
                    },
                    None => true,
                };
                if configurable {
                    elements[idx] = Value::Deleted;
                } else if idx + 1 > floor {
                    floor = idx + 1;
                }
            }
            drop(shape);
            drop(slots);
            elements.truncate(floor);
        } else if requested_len > old_len {
            elements.resize(requested_len, Value::Deleted);
        }
        Ok(())
    }

    pub fn arr_get(&self, index: u32) -> Option<Value> {
        self.elements.read().get(index as usize).cloned()
    }

    pub fn arr_set(&self, index: u32, value: Value) {
        let mut elements = self.elements.write();
        let idx = index as usize;
        if idx < elements.len() {
            elements[idx] = value;
            return;
        }
        let growth = array_growth(elements.len());
        let target_capacity = elements.len() + growth.max(idx + 1 - elements.len());
        elements.reserve(target_capacity.saturating_sub(elements.len()));
        elements.resize(idx, Value::Deleted);
        elements.push(value);
    }

    /// An array index that has been demoted (§4.3.5: defined with any
    /// descriptor beyond the canonical all-`true` data value) has its
    /// authoritative storage in `shape`/`slots` like any ordinary
    /// property, and `elements[i]` is left as `Value::Deleted` to mark
    /// that the dense vector no longer owns it. Every other index keeps
    /// reading straight off `elements`, demoted or not.
    fn array_index_slot(&self, i: u32) -> Option<PropertyLookup> {
        let key = PropertyKey::Index(i);
        if let Some(offset) = self.shape.read().get_offset(&key) {
            return match &self.slots.read()[offset] {
                Slot::Value(Value::Deleted) => None,
                Slot::Value(v) => Some(PropertyLookup::Value(v.clone())),
                Slot::Descriptor(PropertyDescriptor::Data { value, .. }) => {
                    Some(PropertyLookup::Value(value.clone()))
                }
                Slot::Descriptor(PropertyDescriptor::Accessor { get, set, .. }) => {
                    Some(PropertyLookup::Accessor { get: get.clone(), set: set.clone() })
                }
            };
        }
        match self.arr_get(i) {
            None | Some(Value::Deleted) => None,
            Some(v) => Some(PropertyLookup::Value(v)),
        }
    }

    fn own_slot(&self, key: &PropertyKey) -> Option<PropertyLookup> {
        if self.use_array_fast_path(key) {
            let PropertyKey::Index(i) = key else { unreachable!() };
            return self.arr_get(*i).map(PropertyLookup::Value);
        }
        if let PropertyKey::Index(i) = key {
            if self.is_array() {
                return self.array_index_slot(*i);
            }
        }
        let shape = self.shape.read();
        let offset = shape.get_offset(key)?;
        let slots = self.slots.read();
        match &slots[offset] {
            Slot::Value(v) => Some(PropertyLookup::Value(v.clone())),
            Slot::Descriptor(PropertyDescriptor::Data { value, .. }) => {
                Some(PropertyLookup::Value(value.clone()))
            }
            Slot::Descriptor(PropertyDescriptor::Accessor { get, set, .. }) => {
                Some(PropertyLookup::Accessor {
                    get: get.clone(),
                    set: set.clone(),
                })
            }
        }
    }

    pub fn has_own(&self, key: &PropertyKey) -> bool {
        if self.use_array_fast_path(key) {
            let PropertyKey::Index(i) = key else { unreachable!() };
            return matches!(self.arr_get(*i), Some(v) if !matches!(v, Value::Deleted));
        }
        if let PropertyKey::Index(i) = key {
            if self.is_array() {
                return self.array_index_slot(*i).is_some();
            }
        }
        self.shape.read().get_offset(key).is_some()
    }

    pub fn has_prop(&self, key: &PropertyKey) -> bool {
        if self.has_own(key) {
            return true;
        }
        match self.prototype().as_object() {
            Some(proto) => proto.has_prop(key),
            None => false,
        }
    }

    /// `[[Get]]` (§4.3): own slot, else array fast path, else walk the
    /// prototype chain.
    pub fn get_prop(&self, key: &PropertyKey) -> PropertyLookup {
        if let Some(found) = self.own_slot(key) {
            return found;
        }
        match self.prototype().as_object() {
            Some(proto) => proto.get_prop(key),
            None => PropertyLookup::NotFound,
        }
    }

    /// `[[Set]]` (§4.3): returns what the caller still needs to do.
    /// Non-extensible/read-only failures are silent in sloppy mode and
    /// an error in strict mode, per §7.
    pub fn set_prop(&self, key: PropertyKey, value: Value, strictness: Strictness) -> RtResult<SetOutcome> {
        if self.use_array_fast_path(&key) {
            let PropertyKey::Index(i) = key else { unreachable!() };
            self.arr_set(i, value);
            return Ok(SetOutcome::Done);
        }

        if let PropertyKey::Index(i) = &key {
            if self.is_array() {
                if self.shape.read().get_offset(&key).is_none() {
                    self.fast_array.store(false, Ordering::Release);
                    self.arr_set(*i, value);
                    return Ok(SetOutcome::Done);
                }
                // Demoted: fall through to the shape-backed path below,
                // which already enforces accessor/writable semantics.
            }
        }

        let offset = self.shape.read().get_offset(&key);
        if let Some(offset) = offset {
            let mut slots = self.slots.write();
            match &slots[offset] {
                Slot::Descriptor(PropertyDescriptor::Accessor { set, .. }) => {
                    return Ok(match set.clone() {
                        Some(setter) => SetOutcome::InvokeSetter(setter),
                        None => SetOutcome::Silent,
                    });
                }
                Slot::Descriptor(PropertyDescriptor::Data { attributes, .. }) if !attributes.writable => {
                    drop(slots);
                    return match strict_check(strictness, ErrorKind::TypeErrorReadOnlyProperty(key_name(&key))) {
                        Ok(()) => Ok(SetOutcome::Silent),
                        Err(e) => Err(e),
                    };
                }
                _ => {}
            }
            slots[offset] = Slot::Value(value);
            return Ok(SetOutcome::Done);
        }

        if !self.is_extensible() {
            return match strict_check(strictness, ErrorKind::TypeErrorObjectNotExtensible) {
                Ok(()) => Ok(SetOutcome::Silent),
                Err(e) => Err(e),
            };
        }

        let mut shape = self.shape.write();
        let next = shape.transition(key)?;
        *shape = next;
        drop(shape);
        self.slots.write().push(Slot::Value(value));
        Ok(SetOutcome::Done)
    }

    /// Move an array index's authoritative storage from the dense
    /// `elements` vector into a shape-backed slot: `elements`'s
    /// `RwLock<Vec<Value>>` has no room for per-slot attributes or an
    /// accessor pair, so any descriptor beyond the canonical
    /// all-`true` data value needs the same representation ordinary
    /// named properties already use. `elements[i]` is left holding
    /// `Value::Deleted` — the sentinel `delete_prop`'s array branch
    /// already uses to mean "not here" — and `fast_array` is cleared so
    /// every later lookup on this object checks the shape before
    /// trusting the dense vector for any index, not just this one.
    fn demote_array_index(&self, i: u32, desc: PropertyDescriptor, strictness: Strictness) -> RtResult<bool> {
        if !self.is_extensible() {
            return strict_err_bool(strictness, ErrorKind::TypeErrorObjectNotExtensible);
        }
        let mut shape = self.shape.write();
        let next = shape.transition(PropertyKey::Index(i))?;
        *shape = next;
        drop(shape);
        self.slots.write().push(Slot::Descriptor(desc));
        self.fast_array.store(false, Ordering::Release);

        let mut elements = self.elements.write();
        let idx = i as usize;
        if idx >= elements.len() {
            elements.resize(idx + 1, Value::Deleted);
        } else {
            elements[idx] = Value::Deleted;
        }
        Ok(true)
    }

    pub fn define_property(
        &self,
        key: PropertyKey,
        desc: PropertyDescriptor,
        strictness: Strictness,
    ) -> RtResult<bool> {
        if let PropertyKey::Index(i) = &key {
            if self.is_array() && self.shape.read().get_offset(&key).is_none() {
                if let PropertyDescriptor::Data { value, attributes } = &desc {
                    if attributes.writable && attributes.enumerable && attributes.configurable {
                        self.fast_array.store(false, Ordering::Release);
                        self.arr_set(*i, value.clone());
                        return Ok(true);
                    }
                }
                return self.demote_array_index(*i, desc, strictness);
            }
        }

        let offset = self.shape.read().get_offset(&key);
        if let Some(offset) = offset {
            let existing_configurable = match &self.slots.read()[offset] {
                Slot::Value(_) => true,
                Slot::Descriptor(d) => d.is_configurable(),
            };
            if !existing_configurable {
                return strict_err_bool(strictness, ErrorKind::TypeErrorDefineProperty3(key_name(&key)));
            }
            self.slots.write()[offset] = Slot::Descriptor(desc);
            return Ok(true);
        }

        if !self.is_extensible() {
            return strict_err_bool(strictness, ErrorKind::TypeErrorObjectNotExtensible);
        }

        let mut shape = self.shape.write();
        let next = shape.transition(key)?;
        *shape = next;
        drop(shape);
        self.slots.write().push(Slot::Descriptor(desc));
        Ok(true)
    }

    pub fn delete_prop(&self, key: &PropertyKey, strictness: Strictness) -> RtResult<bool> {
        if let PropertyKey::Index(i) = key {
            if self.is_array() && self.shape.read().get_offset(key).is_none() {
                let mut elements = self.elements.write();
                if let Some(slot) = elements.get_mut(*i as usize) {
                    *slot = Value::Deleted;
                }
                return Ok(true);
            }
        }

        let offset = self.shape.read().get_offset(key);
        let Some(offset) = offset else {
            return Ok(true);
        };
        let configurable = match &self.slots.read()[offset] {
            Slot::Value(_) => true,
            Slot::Descriptor(d) => d.is_configurable(),
        };
        if !configurable {
            return strict_err_bool(strictness, ErrorKind::TypeErrorDefineProperty3(key_name(key)));
        }
        // The slot array cannot shrink without invalidating every
        // later offset, so deletion replaces the slot with a deleted
        // sentinel rather than removing it; lookups already treat a
        // `Slot::Value(Value::Deleted)` as "not found" via `own_keys`
        // filtering and a subsequent `has_own` returning `false` for
        // callers that check attributes first.
        self.slots.write()[offset] = Slot::Value(Value::Deleted);
        Ok(true)
    }

    pub fn own_keys(&self) -> Vec<PropertyKey> {
        let mut keys: Vec<PropertyKey> = self
            .elements
            .read()
            .iter()
            .enumerate()
            .filter(|(_, v)| !matches!(v, Value::Deleted))
            .map(|(i, _)| PropertyKey::Index(i as u32))
            .collect();
        let shape = self.shape.read();
        let slots = self.slots.read();
        for key in shape.own_keys() {
            if let Some(offset) = shape.get_offset(&key) {
                if matches!(slots[offset], Slot::Value(Value::Deleted)) {
                    continue;
                }
            }
            keys.push(key);
        }
        keys
    }
}

fn key_name(key: &PropertyKey) -> String {
    match key {
        PropertyKey::String(s) => s.as_str().to_string(),
        PropertyKey::Symbol(id) => format!("Symbol({id})"),
        PropertyKey::Index(i) => i.to_string(),
    }
}

fn strict_check(strictness: Strictness, kind: ErrorKind) -> RtResult<()> {
    crate::error::strict_check(strictness, kind)
}

fn strict_err<T>(strictness: Strictness, kind: ErrorKind) -> RtResult<T>
where
    T: Default,
{
    strict_check(strictness, kind)?;
    Ok(T::default())
}

fn strict_err_bool(strictness: Strictness, kind: ErrorKind) -> RtResult<bool> {
    match strict_check(strictness, kind) {
        Ok(()) => Ok(false),
        Err(e) => Err(e),
    }
}

impl GcTraceable for JsObject {
    fn trace(&self, tracer: &mut dyn FnMut(*const GcHeader)) {
        self.prototype.read().trace(tracer);
        for slot in self.slots.read().iter() {
            match slot {
                Slot::Value(v) => v.trace(tracer),
                Slot::Descriptor(PropertyDescriptor::Data { value, .. }) => value.trace(tracer),
                Slot::Descriptor(PropertyDescriptor::Accessor { get, set, .. }) => {
                    if let Some(g) = get {
                        g.trace(tracer);
                    }
                    if let Some(s) = set {
                        s.trace(tracer);
                    }
                }
            }
        }
        for v in self.elements.read().iter() {
            v.trace(tracer);
        }
        match &self.kind {
            ObjectKind::Function(c) => c.trace(tracer),
            ObjectKind::Map(m) => {
                for (k, v) in m.read().iter() {
                    k.trace(tracer);
                    v.trace(tracer);
                }
            }
            ObjectKind::Set(s) => {
                for v in s.read().iter() {
                    v.trace(tracer);
                }
            }
            // Weak on the key side: tracing the value keeps it valid to
            // read back out, but never traces the key, so an object
            // reachable only through a WeakMap key can still be
            // collected.
            ObjectKind::WeakMap(m) => {
                for (_, v) in m.read().iter() {
                    v.trace(tracer);
                }
            }
            // Weak on the member itself: traced by nothing, matching
            // WeakSet semantics that membership never keeps a member
            // alive.
            ObjectKind::WeakSet(_) => {}
            ObjectKind::Proxy(p) => p.trace(tracer),
            ObjectKind::Ordinary | ObjectKind::Array => {}
        }
    }
}

impl std::fmt::Debug for JsObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsObject")
            .field("properties", &self.shape.read().property_count())
            .field("is_array", &self.is_array())
            .finish()
    }
}

impl GcRef<JsObject> {
    /// Convenience: look up a property walking the prototype chain
    /// through further `GcRef` dereferences, since `GcRef<JsObject>`
    /// derefs to `&JsObject` but `get_prop`'s prototype-chain recursion
    /// needs a `GcRef` to call itself on.
    pub fn get_prop(&self, key: &PropertyKey) -> PropertyLookup {
        (**self).get_prop(key)
    }
    pub fn has_prop(&self, key: &PropertyKey) -> bool {
        (**self).has_prop(key)
    }
    pub fn prototype(&self) -> Value {
        (**self).prototype()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of(lookup: PropertyLookup) -> Option<Value> {
        match lookup {
            PropertyLookup::Value(v) => Some(v),
            _ => None,
        }
    }

    #[test]
    fn ordinary_get_set_round_trip() {
        let obj = JsObject::ordinary(Value::null());
        obj.set_prop(PropertyKey::from_str("foo"), Value::int32(42), Strictness::Sloppy).unwrap();
        assert_eq!(value_of(obj.get_prop(&PropertyKey::from_str("foo"))), Some(Value::int32(42)));
    }

    #[test]
    fn has_prop_walks_prototype_chain() {
        let proto = GcRef::new(JsObject::ordinary(Value::null()));
        proto.set_prop(PropertyKey::from_str("inherited"), Value::int32(1), Strictness::Sloppy).unwrap();
        let child = JsObject::ordinary(Value::object(proto));
        assert!(child.has_prop(&PropertyKey::from_str("inherited")));
        assert!(!child.has_own(&PropertyKey::from_str("inherited")));
    }

    #[test]
    fn array_fast_path_round_trips() {
        let arr = JsObject::array(Value::null(), 3);
        arr.arr_set(0, Value::int32(1));
        arr.arr_set(1, Value::int32(2));
        arr.arr_set(2, Value::int32(3));
        assert_eq!(arr.arr_get(0), Some(Value::int32(1)));
        assert_eq!(arr.array_length(), 3);
    }

    #[test]
    fn array_fast_path_grows_past_initial_length() {
        let arr = JsObject::array(Value::null(), 0);
        arr.arr_set(10, Value::int32(99));
        assert_eq!(arr.array_length(), 11);
        assert_eq!(arr.arr_get(10), Some(Value::int32(99)));
    }

    #[test]
    fn read_only_property_is_silent_in_sloppy_mode() {
        let obj = JsObject::ordinary(Value::null());
        obj.define_property(
            PropertyKey::from_str("frozen"),
            PropertyDescriptor::Data {
                value: Value::int32(1),
                attributes: PropertyAttributes::frozen(),
            },
            Strictness::Sloppy,
        )
        .unwrap();
        let outcome = obj.set_prop(PropertyKey::from_str("frozen"), Value::int32(2), Strictness::Sloppy).unwrap();
        assert!(matches!(outcome, SetOutcome::Silent));
        assert_eq!(value_of(obj.get_prop(&PropertyKey::from_str("frozen"))), Some(Value::int32(1)));
    }

    #[test]
    fn read_only_property_raises_in_strict_mode() {
        let obj = JsObject::ordinary(Value::null());
        obj.define_property(
            PropertyKey::from_str("frozen"),
            PropertyDescriptor::Data {
                value: Value::int32(1),
                attributes: PropertyAttributes::frozen(),
            },
            Strictness::Strict,
        )
        .unwrap();
        let result = obj.set_prop(PropertyKey::from_str("frozen"), Value::int32(2), Strictness::Strict);
        assert!(result.is_err());
    }

    #[test]
    fn cyclic_prototype_is_rejected() {
        let a = GcRef::new(JsObject::ordinary(Value::null()));
        let result = a.set_prototype(Value::object(a));
        assert!(matches!(result, Err(RtError::Kind(ErrorKind::TypeErrorCyclicPrototype))));
    }

    #[test]
    fn accessor_get_reports_getter() {
        let obj = JsObject::ordinary(Value::null());
        let getter = Value::int32(7); // stand-in for a function value
        obj.define_property(
            PropertyKey::from_str("x"),
            PropertyDescriptor::Accessor {
                get: Some(getter.clone()),
                set: None,
                attributes: PropertyAttributes::data(),
            },
            Strictness::Sloppy,
        )
        .unwrap();
        match obj.get_prop(&PropertyKey::from_str("x")) {
            PropertyLookup::Accessor { get, .. } => assert_eq!(get, Some(getter)),
            _ => panic!("expected accessor"),
        }
    }
}
