//! Function objects: the native-call surface, captured-variable
//! cells, and the `with`-scope chain consulted during unqualified name
//! resolution.
//!
//! The compiler/bytecode layer that would normally supply a function
//! *body* is out of scope here (see `spec.md` §1); a `Closure` in this
//! crate is therefore always backed by a native function pointer. This
//! keeps the call convention itself — argument binding, `this`
//! binding, upvalue capture, `with`-scope lookup — fully exercised
//! without inventing a bytecode format nobody asked for.

use crate::error::RtResult;
use crate::string::JsString;
use crate::value::Value;
use rt_gc::{GcHeader, GcTraceable};
use std::rc::Rc;

pub type NativeFn = fn(this: &Value, args: &[Value]) -> RtResult<Value>;

/// One captured variable. The original stores three fields per cell —
/// the value, an owner-or-refcount word (whose interpretation depends
/// on whether the cell is still owned by a live stack frame or has
/// been promoted to the heap), and a link to the next cell captured by
/// the same closure — so a whole capture list can be walked without a
/// separate `Vec`. Rust's `Vec<UpvalueCell>` on `Closure` already gives
/// us that traversal for free, so `next` is dropped; the owner/value
/// split survives as the thing that actually matters: whether writes
/// from an outer scope are still visible to the inner one.
pub struct UpvalueCell {
    pub value: parking_lot::RwLock<Value>,
}

impl UpvalueCell {
    pub fn new(initial: Value) -> Self {
        Self {
            value: parking_lot::RwLock::new(initial),
        }
    }

    pub fn get(&self) -> Value {
        self.value.read().clone()
    }

    pub fn set(&self, v: Value) {
        *self.value.write() = v;
    }
}

/// A `with` statement pushes its operand object onto this chain for
/// the remainder of the block; unqualified identifier lookup consults
/// every frame here, innermost first, before falling back to the
/// lexical scope and then the global object. Modeled per call frame
/// (an `Rc` chain owned by the running frame), not per function the
/// way the original's `with_scope` header field suggests, since the
/// scope is a property of *where execution currently is*, not of the
/// function's identity.
pub struct WithScope {
    pub object: Value,
    pub parent: Option<Rc<WithScope>>,
}

impl WithScope {
    pub fn push(object: Value, parent: Option<Rc<WithScope>>) -> Rc<Self> {
        Rc::new(Self { object, parent })
    }
}

impl Drop for WithScope {
    /// Take `parent` out before the generated glue would otherwise
    /// recurse into it, and unwind the rest of the chain iteratively
    /// instead (see [`crate::drop_guard`]).
    fn drop(&mut self) {
        if let Some(parent) = self.parent.take() {
            crate::drop_guard::drop_with_scope_chain(parent);
        }
    }
}

pub struct Closure {
    pub name: Option<JsString>,
    pub param_count: u32,
    pub is_arrow: bool,
    pub is_generator: bool,
    pub is_async: bool,
    pub native: NativeFn,
    pub upvalues: Vec<UpvalueCell>,
    pub with_scope: Option<Rc<WithScope>>,
    /// `[[HomeObject]]`, consulted by `super` property lookups.
    pub home_object: Option<Value>,
}

impl Closure {
    pub fn native(native: NativeFn, param_count: u32) -> Self {
        Self {
            name: None,
            param_count,
            is_arrow: false,
            is_generator: false,
            is_async: false,
            native,
            upvalues: Vec::new(),
            with_scope: None,
            home_object: None,
        }
    }

    pub fn call(&self, this: &Value, args: &[Value]) -> RtResult<Value> {
        (self.native)(this, args)
    }
}

impl GcTraceable for Closure {
    fn trace(&self, tracer: &mut dyn FnMut(*const GcHeader)) {
        for cell in &self.upvalues {
            cell.value.read().trace(tracer);
        }
        if let Some(home) = &self.home_object {
            home.trace(tracer);
        }
        let mut scope = self.with_scope.as_deref();
        while let Some(s) = scope {
            s.object.trace(tracer);
            scope = s.parent.as_deref();
        }
    }
}

impl std::fmt::Debug for Closure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.name)
            .field("param_count", &self.param_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(_this: &Value, args: &[Value]) -> RtResult<Value> {
        Ok(args.first().cloned().unwrap_or(Value::undefined()))
    }

    #[test]
    fn native_call_invokes_function_pointer() {
        let closure = Closure::native(identity, 1);
        let result = closure.call(&Value::undefined(), &[Value::int32(42)]).unwrap();
        assert_eq!(result, Value::int32(42));
    }

    #[test]
    fn upvalue_writes_are_visible_through_the_cell() {
        let cell = UpvalueCell::new(Value::int32(1));
        cell.set(Value::int32(2));
        assert_eq!(cell.get(), Value::int32(2));
    }

    #[test]
    fn with_scope_chain_walks_innermost_first() {
        let outer = WithScope::push(Value::int32(1), None);
        let inner = WithScope::push(Value::int32(2), Some(outer));
        assert_eq!(inner.object, Value::int32(2));
        assert_eq!(inner.parent.as_ref().unwrap().object, Value::int32(1));
    }
}
