//! The call stack and the try/catch handler chain.
//!
//! The original links stack frames through a doubly-linked
//! `StackLink` so a conservative GC scan can walk the mutator's call
//! stack without cooperation from the interpreter, and unwinds a
//! `throw` via `setjmp`/`longjmp` through a chain of `TryHandler`
//! records. Per the Design Notes (§9 option (a)), this crate replaces
//! the longjmp unwind with ordinary `Result` propagation — every
//! frame-returning operation already returns [`crate::error::RtResult`],
//! so "unwind to the nearest handler" is just "return `Err` and let
//! the caller's `?` do it". What's kept from the original is the
//! *data* a handler needs once it catches something: the saved stack
//! depth to truncate back to, and the `with`-scope/closure state in
//! effect when the `try` was entered.

use crate::closure::WithScope;
use crate::error::{RtError, RtResult};
use crate::value::Value;
use rt_gc::{ErasedGcRef, GcHeader};
use std::rc::Rc;

/// One activation record. Stack frames are singly-linked from the top
/// (the original's doubly-linked list exists so a frame can unlink
/// itself on return in O(1) from either direction; a `Vec`-backed
/// `CallStack` gives the same property without needing back-links at
/// all).
pub struct StackFrame {
    pub function_name: Option<String>,
    pub this_value: Value,
    pub with_scope: Option<Rc<WithScope>>,
    /// Present while a frame is mid-call as a constructor (`new
    /// Target`); read by `new.target` inside the callee.
    pub new_target: Option<Value>,
}

impl StackFrame {
    pub fn new(function_name: Option<String>, this_value: Value) -> Self {
        Self {
            function_name,
            this_value,
            with_scope: None,
            new_target: None,
        }
    }
}

/// A single active `try` block: where to unwind to, and what the
/// `catch` binding should see.
pub struct TryHandler {
    /// Frame depth to truncate the call stack to when this handler
    /// fires.
    pub stack_depth: usize,
}

pub struct CallStack {
    frames: Vec<StackFrame>,
    handlers: Vec<TryHandler>,
    max_depth: usize,
}

impl CallStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            handlers: Vec::new(),
            max_depth,
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push_frame(&mut self, frame: StackFrame) -> RtResult<()> {
        if self.frames.len() >= self.max_depth {
            #[cfg(feature = "diagnostics")]
            tracing::warn!(target: "rt_core::call_stack", depth = self.frames.len(), max = self.max_depth, "stack overflow");
            return Err(crate::error::ErrorKind::RangeErrorStackOverflow.into());
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop_frame(&mut self) -> Option<StackFrame> {
        self.frames.pop()
    }

    pub fn current_frame(&self) -> Option<&StackFrame> {
        self.frames.last()
    }

    pub fn current_frame_mut(&mut self) -> Option<&mut StackFrame> {
        self.frames.last_mut()
    }

    /// Resolve an unqualified identifier by consulting the current
    /// frame's `with`-scope chain first, innermost object first. A
    /// scope object's `@@unscopables` data object (ES2023 §19.1.2.19)
    /// can name specific keys that opt out of this resolution even
    /// though the object itself has them.
    pub fn resolve_with_scope(&self, key: &crate::object::PropertyKey) -> Option<Value> {
        let mut scope = self.current_frame()?.with_scope.as_deref();
        while let Some(s) = scope {
            if let Some(obj) = s.object.as_object() {
                if obj.has_prop(key) && !is_unscoped(&obj, key) {
                    if let crate::object::PropertyLookup::Value(v) = obj.get_prop(key) {
                        return Some(v);
                    }
                }
            }
            scope = s.parent.as_deref();
        }
        None
    }

    pub fn enter_try(&mut self) {
        self.handlers.push(TryHandler {
            stack_depth: self.frames.len(),
        });
    }

    pub fn leave_try(&mut self) {
        self.handlers.pop();
    }

    /// Called by the catch path: truncate the call stack back to the
    /// depth recorded when the nearest `try` was entered, and pop that
    /// handler.
    pub fn unwind_to_nearest_handler(&mut self) -> RtResult<()> {
        let Some(handler) = self.handlers.pop() else {
            return Err(RtError::Fatal("throw with no enclosing try handler".into()));
        };
        #[cfg(feature = "diagnostics")]
        tracing::debug!(
            target: "rt_core::call_stack",
            from_depth = self.frames.len(),
            to_depth = handler.stack_depth,
            "unwinding to nearest try handler"
        );
        self.frames.truncate(handler.stack_depth);
        Ok(())
    }

    pub fn has_handler(&self) -> bool {
        !self.handlers.is_empty()
    }

    /// Collect every GC-reachable value currently anchored by the call
    /// stack: each frame's `this`, `new.target`, and `with`-scope
    /// chain. Fed into [`rt_gc::RootScanner`] by `Environment`.
    pub fn scan_roots(&self, out: &mut Vec<ErasedGcRef>) {
        for frame in &self.frames {
            push_value_root(&frame.this_value, out);
            if let Some(nt) = &frame.new_target {
                push_value_root(nt, out);
            }
            let mut scope = frame.with_scope.as_deref();
            while let Some(s) = scope {
                push_value_root(&s.object, out);
                scope = s.parent.as_deref();
            }
        }
    }
}

/// Whether `key` is opted out of `with`-scope resolution via `obj`'s
/// `@@unscopables` object: a plain data object whose own property of
/// the same name, coerced to boolean, says yes or no.
fn is_unscoped(obj: &rt_gc::GcRef<crate::object::JsObject>, key: &crate::object::PropertyKey) -> bool {
    let unscopables_key = crate::object::PropertyKey::from_symbol(&crate::string::well_known_symbols::UNSCOPABLES);
    let crate::object::PropertyLookup::Value(unscopables) = obj.get_prop(&unscopables_key) else {
        return false;
    };
    let Some(unscopables) = unscopables.as_object() else {
        return false;
    };
    match unscopables.get_prop(key) {
        crate::object::PropertyLookup::Value(v) => v.to_boolean(),
        _ => false,
    }
}

fn push_value_root(value: &Value, out: &mut Vec<ErasedGcRef>) {
    value.trace(&mut |header: *const GcHeader| {
        // SAFETY: `header` came from a live Value still reachable from
        // the call stack, which is itself a root source.
        out.push(unsafe { ErasedGcRef::from_raw(header) });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rt_gc::GcTraceable;

    #[test]
    fn try_unwind_truncates_to_recorded_depth() {
        let mut stack = CallStack::new(64);
        stack.push_frame(StackFrame::new(None, Value::undefined())).unwrap();
        stack.enter_try();
        stack.push_frame(StackFrame::new(None, Value::undefined())).unwrap();
        stack.push_frame(StackFrame::new(None, Value::undefined())).unwrap();
        assert_eq!(stack.depth(), 3);
        stack.unwind_to_nearest_handler().unwrap();
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn unwind_without_handler_is_fatal() {
        let mut stack = CallStack::new(64);
        assert!(stack.unwind_to_nearest_handler().is_err());
    }

    #[test]
    fn stack_overflow_is_reported_as_range_error() {
        let mut stack = CallStack::new(2);
        stack.push_frame(StackFrame::new(None, Value::undefined())).unwrap();
        stack.push_frame(StackFrame::new(None, Value::undefined())).unwrap();
        assert!(stack.push_frame(StackFrame::new(None, Value::undefined())).is_err());
    }

    #[test]
    fn with_scope_resolution_checks_innermost_first() {
        let mut stack = CallStack::new(64);
        stack.push_frame(StackFrame::new(None, Value::undefined())).unwrap();
        let outer = crate::object::JsObject::ordinary(Value::null());
        outer
            .set_prop(crate::object::PropertyKey::from_str("x"), Value::int32(1), crate::error::Strictness::Sloppy)
            .unwrap();
        let outer = rt_gc::GcRef::new(outer);
        stack.current_frame_mut().unwrap().with_scope = Some(WithScope::push(Value::object(outer), None));
        assert_eq!(stack.resolve_with_scope(&crate::object::PropertyKey::from_str("x")), Some(Value::int32(1)));
        assert_eq!(stack.resolve_with_scope(&crate::object::PropertyKey::from_str("y")), None);
    }
}
