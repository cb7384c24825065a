//! `Proxy` object data.
//!
//! Per the open design question on trap completion: this crate owns
//! proxy *storage* (target/handler pair, revocation) and the trap
//! vocabulary, but not trap *dispatch* — invoking a handler trap means
//! calling back into user code, which belongs to the interpreter layer
//! this crate doesn't include. `get_prop`/`set_prop` in
//! [`crate::object`] check `ObjectKind::Proxy` and return a
//! `NeedsTrap` outcome the same way an accessor property does for
//! `get`/`set`; the caller (the excluded VM layer) is responsible for
//! invoking the trap and, for traps with invariant checks (`getOwnPropertyDescriptor`,
//! `defineProperty`, `deleteProperty`...), validating the result
//! against the target's own descriptor.

use crate::value::Value;
use rt_gc::{GcHeader, GcTraceable};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trap {
    Get,
    Set,
    Has,
    DeleteProperty,
    OwnKeys,
    GetOwnPropertyDescriptor,
    DefineProperty,
    GetPrototypeOf,
    SetPrototypeOf,
    IsExtensible,
    PreventExtensions,
    Apply,
    Construct,
}

impl Trap {
    pub fn handler_property_name(self) -> &'static str {
        match self {
            Trap::Get => "get",
            Trap::Set => "set",
            Trap::Has => "has",
            Trap::DeleteProperty => "deleteProperty",
            Trap::OwnKeys => "ownKeys",
            Trap::GetOwnPropertyDescriptor => "getOwnPropertyDescriptor",
            Trap::DefineProperty => "defineProperty",
            Trap::GetPrototypeOf => "getPrototypeOf",
            Trap::SetPrototypeOf => "setPrototypeOf",
            Trap::IsExtensible => "isExtensible",
            Trap::PreventExtensions => "preventExtensions",
            Trap::Apply => "apply",
            Trap::Construct => "construct",
        }
    }
}

#[derive(Debug)]
pub struct ProxyData {
    pub target: Value,
    pub handler: Value,
    revoked: AtomicBool,
}

impl ProxyData {
    pub fn new(target: Value, handler: Value) -> Self {
        Self {
            target,
            handler,
            revoked: AtomicBool::new(false),
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::Acquire)
    }

    pub fn revoke(&self) {
        self.revoked.store(true, Ordering::Release);
    }
}

impl GcTraceable for ProxyData {
    fn trace(&self, tracer: &mut dyn FnMut(*const GcHeader)) {
        self.target.trace(tracer);
        self.handler.trace(tracer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revocation_is_observable() {
        let p = ProxyData::new(Value::undefined(), Value::undefined());
        assert!(!p.is_revoked());
        p.revoke();
        assert!(p.is_revoked());
    }

    #[test]
    fn trap_names_match_handler_property_protocol() {
        assert_eq!(Trap::Get.handler_property_name(), "get");
        assert_eq!(Trap::DefineProperty.handler_property_name(), "defineProperty");
    }
}
