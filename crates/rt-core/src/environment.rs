//! The process-wide `Environment`: the global object, the empty root
//! shape, intrinsic prototypes, the collector, and the call stack —
//! everything a single embedding of this runtime needs exactly one of.
//!
//! Grounded on `original_source/runtime/init.c`'s `js_init`/`js_init3`
//! sequence: the original brings subsystems up in a fixed order
//! (strings, shapes, objects, descriptors, functions, the call stack,
//! then numbers/bigints/arrays) because later stages allocate objects
//! that need earlier stages' prototypes to already exist.
//! [`Environment::new`] follows the same order; `init3`'s job — fixing
//! up well-known symbols and unlocking non-strict function
//! declarations once the bootstrap is complete — has no standalone
//! counterpart here since this crate doesn't parse or run function
//! declarations, so it collapses into the tail of `new`.

use crate::call_stack::CallStack;
use crate::coroutine::Coroutine;
use crate::error::RtResult;
use crate::memory::MemoryManager;
use crate::object::JsObject;
use crate::value::Value;
use parking_lot::Mutex;
use rt_gc::{Collector, ErasedGcRef, GcConfig, RootScanner};

/// Tunables for one `Environment`. Defaults mirror the collector's own
/// defaults; call-stack depth follows the original's conservative
/// default recursion budget; `memory_limit_bytes` follows
/// [`MemoryManager::unbounded`] unless the embedder sets a ceiling.
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub gc: GcConfig,
    pub max_call_depth: usize,
    pub memory_limit_bytes: Option<usize>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            gc: GcConfig::default(),
            max_call_depth: 4096,
            memory_limit_bytes: None,
        }
    }
}

/// Intrinsic prototype objects created during bootstrap. Only the
/// handful this crate's own modules need are named; a full standard
/// library would add many more without changing this type's role.
pub struct Intrinsics {
    pub object_prototype: Value,
    pub array_prototype: Value,
    pub function_prototype: Value,
}

pub struct Environment {
    pub collector: Collector,
    pub intrinsics: Intrinsics,
    pub global: Value,
    pub memory: MemoryManager,
    call_stack: Mutex<CallStack>,
    coroutines: Mutex<Vec<Coroutine>>,
}

impl Environment {
    pub fn new(config: EnvironmentConfig) -> Self {
        let collector = Collector::new(config.gc);
        let memory = match config.memory_limit_bytes {
            Some(limit) => MemoryManager::new(limit),
            None => MemoryManager::unbounded(),
        };

        // js_obj_init: Object.prototype has no prototype of its own.
        let object_prototype = Value::object(collector.alloc(JsObject::ordinary(Value::null())));
        // js_func_init: Function.prototype inherits from Object.prototype.
        let function_prototype = Value::object(collector.alloc(JsObject::ordinary(object_prototype.clone())));
        // js_arr_init: Array.prototype inherits from Object.prototype.
        let array_prototype = Value::object(collector.alloc(JsObject::ordinary(object_prototype.clone())));

        let global = Value::object(collector.alloc(JsObject::ordinary(object_prototype.clone())));

        Self {
            collector,
            intrinsics: Intrinsics {
                object_prototype,
                array_prototype,
                function_prototype,
            },
            global,
            memory,
            call_stack: Mutex::new(CallStack::new(config.max_call_depth)),
            coroutines: Mutex::new(Vec::new()),
        }
    }

    pub fn call_stack(&self) -> &Mutex<CallStack> {
        &self.call_stack
    }

    pub fn spawn_coroutine<F>(&self, body: F) -> usize
    where
        F: FnOnce(&crate::coroutine::CoroutineHandle, Value) -> RtResult<Value> + Send + 'static,
    {
        let mut coroutines = self.coroutines.lock();
        coroutines.push(Coroutine::spawn(body));
        coroutines.len() - 1
    }

    pub fn with_coroutine<R>(&self, id: usize, f: impl FnOnce(&mut Coroutine) -> R) -> Option<R> {
        let mut coroutines = self.coroutines.lock();
        coroutines.get_mut(id).map(f)
    }

    /// Run a garbage collection cycle rooted at everything this
    /// environment can currently reach, then let the byte-budget layer
    /// know how much survived so its adaptive threshold can track it.
    pub fn collect(&self) {
        self.collector.collect_and_wait(self);
        self.memory.on_gc_complete(self.memory.allocated());
    }

    /// Whether either the collector's own allocation-count threshold or
    /// this environment's byte budget thinks a collection is due.
    pub fn should_collect(&self) -> bool {
        self.collector.should_collect() || self.memory.should_collect()
    }

    pub fn intern(&self, s: &str) -> crate::string::JsString {
        crate::string::JsString::intern(s)
    }
}

impl RootScanner for Environment {
    fn scan_roots(&self, out: &mut Vec<ErasedGcRef>) {
        use rt_gc::GcTraceable;
        self.global.trace(&mut |h| out.push(unsafe { ErasedGcRef::from_raw(h) }));
        self.intrinsics.object_prototype.trace(&mut |h| out.push(unsafe { ErasedGcRef::from_raw(h) }));
        self.intrinsics.array_prototype.trace(&mut |h| out.push(unsafe { ErasedGcRef::from_raw(h) }));
        self.intrinsics.function_prototype.trace(&mut |h| out.push(unsafe { ErasedGcRef::from_raw(h) }));
        self.call_stack.lock().scan_roots(out);
        for co in self.coroutines.lock().iter() {
            co.scan_roots(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_wires_prototype_chain() {
        let env = Environment::new(EnvironmentConfig::default());
        let array_proto = env.intrinsics.array_prototype.as_object().unwrap();
        assert_eq!(array_proto.prototype(), env.intrinsics.object_prototype);
    }

    #[test]
    fn collect_does_not_reclaim_rooted_global() {
        let env = Environment::new(EnvironmentConfig::default());
        let before = env.collector.stats().live_objects;
        assert!(before > 0);
        env.collect();
        let after = env.collector.stats().live_objects;
        assert_eq!(before, after);
    }
}
