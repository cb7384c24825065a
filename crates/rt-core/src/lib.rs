//! # rt-core
//!
//! The runtime core of a JavaScript-to-native compiler: the tagged
//! value representation, the hidden-shape object model and property
//! access protocol, bigint arithmetic, the call stack and `with`-scope
//! chain, coroutines, and the iterator protocol. Garbage collection
//! itself lives in [`rt_gc`]; this crate is one of that collector's
//! mutators — every GC-managed type here implements
//! [`rt_gc::GcTraceable`], and [`environment::Environment`] implements
//! [`rt_gc::RootScanner`] to hand the collector its roots.
//!
//! Compilation, parsing, and bytecode dispatch are out of scope (see
//! `spec.md` §1): every callable value in this crate is backed by a
//! native Rust function pointer ([`closure::NativeFn`]), not bytecode.
//!
//! The `diagnostics` feature turns on `tracing` events for GC sweeps
//! (forwarded to `rt-gc`'s own `gc_logging` feature), stack-overflow
//! and unwind events on the call stack, and coroutine suspend/resume
//! transitions. Off by default, same as `rt-gc`'s logging.

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod bigint;
pub mod call_stack;
pub mod closure;
pub mod convert;
pub mod coroutine;
pub mod drop_guard;
pub mod environment;
pub mod error;
pub mod format;
pub mod iterator;
pub mod map_data;
pub mod memory;
pub mod object;
pub mod proxy;
pub mod shape;
pub mod string;
pub mod value;

pub use bigint::JsBigInt;
pub use closure::{Closure, NativeFn, UpvalueCell, WithScope};
pub use convert::{to_number, to_primitive, to_string, PrimitiveHint};
pub use environment::{Environment, EnvironmentConfig, Intrinsics};
pub use error::{ErrorKind, RtError, RtResult, Strictness};
pub use memory::MemoryManager;
pub use object::{JsObject, ObjectKind, PropertyKey, PropertyLookup};
pub use proxy::{ProxyData, Trap};
pub use shape::Shape;
pub use string::{JsString, JsSymbol};
pub use value::Value;
