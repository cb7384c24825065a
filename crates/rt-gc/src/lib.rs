//! Concurrent mark-sweep collector: a dedicated worker thread, per-object
//! mark/notify bits updated lock-free, and a single mutex+condvar pair
//! guarding the handful of cross-thread queues (`all_values`,
//! `ref_values`, their sweep-time shadows, and the deferred-free list).
//!
//! This crate knows nothing about JavaScript values; [`object::GcRef`]
//! is generic over anything implementing [`object::GcTraceable`]. The
//! value model, shapes, and call stack that make up the actual root set
//! live in `rt-core` and reach into the collector only through
//! [`roots::RootScanner`].

pub mod collector;
pub mod header;
pub mod heap;
pub mod object;
pub mod roots;
mod worker;

pub use collector::{Collector, GcStats};
pub use header::{GcHeader, GcTag, GcVTable};
pub use heap::{GcConfig, GcHeap};
pub use object::{ErasedGcRef, GcRef, GcTraceable};
pub use roots::{NoRoots, RootScanner};
