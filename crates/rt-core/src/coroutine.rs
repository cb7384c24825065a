//! Coroutines.
//!
//! The original runs each coroutine on its own native stack (a real
//! fiber) and resumes it with a small command protocol threaded
//! through the scheduler: hand it a value and resume, hand it a
//! thrown value and resume-as-throw, ask it to return early, or tear
//! it down. Rust has no portable stackful-coroutine primitive in the
//! standard library, and the spec's Design Notes explicitly sanction
//! substituting a cooperative OS-thread-plus-channel pair for the
//! fiber — that's what this module does: each [`Coroutine`] owns a
//! dedicated thread parked on a channel recv between resumes, which
//! gives the same suspend/resume observable behavior without unsafe
//! stack-switching.
//!
//! Caveat this trade-off introduces: a real fiber's native stack is
//! conservatively scanned by the GC the same as the main mutator
//! stack, so every local live across a `yield` point is automatically
//! a root. A blocked OS thread's stack is not something this
//! collector scans. [`Coroutine`] compensates with an explicit
//! shadow-root list: the most recently exchanged value is always kept
//! (see [`Coroutine::scan_roots`]), and the compiled body pushes any
//! other GC-managed local it needs to survive a `yield` onto that list
//! via [`CoroutineHandle::root`], popping it with
//! [`CoroutineHandle::unroot`] once the local goes out of scope.

use crate::error::{ErrorKind, RtError, RtResult};
use crate::value::Value;
use rt_gc::ErasedGcRef;
use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// What the scheduler sends into a suspended coroutine to resume it.
pub enum Resume {
    /// Resume normally, as if the `yield` expression evaluated to this
    /// value.
    Next(Value),
    /// Resume by throwing this value out of the `yield` expression.
    Throw(Value),
    /// Force an early `return`, running any pending `finally` blocks.
    Return(Value),
}

/// What a suspended or finished coroutine reports back.
pub enum CoroutineEvent {
    Yielded(Value),
    Done(Value),
    Threw(RtError),
}

/// Handle passed into the coroutine body; `yield_value` is the only
/// suspend point.
pub struct CoroutineHandle {
    to_scheduler: SyncSender<CoroutineEvent>,
    from_scheduler: Receiver<Resume>,
    roots: Arc<Mutex<Vec<Value>>>,
}

impl CoroutineHandle {
    pub fn yield_value(&self, value: Value) -> RtResult<Value> {
        let _ = self.to_scheduler.send(CoroutineEvent::Yielded(value));
        match self.from_scheduler.recv() {
            Ok(Resume::Next(v)) => Ok(v),
            Ok(Resume::Throw(v)) => Err(RtError::exception(v, "uncaught in coroutine")),
            Ok(Resume::Return(v)) => Err(RtError::Return(v)),
            Err(_) => Err(RtError::Fatal("coroutine scheduler channel closed".into())),
        }
    }

    /// Keep `value` reachable for as long as it stays on this
    /// coroutine's shadow-root list. The compiled body pushes every
    /// GC-managed local still live across a `yield` point (the
    /// blocked OS thread's native stack, unlike a real fiber's, is
    /// never scanned by the collector — see the module doc comment)
    /// and [`CoroutineHandle::unroot`]s it once it goes out of scope.
    pub fn root(&self, value: Value) {
        self.roots.lock().unwrap().push(value);
    }

    /// Pop the most recently pushed root. Callers must unroot in
    /// strict LIFO order matching the local's scope exit, the same
    /// discipline a real stack unwind would enforce for free.
    pub fn unroot(&self) {
        self.roots.lock().unwrap().pop();
    }

    /// `yield*`: drive `inner` to completion, forwarding every value it
    /// yields out through this coroutine's own yield point, and
    /// forwarding whatever value resumes *this* coroutine back into
    /// `inner`.
    pub fn delegate(&self, inner: &mut Coroutine, mut sent: Value) -> RtResult<Value> {
        loop {
            match inner.resume(Resume::Next(sent)) {
                CoroutineEvent::Yielded(v) => {
                    sent = self.yield_value(v)?;
                }
                CoroutineEvent::Done(v) => return Ok(v),
                CoroutineEvent::Threw(e) => return Err(e),
            }
        }
    }
}

enum State {
    Suspended,
    Running,
    Done,
}

pub struct Coroutine {
    to_coroutine: SyncSender<Resume>,
    from_coroutine: Receiver<CoroutineEvent>,
    handle: Option<JoinHandle<()>>,
    state: State,
    last_value: Arc<Mutex<Value>>,
    roots: Arc<Mutex<Vec<Value>>>,
}

impl Coroutine {
    /// Spawn a coroutine body. `body` receives a [`CoroutineHandle`]
    /// for `yield`-ing and is otherwise a plain function; it runs on
    /// its own OS thread, parked between resumes.
    pub fn spawn<F>(body: F) -> Self
    where
        F: FnOnce(&CoroutineHandle, Value) -> RtResult<Value> + Send + 'static,
    {
        let (to_coroutine, from_scheduler) = std::sync::mpsc::sync_channel(0);
        let (to_scheduler, from_coroutine) = std::sync::mpsc::sync_channel(0);
        let last_value = Arc::new(Mutex::new(Value::undefined()));
        let roots = Arc::new(Mutex::new(Vec::new()));

        let to_scheduler_for_thread = to_scheduler.clone();
        let roots_for_thread = Arc::clone(&roots);
        let join = std::thread::Builder::new()
            .name("rt-coroutine".into())
            .spawn(move || {
                let first = match from_scheduler.recv() {
                    Ok(Resume::Next(v)) => v,
                    Ok(Resume::Throw(v)) | Ok(Resume::Return(v)) => v,
                    Err(_) => return,
                };
                let handle = CoroutineHandle {
                    to_scheduler: to_scheduler_for_thread.clone(),
                    from_scheduler,
                    roots: roots_for_thread,
                };
                let result = body(&handle, first);
                let event = match result {
                    Ok(v) => CoroutineEvent::Done(v),
                    // A forced return (`Resume::Return`) that reached the
                    // top of the body unintercepted is ordinary
                    // completion, not a thrown error — any `finally`
                    // blocks on the way up already ran as this unwound
                    // through the compiled try/finally dispatch.
                    Err(RtError::Return(v)) => CoroutineEvent::Done(v),
                    Err(e) => CoroutineEvent::Threw(e),
                };
                let _ = to_scheduler_for_thread.send(event);
            })
            .expect("failed to spawn coroutine thread");

        Self {
            to_coroutine,
            from_coroutine,
            handle: Some(join),
            state: State::Suspended,
            last_value,
            roots,
        }
    }

    /// Resume a suspended coroutine. Raises
    /// `TypeError_coroutine_already_resumed` if called while the
    /// coroutine is already running (re-entrant resume from within its
    /// own body) or after it has finished.
    pub fn resume(&mut self, input: Resume) -> CoroutineEvent {
        if !matches!(self.state, State::Suspended) {
            #[cfg(feature = "diagnostics")]
            tracing::warn!(target: "rt_core::coroutine", "resume on a non-suspended coroutine");
            return CoroutineEvent::Threw(ErrorKind::TypeErrorCoroutineAlreadyResumed.into());
        }
        self.state = State::Running;
        if self.to_coroutine.send(input).is_err() {
            self.state = State::Done;
            return CoroutineEvent::Threw(RtError::Fatal("coroutine thread gone".into()));
        }
        match self.from_coroutine.recv() {
            Ok(CoroutineEvent::Yielded(v)) => {
                *self.last_value.lock().unwrap() = v.clone();
                self.state = State::Suspended;
                #[cfg(feature = "diagnostics")]
                tracing::trace!(target: "rt_core::coroutine", "suspended at yield");
                CoroutineEvent::Yielded(v)
            }
            Ok(CoroutineEvent::Done(v)) => {
                *self.last_value.lock().unwrap() = v.clone();
                self.state = State::Done;
                #[cfg(feature = "diagnostics")]
                tracing::debug!(target: "rt_core::coroutine", "coroutine completed");
                CoroutineEvent::Done(v)
            }
            Ok(CoroutineEvent::Threw(e)) => {
                self.state = State::Done;
                #[cfg(feature = "diagnostics")]
                tracing::debug!(target: "rt_core::coroutine", error = %e, "coroutine threw");
                CoroutineEvent::Threw(e)
            }
            Err(_) => {
                self.state = State::Done;
                CoroutineEvent::Threw(RtError::Fatal("coroutine thread gone".into()))
            }
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    pub fn scan_roots(&self, out: &mut Vec<ErasedGcRef>) {
        let value = self.last_value.lock().unwrap().clone();
        value.trace(&mut |header| {
            // SAFETY: `last_value` is kept alive by this coroutine for
            // as long as it is suspended, and `scan_roots` is only
            // invoked while the owning Environment is alive.
            out.push(unsafe { ErasedGcRef::from_raw(header) });
        });
        // Every local the body explicitly rooted before yielding (see
        // `CoroutineHandle::root`) — the substitute for a real fiber's
        // conservatively-scanned native stack.
        for root in self.roots.lock().unwrap().iter() {
            root.trace(&mut |header| {
                out.push(unsafe { ErasedGcRef::from_raw(header) });
            });
        }
    }
}

impl Drop for Coroutine {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            // Unblock the parked thread so it can exit; it may already
            // be gone if it finished normally, in which case the send
            // harmlessly fails. If it was suspended, it now runs to
            // completion and sends its final event on a rendezvous
            // channel — drain it so that send doesn't block forever
            // and deadlock this join.
            let _ = self.to_coroutine.send(Resume::Return(Value::undefined()));
            let _ = self.from_coroutine.recv();
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rt_gc::GcTraceable;

    #[test]
    fn yields_then_completes() {
        let mut co = Coroutine::spawn(|handle, first| {
            let second = handle.yield_value(Value::int32(first.as_number().unwrap() as i32 + 1))?;
            Ok(Value::int32(second.as_number().unwrap() as i32 * 2))
        });
        match co.resume(Resume::Next(Value::int32(1))) {
            CoroutineEvent::Yielded(v) => assert_eq!(v, Value::int32(2)),
            _ => panic!("expected yield"),
        }
        match co.resume(Resume::Next(Value::int32(10))) {
            CoroutineEvent::Done(v) => assert_eq!(v, Value::int32(20)),
            _ => panic!("expected done"),
        }
        assert!(co.is_done());
    }

    #[test]
    fn resuming_a_finished_coroutine_raises_already_resumed() {
        let mut co = Coroutine::spawn(|_h, v| Ok(v));
        let _ = co.resume(Resume::Next(Value::int32(1)));
        assert!(co.is_done());
        match co.resume(Resume::Next(Value::int32(2))) {
            CoroutineEvent::Threw(RtError::Kind(ErrorKind::TypeErrorCoroutineAlreadyResumed)) => {}
            _ => panic!("expected already-resumed error"),
        }
    }

    #[test]
    fn throw_propagates_into_the_body() {
        let mut co = Coroutine::spawn(|handle, first| {
            match handle.yield_value(first) {
                Ok(v) => Ok(v),
                Err(_) => Ok(Value::int32(-1)),
            }
        });
        let _ = co.resume(Resume::Next(Value::int32(1)));
        match co.resume(Resume::Throw(Value::int32(99))) {
            CoroutineEvent::Done(v) => assert_eq!(v, Value::int32(-1)),
            _ => panic!("expected the body to catch the thrown value and return"),
        }
    }
}
