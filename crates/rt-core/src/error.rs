//! The error kind taxonomy and propagation discipline.
//!
//! Core operations never longjmp; every entry point returns
//! `RtResult<T>` and propagates with `?`, per the Design Notes option
//! (a) — a native result-returning discipline. `ErrorKind` mirrors the
//! representative kind list: each variant names the shadow-object
//! helper that would construct and throw the corresponding user-level
//! error object in a full compiler integration.

use crate::value::Value;
use thiserror::Error;

/// Whether the caller is executing strict-mode code. Several checks
/// (non-extensible receiver, read-only property, uninitialized
/// `with`-unscoped lookup) throw only in strict mode and silently
/// no-op otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    Strict,
    Sloppy,
}

impl Strictness {
    pub fn is_strict(self) -> bool {
        matches!(self, Strictness::Strict)
    }
}

#[derive(Debug, Clone, Error)]
pub enum ErrorKind {
    #[error("function is not callable")]
    TypeErrorExpectedFunction,
    #[error("value is not an object")]
    TypeErrorExpectedObject,
    #[error("value is not a constructor")]
    TypeErrorExpectedConstructor,
    #[error("value is not a number")]
    TypeErrorExpectedNumber,
    #[error("value is not a bigint")]
    TypeErrorExpectedBigint,
    #[error("cannot convert null or undefined to object")]
    TypeErrorConvertNullToObject,
    #[error("cannot convert a Symbol value to a string")]
    TypeErrorConvertSymbolToString,
    #[error("cannot convert object to primitive value")]
    TypeErrorConvertObjectToPrimitive,
    #[error("cannot assign to read only property '{0}'")]
    TypeErrorReadOnlyProperty(String),
    #[error("cannot create property on primitive value")]
    TypeErrorPrimitiveProperty,
    #[error("object is not extensible")]
    TypeErrorObjectNotExtensible,
    #[error("prototype may only be an Object or null")]
    TypeErrorInvalidPrototype,
    #[error("cyclic __proto__ value")]
    TypeErrorCyclicPrototype,
    #[error("cannot set property of null object")]
    TypeErrorSetPropertyOfNullObject,
    #[error("incompatible receiver")]
    TypeErrorIncompatibleObject,
    #[error("coroutine already resumed")]
    TypeErrorCoroutineAlreadyResumed,
    #[error("iterator result is not an object")]
    TypeErrorIteratorResult,
    #[error("value is not iterable")]
    TypeErrorNotIterable,
    #[error("iterator does not support '{0}'")]
    TypeErrorIteratorCannotCall(&'static str),
    #[error("unsupported operation")]
    TypeErrorUnsupportedOperation,
    #[error("invalid property descriptor")]
    TypeErrorDefinePropertyDescriptor,
    #[error("cannot redefine property '{0}'")]
    TypeErrorDefineProperty3(String),
    #[error("getter/setter must be callable or undefined")]
    TypeErrorDefineProperty4,
    #[error("cannot both specify accessors and a value or writable attribute")]
    TypeErrorDefineProperty5,

    #[error("{0} is not defined")]
    ReferenceErrorNotDefined(String),
    #[error("cannot access '{0}' before initialization")]
    ReferenceErrorUninitializedVariable(String),

    #[error("invalid array length")]
    RangeErrorArrayLength,
    #[error("bigint is too large")]
    RangeErrorBigintTooLarge,
    #[error("division by zero")]
    RangeErrorDivisionByZero,
    #[error("invalid argument")]
    RangeErrorInvalidArgument,
    #[error("too many properties on shape")]
    RangeErrorPropertyCount,
    #[error("maximum call stack size exceeded")]
    RangeErrorStackOverflow,

    #[error("invalid argument")]
    SyntaxErrorInvalidArgument,
}

/// The propagation type for every core entry point.
#[derive(Debug, Error)]
pub enum RtError {
    #[error("{0}")]
    Kind(#[from] ErrorKind),

    /// A value thrown by user code (via `throw`) that has unwound past
    /// the Rust call site. Carries the thrown [`Value`] itself, plus a
    /// best-effort string rendering for `Display`/logging.
    #[error("uncaught exception: {message}")]
    Exception { value: Value, message: String },

    /// Allocation failure from a platform primitive. Per §7 "Fatal
    /// failures", this represents corrupted runtime state; callers at
    /// the process boundary should log and abort rather than attempt
    /// recovery.
    #[error("fatal allocation failure: {0}")]
    Fatal(String),

    /// A forced early `return` (§4.7 command `'R'`) unwinding through a
    /// `yield` point, carrying the return value. Compiled `try/finally`
    /// dispatch must run pending `finally` blocks while this
    /// propagates, the same as it would for any other unwind, but must
    /// never treat it as catchable by a `catch` clause — it is
    /// ordinary generator control flow, not a thrown exception, and
    /// callers that don't specifically intercept it should let it
    /// propagate to the coroutine boundary.
    #[error("forced return")]
    Return(Value),
}

pub type RtResult<T> = Result<T, RtError>;

impl RtError {
    pub fn exception(value: Value, message: impl Into<String>) -> Self {
        RtError::Exception {
            value,
            message: message.into(),
        }
    }

    /// The thrown value, if this is a user-level exception rather than
    /// an internal kind/fatal error.
    pub fn thrown_value(&self) -> Option<&Value> {
        match self {
            RtError::Exception { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Raise `kind` unless `strictness` is sloppy, in which case return
/// `Ok(())` (the silent-no-op path §7 calls out for non-extensible and
/// read-only checks).
pub fn strict_check(strictness: Strictness, kind: ErrorKind) -> RtResult<()> {
    if strictness.is_strict() {
        Err(RtError::Kind(kind))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sloppy_mode_check_is_silent() {
        assert!(strict_check(Strictness::Sloppy, ErrorKind::TypeErrorObjectNotExtensible).is_ok());
    }

    #[test]
    fn strict_mode_check_raises() {
        let err = strict_check(Strictness::Strict, ErrorKind::TypeErrorObjectNotExtensible);
        assert!(matches!(err, Err(RtError::Kind(ErrorKind::TypeErrorObjectNotExtensible))));
    }
}
