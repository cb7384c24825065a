//! String and symbol identifiers, and the interning set behind them.
//!
//! Per the ownership discipline, every `JsString` falls into one of
//! three tiers:
//!
//! - `Static` — compiled into the binary (property names like
//!   `"length"`, well-known symbol descriptions); never allocated,
//!   never freed.
//! - `Interned` — deduplicated through the global [`Interner`], kept
//!   alive for the life of the process the way `objset.c`'s set keeps
//!   every member alive (the original never evicts an interned
//!   string). Backed by `Arc<str>` rather than a GC handle: nothing in
//!   the interning set ever references back into the GC heap, so there
//!   is no cycle for the collector to need to break.
//! - `Heap` — a plain run-of-the-mill string produced by concatenation
//!   or slicing, GC-managed like any other non-interned allocation.

use rt_gc::{GcHeader, GcRef, GcTraceable};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Backing payload for a `Heap`-tier string.
#[derive(Debug)]
pub struct HeapStringData(pub Box<str>);

impl GcTraceable for HeapStringData {
    const NEEDS_TRACE: bool = false;
    fn trace(&self, _tracer: &mut dyn FnMut(*const GcHeader)) {}
}

#[derive(Clone)]
pub enum JsString {
    Static(&'static str),
    Interned(Arc<str>),
    Heap(GcRef<HeapStringData>),
}

impl JsString {
    pub fn as_str(&self) -> &str {
        match self {
            JsString::Static(s) => s,
            JsString::Interned(s) => s,
            JsString::Heap(h) => &h.0,
        }
    }

    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    /// Get-or-insert into the process-wide interning set. Mirrors
    /// `objset.c`'s single entry point: callers never construct an
    /// `Interned` variant directly.
    pub fn intern(s: &str) -> Self {
        GLOBAL_INTERNER.intern(s)
    }

    /// A non-interned, GC-managed string, e.g. the result of
    /// concatenation. `collector` registers the allocation; callers
    /// without a live collector handle (tests) may use
    /// [`JsString::heap_untracked`] instead.
    pub fn heap(collector: &rt_gc::Collector, s: impl Into<Box<str>>) -> Self {
        JsString::Heap(collector.alloc(HeapStringData(s.into())))
    }

    /// Allocate a `Heap`-tier string outside of any collector's
    /// bookkeeping. Used by conversions (`to_string`) that don't carry
    /// a collector handle through every call; the same escape hatch
    /// the object-model tests already rely on via `GcRef::new`.
    pub fn heap_untracked(s: impl Into<Box<str>>) -> Self {
        JsString::Heap(GcRef::new(HeapStringData(s.into())))
    }

    pub fn concat(&self, other: &JsString) -> String {
        let mut out = String::with_capacity(self.len() + other.len());
        out.push_str(self.as_str());
        out.push_str(other.as_str());
        out
    }

    /// UTF-16 code unit count, the length JS code observes via
    /// `.length`. Characters outside the BMP count as a surrogate pair
    /// (two units), matching `substring`/`charAt` semantics.
    pub fn utf16_len(&self) -> usize {
        self.as_str().encode_utf16().count()
    }

    pub fn char_at_utf16(&self, index: usize) -> Option<u16> {
        self.as_str().encode_utf16().nth(index)
    }

    pub fn substring_utf16(&self, start: usize, end: usize) -> String {
        let units: Vec<u16> = self.as_str().encode_utf16().collect();
        let end = end.min(units.len());
        let start = start.min(end);
        String::from_utf16_lossy(&units[start..end])
    }
}

impl PartialEq for JsString {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsString::Interned(a), JsString::Interned(b)) => Arc::ptr_eq(a, b) || a == b,
            (JsString::Static(a), JsString::Static(b)) => a == b,
            _ => self.as_str() == other.as_str(),
        }
    }
}
impl Eq for JsString {}

impl Hash for JsString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl std::fmt::Debug for JsString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

fn compute_hash(s: &str) -> u64 {
    let mut hasher = FxHasher::default();
    s.hash(&mut hasher);
    hasher.finish()
}

/// Lock-striped concurrent interning set, the idiomatic Rust
/// equivalent of `objset.c`'s open-addressing hash set keyed by
/// content hash: `dashmap::DashSet` already *is* an atomic
/// get-or-insert content-hashed set, which is exactly `objset`'s job.
pub struct Interner {
    table: dashmap::DashMap<u64, Vec<Arc<str>>>,
    count: AtomicU64,
}

impl Interner {
    pub fn new() -> Self {
        Self {
            table: dashmap::DashMap::new(),
            count: AtomicU64::new(0),
        }
    }

    pub fn intern(&self, s: &str) -> JsString {
        let hash = compute_hash(s);
        if let Some(bucket) = self.table.get(&hash) {
            if let Some(existing) = bucket.iter().find(|candidate| candidate.as_ref() == s) {
                return JsString::Interned(Arc::clone(existing));
            }
        }
        let mut bucket = self.table.entry(hash).or_default();
        if let Some(existing) = bucket.iter().find(|candidate| candidate.as_ref() == s) {
            return JsString::Interned(Arc::clone(existing));
        }
        let arc: Arc<str> = Arc::from(s);
        bucket.push(Arc::clone(&arc));
        self.count.fetch_add(1, Ordering::Relaxed);
        JsString::Interned(arc)
    }

    pub fn len(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_INTERNER: std::sync::LazyLock<Interner> = std::sync::LazyLock::new(Interner::new);

/// A symbol: a unique, optionally-described identifier. Symbols are
/// never interned by content — every `Symbol()` call produces a fresh
/// identity — so they are reference-counted rather than hashed into
/// the string set, and compare by pointer identity.
#[derive(Debug)]
pub struct SymbolData {
    pub description: Option<JsString>,
    pub id: u64,
}

#[derive(Clone, Debug)]
pub struct JsSymbol(pub Arc<SymbolData>);

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

impl JsSymbol {
    pub fn new(description: Option<&str>) -> Self {
        JsSymbol(Arc::new(SymbolData {
            description: description.map(JsString::intern),
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
        }))
    }

    pub fn description(&self) -> Option<&str> {
        self.0.description.as_ref().map(JsString::as_str)
    }
}

impl PartialEq for JsSymbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for JsSymbol {}

impl Hash for JsSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

/// Property-name constants used throughout the object model, interned
/// once at first use (`LazyLock` gives the same "compute once, then
/// compiled-in-looking" effect the original's static `JSSTR_*` table
/// has, without a separate init pass).
pub mod well_known {
    use super::JsString;
    use std::sync::LazyLock;

    macro_rules! well_known_strings {
        ($($name:ident => $text:expr),* $(,)?) => {
            $(pub static $name: LazyLock<JsString> = LazyLock::new(|| JsString::intern($text));)*
        };
    }

    well_known_strings! {
        LENGTH => "length",
        PROTOTYPE => "prototype",
        CONSTRUCTOR => "constructor",
        NAME => "name",
        VALUE => "value",
        WRITABLE => "writable",
        ENUMERABLE => "enumerable",
        CONFIGURABLE => "configurable",
        GET => "get",
        SET => "set",
        TO_STRING => "toString",
        VALUE_OF => "valueOf",
        CALL => "call",
        APPLY => "apply",
        BIND => "bind",
    }
}

/// Well-known symbols: unlike ordinary symbols, these must compare
/// equal across every call site that asks for "the" `@@unscopables`
/// symbol rather than minting a fresh identity each time, so each is a
/// single process-wide [`JsSymbol`] computed once via `LazyLock`, the
/// same pattern [`well_known`] uses for string constants.
pub mod well_known_symbols {
    use super::JsSymbol;
    use std::sync::LazyLock;

    /// `Symbol.unscopables` (ES2023 §19.1.2.19 / `with`-statement
    /// object environment): a with-scoped object may hold a
    /// `@@unscopables` data object naming, per key, whether that key
    /// should be skipped during `with`-scope resolution.
    pub static UNSCOPABLES: LazyLock<JsSymbol> = LazyLock::new(|| JsSymbol::new(Some("Symbol.unscopables")));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates_equal_content() {
        let a = JsString::intern("hello");
        let b = JsString::intern("hello");
        assert_eq!(a, b);
        if let (JsString::Interned(a), JsString::Interned(b)) = (&a, &b) {
            assert!(Arc::ptr_eq(a, b));
        } else {
            panic!("expected interned variant");
        }
    }

    #[test]
    fn distinct_content_is_distinct() {
        assert_ne!(JsString::intern("a"), JsString::intern("b"));
    }

    #[test]
    fn concat_joins_content() {
        let a = JsString::intern("foo");
        let b = JsString::intern("bar");
        assert_eq!(a.concat(&b), "foobar");
    }

    #[test]
    fn utf16_length_counts_surrogate_pairs() {
        let s = JsString::intern("a\u{1F600}b");
        assert_eq!(s.utf16_len(), 4);
    }

    #[test]
    fn substring_respects_utf16_units() {
        let s = JsString::intern("hello world");
        assert_eq!(s.substring_utf16(0, 5), "hello");
        assert_eq!(s.substring_utf16(6, 11), "world");
    }

    #[test]
    fn symbols_are_unique_even_with_same_description() {
        let a = JsSymbol::new(Some("x"));
        let b = JsSymbol::new(Some("x"));
        assert_ne!(a, b);
        assert_eq!(a.description(), Some("x"));
    }

    #[test]
    fn well_known_strings_are_stable() {
        assert_eq!(well_known::LENGTH.as_str(), "length");
    }
}
