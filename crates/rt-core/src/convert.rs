//! The primitive-conversion trio: `to_primitive`, `to_number`, and
//! `to_string` (§4.1). These replace the original's interpreter-level
//! `OP_TO_NUMBER`/`OP_TO_STRING` opcodes, which call back into
//! `valueOf`/`toString`/`@@toPrimitive` through the bytecode dispatch
//! loop; since user-defined callables are out of scope here (every
//! function this crate knows about is [`crate::closure::NativeFn`]),
//! the hook points that would invoke them are marked but the calls
//! themselves only ever reach native closures.

use crate::closure::Closure;
use crate::error::{ErrorKind, RtResult};
use crate::object::PropertyLookup;
use crate::string::JsString;
use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveHint {
    Default,
    Number,
    String,
}

/// §4.1 `to_primitive`: non-objects pass through unchanged; objects
/// reduce through the `valueOf`/`toString` pair in an order that
/// depends on the hint (string hint tries `toString` first). This
/// crate has no well-known-symbol table (symbols are opaque identities
/// with no reserved registry slots — see `string.rs`), so unlike the
/// full `OrdinaryToPrimitive` algorithm there is no `@@toPrimitive`
/// override hook to consult first; every object reduces via the
/// method pair.
pub fn to_primitive(v: &Value, hint: PrimitiveHint) -> RtResult<Value> {
    let Some(obj) = v.as_object() else {
        return Ok(v.clone());
    };

    let method_order: [&str; 2] = match hint {
        PrimitiveHint::String => ["toString", "valueOf"],
        PrimitiveHint::Default | PrimitiveHint::Number => ["valueOf", "toString"],
    };

    for method_name in method_order {
        let key = crate::object::PropertyKey::from_str(method_name);
        if let PropertyLookup::Value(method) = obj.get_prop(&key) {
            if let Some(method_obj) = method.as_object() {
                if let Some(closure) = method_obj.as_closure() {
                    let result = call_native(closure, v, &[])?;
                    if !result.is_object() {
                        return Ok(result);
                    }
                }
            }
        }
    }

    Err(ErrorKind::TypeErrorConvertObjectToPrimitive.into())
}

fn call_native(closure: &Closure, this: &Value, args: &[Value]) -> RtResult<Value> {
    closure.call(this, args)
}

/// §4.1 `to_number`: objects reduce via `to_primitive(number)` first.
/// Strings follow the numeric-literal grammar (optional sign,
/// `Infinity`, `0x`/`0o`/`0b` prefixes, decimal with optional
/// fraction/exponent, surrounding whitespace only); anything that
/// doesn't parse cleanly is `NaN`, matching `Number("")` being `0` but
/// `Number("  ")` also `0` (blank strings collapse to zero per spec,
/// handled below) and `Number("abc")` being `NaN`.
pub fn to_number(v: &Value) -> RtResult<f64> {
    match v {
        Value::Number(n) => Ok(*n),
        Value::Int32(i) => Ok(*i as f64),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Null => Ok(0.0),
        Value::Undefined | Value::Deleted | Value::Uninitialized => Ok(f64::NAN),
        Value::String(s) => Ok(string_to_number(s.as_str())),
        Value::Symbol(_) => Err(ErrorKind::TypeErrorConvertSymbolToString.into()),
        Value::BigInt(_) => Err(ErrorKind::TypeErrorExpectedNumber.into()),
        Value::Object(_) => {
            let prim = to_primitive(v, PrimitiveHint::Number)?;
            to_number(&prim)
        }
        Value::Flagged(_) | Value::Command(_) => {
            unreachable!("internal sentinel reached user-visible ToNumber")
        }
    }
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(rest) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return i64::from_str_radix(rest, 16).map(|n| n as f64).unwrap_or(f64::NAN);
    }
    if let Some(rest) = trimmed.strip_prefix("0o").or_else(|| trimmed.strip_prefix("0O")) {
        return i64::from_str_radix(rest, 8).map(|n| n as f64).unwrap_or(f64::NAN);
    }
    if let Some(rest) = trimmed.strip_prefix("0b").or_else(|| trimmed.strip_prefix("0B")) {
        return i64::from_str_radix(rest, 2).map(|n| n as f64).unwrap_or(f64::NAN);
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if is_str_decimal_literal(trimmed) => trimmed.parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// `StrDecimalLiteral` (ES2023 §7.1.4.1): optional sign, then digits
/// with an optional fractional part and exponent, requiring at least
/// one digit somewhere before an optional `e`/`E` exponent. Rust's
/// `f64::parse` is more permissive than this grammar — it also accepts
/// `"inf"`, `"infinity"`, `"nan"` (case-insensitive) and a bare `"."` —
/// so this gate runs first and rejects everything outside the JS
/// grammar rather than letting those slip through as numbers.
fn is_str_decimal_literal(s: &str) -> bool {
    let s = s.strip_prefix(['+', '-']).unwrap_or(s);
    if s.is_empty() {
        return false;
    }
    let mut chars = s.chars().peekable();
    let mut saw_digit = false;
    while chars.peek().is_some_and(char::is_ascii_digit) {
        chars.next();
        saw_digit = true;
    }
    if chars.peek() == Some(&'.') {
        chars.next();
        while chars.peek().is_some_and(char::is_ascii_digit) {
            chars.next();
            saw_digit = true;
        }
    }
    if !saw_digit {
        return false;
    }
    if matches!(chars.peek(), Some('e') | Some('E')) {
        chars.next();
        if matches!(chars.peek(), Some('+') | Some('-')) {
            chars.next();
        }
        let mut saw_exponent_digit = false;
        while chars.peek().is_some_and(char::is_ascii_digit) {
            chars.next();
            saw_exponent_digit = true;
        }
        if !saw_exponent_digit {
            return false;
        }
    }
    chars.next().is_none()
}

/// §4.1 `to_string`: the dual of `to_number`. Bigints format per §4.4
/// (base 10 here; non-decimal radixes go through
/// [`crate::bigint::JsBigInt::to_string_radix`] directly). Numbers go
/// through the three-way formatter in [`crate::format`].
pub fn to_string(v: &Value) -> RtResult<JsString> {
    match v {
        Value::String(s) => Ok(s.clone()),
        Value::Undefined | Value::Deleted | Value::Uninitialized => Ok(JsString::intern("undefined")),
        Value::Null => Ok(JsString::intern("null")),
        Value::Bool(b) => Ok(JsString::intern(if *b { "true" } else { "false" })),
        Value::Number(n) => Ok(JsString::heap_untracked(crate::format::format_number(*n))),
        Value::Int32(i) => Ok(JsString::heap_untracked(i.to_string())),
        Value::BigInt(b) => Ok(JsString::heap_untracked(b.to_string_radix(10))),
        Value::Symbol(_) => Err(ErrorKind::TypeErrorConvertSymbolToString.into()),
        Value::Object(_) => {
            let prim = to_primitive(v, PrimitiveHint::String)?;
            to_string(&prim)
        }
        Value::Flagged(_) | Value::Command(_) => {
            unreachable!("internal sentinel reached user-visible ToString")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Strictness;
    use crate::object::{JsObject, PropertyKey};
    use rt_gc::GcRef;

    #[test]
    fn primitives_pass_through_to_primitive_unchanged() {
        assert_eq!(to_primitive(&Value::int32(5), PrimitiveHint::Default).unwrap(), Value::int32(5));
    }

    #[test]
    fn to_number_parses_radix_prefixes() {
        assert_eq!(to_number(&Value::string(JsString::intern("0x1F"))).unwrap(), 31.0);
        assert_eq!(to_number(&Value::string(JsString::intern("0o17"))).unwrap(), 15.0);
        assert_eq!(to_number(&Value::string(JsString::intern("0b101"))).unwrap(), 5.0);
    }

    #[test]
    fn to_number_blank_string_is_zero_unparsable_is_nan() {
        assert_eq!(to_number(&Value::string(JsString::intern("   "))).unwrap(), 0.0);
        assert!(to_number(&Value::string(JsString::intern("abc"))).unwrap().is_nan());
    }

    #[test]
    fn to_number_rejects_symbol() {
        assert!(to_number(&Value::Symbol(crate::string::JsSymbol::new(None))).is_err());
    }

    #[test]
    fn to_number_rejects_rust_only_float_spellings() {
        for s in ["inf", "-inf", "infinity", "INFINITY", "nan", "NaN", "."] {
            assert!(
                to_number(&Value::string(JsString::intern(s))).unwrap().is_nan(),
                "{s:?} is not a valid StrNumericLiteral and must parse to NaN"
            );
        }
    }

    #[test]
    fn to_number_accepts_js_decimal_literal_shapes() {
        assert_eq!(to_number(&Value::string(JsString::intern("3.14"))).unwrap(), 3.14);
        assert_eq!(to_number(&Value::string(JsString::intern(".5"))).unwrap(), 0.5);
        assert_eq!(to_number(&Value::string(JsString::intern("5."))).unwrap(), 5.0);
        assert_eq!(to_number(&Value::string(JsString::intern("1e3"))).unwrap(), 1000.0);
        assert_eq!(to_number(&Value::string(JsString::intern("-1.5e-2"))).unwrap(), -0.015);
    }

    #[test]
    fn to_string_round_trips_with_to_number_on_integers() {
        let n = to_number(&Value::string(JsString::intern("42"))).unwrap();
        let s = to_string(&Value::number(n)).unwrap();
        assert_eq!(s.as_str(), "42");
    }

    #[test]
    fn object_to_primitive_prefers_value_of_for_default_hint() {
        let obj = GcRef::new(JsObject::ordinary(Value::null()));
        obj.set_prop(
            PropertyKey::from_str("valueOf"),
            Value::object(GcRef::new(JsObject::function(
                Value::null(),
                Closure::native(|_this, _args| Ok(Value::int32(7)), 0),
            ))),
            Strictness::Sloppy,
        )
        .unwrap();
        let result = to_primitive(&Value::object(obj), PrimitiveHint::Default).unwrap();
        assert_eq!(result, Value::int32(7));
    }
}
