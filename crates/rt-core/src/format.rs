//! Number-to-string formatting (§4.1 `ToString` for Number).
//!
//! Three cases, matching the ECMA-262 `Number::toString` algorithm's
//! observable shape: an exact integer prints with no fractional part
//! or exponent, a small-enough finite value with a fractional part
//! prints in fixed notation, and anything requiring more than 21
//! digits before the decimal point (or very small subnormal-ish
//! values) prints in exponential notation. `ryu` gives the shortest
//! round-trippable digit string; this module is responsible only for
//! choosing which of the three shapes to wrap it in.

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() };
    }
    if n == 0.0 {
        return if n.is_sign_negative() { "0".to_string() } else { "0".to_string() };
    }

    if n.fract() == 0.0 && n.abs() < 1e21 {
        let mut buf = itoa::Buffer::new();
        return buf.format(n as i64).to_string();
    }

    let exponent = n.abs().log10().floor() as i32;
    if !(-6..21).contains(&exponent) {
        return format_exponential(n);
    }

    let mut buf = ryu::Buffer::new();
    let formatted = buf.format(n);
    // `ryu` always appends a trailing `.0` or an exponent marker;
    // strip the spurious `.0` to match `Number.prototype.toString`
    // printing integral floats (e.g. 3.0) without a decimal point
    // only when they fell into the integer fast path above — anything
    // reaching here genuinely has a fractional part, so `ryu`'s output
    // is used as-is modulo its `e0` suffix quirk.
    strip_ryu_exponent_zero(formatted)
}

fn strip_ryu_exponent_zero(s: &str) -> String {
    if let Some(stripped) = s.strip_suffix("e0") {
        stripped.to_string()
    } else {
        s.to_string()
    }
}

fn format_exponential(n: f64) -> String {
    let mut buf = ryu::Buffer::new();
    let formatted = buf.format(n);
    match formatted.split_once('e') {
        Some((mantissa, exp)) => {
            let exp_value: i32 = exp.parse().unwrap_or(0);
            let sign = if exp_value >= 0 { "+" } else { "-" };
            format!("{mantissa}e{sign}{}", exp_value.abs())
        }
        None => formatted.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_integers_print_without_fraction() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(-7.0), "-7");
        assert_eq!(format_number(0.0), "0");
    }

    #[test]
    fn fractional_values_print_fixed() {
        assert_eq!(format_number(3.5), "3.5");
    }

    #[test]
    fn special_values_print_as_keywords() {
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn very_large_values_use_exponential_notation() {
        let s = format_number(1e21);
        assert!(s.contains('e'));
    }
}
