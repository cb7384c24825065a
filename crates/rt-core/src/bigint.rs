//! Arbitrary-precision integers.
//!
//! The original (`runtime/big1.c`, `big2.c`) stores a bigint as a
//! sign-magnitude vector of 32-bit limbs and hand-rolls long division
//! (Knuth Algorithm D) and binary exponentiation. We get the same
//! semantics from `num-bigint`'s `BigInt`, which is limb-vector based
//! internally, and keep only the policy the original enforces on top:
//! a hard cap on magnitude (mirrored here as a limb-count cap) and the
//! exact operator semantics (truncating division, `0n ** 0n == 1n`,
//! two's-complement bitwise ops, arithmetic shift).

use crate::error::{ErrorKind, RtResult};
use num_bigint::{BigInt as NumBigInt, Sign};
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::fmt;

/// Limbs are 32-bit; the original caps a bigint at 2^24 limbs
/// (~64 million bits) before raising `RangeError_bigint_too_large`.
const MAX_LIMBS: usize = 1 << 24;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct JsBigInt(NumBigInt);

impl JsBigInt {
    pub fn zero() -> Self {
        JsBigInt(NumBigInt::zero())
    }

    pub fn from_i64(v: i64) -> Self {
        JsBigInt(NumBigInt::from(v))
    }

    pub fn from_str_radix(s: &str, radix: u32) -> RtResult<Self> {
        let (sign, digits) = if let Some(rest) = s.strip_prefix('-') {
            (Sign::Minus, rest)
        } else {
            (Sign::Plus, s)
        };
        let magnitude = NumBigInt::parse_bytes(digits.as_bytes(), radix)
            .ok_or(ErrorKind::SyntaxErrorInvalidArgument)?;
        let value = if sign == Sign::Minus { -magnitude } else { magnitude };
        Self::checked(value)
    }

    fn checked(value: NumBigInt) -> RtResult<Self> {
        // num-bigint has no direct limb count; approximate via bit length,
        // matching the original's 32-bit-limb cap.
        let bits = value.bits();
        if bits as usize > MAX_LIMBS * 32 {
            return Err(ErrorKind::RangeErrorBigintTooLarge.into());
        }
        Ok(JsBigInt(value))
    }

    pub fn add(&self, rhs: &Self) -> RtResult<Self> {
        Self::checked(&self.0 + &rhs.0)
    }

    pub fn sub(&self, rhs: &Self) -> RtResult<Self> {
        Self::checked(&self.0 - &rhs.0)
    }

    pub fn mul(&self, rhs: &Self) -> RtResult<Self> {
        Self::checked(&self.0 * &rhs.0)
    }

    /// Truncating division, matching the original's Algorithm-D based
    /// `big_div`: quotient truncates toward zero, remainder has the
    /// dividend's sign.
    pub fn div(&self, rhs: &Self) -> RtResult<Self> {
        if rhs.0.is_zero() {
            return Err(ErrorKind::RangeErrorDivisionByZero.into());
        }
        Self::checked(&self.0 / &rhs.0)
    }

    pub fn rem(&self, rhs: &Self) -> RtResult<Self> {
        if rhs.0.is_zero() {
            return Err(ErrorKind::RangeErrorDivisionByZero.into());
        }
        Self::checked(&self.0 % &rhs.0)
    }

    /// Binary exponentiation. `0n ** 0n` is `1n`; negative exponents are
    /// rejected (bigints have no fractional representation).
    pub fn pow(&self, exponent: &Self) -> RtResult<Self> {
        if exponent.0.is_negative() {
            return Err(ErrorKind::RangeErrorInvalidArgument.into());
        }
        let mut exp = exponent.0.clone();
        let mut base = self.0.clone();
        let mut acc = NumBigInt::one();
        while exp.is_positive() {
            if (&exp % 2u32).is_one() {
                acc = &acc * &base;
            }
            base = &base * &base;
            exp >>= 1;
        }
        Self::checked(acc)
    }

    pub fn neg(&self) -> RtResult<Self> {
        Self::checked(-&self.0)
    }

    pub fn bitand(&self, rhs: &Self) -> RtResult<Self> {
        Self::checked(&self.0 & &rhs.0)
    }
    pub fn bitor(&self, rhs: &Self) -> RtResult<Self> {
        Self::checked(&self.0 | &rhs.0)
    }
    pub fn bitxor(&self, rhs: &Self) -> RtResult<Self> {
        Self::checked(&self.0 ^ &rhs.0)
    }
    pub fn bitnot(&self) -> RtResult<Self> {
        Self::checked(!&self.0)
    }

    pub fn shl(&self, bits: u32) -> RtResult<Self> {
        Self::checked(&self.0 << bits as usize)
    }
    pub fn shr(&self, bits: u32) -> RtResult<Self> {
        Self::checked(&self.0 >> bits as usize)
    }

    /// `BigInt.asIntN`: reduce modulo 2^bits and reinterpret as signed.
    pub fn as_int_n(&self, bits: u32) -> RtResult<Self> {
        if bits == 0 {
            return Ok(Self::zero());
        }
        let modulus = NumBigInt::from(1u8) << bits as usize;
        let mut reduced = &self.0 % &modulus;
        if reduced.is_negative() {
            reduced += &modulus;
        }
        let half = NumBigInt::from(1u8) << (bits as usize - 1);
        if reduced >= half {
            reduced -= modulus;
        }
        Self::checked(reduced)
    }

    /// `BigInt.asUintN`: reduce modulo 2^bits, always non-negative.
    pub fn as_uint_n(&self, bits: u32) -> RtResult<Self> {
        if bits == 0 {
            return Ok(Self::zero());
        }
        let modulus = NumBigInt::from(1u8) << bits as usize;
        let mut reduced = &self.0 % &modulus;
        if reduced.is_negative() {
            reduced += modulus;
        }
        Self::checked(reduced)
    }

    pub fn to_string_radix(&self, radix: u32) -> String {
        self.0.to_str_radix(radix)
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn cmp(&self, rhs: &Self) -> std::cmp::Ordering {
        self.0.cmp(&rhs.0)
    }
}

impl fmt::Debug for JsBigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}n", self.0)
    }
}

impl fmt::Display for JsBigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_arithmetic_round_trips() {
        let a = JsBigInt::from_str_radix("123456789012345678901234567890", 10).unwrap();
        let b = JsBigInt::from_i64(2);
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.to_string_radix(10), "123456789012345678901234567892");
    }

    #[test]
    fn division_truncates_toward_zero() {
        let a = JsBigInt::from_i64(-7);
        let b = JsBigInt::from_i64(2);
        assert_eq!(a.div(&b).unwrap().to_string_radix(10), "-3");
        assert_eq!(a.rem(&b).unwrap().to_string_radix(10), "-1");
    }

    #[test]
    fn division_by_zero_raises() {
        let a = JsBigInt::from_i64(1);
        let zero = JsBigInt::zero();
        assert!(a.div(&zero).is_err());
    }

    #[test]
    fn power_of_zero_is_one() {
        let a = JsBigInt::zero();
        assert_eq!(a.pow(&JsBigInt::zero()).unwrap().to_string_radix(10), "1");
    }

    #[test]
    fn as_uint_n_wraps_into_range() {
        let a = JsBigInt::from_i64(-1);
        assert_eq!(a.as_uint_n(8).unwrap().to_string_radix(10), "255");
    }

    #[test]
    fn as_int_n_reinterprets_sign() {
        let a = JsBigInt::from_i64(255);
        assert_eq!(a.as_int_n(8).unwrap().to_string_radix(10), "-1");
    }

    #[test]
    fn oversized_magnitude_is_rejected() {
        let huge = NumBigInt::from(1u8) << (MAX_LIMBS * 32 + 1);
        assert!(JsBigInt::checked(huge).is_err());
    }
}
