//! Fixed-point decimal arithmetic with six fractional digits.
//!
//! Every money, weight and point computation in the engine routes through
//! [`Fixed6`] so results are identical on every platform. Values are stored as an
//! `i64` scaled by 10^6; multiplication and division widen to `i128` internally.
//!
//! Operators (`+`, `-`, `*`) saturate at the representable range. Division has no
//! operator form: use [`Fixed6::checked_div`], which reports division by zero as an
//! [`ArithmeticError`].

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use core::str::FromStr;

use crate::error::{ArithmeticError, CalcResult, ErrorSeverity, SheetError};

/// Number of fractional decimal digits.
pub const DIGITS: u32 = 6;

/// Scale factor between the raw integer and the represented value.
pub const SCALE: i64 = 1_000_000;

/// Exact decimal value with six fractional digits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed6(i64);

impl Fixed6 {
    pub const ZERO: Self = Self(0);
    pub const HALF: Self = Self(SCALE / 2);
    pub const ONE: Self = Self(SCALE);
    pub const TWO: Self = Self(2 * SCALE);
    pub const TEN: Self = Self(10 * SCALE);
    pub const HUNDRED: Self = Self(100 * SCALE);
    pub const MIN: Self = Self(i64::MIN);
    pub const MAX: Self = Self(i64::MAX);

    /// Wraps an already-scaled raw value.
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the scaled raw value.
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Creates a value from a whole number, saturating outside the range.
    pub const fn from_int(value: i64) -> Self {
        Self(value.saturating_mul(SCALE))
    }

    /// Creates `numerator / 10^places`, e.g. `from_decimal(-95, 2)` is `-0.95`.
    ///
    /// Places beyond six are truncated.
    pub const fn from_decimal(numerator: i64, places: u32) -> Self {
        if places >= DIGITS {
            Self(numerator / 10i64.pow(places - DIGITS))
        } else {
            Self(numerator.saturating_mul(10i64.pow(DIGITS - places)))
        }
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    pub fn checked_add(self, rhs: Self) -> CalcResult<Self> {
        self.0.checked_add(rhs.0).map(Self).ok_or(ArithmeticError::Overflow)
    }

    pub fn checked_sub(self, rhs: Self) -> CalcResult<Self> {
        self.0.checked_sub(rhs.0).map(Self).ok_or(ArithmeticError::Overflow)
    }

    /// Multiplies, truncating toward zero at the sixth fractional digit.
    pub fn checked_mul(self, rhs: Self) -> CalcResult<Self> {
        let wide = i128::from(self.0) * i128::from(rhs.0) / i128::from(SCALE);
        i64::try_from(wide).map(Self).map_err(|_| ArithmeticError::Overflow)
    }

    /// Divides, rounding half away from zero at the sixth fractional digit.
    pub fn checked_div(self, rhs: Self) -> CalcResult<Self> {
        if rhs.0 == 0 {
            return Err(ArithmeticError::DivisionByZero);
        }
        let num = i128::from(self.0) * i128::from(SCALE);
        let den = i128::from(rhs.0);
        let quotient = num / den;
        let remainder = num % den;
        let rounded = if remainder.abs() * 2 >= den.abs() {
            if (num < 0) == (den < 0) {
                quotient + 1
            } else {
                quotient - 1
            }
        } else {
            quotient
        };
        i64::try_from(rounded).map(Self).map_err(|_| ArithmeticError::Overflow)
    }

    /// Multiplies by a whole number, saturating.
    pub const fn mul_int(self, rhs: i64) -> Self {
        Self(self.0.saturating_mul(rhs))
    }

    /// Divides by a whole number, rounding like [`Fixed6::checked_div`].
    pub fn div_int(self, rhs: i64) -> CalcResult<Self> {
        self.checked_div(Self::from_int(rhs))
    }

    /// Rounds to the nearest integer, halves away from zero.
    pub const fn round(self) -> Self {
        let whole = self.0 / SCALE * SCALE;
        let fraction = self.0 % SCALE;
        if fraction >= SCALE / 2 {
            Self(whole.saturating_add(SCALE))
        } else if fraction <= -SCALE / 2 {
            Self(whole.saturating_sub(SCALE))
        } else {
            Self(whole)
        }
    }

    /// Drops the fractional part.
    pub const fn trunc(self) -> Self {
        Self(self.0 / SCALE * SCALE)
    }

    pub const fn floor(self) -> Self {
        let truncated = self.trunc();
        if self.0 < 0 && truncated.0 != self.0 {
            Self(truncated.0.saturating_sub(SCALE))
        } else {
            truncated
        }
    }

    pub const fn ceil(self) -> Self {
        let truncated = self.trunc();
        if self.0 > 0 && truncated.0 != self.0 {
            Self(truncated.0.saturating_add(SCALE))
        } else {
            truncated
        }
    }

    /// Integer part, truncated toward zero.
    pub const fn to_int(self) -> i64 {
        self.0 / SCALE
    }

    /// Integer part clamped into `i32`.
    pub fn to_i32(self) -> i32 {
        i32::try_from(self.to_int()).unwrap_or(if self.0 < 0 { i32::MIN } else { i32::MAX })
    }

    pub fn min(self, other: Self) -> Self {
        Ord::min(self, other)
    }

    pub fn max(self, other: Self) -> Self {
        Ord::max(self, other)
    }

    /// Formats with an explicit leading `+` for non-negative values.
    pub fn to_signed_string(self) -> String {
        if self.0 >= 0 {
            format!("+{self}")
        } else {
            self.to_string()
        }
    }
}

impl From<i32> for Fixed6 {
    fn from(value: i32) -> Self {
        Self::from_int(i64::from(value))
    }
}

impl Add for Fixed6 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Fixed6 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Fixed6 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Fixed6 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul for Fixed6 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.checked_mul(rhs).unwrap_or(if (self.0 < 0) == (rhs.0 < 0) {
            Self::MAX
        } else {
            Self::MIN
        })
    }
}

impl MulAssign for Fixed6 {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Neg for Fixed6 {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl Sum for Fixed6 {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Fixed6> for Fixed6 {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Canonical form: no exponent, no trailing fractional zeros, `-` only when negative.
impl fmt::Display for Fixed6 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let scale = SCALE.unsigned_abs();
        let whole = magnitude / scale;
        let fraction = magnitude % scale;
        if self.0 < 0 {
            f.write_str("-")?;
        }
        write!(f, "{whole}")?;
        if fraction != 0 {
            let digits = format!("{fraction:06}");
            write!(f, ".{}", digits.trim_end_matches('0'))?;
        }
        Ok(())
    }
}

/// Failure to parse a decimal string.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseFixedError {
    #[error("empty decimal string")]
    Empty,

    #[error("invalid character {0:?} in decimal string")]
    InvalidDigit(char),

    #[error("decimal value out of range")]
    Overflow,
}

impl SheetError for ParseFixedError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Empty => "FIXED_EMPTY",
            Self::InvalidDigit(_) => "FIXED_INVALID_DIGIT",
            Self::Overflow => "FIXED_OVERFLOW",
        }
    }
}

/// Parses `[+-]digits[.digits]`, ignoring `,` separators.
///
/// Fractional digits beyond the sixth are truncated.
impl FromStr for Fixed6 {
    type Err = ParseFixedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            Some(_) => (false, s),
            None => return Err(ParseFixedError::Empty),
        };
        let (whole_part, fraction_part) = body.split_once('.').unwrap_or((body, ""));
        if whole_part.is_empty() && fraction_part.is_empty() {
            return Err(ParseFixedError::Empty);
        }

        let mut raw: i128 = 0;
        for ch in whole_part.chars().filter(|&ch| ch != ',') {
            let digit = ch.to_digit(10).ok_or(ParseFixedError::InvalidDigit(ch))?;
            raw = raw * 10 + i128::from(digit);
            if raw > i128::from(i64::MAX) {
                return Err(ParseFixedError::Overflow);
            }
        }
        raw *= i128::from(SCALE);

        let mut place = SCALE / 10;
        for ch in fraction_part.chars() {
            let digit = ch.to_digit(10).ok_or(ParseFixedError::InvalidDigit(ch))?;
            raw += i128::from(digit) * i128::from(place);
            place /= 10;
        }

        let signed = if negative { -raw } else { raw };
        i64::try_from(signed).map(Self).map_err(|_| ParseFixedError::Overflow)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Fixed6 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Fixed6 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Fixed6Visitor;

        impl serde::de::Visitor<'_> for Fixed6Visitor {
            type Value = Fixed6;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal number or decimal string")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Fixed6, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Fixed6, E> {
                Ok(Fixed6::from_int(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Fixed6, E> {
                i64::try_from(v)
                    .map(Fixed6::from_int)
                    .map_err(|_| E::custom(ParseFixedError::Overflow))
            }

            // Shortest round-trip text of the float, never its binary expansion.
            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Fixed6, E> {
                format!("{v}").parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(Fixed6Visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fx(s: &str) -> Fixed6 {
        s.parse().unwrap()
    }

    #[test]
    fn formats_canonically() {
        assert_eq!(Fixed6::from_int(3).to_string(), "3");
        assert_eq!(fx("1.500000").to_string(), "1.5");
        assert_eq!(fx("-0.25").to_string(), "-0.25");
        assert_eq!(Fixed6::from_raw(1).to_string(), "0.000001");
        assert_eq!(Fixed6::ZERO.to_string(), "0");
        assert_eq!(Fixed6::MIN.to_string().parse::<Fixed6>().unwrap(), Fixed6::MIN);
    }

    #[test]
    fn parses_signs_separators_and_long_fractions() {
        assert_eq!(fx("+1,000.5"), Fixed6::from_decimal(10005, 1));
        assert_eq!(fx(".5"), Fixed6::HALF);
        assert_eq!(fx("1.23456789"), Fixed6::from_raw(1_234_567));
        assert_eq!("".parse::<Fixed6>(), Err(ParseFixedError::Empty));
        assert_eq!("-".parse::<Fixed6>(), Err(ParseFixedError::Empty));
        assert_eq!("1x".parse::<Fixed6>(), Err(ParseFixedError::InvalidDigit('x')));
        assert_eq!(
            "99999999999999999999".parse::<Fixed6>(),
            Err(ParseFixedError::Overflow)
        );
    }

    #[test]
    fn division_rounds_and_rejects_zero() {
        let third = Fixed6::ONE.checked_div(Fixed6::from_int(3)).unwrap();
        assert_eq!(third, Fixed6::from_raw(333_333));
        let two_thirds = Fixed6::TWO.checked_div(Fixed6::from_int(3)).unwrap();
        assert_eq!(two_thirds, Fixed6::from_raw(666_667));
        let negative = (-Fixed6::TWO).checked_div(Fixed6::from_int(3)).unwrap();
        assert_eq!(negative, Fixed6::from_raw(-666_667));
        assert_eq!(
            Fixed6::ONE.checked_div(Fixed6::ZERO),
            Err(ArithmeticError::DivisionByZero)
        );
    }

    #[test]
    fn multiplication_truncates() {
        assert_eq!(fx("1.5") * fx("1.5"), fx("2.25"));
        assert_eq!(Fixed6::from_raw(1) * Fixed6::HALF, Fixed6::ZERO);
        assert_eq!(Fixed6::MAX * Fixed6::TWO, Fixed6::MAX);
        assert_eq!(Fixed6::MAX.checked_mul(Fixed6::TWO), Err(ArithmeticError::Overflow));
    }

    #[test]
    fn rounding_modes() {
        assert_eq!(fx("2.5").round(), fx("3"));
        assert_eq!(fx("-2.5").round(), fx("-3"));
        assert_eq!(fx("2.49").round(), fx("2"));
        assert_eq!(fx("-2.7").trunc(), fx("-2"));
        assert_eq!(fx("-2.1").floor(), fx("-3"));
        assert_eq!(fx("2.1").ceil(), fx("3"));
        assert_eq!(fx("-2.1").ceil(), fx("-2"));
        assert_eq!(fx("7.9").to_int(), 7);
    }

    #[test]
    fn signed_strings() {
        assert_eq!(Fixed6::from_int(2).to_signed_string(), "+2");
        assert_eq!(Fixed6::ZERO.to_signed_string(), "+0");
        assert_eq!(fx("-1.5").to_signed_string(), "-1.5");
    }
}
