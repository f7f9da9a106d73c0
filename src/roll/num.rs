use crate::common::*;
use std::fmt;

#[derive(Debug, Copy, Clone)]
pub enum Number {
    Int(Int),
    Float(Float),
}

impl Number {
    pub const ZERO: Self = Self::Int(0);

    pub fn as_int(self) -> Int {
        match self {
            Self::Int(x) => x,
            Self::Float(x) => x as Int,
        }
    }

    pub fn as_float(self) -> Float {
        match self {
            Self::Int(x) => x as Float,
            Self::Float(x) => x,
        }
    }

    /// Rounds half up, so `-2.5` becomes `-2`.
    pub fn round(self) -> Int {
        match self {
            Self::Int(x) => x,
            Self::Float(x) => (x + 0.5).floor() as Int,
        }
    }

    pub fn floor(self) -> Self {
        self.map_float(Float::floor)
    }

    pub fn ceil(self) -> Self {
        self.map_float(Float::ceil)
    }

    pub fn abs(self) -> Self {
        match self {
            Self::Int(x) => x.checked_abs().map_or_else(|| Self::Float((x as Float).abs()), Self::Int),
            Self::Float(x) => Self::Float(x.abs()),
        }
    }

    pub fn sqrt(self) -> Self {
        Self::normalize(self.as_float().sqrt())
    }

    pub fn pow(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Int(x), Self::Int(y)) if (0..=u32::MAX as Int).contains(&y) => x
                .checked_pow(y as u32)
                .map_or_else(|| Self::Float((x as Float).powf(y as Float)), Self::Int),
            (x, y) => Self::normalize(x.as_float().powf(y.as_float())),
        }
    }

    fn map_float(self, f: impl FnOnce(Float) -> Float) -> Self {
        match self {
            Self::Int(_) => self,
            Self::Float(x) => Self::normalize(f(x)),
        }
    }

    fn normalize(x: Float) -> Self {
        if x.fract() == 0.0 && x.abs() < Int::MAX as Float {
            Self::Int(x as Int)
        } else {
            Self::Float(x)
        }
    }
}

impl std::ops::Neg for Number {
    type Output = Self;

    fn neg(self) -> Self::Output {
        match self {
            Self::Int(x) => x.checked_neg().map_or_else(|| Self::Float(-(x as Float)), Self::Int),
            Self::Float(x) => Self::Float(-x),
        }
    }
}

macro_rules! val_impl_bin_op {
    ($Name:ident, $fn_name:ident, $checked:ident) => {
        impl std::ops::$Name for Number {
            type Output = Self;

            fn $fn_name(self, rhs: Self) -> Self::Output {
                match (self, rhs) {
                    (Self::Int(x), Self::Int(y)) => x.$checked(y).map_or_else(
                        || Self::Float((x as Float).$fn_name(y as Float)),
                        Self::Int,
                    ),
                    (x, y) => Self::Float(x.as_float().$fn_name(y.as_float())),
                }
            }
        }
    };
}

val_impl_bin_op!(Add, add, checked_add);
val_impl_bin_op!(Sub, sub, checked_sub);
val_impl_bin_op!(Mul, mul, checked_mul);
val_impl_bin_op!(Rem, rem, checked_rem);

impl std::ops::Div for Number {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Self::Int(x), Self::Int(y)) if y != 0 && x.checked_rem(y) == Some(0) => {
                Self::Int(x / y)
            }
            (x, y) => Self::Float(x.as_float() / y.as_float()),
        }
    }
}

impl std::ops::AddAssign for Number {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Number {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(x), Self::Int(y)) => x == y,
            (x, y) => x.as_float().eq(&y.as_float()),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Self::Int(x), Self::Int(y)) => x.partial_cmp(y),
            (x, y) => x.as_float().partial_cmp(&y.as_float()),
        }
    }
}

impl From<Int> for Number {
    fn from(x: Int) -> Self {
        Self::Int(x)
    }
}

impl From<Float> for Number {
    fn from(x: Float) -> Self {
        Self::Float(x)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(x) => fmt::Display::fmt(x, f),
            Self::Float(x) => fmt::Display::fmt(x, f),
        }
    }
}

/// The result of evaluating a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Number(Number),
    String(String),
}

impl Value {
    pub const ZERO: Self = Self::Number(Number::ZERO);

    /// Null counts as zero; strings have no numeric value.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Self::Null => Some(Number::ZERO),
            Self::Number(x) => Some(*x),
            Self::String(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl From<Number> for Value {
    fn from(x: Number) -> Self {
        Self::Number(x)
    }
}

impl From<Int> for Value {
    fn from(x: Int) -> Self {
        Self::Number(x.into())
    }
}

impl From<Float> for Value {
    fn from(x: Float) -> Self {
        Self::Number(x.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Number(x) => fmt::Display::fmt(x, f),
            Self::String(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_arithmetic_stays_int() {
        assert!(matches!(Number::Int(7) + Number::Int(5), Number::Int(12)));
        assert!(matches!(Number::Int(12) / Number::Int(4), Number::Int(3)));
        assert!(matches!(Number::Int(7) % Number::Int(4), Number::Int(3)));
    }

    #[test]
    fn inexact_division_is_float() {
        assert_eq!(Number::Int(7) / Number::Int(2), Number::Float(3.5));
    }

    #[test]
    fn overflow_falls_back_to_float() {
        assert!(matches!(Number::Int(Int::MAX) + Number::Int(1), Number::Float(_)));
        assert!(matches!(-Number::Int(Int::MIN), Number::Float(_)));
    }

    #[test]
    fn pow() {
        assert!(matches!(Number::Int(2).pow(Number::Int(10)), Number::Int(1024)));
        assert_eq!(Number::Int(4).pow(Number::Float(0.5)), Number::Int(2));
        assert_eq!(Number::Int(2).pow(Number::Int(-1)), Number::Float(0.5));
    }

    #[test]
    fn rounding() {
        assert_eq!(Number::Float(2.5).round(), 3);
        assert_eq!(Number::Float(-2.5).round(), -2);
        assert_eq!(Number::Float(2.4).round(), 2);
        assert!(matches!(Number::Float(2.7).floor(), Number::Int(2)));
        assert!(matches!(Number::Float(2.1).ceil(), Number::Int(3)));
    }

    #[test]
    fn display() {
        assert_eq!(Number::Int(-3).to_string(), "-3");
        assert_eq!(Number::Float(1.5).to_string(), "1.5");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from("abc").to_string(), "abc");
    }

    #[test]
    fn null_counts_as_zero() {
        assert_eq!(Value::Null.as_number(), Some(Number::ZERO));
        assert_eq!(Value::from("x").as_number(), None);
    }
}
