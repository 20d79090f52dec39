//! Arithmetic
//!
//! A small evaluator for `+ - * / // ** ( )` over integer and decimal
//! literals. Integers stay integers until a true division or a float operand
//! forces a float, and floats print the way the model is used to reading
//! them (`2.0`, `0.1`, `1e+16`).

mod parser;

pub use parser::{MAX_DEPTH, evaluate};

use std::fmt;

use crate::error::{EvalError, Result};

/// A computed value
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Int(i128),
    Float(f64),
}

impl Number {
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    const fn is_float(self) -> bool {
        matches!(self, Self::Float(_))
    }

    pub fn checked_neg(self) -> Result<Self> {
        match self {
            Self::Int(i) => i.checked_neg().map(Self::Int).ok_or(EvalError::IntegerOverflow),
            Self::Float(f) => Ok(Self::Float(-f)),
        }
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self> {
        match (self, rhs) {
            (Self::Int(a), Self::Int(b)) => {
                a.checked_add(b).map(Self::Int).ok_or(EvalError::IntegerOverflow)
            }
            _ => Ok(Self::Float(self.as_f64() + rhs.as_f64())),
        }
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self> {
        match (self, rhs) {
            (Self::Int(a), Self::Int(b)) => {
                a.checked_sub(b).map(Self::Int).ok_or(EvalError::IntegerOverflow)
            }
            _ => Ok(Self::Float(self.as_f64() - rhs.as_f64())),
        }
    }

    pub fn checked_mul(self, rhs: Self) -> Result<Self> {
        match (self, rhs) {
            (Self::Int(a), Self::Int(b)) => {
                a.checked_mul(b).map(Self::Int).ok_or(EvalError::IntegerOverflow)
            }
            _ => Ok(Self::Float(self.as_f64() * rhs.as_f64())),
        }
    }

    /// True division always yields a float
    pub fn true_div(self, rhs: Self) -> Result<Self> {
        if rhs.as_f64() == 0.0 {
            return Err(if self.is_float() || rhs.is_float() {
                EvalError::FloatDivisionByZero
            } else {
                EvalError::DivisionByZero
            });
        }
        Ok(Self::Float(self.as_f64() / rhs.as_f64()))
    }

    /// Floor division, rounding toward negative infinity
    pub fn floor_div(self, rhs: Self) -> Result<Self> {
        match (self, rhs) {
            (Self::Int(_), Self::Int(0)) => Err(EvalError::IntegerFloorDivisionByZero),
            (Self::Int(a), Self::Int(b)) => {
                let q = a.checked_div(b).ok_or(EvalError::IntegerOverflow)?;
                if a % b != 0 && ((a < 0) != (b < 0)) {
                    Ok(Self::Int(q - 1))
                } else {
                    Ok(Self::Int(q))
                }
            }
            _ if rhs.as_f64() == 0.0 => Err(EvalError::FloatFloorDivisionByZero),
            _ => Ok(Self::Float((self.as_f64() / rhs.as_f64()).floor())),
        }
    }

    pub fn pow(self, rhs: Self) -> Result<Self> {
        if let (Self::Int(base), Self::Int(exp)) = (self, rhs) {
            if exp >= 0 {
                let exp = u32::try_from(exp).map_err(|_| EvalError::IntegerOverflow)?;
                return base
                    .checked_pow(exp)
                    .map(Self::Int)
                    .ok_or(EvalError::IntegerOverflow);
            }
        }

        let (base, exp) = (self.as_f64(), rhs.as_f64());
        if base == 0.0 && exp < 0.0 {
            return Err(EvalError::ZeroToNegativePower);
        }
        if base < 0.0 && exp.fract() != 0.0 {
            return Err(EvalError::ComplexResult);
        }

        let value = base.powf(exp);
        if value.is_infinite() {
            return Err(EvalError::FloatOverflow);
        }
        Ok(Self::Float(value))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => f.write_str(&format_float(*x)),
        }
    }
}

/// Shortest round-trip repr: plain notation with a trailing `.0` for
/// decimal exponents in `[-4, 16)`, scientific with a signed two-digit
/// exponent otherwise.
fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".into();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf".into() } else { "-inf".into() };
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0.0".into() } else { "0.0".into() };
    }

    let sci = format!("{x:e}");
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if (-4..16).contains(&exponent) {
        let plain = x.to_string();
        if plain.contains('.') { plain } else { format!("{plain}.0") }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    }
}
