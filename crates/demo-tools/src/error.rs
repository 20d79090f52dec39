//! Error Types for the Expression Evaluator
//!
//! Messages mirror what a Python-style evaluator reports, since they end up
//! verbatim in the `Error calculating: ...` string handed to the model.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvalError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("invalid character '{0}'")]
    InvalidCharacter(char),

    #[error("invalid syntax: {0}")]
    Syntax(String),

    #[error("'(' was never closed")]
    UnclosedParen,

    #[error("unmatched ')'")]
    UnmatchedParen,

    #[error("too many nested parentheses")]
    TooDeep,

    #[error("leading zeros in decimal integer literals are not permitted")]
    LeadingZeros,

    #[error("division by zero")]
    DivisionByZero,

    #[error("float division by zero")]
    FloatDivisionByZero,

    #[error("integer division or modulo by zero")]
    IntegerFloorDivisionByZero,

    #[error("float floor division by zero")]
    FloatFloorDivisionByZero,

    #[error("0.0 cannot be raised to a negative power")]
    ZeroToNegativePower,

    #[error("complex results are not supported")]
    ComplexResult,

    #[error("integer result too large")]
    IntegerOverflow,

    #[error("numerical result out of range")]
    FloatOverflow,
}
