use crate::common::Int;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RollError {
    #[error("{kind} expects at least {expected} children, found {found}")]
    ChildCount {
        kind: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("node does not exist")]
    MissingNode,
    #[error("{0} needs a dice roll or group to operate on")]
    MissingPool(&'static str),
    #[error("{0} needs dice with a known number of sides")]
    MissingSides(&'static str),
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    #[error("invalid number of rolls: {count}. Maximum allowed: {max}")]
    TooManyRolls { count: Int, max: Int },
    #[error("invalid number of dice sides: {sides}. Maximum allowed: {max}")]
    TooManySides { sides: Int, max: Int },
    #[error("invalid number of rolls: {0}")]
    InvalidRollCount(Int),
    #[error("invalid number of dice sides: {0}")]
    InvalidSides(Int),
    #[error("condition to roll again includes all dice faces and would run forever")]
    RollsForever,
    #[error("{0} is not a comparison")]
    NotAComparison(&'static str),
    #[error("{0} cannot operate on text")]
    TypeMismatch(&'static str),
    #[error("cannot divide by zero")]
    ZeroDivision,
    #[error("cannot take modulus by zero")]
    ZeroModulo,
    #[error("repeat must be inside a group")]
    MissingParent,
}
