use super::num::Value;
use crate::common::Int;
use crate::error::Diagnostic;
use crate::tree::Tree;
use std::fmt;

/// The outcome of interpreting an expression.
#[derive(Debug, Clone)]
pub struct DiceResult {
    /// The evaluated copy of the input tree, with every roll and flag in place.
    pub tree: Tree,
    pub rendered: String,
    pub total: Value,
    pub successes: Int,
    pub failures: Int,
    pub errors: Vec<Diagnostic>,
}

impl DiceResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for DiceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.rendered, self.total)
    }
}
