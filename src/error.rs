use crate::parse::ParseError;
use crate::roll::RollError;

/// Anything that went wrong while parsing or rolling an expression.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("parse error {0}")]
    Parse(#[from] ParseError),
    #[error("roll error: {0}")]
    Roll(#[from] RollError),
}
