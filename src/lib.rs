//! A dice notation language: `4d6kh3`, `2d20kl > 14`, `{1d8 + 2}3`, `floor(1d6 / 2)`.
//!
//! Source is parsed into an arena [`Tree`](tree::Tree), which an [`Interpreter`] evaluates in
//! place, then renders back to notation with every roll filled in.

pub mod common;
mod error;
mod options;
pub mod parse;
pub mod roll;
pub mod tree;

pub use error::Diagnostic;
pub use options::Options;
pub use parse::parse;
pub use roll::{DiceResult, Interpreter, Number, Value};

/// Rolls `source` with the thread RNG and default options.
pub fn roll(source: &str) -> DiceResult {
    let mut interpreter: Interpreter = Interpreter::default();
    interpreter.roll(source)
}
