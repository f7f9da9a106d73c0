mod error;
mod functions;
mod interpreter;
mod modifiers;
pub mod num;
mod result;
mod roller;
mod stringify;

pub use error::RollError;
pub use functions::{Builtin, DiceFunction, FnFunction, FunctionRegistry};
pub use interpreter::{DefaultRoller, Evaluate, Interpreter};
pub use num::{Number, Value};
pub use result::DiceResult;
pub use roller::{Roller, SequenceRoller};
pub use stringify::{DecoratedStringifier, SimpleStringifier, Stringify};
