use super::interpreter::Evaluate;
use super::num::{Number, Value};
use super::RollError;
use crate::tree::{NodeId, Tree};
use enum_dispatch::enum_dispatch;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A function callable from dice notation, e.g. `floor(1d6 / 2)`.
///
/// `node` is the call node; its children are the unevaluated arguments.
#[enum_dispatch]
pub trait DiceFunction {
    fn call(
        &self,
        interpreter: &mut dyn Evaluate,
        tree: &mut Tree,
        node: NodeId,
        errors: &mut Vec<RollError>,
    ) -> Value;
}

#[enum_dispatch(DiceFunction)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Builtin {
    Floor,
    Ceil,
    Round,
    Abs,
    Sqrt,
    Min,
    Max,
}

impl Builtin {
    pub const ALL: [Builtin; 7] = [
        Builtin::Floor(Floor),
        Builtin::Ceil(Ceil),
        Builtin::Round(Round),
        Builtin::Abs(Abs),
        Builtin::Sqrt(Sqrt),
        Builtin::Min(Min),
        Builtin::Max(Max),
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Floor(_) => "floor",
            Self::Ceil(_) => "ceil",
            Self::Round(_) => "round",
            Self::Abs(_) => "abs",
            Self::Sqrt(_) => "sqrt",
            Self::Min(_) => "min",
            Self::Max(_) => "max",
        }
    }
}

/// Evaluates every argument of `node`, reporting those that aren't numbers.
fn arguments(
    interpreter: &mut dyn Evaluate,
    tree: &mut Tree,
    node: NodeId,
    errors: &mut Vec<RollError>,
) -> Vec<Number> {
    let args = tree.children(node).to_vec();
    args.into_iter()
        .map(|arg| {
            let value = interpreter.evaluate(tree, arg, errors);
            value.as_number().unwrap_or_else(|| {
                errors.push(RollError::TypeMismatch("Function"));
                Number::ZERO
            })
        })
        .collect()
}

fn expect_args(tree: &Tree, node: NodeId, expected: usize, errors: &mut Vec<RollError>) -> bool {
    let found = tree.child_count(node);
    if found < expected {
        errors.push(RollError::ChildCount {
            kind: "Function",
            expected,
            found,
        });
        false
    } else {
        true
    }
}

macro_rules! unary_function {
    ($Name:ident, $f:expr) => {
        #[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
        pub struct $Name;

        impl DiceFunction for $Name {
            fn call(
                &self,
                interpreter: &mut dyn Evaluate,
                tree: &mut Tree,
                node: NodeId,
                errors: &mut Vec<RollError>,
            ) -> Value {
                if !expect_args(tree, node, 1, errors) {
                    return Value::ZERO;
                }
                let args = arguments(interpreter, tree, node, errors);
                let f: fn(Number) -> Number = $f;
                Value::Number(f(args[0]))
            }
        }
    };
}

unary_function!(Floor, Number::floor);
unary_function!(Ceil, Number::ceil);
unary_function!(Round, |x| Number::Int(x.round()));
unary_function!(Abs, Number::abs);
unary_function!(Sqrt, Number::sqrt);

macro_rules! fold_function {
    ($Name:ident, $pick:expr) => {
        #[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
        pub struct $Name;

        impl DiceFunction for $Name {
            fn call(
                &self,
                interpreter: &mut dyn Evaluate,
                tree: &mut Tree,
                node: NodeId,
                errors: &mut Vec<RollError>,
            ) -> Value {
                if !expect_args(tree, node, 1, errors) {
                    return Value::ZERO;
                }
                let pick: fn(&Number, &Number) -> bool = $pick;
                let args = arguments(interpreter, tree, node, errors);
                let best = args
                    .into_iter()
                    .reduce(|best, x| if pick(&x, &best) { x } else { best });
                best.map_or(Value::ZERO, Value::Number)
            }
        }
    };
}

fold_function!(Min, |x, best| x < best);
fold_function!(Max, |x, best| x > best);

/// Wraps a closure as a [`DiceFunction`].
#[derive(Clone, Copy)]
pub struct FnFunction<F>(pub F);

impl<F> DiceFunction for FnFunction<F>
where
    F: Fn(&mut dyn Evaluate, &mut Tree, NodeId, &mut Vec<RollError>) -> Value,
{
    fn call(
        &self,
        interpreter: &mut dyn Evaluate,
        tree: &mut Tree,
        node: NodeId,
        errors: &mut Vec<RollError>,
    ) -> Value {
        (self.0)(interpreter, tree, node, errors)
    }
}

/// Functions by name.
#[derive(Clone)]
pub struct FunctionRegistry {
    table: HashMap<String, Rc<dyn DiceFunction>>,
}

impl FunctionRegistry {
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, function: impl DiceFunction + 'static) {
        self.table.insert(name.into(), Rc::new(function));
    }

    pub fn with(mut self, name: impl Into<String>, function: impl DiceFunction + 'static) -> Self {
        self.insert(name, function);
        self
    }

    /// Adds every function of `other`, replacing any with the same name.
    pub fn merge(mut self, other: FunctionRegistry) -> Self {
        self.table.extend(other.table);
        self
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn DiceFunction>> {
        self.table.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for builtin in Builtin::ALL {
            registry.insert(builtin.name(), builtin);
        }
        registry
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("FunctionRegistry")
            .field("names", &names)
            .finish()
    }
}
