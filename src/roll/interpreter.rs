use super::functions::FunctionRegistry;
use super::num::{Number, Value};
use super::result::DiceResult;
use super::roller::Roller;
use super::stringify::{DecoratedStringifier, SimpleStringifier, Stringify};
use super::RollError;
use crate::common::*;
use crate::error::Diagnostic;
use crate::options::Options;
use crate::tree::{NodeId, NodeKind, Outcome, Tree};
use std::collections::HashMap;

pub type DefaultRoller = rand::rngs::ThreadRng;

/// What a [`DiceFunction`](super::DiceFunction) can do with the interpreter calling it.
pub trait Evaluate {
    fn evaluate(&mut self, tree: &mut Tree, node: NodeId, errors: &mut Vec<RollError>) -> Value;

    fn get_memory(&self, key: &str) -> Option<&Value>;

    fn set_memory(&mut self, key: String, value: Value);
}

/// Evaluates expression trees, rolling dice with `R`.
///
/// Evaluation mutates the tree: dice nodes gain their rolled results as children, modifiers flag
/// the dice they affect, and every node caches its value.
pub struct Interpreter<R = DefaultRoller> {
    pub(super) roller: R,
    pub(super) options: Options,
    functions: FunctionRegistry,
    memory: HashMap<String, Value>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(rand::thread_rng(), Options::default())
    }
}

impl<R: Roller> Interpreter<R> {
    pub fn new(roller: R, options: Options) -> Self {
        Self {
            roller,
            options,
            functions: FunctionRegistry::default(),
            memory: HashMap::new(),
        }
    }

    /// Adds `functions` to the builtin table, replacing builtins with the same name.
    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = FunctionRegistry::default().merge(functions);
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn roller_mut(&mut self) -> &mut R {
        &mut self.roller
    }

    pub fn set_memory(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.memory.insert(key.into(), value.into());
    }

    pub fn get_memory(&self, key: &str) -> Option<&Value> {
        self.memory.get(key)
    }

    /// Parses and interprets `source`. Parse errors come first in the result's errors.
    pub fn roll(&mut self, source: &str) -> DiceResult {
        let parsed = crate::parse::parse(source);
        let mut result = self.interpret(&parsed.tree);
        let mut errors: Vec<Diagnostic> = parsed.errors.into_iter().map(Diagnostic::from).collect();
        errors.append(&mut result.errors);
        result.errors = errors;
        result
    }

    /// Evaluates a copy of `tree` from its root. `tree` itself is left untouched.
    pub fn interpret(&mut self, tree: &Tree) -> DiceResult {
        let mut tree = tree.copy();
        let mut errors = Vec::new();

        let (total, successes, failures) = match tree.root() {
            Some(root) => {
                let total = self.evaluate(&mut tree, root, &mut errors);
                let (successes, failures) = tally(&tree, root);
                (total, successes, failures)
            }
            None => {
                errors.push(RollError::MissingNode);
                (Value::ZERO, 0, 0)
            }
        };

        let rendered = if self.options.render_expression_decorators {
            DecoratedStringifier.str_tree(&tree)
        } else {
            SimpleStringifier.str_tree(&tree)
        };

        DiceResult {
            tree,
            rendered,
            total,
            successes,
            failures,
            errors: errors.into_iter().map(Diagnostic::from).collect(),
        }
    }

    /// Evaluates the node `id`, memoizing the result on the node.
    ///
    /// Problems are pushed onto `errors` and the offending node evaluates to zero or null.
    pub fn evaluate(&mut self, tree: &mut Tree, id: NodeId, errors: &mut Vec<RollError>) -> Value {
        let node = match tree.get(id) {
            Some(node) => node,
            None => {
                errors.push(RollError::MissingNode);
                return Value::ZERO;
            }
        };

        match node.kind {
            NodeKind::Number(x) => return Value::Number(x),
            NodeKind::DiceSides(Sides::Faces(n)) => return Value::from(n),
            NodeKind::DiceSides(Sides::Fate) => return Value::Null,
            NodeKind::DiceRoll(_) if node.outcome.drop => return Value::ZERO,
            NodeKind::DiceRoll(x) => return Value::from(x),
            _ => {}
        }
        if let Some(value) = &node.value {
            return value.clone();
        }

        let value = match node.kind.clone() {
            NodeKind::String(s) => Value::String(s),
            NodeKind::Binary(op) => self.eval_binary(tree, id, op, errors),
            NodeKind::Negate => self.eval_negate(tree, id, errors),
            NodeKind::Dice { .. } => self.eval_dice(tree, id, errors),
            NodeKind::Group => self.eval_group(tree, id, errors),
            NodeKind::Repeat => self.eval_repeat(tree, id, errors),
            NodeKind::Function(name) => self.eval_function(tree, id, &name, errors),
            NodeKind::Compare(op) => self.eval_compare(tree, id, op, errors),
            NodeKind::Explode { penetrate } => self.eval_explode(tree, id, penetrate, errors),
            NodeKind::Keep(keep) => self.eval_keep(tree, id, keep, true, errors),
            NodeKind::Drop(drop) => self.eval_keep(tree, id, drop, false, errors),
            NodeKind::Critical(critical) => self.eval_critical(tree, id, critical, errors),
            NodeKind::Reroll { once } => self.eval_reroll(tree, id, once, errors),
            NodeKind::Sort(direction) => self.eval_sort(tree, id, direction, errors),
            NodeKind::SubtractFailure => self.eval_subtract_failure(tree, id, errors),
            NodeKind::Number(_) | NodeKind::DiceSides(_) | NodeKind::DiceRoll(_) => Value::ZERO,
        };

        tree[id].value = Some(value.clone());
        value
    }

    /// Checks that `id` has at least `expected` children.
    pub(super) fn expect_children(
        &self,
        tree: &Tree,
        id: NodeId,
        expected: usize,
        errors: &mut Vec<RollError>,
    ) -> bool {
        let found = tree.child_count(id);
        if found < expected {
            errors.push(RollError::ChildCount {
                kind: tree[id].kind.name(),
                expected,
                found,
            });
            false
        } else {
            true
        }
    }

    /// Evaluates `id` as a number; text is reported and counts as zero.
    pub(super) fn evaluate_number(
        &mut self,
        tree: &mut Tree,
        id: NodeId,
        errors: &mut Vec<RollError>,
    ) -> Number {
        let value = self.evaluate(tree, id, errors);
        value.as_number().unwrap_or_else(|| {
            let kind = tree.parent(id).map_or("Expression", |parent| tree[parent].kind.name());
            errors.push(RollError::TypeMismatch(kind));
            Number::ZERO
        })
    }

    fn eval_binary(
        &mut self,
        tree: &mut Tree,
        id: NodeId,
        op: BinaryOperator,
        errors: &mut Vec<RollError>,
    ) -> Value {
        if !self.expect_children(tree, id, 2, errors) {
            return Value::ZERO;
        }
        let (lhs, rhs) = (tree.children(id)[0], tree.children(id)[1]);
        let lhs = self.evaluate(tree, lhs, errors);
        let rhs = self.evaluate(tree, rhs, errors);

        if op == BinaryOperator::Add {
            return add(lhs, rhs);
        }

        let (x, y) = match (lhs.as_number(), rhs.as_number()) {
            (Some(x), Some(y)) => (x, y),
            _ => {
                errors.push(RollError::TypeMismatch(tree[id].kind.name()));
                return Value::ZERO;
            }
        };

        let result = match op {
            BinaryOperator::Add => x + y,
            BinaryOperator::Subtract => x - y,
            BinaryOperator::Multiply => x * y,
            BinaryOperator::Divide if y == Number::ZERO => {
                errors.push(RollError::ZeroDivision);
                Number::ZERO
            }
            BinaryOperator::Divide => x / y,
            BinaryOperator::Modulo if y == Number::ZERO => {
                errors.push(RollError::ZeroModulo);
                Number::ZERO
            }
            BinaryOperator::Modulo => x % y,
            BinaryOperator::Exponent => x.pow(y),
        };
        Value::Number(result)
    }

    fn eval_negate(&mut self, tree: &mut Tree, id: NodeId, errors: &mut Vec<RollError>) -> Value {
        if !self.expect_children(tree, id, 1, errors) {
            return Value::ZERO;
        }
        let operand = tree.children(id)[0];
        Value::Number(-self.evaluate_number(tree, operand, errors))
    }

    pub(super) fn roll_die(&mut self, sides: Sides) -> Int {
        self.roller.number_between(sides.min_face(), sides.max_face())
    }

    fn eval_dice(&mut self, tree: &mut Tree, id: NodeId, errors: &mut Vec<RollError>) -> Value {
        if !self.expect_children(tree, id, 2, errors) {
            return Value::ZERO;
        }
        let (count, sides) = (tree.children(id)[0], tree.children(id)[1]);

        let count = self.evaluate_number(tree, count, errors).round();
        if let Some(max) = self.options.max_roll_times {
            if count > max {
                errors.push(RollError::TooManyRolls { count, max });
                return Value::Null;
            }
        }
        if count < 0 {
            errors.push(RollError::InvalidRollCount(count));
            return Value::Null;
        }

        let sides = match self.resolve_sides(tree, sides, errors) {
            Some(sides) => sides,
            None => return Value::Null,
        };

        tree[id].kind = NodeKind::Dice { sides: Some(sides) };
        tree.clear_children(id);

        let mut total = Number::ZERO;
        for _ in 0..count {
            let roll = self.roll_die(sides);
            let die = tree.create(NodeKind::DiceRoll(roll));
            tree.add_child(id, die);
            total += Number::Int(roll);
        }
        Value::Number(total)
    }

    fn resolve_sides(
        &mut self,
        tree: &mut Tree,
        id: NodeId,
        errors: &mut Vec<RollError>,
    ) -> Option<Sides> {
        let sides = match tree[id].kind {
            NodeKind::DiceSides(sides) => sides,
            _ => Sides::Faces(self.evaluate_number(tree, id, errors).round()),
        };

        if let Sides::Faces(n) = sides {
            if n < 1 {
                errors.push(RollError::InvalidSides(n));
                return None;
            }
            if let Some(max) = self.options.max_dice_sides {
                if n > max {
                    errors.push(RollError::TooManySides { sides: n, max });
                    return None;
                }
            }
        }
        Some(sides)
    }

    fn eval_group(&mut self, tree: &mut Tree, id: NodeId, errors: &mut Vec<RollError>) -> Value {
        let members = tree.children(id).to_vec();
        let mut total = Value::ZERO;
        for member in members {
            let value = self.evaluate(tree, member, errors);
            total = add(total, value);
        }
        total
    }

    /// Replaces the repeat with copies of its body, evaluated in order.
    fn eval_repeat(&mut self, tree: &mut Tree, id: NodeId, errors: &mut Vec<RollError>) -> Value {
        if !self.expect_children(tree, id, 2, errors) {
            return Value::ZERO;
        }
        let (body, times) = (tree.children(id)[0], tree.children(id)[1]);
        let parent = match tree.parent(id) {
            Some(parent) => parent,
            None => {
                errors.push(RollError::MissingParent);
                return Value::ZERO;
            }
        };

        let times = self.evaluate_number(tree, times, errors).round().max(0);
        let index = tree.index_of(parent, id).unwrap_or(0);
        tree.remove_child(parent, id);

        let mut total = Value::ZERO;
        for offset in 0..times {
            let copy = tree.copy_subtree(body);
            tree.insert_child(parent, index + offset as usize, copy);
            let value = self.evaluate(tree, copy, errors);
            total = add(total, value);
        }
        total
    }

    fn eval_function(
        &mut self,
        tree: &mut Tree,
        id: NodeId,
        name: &str,
        errors: &mut Vec<RollError>,
    ) -> Value {
        match self.functions.get(name) {
            Some(function) => function.call(self, tree, id, errors),
            None => {
                errors.push(RollError::UnknownFunction(name.to_string()));
                Value::ZERO
            }
        }
    }
}

impl<R: Roller> Evaluate for Interpreter<R> {
    fn evaluate(&mut self, tree: &mut Tree, node: NodeId, errors: &mut Vec<RollError>) -> Value {
        Interpreter::evaluate(self, tree, node, errors)
    }

    fn get_memory(&self, key: &str) -> Option<&Value> {
        Interpreter::get_memory(self, key)
    }

    fn set_memory(&mut self, key: String, value: Value) {
        Interpreter::set_memory(self, key, value)
    }
}

/// Numeric addition, or concatenation if either side is text.
fn add(lhs: Value, rhs: Value) -> Value {
    match (lhs, rhs) {
        (Value::String(a), b) => Value::String(format!("{}{}", a, b)),
        (a, Value::String(b)) => Value::String(format!("{}{}", a, b)),
        (a, b) => {
            let x = a.as_number().unwrap_or(Number::ZERO);
            let y = b.as_number().unwrap_or(Number::ZERO);
            Value::Number(x + y)
        }
    }
}

/// Counts successes and failures over the outermost dice or groups under `root`.
///
/// When the root subtracts failures, failures are the dice it flagged and are taken off the
/// successes; otherwise they are the members that failed a success comparison.
fn tally(tree: &Tree, root: NodeId) -> (Int, Int) {
    fn count(tree: &Tree, id: NodeId, pred: &dyn Fn(&Outcome) -> bool) -> Int {
        let node = &tree[id];
        if node.kind.is_pool() {
            node.children()
                .iter()
                .map(|&child| &tree[child].outcome)
                .filter(|outcome| !outcome.drop && pred(outcome))
                .count() as Int
        } else {
            node.children().iter().map(|&child| count(tree, child, pred)).sum()
        }
    }

    let subtract = tree[root].kind == NodeKind::SubtractFailure;
    let successes = count(tree, root, &|o| o.success == Some(true));
    if subtract {
        let failures = count(tree, root, &|o| o.failure == Some(true));
        (successes - failures, failures)
    } else {
        (successes, count(tree, root, &|o| o.success == Some(false)))
    }
}
