//! Rules for the nodes that work on a pool of dice or group members.

use super::interpreter::Interpreter;
use super::num::{Number, Value};
use super::roller::Roller;
use super::RollError;
use crate::common::*;
use crate::tree::{NodeId, NodeKind, Tree};

/// A resolved `op operand` test against single results.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(super) struct Condition {
    op: CompareOp,
    operand: Number,
}

impl Condition {
    fn equal(operand: Int) -> Self {
        Self {
            op: CompareOp::Equal,
            operand: Number::Int(operand),
        }
    }

    fn matches(&self, value: Number) -> bool {
        self.op.holds(&value, &self.operand)
    }

    /// Whether every face of a die satisfies this condition.
    fn covers_all_faces(&self, sides: Sides) -> bool {
        let min = Number::Int(sides.min_face());
        let max = Number::Int(sides.max_face());
        match self.op {
            CompareOp::Equal => min == max && self.operand == min,
            CompareOp::Greater => self.operand < min,
            CompareOp::GreaterOrEqual => self.operand <= min,
            CompareOp::Less => self.operand > max,
            CompareOp::LessOrEqual => self.operand >= max,
        }
    }
}

fn die_value(tree: &Tree, id: NodeId) -> Number {
    match tree[id].kind {
        NodeKind::DiceRoll(x) => Number::Int(x),
        NodeKind::Number(x) => x,
        _ => tree[id]
            .value
            .as_ref()
            .and_then(Value::as_number)
            .unwrap_or(Number::ZERO),
    }
}

impl<R: Roller> Interpreter<R> {
    /// Walks down first children from `id` to the nearest dice or group, evaluating each step.
    pub(super) fn find_pool(
        &mut self,
        tree: &mut Tree,
        id: NodeId,
        errors: &mut Vec<RollError>,
    ) -> Option<NodeId> {
        let mut current = id;
        loop {
            if tree[current].kind.is_pool() {
                return Some(current);
            }
            match tree.child(current, 0) {
                Some(child) => {
                    self.evaluate(tree, child, errors);
                    current = child;
                }
                None => {
                    errors.push(RollError::MissingPool(tree[id].kind.name()));
                    return None;
                }
            }
        }
    }

    fn pool_sides(
        &self,
        tree: &Tree,
        id: NodeId,
        pool: NodeId,
        errors: &mut Vec<RollError>,
    ) -> Option<Sides> {
        match tree[pool].kind {
            NodeKind::Dice { sides: Some(sides) } => Some(sides),
            _ => {
                errors.push(RollError::MissingSides(tree[id].kind.name()));
                None
            }
        }
    }

    /// Reads the optional condition child of a modifier. A bare number means equality.
    fn condition(
        &mut self,
        tree: &mut Tree,
        id: NodeId,
        errors: &mut Vec<RollError>,
    ) -> Option<Result<Condition, ()>> {
        let child = tree.child(id, 1)?;
        Some(match tree[child].kind.clone() {
            NodeKind::Compare(op) if tree.child_count(child) > 0 => {
                let operand = tree.children(child)[0];
                let operand = self.evaluate_number(tree, operand, errors);
                Ok(Condition { op, operand })
            }
            NodeKind::Number(x) => Ok(Condition {
                op: CompareOp::Equal,
                operand: x,
            }),
            kind => {
                errors.push(RollError::NotAComparison(kind.name()));
                Err(())
            }
        })
    }

    /// The explicit condition of an explode or reroll, or `default` if there is none.
    fn roll_again_condition(
        &mut self,
        tree: &mut Tree,
        id: NodeId,
        sides: Sides,
        default: Condition,
        errors: &mut Vec<RollError>,
    ) -> Option<Condition> {
        match self.condition(tree, id, errors) {
            None => Some(default),
            Some(Err(())) => None,
            Some(Ok(condition)) if condition.covers_all_faces(sides) => {
                errors.push(RollError::RollsForever);
                None
            }
            Some(Ok(condition)) => Some(condition),
        }
    }

    /// Evaluates every member of `pool` and orders them by their own value.
    fn sorted_members(
        &mut self,
        tree: &mut Tree,
        pool: NodeId,
        direction: SortDirection,
        errors: &mut Vec<RollError>,
    ) -> (Vec<NodeId>, Number) {
        let members = tree.children(pool).to_vec();
        let mut total = Number::ZERO;
        let mut keyed = Vec::with_capacity(members.len());
        for member in members {
            total += self.evaluate_number(tree, member, errors);
            keyed.push((member, die_value(tree, member)));
        }

        keyed.sort_by(|(_, a), (_, b)| {
            let ord = a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal);
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
        (keyed.into_iter().map(|(member, _)| member).collect(), total)
    }

    pub(super) fn eval_explode(
        &mut self,
        tree: &mut Tree,
        id: NodeId,
        penetrate: bool,
        errors: &mut Vec<RollError>,
    ) -> Value {
        if !self.expect_children(tree, id, 1, errors) {
            return Value::ZERO;
        }
        let pool = match self.find_pool(tree, id, errors) {
            Some(pool) => pool,
            None => return Value::ZERO,
        };
        let sides = match self.pool_sides(tree, id, pool, errors) {
            Some(sides) => sides,
            None => return Value::ZERO,
        };
        let default = Condition::equal(sides.max_face());
        let condition = match self.roll_again_condition(tree, id, sides, default, errors) {
            Some(condition) => condition,
            None => return Value::ZERO,
        };

        let max_extra = (self.options.max_explode - 1).max(0);
        let mut total = Number::ZERO;
        for die in tree.children(pool).to_vec() {
            if tree[die].outcome.drop {
                continue;
            }
            let mut rolled = die_value(tree, die);
            total += rolled;

            let mut current = die;
            let mut position = tree.index_of(pool, die).unwrap_or(0);
            let mut extra = 0;
            while extra < max_extra && condition.matches(rolled) {
                extra += 1;
                tree[current].outcome.explode = true;

                let raw = self.roll_die(sides);
                let stored = if penetrate { raw - 1 } else { raw };
                let next = tree.create(NodeKind::DiceRoll(stored));
                position += 1;
                tree.insert_child(pool, position, next);

                total += Number::Int(stored);
                rolled = Number::Int(stored);
                current = next;
            }
        }
        Value::Number(total)
    }

    /// Keeps the selected members and drops the rest, or the reverse when `keep` is false.
    pub(super) fn eval_keep(
        &mut self,
        tree: &mut Tree,
        id: NodeId,
        keep_type: KeepType,
        keep: bool,
        errors: &mut Vec<RollError>,
    ) -> Value {
        if !self.expect_children(tree, id, 1, errors) {
            return Value::ZERO;
        }
        let pool = match self.find_pool(tree, id, errors) {
            Some(pool) => pool,
            None => return Value::ZERO,
        };
        let count = match tree.child(id, 1) {
            Some(count) => self.evaluate_number(tree, count, errors).round(),
            None => 1,
        };

        let direction = match keep_type {
            KeepType::Lowest => SortDirection::Ascending,
            KeepType::Highest | KeepType::Middle => SortDirection::Descending,
        };
        let (mut members, _) = self.sorted_members(tree, pool, direction, errors);
        members.retain(|&member| !tree[member].outcome.superseded);

        let mid = (members.len() / 2) as Int;
        let selected = |index: Int| match keep_type {
            KeepType::Middle => (mid - (count - 1)..=mid + (count - 1)).contains(&index),
            KeepType::Highest | KeepType::Lowest => index < count,
        };

        let mut total = Number::ZERO;
        for (index, &member) in members.iter().enumerate() {
            let kept = selected(index as Int) == keep;
            tree[member].outcome.drop = !kept;
            if kept {
                total += die_value(tree, member);
            }
        }
        Value::Number(total)
    }

    pub(super) fn eval_critical(
        &mut self,
        tree: &mut Tree,
        id: NodeId,
        critical: CriticalType,
        errors: &mut Vec<RollError>,
    ) -> Value {
        if !self.expect_children(tree, id, 1, errors) {
            return Value::ZERO;
        }
        let pool = match self.find_pool(tree, id, errors) {
            Some(pool) => pool,
            None => return Value::ZERO,
        };
        let condition = match self.condition(tree, id, errors) {
            Some(Ok(condition)) => condition,
            Some(Err(())) => return Value::ZERO,
            None => match critical {
                CriticalType::Failure => Condition::equal(1),
                CriticalType::Success => match self.pool_sides(tree, id, pool, errors) {
                    Some(sides) => Condition::equal(sides.max_face()),
                    None => return Value::ZERO,
                },
            },
        };

        let mut total = Number::ZERO;
        for member in tree.children(pool).to_vec() {
            if tree[member].outcome.drop {
                continue;
            }
            let value = self.evaluate_number(tree, member, errors);
            if condition.matches(value) {
                tree[member].outcome.critical = Some(critical);
                total += value;
            }
        }
        Value::Number(total)
    }

    pub(super) fn eval_reroll(
        &mut self,
        tree: &mut Tree,
        id: NodeId,
        once: bool,
        errors: &mut Vec<RollError>,
    ) -> Value {
        if !self.expect_children(tree, id, 1, errors) {
            return Value::ZERO;
        }
        let pool = match self.find_pool(tree, id, errors) {
            Some(pool) => pool,
            None => return Value::ZERO,
        };
        let sides = match self.pool_sides(tree, id, pool, errors) {
            Some(sides) => sides,
            None => return Value::ZERO,
        };
        let condition = match self.roll_again_condition(tree, id, sides, Condition::equal(1), errors) {
            Some(condition) => condition,
            None => return Value::ZERO,
        };

        let keep_history = self.options.render_expression_decorators;
        let max_rerolls = (self.options.max_explode - 1).max(0);
        let mut total = Number::ZERO;
        for die in tree.children(pool).to_vec() {
            if tree[die].outcome.drop {
                continue;
            }
            let mut value = die_value(tree, die);
            let mut current = die;
            let mut position = tree.index_of(pool, die).unwrap_or(0);
            let mut rerolls = 0;
            while rerolls < max_rerolls && condition.matches(value) {
                rerolls += 1;
                tree[current].outcome.reroll = true;

                let roll = self.roll_die(sides);
                value = Number::Int(roll);
                if keep_history {
                    tree[current].outcome.drop = true;
                    tree[current].outcome.superseded = true;
                    let next = tree.create(NodeKind::DiceRoll(roll));
                    position += 1;
                    tree.insert_child(pool, position, next);
                    current = next;
                } else {
                    tree[current].kind = NodeKind::DiceRoll(roll);
                }

                if once {
                    break;
                }
            }
            total += value;
        }
        Value::Number(total)
    }

    pub(super) fn eval_sort(
        &mut self,
        tree: &mut Tree,
        id: NodeId,
        direction: SortDirection,
        errors: &mut Vec<RollError>,
    ) -> Value {
        if !self.expect_children(tree, id, 1, errors) {
            return Value::ZERO;
        }
        let pool = match self.find_pool(tree, id, errors) {
            Some(pool) => pool,
            None => return Value::ZERO,
        };
        let (members, total) = self.sorted_members(tree, pool, direction, errors);
        tree.clear_children(pool);
        for member in members {
            tree.add_child(pool, member);
        }
        Value::Number(total)
    }

    /// Flags failures among the kept members and sums them.
    pub(super) fn eval_subtract_failure(
        &mut self,
        tree: &mut Tree,
        id: NodeId,
        errors: &mut Vec<RollError>,
    ) -> Value {
        if !self.expect_children(tree, id, 1, errors) {
            return Value::ZERO;
        }
        let pool = match self.find_pool(tree, id, errors) {
            Some(pool) => pool,
            None => return Value::ZERO,
        };
        let condition = match self.condition(tree, id, errors) {
            Some(Ok(condition)) => condition,
            Some(Err(())) => return Value::ZERO,
            None => Condition::equal(1),
        };

        let mut total = Number::ZERO;
        for member in tree.children(pool).to_vec() {
            if tree[member].outcome.drop {
                continue;
            }
            let value = self.evaluate_number(tree, member, errors);
            tree[member].outcome.failure = Some(condition.matches(value));
            total += value;
        }
        Value::Number(total)
    }

    /// A comparison between two scalars is 1 or 0. Over dice or a group it counts the kept
    /// members that pass, flagging each member's success.
    pub(super) fn eval_compare(
        &mut self,
        tree: &mut Tree,
        id: NodeId,
        op: CompareOp,
        errors: &mut Vec<RollError>,
    ) -> Value {
        if !self.expect_children(tree, id, 2, errors) {
            return Value::ZERO;
        }
        let (lhs, rhs) = (tree.children(id)[0], tree.children(id)[1]);

        if matches!(tree[lhs].kind, NodeKind::Number(_) | NodeKind::Negate) {
            let x = self.evaluate_number(tree, lhs, errors);
            let y = self.evaluate_number(tree, rhs, errors);
            let success = op.holds(&x, &y);
            tree[id].outcome.success = Some(success);
            return Value::from(success as Int);
        }

        let target = self.evaluate_number(tree, rhs, errors);
        let pool = match self.find_pool(tree, id, errors) {
            Some(pool) => pool,
            None => return Value::ZERO,
        };

        let mut successes = 0;
        for member in tree.children(pool).to_vec() {
            if tree[member].outcome.drop {
                continue;
            }
            let value = self.evaluate_number(tree, member, errors);
            let success = op.holds(&value, &target);
            tree[member].outcome.success = Some(success);
            if success {
                successes += 1;
            }
        }
        Value::from(successes as Int)
    }
}

#[cfg(test)]
mod tests {
    use crate::common::test_utils::*;
    use crate::roll::{Interpreter, RollError, SequenceRoller};
    use crate::tree::Outcome;
    use crate::Options;

    struct Rolled {
        tree: Tree,
        value: Value,
        errors: Vec<RollError>,
    }

    impl Rolled {
        fn dice(&self, dice: NodeId) -> Vec<(Int, Outcome)> {
            self.tree
                .children(dice)
                .iter()
                .map(|&die| match self.tree[die].kind {
                    NodeKind::DiceRoll(x) => (x, self.tree[die].outcome.clone()),
                    _ => panic!("not a die: {:?}", self.tree[die].kind),
                })
                .collect()
        }

        fn values(&self, dice: NodeId) -> Vec<Int> {
            self.dice(dice).into_iter().map(|(x, _)| x).collect()
        }

        fn drops(&self, dice: NodeId) -> Vec<bool> {
            self.dice(dice).into_iter().map(|(_, o)| o.drop).collect()
        }

        /// Re-evaluates each die on its own, so dropped dice count as zero.
        fn sum_of_dice(&mut self, dice: NodeId) -> Value {
            let mut interpreter = Interpreter::new(SequenceRoller::default(), Options::default());
            let mut total = Number::ZERO;
            for die in self.tree.children(dice).to_vec() {
                let value = interpreter.evaluate(&mut self.tree, die, &mut self.errors);
                total += value.as_number().unwrap_or(Number::ZERO);
            }
            Value::Number(total)
        }
    }

    fn roll_with(mut tree: Tree, root: NodeId, rolls: &[Int], options: Options) -> Rolled {
        let mut interpreter = Interpreter::new(SequenceRoller::new(rolls.iter().copied()), options);
        let mut errors = Vec::new();
        let value = interpreter.evaluate(&mut tree, root, &mut errors);
        Rolled {
            tree,
            value,
            errors,
        }
    }

    fn roll(tree: Tree, root: NodeId, rolls: &[Int]) -> Rolled {
        roll_with(tree, root, rolls, Options::default())
    }

    /// `num`d`sides` wrapped in `kind`, with an optional second child.
    fn modified(kind: NodeKind, num: Int, sides: Int, arg: Option<Int>) -> (Tree, NodeId, NodeId) {
        let mut tree = Tree::new();
        let dice = tree.dice(num, sides);
        let root = tree.op(kind, &[dice]);
        if let Some(arg) = arg {
            let arg = tree.int(arg);
            tree.add_child(root, arg);
        }
        (tree, root, dice)
    }

    fn check_keep(kind: NodeKind, arg: Option<Int>, rolls: &[Int], value: Int, drops: &[bool]) {
        let (tree, root, dice) = modified(kind.clone(), rolls.len() as Int, 20, arg);
        let rolled = roll(tree, root, rolls);
        assert!(rolled.errors.is_empty(), "{:?}", rolled.errors);
        assert_eq!(rolled.value, Value::from(value), "{:?} {:?}", kind, arg);
        assert_eq!(rolled.drops(dice), drops, "{:?} {:?}", kind, arg);
    }

    const ROLLS: [Int; 5] = [8, 12, 18, 20, 14];

    #[test]
    fn keep_highest() {
        let keep = NodeKind::Keep(KeepType::Highest);
        check_keep(keep.clone(), Some(2), &ROLLS, 38, &[true, true, false, false, true]);
        check_keep(keep, None, &ROLLS, 20, &[true, true, true, false, true]);
    }

    #[test]
    fn keep_lowest() {
        let keep = NodeKind::Keep(KeepType::Lowest);
        check_keep(keep.clone(), Some(2), &ROLLS, 20, &[false, false, true, true, true]);
        check_keep(keep, None, &ROLLS, 8, &[false, true, true, true, true]);
    }

    #[test]
    fn keep_middle() {
        let keep = NodeKind::Keep(KeepType::Middle);
        check_keep(keep.clone(), None, &[1, 3, 5], 3, &[true, false, true]);
        check_keep(keep, Some(2), &ROLLS, 44, &[true, false, false, true, false]);
    }

    #[test]
    fn drop_highest() {
        let drop = NodeKind::Drop(KeepType::Highest);
        check_keep(drop.clone(), Some(2), &ROLLS, 34, &[false, false, true, true, false]);
        check_keep(drop, None, &ROLLS, 52, &[false, false, false, true, false]);
    }

    #[test]
    fn drop_lowest() {
        let drop = NodeKind::Drop(KeepType::Lowest);
        check_keep(drop.clone(), Some(2), &ROLLS, 52, &[true, true, false, false, false]);
        check_keep(drop, None, &ROLLS, 64, &[true, false, false, false, false]);
    }

    #[test]
    fn drop_middle() {
        let drop = NodeKind::Drop(KeepType::Middle);
        check_keep(drop.clone(), None, &[1, 3, 5], 6, &[false, true, false]);
        check_keep(drop, Some(2), &ROLLS, 28, &[false, true, true, false, true]);
    }

    #[test]
    fn dropped_dice_count_as_zero() {
        let (tree, root, dice) = modified(NodeKind::Drop(KeepType::Highest), 5, 20, Some(2));
        let mut rolled = roll(tree, root, &ROLLS);
        assert_eq!(rolled.value, Value::from(34));
        assert_eq!(rolled.sum_of_dice(dice), Value::from(34));
    }

    #[test]
    fn explode() {
        let (tree, root, dice) = modified(NodeKind::Explode { penetrate: false }, 2, 6, None);
        let rolled = roll(tree, root, &[6, 3, 6, 2]);
        assert_eq!(rolled.value, Value::from(17));
        assert_eq!(rolled.values(dice), [6, 6, 2, 3]);
        let exploded: Vec<_> = rolled.dice(dice).into_iter().map(|(_, o)| o.explode).collect();
        assert_eq!(exploded, [true, true, false, false]);
    }

    #[test]
    fn explode_with_condition() {
        let mut tree = Tree::new();
        let dice = tree.dice(2, 6);
        let condition = tree.cond(CompareOp::GreaterOrEqual, 5);
        let root = tree.op(NodeKind::Explode { penetrate: false }, &[dice, condition]);
        let rolled = roll(tree, root, &[5, 1, 2]);
        assert_eq!(rolled.values(dice), [5, 2, 1]);
        assert_eq!(rolled.value, Value::from(8));
    }

    #[test]
    fn penetrating_explode() {
        let (tree, root, dice) = modified(NodeKind::Explode { penetrate: true }, 1, 6, None);
        let rolled = roll(tree, root, &[6, 6, 3]);
        assert_eq!(rolled.values(dice), [6, 5]);
        assert_eq!(rolled.value, Value::from(11));

        let mut tree = Tree::new();
        let dice = tree.dice(1, 6);
        let condition = tree.cond(CompareOp::GreaterOrEqual, 5);
        let root = tree.op(NodeKind::Explode { penetrate: true }, &[dice, condition]);
        let rolled = roll(tree, root, &[6, 6, 5, 2]);
        assert_eq!(rolled.values(dice), [6, 5, 4]);
        assert_eq!(rolled.value, Value::from(15));
    }

    #[test]
    fn explode_is_capped() {
        let (tree, root, dice) = modified(NodeKind::Explode { penetrate: false }, 1, 6, None);
        let rolled = roll_with(tree, root, &[6], Options::default().with_max_explode(5));
        assert_eq!(rolled.values(dice), [6; 5]);
        assert_eq!(rolled.value, Value::from(30));

        let (tree, root, dice) = modified(NodeKind::Explode { penetrate: false }, 1, 6, None);
        let rolled = roll(tree, root, &[6]);
        assert_eq!(rolled.values(dice).len(), Options::DEFAULT_MAX_EXPLODE as usize);
    }

    #[test]
    fn explode_forever_is_rejected() {
        for (op, x) in [
            (CompareOp::Greater, 0),
            (CompareOp::GreaterOrEqual, 1),
            (CompareOp::Less, 7),
            (CompareOp::LessOrEqual, 6),
        ] {
            let mut tree = Tree::new();
            let dice = tree.dice(1, 6);
            let condition = tree.cond(op, x);
            let root = tree.op(NodeKind::Explode { penetrate: false }, &[dice, condition]);
            let rolled = roll(tree, root, &[3]);
            assert_eq!(rolled.errors, [RollError::RollsForever], "{} {}", op, x);
            assert_eq!(rolled.value, Value::ZERO);
        }

        let mut tree = Tree::new();
        let dice = tree.dice(1, 1);
        let condition = tree.cond(CompareOp::Equal, 1);
        let root = tree.op(NodeKind::Explode { penetrate: false }, &[dice, condition]);
        assert_eq!(roll(tree, root, &[1]).errors, [RollError::RollsForever]);
    }

    #[test]
    fn explode_needs_sides() {
        let mut tree = Tree::new();
        let one = tree.int(1);
        let group = tree.op(NodeKind::Group, &[one]);
        let root = tree.op(NodeKind::Explode { penetrate: false }, &[group]);
        let rolled = roll(tree, root, &[]);
        assert_eq!(rolled.errors, [RollError::MissingSides("Explode")]);
    }

    #[test]
    fn reroll() {
        let (tree, root, dice) = modified(NodeKind::Reroll { once: false }, 3, 6, None);
        let rolled = roll(tree, root, &[1, 4, 1, 1, 5, 2]);
        assert_eq!(rolled.values(dice), [5, 4, 2]);
        assert_eq!(rolled.value, Value::from(11));
        let rerolled: Vec<_> = rolled.dice(dice).into_iter().map(|(_, o)| o.reroll).collect();
        assert_eq!(rerolled, [true, false, true]);
    }

    #[test]
    fn reroll_once() {
        let (tree, root, dice) = modified(NodeKind::Reroll { once: true }, 2, 6, None);
        let rolled = roll(tree, root, &[1, 3, 1]);
        assert_eq!(rolled.values(dice), [1, 3]);
        assert_eq!(rolled.value, Value::from(4));
    }

    #[test]
    fn reroll_keeps_history_when_decorating() {
        let (tree, root, dice) = modified(NodeKind::Reroll { once: false }, 2, 6, None);
        let mut rolled =
            roll_with(tree, root, &[1, 4, 1, 6], Options::default().with_decorators(true));
        assert_eq!(rolled.values(dice), [1, 1, 6, 4]);
        assert_eq!(rolled.drops(dice), [true, true, false, false]);
        assert_eq!(rolled.value, Value::from(10));
        assert_eq!(rolled.sum_of_dice(dice), Value::from(10));
    }

    #[test]
    fn reroll_is_capped() {
        let (tree, root, dice) = modified(NodeKind::Reroll { once: false }, 1, 6, None);
        let rolled = roll_with(tree, root, &[1], Options::default().with_max_explode(5));
        assert_eq!(rolled.values(dice), [1]);
        assert_eq!(rolled.value, Value::from(1));

        let (tree, root, dice) = modified(NodeKind::Reroll { once: false }, 1, 6, None);
        let options = Options::default().with_max_explode(5).with_decorators(true);
        let rolled = roll_with(tree, root, &[1], options);
        assert_eq!(rolled.values(dice), [1; 5]);
        assert_eq!(rolled.drops(dice), [true, true, true, true, false]);
    }

    #[test]
    fn keep_after_reroll_ignores_superseded_dice() {
        for decorate in [false, true] {
            let mut tree = Tree::new();
            let dice = tree.dice(2, 6);
            let reroll = tree.op(NodeKind::Reroll { once: false }, &[dice]);
            let one = tree.int(1);
            let root = tree.op(NodeKind::Keep(KeepType::Lowest), &[reroll, one]);
            let options = Options::default().with_decorators(decorate);
            let mut rolled = roll_with(tree, root, &[1, 4, 6], options);
            assert_eq!(rolled.value, Value::from(4), "decorate: {}", decorate);
            assert_eq!(rolled.sum_of_dice(dice), Value::from(4), "decorate: {}", decorate);
        }
    }

    #[test]
    fn reroll_with_condition() {
        let mut tree = Tree::new();
        let dice = tree.dice(2, 6);
        let condition = tree.cond(CompareOp::Less, 3);
        let root = tree.op(NodeKind::Reroll { once: false }, &[dice, condition]);
        let rolled = roll(tree, root, &[2, 5, 1, 3]);
        assert_eq!(rolled.values(dice), [3, 5]);

        let mut tree = Tree::new();
        let dice = tree.dice(2, 6);
        let condition = tree.cond(CompareOp::LessOrEqual, 6);
        let root = tree.op(NodeKind::Reroll { once: false }, &[dice, condition]);
        assert_eq!(roll(tree, root, &[2, 5]).errors, [RollError::RollsForever]);
    }

    #[test]
    fn critical() {
        let (tree, root, dice) = modified(NodeKind::Critical(CriticalType::Success), 3, 20, None);
        let rolled = roll(tree, root, &[20, 7, 20]);
        assert_eq!(rolled.value, Value::from(40));
        let crits: Vec<_> = rolled.dice(dice).into_iter().map(|(_, o)| o.critical).collect();
        assert_eq!(crits, [Some(CriticalType::Success), None, Some(CriticalType::Success)]);

        let (tree, root, dice) = modified(NodeKind::Critical(CriticalType::Failure), 3, 20, None);
        let rolled = roll(tree, root, &[1, 7, 20]);
        assert_eq!(rolled.value, Value::from(1));
        let crits: Vec<_> = rolled.dice(dice).into_iter().map(|(_, o)| o.critical).collect();
        assert_eq!(crits, [Some(CriticalType::Failure), None, None]);
    }

    #[test]
    fn critical_with_condition() {
        let mut tree = Tree::new();
        let dice = tree.dice(3, 20);
        let condition = tree.cond(CompareOp::GreaterOrEqual, 19);
        let root = tree.op(NodeKind::Critical(CriticalType::Success), &[dice, condition]);
        let rolled = roll(tree, root, &[19, 18, 20]);
        assert_eq!(rolled.value, Value::from(39));
    }

    #[test]
    fn sort() {
        let (tree, root, dice) = modified(NodeKind::Sort(SortDirection::Ascending), 4, 6, None);
        let rolled = roll(tree, root, &[4, 1, 6, 3]);
        assert_eq!(rolled.values(dice), [1, 3, 4, 6]);
        assert_eq!(rolled.value, Value::from(14));

        let (tree, root, dice) = modified(NodeKind::Sort(SortDirection::Descending), 4, 6, None);
        let rolled = roll(tree, root, &[4, 1, 6, 3]);
        assert_eq!(rolled.values(dice), [6, 4, 3, 1]);
    }

    #[test]
    fn subtract_failure() {
        let mut tree = Tree::new();
        let dice = tree.dice(4, 6);
        let six = tree.int(6);
        let compare = tree.op(NodeKind::Compare(CompareOp::Equal), &[dice, six]);
        let root = tree.op(NodeKind::SubtractFailure, &[compare]);
        let rolled = roll(tree, root, &[1, 6, 6, 2]);
        assert!(rolled.errors.is_empty());
        assert_eq!(rolled.value, Value::from(15));
        let failures: Vec<_> = rolled.dice(dice).into_iter().map(|(_, o)| o.failure).collect();
        assert_eq!(failures, [Some(true), Some(false), Some(false), Some(false)]);
    }

    #[test]
    fn subtract_failure_with_number() {
        let mut tree = Tree::new();
        let dice = tree.dice(4, 6);
        let six = tree.int(6);
        let compare = tree.op(NodeKind::Compare(CompareOp::Equal), &[dice, six]);
        let three = tree.int(3);
        let root = tree.op(NodeKind::SubtractFailure, &[compare, three]);
        let rolled = roll(tree, root, &[2, 6, 6, 3]);
        assert_eq!(rolled.value, Value::from(17));
        let failures: Vec<_> = rolled.dice(dice).into_iter().map(|(_, o)| o.failure).collect();
        assert_eq!(failures, [Some(false), Some(false), Some(false), Some(true)]);
    }

    #[test]
    fn success_over_dice() {
        let mut tree = Tree::new();
        let dice = tree.dice(5, 20);
        let ten = tree.int(10);
        let root = tree.op(NodeKind::Compare(CompareOp::Greater), &[dice, ten]);
        let rolled = roll(tree, root, &[8, 12, 6, 20, 14]);
        assert_eq!(rolled.value, Value::from(3));
        let successes: Vec<_> = rolled.dice(dice).into_iter().map(|(_, o)| o.success).collect();
        assert_eq!(successes, [Some(false), Some(true), Some(false), Some(true), Some(true)]);
    }

    #[test]
    fn success_target_rolls_before_the_pool() {
        let mut tree = Tree::new();
        let dice = tree.dice(2, 6);
        let target = tree.dice(1, 6);
        let root = tree.op(NodeKind::Compare(CompareOp::Greater), &[dice, target]);
        let rolled = roll(tree, root, &[1, 2, 3]);
        assert_eq!(rolled.values(target), [1]);
        assert_eq!(rolled.values(dice), [2, 3]);
        assert_eq!(rolled.value, Value::from(2));
    }

    #[test]
    fn success_skips_dropped_dice() {
        let mut tree = Tree::new();
        let dice = tree.dice(2, 20);
        let keep = tree.op(NodeKind::Keep(KeepType::Lowest), &[dice]);
        let fourteen = tree.int(14);
        let root = tree.op(NodeKind::Compare(CompareOp::Greater), &[keep, fourteen]);
        let rolled = roll(tree, root, &[20, 15]);
        assert_eq!(rolled.value, Value::from(1));
        let successes: Vec<_> = rolled.dice(dice).into_iter().map(|(_, o)| o.success).collect();
        assert_eq!(successes, [None, Some(true)]);
    }

    #[test]
    fn scalar_comparisons() {
        for (lhs, rhs, expected) in [(20, 10, 1), (5, 10, 0)] {
            let mut tree = Tree::new();
            let lhs = tree.int(lhs);
            let rhs = tree.int(rhs);
            let root = tree.op(NodeKind::Compare(CompareOp::Greater), &[lhs, rhs]);
            let rolled = roll(tree, root, &[]);
            assert_eq!(rolled.value, Value::from(expected));
            assert_eq!(rolled.tree[root].outcome.success, Some(expected == 1));
        }

        let mut tree = Tree::new();
        let twenty = tree.int(20);
        let ten = tree.int(10);
        let minus_ten = tree.op(NodeKind::Negate, &[ten]);
        let root = tree.op(NodeKind::Compare(CompareOp::Greater), &[twenty, minus_ten]);
        let rolled = roll(tree, root, &[]);
        assert_eq!(rolled.value, Value::from(1));

        let mut tree = Tree::new();
        let ten = tree.int(10);
        let minus_ten = tree.op(NodeKind::Negate, &[ten]);
        let zero = tree.int(0);
        let root = tree.op(NodeKind::Compare(CompareOp::Less), &[minus_ten, zero]);
        assert_eq!(roll(tree, root, &[]).value, Value::from(1));
    }

    #[test]
    fn modifiers_need_a_pool() {
        let mut tree = Tree::new();
        let one = tree.int(1);
        let root = tree.op(NodeKind::Keep(KeepType::Highest), &[one]);
        let rolled = roll(tree, root, &[]);
        assert_eq!(rolled.value, Value::ZERO);
        assert_eq!(rolled.errors, [RollError::MissingPool("Keep")]);
    }

    #[test]
    fn conditions_must_compare() {
        let mut tree = Tree::new();
        let dice = tree.dice(2, 6);
        let group = tree.create(NodeKind::Group);
        let root = tree.op(NodeKind::Critical(CriticalType::Success), &[dice, group]);
        let rolled = roll(tree, root, &[6, 6]);
        assert_eq!(rolled.errors, [RollError::NotAComparison("Group")]);
    }

    #[test]
    fn keep_over_group() {
        let mut tree = Tree::new();
        let a = tree.dice(1, 6);
        let b = tree.int(4);
        let c = tree.dice(1, 8);
        let group = tree.op(NodeKind::Group, &[a, b, c]);
        let root = tree.op(NodeKind::Keep(KeepType::Highest), &[group]);
        let rolled = roll(tree, root, &[2, 7]);
        assert_eq!(rolled.value, Value::from(7));
        let drops: Vec<_> = [a, b, c]
            .iter()
            .map(|&member| rolled.tree[member].outcome.drop)
            .collect();
        assert_eq!(drops, [true, true, false]);
    }
}
