use crate::common::*;
use crate::tree::{NodeId, NodeKind, Tree};

const POSTFIX: u8 = 6;

/// How tightly `id` binds when written out; looser children of an operator get parentheses.
fn precedence(tree: &Tree, id: NodeId) -> u8 {
    let node = &tree[id];
    match &node.kind {
        NodeKind::Compare(_) if node.child_count() >= 2 => 1,
        NodeKind::Binary(op) => op.precedence(),
        NodeKind::Negate => 5,
        kind if kind.is_modifier() => node.child(0).map_or(POSTFIX, |target| precedence(tree, target)),
        _ => POSTFIX,
    }
}

/// Renders an expression tree back to notation. Evaluated dice show their results.
pub trait Stringify {
    fn str_tree(&mut self, tree: &Tree) -> String {
        tree.root()
            .map_or_else(String::new, |root| self.stringify(tree, root))
    }

    fn stringify(&mut self, tree: &Tree, id: NodeId) -> String {
        let node = match tree.get(id) {
            Some(node) => node,
            None => return String::new(),
        };

        match &node.kind {
            NodeKind::Number(x) => x.to_string(),
            NodeKind::String(s) => format!("\"{}\"", s),
            NodeKind::DiceSides(sides) => sides.to_string(),
            NodeKind::DiceRoll(x) => self.str_die(tree, id, *x),
            NodeKind::Dice { .. } => self.str_dice(tree, id),
            NodeKind::Binary(op) => self.str_binary(tree, id, *op),
            NodeKind::Negate => self.str_negate(tree, id),
            NodeKind::Compare(op) => self.str_compare(tree, id, *op),
            NodeKind::Group => self.str_group(tree, id),
            NodeKind::Repeat => self.str_repeat(tree, id),
            NodeKind::Function(name) => self.str_function(tree, id, name),
            NodeKind::Explode { .. }
            | NodeKind::Keep(_)
            | NodeKind::Drop(_)
            | NodeKind::Critical(_)
            | NodeKind::Reroll { .. }
            | NodeKind::Sort(_)
            | NodeKind::SubtractFailure => self.str_modifier(tree, id),
        }
    }

    /// Renders `id`, parenthesized if it binds looser than `min`.
    fn str_operand(&mut self, tree: &Tree, id: NodeId, min: u8) -> String {
        let ret = self.stringify(tree, id);
        if precedence(tree, id) < min {
            format!("({})", ret)
        } else {
            ret
        }
    }

    /// Renders a dice count, dice sides or repeat count, parenthesized unless it is a literal.
    fn str_literal(&mut self, tree: &Tree, id: NodeId) -> String {
        let ret = self.stringify(tree, id);
        match tree[id].kind {
            NodeKind::Number(_) | NodeKind::DiceSides(_) => ret,
            _ => format!("({})", ret),
        }
    }

    fn str_die(&mut self, tree: &Tree, id: NodeId, value: Int) -> String {
        value.to_string() + &self.str_outcome(tree, id)
    }

    /// Markers for what happened to a die or group member. Nothing by default.
    fn str_outcome(&mut self, _tree: &Tree, _id: NodeId) -> String {
        String::new()
    }

    fn str_dice(&mut self, tree: &Tree, id: NodeId) -> String {
        let node = &tree[id];
        if let NodeKind::Dice { sides: Some(_) } = node.kind {
            let rolls: Vec<_> = node
                .children()
                .iter()
                .map(|&die| self.stringify(tree, die))
                .collect();
            format!("[{}]", rolls.join(", "))
        } else {
            let count = node
                .child(0)
                .map(|count| self.str_literal(tree, count))
                .unwrap_or_default();
            let sides = node
                .child(1)
                .map(|sides| self.str_literal(tree, sides))
                .unwrap_or_default();
            format!("{}d{}", count, sides)
        }
    }

    fn str_binary(&mut self, tree: &Tree, id: NodeId, op: BinaryOperator) -> String {
        let (lhs, rhs) = match tree.children(id) {
            [lhs, rhs, ..] => (*lhs, *rhs),
            _ => return op.to_string(),
        };
        let prec = op.precedence();
        let (min_lhs, min_rhs) = match op {
            BinaryOperator::Exponent => (prec + 1, prec),
            _ => (prec, prec + 1),
        };
        let l = self.str_operand(tree, lhs, min_lhs);
        let r = self.str_operand(tree, rhs, min_rhs);
        format!("{} {} {}", l, op, r)
    }

    fn str_negate(&mut self, tree: &Tree, id: NodeId) -> String {
        let operand = tree
            .child(id, 0)
            .map(|operand| self.str_operand(tree, operand, 5))
            .unwrap_or_default();
        format!("-{}", operand)
    }

    fn str_compare(&mut self, tree: &Tree, id: NodeId, op: CompareOp) -> String {
        let (lhs, rhs) = match tree.children(id) {
            [lhs, rhs, ..] => (*lhs, *rhs),
            _ => return self.str_condition(tree, id),
        };
        let l = self.str_operand(tree, lhs, 2);
        let r = self.str_operand(tree, rhs, 2);
        let mut ret = format!("{} {} {}", l, op, r);

        let wrapped = tree
            .parent(id)
            .map_or(false, |parent| tree[parent].kind == NodeKind::SubtractFailure);
        if !wrapped {
            ret.push_str(&self.str_difficulty(tree, id));
        }
        ret
    }

    /// The ` | Difficulty: op target` suffix of a comparison evaluated over dice or a group.
    fn str_difficulty(&mut self, tree: &Tree, id: NodeId) -> String {
        let node = &tree[id];
        match (&node.kind, node.child(0), node.child(1)) {
            (NodeKind::Compare(op), Some(lhs), Some(rhs))
                if node.value.is_some()
                    && node.outcome.success.is_none()
                    && !matches!(tree[lhs].kind, NodeKind::Number(_) | NodeKind::Negate) =>
            {
                format!(" | Difficulty: {} {}", op, self.stringify(tree, rhs))
            }
            _ => String::new(),
        }
    }

    /// Renders a modifier argument inline: `<3`, `>=19`, or a bare number for equality.
    fn str_condition(&mut self, tree: &Tree, id: NodeId) -> String {
        match tree[id].kind {
            NodeKind::Compare(op) => {
                let operand = match tree.child(id, 0) {
                    Some(operand) => operand,
                    None => return op.to_string(),
                };
                let bare = matches!(tree[operand].kind, NodeKind::Number(_));
                let operand = self.stringify(tree, operand);
                if op == CompareOp::Equal && bare {
                    operand
                } else {
                    format!("{}{}", op, operand)
                }
            }
            _ => self.stringify(tree, id),
        }
    }

    fn str_modifier(&mut self, tree: &Tree, id: NodeId) -> String {
        let node = &tree[id];
        let code = match node.kind {
            NodeKind::Explode { penetrate: false } => "!".to_string(),
            NodeKind::Explode { penetrate: true } => "!!".to_string(),
            NodeKind::Keep(keep) => format!("k{}", keep),
            NodeKind::Drop(drop) => format!("d{}", drop),
            NodeKind::Critical(critical) => format!("c{}", critical),
            NodeKind::Reroll { once: false } => "r".to_string(),
            NodeKind::Reroll { once: true } => "ro".to_string(),
            NodeKind::Sort(direction) => format!("s{}", direction),
            NodeKind::SubtractFailure => "f".to_string(),
            _ => String::new(),
        };
        let subtract_failure = node.kind == NodeKind::SubtractFailure;

        let target = match node.child(0) {
            Some(target) if subtract_failure => self.stringify(tree, target),
            Some(target) => self.str_operand(tree, target, POSTFIX),
            None => String::new(),
        };
        let argument = node
            .child(1)
            .map(|argument| self.str_condition(tree, argument))
            .unwrap_or_default();

        let mut ret = format!("{}{}{}", target, code, argument);
        if let (true, Some(target)) = (subtract_failure, node.child(0)) {
            ret.push_str(&self.str_difficulty(tree, target));
        }
        ret
    }

    fn str_group(&mut self, tree: &Tree, id: NodeId) -> String {
        let node = &tree[id];
        if let [only] = node.children() {
            if tree[*only].kind == NodeKind::Repeat {
                return self.str_repeat(tree, *only);
            }
        }

        let evaluated = node.value.is_some();
        let members: Vec<_> = node
            .children()
            .iter()
            .map(|&member| {
                let ret = self.stringify(tree, member);
                let outcome = self.str_outcome(tree, member);
                match (&tree[member].kind, &tree[member].value) {
                    (NodeKind::Number(_) | NodeKind::String(_), _) => ret + &outcome,
                    (_, Some(value)) if evaluated => format!("{} = {}{}", ret, value, outcome),
                    _ => ret,
                }
            })
            .collect();

        if evaluated {
            format!("{{{}}}", members.join("; "))
        } else {
            format!("{{{}}}", members.join(", "))
        }
    }

    fn str_repeat(&mut self, tree: &Tree, id: NodeId) -> String {
        let body = tree
            .child(id, 0)
            .map(|body| self.stringify(tree, body))
            .unwrap_or_default();
        let times = tree
            .child(id, 1)
            .map(|times| self.str_literal(tree, times))
            .unwrap_or_default();
        format!("{{{}}}{}", body, times)
    }

    fn str_function(&mut self, tree: &Tree, id: NodeId, name: &str) -> String {
        let args: Vec<_> = tree
            .children(id)
            .iter()
            .map(|&arg| self.stringify(tree, arg))
            .collect();
        format!("{}({})", name, args.join(", "))
    }
}

/// Plain notation with rolled values in place of evaluated dice.
#[derive(Debug, Default)]
pub struct SimpleStringifier;

impl Stringify for SimpleStringifier {}

/// Like [`SimpleStringifier`], but marks what happened to each die: `!` exploded, `r` rerolled,
/// `d` dropped, `*` success, `_` failure, `**` critical success, `__` critical failure.
#[derive(Debug, Default)]
pub struct DecoratedStringifier;

impl Stringify for DecoratedStringifier {
    fn str_outcome(&mut self, tree: &Tree, id: NodeId) -> String {
        let outcome = &tree[id].outcome;
        let mut ret = String::new();
        if outcome.explode {
            ret.push('!');
        }
        if outcome.reroll {
            ret.push('r');
        }
        if outcome.drop {
            if !outcome.reroll {
                ret.push('d');
            }
            return ret;
        }
        if outcome.success == Some(true) {
            ret.push('*');
        }
        if outcome.failure == Some(true) {
            ret.push('_');
        }
        match outcome.critical {
            Some(CriticalType::Success) => ret.push_str("**"),
            Some(CriticalType::Failure) => ret.push_str("__"),
            None => {}
        }
        ret
    }
}
