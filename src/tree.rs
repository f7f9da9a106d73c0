//! An arena-backed expression tree.
//!
//! Nodes are owned by a [`Tree`] and referred to by [`NodeId`]. Each node knows its parent, so the
//! interpreter can restructure the tree while evaluating it: dice replace their operands with the
//! rolled results, explosions and rerolls insert new results next to old ones, and repeats swap
//! themselves out for copies of their body.

use crate::common::*;
use crate::roll::num::{Number, Value};
use id_arena::{Arena, Id};
use std::ops::{Index, IndexMut};

pub type NodeId = Id<Node>;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Number(Number),
    String(String),
    /// The sides operand of a dice literal.
    DiceSides(Sides),
    /// A single rolled result.
    DiceRoll(Int),
    /// `sides` is filled in once the dice have been rolled.
    Dice { sides: Option<Sides> },
    Binary(BinaryOperator),
    Negate,
    Compare(CompareOp),
    Explode { penetrate: bool },
    Keep(KeepType),
    Drop(KeepType),
    Critical(CriticalType),
    Reroll { once: bool },
    Sort(SortDirection),
    SubtractFailure,
    Group,
    Repeat,
    Function(String),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Number(_) => "Number",
            Self::String(_) => "String",
            Self::DiceSides(_) => "DiceSides",
            Self::DiceRoll(_) => "DiceRoll",
            Self::Dice { .. } => "Dice",
            Self::Binary(BinaryOperator::Add) => "Add",
            Self::Binary(BinaryOperator::Subtract) => "Subtract",
            Self::Binary(BinaryOperator::Multiply) => "Multiply",
            Self::Binary(BinaryOperator::Divide) => "Divide",
            Self::Binary(BinaryOperator::Modulo) => "Modulo",
            Self::Binary(BinaryOperator::Exponent) => "Exponent",
            Self::Negate => "Negate",
            Self::Compare(_) => "Compare",
            Self::Explode { .. } => "Explode",
            Self::Keep(_) => "Keep",
            Self::Drop(_) => "Drop",
            Self::Critical(_) => "Critical",
            Self::Reroll { .. } => "Reroll",
            Self::Sort(_) => "Sort",
            Self::SubtractFailure => "SubtractFailure",
            Self::Group => "Group",
            Self::Repeat => "Repeat",
            Self::Function(_) => "Function",
        }
    }

    /// Terminals carry their value in the kind itself.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Number(_) | Self::DiceSides(_) | Self::DiceRoll(_))
    }

    /// Dice and groups are the collections modifiers operate on.
    pub fn is_pool(&self) -> bool {
        matches!(self, Self::Dice { .. } | Self::Group)
    }

    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Self::Explode { .. }
                | Self::Keep(_)
                | Self::Drop(_)
                | Self::Critical(_)
                | Self::Reroll { .. }
                | Self::Sort(_)
                | Self::SubtractFailure
        )
    }
}

/// Flags the interpreter sets on individual dice and group members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub drop: bool,
    pub success: Option<bool>,
    pub failure: Option<bool>,
    pub critical: Option<CriticalType>,
    pub reroll: bool,
    pub explode: bool,
    /// Replaced by a reroll but kept for display. Always dropped, and never selected again.
    pub superseded: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Memoized result, set the first time the node is evaluated.
    pub value: Option<Value>,
    pub outcome: Outcome,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            value: None,
            outcome: Outcome::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn child(&self, index: usize) -> Option<NodeId> {
        self.children.get(index).copied()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Copies the kind, value and flags, but not the links.
    fn detached_copy(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            value: self.value.clone(),
            outcome: self.outcome.clone(),
            parent: None,
            children: Vec::with_capacity(self.children.len()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Arena<Node>,
    root: Option<NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.detach(id);
        self.root = Some(id);
    }

    /// Allocates a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.alloc(Node::new(kind))
    }

    /// `None` if `id` belongs to another tree.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], Node::children)
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.get(id).and_then(|node| node.child(index))
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    pub fn index_of(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Visits the children of `id` left to right.
    pub fn for_each_child(&self, id: NodeId, mut f: impl FnMut(usize, NodeId, &Node)) {
        for (index, &child) in self.children(id).iter().enumerate() {
            f(index, child, &self[child]);
        }
    }

    /// Appends `child` to `parent`, detaching it from wherever it was.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.child_count(parent);
        self.insert_child(parent, index, child);
    }

    /// Inserts `child` at `index` (clamped to the child count), detaching it from wherever it
    /// was.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self[parent].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self[child].parent = Some(parent);
    }

    /// Returns whether `child` was a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        match self.index_of(parent, child) {
            Some(index) => {
                self[parent].children.remove(index);
                self[child].parent = None;
                true
            }
            None => false,
        }
    }

    pub fn clear_children(&mut self, parent: NodeId) {
        let children = std::mem::take(&mut self[parent].children);
        for child in children {
            self[child].parent = None;
        }
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.remove_child(parent, id);
        }
        if self.root == Some(id) {
            self.root = None;
        }
    }

    /// Deep-copies the subtree under `id` into a new detached subtree of this arena.
    pub fn copy_subtree(&mut self, id: NodeId) -> NodeId {
        let copy = self.nodes.alloc(self[id].detached_copy());
        let children = self[id].children.clone();
        for child in children {
            let child = self.copy_subtree(child);
            self.add_child(copy, child);
        }
        copy
    }

    /// A compacted, independent copy of everything reachable from the root, in a fresh arena.
    pub fn copy(&self) -> Tree {
        match self.root {
            Some(root) => self.subtree(root),
            None => Tree::new(),
        }
    }

    /// A compacted, independent tree rooted at a copy of `id`.
    pub fn subtree(&self, id: NodeId) -> Tree {
        let mut tree = Tree::new();
        let root = tree.copy_from(self, id);
        tree.root = Some(root);
        tree
    }

    fn copy_from(&mut self, source: &Tree, id: NodeId) -> NodeId {
        let node = &source[id];
        let copy = self.nodes.alloc(node.detached_copy());
        for &child in node.children() {
            let child = self.copy_from(source, child);
            self[child].parent = Some(copy);
            self[copy].children.push(child);
        }
        copy
    }

    /// The number of nodes reachable from the root.
    pub fn len(&self) -> usize {
        fn count(tree: &Tree, id: NodeId) -> usize {
            1 + tree.children(id).iter().map(|&c| count(tree, c)).sum::<usize>()
        }
        self.root.map_or(0, |root| count(self, root))
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }
}

impl IndexMut<NodeId> for Tree {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }
}
