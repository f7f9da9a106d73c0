use crate::common::Int;

/// Limits and rendering switches for an [`Interpreter`](crate::Interpreter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// The most dice a single dice expression may roll. Unlimited if `None`.
    pub max_roll_times: Option<Int>,
    /// The most sides a die may have. Unlimited if `None`.
    pub max_dice_sides: Option<Int>,
    /// Caps how many dice one die may turn into by exploding or rerolling.
    pub max_explode: Int,
    /// Marks dropped, exploded, rerolled, successful and critical dice in the rendered output,
    /// and keeps superseded rerolls visible.
    pub render_expression_decorators: bool,
}

impl Options {
    pub const DEFAULT_MAX_EXPLODE: Int = 1000;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_roll_times(mut self, max: Int) -> Self {
        self.max_roll_times = Some(max);
        self
    }

    pub fn with_max_dice_sides(mut self, max: Int) -> Self {
        self.max_dice_sides = Some(max);
        self
    }

    pub fn with_max_explode(mut self, max: Int) -> Self {
        self.max_explode = max;
        self
    }

    pub fn with_decorators(mut self, render: bool) -> Self {
        self.render_expression_decorators = render;
        self
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_roll_times: None,
            max_dice_sides: None,
            max_explode: Self::DEFAULT_MAX_EXPLODE,
            render_expression_decorators: false,
        }
    }
}
