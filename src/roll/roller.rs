use crate::common::Int;
use rand::Rng;

/// A source of die results.
pub trait Roller {
    /// Returns a value in `[min, max]`. Callers guarantee `min <= max`.
    fn number_between(&mut self, min: Int, max: Int) -> Int;
}

impl<R: Rng> Roller for R {
    fn number_between(&mut self, min: Int, max: Int) -> Int {
        self.gen_range(min..=max)
    }
}

/// Replays a fixed list of results, cycling back to the start once exhausted.
///
/// Values outside the requested range are clamped into it.
#[derive(Debug, Clone, Default)]
pub struct SequenceRoller {
    values: Vec<Int>,
    position: usize,
}

impl SequenceRoller {
    pub fn new(values: impl IntoIterator<Item = Int>) -> Self {
        Self {
            values: values.into_iter().collect(),
            position: 0,
        }
    }

    /// How many values have been handed out so far.
    pub fn rolled(&self) -> usize {
        self.position
    }
}

impl Roller for SequenceRoller {
    fn number_between(&mut self, min: Int, max: Int) -> Int {
        if self.values.is_empty() {
            return min;
        }
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value.clamp(min, max)
    }
}
