//! Post-resolution modifiers: forced onsets, forced rests, rotation.

use std::fmt;

use super::{Pattern, StepValue, MAX_STEPS};

/// `on`/`off` cannot be applied to a pattern that carries notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierError {
    MelodicPattern,
}

impl fmt::Display for ModifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModifierError::MelodicPattern => {
                write!(f, "on/off modifiers only apply to rhythmic patterns")
            }
        }
    }
}

impl std::error::Error for ModifierError {}

impl Pattern {
    /// Force the 1-indexed `positions` to hits, growing the pattern with
    /// rests when a position lies past the end. Positions below 1 are
    /// ignored.
    pub fn apply_on(&mut self, positions: &[i64]) -> Result<(), ModifierError> {
        if self.is_melodic() {
            return Err(ModifierError::MelodicPattern);
        }
        for &pos in positions {
            if pos < 1 {
                continue;
            }
            let idx = (pos.min(MAX_STEPS as i64) - 1) as usize;
            if idx >= self.steps.len() {
                self.steps.resize(idx + 1, StepValue::Rest);
            }
            self.steps[idx] = StepValue::Hit;
        }
        Ok(())
    }

    /// Force the 1-indexed `positions` to rests. Positions outside the
    /// pattern are ignored.
    pub fn apply_off(&mut self, positions: &[i64]) -> Result<(), ModifierError> {
        if self.is_melodic() {
            return Err(ModifierError::MelodicPattern);
        }
        for &pos in positions {
            if pos < 1 {
                continue;
            }
            if let Some(step) = self.steps.get_mut((pos - 1) as usize) {
                *step = StepValue::Rest;
            }
        }
        Ok(())
    }

    /// Rotate left by `offset` steps. Negative offsets rotate right.
    pub fn apply_offset(&self, offset: i64) -> Pattern {
        let len = self.steps.len();
        if len == 0 || offset == 0 {
            return self.clone();
        }
        let shift = offset.rem_euclid(len as i64) as usize;
        let mut steps = self.steps.clone();
        steps.rotate_left(shift);
        Pattern { steps }
    }
}
