//! Patterns: abstract specs (pulse, euclid, on, arp) and the concrete step
//! sequences they resolve to.
//!
//! A [`PatternSpec`] records what the user asked for. [`resolve`] turns it
//! into a [`Pattern`]: a fixed-length run of [`StepValue`]s that the clock
//! indexes with the global step counter. Modifiers (`on`, `off`, rotation)
//! operate on the resolved pattern, never on the spec.

pub mod modify;
pub mod resolve;

pub use modify::ModifierError;
pub use resolve::{euclid, generate_on, pulse, resolve, ARP_SUBSTEPS, ARP_OCTAVE};

use std::fmt;

/// Default slot count for `pulse(n)` / `euclid(k)` and the minimum length of
/// an `on(...)` pattern.
pub const DEFAULT_STEPS: u32 = 16;

/// Upper bound on a pattern's length. Larger requests are clamped.
pub const MAX_STEPS: u32 = 1024;

/// One slot of a resolved pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StepValue {
    Rest,
    Hit,
    /// A pitch with octave, e.g. `"E4"`.
    Note(String),
}

impl StepValue {
    pub fn is_rest(&self) -> bool {
        matches!(self, StepValue::Rest)
    }
}

/// What a track's pattern was built from.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternSpec {
    Pulse { hits: u32, steps: u32 },
    Euclid { k: u32, n: u32 },
    /// 1-indexed onset positions.
    On { steps: Vec<i64> },
    /// 1-indexed scale degrees.
    Arp { degrees: Vec<i64> },
}

impl PatternSpec {
    /// Whether resolving this spec depends on the session key and scale.
    pub fn is_tonal(&self) -> bool {
        matches!(self, PatternSpec::Arp { .. })
    }
}

impl fmt::Display for PatternSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |values: &[i64]| {
            values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(",")
        };
        match self {
            PatternSpec::Pulse { hits, steps } => write!(f, "pulse({hits},{steps})"),
            PatternSpec::Euclid { k, n } => write!(f, "euclid({k},{n})"),
            PatternSpec::On { steps } => write!(f, "on({})", join(steps)),
            PatternSpec::Arp { degrees } => write!(f, "arp({})", join(degrees)),
        }
    }
}

/// A resolved, fixed-length step sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern {
    steps: Vec<StepValue>,
}

impl Pattern {
    pub fn new(steps: Vec<StepValue>) -> Self {
        Self { steps }
    }

    /// A pattern of `len` rests.
    pub fn silent(len: usize) -> Self {
        Self {
            steps: vec![StepValue::Rest; len],
        }
    }

    /// Build a rhythmic pattern from on/off flags.
    pub fn from_hits(hits: impl IntoIterator<Item = bool>) -> Self {
        Self {
            steps: hits
                .into_iter()
                .map(|on| if on { StepValue::Hit } else { StepValue::Rest })
                .collect(),
        }
    }

    pub fn steps(&self) -> &[StepValue] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StepValue> {
        self.steps.get(index)
    }

    /// The value at `global_step` modulo the pattern length.
    pub fn at_global(&self, global_step: u64) -> Option<&StepValue> {
        if self.steps.is_empty() {
            return None;
        }
        self.steps.get((global_step % self.steps.len() as u64) as usize)
    }

    /// Melodic iff any slot holds a note.
    pub fn is_melodic(&self) -> bool {
        self.steps.iter().any(|s| matches!(s, StepValue::Note(_)))
    }

    /// Indices of non-rest slots.
    pub fn onsets(&self) -> Vec<usize> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_rest())
            .map(|(i, _)| i)
            .collect()
    }

    /// Compact grid rendering: `x` hit, `.` rest, `o` note.
    pub fn grid(&self) -> String {
        self.steps
            .iter()
            .map(|s| match s {
                StepValue::Rest => '.',
                StepValue::Hit => 'x',
                StepValue::Note(_) => 'o',
            })
            .collect()
    }
}
