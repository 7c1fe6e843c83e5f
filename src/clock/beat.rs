//! Musical time in integer ticks.
//!
//! 960 ticks per quarter note, so a sixteenth-note step is exactly 240
//! ticks. Positions stay integral; frames are computed only when a step is
//! scheduled.

pub const TICKS_PER_BEAT: u64 = 960;

/// Ticks in one sixteenth-note step.
pub const TICKS_PER_STEP: u64 = TICKS_PER_BEAT / 4;

pub const DEFAULT_BEATS_PER_BAR: u32 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Beat {
    ticks: u64,
}

impl Beat {
    pub const ZERO: Beat = Beat { ticks: 0 };

    pub fn from_ticks(ticks: u64) -> Self {
        Self { ticks }
    }

    pub fn from_beats(beats: u32) -> Self {
        Self {
            ticks: beats as u64 * TICKS_PER_BEAT,
        }
    }

    /// The start of global step `step`.
    pub fn from_steps(step: u64) -> Self {
        Self {
            ticks: step.saturating_mul(TICKS_PER_STEP),
        }
    }

    pub fn ticks(self) -> u64 {
        self.ticks
    }

    pub fn as_beats_f64(self) -> f64 {
        self.ticks as f64 / TICKS_PER_BEAT as f64
    }

    /// Index of the first step that starts at or after this position.
    pub fn next_step(self) -> u64 {
        self.ticks.div_ceil(TICKS_PER_STEP)
    }

    /// Frames spanned by this many ticks: `ticks * 60 * sr / (960 * bpm)`.
    pub fn to_frames(self, bpm: f64, sample_rate: u32) -> u64 {
        let numerator = self.ticks as f64 * 60.0 * sample_rate as f64;
        let denominator = TICKS_PER_BEAT as f64 * bpm;
        (numerator / denominator).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_is_a_sixteenth() {
        assert_eq!(Beat::from_steps(4), Beat::from_beats(1));
        assert_eq!(Beat::from_steps(1).ticks(), 240);
    }

    #[test]
    fn next_step_rounds_up() {
        assert_eq!(Beat::ZERO.next_step(), 0);
        assert_eq!(Beat::from_ticks(1).next_step(), 1);
        assert_eq!(Beat::from_ticks(240).next_step(), 1);
        assert_eq!(Beat::from_ticks(241).next_step(), 2);
    }

    #[test]
    fn frames_at_120_bpm() {
        // one beat = 0.5 s
        assert_eq!(Beat::from_beats(1).to_frames(120.0, 44100), 22050);
        assert_eq!(Beat::from_steps(1).to_frames(120.0, 48000), 6000);
    }
}
