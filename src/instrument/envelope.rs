//! ADSR envelope.

use serde::Deserialize;

/// Attack-decay-sustain-release envelope. Times are in seconds, `sustain`
/// is a level in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AdsrEnvelope {
    pub attack: f64,
    pub decay: f64,
    #[serde(default)]
    pub sustain: f64,
    pub release: f64,
}

impl AdsrEnvelope {
    pub const fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Gain at `t` seconds into a note held for `held` seconds.
    ///
    /// Release starts from whatever level the envelope had reached when the
    /// note was let go, so short notes don't jump to the sustain level.
    pub fn amplitude(&self, t: f64, held: f64) -> f64 {
        if t < 0.0 {
            return 0.0;
        }
        if t < held {
            return self.level_while_held(t);
        }
        if self.release <= 0.0 {
            return 0.0;
        }
        let released = (t - held) / self.release;
        if released >= 1.0 {
            return 0.0;
        }
        self.level_while_held(held) * (1.0 - released)
    }

    fn level_while_held(&self, t: f64) -> f64 {
        let sustain = self.sustain.clamp(0.0, 1.0);
        if t < self.attack {
            return t / self.attack;
        }
        let t = t - self.attack.max(0.0);
        if t < self.decay {
            return 1.0 - (t / self.decay) * (1.0 - sustain);
        }
        sustain
    }

    /// Length of the sound including the release tail.
    pub fn total_duration(&self, held: f64) -> f64 {
        held + self.release.max(0.0)
    }
}

impl Default for AdsrEnvelope {
    fn default() -> Self {
        Self::new(0.005, 0.1, 0.3, 1.0)
    }
}
