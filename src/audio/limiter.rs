//! Soft-knee limiter on the master output.
//!
//! Summed tracks routinely peak above full scale. Samples below the knee
//! pass untouched; above it they are bent with `tanh` so the output
//! approaches the ceiling without ever crossing it.

/// Fraction of the ceiling where compression begins.
const KNEE_RATIO: f32 = 0.8;

#[derive(Debug, Clone, Copy)]
pub struct Limiter {
    ceiling: f32,
    knee: f32,
}

impl Limiter {
    /// `ceiling` should be in `(0.0, 1.0]`.
    pub fn new(ceiling: f32) -> Self {
        debug_assert!(ceiling > 0.0 && ceiling <= 1.0);
        Self {
            ceiling,
            knee: ceiling * KNEE_RATIO,
        }
    }

    pub fn ceiling(&self) -> f32 {
        self.ceiling
    }

    #[inline]
    pub fn process(&self, sample: f32) -> f32 {
        if sample.is_nan() {
            return 0.0;
        }
        let magnitude = sample.abs();
        if magnitude <= self.knee {
            return sample;
        }
        let range = self.ceiling - self.knee;
        let bent = self.knee + range * ((magnitude - self.knee) / range).tanh();
        bent.min(self.ceiling).copysign(sample)
    }

    pub fn process_block(&self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }
}

impl Default for Limiter {
    fn default() -> Self {
        Self::new(0.95)
    }
}
