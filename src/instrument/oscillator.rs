//! Oscillator primitives and pitch conversion.

use std::f64::consts::TAU;

use serde::Deserialize;

use crate::theory::parse_note_name;

/// Oscillator shapes a tone voice can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
    #[serde(alias = "saw")]
    Sawtooth,
    Square,
}

impl Waveform {
    /// One sample at `phase` in `[0, 1)`. Output is in `[-1, 1]`.
    pub fn sample(self, phase: f64) -> f64 {
        match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * ((phase + 0.25).fract() - 0.5).abs(),
        }
    }
}

/// A running phase accumulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Phase(f64);

impl Phase {
    /// Advance by one sample at `freq` and return the phase before the step.
    #[inline]
    pub fn tick(&mut self, freq: f64, sample_rate: f64) -> f64 {
        let current = self.0;
        self.0 = (self.0 + freq / sample_rate).fract();
        current
    }
}

/// Equal-tempered frequency of a MIDI note (A4 = 69 = 440 Hz).
pub fn midi_to_freq(note: u8) -> f64 {
    440.0 * 2.0f64.powf((note as f64 - 69.0) / 12.0)
}

/// Frequency of a note name with octave such as `"G#6"`.
pub fn note_to_freq(name: &str) -> Option<f64> {
    parse_note_name(name).map(midi_to_freq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn waveform_landmarks() {
        assert_approx_eq!(Waveform::Sine.sample(0.25), 1.0);
        assert_approx_eq!(Waveform::Sawtooth.sample(0.0), -1.0);
        assert_approx_eq!(Waveform::Square.sample(0.75), -1.0);
        assert_approx_eq!(Waveform::Triangle.sample(0.0), 0.0);
        assert_approx_eq!(Waveform::Triangle.sample(0.25), 1.0);
        assert_approx_eq!(Waveform::Triangle.sample(0.5), 0.0);
        assert_approx_eq!(Waveform::Triangle.sample(0.75), -1.0);
    }

    #[test]
    fn waveforms_stay_in_range() {
        for wf in [
            Waveform::Sine,
            Waveform::Triangle,
            Waveform::Sawtooth,
            Waveform::Square,
        ] {
            for i in 0..500 {
                let v = wf.sample(i as f64 / 500.0);
                assert!((-1.0..=1.0).contains(&v), "{wf:?}: {v}");
            }
        }
    }

    #[test]
    fn phase_wraps() {
        let mut phase = Phase::default();
        for _ in 0..4 {
            phase.tick(11025.0, 44100.0);
        }
        assert_approx_eq!(phase.tick(11025.0, 44100.0), 0.0);
    }

    #[test]
    fn deserializes_waveform_names() {
        let wf: Waveform = serde_json::from_str("\"sawtooth\"").unwrap();
        assert_eq!(wf, Waveform::Sawtooth);
        let wf: Waveform = serde_json::from_str("\"saw\"").unwrap();
        assert_eq!(wf, Waveform::Sawtooth);
    }

    #[test]
    fn note_frequencies() {
        assert_approx_eq!(note_to_freq("A4").unwrap(), 440.0, 1e-9);
        assert_approx_eq!(note_to_freq("C4").unwrap(), 261.6256, 1e-3);
        assert_approx_eq!(note_to_freq("A1").unwrap(), 55.0, 1e-9);
        assert!(note_to_freq("Q4").is_none());
    }
}
