//! Play/stop state and drift-free advancement of musical time by frames.
//!
//! Fractional ticks carry over between blocks so long sessions do not
//! drift against the audio clock.

use super::beat::{Beat, TICKS_PER_BEAT, TICKS_PER_STEP};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
}

/// The musical span covered by one block, `[from, to)`, in exact
/// (fractional) ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub from: f64,
    pub to: f64,
}

impl Window {
    /// Global indices of the steps that start inside this window.
    pub fn steps(&self) -> std::ops::Range<u64> {
        first_step_at(self.from)..first_step_at(self.to)
    }

    /// Frames from the window start to the start of `step`.
    pub fn frame_offset(&self, step: u64, bpm: f64, sample_rate: u32) -> u64 {
        let ticks = (Beat::from_steps(step).ticks() as f64 - self.from).max(0.0);
        (ticks * 60.0 * sample_rate as f64 / (TICKS_PER_BEAT as f64 * bpm)).round() as u64
    }
}

fn first_step_at(ticks: f64) -> u64 {
    (ticks / TICKS_PER_STEP as f64).ceil() as u64
}

#[derive(Debug)]
pub struct Transport {
    bpm: f64,
    sample_rate: u32,
    state: PlayState,
    position_ticks: u64,
    tick_remainder: f64,
}

impl Transport {
    pub fn new(bpm: f64, sample_rate: u32) -> Self {
        Self {
            bpm,
            sample_rate,
            state: PlayState::Stopped,
            position_ticks: 0,
            tick_remainder: 0.0,
        }
    }

    pub fn play(&mut self) {
        self.state = PlayState::Playing;
    }

    /// Stop and rewind to zero.
    pub fn stop(&mut self) {
        self.state = PlayState::Stopped;
        self.position_ticks = 0;
        self.tick_remainder = 0.0;
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    pub fn position(&self) -> Beat {
        Beat::from_ticks(self.position_ticks)
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Takes effect on the next `advance_by_frames`.
    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = bpm;
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Advance by `num_frames`. `None` while stopped.
    pub fn advance_by_frames(&mut self, num_frames: u32) -> Option<Window> {
        if self.state == PlayState::Stopped {
            return None;
        }
        let from = self.position_ticks as f64 + self.tick_remainder;

        let ticks_f64 = (num_frames as f64 / self.sample_rate as f64)
            * (self.bpm / 60.0)
            * TICKS_PER_BEAT as f64;
        let total = self.tick_remainder + ticks_f64;
        let whole_ticks = total.floor() as u64;
        self.tick_remainder = total - whole_ticks as f64;
        self.position_ticks += whole_ticks;

        Some(Window {
            from,
            to: self.position_ticks as f64 + self.tick_remainder,
        })
    }
}
