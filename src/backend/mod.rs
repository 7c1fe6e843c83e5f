//! The audio backend seam.
//!
//! The sequencer never makes sound itself. It asks an [`AudioBackend`] for
//! voices and mix channels, wires them together, and schedules note
//! triggers at exact frame positions on the backend's clock. The
//! [`Mixer`](crate::audio::Mixer) renders real audio; the
//! [`RecordingBackend`] captures calls for tests.

pub mod recording;

pub use recording::{BackendCall, RecordingBackend};

use std::fmt;

use crate::kit::VoiceConfig;

/// Handle to a voice instance owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u64);

/// Handle to a gain/pan channel owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u64);

/// A position on the backend's clock, in frames since it started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AudioTime(pub u64);

impl AudioTime {
    pub fn frames(self) -> u64 {
        self.0
    }

    pub fn seconds(self, sample_rate: u32) -> f64 {
        self.0 as f64 / sample_rate as f64
    }
}

/// Channel gain and stereo position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixParams {
    /// Linear gain, `1.0` is unity.
    pub gain: f64,
    /// `-1.0` hard left to `1.0` hard right.
    pub pan: f64,
}

impl Default for MixParams {
    fn default() -> Self {
        Self { gain: 1.0, pan: 0.0 }
    }
}

/// One scheduled note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger<'a> {
    pub note: &'a str,
    pub at: AudioTime,
    /// How long the note is held, in frames. Release tails come on top.
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    UnknownVoice(VoiceId),
    UnknownChannel(ChannelId),
    /// The backend could not build a voice from its kit entry.
    VoiceCreation(String),
    /// A resource could not be released.
    Dispose(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::UnknownVoice(v) => write!(f, "unknown voice #{}", v.0),
            BackendError::UnknownChannel(c) => write!(f, "unknown channel #{}", c.0),
            BackendError::VoiceCreation(e) => write!(f, "cannot create voice: {e}"),
            BackendError::Dispose(e) => write!(f, "cannot dispose resource: {e}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// What the sequencer needs from an audio engine.
pub trait AudioBackend {
    fn sample_rate(&self) -> u32;

    fn create_channel(&mut self, mix: MixParams) -> Result<ChannelId, BackendError>;

    fn create_voice(&mut self, config: &VoiceConfig) -> Result<VoiceId, BackendError>;

    /// Route a voice's output into a channel.
    fn connect(&mut self, voice: VoiceId, channel: ChannelId) -> Result<(), BackendError>;

    fn set_mix(&mut self, channel: ChannelId, mix: MixParams) -> Result<(), BackendError>;

    /// Schedule a note. Triggers on unknown voices are dropped.
    fn trigger(&mut self, voice: VoiceId, trigger: Trigger<'_>);

    fn dispose_voice(&mut self, voice: VoiceId) -> Result<(), BackendError>;

    fn dispose_channel(&mut self, channel: ChannelId) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_time_seconds() {
        assert_eq!(AudioTime(22050).seconds(44100), 0.5);
        assert_eq!(AudioTime(7).frames(), 7);
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            BackendError::UnknownVoice(VoiceId(3)).to_string(),
            "unknown voice #3"
        );
        assert_eq!(
            BackendError::Dispose("busy".into()).to_string(),
            "cannot dispose resource: busy"
        );
    }
}
