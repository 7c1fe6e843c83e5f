//! Tracks: what each numbered slot plays, and the backend resources
//! that play it.

pub mod registry;

pub use registry::TrackRegistry;

use std::fmt;

use rand::Rng;

use crate::backend::{AudioBackend, BackendError, ChannelId, MixParams, VoiceId};
use crate::kit::{NoteLength, VoiceConfig};
use crate::pattern::{Pattern, PatternSpec};

/// Lowest and highest octave a track may be assigned.
pub const OCTAVE_LIMITS: (i32, i32) = (-1, 9);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Inclusive octave range for melodic notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OctaveRange {
    min: i32,
    max: i32,
}

impl OctaveRange {
    /// Bounds may come in either order; both are clamped to
    /// [`OCTAVE_LIMITS`].
    pub fn new(a: i32, b: i32) -> Self {
        let (lo, hi) = OCTAVE_LIMITS;
        let (a, b) = (a.clamp(lo, hi), b.clamp(lo, hi));
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn fixed(octave: i32) -> Self {
        Self::new(octave, octave)
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    /// The octave for one note: fixed, or uniform over the range.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> i32 {
        if self.min == self.max {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }
}

impl Default for OctaveRange {
    fn default() -> Self {
        Self::fixed(2)
    }
}

impl fmt::Display for OctaveRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}-{}", self.min, self.max)
        }
    }
}

/// Everything the clock needs to know about a track, by value.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackData {
    pub id: TrackId,
    pub voice: String,
    pub spec: Option<PatternSpec>,
    /// Resolved pattern with modifiers and rotation applied.
    pub pattern: Pattern,
    /// The command line that last rebuilt this track.
    pub dsl: String,
    pub playing: bool,
    pub gain: f64,
    pub pan: f64,
    pub prob: f64,
    pub offset: i64,
    pub octave: OctaveRange,
    /// Global step before which a pending start stays silent.
    pub starts_at: Option<u64>,
}

impl TrackData {
    /// Whether the track sounds at `global_step`.
    pub fn is_audible_at(&self, global_step: u64) -> bool {
        self.playing && self.starts_at.map_or(true, |at| global_step >= at)
    }
}

/// Live backend resources behind one track. Exactly one per track, never
/// shared.
#[derive(Debug, PartialEq)]
pub struct TrackRuntime {
    pub voice: VoiceId,
    pub channel: ChannelId,
    /// What a rhythmic hit plays.
    pub note: String,
    pub length: NoteLength,
}

impl TrackRuntime {
    /// Create a voice and a mix channel and connect them. Anything created
    /// before a failure is disposed again.
    pub fn build<B: AudioBackend + ?Sized>(
        backend: &mut B,
        config: &VoiceConfig,
        mix: MixParams,
    ) -> Result<Self, BackendError> {
        let channel = backend.create_channel(mix)?;
        let voice = match backend.create_voice(config) {
            Ok(voice) => voice,
            Err(e) => {
                let _ = backend.dispose_channel(channel);
                return Err(e);
            }
        };
        if let Err(e) = backend.connect(voice, channel) {
            let _ = backend.dispose_voice(voice);
            let _ = backend.dispose_channel(channel);
            return Err(e);
        }
        Ok(Self {
            voice,
            channel,
            note: config.note.clone(),
            length: config.length,
        })
    }

    /// Release both resources. Both are attempted; the first error wins.
    pub fn dispose<B: AudioBackend + ?Sized>(self, backend: &mut B) -> Result<(), BackendError> {
        let voice = backend.dispose_voice(self.voice);
        let channel = backend.dispose_channel(self.channel);
        voice.and(channel)
    }
}
