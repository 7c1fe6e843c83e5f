//! Instrument kits: named voices a track can be assigned with `voice(..)`.
//!
//! A voice is either a tone synth described by a small parameter bag or a
//! decoded sample. Both carry the note and duration a rhythmic hit plays.

pub mod builtin;
pub mod loader;

pub use builtin::builtin_kit;
pub use loader::load_kit;

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::instrument::envelope::AdsrEnvelope;
use crate::instrument::oscillator::Waveform;
use crate::instrument::sample::{SampleData, SampleError, SAMPLE_ROOT_NOTE};

/// Errors from loading a kit directory.
#[derive(Debug)]
pub enum KitError {
    /// The manifest could not be read.
    Io(PathBuf, std::io::Error),
    /// The manifest or a voice descriptor is not valid JSON.
    Json(PathBuf, serde_json::Error),
    /// A sample file could not be decoded.
    Sample(PathBuf, SampleError),
}

impl fmt::Display for KitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KitError::Io(path, e) => write!(f, "cannot read {}: {e}", path.display()),
            KitError::Json(path, e) => write!(f, "invalid JSON in {}: {e}", path.display()),
            KitError::Sample(path, e) => write!(f, "bad sample {}: {e}", path.display()),
        }
    }
}

impl std::error::Error for KitError {}

/// A musical duration: `"4n"` is a quarter note, `"16n"` a sixteenth,
/// `"2m"` two measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum NoteLength {
    Division(u32),
    Measures(u32),
}

impl NoteLength {
    pub const EIGHTH: NoteLength = NoteLength::Division(8);
    pub const SIXTEENTH: NoteLength = NoteLength::Division(16);

    /// Length in beats (quarter notes).
    pub fn beats(self, beats_per_bar: u32) -> f64 {
        match self {
            NoteLength::Division(d) => 4.0 / d as f64,
            NoteLength::Measures(m) => m as f64 * beats_per_bar as f64,
        }
    }

    /// Length in seconds at `bpm`.
    pub fn seconds(self, bpm: f64, beats_per_bar: u32) -> f64 {
        self.beats(beats_per_bar) * 60.0 / bpm
    }
}

impl FromStr for NoteLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || format!("invalid duration '{s}', expected e.g. 8n or 1m");
        let unit_start = s.char_indices().last().map_or(0, |(i, _)| i);
        let (count, unit) = s.split_at(unit_start);
        let count: u32 = count.parse().map_err(|_| invalid())?;
        if count == 0 {
            return Err(invalid());
        }
        match unit {
            "n" => Ok(NoteLength::Division(count)),
            "m" => Ok(NoteLength::Measures(count)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for NoteLength {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for NoteLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteLength::Division(d) => write!(f, "{d}n"),
            NoteLength::Measures(m) => write!(f, "{m}m"),
        }
    }
}

/// Tone generator family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthKind {
    /// Sine with a fast downward pitch sweep. Kicks, toms, snares.
    Membrane,
    /// High-passed noise burst. Hats and cymbals.
    Metal,
    /// Oscillator through an ADSR and a low-pass filter.
    Synth,
}

/// A tone voice descriptor, as found in `<voice>.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToneConfig {
    pub synth: SynthKind,
    #[serde(default)]
    pub oscillator: Option<Waveform>,
    #[serde(default)]
    pub envelope: Option<AdsrEnvelope>,
    /// Seconds for the membrane sweep to settle.
    #[serde(default)]
    pub pitch_decay: Option<f64>,
    /// Sweep depth (membrane) or noise brightness (metal), in octaves.
    #[serde(default)]
    pub octaves: Option<f64>,
    /// Low-pass cutoff for `synth`, high-pass cutoff for `metal`, in Hz.
    #[serde(default)]
    pub filter_cutoff: Option<f64>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub duration: Option<NoteLength>,
}

impl ToneConfig {
    pub fn new(synth: SynthKind) -> Self {
        Self {
            synth,
            oscillator: None,
            envelope: None,
            pitch_decay: None,
            octaves: None,
            filter_cutoff: None,
            note: None,
            duration: None,
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.oscillator.unwrap_or(match self.synth {
            SynthKind::Membrane => Waveform::Sine,
            SynthKind::Metal => Waveform::Square,
            SynthKind::Synth => Waveform::Triangle,
        })
    }

    pub fn envelope(&self) -> AdsrEnvelope {
        self.envelope.unwrap_or(match self.synth {
            SynthKind::Membrane => AdsrEnvelope::new(0.001, 0.4, 0.01, 1.4),
            SynthKind::Metal => AdsrEnvelope::new(0.001, 1.4, 0.0, 0.2),
            SynthKind::Synth => AdsrEnvelope::default(),
        })
    }

    pub fn pitch_decay(&self) -> f64 {
        self.pitch_decay.unwrap_or(0.05)
    }

    pub fn octaves(&self) -> f64 {
        self.octaves.unwrap_or(match self.synth {
            SynthKind::Membrane => 10.0,
            _ => 1.5,
        })
    }

    pub fn filter_cutoff(&self) -> Option<f64> {
        match self.synth {
            SynthKind::Metal => Some(self.filter_cutoff.unwrap_or(4000.0)),
            _ => self.filter_cutoff,
        }
    }
}

/// How a voice makes sound.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceKind {
    Tone(ToneConfig),
    Sample(Arc<SampleData>),
}

/// A loaded voice: its sound source plus what a rhythmic hit plays.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceConfig {
    pub name: String,
    pub kind: VoiceKind,
    /// Note played on a hit, e.g. `"C2"`.
    pub note: String,
    pub length: NoteLength,
}

impl VoiceConfig {
    /// Build a tone voice, filling the default note and duration from the
    /// synth kind when the descriptor leaves them out.
    pub fn tone(name: impl Into<String>, config: ToneConfig) -> Self {
        let name = name.into();
        let (note, length) = match config.synth {
            SynthKind::Membrane => ("C2", NoteLength::EIGHTH),
            SynthKind::Metal => ("G#6", NoteLength::SIXTEENTH),
            SynthKind::Synth if name.eq_ignore_ascii_case("bass") => ("A1", NoteLength::EIGHTH),
            SynthKind::Synth => ("C4", NoteLength::EIGHTH),
        };
        Self {
            note: config.note.clone().unwrap_or_else(|| note.to_string()),
            length: config.duration.unwrap_or(length),
            kind: VoiceKind::Tone(config),
            name,
        }
    }

    pub fn sample(name: impl Into<String>, data: SampleData) -> Self {
        Self {
            name: name.into(),
            kind: VoiceKind::Sample(Arc::new(data)),
            note: SAMPLE_ROOT_NOTE.to_string(),
            length: NoteLength::EIGHTH,
        }
    }
}

/// A named set of voices. Lookup ignores case.
#[derive(Debug, Clone, Default)]
pub struct Kit {
    pub name: String,
    pub description: String,
    voices: HashMap<String, VoiceConfig>,
}

impl Kit {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            voices: HashMap::new(),
        }
    }

    pub fn insert(&mut self, voice: VoiceConfig) {
        self.voices.insert(voice.name.to_lowercase(), voice);
    }

    pub fn voice(&self, name: &str) -> Option<&VoiceConfig> {
        self.voices.get(&name.to_lowercase())
    }

    /// Voice names in alphabetical order.
    pub fn voice_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.voices.values().map(|v| v.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn note_lengths() {
        assert_eq!("8n".parse::<NoteLength>(), Ok(NoteLength::Division(8)));
        assert_eq!("2m".parse::<NoteLength>(), Ok(NoteLength::Measures(2)));
        assert!("0n".parse::<NoteLength>().is_err());
        assert!("8x".parse::<NoteLength>().is_err());
        assert!("".parse::<NoteLength>().is_err());
        assert_approx_eq!(NoteLength::Division(4).beats(4), 1.0);
        assert_approx_eq!(NoteLength::SIXTEENTH.beats(4), 0.25);
        assert_approx_eq!(NoteLength::Measures(1).beats(3), 3.0);
        assert_approx_eq!(NoteLength::EIGHTH.seconds(120.0, 4), 0.25);
        assert_eq!(NoteLength::Division(16).to_string(), "16n");
    }

    #[test]
    fn tone_defaults_follow_synth_kind() {
        let kick = VoiceConfig::tone("kick", ToneConfig::new(SynthKind::Membrane));
        assert_eq!((kick.note.as_str(), kick.length), ("C2", NoteLength::EIGHTH));
        let hat = VoiceConfig::tone("hat", ToneConfig::new(SynthKind::Metal));
        assert_eq!((hat.note.as_str(), hat.length), ("G#6", NoteLength::SIXTEENTH));
        let bass = VoiceConfig::tone("Bass", ToneConfig::new(SynthKind::Synth));
        assert_eq!(bass.note, "A1");
        let lead = VoiceConfig::tone("lead", ToneConfig::new(SynthKind::Synth));
        assert_eq!(lead.note, "C4");
    }

    #[test]
    fn descriptor_overrides_defaults() {
        let config: ToneConfig = serde_json::from_str(
            r#"{"synth":"membrane","note":"D2","duration":"4n","octaves":6,"oscillator":"triangle"}"#,
        )
        .unwrap();
        assert_eq!(config.waveform(), Waveform::Triangle);
        assert_approx_eq!(config.octaves(), 6.0);
        let voice = VoiceConfig::tone("tom", config);
        assert_eq!(voice.note, "D2");
        assert_eq!(voice.length, NoteLength::Division(4));
    }

    #[test]
    fn bad_duration_rejects_descriptor() {
        let result: Result<ToneConfig, _> =
            serde_json::from_str(r#"{"synth":"synth","duration":"long"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn lookup_ignores_case() {
        let mut kit = Kit::new("test", "");
        kit.insert(VoiceConfig::tone("Snare", ToneConfig::new(SynthKind::Membrane)));
        assert!(kit.voice("snare").is_some());
        assert!(kit.voice("SNARE").is_some());
        assert!(kit.voice("kick").is_none());
        assert_eq!(kit.voice_names(), ["Snare"]);
    }

    #[test]
    fn sample_voice_plays_root_note() {
        let voice = VoiceConfig::sample("clap", SampleData::from_mono(vec![0.1], 44100));
        assert_eq!(voice.note, "C4");
        assert!(matches!(voice.kind, VoiceKind::Sample(_)));
    }
}
