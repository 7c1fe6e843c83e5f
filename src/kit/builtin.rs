//! The kit available without any files on disk.

use super::{Kit, SynthKind, ToneConfig, VoiceConfig};
use crate::instrument::envelope::AdsrEnvelope;
use crate::instrument::oscillator::Waveform;

pub const BUILTIN_KIT_NAME: &str = "builtin";

/// `kick`, `snare`, `hat`, `bass` and `lead`.
pub fn builtin_kit() -> Kit {
    let mut kit = Kit::new(BUILTIN_KIT_NAME, "synthesized drums, bass and lead");

    kit.insert(VoiceConfig::tone(
        "kick",
        ToneConfig {
            pitch_decay: Some(0.05),
            octaves: Some(10.0),
            oscillator: Some(Waveform::Sine),
            envelope: Some(AdsrEnvelope::new(0.001, 0.4, 0.01, 1.4)),
            ..ToneConfig::new(SynthKind::Membrane)
        },
    ));
    kit.insert(VoiceConfig::tone(
        "snare",
        ToneConfig {
            pitch_decay: Some(0.01),
            octaves: Some(6.0),
            oscillator: Some(Waveform::Triangle),
            envelope: Some(AdsrEnvelope::new(0.001, 0.2, 0.0, 0.2)),
            ..ToneConfig::new(SynthKind::Membrane)
        },
    ));
    kit.insert(VoiceConfig::tone(
        "hat",
        ToneConfig {
            envelope: Some(AdsrEnvelope::new(0.001, 0.05, 0.0, 0.025)),
            octaves: Some(2.5),
            filter_cutoff: Some(6000.0),
            ..ToneConfig::new(SynthKind::Metal)
        },
    ));
    kit.insert(VoiceConfig::tone(
        "bass",
        ToneConfig {
            oscillator: Some(Waveform::Sawtooth),
            envelope: Some(AdsrEnvelope::new(0.01, 0.2, 0.3, 0.5)),
            filter_cutoff: Some(800.0),
            ..ToneConfig::new(SynthKind::Synth)
        },
    ));
    kit.insert(VoiceConfig::tone("lead", ToneConfig::new(SynthKind::Synth)));

    kit
}
