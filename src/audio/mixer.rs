//! The software mixer: an [`AudioBackend`] that renders stereo blocks.
//!
//! Triggers are queued with their frame position and rendered when the
//! block containing that frame is mixed. A note's whole buffer is rendered
//! at once; the part past the end of the block waits in an overlap buffer
//! and is mixed into the following blocks.

use std::collections::HashMap;
use std::f64::consts::FRAC_PI_4;

use tracing::debug;

use crate::backend::{AudioBackend, BackendError, ChannelId, MixParams, Trigger, VoiceId};
use crate::instrument::render_note;
use crate::kit::VoiceConfig;

/// Output is always interleaved stereo.
pub const MIXER_CHANNELS: usize = 2;

struct MixerVoice {
    config: VoiceConfig,
    channel: Option<ChannelId>,
}

#[derive(Debug, Clone)]
struct ScheduledNote {
    voice: VoiceId,
    note: String,
    at: u64,
    duration: u64,
}

pub struct Mixer {
    sample_rate: u32,
    next_id: u64,
    voices: HashMap<VoiceId, MixerVoice>,
    channels: HashMap<ChannelId, MixParams>,
    pending: Vec<ScheduledNote>,
    /// Interleaved samples that spilled past the last rendered block.
    overlap: Vec<f32>,
    /// Frame at the start of the next block.
    position: u64,
    /// Noise seed for the next note.
    seed: u64,
}

impl Mixer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            next_id: 0,
            voices: HashMap::new(),
            channels: HashMap::new(),
            pending: Vec::new(),
            overlap: Vec::new(),
            position: 0,
            seed: 0,
        }
    }

    /// Frame at the start of the next block.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Notes triggered but not yet rendered.
    pub fn pending_notes(&self) -> usize {
        self.pending.len()
    }

    /// Render the next `frames` frames as interleaved stereo.
    pub fn render_block(&mut self, frames: usize) -> Vec<f32> {
        let block_samples = frames * MIXER_CHANNELS;
        let mut output = vec![0.0f32; block_samples];

        let carried = self.overlap.len().min(block_samples);
        for (out, &s) in output.iter_mut().zip(&self.overlap[..carried]) {
            *out += s;
        }
        self.overlap.drain(..carried);

        let block_end = self.position + frames as u64;
        let (due, later): (Vec<ScheduledNote>, Vec<ScheduledNote>) = self
            .pending
            .drain(..)
            .partition(|n| n.at < block_end);
        self.pending = later;

        for note in due {
            let Some(voice) = self.voices.get(&note.voice) else {
                continue;
            };
            let mix = voice
                .channel
                .and_then(|c| self.channels.get(&c).copied())
                .unwrap_or_default();
            let (left, right) = pan_gains(mix);
            let held = note.duration as f64 / self.sample_rate as f64;
            self.seed = self.seed.wrapping_add(1);
            let rendered = render_note(&voice.config.kind, &note.note, held, self.sample_rate, self.seed);

            // late triggers play from the block start
            let offset = note.at.saturating_sub(self.position) as usize * MIXER_CHANNELS;
            for (i, &s) in rendered.iter().enumerate() {
                let pos = offset + i * MIXER_CHANNELS;
                mix_frame(&mut output, &mut self.overlap, pos, s * left, s * right);
            }
        }

        self.position = block_end;
        output
    }
}

/// Add one stereo frame at interleaved position `pos`, spilling past the
/// block into the overlap buffer.
fn mix_frame(output: &mut [f32], overlap: &mut Vec<f32>, pos: usize, left: f32, right: f32) {
    if pos + 1 < output.len() {
        output[pos] += left;
        output[pos + 1] += right;
        return;
    }
    let spill = pos - output.len();
    if spill + 1 >= overlap.len() {
        overlap.resize(spill + 2, 0.0);
    }
    overlap[spill] += left;
    overlap[spill + 1] += right;
}

/// Equal-power pan law scaled by the channel gain.
fn pan_gains(mix: MixParams) -> (f32, f32) {
    let angle = (mix.pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
    let gain = mix.gain.max(0.0);
    ((gain * angle.cos()) as f32, (gain * angle.sin()) as f32)
}

impl AudioBackend for Mixer {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn create_channel(&mut self, mix: MixParams) -> Result<ChannelId, BackendError> {
        self.next_id += 1;
        let id = ChannelId(self.next_id);
        self.channels.insert(id, mix);
        Ok(id)
    }

    fn create_voice(&mut self, config: &VoiceConfig) -> Result<VoiceId, BackendError> {
        self.next_id += 1;
        let id = VoiceId(self.next_id);
        debug!(voice = %config.name, id = id.0, "voice created");
        self.voices.insert(
            id,
            MixerVoice {
                config: config.clone(),
                channel: None,
            },
        );
        Ok(id)
    }

    fn connect(&mut self, voice: VoiceId, channel: ChannelId) -> Result<(), BackendError> {
        if !self.channels.contains_key(&channel) {
            return Err(BackendError::UnknownChannel(channel));
        }
        let slot = self
            .voices
            .get_mut(&voice)
            .ok_or(BackendError::UnknownVoice(voice))?;
        slot.channel = Some(channel);
        Ok(())
    }

    fn set_mix(&mut self, channel: ChannelId, mix: MixParams) -> Result<(), BackendError> {
        let slot = self
            .channels
            .get_mut(&channel)
            .ok_or(BackendError::UnknownChannel(channel))?;
        *slot = mix;
        Ok(())
    }

    fn trigger(&mut self, voice: VoiceId, trigger: Trigger<'_>) {
        if !self.voices.contains_key(&voice) {
            return;
        }
        self.pending.push(ScheduledNote {
            voice,
            note: trigger.note.to_string(),
            at: trigger.at.frames(),
            duration: trigger.duration,
        });
    }

    /// Queued notes for the voice are dropped; tails already mixed ring
    /// out.
    fn dispose_voice(&mut self, voice: VoiceId) -> Result<(), BackendError> {
        self.voices
            .remove(&voice)
            .ok_or(BackendError::UnknownVoice(voice))?;
        self.pending.retain(|n| n.voice != voice);
        Ok(())
    }

    fn dispose_channel(&mut self, channel: ChannelId) -> Result<(), BackendError> {
        self.channels
            .remove(&channel)
            .ok_or(BackendError::UnknownChannel(channel))?;
        for voice in self.voices.values_mut() {
            if voice.channel == Some(channel) {
                voice.channel = None;
            }
        }
        Ok(())
    }
}
