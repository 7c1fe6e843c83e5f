//! A backend that makes no sound and remembers everything it was asked to do.

use std::collections::{HashMap, HashSet};

use super::{
    AudioBackend, AudioTime, BackendError, ChannelId, MixParams, Trigger, VoiceId,
};
use crate::kit::VoiceConfig;

/// One call made against a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateChannel(ChannelId, MixParams),
    CreateVoice(VoiceId, String),
    Connect(VoiceId, ChannelId),
    SetMix(ChannelId, MixParams),
    Trigger {
        voice: VoiceId,
        note: String,
        at: AudioTime,
        duration: u64,
    },
    DisposeVoice(VoiceId),
    DisposeChannel(ChannelId),
}

/// Test double for [`AudioBackend`].
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<BackendCall>,
    sample_rate: u32,
    next_id: u64,
    voices: HashMap<VoiceId, String>,
    channels: HashMap<ChannelId, MixParams>,
    /// Voices whose disposal should fail.
    failing_disposals: HashSet<VoiceId>,
    /// Voice names whose creation should fail.
    failing_voices: HashSet<String>,
}

impl RecordingBackend {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    /// Make a later `dispose_voice(voice)` fail. The voice is still removed.
    pub fn fail_dispose_of(&mut self, voice: VoiceId) {
        self.failing_disposals.insert(voice);
    }

    /// Make `create_voice` fail for voices with this name.
    pub fn fail_create_of(&mut self, name: &str) {
        self.failing_voices.insert(name.to_lowercase());
    }

    /// Triggers in call order as `(voice, note, at)`.
    pub fn triggers(&self) -> Vec<(VoiceId, &str, AudioTime)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::Trigger { voice, note, at, .. } => Some((*voice, note.as_str(), *at)),
                _ => None,
            })
            .collect()
    }

    pub fn triggers_for(&self, voice: VoiceId) -> Vec<AudioTime> {
        self.triggers()
            .into_iter()
            .filter(|(v, _, _)| *v == voice)
            .map(|(_, _, at)| at)
            .collect()
    }

    pub fn live_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn live_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn mix(&self, channel: ChannelId) -> Option<MixParams> {
        self.channels.get(&channel).copied()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl AudioBackend for RecordingBackend {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn create_channel(&mut self, mix: MixParams) -> Result<ChannelId, BackendError> {
        let id = ChannelId(self.next());
        self.channels.insert(id, mix);
        self.calls.push(BackendCall::CreateChannel(id, mix));
        Ok(id)
    }

    fn create_voice(&mut self, config: &VoiceConfig) -> Result<VoiceId, BackendError> {
        if self.failing_voices.contains(&config.name.to_lowercase()) {
            return Err(BackendError::VoiceCreation(format!("{} refused", config.name)));
        }
        let id = VoiceId(self.next());
        self.voices.insert(id, config.name.clone());
        self.calls.push(BackendCall::CreateVoice(id, config.name.clone()));
        Ok(id)
    }

    fn connect(&mut self, voice: VoiceId, channel: ChannelId) -> Result<(), BackendError> {
        if !self.voices.contains_key(&voice) {
            return Err(BackendError::UnknownVoice(voice));
        }
        if !self.channels.contains_key(&channel) {
            return Err(BackendError::UnknownChannel(channel));
        }
        self.calls.push(BackendCall::Connect(voice, channel));
        Ok(())
    }

    fn set_mix(&mut self, channel: ChannelId, mix: MixParams) -> Result<(), BackendError> {
        let slot = self
            .channels
            .get_mut(&channel)
            .ok_or(BackendError::UnknownChannel(channel))?;
        *slot = mix;
        self.calls.push(BackendCall::SetMix(channel, mix));
        Ok(())
    }

    fn trigger(&mut self, voice: VoiceId, trigger: Trigger<'_>) {
        if !self.voices.contains_key(&voice) {
            return;
        }
        self.calls.push(BackendCall::Trigger {
            voice,
            note: trigger.note.to_string(),
            at: trigger.at,
            duration: trigger.duration,
        });
    }

    fn dispose_voice(&mut self, voice: VoiceId) -> Result<(), BackendError> {
        self.calls.push(BackendCall::DisposeVoice(voice));
        self.voices
            .remove(&voice)
            .ok_or(BackendError::UnknownVoice(voice))?;
        if self.failing_disposals.remove(&voice) {
            return Err(BackendError::Dispose(format!("voice #{} stuck", voice.0)));
        }
        Ok(())
    }

    fn dispose_channel(&mut self, channel: ChannelId) -> Result<(), BackendError> {
        self.calls.push(BackendCall::DisposeChannel(channel));
        self.channels
            .remove(&channel)
            .map(|_| ())
            .ok_or(BackendError::UnknownChannel(channel))
    }
}
