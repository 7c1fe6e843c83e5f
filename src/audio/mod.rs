//! Audio output: the software [`Mixer`], the cpal [`AudioEngine`] that
//! plays its blocks, and offline WAV writing.
//!
//! The engine owns the cpal stream and talks to it through a lock-free ring
//! buffer. The render loop pushes [`AudioCommand`]s; the audio thread
//! drains them in its callback.

pub mod callback;
pub mod command;
pub mod limiter;
pub mod mixer;
pub mod wav;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{
    traits::{Producer, Split},
    HeapRb,
};
use tracing::{error, info};

pub use command::AudioCommand;
pub use limiter::Limiter;
pub use mixer::{Mixer, MIXER_CHANNELS};
pub use wav::write_wav;

use callback::AudioCallback;

/// Commands the queue holds before pushes fail.
const RING_BUFFER_CAPACITY: usize = 256;

#[derive(Debug)]
pub enum AudioError {
    NoOutputDevice,
    DeviceConfig(String),
    StreamBuild(String),
    StreamPlay(String),
    /// The audio thread is not draining the queue.
    BufferFull,
    Wav(hound::Error),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::NoOutputDevice => write!(f, "no audio output device found"),
            AudioError::DeviceConfig(e) => write!(f, "device config error: {e}"),
            AudioError::StreamBuild(e) => write!(f, "stream build error: {e}"),
            AudioError::StreamPlay(e) => write!(f, "stream play error: {e}"),
            AudioError::BufferFull => write!(f, "audio command ring buffer is full"),
            AudioError::Wav(e) => write!(f, "wav error: {e}"),
        }
    }
}

impl std::error::Error for AudioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AudioError::Wav(e) => Some(e),
            _ => None,
        }
    }
}

impl From<hound::Error> for AudioError {
    fn from(e: hound::Error) -> Self {
        AudioError::Wav(e)
    }
}

/// Live output on the default device.
pub struct AudioEngine {
    stream: cpal::Stream,
    producer: ringbuf::HeapProd<AudioCommand>,
    played: Arc<AtomicU64>,
    sample_rate: u32,
    channels: u16,
}

impl AudioEngine {
    /// Open the default output device with its default configuration.
    pub fn new() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;
        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;

        Self::build(&device, config.sample_rate().0, config.channels())
    }

    fn build(device: &cpal::Device, sample_rate: u32, channels: u16) -> Result<Self, AudioError> {
        let (producer, consumer) = HeapRb::<AudioCommand>::new(RING_BUFFER_CAPACITY).split();
        let played = Arc::new(AtomicU64::new(0));
        let mut callback = AudioCallback::new(consumer, channels, Arc::clone(&played));

        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };
        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| callback.process(data),
                |err| error!(error = %err, "audio stream error"),
                None,
            )
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?;
        stream
            .play()
            .map_err(|e| AudioError::StreamPlay(e.to_string()))?;

        info!(sample_rate, channels, "audio engine started");
        Ok(Self {
            stream,
            producer,
            played,
            sample_rate,
            channels,
        })
    }

    /// Queue an interleaved stereo block, remapped to the device layout.
    pub fn send_block(&mut self, stereo: &[f32]) -> Result<(), AudioError> {
        let block = remap_stereo(stereo, self.channels);
        self.producer
            .try_push(AudioCommand::Block(block))
            .map_err(|_| AudioError::BufferFull)
    }

    pub fn set_volume(&mut self, volume: f32) -> Result<(), AudioError> {
        self.producer
            .try_push(AudioCommand::SetVolume(volume))
            .map_err(|_| AudioError::BufferFull)
    }

    /// Drop everything queued but not yet played.
    pub fn clear(&mut self) -> Result<(), AudioError> {
        self.producer
            .try_push(AudioCommand::Clear)
            .map_err(|_| AudioError::BufferFull)
    }

    /// Frames the device has actually played.
    pub fn frames_played(&self) -> u64 {
        self.played.load(Ordering::Relaxed)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn pause(&self) -> Result<(), AudioError> {
        self.stream
            .pause()
            .map_err(|e| AudioError::StreamPlay(e.to_string()))
    }
}

/// Stereo → `channels`: mono devices get the average, wider devices get
/// left and right on the first two channels and silence elsewhere.
pub fn remap_stereo(stereo: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        2 => stereo.to_vec(),
        0 | 1 => stereo
            .chunks_exact(MIXER_CHANNELS)
            .map(|f| (f[0] + f[1]) * 0.5)
            .collect(),
        n => {
            let n = n as usize;
            let mut out = vec![0.0; stereo.len() / MIXER_CHANNELS * n];
            for (frame, out) in stereo.chunks_exact(MIXER_CHANNELS).zip(out.chunks_exact_mut(n)) {
                out[..MIXER_CHANNELS].copy_from_slice(frame);
            }
            out
        }
    }
}
