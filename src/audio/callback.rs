//! The cpal output callback. Runs on the audio thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ringbuf::traits::Consumer;
use ringbuf::HeapCons;

use super::command::AudioCommand;
use super::limiter::Limiter;

/// Consumed samples are compacted away once this many have been read.
const COMPACT_THRESHOLD: usize = 8192;

pub struct AudioCallback {
    consumer: HeapCons<AudioCommand>,
    playback: Vec<f32>,
    read_pos: usize,
    volume: f32,
    limiter: Limiter,
    channels: usize,
    /// Frames taken from queued blocks so far. Underrun silence is not
    /// counted.
    played: Arc<AtomicU64>,
}

impl AudioCallback {
    pub fn new(consumer: HeapCons<AudioCommand>, channels: u16, played: Arc<AtomicU64>) -> Self {
        Self {
            consumer,
            playback: Vec::with_capacity(COMPACT_THRESHOLD * 2),
            read_pos: 0,
            volume: 1.0,
            limiter: Limiter::default(),
            channels: channels.max(1) as usize,
            played,
        }
    }

    pub fn process(&mut self, output: &mut [f32]) {
        while let Some(cmd) = self.consumer.try_pop() {
            match cmd {
                AudioCommand::Block(data) => self.playback.extend_from_slice(&data),
                AudioCommand::SetVolume(v) => self.volume = v.clamp(0.0, 1.0),
                AudioCommand::Clear => {
                    self.playback.clear();
                    self.read_pos = 0;
                }
            }
        }

        let available = self.playback.len() - self.read_pos;
        let copy_len = output.len().min(available);
        for (out, &src) in output[..copy_len]
            .iter_mut()
            .zip(&self.playback[self.read_pos..self.read_pos + copy_len])
        {
            *out = src * self.volume;
        }
        output[copy_len..].fill(0.0);
        self.read_pos += copy_len;
        self.played
            .fetch_add((copy_len / self.channels) as u64, Ordering::Relaxed);

        self.limiter.process_block(output);

        if self.read_pos >= COMPACT_THRESHOLD {
            self.playback.drain(..self.read_pos);
            self.read_pos = 0;
        }
    }
}
