//! A live session: global musical state, tracks, kit, backend and clock,
//! plus the log of every submitted line.
//!
//! The session is the only writer of the track registry. Lines are applied
//! whole between clock advances, so the clock never observes a track half
//! way through an update.

mod apply;

use tracing::info;

use crate::backend::AudioBackend;
use crate::clock::{Firing, MasterClock};
use crate::config::Config;
use crate::kit::Kit;
use crate::log::{CommandLog, LogEntry};
use crate::track::{TrackData, TrackRegistry};

/// Key, scale and tempo shared by every track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub key: String,
    pub scale: String,
    pub bpm: u32,
}

pub struct Session<B: AudioBackend> {
    state: SessionState,
    registry: TrackRegistry,
    kit: Option<Kit>,
    backend: B,
    clock: MasterClock,
    log: CommandLog,
}

impl<B: AudioBackend> Session<B> {
    /// A stopped session with no tracks. Without a kit, every command that
    /// needs a voice is rejected.
    pub fn new(backend: B, kit: Option<Kit>, config: &Config) -> Self {
        let bpm = config.bpm.max(1);
        let clock = MasterClock::new(
            bpm as f64,
            backend.sample_rate(),
            config.beats_per_bar,
            config.seed,
        );
        if let Some(kit) = &kit {
            info!(kit = %kit.name, voices = kit.len(), "session kit");
        }
        Self {
            state: SessionState {
                key: config.key.clone(),
                scale: config.scale.clone(),
                bpm,
            },
            registry: TrackRegistry::new(),
            kit,
            backend,
            clock,
            log: CommandLog::default(),
        }
    }

    /// Apply one line and record the result in the log.
    pub fn submit(&mut self, line: &str) -> LogEntry {
        let outcome = self.apply(line).map_err(|e| e.to_string());
        let entry = LogEntry::new(line.trim(), outcome);
        self.log.push(entry.clone());
        entry
    }

    /// Start the clock. Pending deferred starts sound from the first step.
    pub fn start(&mut self) {
        self.registry.clear_deferred_starts();
        self.clock.start();
    }

    /// Stop the clock and reset the step counter. Track play flags stay.
    pub fn stop(&mut self) {
        self.clock.stop();
    }

    /// Returns whether the clock is now running.
    pub fn toggle(&mut self) -> bool {
        if self.clock.is_running() {
            self.stop();
        } else {
            self.start();
        }
        self.clock.is_running()
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Drive the clock over the next `frames` frames. Returns the steps on
    /// which something sounded.
    pub fn advance(&mut self, frames: u32) -> Vec<Firing> {
        let mut firings = Vec::new();
        self.clock
            .advance(frames, &self.registry, &mut self.backend, |f| firings.push(f));
        firings
    }

    /// Every track, in id order.
    pub fn snapshot(&self) -> Vec<TrackData> {
        self.registry.snapshot()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn log(&self) -> &CommandLog {
        &self.log
    }

    pub fn kit(&self) -> Option<&Kit> {
        self.kit.as_ref()
    }

    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    pub fn clock(&self) -> &MasterClock {
        &self.clock
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Release every runtime and hand back the backend.
    pub fn shutdown(mut self) -> B {
        self.clock.stop();
        self.registry.dispose_all(&mut self.backend);
        self.backend
    }
}
