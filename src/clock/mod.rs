//! The master clock: one firing per sixteenth note, scheduled on the
//! backend's frame clock.
//!
//! The clock is driven by the audio render loop. Each call to
//! [`MasterClock::advance`] covers one block of frames; every step whose
//! start falls inside that block is fired with the exact frame it starts
//! on. Commands are applied between calls, so each firing sees a
//! consistent registry.

pub mod beat;
pub mod quantize;
pub mod transport;

pub use beat::{Beat, DEFAULT_BEATS_PER_BAR, TICKS_PER_BEAT, TICKS_PER_STEP};
pub use quantize::{measure_steps, next_measure_boundary};
pub use transport::{PlayState, Transport, Window};

use std::fmt::Write;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::backend::{AudioBackend, AudioTime, Trigger};
use crate::pattern::StepValue;
use crate::theory::strip_octave;
use crate::track::TrackRegistry;

/// A step on which at least one track sounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Firing {
    pub step: u64,
    pub at: AudioTime,
    /// Number of tracks triggered.
    pub sounded: usize,
}

pub struct MasterClock {
    transport: Transport,
    beats_per_bar: u32,
    /// Backend frame at the start of the next block.
    now: AudioTime,
    rng: ChaCha8Rng,
    /// Reused for melodic note names.
    note: String,
}

impl MasterClock {
    /// A stopped clock. Without a seed, probability and octave draws come
    /// from entropy.
    pub fn new(bpm: f64, sample_rate: u32, beats_per_bar: u32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            transport: Transport::new(bpm, sample_rate),
            beats_per_bar,
            now: AudioTime::default(),
            rng,
            note: String::with_capacity(8),
        }
    }

    pub fn start(&mut self) {
        if !self.transport.is_playing() {
            self.transport.play();
            info!(bpm = self.transport.bpm(), "clock started");
        }
    }

    /// Stop and reset the step counter.
    pub fn stop(&mut self) {
        if self.transport.is_playing() {
            info!("clock stopped");
        }
        self.transport.stop();
    }

    /// Returns whether the clock is now running.
    pub fn toggle(&mut self) -> bool {
        if self.transport.is_playing() {
            self.stop();
        } else {
            self.start();
        }
        self.is_running()
    }

    pub fn is_running(&self) -> bool {
        self.transport.is_playing()
    }

    pub fn bpm(&self) -> f64 {
        self.transport.bpm()
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        self.transport.set_bpm(bpm);
    }

    pub fn beats_per_bar(&self) -> u32 {
        self.beats_per_bar
    }

    pub fn sample_rate(&self) -> u32 {
        self.transport.sample_rate()
    }

    /// Backend frame at the start of the next block.
    pub fn now(&self) -> AudioTime {
        self.now
    }

    /// Index of the next step the clock will fire.
    pub fn next_step(&self) -> u64 {
        self.transport.position().next_step()
    }

    /// Where a track started now begins sounding.
    pub fn deferred_start_step(&self) -> u64 {
        next_measure_boundary(self.next_step(), self.beats_per_bar)
    }

    /// Cover the next `frames` frames, firing every step that starts
    /// inside them. `on_fire` is called for firings where a track sounded.
    /// Returns the number of steps fired.
    ///
    /// The backend clock moves forward even while stopped.
    pub fn advance<B, F>(
        &mut self,
        frames: u32,
        registry: &TrackRegistry,
        backend: &mut B,
        mut on_fire: F,
    ) -> u64
    where
        B: AudioBackend + ?Sized,
        F: FnMut(Firing),
    {
        let block_start = self.now;
        self.now = AudioTime(block_start.0 + frames as u64);

        let Some(window) = self.transport.advance_by_frames(frames) else {
            return 0;
        };
        let bpm = self.transport.bpm();
        let sample_rate = self.transport.sample_rate();
        let last_frame = (frames as u64).saturating_sub(1);

        let mut fired = 0;
        for step in window.steps() {
            let offset = window.frame_offset(step, bpm, sample_rate).min(last_frame);
            let at = AudioTime(block_start.0 + offset);
            let sounded = self.fire(step, at, registry, backend);
            fired += 1;
            if sounded > 0 {
                on_fire(Firing { step, at, sounded });
            }
        }
        fired
    }

    fn fire<B: AudioBackend + ?Sized>(
        &mut self,
        step: u64,
        at: AudioTime,
        registry: &TrackRegistry,
        backend: &mut B,
    ) -> usize {
        let bpm = self.transport.bpm();
        let sample_rate = self.transport.sample_rate() as f64;
        let mut sounded = 0;

        for (track, runtime) in registry.iter_with_runtime() {
            let Some(runtime) = runtime else { continue };
            if !track.is_audible_at(step) || track.pattern.is_empty() {
                continue;
            }
            if self.rng.gen::<f64>() >= track.prob {
                continue;
            }
            let note = match track.pattern.at_global(step) {
                Some(StepValue::Note(name)) => {
                    let octave = track.octave.pick(&mut self.rng);
                    self.note.clear();
                    let _ = write!(self.note, "{}{}", strip_octave(name), octave);
                    self.note.as_str()
                }
                Some(StepValue::Hit) => runtime.note.as_str(),
                _ => continue,
            };
            let held = runtime.length.seconds(bpm, self.beats_per_bar);
            backend.trigger(
                runtime.voice,
                Trigger {
                    note,
                    at,
                    duration: (held * sample_rate).round() as u64,
                },
            );
            sounded += 1;
        }
        sounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, MixParams, RecordingBackend};
    use crate::kit::builtin_kit;
    use crate::pattern::{pulse, resolve, Pattern, PatternSpec};
    use crate::track::{OctaveRange, TrackData, TrackId, TrackRuntime};

    const SR: u32 = 48000;
    const BLOCK: u32 = 512;
    // one 4/4 measure at 120 bpm is 96000 frames; 187 blocks stop just short
    const MEASURE_BLOCKS: usize = 187;

    fn track(id: u32, voice: &str, pattern: Pattern) -> TrackData {
        TrackData {
            id: TrackId(id),
            voice: voice.into(),
            spec: None,
            pattern,
            dsl: String::new(),
            playing: true,
            gain: 1.0,
            pan: 0.0,
            prob: 1.0,
            offset: 0,
            octave: OctaveRange::default(),
            starts_at: None,
        }
    }

    fn install(reg: &mut TrackRegistry, backend: &mut RecordingBackend, data: TrackData) {
        let kit = builtin_kit();
        let rt = TrackRuntime::build(backend, kit.voice(&data.voice).unwrap(), MixParams::default())
            .unwrap();
        reg.install(data, rt);
    }

    fn run(
        clock: &mut MasterClock,
        reg: &TrackRegistry,
        backend: &mut RecordingBackend,
        blocks: usize,
    ) -> Vec<Firing> {
        let mut firings = Vec::new();
        for _ in 0..blocks {
            clock.advance(BLOCK, reg, backend, |f| firings.push(f));
        }
        firings
    }

    #[test]
    fn stopped_clock_fires_nothing() {
        let mut backend = RecordingBackend::new(SR);
        let mut reg = TrackRegistry::new();
        install(&mut reg, &mut backend, track(0, "kick", pulse(4, 16)));
        let mut clock = MasterClock::new(120.0, SR, 4, Some(1));
        assert!(run(&mut clock, &reg, &mut backend, 50).is_empty());
        assert!(backend.triggers().is_empty());
        assert_eq!(clock.now(), AudioTime(50 * BLOCK as u64));
    }

    #[test]
    fn triggers_land_on_exact_frames() {
        let mut backend = RecordingBackend::new(SR);
        let mut reg = TrackRegistry::new();
        install(&mut reg, &mut backend, track(0, "kick", pulse(4, 16)));
        let voice = reg.runtime(TrackId(0)).unwrap().voice;
        let mut clock = MasterClock::new(120.0, SR, 4, Some(1));
        clock.start();

        let firings = run(&mut clock, &reg, &mut backend, MEASURE_BLOCKS);
        assert_eq!(
            backend.triggers_for(voice),
            vec![AudioTime(0), AudioTime(24000), AudioTime(48000), AudioTime(72000)]
        );
        assert_eq!(firings.iter().map(|f| f.step).collect::<Vec<_>>(), [0, 4, 8, 12]);
        assert_eq!(clock.next_step(), 16);
    }

    #[test]
    fn triggers_carry_default_note_and_length() {
        let mut backend = RecordingBackend::new(SR);
        let mut reg = TrackRegistry::new();
        install(&mut reg, &mut backend, track(0, "hat", pulse(1, 16)));
        let mut clock = MasterClock::new(120.0, SR, 4, Some(1));
        clock.start();
        clock.advance(BLOCK, &reg, &mut backend, |_| {});

        // 16n at 120 bpm is 0.125 s
        let durations: Vec<(String, u64)> = backend
            .calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::Trigger { note, duration, .. } => Some((note.clone(), *duration)),
                _ => None,
            })
            .collect();
        assert_eq!(durations, vec![("G#6".to_string(), 6000)]);
    }

    #[test]
    fn zero_probability_never_triggers() {
        let mut backend = RecordingBackend::new(SR);
        let mut reg = TrackRegistry::new();
        let mut data = track(0, "kick", pulse(16, 16));
        data.prob = 0.0;
        install(&mut reg, &mut backend, data);
        let mut clock = MasterClock::new(120.0, SR, 4, Some(7));
        clock.start();
        assert!(run(&mut clock, &reg, &mut backend, 500).is_empty());
        assert!(backend.triggers().is_empty());
    }

    #[test]
    fn half_probability_is_roughly_half() {
        let mut backend = RecordingBackend::new(SR);
        let mut reg = TrackRegistry::new();
        let mut data = track(0, "kick", pulse(16, 16));
        data.prob = 0.5;
        install(&mut reg, &mut backend, data);
        let mut clock = MasterClock::new(120.0, SR, 4, Some(42));
        clock.start();
        let mut steps = 0;
        while steps < 800 {
            steps += clock.advance(BLOCK, &reg, &mut backend, |_| {});
        }
        let hits = backend.triggers().len() as f64 / steps as f64;
        assert!((0.4..0.6).contains(&hits), "hit ratio {hits}");
    }

    #[test]
    fn tracks_without_runtime_or_play_flag_are_silent() {
        let mut backend = RecordingBackend::new(SR);
        let mut reg = TrackRegistry::new();
        install(&mut reg, &mut backend, track(0, "kick", pulse(4, 16)));
        let mut paused = track(1, "snare", pulse(4, 16));
        paused.playing = false;
        install(&mut reg, &mut backend, paused);
        install(&mut reg, &mut backend, track(2, "hat", pulse(4, 16)));
        let orphan = reg.take_runtime(TrackId(2)).unwrap();
        orphan.dispose(&mut backend).unwrap();

        let voice = reg.runtime(TrackId(0)).unwrap().voice;
        let mut clock = MasterClock::new(120.0, SR, 4, Some(3));
        clock.start();
        run(&mut clock, &reg, &mut backend, MEASURE_BLOCKS);
        assert!(backend.triggers().iter().all(|(v, _, _)| *v == voice));
        assert_eq!(backend.triggers().len(), 4);
    }

    #[test]
    fn deferred_start_waits_for_measure() {
        let mut backend = RecordingBackend::new(SR);
        let mut reg = TrackRegistry::new();
        let mut data = track(0, "kick", pulse(16, 16));
        data.starts_at = Some(16);
        install(&mut reg, &mut backend, data);
        let mut clock = MasterClock::new(120.0, SR, 4, Some(3));
        clock.start();

        let firings = run(&mut clock, &reg, &mut backend, MEASURE_BLOCKS + 12);
        assert_eq!(firings.first().map(|f| f.step), Some(16));
        assert_eq!(firings[0].at, AudioTime(96000));
    }

    #[test]
    fn melodic_notes_take_the_track_octave() {
        let mut backend = RecordingBackend::new(SR);
        let mut reg = TrackRegistry::new();
        let arp = resolve(&PatternSpec::Arp { degrees: vec![1] }, "C", "major");
        let mut data = track(0, "lead", arp);
        data.octave = OctaveRange::fixed(5);
        install(&mut reg, &mut backend, data);
        let mut clock = MasterClock::new(120.0, SR, 4, Some(3));
        clock.start();
        run(&mut clock, &reg, &mut backend, 46); // steps 0..4

        let notes: Vec<&str> = backend.triggers().iter().map(|(_, n, _)| *n).collect();
        assert_eq!(notes, ["C5", "E5", "G5", "C5"]);
    }

    #[test]
    fn octave_ranges_are_sampled() {
        let mut backend = RecordingBackend::new(SR);
        let mut reg = TrackRegistry::new();
        let arp = resolve(&PatternSpec::Arp { degrees: vec![1] }, "C", "major");
        let mut data = track(0, "lead", arp);
        data.octave = OctaveRange::new(3, 4);
        install(&mut reg, &mut backend, data);
        let mut clock = MasterClock::new(120.0, SR, 4, Some(11));
        clock.start();
        run(&mut clock, &reg, &mut backend, MEASURE_BLOCKS * 4);

        let triggers = backend.triggers();
        assert!(triggers.iter().all(|(_, n, _)| n.ends_with('3') || n.ends_with('4')));
        assert!(triggers.iter().any(|(_, n, _)| n.ends_with('3')));
        assert!(triggers.iter().any(|(_, n, _)| n.ends_with('4')));
    }

    #[test]
    fn stop_resets_the_step_counter() {
        let mut backend = RecordingBackend::new(SR);
        let reg = TrackRegistry::new();
        let mut clock = MasterClock::new(120.0, SR, 4, Some(1));
        clock.start();
        run(&mut clock, &reg, &mut backend, 30);
        assert!(clock.next_step() > 0);
        assert!(!clock.toggle());
        assert_eq!(clock.next_step(), 0);
        assert!(clock.toggle());
        assert_eq!(clock.deferred_start_step(), 0);
    }

    #[test]
    fn tempo_change_applies_to_later_steps() {
        let mut backend = RecordingBackend::new(SR);
        let mut reg = TrackRegistry::new();
        install(&mut reg, &mut backend, track(0, "kick", pulse(16, 16)));
        let mut clock = MasterClock::new(120.0, SR, 4, Some(1));
        clock.start();
        // 6000 frames per step at 120, 3000 at 240
        clock.advance(6000, &reg, &mut backend, |_| {});
        clock.set_bpm(240.0);
        clock.advance(6000, &reg, &mut backend, |_| {});
        let at: Vec<u64> = backend.triggers().iter().map(|(_, _, t)| t.frames()).collect();
        assert_eq!(at, [0, 6000, 9000]);
    }
}
