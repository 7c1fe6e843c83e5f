//! Applying parsed commands to the session.

use tracing::{debug, info, warn};

use super::Session;
use crate::backend::{AudioBackend, MixParams};
use crate::command::{
    extract_update, next_playing, resolve_track_state, CommandError, TrackUpdate, UpdateKind,
};
use crate::dsl::{parse, Command, GlobalCommand, TrackCommand};
use crate::pattern::resolve;
use crate::track::{TrackData, TrackId, TrackRuntime};

impl<B: AudioBackend> Session<B> {
    pub(super) fn apply(&mut self, line: &str) -> Result<String, CommandError> {
        match parse(line)? {
            Command::Global(global) => self.apply_global(global),
            Command::Track(track) => self.apply_track(line.trim(), &track),
        }
    }

    fn apply_global(&mut self, command: GlobalCommand) -> Result<String, CommandError> {
        match command {
            GlobalCommand::Key(key) => {
                self.state.key = key;
                let n = self.reresolve_tonal();
                Ok(format!("key {} ({n} melodic tracks updated)", self.state.key))
            }
            GlobalCommand::Scale(scale) => {
                self.state.scale = scale;
                let n = self.reresolve_tonal();
                Ok(format!("scale {} ({n} melodic tracks updated)", self.state.scale))
            }
            GlobalCommand::Bpm(0) => Err(CommandError::InvalidTempo(0)),
            GlobalCommand::Bpm(bpm) => {
                self.state.bpm = bpm;
                self.clock.set_bpm(bpm as f64);
                info!(bpm, "tempo changed");
                Ok(format!("bpm {bpm}"))
            }
            GlobalCommand::Stop => {
                self.registry.pause_all();
                Ok("all tracks stopped".into())
            }
        }
    }

    /// Re-resolve every arpeggio against the current key and scale.
    /// Rhythmic tracks are left alone.
    fn reresolve_tonal(&mut self) -> usize {
        let mut updated = 0;
        for track in self.registry.iter_mut() {
            let Some(spec) = track.spec.as_ref().filter(|s| s.is_tonal()) else {
                continue;
            };
            track.pattern = resolve(spec, &self.state.key, &self.state.scale).apply_offset(track.offset);
            updated += 1;
        }
        updated
    }

    fn apply_track(&mut self, line: &str, command: &TrackCommand) -> Result<String, CommandError> {
        let id = TrackId(command.track);
        let update = extract_update(&command.methods);
        let kind = UpdateKind::classify(&update);
        debug!(track = %id, ?kind, "classified command");

        match kind {
            UpdateKind::StartStop => self.start_stop(id, &update),
            UpdateKind::Hot if self.registry.contains(id) => self.hot_update(id, &update),
            // hot parameters for a track that doesn't exist yet create it
            _ => self.cold_update(id, line, &update),
        }
    }

    fn start_stop(&mut self, id: TrackId, update: &TrackUpdate) -> Result<String, CommandError> {
        let existing = self.registry.get(id).ok_or(CommandError::UnknownTrack(id))?;
        let playing = next_playing(update, Some(existing));
        self.set_playing(id, playing);
        Ok(self.describe_play_state(id))
    }

    /// Mix, probability and octave only. The runtime is kept.
    fn hot_update(&mut self, id: TrackId, update: &TrackUpdate) -> Result<String, CommandError> {
        let existing = self.registry.get(id).ok_or(CommandError::UnknownTrack(id))?;
        let mix = MixParams {
            gain: update.gain.unwrap_or(existing.gain),
            pan: update.pan.unwrap_or(existing.pan),
        };
        let playing = next_playing(update, Some(existing));
        if let Some(runtime) = self.registry.runtime(id) {
            self.backend.set_mix(runtime.channel, mix)?;
        }

        if let Some(track) = self.registry.get_mut(id) {
            track.gain = mix.gain;
            track.pan = mix.pan;
            if let Some(prob) = update.prob {
                track.prob = prob;
            }
            if let Some(octave) = update.octave {
                track.octave = octave;
            }
        }
        self.set_playing(id, playing);
        Ok(format!(
            "{} gain {:.2} pan {:.2}",
            self.describe_play_state(id),
            mix.gain,
            mix.pan
        ))
    }

    /// Rebuild the track: new state, new voice and channel. The new runtime
    /// is complete before the old one is released and the entry swapped.
    fn cold_update(
        &mut self,
        id: TrackId,
        line: &str,
        update: &TrackUpdate,
    ) -> Result<String, CommandError> {
        let kit = self.kit.as_ref().ok_or(CommandError::KitNotLoaded)?;
        let existing = self.registry.get(id);
        let resolved = resolve_track_state(update, existing, &self.state.key, &self.state.scale);
        let voice = kit
            .voice(&resolved.voice)
            .ok_or_else(|| CommandError::UnknownVoice(resolved.voice.clone()))?;

        let was_playing = existing.is_some_and(|t| t.playing);
        let pending_start = existing.and_then(|t| t.starts_at);
        let mix = MixParams {
            gain: resolved.gain,
            pan: resolved.pan,
        };
        let voice_name = voice.name.clone();
        let runtime = TrackRuntime::build(&mut self.backend, voice, mix)?;

        if let Some(old) = self.registry.take_runtime(id) {
            if let Err(e) = old.dispose(&mut self.backend) {
                warn!(track = %id, error = %e, "failed to dispose previous runtime");
            }
        }

        let starts_at = match (resolved.playing, was_playing) {
            (false, _) => None,
            (true, true) => pending_start,
            (true, false) => self
                .clock
                .is_running()
                .then(|| self.clock.deferred_start_step()),
        };
        let message = format!(
            "{id} {voice_name} {}{}",
            resolved
                .spec
                .as_ref()
                .map_or_else(|| "(no pattern)".to_string(), |s| s.to_string()),
            if resolved.playing { "" } else { " (stopped)" },
        );
        self.registry.install(
            TrackData {
                id,
                voice: voice_name,
                spec: resolved.spec,
                pattern: resolved.pattern,
                dsl: line.to_string(),
                playing: resolved.playing,
                gain: resolved.gain,
                pan: resolved.pan,
                prob: resolved.prob,
                offset: resolved.offset,
                octave: resolved.octave,
                starts_at,
            },
            runtime,
        );
        Ok(message)
    }

    /// Set the play flag. Starting while the clock runs waits for the next
    /// measure; stopping is immediate.
    fn set_playing(&mut self, id: TrackId, playing: bool) {
        let deferred = self
            .clock
            .is_running()
            .then(|| self.clock.deferred_start_step());
        let Some(track) = self.registry.get_mut(id) else {
            return;
        };
        if !playing {
            track.starts_at = None;
        } else if !track.playing {
            track.starts_at = deferred;
        }
        track.playing = playing;
    }

    fn describe_play_state(&self, id: TrackId) -> String {
        match self.registry.get(id) {
            Some(t) if !t.playing => format!("{id} stopped"),
            Some(TrackData {
                starts_at: Some(step),
                ..
            }) => format!("{id} starts at step {step}"),
            Some(_) => format!("{id} playing"),
            None => format!("{id} missing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::{BackendCall, RecordingBackend};
    use crate::config::Config;
    use crate::kit::builtin_kit;
    use crate::pattern::PatternSpec;
    use crate::session::Session;
    use crate::track::TrackId;

    fn session() -> Session<RecordingBackend> {
        let config = Config {
            seed: Some(5),
            ..Config::default()
        };
        Session::new(RecordingBackend::new(48000), Some(builtin_kit()), &config)
    }

    #[test]
    fn key_change_reresolves_arps_only() {
        let mut s = session();
        s.submit("t0.pulse(4)");
        s.submit("t1.voice('lead').arp(1)");
        let before = s.snapshot();
        let entry = s.submit("key('D')");
        assert!(entry.is_ok(), "{entry}");
        let after = s.snapshot();
        assert_eq!(after[0].pattern, before[0].pattern);
        assert_ne!(after[1].pattern, before[1].pattern);
        assert_eq!(
            after[1].pattern.get(0),
            Some(&crate::pattern::StepValue::Note("D4".into()))
        );
    }

    #[test]
    fn scale_change_keeps_rotation() {
        let mut s = session();
        s.submit("t0.voice('lead').arp(1).offset(1)");
        s.submit("scale('minor')");
        let t = &s.snapshot()[0];
        // C minor triad, rotated by one
        let notes: Vec<String> = t.pattern.steps().iter().map(|v| format!("{v:?}")).collect();
        assert_eq!(
            notes,
            ["Note(\"Eb4\")", "Note(\"G4\")", "Note(\"C4\")", "Note(\"C4\")"]
        );
    }

    #[test]
    fn zero_bpm_is_rejected() {
        let mut s = session();
        let entry = s.submit("bpm(0)");
        assert!(!entry.is_ok());
        assert_eq!(s.state().bpm, 120);
        assert!(s.submit("bpm(90)").is_ok());
        assert_eq!(s.state().bpm, 90);
        assert_eq!(s.clock().bpm(), 90.0);
    }

    #[test]
    fn global_stop_only_clears_play_flags() {
        let mut s = session();
        s.submit("t0.pulse(4).gain(0.5)");
        s.submit("t1.euclid(3,8)");
        s.start();
        s.submit("stop()");
        assert!(s.is_running());
        for t in s.snapshot() {
            assert!(!t.playing);
        }
        assert_eq!(s.snapshot()[0].gain, 0.5);
        assert!(s.registry().runtime(TrackId(0)).is_some());
    }

    #[test]
    fn hot_update_on_missing_track_creates_it() {
        let mut s = session();
        assert!(s.submit("t3.gain(0.4)").is_ok());
        let t = &s.snapshot()[0];
        assert_eq!(t.id, TrackId(3));
        assert_eq!(t.voice, "kick");
        assert_eq!(t.gain, 0.4);
        assert!(t.pattern.is_empty());
    }

    #[test]
    fn hot_update_sets_the_channel_mix() {
        let mut s = session();
        s.submit("t0.pulse(4)");
        let channel = s.registry().runtime(TrackId(0)).unwrap().channel;
        s.submit("t0.gain(0.25).pan(-0.5)");
        let mix = s.backend().mix(channel).unwrap();
        assert_eq!((mix.gain, mix.pan), (0.25, -0.5));
    }

    #[test]
    fn unknown_voice_changes_nothing() {
        let mut s = session();
        s.submit("t0.pulse(4)");
        let before = s.snapshot();
        let calls = s.backend().calls.len();
        let entry = s.submit("t0.voice('cowbell')");
        assert_eq!(entry.message(), "voice 'cowbell' is not in the kit");
        assert_eq!(s.snapshot(), before);
        assert_eq!(s.backend().calls.len(), calls);
    }

    #[test]
    fn missing_kit_is_a_reference_error() {
        let mut s = Session::new(RecordingBackend::new(48000), None, &Config::default());
        let entry = s.submit("t0.pulse(4)");
        assert_eq!(entry.message(), "no kit loaded");
        assert!(s.snapshot().is_empty());
    }

    #[test]
    fn failed_voice_creation_keeps_old_runtime() {
        let mut s = session();
        s.submit("t0.pulse(4)");
        let old = s.registry().runtime(TrackId(0)).unwrap().voice;
        s.backend_mut().fail_create_of("snare");
        let entry = s.submit("t0.voice('snare')");
        assert!(!entry.is_ok());
        assert_eq!(s.registry().runtime(TrackId(0)).unwrap().voice, old);
        assert_eq!(s.snapshot()[0].voice, "kick");
        assert_eq!(s.backend().live_voices(), 1);
    }

    #[test]
    fn disposal_failure_is_not_fatal() {
        let mut s = session();
        s.submit("t0.pulse(4)");
        let old = s.registry().runtime(TrackId(0)).unwrap().voice;
        s.backend_mut().fail_dispose_of(old);
        let entry = s.submit("t0.voice('snare')");
        assert!(entry.is_ok(), "{entry}");
        assert_eq!(s.snapshot()[0].voice, "snare");
    }

    #[test]
    fn new_runtime_is_built_before_old_is_disposed() {
        let mut s = session();
        s.submit("t0.pulse(4)");
        s.backend_mut().clear_calls();
        s.submit("t0.voice('hat')");
        let calls = &s.backend().calls;
        let created = calls
            .iter()
            .position(|c| matches!(c, BackendCall::Connect(..)))
            .unwrap();
        let disposed = calls
            .iter()
            .position(|c| matches!(c, BackendCall::DisposeVoice(_)))
            .unwrap();
        assert!(created < disposed);
    }

    #[test]
    fn dsl_text_follows_cold_commands() {
        let mut s = session();
        s.submit("  t0.pulse(4);  ");
        assert_eq!(s.snapshot()[0].dsl, "t0.pulse(4);");
        s.submit("t0.gain(0.5)");
        assert_eq!(s.snapshot()[0].dsl, "t0.pulse(4);");
        s.submit("t0.euclid(3,8)");
        assert_eq!(s.snapshot()[0].dsl, "t0.euclid(3,8)");
        assert_eq!(
            s.snapshot()[0].spec,
            Some(PatternSpec::Euclid { k: 3, n: 8 })
        );
    }
}
