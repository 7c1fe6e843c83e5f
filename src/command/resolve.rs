//! Update classification and the pure merge of an update into track state.

use tracing::warn;

use super::update::TrackUpdate;
use crate::pattern::{generate_on, resolve, Pattern, PatternSpec};
use crate::track::{OctaveRange, TrackData};

pub const DEFAULT_VOICE: &str = "kick";
pub const DEFAULT_GAIN: f64 = 1.0;
pub const DEFAULT_PAN: f64 = 0.0;
pub const DEFAULT_PROB: f64 = 1.0;

/// How much of a track a command touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Only `start()` / `stop()`, or nothing at all.
    StartStop,
    /// Only mix parameters, probability and octave range.
    Hot,
    /// Voice, pattern or rotation changes. Rebuilds the runtime.
    Cold,
}

impl UpdateKind {
    pub fn classify(update: &TrackUpdate) -> Self {
        let structural = update.voice.is_some()
            || update.spec.is_some()
            || !update.on_steps.is_empty()
            || !update.off_steps.is_empty()
            || update.offset.is_some();
        if structural {
            return UpdateKind::Cold;
        }
        let hot = update.gain.is_some()
            || update.pan.is_some()
            || update.prob.is_some()
            || update.octave.is_some();
        if hot {
            UpdateKind::Hot
        } else {
            UpdateKind::StartStop
        }
    }
}

/// A complete track state computed from an update and the prior state.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTrackState {
    pub voice: String,
    pub spec: Option<PatternSpec>,
    pub pattern: Pattern,
    pub gain: f64,
    pub pan: f64,
    pub prob: f64,
    pub offset: i64,
    pub octave: OctaveRange,
    pub playing: bool,
}

/// Play flag after an update: explicit stop, then explicit start, then the
/// prior state. New tracks play.
pub fn next_playing(update: &TrackUpdate, existing: Option<&TrackData>) -> bool {
    if update.stop {
        false
    } else if update.start {
        true
    } else {
        existing.map_or(true, |t| t.playing)
    }
}

/// Merge `update` into `existing`. Every field falls back update →
/// existing → default.
///
/// The pattern is rebuilt from the unrotated base: a fresh resolution of a
/// new spec, or the existing pattern rotated back by its old offset. The
/// `on`/`off` modifiers apply to that base, then the final offset rotates
/// it once.
pub fn resolve_track_state(
    update: &TrackUpdate,
    existing: Option<&TrackData>,
    key: &str,
    scale: &str,
) -> ResolvedTrackState {
    let voice = update
        .voice
        .clone()
        .or_else(|| existing.map(|t| t.voice.clone()))
        .unwrap_or_else(|| DEFAULT_VOICE.to_string());
    let gain = update.gain.or(existing.map(|t| t.gain)).unwrap_or(DEFAULT_GAIN);
    let pan = update.pan.or(existing.map(|t| t.pan)).unwrap_or(DEFAULT_PAN);
    let prob = update.prob.or(existing.map(|t| t.prob)).unwrap_or(DEFAULT_PROB);
    let offset = update.offset.or(existing.map(|t| t.offset)).unwrap_or(0);
    let octave = update
        .octave
        .or(existing.map(|t| t.octave))
        .unwrap_or_default();

    let (mut spec, mut base) = match (&update.spec, existing) {
        (Some(spec), _) => (Some(spec.clone()), resolve(spec, key, scale)),
        (None, Some(track)) => match &track.spec {
            Some(spec) if track.pattern.is_empty() => {
                (Some(spec.clone()), resolve(spec, key, scale))
            }
            Some(spec) => {
                let unrotated = track.pattern.apply_offset(track.offset.saturating_neg());
                (Some(spec.clone()), unrotated)
            }
            None => (None, Pattern::default()),
        },
        (None, None) => (None, Pattern::default()),
    };

    if !update.on_steps.is_empty() {
        if base.is_empty() {
            spec = Some(PatternSpec::On {
                steps: update.on_steps.clone(),
            });
            base = generate_on(&update.on_steps);
        } else if let Err(e) = base.apply_on(&update.on_steps) {
            warn!(error = %e, "ignoring on()");
        }
    }
    if !update.off_steps.is_empty() {
        if let Err(e) = base.apply_off(&update.off_steps) {
            warn!(error = %e, "ignoring off()");
        }
    }

    ResolvedTrackState {
        voice,
        spec,
        pattern: base.apply_offset(offset),
        gain,
        pan,
        prob,
        offset,
        octave,
        playing: next_playing(update, existing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::update::extract_update;
    use crate::dsl::{parse, Command};
    use crate::pattern::{pulse, StepValue, MAX_STEPS};
    use crate::track::TrackId;

    fn update(line: &str) -> TrackUpdate {
        match parse(line).unwrap() {
            Command::Track(t) => extract_update(&t.methods),
            other => panic!("not a track command: {other:?}"),
        }
    }

    fn track_from(state: ResolvedTrackState) -> TrackData {
        TrackData {
            id: TrackId(0),
            voice: state.voice,
            spec: state.spec,
            pattern: state.pattern,
            dsl: String::new(),
            playing: state.playing,
            gain: state.gain,
            pan: state.pan,
            prob: state.prob,
            offset: state.offset,
            octave: state.octave,
            starts_at: None,
        }
    }

    fn apply(line: &str, existing: Option<&TrackData>) -> TrackData {
        track_from(resolve_track_state(&update(line), existing, "C", "major"))
    }

    #[test]
    fn classification_priority() {
        assert_eq!(UpdateKind::classify(&update("t0.start()")), UpdateKind::StartStop);
        assert_eq!(UpdateKind::classify(&update("t0.stop()")), UpdateKind::StartStop);
        assert_eq!(UpdateKind::classify(&update("t0.foo()")), UpdateKind::StartStop);
        assert_eq!(UpdateKind::classify(&update("t0.prob(0.5)")), UpdateKind::Hot);
        assert_eq!(
            UpdateKind::classify(&update("t0.gain(0.5).pan(-1).oct(3,4).start()")),
            UpdateKind::Hot
        );
        assert_eq!(UpdateKind::classify(&update("t0.voice('snare')")), UpdateKind::Cold);
        assert_eq!(UpdateKind::classify(&update("t0.offset(2).gain(1)")), UpdateKind::Cold);
        assert_eq!(UpdateKind::classify(&update("t0.off(1)")), UpdateKind::Cold);
    }

    #[test]
    fn new_track_defaults() {
        let t = apply("t0.pulse(4)", None);
        assert_eq!(t.voice, "kick");
        assert_eq!((t.gain, t.pan, t.prob, t.offset), (1.0, 0.0, 1.0, 0));
        assert_eq!(t.octave, OctaveRange::fixed(2));
        assert!(t.playing);
        assert_eq!(t.pattern.onsets(), vec![0, 4, 8, 12]);
    }

    #[test]
    fn voice_change_keeps_pattern() {
        let t0 = apply("t0.voice('kick').euclid(3,8).gain(0.7)", None);
        let t1 = apply("t0.voice('snare')", Some(&t0));
        assert_eq!(t1.voice, "snare");
        assert_eq!(t1.pattern, t0.pattern);
        assert_eq!(t1.spec, t0.spec);
        assert_eq!(t1.gain, 0.7);
    }

    #[test]
    fn on_seeds_a_pattern_when_none_exists() {
        let t = apply("t0.on(1,5,9)", None);
        assert_eq!(t.spec, Some(PatternSpec::On { steps: vec![1, 5, 9] }));
        assert_eq!(t.pattern.onsets(), vec![0, 4, 8]);
    }

    #[test]
    fn on_off_modify_existing() {
        let t0 = apply("t0.pulse(4)", None);
        let t1 = apply("t0.on(2).off(1)", Some(&t0));
        assert_eq!(t1.pattern.onsets(), vec![1, 4, 8, 12]);
        assert_eq!(t1.spec, t0.spec);
    }

    #[test]
    fn off_without_pattern_stays_empty() {
        let t = apply("t0.off(3)", None);
        assert!(t.pattern.is_empty());
        assert_eq!(t.spec, None);
    }

    #[test]
    fn offset_rotates_once() {
        let t0 = apply("t0.pulse(1,4)", None);
        let t1 = apply("t0.offset(1)", Some(&t0));
        assert_eq!(t1.pattern.grid(), "...x");
        // a second cold command does not rotate again
        let t2 = apply("t0.voice('snare')", Some(&t1));
        assert_eq!(t2.pattern.grid(), "...x");
        let t3 = apply("t0.offset(0)", Some(&t2));
        assert_eq!(t3.pattern, t0.pattern);
    }

    #[test]
    fn modifiers_apply_before_rotation() {
        let t0 = apply("t0.pulse(1,4).offset(1)", None);
        assert_eq!(t0.pattern.grid(), "...x");
        // position 2 of the unrotated pattern, shown rotated
        let t1 = apply("t0.on(2)", Some(&t0));
        assert_eq!(t1.pattern.grid(), "x..x");
    }

    #[test]
    fn melodic_patterns_ignore_on_off() {
        let t0 = apply("t0.arp(1,4,5)", None);
        let t1 = apply("t0.on(2).off(1)", Some(&t0));
        assert_eq!(t1.pattern, t0.pattern);
    }

    #[test]
    fn arp_in_c_major_is_twelve_notes() {
        let t = apply("t1.arp(1,4,5)", None);
        assert_eq!(t.pattern.len(), 12);
        assert!(t.pattern.is_melodic());
        let first: Vec<&StepValue> = t.pattern.steps().iter().take(3).collect();
        assert_eq!(
            first,
            [
                &StepValue::Note("C4".into()),
                &StepValue::Note("E4".into()),
                &StepValue::Note("G4".into())
            ]
        );
    }

    #[test]
    fn play_state_precedence() {
        let playing = apply("t0.pulse(4)", None);
        assert!(!apply("t0.pulse(2).start().stop()", Some(&playing)).playing);
        let stopped = apply("t0.stop()", Some(&playing));
        assert!(!stopped.playing);
        assert!(!apply("t0.pulse(3)", Some(&stopped)).playing);
        assert!(apply("t0.pulse(3).start()", Some(&stopped)).playing);
    }

    #[test]
    fn cached_pattern_reused() {
        let mut t0 = apply("t0.pulse(4)", None);
        // a hand-edited cache proves the spec is not re-resolved
        t0.pattern = pulse(2, 16);
        let t1 = apply("t0.voice('hat')", Some(&t0));
        assert_eq!(t1.pattern, pulse(2, 16));
    }

    #[test]
    fn huge_offsets_survive_later_cold_commands() {
        let t0 = apply("t0.pulse(1,4).offset(-1e19)", None);
        assert_eq!(t0.offset, -(MAX_STEPS as i64));
        // -1024 is a whole number of turns of a 4-step pattern
        assert_eq!(t0.pattern.grid(), "x...");
        let t1 = apply("t0.voice('snare')", Some(&t0));
        assert_eq!(t1.pattern, t0.pattern);
        assert_eq!(t1.offset, t0.offset);

        let mut odd = apply("t0.pulse(1,4)", None);
        odd.offset = i64::MIN;
        let t2 = apply("t0.gain(0.5).voice('hat')", Some(&odd));
        assert_eq!(t2.pattern.len(), 4);
    }
}
