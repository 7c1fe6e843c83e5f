//! Method chain → [`TrackUpdate`].
//!
//! Each known method name maps to a pure function that folds its arguments
//! into the update. Unknown names and argument shapes that don't fit are
//! ignored.

use crate::dsl::{Arg, MethodCall};
use crate::pattern::{PatternSpec, DEFAULT_STEPS, MAX_STEPS};
use crate::track::OctaveRange;

/// What one command asks to change. `None` / empty means "not mentioned".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackUpdate {
    pub voice: Option<String>,
    pub spec: Option<PatternSpec>,
    pub on_steps: Vec<i64>,
    pub off_steps: Vec<i64>,
    pub gain: Option<f64>,
    pub pan: Option<f64>,
    pub prob: Option<f64>,
    pub offset: Option<i64>,
    pub octave: Option<OctaveRange>,
    pub start: bool,
    pub stop: bool,
}

type Apply = fn(&mut TrackUpdate, &[Arg]);

const METHODS: &[(&str, Apply)] = &[
    ("voice", voice),
    ("pulse", pulse),
    ("euclid", euclid),
    ("on", on),
    ("off", off),
    ("arp", arp),
    ("gain", gain),
    ("pan", pan),
    ("prob", prob),
    ("offset", offset),
    ("oct", oct),
    ("start", start),
    ("stop", stop),
];

/// Fold a method chain into an update, left to right. Later methods
/// override earlier ones.
pub fn extract_update(methods: &[MethodCall]) -> TrackUpdate {
    let mut update = TrackUpdate::default();
    for method in methods {
        if let Some((_, apply)) = METHODS.iter().find(|(name, _)| *name == method.name) {
            apply(&mut update, &method.args);
        }
    }
    update
}

/// Largest stored offset magnitude: one maximal pattern length.
const MAX_OFFSET: f64 = MAX_STEPS as f64;

fn step_count(n: f64) -> u32 {
    (n as u32).min(MAX_STEPS)
}

/// A finite numeric argument. The parser already turns `inf` and `NaN`
/// into words; hand-built calls may still carry them.
fn finite(arg: &Arg) -> Option<f64> {
    arg.as_f64().filter(|n| n.is_finite())
}

/// All numeric arguments, truncated to integers in `i32` range.
fn integers(args: &[Arg]) -> Vec<i64> {
    args.iter()
        .filter_map(finite)
        .map(|n| n.clamp(i32::MIN as f64, i32::MAX as f64) as i64)
        .collect()
}

fn first_number(args: &[Arg]) -> Option<f64> {
    args.first().and_then(finite)
}

/// `(a)` or `(a, b)`, both numeric.
fn one_or_two(args: &[Arg]) -> Option<(f64, Option<f64>)> {
    match args {
        [a] => Some((finite(a)?, None)),
        [a, b] => Some((finite(a)?, Some(finite(b)?))),
        _ => None,
    }
}

fn voice(u: &mut TrackUpdate, args: &[Arg]) {
    if let Some(name) = args.first().and_then(Arg::as_str).filter(|s| !s.is_empty()) {
        u.voice = Some(name.to_string());
    }
}

fn pulse(u: &mut TrackUpdate, args: &[Arg]) {
    if let Some((hits, steps)) = one_or_two(args) {
        u.spec = Some(PatternSpec::Pulse {
            hits: step_count(hits),
            steps: steps.map_or(DEFAULT_STEPS, step_count),
        });
    }
}

fn euclid(u: &mut TrackUpdate, args: &[Arg]) {
    if let Some((k, n)) = one_or_two(args) {
        u.spec = Some(PatternSpec::Euclid {
            k: step_count(k),
            n: n.map_or(DEFAULT_STEPS, step_count),
        });
    }
}

fn on(u: &mut TrackUpdate, args: &[Arg]) {
    if !args.is_empty() {
        u.on_steps = integers(args);
    }
}

fn off(u: &mut TrackUpdate, args: &[Arg]) {
    if !args.is_empty() {
        u.off_steps = integers(args);
    }
}

fn arp(u: &mut TrackUpdate, args: &[Arg]) {
    let degrees = integers(args);
    if !degrees.is_empty() {
        u.spec = Some(PatternSpec::Arp { degrees });
    }
}

fn gain(u: &mut TrackUpdate, args: &[Arg]) {
    if let Some(g) = first_number(args) {
        u.gain = Some(g.max(0.0));
    }
}

fn pan(u: &mut TrackUpdate, args: &[Arg]) {
    if let Some(p) = first_number(args) {
        u.pan = Some(p.clamp(-1.0, 1.0));
    }
}

fn prob(u: &mut TrackUpdate, args: &[Arg]) {
    if let Some(p) = first_number(args) {
        u.prob = Some(p.clamp(0.0, 1.0));
    }
}

fn offset(u: &mut TrackUpdate, args: &[Arg]) {
    if let Some(o) = first_number(args) {
        u.offset = Some(o.clamp(-MAX_OFFSET, MAX_OFFSET) as i64);
    }
}

fn oct(u: &mut TrackUpdate, args: &[Arg]) {
    if let Some((lo, hi)) = one_or_two(args) {
        let lo = lo as i32;
        u.octave = Some(OctaveRange::new(lo, hi.map_or(lo, |h| h as i32)));
    }
}

fn start(u: &mut TrackUpdate, _: &[Arg]) {
    u.start = true;
}

fn stop(u: &mut TrackUpdate, _: &[Arg]) {
    u.stop = true;
}
