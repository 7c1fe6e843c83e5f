//! One-shot note rendering for kit voices.
//!
//! Each call produces a mono buffer for a single triggered note, release
//! tail included. The mixer places the buffer on the timeline.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::oscillator::{note_to_freq, Phase, Waveform};
use super::sample::SAMPLE_ROOT_NOTE;
use crate::kit::{SynthKind, ToneConfig, VoiceKind};

/// Upper bound on a rendered note, tail included.
pub const MAX_NOTE_SECONDS: f64 = 8.0;

/// Pitch used when a note name cannot be parsed.
const FALLBACK_FREQ: f64 = 261.625_565;

/// Render `note` held for `held` seconds. `seed` drives the noise of
/// metal voices.
pub fn render_note(kind: &VoiceKind, note: &str, held: f64, sample_rate: u32, seed: u64) -> Vec<f32> {
    let freq = note_to_freq(note).unwrap_or(FALLBACK_FREQ);
    let held = held.max(0.0);
    match kind {
        VoiceKind::Tone(tone) => match tone.synth {
            SynthKind::Membrane => membrane(tone, freq, held, sample_rate),
            SynthKind::Metal => metal(tone, freq, held, sample_rate, seed),
            SynthKind::Synth => synth(tone, freq, held, sample_rate),
        },
        VoiceKind::Sample(data) => {
            let root = note_to_freq(SAMPLE_ROOT_NOTE).unwrap_or(FALLBACK_FREQ);
            let max_frames = (MAX_NOTE_SECONDS * sample_rate as f64) as usize;
            data.render_pitched(freq / root, max_frames)
        }
    }
}

fn frame_count(seconds: f64, sample_rate: u32) -> usize {
    (seconds.min(MAX_NOTE_SECONDS) * sample_rate as f64) as usize
}

/// Sine (or configured waveform) with an exponential pitch sweep from
/// `octaves` above the note down to the note.
fn membrane(tone: &ToneConfig, freq: f64, held: f64, sample_rate: u32) -> Vec<f32> {
    let env = tone.envelope();
    let waveform = tone.waveform();
    let sweep = 2f64.powf(tone.octaves());
    let decay = tone.pitch_decay().max(1e-4);
    let sr = sample_rate as f64;
    let mut phase = Phase::default();

    (0..frame_count(env.total_duration(held), sample_rate))
        .map(|i| {
            let t = i as f64 / sr;
            let f = freq * (1.0 + (sweep - 1.0) * (-t / decay).exp());
            let f = f.min(sr * 0.45);
            (waveform.sample(phase.tick(f, sr)) * env.amplitude(t, held)) as f32
        })
        .collect()
}

/// Inharmonic square partials plus white noise through a one-pole
/// high-pass.
fn metal(tone: &ToneConfig, freq: f64, held: f64, sample_rate: u32, seed: u64) -> Vec<f32> {
    const RATIOS: [f64; 3] = [1.0, 1.483, 1.932];

    let env = tone.envelope();
    let sr = sample_rate as f64;
    let cutoff = tone.filter_cutoff().unwrap_or(4000.0).clamp(20.0, sr * 0.45);
    let rc = 1.0 / (std::f64::consts::TAU * cutoff);
    let alpha = rc / (rc + 1.0 / sr);
    // more octaves, more noise
    let noise_mix = (tone.octaves() / 4.0).clamp(0.1, 0.9);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut phases = [Phase::default(); 3];
    let (mut prev_in, mut prev_out) = (0.0_f64, 0.0_f64);

    (0..frame_count(env.total_duration(held), sample_rate))
        .map(|i| {
            let t = i as f64 / sr;
            let partials: f64 = phases
                .iter_mut()
                .zip(RATIOS)
                .map(|(p, r)| Waveform::Square.sample(p.tick((freq * r).min(sr * 0.45), sr)))
                .sum::<f64>()
                / RATIOS.len() as f64;
            let noise: f64 = rng.gen_range(-1.0..1.0);
            let x = partials * (1.0 - noise_mix) + noise * noise_mix;
            let y = alpha * (prev_out + x - prev_in);
            prev_in = x;
            prev_out = y;
            ((y * 0.5).clamp(-1.0, 1.0) * env.amplitude(t, held)) as f32
        })
        .collect()
}

/// Oscillator through the ADSR and an optional one-pole low-pass.
fn synth(tone: &ToneConfig, freq: f64, held: f64, sample_rate: u32) -> Vec<f32> {
    let env = tone.envelope();
    let waveform = tone.waveform();
    let sr = sample_rate as f64;
    let alpha = tone.filter_cutoff().map(|cutoff| {
        let dt = 1.0 / sr;
        let rc = 1.0 / (std::f64::consts::TAU * cutoff.max(1.0));
        dt / (rc + dt)
    });
    let mut phase = Phase::default();
    let mut lp = 0.0_f64;

    (0..frame_count(env.total_duration(held), sample_rate))
        .map(|i| {
            let t = i as f64 / sr;
            let mut x = waveform.sample(phase.tick(freq, sr));
            if let Some(a) = alpha {
                lp += a * (x - lp);
                x = lp;
            }
            (x * env.amplitude(t, held)) as f32
        })
        .collect()
}
