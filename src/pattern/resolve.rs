//! Spec → pattern resolution.

use tracing::warn;

use super::{Pattern, PatternSpec, StepValue, DEFAULT_STEPS, MAX_STEPS};
use crate::theory::degree_chord;

/// Sub-steps emitted per arpeggio degree.
pub const ARP_SUBSTEPS: usize = 4;

/// Octave written into arpeggio notes. The clock replaces it with the
/// track's octave range at trigger time.
pub const ARP_OCTAVE: i32 = 4;

/// Resolve a spec into a concrete pattern. `key` and `scale` only matter for
/// arpeggios.
pub fn resolve(spec: &PatternSpec, key: &str, scale: &str) -> Pattern {
    match spec {
        PatternSpec::Pulse { hits, steps } => pulse(*hits, *steps),
        PatternSpec::Euclid { k, n } => euclid(*k, *n),
        PatternSpec::On { steps } => generate_on(steps),
        PatternSpec::Arp { degrees } => arp(degrees, key, scale),
    }
}

/// `hits` onsets spread proportionally across `steps` slots: slot
/// `floor(i * steps / hits)` is a hit for each `i < hits`.
pub fn pulse(hits: u32, steps: u32) -> Pattern {
    let steps = steps.min(MAX_STEPS) as u64;
    let hits = hits.min(MAX_STEPS) as u64;
    let mut out = vec![false; steps as usize];
    if hits == 0 || steps == 0 {
        return Pattern::from_hits(out);
    }
    for i in 0..hits {
        let idx = (i * steps / hits) as usize;
        out[idx] = true;
    }
    Pattern::from_hits(out)
}

/// `k` onsets over `n` slots by bucket boundaries: slot `i` is a hit when
/// `floor(i*k/n)` differs from the previous slot's bucket. Slot 0 compares
/// against bucket `-1`, so it is always an onset when `0 < k < n`.
pub fn euclid(k: u32, n: u32) -> Pattern {
    let n = n.min(MAX_STEPS) as i64;
    let k = k as i64;
    if k == 0 || n == 0 || k > n {
        return Pattern::silent(n as usize);
    }
    if k == n {
        return Pattern::from_hits(vec![true; n as usize]);
    }
    let bucket = |i: i64| i * k / n;
    Pattern::from_hits((0..n).map(|i| {
        let previous = if i == 0 { -1 } else { bucket(i - 1) };
        bucket(i) != previous
    }))
}

/// Explicit 1-indexed onsets. Length is `max(16, max(steps))`; positions
/// are clamped into `[1, length]`.
pub fn generate_on(steps: &[i64]) -> Pattern {
    let longest = steps.iter().copied().max().unwrap_or(0);
    let len = longest
        .clamp(DEFAULT_STEPS as i64, MAX_STEPS as i64) as usize;
    let mut out = vec![false; len];
    for &pos in steps {
        let idx = pos.clamp(1, len as i64) as usize - 1;
        out[idx] = true;
    }
    Pattern::from_hits(out)
}

/// Arpeggiate the triad on each scale degree: [`ARP_SUBSTEPS`] notes per
/// degree, cycling root, third, fifth. A degree whose chord cannot be
/// resolved contributes silent steps.
pub fn arp(degrees: &[i64], key: &str, scale: &str) -> Pattern {
    let mut steps = Vec::with_capacity(degrees.len() * ARP_SUBSTEPS);
    for &degree in degrees {
        match degree_chord(key, scale, degree) {
            Ok(tones) if !tones.is_empty() => {
                steps.extend(
                    (0..ARP_SUBSTEPS)
                        .map(|j| StepValue::Note(tones[j % tones.len()].with_octave(ARP_OCTAVE))),
                );
            }
            Ok(_) => {
                warn!(degree, key, scale, "empty chord, substituting rests");
                steps.extend(std::iter::repeat(StepValue::Rest).take(ARP_SUBSTEPS));
            }
            Err(e) => {
                warn!(degree, key, scale, error = %e, "cannot resolve chord, substituting rests");
                steps.extend(std::iter::repeat(StepValue::Rest).take(ARP_SUBSTEPS));
            }
        }
    }
    Pattern::new(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(p: &Pattern) -> Vec<usize> {
        p.onsets()
    }

    #[test]
    fn pulse_four_on_sixteen() {
        let p = pulse(4, 16);
        assert_eq!(p.len(), 16);
        assert_eq!(hits(&p), vec![0, 4, 8, 12]);
    }

    #[test]
    fn pulse_uneven_rounds_down() {
        // 16/3 = 5.33: floor gives 0, 5, 10
        assert_eq!(hits(&pulse(3, 16)), vec![0, 5, 10]);
        assert_eq!(hits(&pulse(5, 8)), vec![0, 1, 3, 4, 6]);
    }

    #[test]
    fn pulse_hit_count_matches_for_all_hits_le_steps() {
        for steps in 1..=32u32 {
            for h in 0..=steps {
                let p = pulse(h, steps);
                assert_eq!(p.len(), steps as usize);
                let onsets = hits(&p);
                assert_eq!(onsets.len(), h as usize, "pulse({h},{steps})");
                let expected: Vec<usize> = (0..h as u64)
                    .map(|i| (i * steps as u64 / h as u64) as usize)
                    .collect();
                assert_eq!(onsets, expected);
            }
        }
    }

    #[test]
    fn pulse_degenerate() {
        assert_eq!(pulse(0, 8), Pattern::silent(8));
        assert!(pulse(4, 0).is_empty());
    }

    #[test]
    fn euclid_exact_onset_count() {
        for n in 0..=32u32 {
            for k in 0..=n {
                let p = euclid(k, n);
                assert_eq!(p.len(), n as usize);
                assert_eq!(hits(&p).len(), k as usize, "euclid({k},{n})");
            }
        }
    }

    #[test]
    fn euclid_extremes() {
        assert_eq!(euclid(0, 8), Pattern::silent(8));
        assert_eq!(euclid(8, 8), Pattern::from_hits(vec![true; 8]));
        assert_eq!(euclid(9, 8), Pattern::silent(8));
    }

    #[test]
    fn euclid_known_shapes() {
        assert_eq!(euclid(3, 8).grid(), "x..x..x.");
        assert_eq!(euclid(5, 8).grid(), "x.x.xx.x");
        assert_eq!(euclid(4, 16).grid(), "x...x...x...x...");
    }

    #[test]
    fn on_pattern_length_and_positions() {
        let p = generate_on(&[1, 5, 9]);
        assert_eq!(p.len(), 16);
        assert_eq!(hits(&p), vec![0, 4, 8]);

        let long = generate_on(&[1, 20]);
        assert_eq!(long.len(), 20);
        assert_eq!(hits(&long), vec![0, 19]);
    }

    #[test]
    fn on_pattern_clamps_positions() {
        let p = generate_on(&[0, -3]);
        assert_eq!(p.len(), 16);
        assert_eq!(hits(&p), vec![0]);
        assert_eq!(generate_on(&[]), Pattern::silent(16));
    }

    #[test]
    fn arp_in_c_major() {
        let p = arp(&[1, 4, 5], "C", "major");
        assert_eq!(p.len(), 12);
        assert!(p.steps().iter().all(|s| matches!(s, StepValue::Note(_))));
        let notes: Vec<String> = p
            .steps()
            .iter()
            .map(|s| match s {
                StepValue::Note(n) => n.clone(),
                _ => String::new(),
            })
            .collect();
        assert_eq!(
            notes,
            ["C4", "E4", "G4", "C4", "F4", "A4", "C4", "F4", "G4", "B4", "D4", "G4"]
        );
    }

    #[test]
    fn arp_invalid_scale_degrades_to_rests() {
        let p = arp(&[1, 2], "C", "no-such-scale");
        assert_eq!(p, Pattern::silent(8));
        assert!(!p.is_melodic());
    }

    #[test]
    fn resolve_dispatches() {
        let spec = PatternSpec::Euclid { k: 3, n: 8 };
        assert_eq!(resolve(&spec, "C", "major"), euclid(3, 8));
        let spec = PatternSpec::Arp { degrees: vec![1] };
        assert!(resolve(&spec, "A", "minor").is_melodic());
    }
}
