//! Scale lookup: `(tonic, scale name) -> ordered pitch classes`.

use super::note::NoteName;
use super::TheoryError;

/// A named scale shape: semitone offsets plus the letter offset used to
/// spell each degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleShape {
    pub intervals: &'static [i32],
    pub letters: &'static [usize],
}

const HEPTATONIC_LETTERS: &[usize] = &[0, 1, 2, 3, 4, 5, 6];

const IONIAN: &[i32] = &[0, 2, 4, 5, 7, 9, 11];
const DORIAN: &[i32] = &[0, 2, 3, 5, 7, 9, 10];
const PHRYGIAN: &[i32] = &[0, 1, 3, 5, 7, 8, 10];
const LYDIAN: &[i32] = &[0, 2, 4, 6, 7, 9, 11];
const MIXOLYDIAN: &[i32] = &[0, 2, 4, 5, 7, 9, 10];
const AEOLIAN: &[i32] = &[0, 2, 3, 5, 7, 8, 10];
const LOCRIAN: &[i32] = &[0, 1, 3, 5, 6, 8, 10];
const HARMONIC_MINOR: &[i32] = &[0, 2, 3, 5, 7, 8, 11];
const MELODIC_MINOR: &[i32] = &[0, 2, 3, 5, 7, 9, 11];

/// Look up a scale shape by name. Matching ignores case and surrounding
/// whitespace; `"minor"` is natural minor.
pub fn scale_shape(name: &str) -> Option<ScaleShape> {
    let heptatonic = |intervals| ScaleShape {
        intervals,
        letters: HEPTATONIC_LETTERS,
    };
    let shape = match name.trim().to_ascii_lowercase().as_str() {
        "major" | "ionian" => heptatonic(IONIAN),
        "dorian" => heptatonic(DORIAN),
        "phrygian" => heptatonic(PHRYGIAN),
        "lydian" => heptatonic(LYDIAN),
        "mixolydian" => heptatonic(MIXOLYDIAN),
        "minor" | "aeolian" | "natural minor" => heptatonic(AEOLIAN),
        "locrian" => heptatonic(LOCRIAN),
        "harmonic minor" => heptatonic(HARMONIC_MINOR),
        "melodic minor" => heptatonic(MELODIC_MINOR),
        "major pentatonic" => ScaleShape {
            intervals: &[0, 2, 4, 7, 9],
            letters: &[0, 1, 2, 4, 5],
        },
        "minor pentatonic" => ScaleShape {
            intervals: &[0, 3, 5, 7, 10],
            letters: &[0, 2, 3, 4, 6],
        },
        _ => return None,
    };
    Some(shape)
}

/// Whether degree chords for this scale follow the natural-minor quality table.
pub fn uses_minor_qualities(scale: &str) -> bool {
    let lower = scale.to_ascii_lowercase();
    lower.contains("minor") || lower.contains("aeolian")
}

/// Spell the notes of `scale` starting on `tonic`, in degree order.
pub fn scale_notes(tonic: &str, scale: &str) -> Result<Vec<NoteName>, TheoryError> {
    let root = NoteName::parse(tonic).ok_or_else(|| TheoryError::UnknownTonic(tonic.to_string()))?;
    let shape = scale_shape(scale).ok_or_else(|| TheoryError::UnknownScale(scale.to_string()))?;
    Ok(shape
        .intervals
        .iter()
        .zip(shape.letters)
        .map(|(&semitones, &letters)| root.transpose(letters, semitones))
        .collect())
}
