//! Chord lookup: `(quality, root) -> chord tones`, and the triad quality
//! that sits on each scale degree.

use super::note::NoteName;
use super::scale::{scale_notes, uses_minor_qualities};
use super::TheoryError;

/// Triad quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
}

/// Qualities of the triads on degrees 1..7 of a major scale.
const MAJOR_DEGREE_QUALITIES: [ChordQuality; 7] = [
    ChordQuality::Major,
    ChordQuality::Minor,
    ChordQuality::Minor,
    ChordQuality::Major,
    ChordQuality::Major,
    ChordQuality::Minor,
    ChordQuality::Diminished,
];

/// Qualities of the triads on degrees 1..7 of a natural minor scale.
const MINOR_DEGREE_QUALITIES: [ChordQuality; 7] = [
    ChordQuality::Minor,
    ChordQuality::Diminished,
    ChordQuality::Major,
    ChordQuality::Minor,
    ChordQuality::Minor,
    ChordQuality::Major,
    ChordQuality::Major,
];

impl ChordQuality {
    /// `(letter steps, semitones)` above the root for each chord tone.
    fn tones(self) -> [(usize, i32); 3] {
        match self {
            ChordQuality::Major => [(0, 0), (2, 4), (4, 7)],
            ChordQuality::Minor => [(0, 0), (2, 3), (4, 7)],
            ChordQuality::Diminished => [(0, 0), (2, 3), (4, 6)],
        }
    }

    /// Short symbol: `M`, `m`, `dim`.
    pub fn symbol(self) -> &'static str {
        match self {
            ChordQuality::Major => "M",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "dim",
        }
    }
}

/// Spell the tones of a triad on `root`.
pub fn chord_tones(quality: ChordQuality, root: NoteName) -> Vec<NoteName> {
    quality
        .tones()
        .iter()
        .map(|&(letters, semitones)| root.transpose(letters, semitones))
        .collect()
}

/// Triad quality for a zero-based degree index, cycling every 7 degrees.
pub fn degree_quality(scale: &str, degree_index: usize) -> ChordQuality {
    let table = if uses_minor_qualities(scale) {
        &MINOR_DEGREE_QUALITIES
    } else {
        &MAJOR_DEGREE_QUALITIES
    };
    table[degree_index % table.len()]
}

/// The triad built on a 1-indexed scale degree. Degrees wrap modulo the
/// scale length, so `8` in a seven-note scale is the tonic again and `0` is
/// the seventh.
pub fn degree_chord(tonic: &str, scale: &str, degree: i64) -> Result<Vec<NoteName>, TheoryError> {
    let notes = scale_notes(tonic, scale)?;
    if notes.is_empty() {
        return Err(TheoryError::UnknownScale(scale.to_string()));
    }
    let len = notes.len() as i64;
    // same as (degree - 1) mod len, without overflowing at i64::MIN
    let index = (degree.rem_euclid(len) - 1).rem_euclid(len) as usize;
    let quality = degree_quality(scale, index);
    Ok(chord_tones(quality, notes[index]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(notes: &[NoteName]) -> Vec<String> {
        notes.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn triad_spelling() {
        let c = NoteName::parse("C").unwrap();
        assert_eq!(names(&chord_tones(ChordQuality::Major, c)), ["C", "E", "G"]);
        assert_eq!(names(&chord_tones(ChordQuality::Minor, c)), ["C", "Eb", "G"]);
        assert_eq!(
            names(&chord_tones(ChordQuality::Diminished, c)),
            ["C", "Eb", "Gb"]
        );
    }

    #[test]
    fn c_major_degrees() {
        assert_eq!(names(&degree_chord("C", "major", 1).unwrap()), ["C", "E", "G"]);
        assert_eq!(names(&degree_chord("C", "major", 2).unwrap()), ["D", "F", "A"]);
        assert_eq!(names(&degree_chord("C", "major", 5).unwrap()), ["G", "B", "D"]);
        assert_eq!(names(&degree_chord("C", "major", 7).unwrap()), ["B", "D", "F"]);
    }

    #[test]
    fn degrees_wrap() {
        assert_eq!(
            degree_chord("C", "major", 8).unwrap(),
            degree_chord("C", "major", 1).unwrap()
        );
        assert_eq!(
            degree_chord("C", "major", 0).unwrap(),
            degree_chord("C", "major", 7).unwrap()
        );
        assert_eq!(
            degree_chord("C", "major", -6).unwrap(),
            degree_chord("C", "major", 1).unwrap()
        );
    }

    #[test]
    fn minor_table_selected_by_name() {
        assert_eq!(names(&degree_chord("A", "minor", 1).unwrap()), ["A", "C", "E"]);
        assert_eq!(names(&degree_chord("A", "minor", 2).unwrap()), ["B", "D", "F"]);
        assert_eq!(names(&degree_chord("A", "aeolian", 3).unwrap()), ["C", "E", "G"]);
    }

    #[test]
    fn quality_symbols() {
        assert_eq!(degree_quality("major", 0).symbol(), "M");
        assert_eq!(degree_quality("major", 6).symbol(), "dim");
        assert_eq!(degree_quality("minor", 1).symbol(), "dim");
    }

    #[test]
    fn extreme_degrees_still_wrap() {
        // i64::MAX is 1 more than a multiple of 7, i64::MIN is 1 less
        assert_eq!(names(&degree_chord("C", "major", i64::MAX).unwrap()), ["C", "E", "G"]);
        assert_eq!(names(&degree_chord("C", "major", i64::MIN).unwrap()), ["A", "C", "E"]);
    }

    #[test]
    fn unresolvable_inputs() {
        assert!(degree_chord("X", "major", 1).is_err());
        assert!(degree_chord("C", "nonsense", 1).is_err());
    }
}
