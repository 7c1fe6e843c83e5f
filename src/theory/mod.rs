//! Music theory lookups used by arpeggio resolution and note triggering.

pub mod chord;
pub mod note;
pub mod scale;

pub use chord::{chord_tones, degree_chord, ChordQuality};
pub use note::{parse_note_name, strip_octave, NoteName};
pub use scale::scale_notes;

use std::fmt;

/// A key or scale that cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TheoryError {
    UnknownTonic(String),
    UnknownScale(String),
}

impl fmt::Display for TheoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TheoryError::UnknownTonic(t) => write!(f, "unknown tonic '{t}'"),
            TheoryError::UnknownScale(s) => write!(f, "unknown scale '{s}'"),
        }
    }
}

impl std::error::Error for TheoryError {}
