//! Note names: spelling ("C", "F#", "Bb"), octave stripping, and MIDI conversion.

use std::fmt;

/// A natural note letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    const ALL: [Letter; 7] = [
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::A,
        Letter::B,
    ];

    /// Pitch class of the natural note (C = 0).
    pub fn pitch_class(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    /// The letter `steps` positions above this one, wrapping after B.
    pub fn step(self, steps: usize) -> Letter {
        let idx = Self::ALL.iter().position(|&l| l == self).unwrap_or(0);
        Self::ALL[(idx + steps) % 7]
    }

    fn from_char(c: char) -> Option<Letter> {
        match c.to_ascii_uppercase() {
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'E' => Some(Letter::E),
            'F' => Some(Letter::F),
            'G' => Some(Letter::G),
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Letter::C => 'C',
            Letter::D => 'D',
            Letter::E => 'E',
            Letter::F => 'F',
            Letter::G => 'G',
            Letter::A => 'A',
            Letter::B => 'B',
        }
    }
}

/// A spelled pitch class without octave: a letter plus accidentals.
///
/// `accidental` counts semitones away from the natural letter:
/// `1` is a sharp, `-1` a flat, `2` a double sharp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteName {
    pub letter: Letter,
    pub accidental: i8,
}

impl NoteName {
    pub fn new(letter: Letter, accidental: i8) -> Self {
        Self { letter, accidental }
    }

    /// Parse a pitch-class name such as `"C"`, `"f#"`, `"Bb"` or `"C##"`.
    ///
    /// The letter is case-insensitive; accidentals must be `#` or `b`.
    pub fn parse(name: &str) -> Option<NoteName> {
        let mut chars = name.trim().chars();
        let letter = Letter::from_char(chars.next()?)?;
        let mut accidental: i8 = 0;
        for c in chars {
            match c {
                '#' => accidental = accidental.checked_add(1)?,
                'b' => accidental = accidental.checked_sub(1)?,
                _ => return None,
            }
        }
        Some(NoteName { letter, accidental })
    }

    /// Pitch class in `0..12`.
    pub fn pitch_class(self) -> i32 {
        (self.letter.pitch_class() + self.accidental as i32).rem_euclid(12)
    }

    /// Spell the note that sits `letter_steps` letters and `semitones`
    /// semitones above this one.
    pub fn transpose(self, letter_steps: usize, semitones: i32) -> NoteName {
        let letter = self.letter.step(letter_steps);
        let target = (self.pitch_class() + semitones).rem_euclid(12);
        let mut accidental = target - letter.pitch_class();
        // Pick the smallest accidental that reaches the target pitch class.
        if accidental > 6 {
            accidental -= 12;
        } else if accidental < -6 {
            accidental += 12;
        }
        NoteName {
            letter,
            accidental: accidental as i8,
        }
    }

    /// This note annotated with an octave, e.g. `C4`.
    pub fn with_octave(self, octave: i32) -> String {
        format!("{self}{octave}")
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter.as_char())?;
        let symbol = if self.accidental >= 0 { '#' } else { 'b' };
        for _ in 0..self.accidental.unsigned_abs() {
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}

/// Remove a trailing octave number (including a leading minus) from a note
/// name: `"C4"` → `"C"`, `"Eb-1"` → `"Eb"`. Names without an octave are
/// returned unchanged.
pub fn strip_octave(name: &str) -> &str {
    let trimmed = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if trimmed.len() == name.len() {
        return name;
    }
    trimmed.strip_suffix('-').unwrap_or(trimmed)
}

/// Parse a note name with octave into a MIDI note number.
///
/// Format: `<letter><accidentals><octave>`, C4 = middle C = MIDI 60.
pub fn parse_note_name(name: &str) -> Option<u8> {
    let pitch = strip_octave(name);
    if pitch.len() == name.len() {
        return None;
    }
    let octave: i32 = name[pitch.len()..].parse().ok()?;
    let note = NoteName::parse(pitch)?;

    // MIDI note = (octave + 1) * 12 + letter + accidental
    let midi = octave
        .checked_add(1)?
        .checked_mul(12)?
        .checked_add(note.letter.pitch_class() + note.accidental as i32)?;
    u8::try_from(midi).ok().filter(|m| *m <= 127)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pitch_classes() {
        assert_eq!(NoteName::parse("C"), Some(NoteName::new(Letter::C, 0)));
        assert_eq!(NoteName::parse("f#"), Some(NoteName::new(Letter::F, 1)));
        assert_eq!(NoteName::parse("Bb"), Some(NoteName::new(Letter::B, -1)));
        assert_eq!(NoteName::parse("C##"), Some(NoteName::new(Letter::C, 2)));
        assert_eq!(NoteName::parse("H"), None);
        assert_eq!(NoteName::parse(""), None);
        assert_eq!(NoteName::parse("C4"), None);
    }

    #[test]
    fn display_round_trips() {
        for name in ["C", "F#", "Bb", "Ebb", "G##"] {
            assert_eq!(NoteName::parse(name).unwrap().to_string(), name);
        }
    }

    #[test]
    fn transpose_spells_by_letter() {
        let c = NoteName::parse("C").unwrap();
        assert_eq!(c.transpose(2, 4).to_string(), "E");
        assert_eq!(c.transpose(2, 3).to_string(), "Eb");
        let f = NoteName::parse("F").unwrap();
        assert_eq!(f.transpose(3, 5).to_string(), "Bb");
        let b = NoteName::parse("B").unwrap();
        assert_eq!(b.transpose(4, 6).to_string(), "F");
    }

    #[test]
    fn strip_octave_variants() {
        assert_eq!(strip_octave("C4"), "C");
        assert_eq!(strip_octave("Eb-1"), "Eb");
        assert_eq!(strip_octave("F#10"), "F#");
        assert_eq!(strip_octave("G"), "G");
    }

    #[test]
    fn absurd_octaves_are_rejected() {
        assert_eq!(parse_note_name("C2147483647"), None);
        assert_eq!(parse_note_name("C-2147483648"), None);
        assert_eq!(parse_note_name("C99999999999"), None);
    }

    #[test]
    fn middle_c() {
        assert_eq!(parse_note_name("C4"), Some(60));
    }

    #[test]
    fn a4_concert() {
        assert_eq!(parse_note_name("A4"), Some(69));
    }

    #[test]
    fn c_minus_1() {
        assert_eq!(parse_note_name("C-1"), Some(0));
    }

    #[test]
    fn accidentals() {
        assert_eq!(parse_note_name("Eb2"), Some(39));
        assert_eq!(parse_note_name("F#3"), Some(54));
        assert_eq!(parse_note_name("G#6"), Some(92));
        assert_eq!(parse_note_name("A1"), Some(33));
    }

    #[test]
    fn out_of_range_and_invalid() {
        assert_eq!(parse_note_name("G#9"), None);
        assert_eq!(parse_note_name("C"), None);
        assert_eq!(parse_note_name("X4"), None);
        assert_eq!(parse_note_name(""), None);
    }
}
