//! Error types for the command parser.

use std::fmt;

/// A line that could not be parsed. The input is discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed `key(...)`.
    Key,
    /// Malformed `scale(...)`.
    Scale,
    /// Malformed `bpm(...)`.
    Bpm,
    /// Neither a global nor a track command.
    Syntax,
}

impl ParseError {
    pub fn key() -> Self {
        Self {
            message: "invalid key() syntax, expected key('C')".into(),
            kind: ErrorKind::Key,
        }
    }

    pub fn scale() -> Self {
        Self {
            message: "invalid scale() syntax, expected scale('major')".into(),
            kind: ErrorKind::Scale,
        }
    }

    pub fn bpm() -> Self {
        Self {
            message: "invalid bpm() syntax, expected bpm(120)".into(),
            kind: ErrorKind::Bpm,
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ErrorKind::Syntax,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}
