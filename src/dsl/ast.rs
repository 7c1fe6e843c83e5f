//! Parsed command forms.
//!
//! The parser does no semantic validation: a [`TrackCommand`] carries every
//! `name(args)` pair it found, and the resolver decides what they mean.

use std::fmt;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Global(GlobalCommand),
    Track(TrackCommand),
}

/// Session-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalCommand {
    Key(String),
    Scale(String),
    Bpm(u32),
    /// Pause every track. The clock keeps running.
    Stop,
}

/// `t<id>.<method>(...)...`
#[derive(Debug, Clone, PartialEq)]
pub struct TrackCommand {
    pub track: u32,
    pub methods: Vec<MethodCall>,
}

/// A single `name(args)` pair from a method chain.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub name: String,
    pub args: Vec<Arg>,
}

impl MethodCall {
    pub fn new(name: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// A method argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Number(f64),
    /// A quoted string, quotes removed.
    Str(String),
    /// Unquoted text that is not a number.
    Word(String),
}

impl Arg {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Arg::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text of a string or bareword argument.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Str(s) | Arg::Word(s) => Some(s),
            Arg::Number(_) => None,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Number(n) => write!(f, "{n}"),
            Arg::Str(s) => write!(f, "'{s}'"),
            Arg::Word(s) => write!(f, "{s}"),
        }
    }
}
