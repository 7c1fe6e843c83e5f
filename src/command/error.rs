use std::fmt;

use crate::backend::BackendError;
use crate::dsl::ParseError;
use crate::track::TrackId;

/// Why a command line was rejected. State is unchanged in every case.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    Parse(ParseError),
    /// `start()`/`stop()` on a track that was never created.
    UnknownTrack(TrackId),
    /// The voice name is not in the active kit.
    UnknownVoice(String),
    KitNotLoaded,
    InvalidTempo(u32),
    Backend(BackendError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Parse(e) => write!(f, "{e}"),
            CommandError::UnknownTrack(id) => write!(f, "track {id} does not exist"),
            CommandError::UnknownVoice(v) => write!(f, "voice '{v}' is not in the kit"),
            CommandError::KitNotLoaded => write!(f, "no kit loaded"),
            CommandError::InvalidTempo(bpm) => write!(f, "invalid tempo {bpm}, must be positive"),
            CommandError::Backend(e) => write!(f, "audio backend: {e}"),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Parse(e) => Some(e),
            CommandError::Backend(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for CommandError {
    fn from(e: ParseError) -> Self {
        CommandError::Parse(e)
    }
}

impl From<BackendError> for CommandError {
    fn from(e: BackendError) -> Self {
        CommandError::Backend(e)
    }
}
