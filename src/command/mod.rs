//! Command resolution: method chains become track updates, updates become
//! complete track states.

pub mod error;
pub mod resolve;
pub mod update;

pub use error::CommandError;
pub use resolve::{next_playing, resolve_track_state, ResolvedTrackState, UpdateKind};
pub use update::{extract_update, TrackUpdate};
