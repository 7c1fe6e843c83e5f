//! Track registry: id → data and id → live resources, kept in separate
//! maps. Command handling writes; the clock only reads.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use super::{TrackData, TrackId, TrackRuntime};
use crate::backend::AudioBackend;

#[derive(Debug, Default)]
pub struct TrackRegistry {
    tracks: BTreeMap<TrackId, TrackData>,
    runtimes: HashMap<TrackId, TrackRuntime>,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TrackId) -> Option<&TrackData> {
        self.tracks.get(&id)
    }

    pub fn get_mut(&mut self, id: TrackId) -> Option<&mut TrackData> {
        self.tracks.get_mut(&id)
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.tracks.contains_key(&id)
    }

    pub fn runtime(&self, id: TrackId) -> Option<&TrackRuntime> {
        self.runtimes.get(&id)
    }

    /// Detach a track's runtime so the caller can dispose it.
    pub fn take_runtime(&mut self, id: TrackId) -> Option<TrackRuntime> {
        self.runtimes.remove(&id)
    }

    /// Store new data and runtime for a track, replacing both. The previous
    /// runtime must already have been taken out.
    pub fn install(&mut self, data: TrackData, runtime: TrackRuntime) {
        debug_assert!(!self.runtimes.contains_key(&data.id));
        self.runtimes.insert(data.id, runtime);
        self.tracks.insert(data.id, data);
    }

    /// Tracks in id order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackData> {
        self.tracks.values()
    }

    /// Tracks in id order, each with its runtime if it has one.
    pub fn iter_with_runtime(&self) -> impl Iterator<Item = (&TrackData, Option<&TrackRuntime>)> {
        self.tracks
            .values()
            .map(|data| (data, self.runtimes.get(&data.id)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TrackData> {
        self.tracks.values_mut()
    }

    /// Copies of every track, in id order.
    pub fn snapshot(&self) -> Vec<TrackData> {
        self.tracks.values().cloned().collect()
    }

    /// Clear every play flag. Nothing else changes.
    pub fn pause_all(&mut self) {
        for track in self.tracks.values_mut() {
            track.playing = false;
            track.starts_at = None;
        }
    }

    /// Let pending starts take effect immediately.
    pub fn clear_deferred_starts(&mut self) {
        for track in self.tracks.values_mut() {
            track.starts_at = None;
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Release every runtime. Track data stays.
    pub fn dispose_all<B: AudioBackend + ?Sized>(&mut self, backend: &mut B) {
        let ids: Vec<TrackId> = self.runtimes.keys().copied().collect();
        for id in ids {
            if let Some(runtime) = self.runtimes.remove(&id) {
                if let Err(e) = runtime.dispose(backend) {
                    warn!(track = %id, error = %e, "failed to dispose track runtime");
                }
            }
        }
    }
}
