//! Kit directories.
//!
//! ```text
//! my-kit/
//!   kit.json      {"name": "my-kit", "description": "..", "voices": ["kick", "clap"]}
//!   kick.json     tone descriptor
//!   clap.wav      sample
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{Kit, KitError, ToneConfig, VoiceConfig};
use crate::instrument::sample::SampleData;

pub const MANIFEST_FILE: &str = "kit.json";

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: String,
    voices: Vec<String>,
}

/// Load the kit in `dir`, decoding samples at `sample_rate`.
///
/// A missing or malformed manifest fails the whole load. A voice with
/// neither a usable descriptor nor a sample is skipped with a warning.
pub fn load_kit(dir: &Path, sample_rate: u32) -> Result<Kit, KitError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let text = fs::read_to_string(&manifest_path).map_err(|e| KitError::Io(manifest_path.clone(), e))?;
    let manifest: Manifest =
        serde_json::from_str(&text).map_err(|e| KitError::Json(manifest_path.clone(), e))?;

    let name = manifest.name.unwrap_or_else(|| {
        dir.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let mut kit = Kit::new(name, manifest.description);

    for voice in &manifest.voices {
        match load_voice(dir, voice, sample_rate) {
            Some(config) => kit.insert(config),
            None => warn!(kit = %kit.name, voice = %voice, "could not load voice, skipping"),
        }
    }

    info!(kit = %kit.name, voices = kit.len(), "kit loaded");
    Ok(kit)
}

/// `<voice>.json` first, then `<voice>.wav`.
fn load_voice(dir: &Path, voice: &str, sample_rate: u32) -> Option<VoiceConfig> {
    let descriptor = dir.join(format!("{voice}.json"));
    if descriptor.is_file() {
        match read_descriptor(&descriptor) {
            Ok(config) => return Some(VoiceConfig::tone(voice, config)),
            Err(e) => debug!(error = %e, "descriptor unusable, trying sample"),
        }
    }

    let sample = dir.join(format!("{voice}.wav"));
    if sample.is_file() {
        match SampleData::open(&sample, sample_rate) {
            Ok(data) => return Some(VoiceConfig::sample(voice, data)),
            Err(e) => {
                let e = KitError::Sample(sample, e);
                debug!(error = %e, "sample unusable");
            }
        }
    }
    None
}

fn read_descriptor(path: &Path) -> Result<ToneConfig, KitError> {
    let text = fs::read_to_string(path).map_err(|e| KitError::Io(path.to_path_buf(), e))?;
    serde_json::from_str(&text).map_err(|e| KitError::Json(path.to_path_buf(), e))
}
