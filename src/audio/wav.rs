//! Offline output to 32-bit float WAV.

use std::path::Path;

use super::mixer::MIXER_CHANNELS;
use super::AudioError;

/// Write interleaved stereo samples to `path`.
pub fn write_wav(path: &Path, stereo: &[f32], sample_rate: u32) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels: MIXER_CHANNELS as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in stereo {
        writer.write_sample(sample.clamp(-1.0, 1.0))?;
    }
    writer.finalize()?;
    Ok(())
}
