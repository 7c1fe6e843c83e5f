//! Sample voices: WAV decoding, mono mixdown, rate conversion and pitched
//! playback.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// Pitch a sample plays at when triggered unshifted.
pub const SAMPLE_ROOT_NOTE: &str = "C4";

#[derive(Debug)]
pub enum SampleError {
    Io(std::io::Error),
    Wav(hound::Error),
    /// The file decoded to zero frames.
    Empty,
}

impl std::fmt::Display for SampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleError::Io(e) => write!(f, "cannot read sample: {e}"),
            SampleError::Wav(e) => write!(f, "cannot decode WAV: {e}"),
            SampleError::Empty => write!(f, "sample has no audio frames"),
        }
    }
}

impl std::error::Error for SampleError {}

impl From<hound::Error> for SampleError {
    fn from(e: hound::Error) -> Self {
        SampleError::Wav(e)
    }
}

impl From<std::io::Error> for SampleError {
    fn from(e: std::io::Error) -> Self {
        SampleError::Io(e)
    }
}

/// Mono PCM at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleData {
    frames: Vec<f32>,
    sample_rate: u32,
}

impl SampleData {
    pub fn from_mono(frames: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            frames,
            sample_rate,
        }
    }

    /// Open a WAV file and convert it to mono at `sample_rate`.
    pub fn open(path: &Path, sample_rate: u32) -> Result<Self, SampleError> {
        let file = File::open(path)?;
        Self::from_wav(BufReader::new(file), sample_rate)
    }

    /// Decode WAV data (integer or float PCM, any channel count), average
    /// the channels and resample to `sample_rate`.
    pub fn from_wav<R: Read + Seek>(reader: R, sample_rate: u32) -> Result<Self, SampleError> {
        let wav = hound::WavReader::new(reader)?;
        let spec = wav.spec();
        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => wav.into_samples::<f32>().collect::<Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1u64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                wav.into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()?
            }
        };

        let channels = usize::from(spec.channels.max(1));
        let mono: Vec<f32> = interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();
        if mono.is_empty() {
            return Err(SampleError::Empty);
        }

        let ratio = spec.sample_rate as f64 / sample_rate as f64;
        Ok(Self {
            frames: resample(&mono, ratio),
            sample_rate,
        })
    }

    pub fn frames(&self) -> &[f32] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Render the sample played back `speed` times faster, truncated to
    /// `max_frames`. `speed` 2.0 is an octave up.
    pub fn render_pitched(&self, speed: f64, max_frames: usize) -> Vec<f32> {
        let mut out = resample(&self.frames, speed);
        out.truncate(max_frames);
        out
    }
}

/// Linear-interpolation resampler. `step` is the number of input frames
/// consumed per output frame.
fn resample(input: &[f32], step: f64) -> Vec<f32> {
    if input.is_empty() || step.is_nan() || step <= 0.0 {
        return Vec::new();
    }
    if (step - 1.0).abs() < f64::EPSILON {
        return input.to_vec();
    }
    let out_len = ((input.len() as f64) / step).ceil() as usize;
    let last = input.len() - 1;
    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = (pos as usize).min(last);
            let frac = (pos - idx as f64) as f32;
            match input.get(idx + 1) {
                Some(&next) => input[idx] + (next - input[idx]) * frac,
                None => input[idx],
            }
        })
        .collect()
}
