//! Sound sources behind kit voices: oscillators, envelopes, samples and the
//! per-note renderers that combine them.

pub mod envelope;
pub mod oscillator;
pub mod sample;
pub mod voice;

pub use envelope::AdsrEnvelope;
pub use oscillator::{midi_to_freq, note_to_freq, Waveform};
pub use sample::{SampleData, SampleError};
pub use voice::render_note;
