//! Messages from the render loop to the audio thread.

#[derive(Debug)]
pub enum AudioCommand {
    /// A rendered block, interleaved in the device's channel layout.
    Block(Vec<f32>),
    /// Master volume, clamped to `0.0..=1.0` on arrival.
    SetVolume(f32),
    /// Drop everything queued for playback.
    Clear,
}
