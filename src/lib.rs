//! stepline: a live-coding step sequencer.
//!
//! A line of text such as `t0.voice('kick').pulse(4)` is parsed
//! ([`dsl`]), folded into a track update and merged with the track's prior
//! state ([`command`]), and stored in the [`track`] registry. The
//! [`clock`] reads the registry every sixteenth note and schedules note
//! triggers on an [`backend::AudioBackend`] at exact frame positions.
//! [`session::Session`] ties these together.

pub mod audio;
pub mod backend;
pub mod cli;
pub mod clock;
pub mod command;
pub mod config;
pub mod dsl;
pub mod instrument;
pub mod kit;
pub mod log;
pub mod pattern;
pub mod session;
pub mod theory;
pub mod track;
