//! Command-line surface: argument parsing, REPL input handling and the
//! offline renderer.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::audio::Mixer;
use crate::backend::AudioBackend;
use crate::clock::Beat;
use crate::config::Config;
use crate::kit::{builtin_kit, load_kit, Kit, KitError};
use crate::session::Session;
use crate::track::TrackData;

/// Seconds rendered after the last bar so release tails ring out.
const RENDER_TAIL_SECONDS: f64 = 1.0;

#[derive(Debug, Parser)]
#[command(name = "stepline", version, about = "Live-coding step sequencer")]
pub struct Cli {
    /// Config file instead of ~/.stepline/config.yaml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Interactive session on the default audio device.
    Play(PlayArgs),
    /// Run a script offline and write the result to a WAV file.
    Render(RenderArgs),
}

/// Overrides shared by both subcommands.
#[derive(Debug, Clone, Default, Args)]
pub struct SessionArgs {
    /// Kit directory containing kit.json.
    #[arg(long)]
    pub kit: Option<PathBuf>,
    #[arg(long)]
    pub bpm: Option<u32>,
    /// Seed for probability and octave draws.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl SessionArgs {
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(kit) = &self.kit {
            config.kit = Some(kit.clone());
        }
        if let Some(bpm) = self.bpm {
            config.bpm = bpm;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
    }
}

#[derive(Debug, Args)]
pub struct PlayArgs {
    /// Lines to submit before reading stdin.
    #[arg(long)]
    pub script: Option<PathBuf>,
    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    pub script: PathBuf,
    #[arg(short, long)]
    pub output: PathBuf,
    /// Length in bars.
    #[arg(long, default_value_t = 4)]
    pub bars: u32,
    #[command(flatten)]
    pub session: SessionArgs,
}

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    Start,
    Stop,
    Toggle,
    Tracks,
    Log,
    Quit,
    UnknownMeta(String),
}

impl Input {
    /// Lines starting with `:` are meta commands; everything else goes to
    /// the session.
    pub fn parse(line: &str) -> Input {
        let trimmed = line.trim();
        let Some(meta) = trimmed.strip_prefix(':') else {
            return Input::Line(trimmed.to_string());
        };
        match meta.trim() {
            "start" => Input::Start,
            "stop" => Input::Stop,
            "toggle" => Input::Toggle,
            "tracks" => Input::Tracks,
            "log" => Input::Log,
            "quit" | "q" => Input::Quit,
            other => Input::UnknownMeta(other.to_string()),
        }
    }
}

/// Non-empty lines that are not `#` or `//` comments.
pub fn script_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with("//"))
}

/// The kit at `path`, or the built-in kit.
pub fn session_kit(path: Option<&Path>, sample_rate: u32) -> Result<Kit, KitError> {
    match path {
        Some(dir) => load_kit(dir, sample_rate),
        None => Ok(builtin_kit()),
    }
}

/// Apply one input, writing feedback to `out`. Returns `false` on quit.
pub fn handle_input<B: AudioBackend, W: Write>(
    session: &mut Session<B>,
    input: &Input,
    out: &mut W,
) -> io::Result<bool> {
    match input {
        Input::Line(line) if line.is_empty() => {}
        Input::Line(line) => writeln!(out, "{}", session.submit(line))?,
        Input::Start => {
            session.start();
            writeln!(out, "clock started")?;
        }
        Input::Stop => {
            session.stop();
            writeln!(out, "clock stopped")?;
        }
        Input::Toggle => {
            let running = session.toggle();
            writeln!(out, "clock {}", if running { "started" } else { "stopped" })?;
        }
        Input::Tracks => write!(out, "{}", format_tracks(&session.snapshot()))?,
        Input::Log => {
            for entry in session.log().iter() {
                writeln!(out, "{} <- {}", entry, entry.input)?;
            }
        }
        Input::Quit => return Ok(false),
        Input::UnknownMeta(m) => writeln!(out, "unknown command :{m}")?,
    }
    Ok(true)
}

/// One line per track.
pub fn format_tracks(tracks: &[TrackData]) -> String {
    if tracks.is_empty() {
        return "no tracks\n".to_string();
    }
    let mut out = String::new();
    for t in tracks {
        let state = match (t.playing, t.starts_at) {
            (false, _) => "stopped".to_string(),
            (true, Some(step)) => format!("from step {step}"),
            (true, None) => "playing".to_string(),
        };
        out.push_str(&format!(
            "{:<4} {:<8} {:<16} {} gain {:.2} pan {:+.2} prob {:.2} oct {} {}\n",
            t.id.to_string(),
            t.voice,
            t.spec.as_ref().map_or_else(|| "-".to_string(), |s| s.to_string()),
            t.pattern.grid(),
            t.gain,
            t.pan,
            t.prob,
            t.octave,
            state,
        ));
    }
    out
}

/// Run the clock for `bars` bars plus a short tail and return the mix as
/// interleaved stereo.
pub fn render_offline(session: &mut Session<Mixer>, bars: u32, block_size: u32) -> Vec<f32> {
    let sample_rate = session.backend().sample_rate();
    let beats = bars.saturating_mul(session.clock().beats_per_bar());
    let music_frames = Beat::from_beats(beats).to_frames(session.clock().bpm(), sample_rate);
    let tail_frames = (RENDER_TAIL_SECONDS * sample_rate as f64) as u64;
    let block_size = block_size.max(1);

    let mut out = Vec::with_capacity(((music_frames + tail_frames) * 2) as usize);
    session.start();
    let mut rendered = 0u64;
    while rendered < music_frames + tail_frames {
        if rendered >= music_frames && session.is_running() {
            session.stop();
        }
        let limit = if rendered < music_frames {
            music_frames - rendered
        } else {
            music_frames + tail_frames - rendered
        };
        let frames = (block_size as u64).min(limit) as u32;
        session.advance(frames);
        out.extend(session.backend_mut().render_block(frames as usize));
        rendered += frames as u64;
    }
    info!(bars, frames = rendered, "offline render finished");
    out
}
