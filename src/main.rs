//! stepline: type a line, hear the pattern change on the next step.

use std::error::Error;
use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use stepline::audio::{write_wav, AudioEngine, AudioError, Mixer};
use stepline::cli::{
    handle_input, render_offline, script_lines, session_kit, Cli, CliCommand, Input, PlayArgs,
    RenderArgs,
};
use stepline::config::Config;
use stepline::session::Session;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stepline=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = loaded.unwrap_or_else(|e| {
        warn!(error = %e, "using default configuration");
        Config::default()
    });

    match cli.command {
        CliCommand::Play(args) => play(args, config),
        CliCommand::Render(args) => render(args, config),
    }
}

fn play(args: PlayArgs, mut config: Config) -> Result<(), Box<dyn Error>> {
    args.session.apply_to(&mut config);

    let mut engine = AudioEngine::new()?;
    let sample_rate = engine.sample_rate();
    let kit = session_kit(config.kit.as_deref(), sample_rate)?;
    let mut session = Session::new(Mixer::new(sample_rate), Some(kit), &config);
    let mut stdout = std::io::stdout();

    println!(
        "stepline v{}: {sample_rate} Hz, {} bpm, kit {}",
        env!("CARGO_PKG_VERSION"),
        session.state().bpm,
        session.kit().map_or("-", |k| k.name.as_str()),
    );

    if let Some(path) = &args.script {
        let text = std::fs::read_to_string(path)?;
        for line in script_lines(&text) {
            handle_input(&mut session, &Input::parse(line), &mut stdout)?;
        }
    }

    let inputs = spawn_input_thread()?;
    let block = config.block_size.max(64);
    let lookahead = config.lookahead_frames(sample_rate).max(block as u64);
    let idle = Duration::from_secs_f64(block as f64 / sample_rate as f64 / 4.0);
    let mut rendered: u64 = 0;

    'run: loop {
        loop {
            match inputs.try_recv() {
                Ok(input) => {
                    if !handle_input(&mut session, &input, &mut stdout)? {
                        break 'run;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break 'run,
            }
        }

        while rendered < engine.frames_played() + lookahead {
            for firing in session.advance(block) {
                debug!(step = firing.step, tracks = firing.sounded, "step");
            }
            let samples = session.backend_mut().render_block(block as usize);
            match engine.send_block(&samples) {
                Ok(()) => rendered += block as u64,
                Err(AudioError::BufferFull) => {
                    warn!("audio queue full, dropping block");
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
        thread::sleep(idle);
    }

    session.shutdown();
    engine.clear()?;
    info!("bye");
    Ok(())
}

/// Stdin lines and Ctrl-C, delivered on one channel.
fn spawn_input_thread() -> Result<Receiver<Input>, Box<dyn Error>> {
    let (tx, rx) = mpsc::channel();

    let interrupt = tx.clone();
    ctrlc::set_handler(move || {
        let _ = interrupt.send(Input::Quit);
    })?;

    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(Input::parse(&line)).is_err() {
                return;
            }
        }
        let _ = tx.send(Input::Quit);
    });
    Ok(rx)
}

fn render(args: RenderArgs, mut config: Config) -> Result<(), Box<dyn Error>> {
    args.session.apply_to(&mut config);

    let sample_rate = config.sample_rate;
    let kit = session_kit(config.kit.as_deref(), sample_rate)?;
    let mut session = Session::new(Mixer::new(sample_rate), Some(kit), &config);

    let text = std::fs::read_to_string(&args.script)?;
    let mut stdout = std::io::stdout();
    for line in script_lines(&text) {
        let input = Input::parse(line);
        // the renderer drives the clock itself
        if matches!(input, Input::Line(_) | Input::Tracks | Input::Log) {
            handle_input(&mut session, &input, &mut stdout)?;
        }
    }

    let samples = render_offline(&mut session, args.bars, config.block_size);
    write_wav(&args.output, &samples, sample_rate)?;
    println!(
        "wrote {} ({:.1} s)",
        args.output.display(),
        samples.len() as f64 / 2.0 / sample_rate as f64
    );
    Ok(())
}
