//! Headless simulation trace
//!
//! Runs a scripted throttle profile through the engine model at a fixed
//! tick and prints the state trajectory. Silent by default; pass
//! `--sounds <dir>` to hear it through the real audio backend (which
//! also paces the run in real time).
//!
//! ```text
//! rev-trace [--sounds <dir>] [--duration <secs>]
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use revsim_core::audio::{start_audio_system, ClipBank, CpalAudioHandle, NullVoice, Voice};
use revsim_core::config::EngineConfig;
use revsim_core::director::AudioDirector;
use revsim_core::engine::EngineModel;
use revsim_core::EnginePhase;

const TICK: f64 = 1.0 / 120.0;
const TRACE_INTERVAL: f64 = 0.25;

struct Options {
    sounds: Option<PathBuf>,
    duration: f64,
}

fn parse_args() -> Result<Options> {
    let mut opts = Options {
        sounds: None,
        duration: 32.0,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--sounds" => {
                let dir = args.next().context("--sounds needs a directory")?;
                opts.sounds = Some(PathBuf::from(dir));
            }
            "--duration" => {
                let secs = args.next().context("--duration needs a value")?;
                opts.duration = secs.parse().context("--duration must be a number")?;
            }
            "--help" | "-h" => {
                println!("Usage: rev-trace [--sounds <dir>] [--duration <secs>]");
                std::process::exit(0);
            }
            other => bail!("Unknown argument: {}", other),
        }
    }
    Ok(opts)
}

/// Scripted drive: start, pull away, flick up, flick down, pin it
/// until cruise engages, shut down.
fn throttle_at(t: f64) -> f64 {
    match t {
        t if t < 7.0 => 0.0,
        t if t < 10.0 => 0.6 * (t - 7.0) / 3.0,
        t if t < 10.1 => 0.2,
        t if t < 14.0 => 0.95,
        t if t < 16.0 => 0.0,
        t if t < 28.0 => 1.0,
        _ => 0.0,
    }
}

fn build_model(
    sounds: Option<&PathBuf>,
    config: EngineConfig,
) -> Result<(EngineModel<Box<dyn Voice + Send>>, Option<CpalAudioHandle>)> {
    let (voices, handle): (Vec<Box<dyn Voice + Send>>, Option<CpalAudioHandle>) = match sounds {
        Some(dir) => {
            let bank = ClipBank::load_dir(dir).context("Loading sound clips")?;
            let (handle, voices) =
                start_audio_system(bank).context("Starting audio backend")?;
            (
                voices
                    .into_iter()
                    .map(|v| Box::new(v) as Box<dyn Voice + Send>)
                    .collect(),
                Some(handle),
            )
        }
        None => (
            (0..4)
                .map(|_| Box::new(NullVoice::new()) as Box<dyn Voice + Send>)
                .collect(),
            None,
        ),
    };

    let mut voices = voices.into_iter();
    let (loop_a, loop_b, transition, effect) = match (
        voices.next(),
        voices.next(),
        voices.next(),
        voices.next(),
    ) {
        (Some(a), Some(b), Some(t), Some(e)) => (a, b, t, e),
        _ => bail!("Audio backend provided fewer than four voices"),
    };

    let director = AudioDirector::new(loop_a, loop_b, transition, effect, &config.levels);
    Ok((EngineModel::new(director, config), handle))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = parse_args()?;
    let realtime = opts.sounds.is_some();
    let config = EngineConfig::default();
    let (mut model, _audio) = build_model(opts.sounds.as_ref(), config)?;

    println!(
        "{:>7}  {:<13} {:>6}  {:>5}  {:<10} {}",
        "time", "phase", "rpm", "thr", "loop", "cruise"
    );

    let mut t = 0.0;
    let mut next_trace = 0.0;
    model.start_engine();

    while t < opts.duration {
        model.set_throttle(throttle_at(t));
        model.update(TICK);
        t += TICK;

        if t >= next_trace {
            next_trace += TRACE_INTERVAL;
            let loop_key = model
                .director()
                .effective_loop_key()
                .map(|k| k.name())
                .unwrap_or("-");
            println!(
                "{:>6.2}s  {:<13} {:>6.0}  {:>5.2}  {:<10} {}",
                t,
                model.phase().label(),
                model.rpm(),
                model.throttle(),
                loop_key,
                if model.is_cruising() { "yes" } else { "" }
            );
        }

        if t >= 28.5 && matches!(model.phase(), EnginePhase::Idle | EnginePhase::Running) {
            model.stop_engine();
        }

        if realtime {
            std::thread::sleep(Duration::from_secs_f64(TICK));
        }
    }

    Ok(())
}
