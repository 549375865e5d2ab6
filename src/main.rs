//! Head gesture control: replays recorded orientation traces through the
//! gesture recognizer and runs the bound media actions.

use anyhow::{Context, Result};
use clap::Parser;
use head_gesture_control::{
    action::{Dispatcher, GestureAction},
    config::{Config, ExecutorKind, EXAMPLE_CONFIG},
    gesture::{GestureKind, Sensitivity},
    session::{ConfigHandle, TrackingSession},
    trace::{load_trace, read_trace, replay},
    tracker::HeadTracker,
};
use log::{info, warn};
use std::{io, path::PathBuf, thread};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Orientation trace to replay (JSON lines); reads stdin when omitted
    #[arg(short, long)]
    trace: Option<PathBuf>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Sensitivity (low, medium, high)
    #[arg(short, long)]
    sensitivity: Option<Sensitivity>,

    /// Action for a left flick
    #[arg(long)]
    left_flick: Option<GestureAction>,

    /// Action for a right flick
    #[arg(long)]
    right_flick: Option<GestureAction>,

    /// Action for a nod
    #[arg(long)]
    nod: Option<GestureAction>,

    /// Action executor (log, command)
    #[arg(short, long)]
    executor: Option<ExecutorKind>,

    /// Rate limit applied before recognition, in Hz
    #[arg(long)]
    throttle_hz: Option<f64>,

    /// Print an example configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Head Gesture Control");

    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {e}. Using defaults.");
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    apply_overrides(&mut config, &args);
    config.validate().context("Invalid configuration")?;

    let records = match &args.trace {
        Some(path) => load_trace(path).with_context(|| format!("Failed to read trace {}", path.display()))?,
        None => read_trace(io::stdin().lock()).context("Failed to read trace from stdin")?,
    };
    info!("Replaying {} trace records", records.len());

    let session = TrackingSession::spawn(
        HeadTracker::default(),
        ConfigHandle::new(config.gesture_config()),
        Dispatcher::new(config.create_executor()),
        config.session_options(),
    )?;
    // Print as events arrive; the channel ends when the worker stops
    let events = session.events().clone();
    let bindings = config.gesture.bindings;
    let printer = thread::spawn(move || {
        for event in events {
            let action = bindings.get(event.kind);
            println!("{:>8.3}s  {:<12} -> {}", event.timestamp, event.kind, action);
        }
    });

    replay(&records, &session.handle())?;
    let stats = session.shutdown()?;
    if printer.join().is_err() {
        warn!("Event printer stopped unexpectedly");
    }

    info!(
        "{} samples ({} rejected, {} throttled), {} gestures, {} actions",
        stats.samples_received, stats.samples_rejected, stats.samples_throttled, stats.gestures, stats.actions_dispatched
    );
    if stats.actions_unfinished > 0 {
        warn!("{} actions did not finish before exit", stats.actions_unfinished);
    }

    Ok(())
}

/// Command-line values take precedence over the configuration file
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(sensitivity) = args.sensitivity {
        config.gesture.sensitivity = sensitivity;
    }
    for (kind, action) in [
        (GestureKind::LeftFlick, args.left_flick),
        (GestureKind::RightFlick, args.right_flick),
        (GestureKind::Nod, args.nod),
    ] {
        if let Some(action) = action {
            config.gesture.bindings.set(kind, action);
        }
    }
    if let Some(kind) = args.executor {
        config.executor.kind = kind;
    }
    if args.throttle_hz.is_some() {
        config.input.throttle_hz = args.throttle_hz;
    }
}
