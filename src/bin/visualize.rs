use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use simple_walker::{
    replay, CheckpointError, Policy, RenderMode, ReplayStop, WalkerConfig, WalkerEnv,
};

/// Replay a trained walker policy in a window. Press Ctrl-C, close the window or
/// press Escape to stop.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Checkpoint to load.
    #[arg(short, long, default_value = "models/neuroevolution/100000.bin")]
    model: PathBuf,

    /// Environment configuration (TOML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many steps.
    #[arg(long)]
    max_steps: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let policy = match Policy::load(&args.model) {
        Ok(policy) => policy,
        Err(CheckpointError::NotFound(path)) => {
            println!("Error: model file not found at {}", path.display());
            println!("Train one first with the `train` binary.");
            return Ok(());
        }
        Err(err) => return Err(err).context("loading policy"),
    };
    info!(model = %args.model.display(), "policy loaded");

    let config = match &args.config {
        Some(path) => WalkerConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => WalkerConfig::default(),
    };
    let mut env = WalkerEnv::new(config, RenderMode::Human)?;

    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupt);
    if let Err(err) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        warn!(%err, "could not install Ctrl-C handler");
    }

    let summary = replay(&mut env, &policy, &interrupt, args.max_steps);
    match summary.stop {
        ReplayStop::Interrupted | ReplayStop::WindowClosed => {
            println!("Visualization stopped by user.")
        }
        ReplayStop::WindowFailed => println!("Visualization stopped: the window could not be opened."),
        ReplayStop::StepLimit => println!("Visualization finished after {} steps.", summary.steps),
    }
    info!(steps = summary.steps, episodes = summary.episodes, "replay ended");
    Ok(())
}
