use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use simple_walker::train::{DEFAULT_CHECKPOINTS, DEFAULT_TIMESTEPS_PER_CHECKPOINT};
use simple_walker::{CheckpointDir, TrainConfig, Trainer, WalkerConfig, DEFAULT_MODELS_DIR};

/// Train a walker policy by neuroevolution, saving `<timesteps>.bin` checkpoints.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Policies evaluated per generation.
    #[arg(short, long, default_value_t = 16)]
    population: usize,

    /// Survivors kept per generation.
    #[arg(short = 'k', long, default_value_t = 4)]
    top_k: usize,

    /// Maximum steps per evaluation episode.
    #[arg(long, default_value_t = 250)]
    rollout_steps: u32,

    /// Environment timesteps between checkpoints.
    #[arg(long, default_value_t = DEFAULT_TIMESTEPS_PER_CHECKPOINT)]
    timesteps_per_checkpoint: u64,

    /// Number of checkpoints to write before stopping.
    #[arg(short, long, default_value_t = DEFAULT_CHECKPOINTS)]
    checkpoints: u32,

    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value = DEFAULT_MODELS_DIR)]
    models_dir: PathBuf,

    /// Environment configuration (TOML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Continue from the latest checkpoint in the models directory.
    #[arg(long)]
    resume: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let env_config = match &args.config {
        Some(path) => WalkerConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => WalkerConfig::default(),
    };
    let train_config = TrainConfig {
        population: args.population,
        top_k: args.top_k,
        rollout_steps: args.rollout_steps,
        timesteps_per_checkpoint: args.timesteps_per_checkpoint,
        checkpoints: args.checkpoints,
        seed: args.seed,
        models_dir: args.models_dir.clone(),
        ..TrainConfig::default()
    };

    let mut trainer = Trainer::new(train_config, env_config).context("setting up trainer")?;

    if args.resume {
        match CheckpointDir::new(&args.models_dir).latest()? {
            Some(latest) => trainer.resume_from(&latest)?,
            None => info!(models_dir = %args.models_dir.display(), "no checkpoint to resume from, starting fresh"),
        }
    }

    let saved = trainer.run().context("training")?;
    match saved.last() {
        Some(last) => println!(
            "Wrote {} checkpoints after {} generations, latest: {}",
            saved.len(),
            trainer.generation(),
            last.path.display()
        ),
        None => println!("No checkpoints written"),
    }
    Ok(())
}
