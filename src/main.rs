//! Walker launcher CLI.
//!
//! - `check`: build an environment, take one random step, print shapes and render once
//! - `bench`: headless steps per second with a fixed gait
//! - `checkpoints`: list trained checkpoints
//! - `launch`: open the visualizer for a checkpoint
//! - `train-command`: print the command that trains for N timesteps
//!
//! With no subcommand, lists checkpoints and prints the training command.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use simple_walker::{
    CheckpointDir, Dashboard, RenderMode, WalkerConfig, WalkerEnv, ACTION_DIM, DEFAULT_MODELS_DIR,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Simple walker launcher.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Directory holding `<timesteps>.bin` checkpoints.
    #[arg(long, global = true, default_value = DEFAULT_MODELS_DIR)]
    models_dir: PathBuf,

    /// Environment configuration (TOML). Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reset an environment, take one random step, render once and print the result.
    Check {
        /// Seed for the sampled action.
        #[arg(short, long, default_value_t = 0)]
        seed: u64,

        /// Render mode: none, human or rgb_array.
        #[arg(long, default_value = "none")]
        render_mode: RenderMode,
    },

    /// Measure headless simulation throughput.
    Bench {
        /// Number of environment steps.
        #[arg(short = 'n', long, default_value_t = 10_000)]
        steps: u32,
    },

    /// List available checkpoints.
    Checkpoints,

    /// Launch the visualizer for a checkpoint (latest when omitted).
    Launch {
        /// Checkpoint file to replay.
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Print the command line that trains a policy.
    TrainCommand {
        /// Total environment timesteps to train for.
        #[arg(short, long, default_value_t = 100_000)]
        timesteps: u64,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<WalkerConfig> {
    match path {
        Some(path) => WalkerConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(WalkerConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn run_check(config: WalkerConfig, seed: u64, render_mode: RenderMode) -> Result<()> {
    let mut env = WalkerEnv::new(config, render_mode)?;
    let (observation, _) = env.reset(Some(seed), None);
    println!("Render mode: {}", env.render_mode());
    println!("Observation space: {:?}", env.observation_space());
    println!("Action space: {:?}", env.action_space());
    println!("Initial observation ({}): {:?}", observation.len(), observation.as_slice());

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let sample = env.action_space().sample(&mut rng);
    let mut action = [0.0; ACTION_DIM];
    action.copy_from_slice(&sample);

    let result = env.step(action);
    println!("Action: {action:?}");
    println!("Observation ({}): {:?}", result.observation.len(), result.observation.as_slice());
    println!(
        "Reward: {:.4}  terminated: {}  truncated: {}",
        result.reward, result.terminated, result.truncated
    );
    match env.render().context("rendering")? {
        Some(frame) => println!("Frame: {}x{} RGB", frame.width, frame.height),
        None => println!("Frame: none"),
    }
    env.close();
    Ok(())
}

fn run_bench(config: WalkerConfig, steps: u32) -> Result<()> {
    let mut env = WalkerEnv::new(config, RenderMode::None)?;
    env.reset(None, None);
    let dt = env.config().physics.dt;

    let mut episodes = 1u32;
    let start = Instant::now();
    for step in 0..steps {
        // Legs swing in antiphase at 1 Hz of simulated time.
        let phase = (step as f32 * dt * std::f32::consts::TAU).sin();
        let result = env.step([phase, -phase]);
        if result.done() {
            env.reset(None, None);
            episodes += 1;
        }
    }
    let elapsed = start.elapsed();

    println!("Steps: {steps}  episodes: {episodes}");
    println!("Total time: {:.2} seconds", elapsed.as_secs_f64());
    println!(
        "Steps per second: {:.2}",
        f64::from(steps) / elapsed.as_secs_f64().max(1e-9)
    );
    Ok(())
}

fn list_checkpoints(dashboard: &Dashboard) -> Result<()> {
    let checkpoints = dashboard.checkpoints()?;
    let root = dashboard.checkpoint_dir().root().display();
    if checkpoints.is_empty() {
        println!("No checkpoints in {root}");
        return Ok(());
    }
    println!("Checkpoints in {root}:");
    for checkpoint in checkpoints {
        println!("  {:>10} timesteps  {}", checkpoint.timesteps, checkpoint.path.display());
    }
    Ok(())
}

fn launch(dashboard: &Dashboard, model: Option<PathBuf>) -> Result<()> {
    let model = match model {
        Some(model) => model,
        None => match dashboard.checkpoint_dir().latest()? {
            Some(latest) => latest.path,
            None => {
                println!("No checkpoints to visualize. Train first:");
                println!("  {}", dashboard.training_command(100_000));
                return Ok(());
            }
        },
    };
    match dashboard.launch(&model) {
        Ok(child) => println!("Visualizer started (pid {}) for {}", child.id(), model.display()),
        Err(err) => eprintln!("Error launching visualizer: {err}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let dashboard = Dashboard::new(CheckpointDir::new(&cli.models_dir));

    match cli.command {
        Some(Commands::Check { seed, render_mode }) => {
            run_check(load_config(cli.config.as_ref())?, seed, render_mode)
        }
        Some(Commands::Bench { steps }) => run_bench(load_config(cli.config.as_ref())?, steps),
        Some(Commands::Checkpoints) => list_checkpoints(&dashboard),
        Some(Commands::Launch { model }) => launch(&dashboard, model),
        Some(Commands::TrainCommand { timesteps }) => {
            println!("{}", dashboard.training_command(timesteps));
            Ok(())
        }
        None => {
            list_checkpoints(&dashboard)?;
            println!();
            println!("To train:");
            println!("  {}", dashboard.training_command(100_000));
            Ok(())
        }
    }
}
