//! Two-legged walker environment on rapier2d, with a neuroevolution trainer,
//! timestep-named checkpoints and a replay window.

pub mod checkpoint;
pub mod config;
pub mod dashboard;
pub mod env;
pub mod error;
pub mod physics;
pub mod policy;
pub mod render;
pub mod replay;
pub mod reward;
pub mod spaces;
pub mod train;
pub mod walker;
pub mod world;

// Re-export public items
pub use checkpoint::{Checkpoint, CheckpointDir, DEFAULT_MODELS_DIR};
pub use config::{
    BodyConfig, EpisodeConfig, PhysicsConfig, RenderConfig, RewardConfig, WalkerConfig,
};
pub use dashboard::Dashboard;
pub use env::{
    Info, Observation, ResetOptions, StepResult, WalkerEnv, ACTION_DIM, OBSERVATION_DIM,
};
pub use error::{CheckpointError, ConfigError, RenderError, Result, WalkerError};
pub use physics::{RigidBodySnapshot, FIXED_TIME_STEP, GRAVITY};
pub use policy::Policy;
pub use render::{RenderMode, RgbFrame, Scene};
pub use replay::{replay, ReplayStop, ReplaySummary};
pub use reward::{RewardBreakdown, Termination};
pub use spaces::BoxSpace;
pub use train::{evaluate, GenerationStats, Rollout, TrainConfig, Trainer};
pub use walker::{Walker, WalkerPart, WalkerPartShape, LEG_COUNT};
pub use world::SimulationWorld;
