//! Launcher helpers: checkpoint listing, spawning the visualizer, training command text.

use std::path::{Path, PathBuf};
use std::process::{Child, Command};

use tracing::info;

use crate::checkpoint::{Checkpoint, CheckpointDir};
use crate::error::{Result, WalkerError};
use crate::train::DEFAULT_TIMESTEPS_PER_CHECKPOINT;

pub const VISUALIZER_BIN: &str = "visualize";
pub const TRAINER_BIN: &str = "train";

/// Path of a binary built alongside the current executable, falling back to a bare
/// name resolved through `PATH`.
pub fn sibling_binary(name: &str) -> PathBuf {
    let file_name = format!("{name}{}", std::env::consts::EXE_SUFFIX);
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&file_name)))
        .filter(|candidate| candidate.is_file())
        .unwrap_or_else(|| PathBuf::from(file_name))
}

pub struct Dashboard {
    checkpoints: CheckpointDir,
    visualizer: PathBuf,
}

impl Dashboard {
    pub fn new(checkpoints: CheckpointDir) -> Self {
        Self {
            checkpoints,
            visualizer: sibling_binary(VISUALIZER_BIN),
        }
    }

    pub fn with_visualizer(mut self, program: impl Into<PathBuf>) -> Self {
        self.visualizer = program.into();
        self
    }

    pub fn checkpoint_dir(&self) -> &CheckpointDir {
        &self.checkpoints
    }

    pub fn checkpoints(&self) -> Result<Vec<Checkpoint>> {
        Ok(self.checkpoints.list()?)
    }

    pub fn visualize_command(&self, model: &Path) -> Command {
        let mut command = Command::new(&self.visualizer);
        command.arg("--model").arg(model);
        command
    }

    /// Starts the visualizer for `model` and returns without waiting for it.
    pub fn launch(&self, model: &Path) -> Result<Child> {
        let child = self
            .visualize_command(model)
            .spawn()
            .map_err(|source| WalkerError::Launch {
                program: self.visualizer.display().to_string(),
                source,
            })?;
        info!(pid = child.id(), model = %model.display(), "visualizer launched");
        Ok(child)
    }

    /// Shell command that trains for at least `total_timesteps`, writing into this
    /// dashboard's checkpoint directory.
    pub fn training_command(&self, total_timesteps: u64) -> String {
        let checkpoints = total_timesteps
            .div_ceil(DEFAULT_TIMESTEPS_PER_CHECKPOINT)
            .max(1);
        format!(
            "cargo run --release --bin {TRAINER_BIN} -- --checkpoints {checkpoints} --models-dir {}",
            self.checkpoints.root().display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn training_command_rounds_up_to_whole_chunks() {
        let dashboard = Dashboard::new(CheckpointDir::default());
        assert_eq!(
            dashboard.training_command(100_000),
            "cargo run --release --bin train -- --checkpoints 10 --models-dir models/neuroevolution"
        );
        assert!(dashboard.training_command(15_000).contains("--checkpoints 2 "));
        assert!(dashboard.training_command(0).contains("--checkpoints 1 "));
    }

    #[test]
    fn visualize_command_passes_model_path() {
        let dashboard = Dashboard::new(CheckpointDir::default()).with_visualizer("viz");
        let command = dashboard.visualize_command(Path::new("models/neuroevolution/10000.bin"));
        assert_eq!(command.get_program(), "viz");
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, ["--model", "models/neuroevolution/10000.bin"]);
    }

    #[test]
    fn launch_failure_is_reported_not_panicked() {
        let dashboard = Dashboard::new(CheckpointDir::default())
            .with_visualizer("/definitely/not/a/real/visualizer");
        let err = dashboard.launch(Path::new("x.bin")).unwrap_err();
        assert!(matches!(err, WalkerError::Launch { .. }));
        assert!(err.to_string().contains("/definitely/not/a/real/visualizer"));
    }

    #[test]
    fn lists_checkpoints_from_its_directory() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("10000.bin"), b"").unwrap();
        let dashboard = Dashboard::new(CheckpointDir::new(tmp.path()));
        let listed = dashboard.checkpoints().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].timesteps, 10_000);
    }
}
