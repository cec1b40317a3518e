//! Checkpoints are named by the cumulative number of environment timesteps
//! the policy was trained for: `<timesteps>.bin`.

use std::path::{Path, PathBuf};

use crate::error::CheckpointError;

pub const DEFAULT_MODELS_DIR: &str = "models/neuroevolution";
pub const CHECKPOINT_EXTENSION: &str = "bin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub timesteps: u64,
    pub path: PathBuf,
}

impl Checkpoint {
    pub fn file_name(&self) -> String {
        format!("{}.{CHECKPOINT_EXTENSION}", self.timesteps)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointDir {
    root: PathBuf,
}

impl Default for CheckpointDir {
    fn default() -> Self {
        Self::new(DEFAULT_MODELS_DIR)
    }
}

impl CheckpointDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, timesteps: u64) -> PathBuf {
        self.root.join(format!("{timesteps}.{CHECKPOINT_EXTENSION}"))
    }

    /// All checkpoints, ordered by timesteps. A missing directory is an empty list;
    /// files whose stem is not a number are ignored.
    pub fn list(&self) -> Result<Vec<Checkpoint>, CheckpointError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(CheckpointError::Io {
                    path: self.root.clone(),
                    source,
                })
            }
        };

        let mut checkpoints: Vec<Checkpoint> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter_map(|path| parse_timesteps(&path).map(|timesteps| Checkpoint { timesteps, path }))
            .collect();
        checkpoints.sort_by_key(|c| c.timesteps);
        Ok(checkpoints)
    }

    pub fn latest(&self) -> Result<Option<Checkpoint>, CheckpointError> {
        Ok(self.list()?.pop())
    }
}

fn parse_timesteps(path: &Path) -> Option<u64> {
    if path.extension()? != CHECKPOINT_EXTENSION {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_uses_timesteps_as_name() {
        let dir = CheckpointDir::default();
        assert_eq!(
            dir.path_for(100_000),
            PathBuf::from("models/neuroevolution/100000.bin")
        );
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = CheckpointDir::new(tmp.path().join("absent"));
        assert!(dir.list().unwrap().is_empty());
        assert!(dir.latest().unwrap().is_none());
    }

    #[test]
    fn list_sorts_numerically_and_skips_foreign_files() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["20000.bin", "100000.bin", "30000.bin", "notes.txt", "best.bin"] {
            std::fs::write(tmp.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(tmp.path().join("40000.bin")).unwrap();

        let dir = CheckpointDir::new(tmp.path());
        let steps: Vec<u64> = dir.list().unwrap().iter().map(|c| c.timesteps).collect();
        assert_eq!(steps, vec![20_000, 30_000, 100_000]);

        let latest = dir.latest().unwrap().unwrap();
        assert_eq!(latest.file_name(), "100000.bin");
        assert_eq!(latest.path, tmp.path().join("100000.bin"));
    }
}
