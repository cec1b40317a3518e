use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the walker crate.
#[derive(Debug, Error)]
pub enum WalkerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid physics dt: {0} (must be > 0)")]
    InvalidDt(f32),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Errors reading or writing policy checkpoints.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checkpoint {path} has {got} bytes, expected {expected}")]
    SizeMismatch {
        path: PathBuf,
        got: usize,
        expected: usize,
    },

    #[error("Checkpoint not found: {0}")]
    NotFound(PathBuf),
}

/// Render surface errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Window initialization failed: {0}")]
    Init(String),

    #[error("Drawing failed: {0}")]
    Draw(String),

    #[error("Human rendering requires the `window` feature")]
    WindowUnavailable,
}

pub type Result<T, E = WalkerError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_into_walker_error() {
        let err: WalkerError = ConfigError::InvalidDt(0.0).into();
        assert!(matches!(err, WalkerError::Config(ConfigError::InvalidDt(_))));
        assert!(err.to_string().contains("must be > 0"));
    }

    #[test]
    fn checkpoint_size_mismatch_message_names_both_sizes() {
        let err = CheckpointError::SizeMismatch {
            path: PathBuf::from("models/x.bin"),
            got: 12,
            expected: 16,
        };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("16"));
    }
}
