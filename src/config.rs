//! Tunable parameters for the walker environment, loadable from TOML.
//!
//! Every field has a default matching the reference walker, so an empty file
//! (or [`WalkerConfig::default`]) reproduces the standard task.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::physics::{
    FIXED_TIME_STEP, GRAVITY, GROUND_FRICTION, LENGTH_UNIT, LEG_SPAWN_DROP, WALKER_SPAWN,
};

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_gravity() -> [f32; 2] {
    GRAVITY
}
const fn default_dt() -> f32 {
    FIXED_TIME_STEP
}
const fn default_length_unit() -> f32 {
    LENGTH_UNIT
}
const fn default_ground_friction() -> f32 {
    GROUND_FRICTION
}
const fn default_torso_mass() -> f32 {
    10.0
}
const fn default_torso_radius() -> f32 {
    20.0
}
const fn default_torso_friction() -> f32 {
    0.5
}
const fn default_leg_mass() -> f32 {
    2.0
}
const fn default_leg_size() -> [f32; 2] {
    [10.0, 60.0]
}
const fn default_leg_friction() -> f32 {
    1.0
}
const fn default_motor_max_force() -> f32 {
    100_000.0
}
const fn default_motor_damping() -> f32 {
    50.0
}
const fn default_spawn() -> [f32; 2] {
    WALKER_SPAWN
}
const fn default_leg_drop() -> f32 {
    LEG_SPAWN_DROP
}
const fn default_rate_scale() -> f32 {
    5.0
}
const fn default_forward_weight() -> f32 {
    10.0
}
const fn default_energy_weight() -> f32 {
    0.1
}
const fn default_fall_height() -> f32 {
    80.0
}
const fn default_max_tilt() -> f32 {
    1.0
}
const fn default_termination_penalty() -> f32 {
    -100.0
}
const fn default_survival_bonus() -> f32 {
    0.1
}
const fn default_max_episode_steps() -> u32 {
    1000
}
const fn default_width() -> u32 {
    800
}
const fn default_height() -> u32 {
    400
}
const fn default_fps() -> u32 {
    50
}
const fn default_grid_spacing() -> f32 {
    50.0
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// World-level physics parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    #[serde(default = "default_gravity")]
    pub gravity: [f32; 2],

    /// Seconds advanced per environment step (single integration step).
    #[serde(default = "default_dt")]
    pub dt: f32,

    /// Rapier length unit, i.e. how many world units make a "meter".
    #[serde(default = "default_length_unit")]
    pub length_unit: f32,

    #[serde(default = "default_ground_friction")]
    pub ground_friction: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            dt: default_dt(),
            length_unit: default_length_unit(),
            ground_friction: default_ground_friction(),
        }
    }
}

/// Walker body plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    #[serde(default = "default_torso_mass")]
    pub torso_mass: f32,
    #[serde(default = "default_torso_radius")]
    pub torso_radius: f32,
    #[serde(default = "default_torso_friction")]
    pub torso_friction: f32,

    #[serde(default = "default_leg_mass")]
    pub leg_mass: f32,
    /// Leg width and length.
    #[serde(default = "default_leg_size")]
    pub leg_size: [f32; 2],
    #[serde(default = "default_leg_friction")]
    pub leg_friction: f32,

    #[serde(default = "default_motor_max_force")]
    pub motor_max_force: f32,
    #[serde(default = "default_motor_damping")]
    pub motor_damping: f32,

    /// Torso centre at spawn.
    #[serde(default = "default_spawn")]
    pub spawn: [f32; 2],
    /// Vertical distance from torso centre down to leg centres at spawn.
    #[serde(default = "default_leg_drop")]
    pub leg_drop: f32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            torso_mass: default_torso_mass(),
            torso_radius: default_torso_radius(),
            torso_friction: default_torso_friction(),
            leg_mass: default_leg_mass(),
            leg_size: default_leg_size(),
            leg_friction: default_leg_friction(),
            motor_max_force: default_motor_max_force(),
            motor_damping: default_motor_damping(),
            spawn: default_spawn(),
            leg_drop: default_leg_drop(),
        }
    }
}

/// Reward shaping and termination thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Motor target rate per unit of action.
    #[serde(default = "default_rate_scale")]
    pub rate_scale: f32,
    #[serde(default = "default_forward_weight")]
    pub forward_weight: f32,
    #[serde(default = "default_energy_weight")]
    pub energy_weight: f32,
    /// Torso heights strictly below this count as fallen.
    #[serde(default = "default_fall_height")]
    pub fall_height: f32,
    /// Torso angles with magnitude strictly above this count as tipped over.
    #[serde(default = "default_max_tilt")]
    pub max_tilt: f32,
    #[serde(default = "default_termination_penalty")]
    pub termination_penalty: f32,
    #[serde(default = "default_survival_bonus")]
    pub survival_bonus: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            rate_scale: default_rate_scale(),
            forward_weight: default_forward_weight(),
            energy_weight: default_energy_weight(),
            fall_height: default_fall_height(),
            max_tilt: default_max_tilt(),
            termination_penalty: default_termination_penalty(),
            survival_bonus: default_survival_bonus(),
        }
    }
}

/// Episode horizon and action handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeConfig {
    #[serde(default = "default_max_episode_steps")]
    pub max_episode_steps: u32,

    /// Clamp actions to [-1, 1] before scaling. Off by default: out-of-range
    /// actions overdrive the motors proportionally.
    #[serde(default)]
    pub clamp_actions: bool,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            max_episode_steps: default_max_episode_steps(),
            clamp_actions: false,
        }
    }
}

/// Render surface parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_grid_spacing")]
    pub grid_spacing: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            grid_spacing: default_grid_spacing(),
        }
    }
}

// ---------------------------------------------------------------------------
// WalkerConfig
// ---------------------------------------------------------------------------

/// Complete environment configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalkerConfig {
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub body: BodyConfig,
    #[serde(default)]
    pub reward: RewardConfig,
    #[serde(default)]
    pub episode: EpisodeConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

impl WalkerConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.physics.dt > 0.0) {
            return Err(ConfigError::InvalidDt(self.physics.dt));
        }
        if !(self.physics.length_unit > 0.0) {
            return Err(invalid("physics.length_unit", "must be > 0"));
        }
        for (field, value) in [
            ("body.torso_mass", self.body.torso_mass),
            ("body.torso_radius", self.body.torso_radius),
            ("body.leg_mass", self.body.leg_mass),
            ("body.leg_size[0]", self.body.leg_size[0]),
            ("body.leg_size[1]", self.body.leg_size[1]),
        ] {
            if !(value > 0.0) {
                return Err(invalid(field, format!("must be > 0, got {value}")));
            }
        }
        if self.body.motor_max_force < 0.0 {
            return Err(invalid("body.motor_max_force", "must be >= 0"));
        }
        if self.episode.max_episode_steps == 0 {
            return Err(invalid("episode.max_episode_steps", "must be >= 1"));
        }
        if self.render.width == 0 || self.render.height == 0 {
            return Err(invalid("render", "width and height must be >= 1"));
        }
        if self.render.fps == 0 {
            return Err(invalid("render.fps", "must be >= 1"));
        }
        if !(self.render.grid_spacing > 0.0) {
            return Err(invalid("render.grid_spacing", "must be > 0"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_walker() {
        let config = WalkerConfig::default();
        assert_eq!(config.physics.gravity, [0.0, -900.0]);
        assert!((config.physics.dt - 0.02).abs() < 1e-9);
        assert_eq!(config.reward.rate_scale, 5.0);
        assert_eq!(config.reward.fall_height, 80.0);
        assert_eq!(config.reward.termination_penalty, -100.0);
        assert_eq!(config.episode.max_episode_steps, 1000);
        assert!(!config.episode.clamp_actions);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = WalkerConfig::from_toml_str("").unwrap();
        assert_eq!(config, WalkerConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = WalkerConfig::from_toml_str(
            r#"
            [episode]
            max_episode_steps = 200
            clamp_actions = true

            [reward]
            forward_weight = 2.5
            "#,
        )
        .unwrap();
        assert_eq!(config.episode.max_episode_steps, 200);
        assert!(config.episode.clamp_actions);
        assert_eq!(config.reward.forward_weight, 2.5);
        assert_eq!(config.reward.energy_weight, 0.1);
        assert_eq!(config.body, BodyConfig::default());
    }

    #[test]
    fn rejects_non_positive_dt() {
        let mut config = WalkerConfig::default();
        config.physics.dt = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDt(_))));
    }

    #[test]
    fn rejects_zero_horizon() {
        let err = WalkerConfig::from_toml_str("[episode]\nmax_episode_steps = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "episode.max_episode_steps",
                ..
            }
        ));
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/walker.toml");
        let mut config = WalkerConfig::from_toml_file(path).unwrap();
        let defaults = WalkerConfig::default();
        assert!((config.physics.dt - defaults.physics.dt).abs() < 1e-9);
        config.physics.dt = defaults.physics.dt;
        assert_eq!(config, defaults);
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = WalkerConfig::from_toml_str("[physics\ndt = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
