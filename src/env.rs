//! The episodic walker environment.
//!
//! Lifecycle: `new` (performs an initial reset) → `reset` → `step`* until
//! terminated or truncated → `reset` again, or `close`. `reset` may be called
//! at any time and always rebuilds the physics world from scratch.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::config::{RenderConfig, WalkerConfig};
use crate::error::{RenderError, Result};
use crate::render::{FrameBuffer, RenderMode, RgbFrame, Scene};
use crate::reward::{self, RewardBreakdown, Termination};
use crate::spaces::BoxSpace;
use crate::world::SimulationWorld;

#[cfg(feature = "window")]
use crate::render::WindowSurface;

pub const OBSERVATION_DIM: usize = 10;
pub const ACTION_DIM: usize = 2;

/// Auxiliary per-step data. Currently always empty.
pub type Info = HashMap<String, f32>;

/// Overrides accepted by `reset` for interface compatibility; not applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResetOptions {
    pub overrides: BTreeMap<String, f64>,
}

/// Snapshot of the walker's physical state.
///
/// Layout: torso angle, torso angular velocity, torso x, torso y, torso vx,
/// torso vy, leg 1 angle relative to torso, leg 1 angular velocity, leg 2
/// angle relative to torso, leg 2 angular velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation(pub [f32; OBSERVATION_DIM]);

impl Observation {
    fn from_world(world: &SimulationWorld) -> Self {
        let torso = world.torso_state();
        let [leg_1, leg_2] = world.leg_states();
        Self([
            torso.rotation,
            torso.angular_velocity,
            torso.position[0],
            torso.position[1],
            torso.velocity[0],
            torso.velocity[1],
            leg_1.rotation - torso.rotation,
            leg_1.angular_velocity,
            leg_2.rotation - torso.rotation,
            leg_2.angular_velocity,
        ])
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn torso_angle(&self) -> f32 {
        self.0[0]
    }

    pub fn torso_position(&self) -> [f32; 2] {
        [self.0[2], self.0[3]]
    }

    pub fn leg_relative_angle(&self, leg: usize) -> f32 {
        self.0[6 + 2 * leg]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub info: Info,
}

impl StepResult {
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

enum Surface {
    Unopened,
    #[cfg(feature = "window")]
    Open(WindowSurface),
    /// The user closed the window; rendering stays off until `close`.
    ClosedByUser,
    /// Opening the window failed once; rendering stays off until `close`.
    Failed,
}

#[cfg(feature = "window")]
fn open_surface(config: &RenderConfig) -> Result<Surface, RenderError> {
    Ok(Surface::Open(WindowSurface::open(config)?))
}

#[cfg(not(feature = "window"))]
fn open_surface(_config: &RenderConfig) -> Result<Surface, RenderError> {
    Err(RenderError::WindowUnavailable)
}

pub struct WalkerEnv {
    config: WalkerConfig,
    render_mode: RenderMode,
    world: SimulationWorld,
    steps: u32,
    prev_x: f32,
    last_reward: Option<RewardBreakdown>,
    surface: Surface,
    offscreen: Option<FrameBuffer>,
    action_space: BoxSpace,
    observation_space: BoxSpace,
}

impl WalkerEnv {
    pub fn new(config: WalkerConfig, render_mode: RenderMode) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config, render_mode))
    }

    /// Default configuration, no rendering.
    pub fn headless() -> Self {
        Self::from_valid_config(WalkerConfig::default(), RenderMode::None)
    }

    pub(crate) fn from_valid_config(config: WalkerConfig, render_mode: RenderMode) -> Self {
        let world = SimulationWorld::new(&config);
        let prev_x = world.torso_state().position[0];
        Self {
            config,
            render_mode,
            world,
            steps: 0,
            prev_x,
            last_reward: None,
            surface: Surface::Unopened,
            offscreen: None,
            action_space: BoxSpace::uniform(ACTION_DIM, -1.0, 1.0),
            observation_space: BoxSpace::unbounded(OBSERVATION_DIM),
        }
    }

    /// Starts a new episode. `seed` and `options` are accepted but do not
    /// influence the spawn state, which is fully deterministic.
    pub fn reset(&mut self, seed: Option<u64>, options: Option<&ResetOptions>) -> (Observation, Info) {
        debug!(
            ?seed,
            overrides = options.map_or(0, |o| o.overrides.len()),
            "resetting walker episode"
        );
        self.world = SimulationWorld::new(&self.config);
        self.steps = 0;
        self.prev_x = self.world.torso_state().position[0];
        self.last_reward = None;
        (self.observation(), Info::new())
    }

    /// Applies one action and advances the simulation by a single physics step.
    ///
    /// Actions outside [-1, 1] are used as given unless `episode.clamp_actions`
    /// is set.
    pub fn step(&mut self, action: [f32; ACTION_DIM]) -> StepResult {
        self.steps += 1;

        let action = if self.config.episode.clamp_actions {
            action.map(|a| a.clamp(-1.0, 1.0))
        } else {
            action
        };
        let rate_scale = self.config.reward.rate_scale;
        self.world.set_leg_rates(action.map(|a| a * rate_scale));
        self.world.step();

        let torso = self.world.torso_state();
        let termination = Termination::check(torso.position[1], torso.rotation, &self.config.reward);
        let reward = RewardBreakdown::compute(
            self.prev_x,
            torso.position[0],
            &action,
            termination,
            &self.config.reward,
        );
        self.prev_x = torso.position[0];
        self.last_reward = Some(reward);

        let truncated = reward::truncated(self.steps, self.config.episode.max_episode_steps);

        if self.render_mode == RenderMode::Human {
            if let Err(err) = self.render() {
                warn!(%err, "human render failed, window rendering disabled until close");
            }
        }

        StepResult {
            observation: self.observation(),
            reward: reward.total,
            terminated: termination.terminated(),
            truncated,
            info: Info::new(),
        }
    }

    /// Draws the current state according to the render mode.
    ///
    /// Returns a pixel buffer only in [`RenderMode::OffscreenBuffer`].
    pub fn render(&mut self) -> Result<Option<RgbFrame>> {
        match self.render_mode {
            RenderMode::None => Ok(None),
            RenderMode::OffscreenBuffer => {
                let scene = self.scene();
                let render = &self.config.render;
                let buffer = self
                    .offscreen
                    .get_or_insert_with(|| FrameBuffer::new(render.width, render.height));
                buffer.draw(&scene)?;
                Ok(Some(buffer.frame()))
            }
            RenderMode::Human => {
                self.render_window()?;
                Ok(None)
            }
        }
    }

    fn render_window(&mut self) -> Result<(), RenderError> {
        if matches!(self.surface, Surface::Unopened) {
            match open_surface(&self.config.render) {
                Ok(surface) => {
                    self.surface = surface;
                    debug!("render window opened");
                }
                Err(err) => {
                    self.surface = Surface::Failed;
                    return Err(err);
                }
            }
        }
        self.present_window()
    }

    #[cfg(feature = "window")]
    fn present_window(&mut self) -> Result<(), RenderError> {
        let scene = self.scene();
        let close_requested = match &mut self.surface {
            Surface::Open(window) => window.close_requested(),
            _ => return Ok(()),
        };
        if close_requested {
            tracing::info!("render window closed by user");
            self.surface = Surface::ClosedByUser;
            return Ok(());
        }
        if let Surface::Open(window) = &mut self.surface {
            window.present(&scene)?;
        }
        Ok(())
    }

    #[cfg(not(feature = "window"))]
    fn present_window(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    /// Releases the render surface. Safe to call repeatedly or without ever rendering.
    pub fn close(&mut self) {
        if !matches!(self.surface, Surface::Unopened) {
            debug!("render surface released");
        }
        self.surface = Surface::Unopened;
        self.offscreen = None;
    }

    /// True once the user has closed the window in [`RenderMode::Human`].
    pub fn render_closed(&self) -> bool {
        matches!(self.surface, Surface::ClosedByUser)
    }

    /// True once opening the window has failed in [`RenderMode::Human`].
    pub fn render_failed(&self) -> bool {
        matches!(self.surface, Surface::Failed)
    }

    pub fn scene(&self) -> Scene {
        Scene::capture(&self.world, self.steps, self.spawn_x(), &self.config.render)
    }

    pub fn observation(&self) -> Observation {
        Observation::from_world(&self.world)
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn last_reward(&self) -> Option<&RewardBreakdown> {
        self.last_reward.as_ref()
    }

    pub fn spawn_x(&self) -> f32 {
        self.config.body.spawn[0]
    }

    /// Horizontal distance of the torso from its spawn point.
    pub fn distance(&self) -> f32 {
        self.world.torso_state().position[0] - self.spawn_x()
    }

    pub fn config(&self) -> &WalkerConfig {
        &self.config
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn action_space(&self) -> &BoxSpace {
        &self.action_space
    }

    pub fn observation_space(&self) -> &BoxSpace {
        &self.observation_space
    }

    pub fn world(&self) -> &SimulationWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut SimulationWorld {
        &mut self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaces_have_documented_shapes() {
        let env = WalkerEnv::headless();
        assert_eq!(env.action_space().dim(), ACTION_DIM);
        assert_eq!(env.action_space().low, vec![-1.0; 2]);
        assert_eq!(env.observation_space().dim(), OBSERVATION_DIM);
        assert!(env.observation_space().high.iter().all(|h| h.is_infinite()));
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut config = WalkerConfig::default();
        config.physics.dt = -1.0;
        assert!(WalkerEnv::new(config, RenderMode::None).is_err());
    }

    #[test]
    fn observation_layout_matches_world_state() {
        let mut env = WalkerEnv::headless();
        env.step([0.3, -0.3]);
        let obs = env.observation();
        let torso = env.world().torso_state();
        assert_eq!(obs.torso_angle(), torso.rotation);
        assert_eq!(obs.torso_position(), torso.position);
        assert_eq!(obs.0[4], torso.velocity[0]);
        assert_eq!(obs.0[5], torso.velocity[1]);
        let legs = env.world().leg_states();
        assert_eq!(obs.leg_relative_angle(0), legs[0].rotation - torso.rotation);
        assert_eq!(obs.0[7], legs[0].angular_velocity);
        assert_eq!(obs.leg_relative_angle(1), legs[1].rotation - torso.rotation);
        assert_eq!(obs.0[9], legs[1].angular_velocity);
    }

    #[test]
    fn reset_clears_step_counter_and_reward() {
        let mut env = WalkerEnv::headless();
        for _ in 0..5 {
            env.step([1.0, 1.0]);
        }
        assert_eq!(env.steps(), 5);
        assert!(env.last_reward().is_some());
        env.reset(Some(3), Some(&ResetOptions::default()));
        assert_eq!(env.steps(), 0);
        assert!(env.last_reward().is_none());
        assert_eq!(env.distance(), 0.0);
    }

    #[test]
    fn reward_total_matches_breakdown() {
        let mut env = WalkerEnv::headless();
        let result = env.step([0.5, 0.25]);
        let breakdown = env.last_reward().unwrap();
        assert_eq!(result.reward, breakdown.total);
        assert!((breakdown.energy_penalty - 0.0375).abs() < 1e-6);
    }

    #[test]
    fn clamping_is_opt_in() {
        let mut config = WalkerConfig::default();
        config.episode.clamp_actions = true;
        let mut clamped = WalkerEnv::new(config, RenderMode::None).unwrap();
        clamped.step([4.0, -4.0]);
        assert!((clamped.last_reward().unwrap().energy_penalty - 0.1).abs() < 1e-6);

        let mut permissive = WalkerEnv::headless();
        permissive.step([4.0, -4.0]);
        assert!((permissive.last_reward().unwrap().energy_penalty - 0.4).abs() < 1e-6);
    }

    #[test]
    fn headless_render_returns_nothing() {
        let mut env = WalkerEnv::headless();
        assert!(env.render().unwrap().is_none());
    }

    #[test]
    fn offscreen_render_returns_frame_of_configured_size() {
        let mut env = WalkerEnv::new(WalkerConfig::default(), RenderMode::OffscreenBuffer).unwrap();
        assert_eq!(env.render_mode(), RenderMode::OffscreenBuffer);
        env.step([0.0, 0.0]);
        let frame = env.render().unwrap().unwrap();
        assert_eq!((frame.width, frame.height), (800, 400));
        assert_eq!(frame.pixels.len(), 800 * 400 * 3);
    }

    #[test]
    fn close_is_idempotent() {
        let mut env = WalkerEnv::new(WalkerConfig::default(), RenderMode::OffscreenBuffer).unwrap();
        env.close();
        env.render().unwrap();
        env.close();
        env.close();
        assert!(!env.render_closed());
    }

    #[test]
    fn failed_window_is_not_retried_until_close() {
        let mut env = WalkerEnv::new(WalkerConfig::default(), RenderMode::Human).unwrap();
        env.surface = Surface::Failed;
        assert!(env.render_failed());
        assert!(env.render().unwrap().is_none());
        env.step([0.2, 0.2]);
        assert!(env.render_failed());
        assert_eq!(env.steps(), 1);

        env.close();
        assert!(!env.render_failed());
    }

    #[cfg(not(feature = "window"))]
    #[test]
    fn missing_window_feature_errors_once() {
        let mut env = WalkerEnv::new(WalkerConfig::default(), RenderMode::Human).unwrap();
        assert!(env.render().is_err());
        assert!(env.render_failed());
        assert!(env.render().unwrap().is_none());
    }
}
