//! Reward shaping and episode-ending rules.
//!
//! Kept free of physics types so every term can be checked in isolation.

use crate::config::RewardConfig;

/// Why an episode terminated. Both conditions may hold in the same step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Termination {
    /// Torso dropped below the fall height.
    pub fallen: bool,
    /// Torso orientation exceeded the tilt limit.
    pub tipped: bool,
}

impl Termination {
    pub fn check(torso_y: f32, torso_angle: f32, config: &RewardConfig) -> Self {
        Self {
            fallen: torso_y < config.fall_height,
            tipped: torso_angle.abs() > config.max_tilt,
        }
    }

    pub fn terminated(&self) -> bool {
        self.fallen || self.tipped
    }
}

/// Individual reward terms of one step; `total` is their signed sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardBreakdown {
    pub forward: f32,
    pub energy_penalty: f32,
    /// Zero, or the termination penalty exactly once.
    pub termination_penalty: f32,
    pub survival_bonus: f32,
    pub total: f32,
}

impl RewardBreakdown {
    pub fn compute(
        previous_x: f32,
        current_x: f32,
        action: &[f32],
        termination: Termination,
        config: &RewardConfig,
    ) -> Self {
        let forward = (current_x - previous_x) * config.forward_weight;
        let energy_penalty = mean_abs(action) * config.energy_weight;
        // Assigned, not accumulated: falling and tipping together still cost one penalty.
        let termination_penalty = if termination.terminated() {
            config.termination_penalty
        } else {
            0.0
        };
        let survival_bonus = config.survival_bonus;
        Self {
            forward,
            energy_penalty,
            termination_penalty,
            survival_bonus,
            total: forward - energy_penalty + termination_penalty + survival_bonus,
        }
    }
}

fn mean_abs(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| v.abs()).sum::<f32>() / values.len() as f32
}

/// Step-count horizon, independent of the agent's state.
pub fn truncated(steps: u32, max_episode_steps: u32) -> bool {
    steps >= max_episode_steps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RewardConfig {
        RewardConfig::default()
    }

    #[test]
    fn idle_step_earns_exactly_the_survival_bonus() {
        let r = RewardBreakdown::compute(200.0, 200.0, &[0.0, 0.0], Termination::default(), &config());
        assert_eq!(r.total, 0.1);
        assert_eq!(r.forward, 0.0);
        assert_eq!(r.energy_penalty, 0.0);
        assert_eq!(r.termination_penalty, 0.0);
    }

    #[test]
    fn forward_progress_is_weighted_displacement() {
        let r = RewardBreakdown::compute(200.0, 203.0, &[0.0, 0.0], Termination::default(), &config());
        assert!((r.forward - 30.0).abs() < 1e-4);
        let back = RewardBreakdown::compute(200.0, 199.0, &[0.0, 0.0], Termination::default(), &config());
        assert!((back.forward + 10.0).abs() < 1e-4);
    }

    #[test]
    fn energy_penalty_is_mean_absolute_action() {
        let r = RewardBreakdown::compute(0.0, 0.0, &[1.0, -0.5], Termination::default(), &config());
        assert!((r.energy_penalty - 0.075).abs() < 1e-6);
        assert!((r.total - (0.1 - 0.075)).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_actions_scale_the_penalty_linearly() {
        let r = RewardBreakdown::compute(0.0, 0.0, &[3.0, 3.0], Termination::default(), &config());
        assert!((r.energy_penalty - 0.3).abs() < 1e-6);
    }

    #[test]
    fn fall_and_tilt_together_cost_one_penalty() {
        let both = Termination::check(10.0, 1.5, &config());
        assert!(both.fallen && both.tipped);
        let r = RewardBreakdown::compute(0.0, 0.0, &[0.0, 0.0], both, &config());
        assert_eq!(r.termination_penalty, -100.0);
        assert!((r.total - (-100.0 + 0.1)).abs() < 1e-4);
    }

    #[test]
    fn survival_bonus_is_granted_even_when_terminated() {
        let fallen = Termination::check(0.0, 0.0, &config());
        let r = RewardBreakdown::compute(0.0, 0.0, &[0.0, 0.0], fallen, &config());
        assert_eq!(r.survival_bonus, 0.1);
    }

    #[test]
    fn thresholds_are_strict() {
        let c = config();
        assert!(!Termination::check(80.0, 0.0, &c).terminated());
        assert!(Termination::check(79.999, 0.0, &c).fallen);
        assert!(!Termination::check(200.0, 1.0, &c).terminated());
        assert!(Termination::check(200.0, -1.001, &c).tipped);
    }

    #[test]
    fn truncation_is_pure_step_count() {
        assert!(!truncated(999, 1000));
        assert!(truncated(1000, 1000));
        assert!(truncated(1001, 1000));
    }
}
