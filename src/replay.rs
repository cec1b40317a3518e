//! Drives a policy through consecutive episodes until the user stops it.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::env::WalkerEnv;
use crate::policy::Policy;

/// Why a replay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayStop {
    /// The interrupt flag was raised (Ctrl-C).
    Interrupted,
    /// The user closed the render window.
    WindowClosed,
    /// The render window could not be opened.
    WindowFailed,
    /// `max_steps` was reached.
    StepLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub steps: u64,
    /// Episodes started, including the one in progress when the replay stopped.
    pub episodes: u32,
    pub stop: ReplayStop,
}

/// Steps `env` with `policy`, resetting whenever an episode ends. `interrupt` is
/// checked before every step. The environment is closed on every exit path.
pub fn replay(
    env: &mut WalkerEnv,
    policy: &Policy,
    interrupt: &AtomicBool,
    max_steps: Option<u64>,
) -> ReplaySummary {
    let mut observation = env.reset(None, None).0;
    let mut steps = 0u64;
    let mut episodes = 1u32;

    let stop = loop {
        if interrupt.load(Ordering::SeqCst) {
            break ReplayStop::Interrupted;
        }
        if max_steps.is_some_and(|max| steps >= max) {
            break ReplayStop::StepLimit;
        }

        let result = env.step(policy.act(&observation));
        steps += 1;
        observation = result.observation;

        if env.render_closed() {
            break ReplayStop::WindowClosed;
        }
        if env.render_failed() {
            break ReplayStop::WindowFailed;
        }
        if result.done() {
            info!(
                episode = episodes,
                steps = env.steps(),
                distance = env.distance(),
                terminated = result.terminated,
                "episode finished"
            );
            episodes += 1;
            observation = env.reset(None, None).0;
        }
    };

    env.close();
    ReplaySummary {
        steps,
        episodes,
        stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WalkerConfig;
    use crate::render::RenderMode;

    #[test]
    fn raised_interrupt_stops_before_the_first_step() {
        let mut env = WalkerEnv::headless();
        let interrupt = AtomicBool::new(true);
        let summary = replay(&mut env, &Policy::new_random(), &interrupt, None);
        assert_eq!(summary.stop, ReplayStop::Interrupted);
        assert_eq!(summary.steps, 0);
        assert_eq!(env.steps(), 0);
    }

    #[test]
    fn step_limit_ends_replay_and_closes_env() {
        let mut env = WalkerEnv::new(WalkerConfig::default(), RenderMode::OffscreenBuffer).unwrap();
        let interrupt = AtomicBool::new(false);
        let summary = replay(&mut env, &Policy::new_random(), &interrupt, Some(25));
        assert_eq!(summary.stop, ReplayStop::StepLimit);
        assert_eq!(summary.steps, 25);
        assert!(!env.render_closed());
    }

    #[test]
    fn finished_episodes_are_reset_and_counted() {
        let mut config = WalkerConfig::default();
        config.episode.max_episode_steps = 10;
        let mut env = WalkerEnv::new(config, RenderMode::None).unwrap();
        let interrupt = AtomicBool::new(false);
        let summary = replay(&mut env, &Policy::new_random(), &interrupt, Some(35));
        // Early termination can only add episodes.
        assert!(summary.episodes >= 4, "episodes {}", summary.episodes);
        assert!(env.steps() <= 10);
    }
}
