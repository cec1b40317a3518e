//! Neuroevolution trainer: parallel rollouts, elitist selection, mutation.

use std::path::PathBuf;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::checkpoint::{Checkpoint, CheckpointDir, DEFAULT_MODELS_DIR};
use crate::config::WalkerConfig;
use crate::env::WalkerEnv;
use crate::error::{ConfigError, Result};
use crate::policy::{seed_initializer, Policy};
use crate::render::RenderMode;

const DEFAULT_POPULATION: usize = 16;
const DEFAULT_TOP_K: usize = 4;
const DEFAULT_ROLLOUT_STEPS: u32 = 250;
pub const DEFAULT_TIMESTEPS_PER_CHECKPOINT: u64 = 10_000;
pub const DEFAULT_CHECKPOINTS: u32 = 10;
const MUTATION_RATE: f32 = 0.2;
const MUTATION_STRENGTH: f32 = 0.2;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub population: usize,
    pub top_k: usize,
    /// Upper bound on steps per rollout; episodes also end on termination or truncation.
    pub rollout_steps: u32,
    pub timesteps_per_checkpoint: u64,
    pub checkpoints: u32,
    pub mutation_rate: f32,
    pub mutation_strength: f32,
    pub seed: u64,
    pub models_dir: PathBuf,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            population: DEFAULT_POPULATION,
            top_k: DEFAULT_TOP_K,
            rollout_steps: DEFAULT_ROLLOUT_STEPS,
            timesteps_per_checkpoint: DEFAULT_TIMESTEPS_PER_CHECKPOINT,
            checkpoints: DEFAULT_CHECKPOINTS,
            mutation_rate: MUTATION_RATE,
            mutation_strength: MUTATION_STRENGTH,
            seed: 0,
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, message: &str| {
            Err(ConfigError::InvalidValue {
                field,
                message: message.to_string(),
            })
        };
        if self.population == 0 {
            return invalid("population", "must be > 0");
        }
        if self.top_k == 0 || self.top_k > self.population {
            return invalid("top_k", "must be in 1..=population");
        }
        if self.rollout_steps == 0 {
            return invalid("rollout_steps", "must be > 0");
        }
        if self.timesteps_per_checkpoint == 0 {
            return invalid("timesteps_per_checkpoint", "must be > 0");
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return invalid("mutation_rate", "must be in [0, 1]");
        }
        if !self.mutation_strength.is_finite() || self.mutation_strength < 0.0 {
            return invalid("mutation_strength", "must be finite and >= 0");
        }
        Ok(())
    }
}

/// Result of running one policy for one episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rollout {
    pub total_reward: f32,
    pub steps: u32,
    pub distance: f32,
}

/// Runs `policy` headless from reset until the episode ends or `max_steps` is reached.
/// `env_config` must already be validated.
pub fn evaluate(policy: &Policy, env_config: &WalkerConfig, max_steps: u32) -> Rollout {
    let mut env = WalkerEnv::from_valid_config(env_config.clone(), RenderMode::None);
    let (mut observation, _) = env.reset(None, None);
    let mut total_reward = 0.0;
    let mut steps = 0;
    while steps < max_steps {
        let result = env.step(policy.act(&observation));
        total_reward += result.reward;
        steps += 1;
        observation = result.observation;
        if result.done() {
            break;
        }
    }
    Rollout {
        total_reward,
        steps,
        distance: env.distance(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationStats {
    pub generation: u32,
    pub best_reward: f32,
    pub mean_reward: f32,
    pub best_distance: f32,
    pub steps: u64,
    pub cumulative_timesteps: u64,
    pub steps_per_sec: f64,
}

pub struct Trainer {
    config: TrainConfig,
    env_config: WalkerConfig,
    checkpoints: CheckpointDir,
    rng: StdRng,
    population: Vec<Policy>,
    champion: Option<Policy>,
    generation: u32,
    timesteps: u64,
}

impl Trainer {
    pub fn new(config: TrainConfig, env_config: WalkerConfig) -> Result<Self> {
        config.validate()?;
        env_config.validate()?;
        seed_initializer(config.seed);
        let population = (0..config.population).map(|_| Policy::new_random()).collect();
        Ok(Self {
            checkpoints: CheckpointDir::new(config.models_dir.clone()),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            env_config,
            population,
            champion: None,
            generation: 0,
            timesteps: 0,
        })
    }

    /// Continues from a saved policy: the population becomes the policy plus
    /// mutated copies of it, and the timestep count picks up where it left off.
    pub fn resume_from(&mut self, checkpoint: &Checkpoint) -> Result<()> {
        let seed = Policy::load(&checkpoint.path)?;
        let mut population = Vec::with_capacity(self.config.population);
        while population.len() + 1 < self.config.population {
            population.push(seed.mutated(
                self.config.mutation_rate,
                self.config.mutation_strength,
                &mut self.rng,
            ));
        }
        population.insert(0, seed);
        self.population = population;
        self.timesteps = checkpoint.timesteps;
        info!(
            checkpoint = %checkpoint.path.display(),
            timesteps = self.timesteps,
            "resuming training"
        );
        Ok(())
    }

    pub fn timesteps(&self) -> u64 {
        self.timesteps
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn population(&self) -> &[Policy] {
        &self.population
    }

    /// Best policy of the most recent generation.
    pub fn champion(&self) -> Option<&Policy> {
        self.champion.as_ref()
    }

    pub fn run_generation(&mut self) -> GenerationStats {
        let started = Instant::now();
        let env_config = &self.env_config;
        let max_steps = self.config.rollout_steps;

        let population = std::mem::take(&mut self.population);
        let mut scored: Vec<(Rollout, Policy)> = population
            .into_par_iter()
            .map(|policy| (evaluate(&policy, env_config, max_steps), policy))
            .collect();
        scored.sort_by(|a, b| b.0.total_reward.total_cmp(&a.0.total_reward));

        let steps: u64 = scored.iter().map(|(r, _)| u64::from(r.steps)).sum();
        let mean_reward =
            scored.iter().map(|(r, _)| r.total_reward).sum::<f32>() / scored.len() as f32;
        let (best_reward, best_distance) = scored
            .first()
            .map(|(r, _)| (r.total_reward, r.distance))
            .unwrap_or((f32::NEG_INFINITY, 0.0));

        self.timesteps += steps;
        self.generation += 1;
        let steps_per_sec = steps as f64 / started.elapsed().as_secs_f64().max(1e-9);

        let survivors: Vec<Policy> = scored
            .into_iter()
            .take(self.config.top_k)
            .map(|(_, policy)| policy)
            .collect();
        self.champion = survivors.first().cloned();
        self.population = self.next_population(survivors);

        let stats = GenerationStats {
            generation: self.generation,
            best_reward,
            mean_reward,
            best_distance,
            steps,
            cumulative_timesteps: self.timesteps,
            steps_per_sec,
        };
        info!(
            generation = stats.generation,
            best_reward = stats.best_reward,
            mean_reward = stats.mean_reward,
            best_distance = stats.best_distance,
            cumulative_timesteps = stats.cumulative_timesteps,
            steps_per_sec = stats.steps_per_sec.round(),
            "generation complete"
        );
        stats
    }

    /// Elitism: survivors are kept unchanged at the front, each gets one mutated
    /// child, and the rest is filled with mutated copies of random survivors.
    fn next_population(&mut self, survivors: Vec<Policy>) -> Vec<Policy> {
        let (rate, strength) = (self.config.mutation_rate, self.config.mutation_strength);
        let survivor_count = survivors.len();
        let mut next = survivors;
        next.reserve(self.config.population.saturating_sub(survivor_count));
        for i in 0..survivor_count {
            if next.len() >= self.config.population {
                break;
            }
            let child = next[i].mutated(rate, strength, &mut self.rng);
            next.push(child);
        }
        while next.len() < self.config.population {
            let parent = self.rng.gen_range(0..survivor_count);
            let child = next[parent].mutated(rate, strength, &mut self.rng);
            next.push(child);
        }
        next
    }

    /// Trains for `checkpoints` chunks of `timesteps_per_checkpoint` steps, saving
    /// the generation champion as `<timesteps>.bin` each time a chunk boundary is crossed.
    pub fn run(&mut self) -> Result<Vec<Checkpoint>> {
        let chunk = self.config.timesteps_per_checkpoint;
        let mut boundary = (self.timesteps / chunk + 1) * chunk;
        let last = boundary + chunk * u64::from(self.config.checkpoints.saturating_sub(1));
        let mut saved = Vec::new();

        info!(
            population = self.config.population,
            top_k = self.config.top_k,
            target_timesteps = last,
            models_dir = %self.checkpoints.root().display(),
            "starting training"
        );

        while self.config.checkpoints > 0 && boundary <= last {
            self.run_generation();
            while self.timesteps >= boundary && boundary <= last {
                saved.push(self.save_champion(boundary)?);
                boundary += chunk;
            }
        }
        Ok(saved)
    }

    fn save_champion(&self, timesteps: u64) -> Result<Checkpoint> {
        let path = self.checkpoints.path_for(timesteps);
        if let Some(champion) = &self.champion {
            champion.save(&path)?;
        } else if let Some(first) = self.population.first() {
            first.save(&path)?;
        }
        info!(timesteps, path = %path.display(), "checkpoint saved");
        debug!(generation = self.generation, "checkpoint generation");
        Ok(Checkpoint { timesteps, path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(models_dir: PathBuf) -> TrainConfig {
        TrainConfig {
            population: 4,
            top_k: 2,
            rollout_steps: 20,
            timesteps_per_checkpoint: 50,
            checkpoints: 2,
            models_dir,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn validate_rejects_bad_selection_sizes() {
        let mut config = TrainConfig::default();
        config.top_k = config.population + 1;
        assert!(config.validate().is_err());
        config.top_k = 0;
        assert!(config.validate().is_err());
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_unusable_mutation_strength() {
        for strength in [-0.1, f32::NAN, f32::INFINITY] {
            let config = TrainConfig {
                mutation_strength: strength,
                ..TrainConfig::default()
            };
            assert!(
                matches!(
                    config.validate(),
                    Err(ConfigError::InvalidValue { field: "mutation_strength", .. })
                ),
                "strength {strength} accepted"
            );
        }
        let frozen = TrainConfig {
            mutation_strength: 0.0,
            ..TrainConfig::default()
        };
        assert!(frozen.validate().is_ok());
    }

    #[test]
    fn evaluate_counts_steps_and_stops_at_limit() {
        let policy = Policy::new_random();
        let rollout = evaluate(&policy, &WalkerConfig::default(), 15);
        assert!(rollout.steps >= 1 && rollout.steps <= 15);
        assert!(rollout.total_reward.is_finite());
    }

    #[test]
    fn generation_keeps_population_size_and_counts_timesteps() {
        let tmp = tempfile::tempdir().unwrap();
        let mut trainer = Trainer::new(small_config(tmp.path().into()), WalkerConfig::default()).unwrap();
        let stats = trainer.run_generation();
        assert_eq!(trainer.population().len(), 4);
        assert_eq!(stats.generation, 1);
        assert_eq!(trainer.generation(), 1);
        assert!(stats.steps >= 4 && stats.steps <= 80);
        assert_eq!(trainer.timesteps(), stats.steps);
        assert!(trainer.champion().is_some());
        assert!(stats.best_reward >= stats.mean_reward);
    }

    #[test]
    fn run_writes_timestep_named_checkpoints() {
        let tmp = tempfile::tempdir().unwrap();
        let mut trainer = Trainer::new(small_config(tmp.path().into()), WalkerConfig::default()).unwrap();
        let saved = trainer.run().unwrap();
        let steps: Vec<u64> = saved.iter().map(|c| c.timesteps).collect();
        assert_eq!(steps, vec![50, 100]);
        assert!(trainer.timesteps() >= 100);

        let listed = CheckpointDir::new(tmp.path()).list().unwrap();
        assert_eq!(listed, saved);
        assert!(Policy::load(&listed[1].path).is_ok());
    }

    #[test]
    fn resume_continues_from_checkpoint_timesteps() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = CheckpointDir::new(tmp.path());
        let path = dir.path_for(50);
        Policy::new_random().save(&path).unwrap();

        let mut config = small_config(tmp.path().into());
        config.checkpoints = 1;
        let mut trainer = Trainer::new(config, WalkerConfig::default()).unwrap();
        trainer
            .resume_from(&Checkpoint { timesteps: 50, path })
            .unwrap();
        assert_eq!(trainer.population().len(), 4);
        let saved = trainer.run().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].timesteps, 100);
    }
}
