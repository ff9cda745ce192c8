//! Policy-gradient trainer
//!
//! The trainer owns θ and drives a small state machine:
//!
//! ```text
//! Initializing ──► Collecting ──► Updating ──► Collecting ... ──► Done
//! ```
//!
//! `Initializing` binds the policy to the environment's spaces and runs the
//! gradient self-check; nothing touches the environment before it passes.
//! Each iteration collects a whole batch before any update is attempted,
//! and the update either replaces θ entirely or leaves it untouched.

use anyhow::{bail, Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

use super::{
    config::PgConfig,
    gradient::{normalize_gradient, policy_gradient},
    natural::{fisher_matrix, natural_gradient, step_size},
    returns::batch_returns,
    stats::{IterationStats, TrainingSummary},
};
use crate::{
    buffer::{collect_batch, Batch},
    env::{pool::EnvPool, Environment},
    error::PgError,
    policy::{check_policy_gradient, Policy, PolicyDims, PolicyWeights},
    utils::Matrix,
};

/// Seed of the RNG used by the gradient self-check
pub const GRAD_CHECK_SEED: u64 = 42;

/// Lifecycle of a [`PgTrainer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerState {
    /// Spaces not yet validated, self-check not yet run
    Initializing,
    /// Ready to collect the next batch
    Collecting,
    /// Batch collected, update in progress
    Updating,
    /// All iterations finished
    Done,
}

/// Result of one parameter update
#[derive(Debug, Clone)]
pub struct PolicyUpdate {
    /// Parameters after the update
    pub theta: Matrix,
    /// Multiplier applied to the update direction
    pub step_size: f64,
    /// Baseline used for each timestep index
    pub baselines: Vec<f64>,
}

/// Compute the updated θ for one batch without modifying the input
///
/// Vanilla mode steps `learning_rate` along the normalised gradient;
/// natural mode steps the trust-region size along the natural gradient.
pub fn policy_update<P: Policy>(
    theta: &Matrix,
    policy: &P,
    batch: &Batch<P::Action>,
    config: &PgConfig,
    horizon: usize,
) -> Result<PolicyUpdate, PgError> {
    let (returns, table) = batch_returns(batch, config.discount, horizon)?;
    let baselines = if config.use_baseline { table.baselines() } else { vec![0.0; horizon] };

    let grad = normalize_gradient(&policy_gradient(theta, policy, batch, &returns, &baselines)?);

    let (direction, step) = if config.natural {
        let fisher = fisher_matrix(theta, policy, batch)?;
        let natural = natural_gradient(&fisher, &grad, config.fisher_reg)?;
        let alpha = step_size(&fisher, &natural, config.natural_step_size)?;
        (natural, alpha)
    } else {
        (grad, config.learning_rate)
    };

    let mut candidate = theta.clone();
    candidate.add_scaled(&direction, step)?;
    if !candidate.is_finite() {
        return Err(PgError::IllConditioned("update produced non-finite parameters".into()));
    }

    Ok(PolicyUpdate { theta: candidate, step_size: step, baselines })
}

/// Trainer for linear policies
pub struct PgTrainer<P, E>
where
    P: Policy,
    E: Environment<Action = P::Action>,
{
    config: PgConfig,
    policy: P,
    envs: EnvPool<E>,
    theta: Matrix,
    initial_theta: Option<Matrix>,
    dims: Option<PolicyDims>,
    horizon: usize,
    rng: ChaCha8Rng,
    state: TrainerState,
    iteration: usize,
    history: Vec<IterationStats>,
}

impl<P, E> PgTrainer<P, E>
where
    P: Policy + Sync,
    E: Environment<Action = P::Action> + Send,
{
    /// Create a single-environment trainer
    pub fn new(config: PgConfig, policy: P, env: E) -> Result<Self> {
        if config.num_workers != 1 {
            return Err(PgError::InvalidConfig(format!(
                "num_workers is {}; use PgTrainer::with_workers for parallel rollouts",
                config.num_workers
            ))
            .into());
        }
        Self::from_pool(config, policy, EnvPool::single(env))
    }

    /// Create a trainer with one environment per rollout worker
    ///
    /// `env_fn` receives the worker index.
    pub fn with_workers<F>(config: PgConfig, policy: P, env_fn: F) -> Result<Self>
    where
        F: Fn(usize) -> E,
    {
        let workers = config.num_workers;
        Self::from_pool(config, policy, EnvPool::new(env_fn, workers))
    }

    fn from_pool(config: PgConfig, policy: P, envs: EnvPool<E>) -> Result<Self> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        Ok(Self {
            config,
            policy,
            envs,
            theta: Matrix::zeros(0, 0),
            initial_theta: None,
            dims: None,
            horizon: 0,
            rng,
            state: TrainerState::Initializing,
            iteration: 0,
            history: Vec::new(),
        })
    }

    /// Start from given parameters instead of a random draw
    pub fn with_theta(mut self, theta: Matrix) -> Self {
        self.initial_theta = Some(theta);
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &PgConfig {
        &self.config
    }

    /// Get reference to the policy
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Current parameters (empty before initialisation)
    pub fn theta(&self) -> &Matrix {
        &self.theta
    }

    /// Current lifecycle state
    pub fn state(&self) -> TrainerState {
        self.state
    }

    /// Iterations completed so far
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Parameter dimensions, once initialised
    pub fn dims(&self) -> Option<PolicyDims> {
        self.dims
    }

    /// Statistics of every completed iteration
    pub fn history(&self) -> &[IterationStats] {
        &self.history
    }

    /// Aggregate of the run so far
    pub fn summary(&self) -> TrainingSummary {
        TrainingSummary::from_history(&self.history)
    }

    /// Snapshot θ for export
    pub fn weights(&self, env_id: &str) -> PolicyWeights {
        PolicyWeights::from_theta(env_id, &self.theta)
    }

    /// Validate spaces, run the gradient self-check and initialise θ
    pub fn initialize(&mut self) -> Result<()> {
        if self.state != TrainerState::Initializing {
            bail!("trainer already initialized (state {:?})", self.state);
        }

        let env = self
            .envs
            .primary()
            .ok_or_else(|| PgError::InvalidConfig("trainer has no environment".into()))?;
        let observation_space = env.observation_space();
        let action_space = env.action_space();
        let horizon = env.timestep_limit();
        let dims = self.policy.check_spaces(&observation_space, &action_space)?;

        check_policy_gradient(&self.policy, dims, GRAD_CHECK_SEED)
            .with_context(|| format!("{} failed its gradient self-check", self.policy.name()))?;

        let (rows, cols) = dims.theta_shape();
        self.theta = match self.initial_theta.take() {
            Some(theta) if theta.shape() == (rows, cols) => theta,
            Some(theta) => {
                return Err(PgError::mismatch(
                    format!("{:?}", (rows, cols)),
                    format!("{:?}", theta.shape()),
                )
                .into())
            }
            None => {
                let std = self.config.init_std;
                let rng = &mut self.rng;
                Matrix::from_fn(rows, cols, |_, _| {
                    let z: f64 = rng.sample(StandardNormal);
                    std * z
                })
            }
        };

        self.dims = Some(dims);
        self.horizon = horizon;
        self.state = TrainerState::Collecting;

        tracing::info!(
            policy = self.policy.name(),
            obs_dim = dims.obs_dim,
            action_dim = dims.action_dim,
            horizon,
            workers = self.envs.num_envs(),
            natural = self.config.natural,
            "trainer initialized"
        );
        Ok(())
    }

    fn collect(&mut self) -> Result<Batch<P::Action>> {
        if self.envs.num_envs() > 1 {
            let seeds: Vec<u64> = (0..self.envs.num_envs()).map(|_| self.rng.gen()).collect();
            let batch_size = self.config.batch_size;
            return self.envs.collect_batch(&self.theta, &self.policy, &seeds, batch_size);
        }

        let env = self
            .envs
            .primary_mut()
            .ok_or_else(|| PgError::InvalidConfig("trainer has no environment".into()))?;
        collect_batch(
            &self.theta,
            &self.policy,
            env,
            &mut self.rng,
            self.config.batch_size,
            self.config.render,
        )
    }

    fn mean_entropy(&self, batch: &Batch<P::Action>) -> Result<Option<f64>, PgError> {
        let mut total = 0.0;
        let mut count = 0usize;
        for (ob, _) in batch.steps() {
            match self.policy.entropy(&self.theta, ob)? {
                Some(ent) => total += ent,
                None => return Ok(None),
            }
            count += 1;
        }
        Ok((count > 0).then(|| total / count as f64))
    }

    /// Run one collect-then-update iteration
    pub fn step(&mut self) -> Result<IterationStats> {
        match self.state {
            TrainerState::Initializing => self.initialize()?,
            TrainerState::Done => bail!("training already finished"),
            TrainerState::Collecting | TrainerState::Updating => {}
        }

        self.state = TrainerState::Collecting;
        let batch = self.collect()?;
        tracing::debug!(
            iteration = self.iteration,
            episodes = batch.num_episodes(),
            timesteps = batch.num_timesteps(),
            "batch collected"
        );

        self.state = TrainerState::Updating;
        let update = policy_update(&self.theta, &self.policy, &batch, &self.config, self.horizon);
        let update = match update {
            Ok(update) => update,
            Err(err) => {
                self.state = TrainerState::Collecting;
                let iteration = self.iteration;
                return Err(err).with_context(|| format!("update failed at iteration {iteration}"));
            }
        };
        self.theta = update.theta;

        let entropy = self.mean_entropy(&batch)?;
        let stats = IterationStats {
            iteration: self.iteration,
            num_episodes: batch.num_episodes(),
            num_timesteps: batch.num_timesteps(),
            average_return: batch.average_return(),
            entropy,
            perplexity: entropy.map(f64::exp),
            step_size: update.step_size,
            theta_norm: self.theta.norm(),
        };
        tracing::info!("{}", stats.summary());

        self.iteration += 1;
        self.history.push(stats.clone());
        self.state = if self.iteration >= self.config.n_itrs {
            TrainerState::Done
        } else {
            TrainerState::Collecting
        };
        Ok(stats)
    }

    /// Train for the configured number of iterations
    pub fn train(&mut self) -> Result<Vec<IterationStats>> {
        self.train_until(|_| false)
    }

    /// Train until done, or until `should_stop` returns `true`
    ///
    /// `should_stop` is called between iterations, never mid-rollout.
    pub fn train_until<F>(&mut self, mut should_stop: F) -> Result<Vec<IterationStats>>
    where
        F: FnMut(&IterationStats) -> bool,
    {
        let mut run = Vec::new();
        while self.state != TrainerState::Done {
            let stats = self.step()?;
            let stop = should_stop(&stats);
            run.push(stats);
            if stop {
                tracing::info!(iteration = self.iteration, "training stopped early");
                break;
            }
        }
        Ok(run)
    }
}
