//! Environment traits and implementations
//!
//! This module defines the episodic environment interface consumed by the
//! rollout collector and provides the two built-in environments.

use anyhow::Result;

use crate::error::PgError;

/// Core trait for episodic RL environments
///
/// Observations are real vectors of length `S`. The action type depends on
/// the policy family driving the environment: a real vector for continuous
/// control, an index for discrete control.
pub trait Environment {
    /// Action type accepted by [`Environment::step`]
    type Action;

    /// Reset the environment and return the initial observation
    fn reset(&mut self) -> Result<Vec<f64>>;

    /// Step the environment with an action
    fn step(&mut self, action: &Self::Action) -> Result<StepResult>;

    /// Render the current state
    fn render(&mut self) -> Result<()> {
        Ok(())
    }

    /// Get the observation space dimensions
    fn observation_space(&self) -> SpaceInfo;

    /// Get the action space dimensions
    fn action_space(&self) -> SpaceInfo;

    /// Maximum number of steps in one episode (the horizon)
    fn timestep_limit(&self) -> usize;
}

/// Result of an environment step
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Next observation
    pub observation: Vec<f64>,

    /// Reward received
    pub reward: f64,

    /// Whether the episode terminated
    pub terminated: bool,

    /// Whether the episode was truncated by the timestep limit
    pub truncated: bool,

    /// Additional info
    pub info: StepInfo,
}

impl StepResult {
    /// Whether the episode is over for any reason
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Space information for observations and actions
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceInfo {
    /// Shape of the space
    pub shape: Vec<usize>,

    /// Data type
    pub dtype: SpaceType,
}

impl SpaceInfo {
    /// Continuous box of the given flat dimension
    pub fn continuous(dim: usize) -> Self {
        Self { shape: vec![dim], dtype: SpaceType::Continuous }
    }

    /// Discrete space with `n` choices
    pub fn discrete(n: usize) -> Self {
        Self { shape: vec![], dtype: SpaceType::Discrete(n) }
    }

    /// Flat dimension of a continuous space
    pub fn flat_dim(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Space data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceType {
    /// Discrete space with n options
    Discrete(usize),

    /// Continuous space (Box)
    Continuous,
}

/// Additional step information
#[derive(Debug, Clone, Default)]
pub struct StepInfo {
    /// Distance to the goal, for environments that have one
    pub distance: Option<f64>,
}

/// Registered environment identifiers
pub const ENV_IDS: [&str; 2] = [point::ID, cartpole::ID];

/// Fail fast on identifiers that are not registered
pub fn check_env_id(env_id: &str) -> Result<(), PgError> {
    if ENV_IDS.contains(&env_id) {
        Ok(())
    } else {
        Err(PgError::UnsupportedEnvironment(format!(
            "{env_id}: must be one of {}",
            ENV_IDS.map(|id| format!("'{id}'")).join(", ")
        )))
    }
}

pub mod cartpole;
pub mod point;
pub mod pool;
