//! Policy-gradient configuration and hyperparameters
//!
//! This module defines the configuration parameters for training and
//! provides validation, builder methods and JSON persistence.

use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::natural::DEFAULT_FISHER_REG;
use crate::error::PgError;

/// Policy-gradient configuration parameters
///
/// Defaults reproduce the classic linear-policy setup: 2000 timesteps per
/// batch, normalised vanilla gradient steps of length 0.1, per-timestep
/// baseline on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PgConfig {
    /// Minimum number of timesteps collected per iteration
    pub batch_size: usize,

    /// Discount factor (gamma)
    pub discount: f64,

    /// Step length of the vanilla update `θ += lr · ĝ`
    pub learning_rate: f64,

    /// Number of training iterations
    pub n_itrs: usize,

    /// Render the first episode of every batch
    pub render: bool,

    /// Subtract the per-timestep mean return
    pub use_baseline: bool,

    /// Use the natural-gradient update instead of the vanilla one
    pub natural: bool,

    /// Target KL for the natural-gradient trust region
    pub natural_step_size: f64,

    /// Regularisation added to the Fisher diagonal
    pub fisher_reg: f64,

    /// Seed of the training RNG stream
    pub seed: u64,

    /// Standard deviation of the initial θ entries
    pub init_std: f64,

    /// Number of rollout workers
    pub num_workers: usize,
}

impl Default for PgConfig {
    fn default() -> Self {
        Self {
            batch_size: 2000,
            discount: 0.99,
            learning_rate: 0.1,
            n_itrs: 100,
            render: false,
            use_baseline: true,
            natural: false,
            natural_step_size: 0.01,
            fisher_reg: DEFAULT_FISHER_REG,
            seed: 42,
            init_std: 0.1,
            num_workers: 1,
        }
    }
}

impl PgConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), PgError> {
        let invalid = |msg: &str| Err(PgError::InvalidConfig(msg.to_string()));

        if self.batch_size == 0 {
            return invalid("batch_size must be positive");
        }
        if self.n_itrs == 0 {
            return invalid("n_itrs must be positive");
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return invalid("discount must be in [0, 1]");
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return invalid("learning_rate must be positive");
        }
        if !(self.natural_step_size > 0.0 && self.natural_step_size.is_finite()) {
            return invalid("natural_step_size must be positive");
        }
        if !(self.fisher_reg >= 0.0 && self.fisher_reg.is_finite()) {
            return invalid("fisher_reg must be non-negative");
        }
        if !(self.init_std >= 0.0 && self.init_std.is_finite()) {
            return invalid("init_std must be non-negative");
        }
        if self.num_workers == 0 {
            return invalid("num_workers must be positive");
        }
        Ok(())
    }

    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Set batch size
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set discount factor
    pub fn discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    /// Set learning rate
    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set number of iterations
    pub fn n_itrs(mut self, n_itrs: usize) -> Self {
        self.n_itrs = n_itrs;
        self
    }

    /// Enable or disable rendering
    pub fn render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }

    /// Enable or disable the baseline
    pub fn use_baseline(mut self, use_baseline: bool) -> Self {
        self.use_baseline = use_baseline;
        self
    }

    /// Enable or disable natural-gradient updates
    pub fn natural(mut self, natural: bool) -> Self {
        self.natural = natural;
        self
    }

    /// Set natural-gradient target step size
    pub fn natural_step_size(mut self, step: f64) -> Self {
        self.natural_step_size = step;
        self
    }

    /// Set Fisher regularisation
    pub fn fisher_reg(mut self, reg: f64) -> Self {
        self.fisher_reg = reg;
        self
    }

    /// Set RNG seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set initial parameter scale
    pub fn init_std(mut self, std: f64) -> Self {
        self.init_std = std;
        self
    }

    /// Set number of rollout workers
    pub fn num_workers(mut self, workers: usize) -> Self {
        self.num_workers = workers;
        self
    }
}
