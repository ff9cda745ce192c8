//! # simplepg
//!
//! Policy-gradient reinforcement learning with linear policies
//!
//! simplepg trains linear Gaussian and linear softmax policies on small
//! control tasks with REINFORCE, a per-timestep baseline and an optional
//! natural-gradient step.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use simplepg::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = PgConfig::new().batch_size(2000).n_itrs(10);
//! let mut trainer = PgTrainer::new(config, GaussianLinear, Point::new(42))?;
//! for stats in trainer.train()? {
//!     println!("{}", stats.summary());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Environment traits and implementations
pub mod env;

/// Linear policy families
pub mod policy;

/// Trajectory storage and rollout collection
pub mod buffer;

/// Training algorithms (vanilla and natural policy gradient)
pub mod train;

/// Error types
pub mod error;

/// Utility functions and helpers
pub mod utils;

/// Prelude module for convenient imports
///
/// This module re-exports commonly used types and traits for convenience.
pub mod prelude {
    pub use crate::{
        buffer::{Batch, Trajectory},
        env::{cartpole::CartPole, point::Point, pool::EnvPool, Environment, SpaceInfo},
        error::PgError,
        policy::{CategoricalSoftmax, GaussianLinear, Policy, PolicyDims, PolicyWeights},
        train::pg::{IterationStats, PgConfig, PgTrainer, TrainerState, TrainingSummary},
        utils::Matrix,
    };
}

/// Current version of simplepg
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
