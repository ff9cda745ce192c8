//! Vanilla and natural policy gradient
//!
//! This module implements REINFORCE-style training of linear policies with
//! an optional per-timestep baseline and an optional natural-gradient step.
//!
//! # Algorithm Overview
//!
//! ```text
//! For each iteration:
//!   1. Collect at least `batch_size` timesteps with the current θ
//!   2. Compute discounted returns R_t and the per-timestep baseline b_t
//!   3. g = Σ ∇ log π(a_t | s_t) · (R_t - b_t), then ĝ = g / ‖g‖
//!   4. Vanilla:  θ ← θ + lr · ĝ
//!      Natural:  θ ← θ + α · (F + reg·I)⁻¹ ĝ,  α = sqrt(2δ / ĝᵀFĝ)
//! ```
//!
//! # References
//!
//! - [Simple Statistical Gradient-Following Algorithms (Williams, 1992)](https://doi.org/10.1007/BF00992696)
//! - [A Natural Policy Gradient (Kakade, 2001)](https://proceedings.neurips.cc/paper/2001/hash/4b86abe48d358ecf194c56c69108433e-Abstract.html)

pub mod config;
pub mod gradient;
pub mod natural;
pub mod returns;
pub mod stats;
pub mod trainer;

pub use config::PgConfig;
pub use gradient::{normalize_gradient, policy_gradient, step_contribution, NORM_EPS};
pub use natural::{fisher_matrix, natural_gradient, step_size, DEFAULT_FISHER_REG};
pub use returns::{batch_returns, discounted_returns, ReturnTable};
pub use stats::{IterationStats, TrainingSummary};
pub use trainer::{policy_update, PgTrainer, PolicyUpdate, TrainerState, GRAD_CHECK_SEED};
