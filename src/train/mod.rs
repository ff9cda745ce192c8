//! Training algorithms
//!
//! This module implements the policy-gradient trainer and its update rules.

pub mod pg;

pub use pg::{
    IterationStats, PgConfig, PgTrainer, PolicyUpdate, TrainerState, TrainingSummary,
    fisher_matrix, natural_gradient, normalize_gradient, policy_gradient, policy_update,
};
