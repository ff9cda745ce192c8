//! Per-iteration training statistics
//!
//! These are a progress signal only; nothing here feeds back into the
//! update.

use serde::{Deserialize, Serialize};

/// Statistics reported after one iteration's update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IterationStats {
    /// Zero-based iteration index
    pub iteration: usize,

    /// Episodes in the batch
    pub num_episodes: usize,

    /// Timesteps in the batch
    pub num_timesteps: usize,

    /// Mean undiscounted episode return
    pub average_return: f64,

    /// Mean policy entropy over the batch observations (discrete policies)
    pub entropy: Option<f64>,

    /// `exp(entropy)`
    pub perplexity: Option<f64>,

    /// Multiplier applied to the update direction
    pub step_size: f64,

    /// ‖θ‖₂ after the update
    pub theta_norm: f64,
}

impl IterationStats {
    /// One-line summary for logs
    pub fn summary(&self) -> String {
        match (self.entropy, self.perplexity) {
            (Some(ent), Some(perp)) => format!(
                "Iteration: {} AverageReturn: {:.2} Entropy: {:.2} Perplexity: {:.2} |theta|_2: {:.2}",
                self.iteration, self.average_return, ent, perp, self.theta_norm
            ),
            _ => format!(
                "Iteration: {} AverageReturn: {:.2} |theta|_2: {:.2}",
                self.iteration, self.average_return, self.theta_norm
            ),
        }
    }
}

/// Summary of a whole training run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Iterations completed
    pub iterations: usize,

    /// Total environment timesteps consumed
    pub total_timesteps: usize,

    /// Total episodes collected
    pub total_episodes: usize,

    /// Best average return seen in any iteration
    pub best_average_return: f64,

    /// Average return of the last iteration
    pub final_average_return: f64,

    /// ‖θ‖₂ at the end of training
    pub final_theta_norm: f64,
}

impl TrainingSummary {
    /// Aggregate a run's iteration statistics
    pub fn from_history(history: &[IterationStats]) -> Self {
        let mut summary = Self {
            iterations: history.len(),
            best_average_return: f64::NEG_INFINITY,
            ..Self::default()
        };
        for stats in history {
            summary.total_timesteps += stats.num_timesteps;
            summary.total_episodes += stats.num_episodes;
            summary.best_average_return = summary.best_average_return.max(stats.average_return);
        }
        if let Some(last) = history.last() {
            summary.final_average_return = last.average_return;
            summary.final_theta_norm = last.theta_norm;
        } else {
            summary.best_average_return = 0.0;
        }
        summary
    }
}
