//! Gaussian-linear policy for continuous actions
//!
//! ```text
//! mean = θ · [ob; 1]
//! a ~ Normal(mean, I)
//! log π(a | ob) = -A/2 · log(2π) - ½‖a - mean‖²
//! ∇_θ log π(a | ob) = (a - mean) ⊗ [ob; 1]
//! ```

use rand::Rng;
use rand_distr::StandardNormal;

use super::{check_observation, Policy, PolicyDims};
use crate::{
    env::{SpaceInfo, SpaceType},
    error::PgError,
    utils::{include_bias, Matrix},
};

/// Linear mean, unit isotropic covariance
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussianLinear;

impl GaussianLinear {
    /// Mean action `θ · [ob; 1]`
    pub fn mean(&self, theta: &Matrix, ob: &[f64]) -> Result<Vec<f64>, PgError> {
        check_observation(theta, ob)?;
        theta.mat_vec(&include_bias(ob))
    }

    fn residual(&self, theta: &Matrix, ob: &[f64], action: &[f64]) -> Result<Vec<f64>, PgError> {
        if action.len() != theta.rows() {
            return Err(PgError::mismatch(
                format!("action of length {}", theta.rows()),
                format!("length {}", action.len()),
            ));
        }
        let mean = self.mean(theta, ob)?;
        Ok(action.iter().zip(&mean).map(|(a, m)| a - m).collect())
    }
}

impl Policy for GaussianLinear {
    type Action = Vec<f64>;

    fn name(&self) -> &'static str {
        "gaussian-linear"
    }

    fn check_spaces(
        &self,
        observation_space: &SpaceInfo,
        action_space: &SpaceInfo,
    ) -> Result<PolicyDims, PgError> {
        match (observation_space.dtype, action_space.dtype) {
            (SpaceType::Continuous, SpaceType::Continuous) => Ok(PolicyDims {
                obs_dim: observation_space.flat_dim(),
                action_dim: action_space.flat_dim(),
            }),
            (obs, act) => Err(PgError::UnsupportedEnvironment(format!(
                "gaussian-linear policy needs continuous observations and actions, got {obs:?} / {act:?}"
            ))),
        }
    }

    fn log_prob(&self, theta: &Matrix, ob: &[f64], action: &Vec<f64>) -> Result<f64, PgError> {
        let zs = self.residual(theta, ob, action)?;
        let action_dim = theta.rows() as f64;
        Ok(-0.5 * (2.0 * std::f64::consts::PI).ln() * action_dim
            - 0.5 * zs.iter().map(|z| z * z).sum::<f64>())
    }

    fn grad_log_prob(
        &self,
        theta: &Matrix,
        ob: &[f64],
        action: &Vec<f64>,
    ) -> Result<Matrix, PgError> {
        let zs = self.residual(theta, ob, action)?;
        Ok(Matrix::outer(&zs, &include_bias(ob)))
    }

    fn sample_action<R: Rng + ?Sized>(
        &self,
        theta: &Matrix,
        ob: &[f64],
        rng: &mut R,
    ) -> Result<Vec<f64>, PgError> {
        let mean = self.mean(theta, ob)?;
        Ok(mean
            .into_iter()
            .map(|m| {
                let noise: f64 = rng.sample(StandardNormal);
                m + noise
            })
            .collect())
    }
}
