//! Categorical-softmax policy for discrete actions
//!
//! ```text
//! logits = [ob; 1] · θᵀ
//! π(a | ob) = softmax(logits)[a]
//! ∇_θ log π(a | ob) = (onehot(a) - softmax(logits)) ⊗ [ob; 1]
//! ```

use rand::Rng;

use super::{check_observation, Policy, PolicyDims};
use crate::{
    env::{SpaceInfo, SpaceType},
    error::PgError,
    utils::{entropy, include_bias, log_softmax, softmax, weighted_sample, Matrix},
};

/// Linear logits over a fixed set of actions
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoricalSoftmax;

impl CategoricalSoftmax {
    /// Unnormalised action scores for one observation
    pub fn logits(&self, theta: &Matrix, ob: &[f64]) -> Result<Vec<f64>, PgError> {
        check_observation(theta, ob)?;
        theta.mat_vec(&include_bias(ob))
    }

    fn check_action(theta: &Matrix, action: usize) -> Result<(), PgError> {
        if action >= theta.rows() {
            return Err(PgError::mismatch(
                format!("action in [0, {})", theta.rows()),
                action,
            ));
        }
        Ok(())
    }
}

impl Policy for CategoricalSoftmax {
    type Action = usize;

    fn name(&self) -> &'static str {
        "categorical-softmax"
    }

    fn check_spaces(
        &self,
        observation_space: &SpaceInfo,
        action_space: &SpaceInfo,
    ) -> Result<PolicyDims, PgError> {
        match (observation_space.dtype, action_space.dtype) {
            (SpaceType::Continuous, SpaceType::Discrete(n)) if n > 0 => {
                Ok(PolicyDims { obs_dim: observation_space.flat_dim(), action_dim: n })
            }
            (obs, act) => Err(PgError::UnsupportedEnvironment(format!(
                "categorical-softmax policy needs continuous observations and discrete actions, got {obs:?} / {act:?}"
            ))),
        }
    }

    fn log_prob(&self, theta: &Matrix, ob: &[f64], action: &usize) -> Result<f64, PgError> {
        Self::check_action(theta, *action)?;
        Ok(log_softmax(&self.logits(theta, ob)?)[*action])
    }

    fn grad_log_prob(&self, theta: &Matrix, ob: &[f64], action: &usize) -> Result<Matrix, PgError> {
        Self::check_action(theta, *action)?;
        let mut coeffs = softmax(&self.logits(theta, ob)?);
        for p in &mut coeffs {
            *p = -*p;
        }
        coeffs[*action] += 1.0;
        Ok(Matrix::outer(&coeffs, &include_bias(ob)))
    }

    fn sample_action<R: Rng + ?Sized>(
        &self,
        theta: &Matrix,
        ob: &[f64],
        rng: &mut R,
    ) -> Result<usize, PgError> {
        Ok(weighted_sample(&self.logits(theta, ob)?, rng))
    }

    fn entropy(&self, theta: &Matrix, ob: &[f64]) -> Result<Option<f64>, PgError> {
        Ok(Some(entropy(&self.logits(theta, ob)?)))
    }
}
