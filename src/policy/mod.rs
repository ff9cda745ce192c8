//! Linear stochastic policies
//!
//! A policy is a family of action distributions parameterised by a matrix
//! θ of shape `[A, S + 1]`. The last column multiplies the constant bias
//! feature appended to every observation (see
//! [`include_bias`](crate::utils::include_bias)).
//!
//! Policies are stateless: θ is owned by the trainer and passed into every
//! call, so the same policy value can serve rollouts, gradient estimation
//! and the Fisher-matrix build.

use std::fmt::Debug;

use rand::Rng;

use crate::{
    env::SpaceInfo,
    error::PgError,
    utils::Matrix,
};

pub mod categorical;
pub mod gaussian;
pub mod gradient_check;
pub mod weights;

pub use categorical::CategoricalSoftmax;
pub use gaussian::GaussianLinear;
pub use gradient_check::{check_policy_gradient, gradient_check};
pub use weights::PolicyWeights;

/// Dimensions of a linear policy bound to an environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyDims {
    /// Observation dimensionality `S`
    pub obs_dim: usize,
    /// Action dimensionality `A` (vector length or number of choices)
    pub action_dim: usize,
}

impl PolicyDims {
    /// Shape of θ: `(A, S + 1)`
    pub fn theta_shape(&self) -> (usize, usize) {
        (self.action_dim, self.obs_dim + 1)
    }

    /// Number of entries in θ
    pub fn num_params(&self) -> usize {
        self.action_dim * (self.obs_dim + 1)
    }
}

/// Capability set shared by the policy families
pub trait Policy {
    /// Action produced by [`Policy::sample_action`]
    type Action: Clone + Debug + Send + Sync;

    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Check that this family can act in the given spaces and return the
    /// resulting parameter dimensions
    fn check_spaces(
        &self,
        observation_space: &SpaceInfo,
        action_space: &SpaceInfo,
    ) -> Result<PolicyDims, PgError>;

    /// `log π_θ(action | ob)`
    fn log_prob(&self, theta: &Matrix, ob: &[f64], action: &Self::Action) -> Result<f64, PgError>;

    /// `∇_θ log π_θ(action | ob)`, shaped like θ
    fn grad_log_prob(
        &self,
        theta: &Matrix,
        ob: &[f64],
        action: &Self::Action,
    ) -> Result<Matrix, PgError>;

    /// Draw an action from `π_θ(· | ob)`
    fn sample_action<R: Rng + ?Sized>(
        &self,
        theta: &Matrix,
        ob: &[f64],
        rng: &mut R,
    ) -> Result<Self::Action, PgError>;

    /// Entropy of `π_θ(· | ob)` when it is reported
    fn entropy(&self, _theta: &Matrix, _ob: &[f64]) -> Result<Option<f64>, PgError> {
        Ok(None)
    }
}

/// Observation length must match θ's non-bias columns
pub(crate) fn check_observation(theta: &Matrix, ob: &[f64]) -> Result<(), PgError> {
    if ob.len() + 1 != theta.cols() {
        return Err(PgError::mismatch(
            format!("observation of length {}", theta.cols().saturating_sub(1)),
            format!("length {}", ob.len()),
        ));
    }
    Ok(())
}
