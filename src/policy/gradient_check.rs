//! Finite-difference check of the analytic score function
//!
//! Training trusts `grad_log_prob` blindly, and a wrong derivation does not
//! crash: it silently degrades learning. The trainer therefore compares the
//! analytic gradient against central differences once, before touching the
//! environment.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{Policy, PolicyDims};
use crate::{error::PgError, utils::Matrix};

/// Perturbation applied to each parameter
pub const GRAD_CHECK_EPS: f64 = 1e-6;

/// Allowed absolute error, scaled up for large gradient entries
pub const GRAD_CHECK_TOL: f64 = 1e-5;

/// Compare `g(x)` against the central-difference gradient of `f` at `x`
///
/// Entry `i` passes when `|numeric - analytic| <= tol * max(1, |analytic|)`.
pub fn gradient_check<F, G>(f: F, g: G, x: &[f64]) -> Result<(), PgError>
where
    F: Fn(&[f64]) -> Result<f64, PgError>,
    G: Fn(&[f64]) -> Result<Vec<f64>, PgError>,
{
    let analytic = g(x)?;
    if analytic.len() != x.len() {
        return Err(PgError::mismatch(x.len(), analytic.len()));
    }

    let mut probe = x.to_vec();
    for (i, &analytic_i) in analytic.iter().enumerate() {
        probe[i] = x[i] + GRAD_CHECK_EPS;
        let f_plus = f(&probe)?;
        probe[i] = x[i] - GRAD_CHECK_EPS;
        let f_minus = f(&probe)?;
        probe[i] = x[i];

        let numeric = (f_plus - f_minus) / (2.0 * GRAD_CHECK_EPS);
        let error = (numeric - analytic_i).abs();
        if error.is_nan() || error > GRAD_CHECK_TOL * analytic_i.abs().max(1.0) {
            return Err(PgError::GradientCheckFailed { index: i, numeric, analytic: analytic_i });
        }
    }
    Ok(())
}

/// Check `policy.grad_log_prob` at a random point of the given dimensions
///
/// θ and the observation are drawn uniformly from `[0, 1)` with a dedicated
/// RNG seeded by `seed`; the action is sampled from the policy itself.
pub fn check_policy_gradient<P: Policy>(
    policy: &P,
    dims: PolicyDims,
    seed: u64,
) -> Result<(), PgError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let (rows, cols) = dims.theta_shape();
    let theta = Matrix::from_fn(rows, cols, |_, _| rng.gen());
    let ob: Vec<f64> = (0..dims.obs_dim).map(|_| rng.gen()).collect();
    let action = policy.sample_action(&theta, &ob, &mut rng)?;

    let grad = policy.grad_log_prob(&theta, &ob, &action)?;
    if grad.shape() != theta.shape() {
        return Err(PgError::mismatch(
            format!("{:?}", theta.shape()),
            format!("{:?}", grad.shape()),
        ));
    }

    gradient_check(
        |x| policy.log_prob(&Matrix::from_vec(rows, cols, x.to_vec())?, &ob, &action),
        |x| {
            policy
                .grad_log_prob(&Matrix::from_vec(rows, cols, x.to_vec())?, &ob, &action)
                .map(Matrix::into_vec)
        },
        theta.as_slice(),
    )
}
