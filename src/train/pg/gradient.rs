//! Score-function gradient estimation
//!
//! ```text
//! g = Σ_episodes Σ_t ∇_θ log π_θ(a_t | s_t) · (R_t - b_t)
//! ĝ = g / (‖g‖ + 1e-8)
//! ```
//!
//! Normalising the summed gradient makes its scale independent of batch
//! size and reward magnitude, so the learning rate is a step length in
//! parameter space.

use crate::{buffer::Batch, error::PgError, policy::Policy, utils::Matrix};

/// Added to the norm before dividing
pub const NORM_EPS: f64 = 1e-8;

/// One step's contribution `∇_θ log π_θ(a | ob) · advantage`
pub fn step_contribution<P: Policy>(
    theta: &Matrix,
    policy: &P,
    ob: &[f64],
    action: &P::Action,
    advantage: f64,
) -> Result<Matrix, PgError> {
    let mut grad = policy.grad_log_prob(theta, ob, action)?;
    grad.scale(advantage);
    Ok(grad)
}

/// Sum advantage-weighted score functions over every step of the batch
///
/// `returns[i][t]` is the discounted return of trajectory `i` at step `t`;
/// `baselines[t]` is subtracted from it (missing indices count as 0).
/// Steps are visited from the end of each episode backwards.
pub fn policy_gradient<P: Policy>(
    theta: &Matrix,
    policy: &P,
    batch: &Batch<P::Action>,
    returns: &[Vec<f64>],
    baselines: &[f64],
) -> Result<Matrix, PgError> {
    if returns.len() != batch.num_episodes() {
        return Err(PgError::mismatch(
            format!("{} return sequences", batch.num_episodes()),
            returns.len(),
        ));
    }

    let mut grad = Matrix::zeros(theta.rows(), theta.cols());
    for (trajectory, episode_returns) in batch.trajectories.iter().zip(returns) {
        if episode_returns.len() != trajectory.len() {
            return Err(PgError::mismatch(trajectory.len(), episode_returns.len()));
        }
        for t in (0..trajectory.len()).rev() {
            let advantage = episode_returns[t] - baselines.get(t).copied().unwrap_or(0.0);
            let contribution = step_contribution(
                theta,
                policy,
                &trajectory.observations[t],
                &trajectory.actions[t],
                advantage,
            )?;
            grad.add_scaled(&contribution, 1.0)?;
        }
    }
    Ok(grad)
}

/// Rescale to (approximately) unit Frobenius norm
pub fn normalize_gradient(grad: &Matrix) -> Matrix {
    grad.scaled(1.0 / (grad.norm() + NORM_EPS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        buffer::Trajectory,
        policy::{CategoricalSoftmax, GaussianLinear},
        train::pg::returns::discounted_returns,
    };

    fn point_trajectory() -> Trajectory<Vec<f64>> {
        let mut traj = Trajectory::new();
        traj.push(vec![0.5, -0.5], vec![0.1, 0.2], -1.0);
        traj.push(vec![0.4, -0.3], vec![-0.3, 0.0], -0.5);
        traj.push(vec![0.2, -0.1], vec![0.0, 0.4], -0.2);
        traj
    }

    #[test]
    fn test_zero_baseline_matches_manual_sum() {
        let theta = Matrix::from_fn(2, 3, |i, j| 0.1 * i as f64 - 0.2 * j as f64);
        let traj = point_trajectory();
        let returns = discounted_returns(&traj.rewards, 0.9);

        let mut expected = Matrix::zeros(2, 3);
        for (t, (ob, action)) in traj.steps().enumerate() {
            let g = GaussianLinear.grad_log_prob(&theta, ob, action).unwrap();
            expected.add_scaled(&g, returns[t]).unwrap();
        }

        let batch = Batch::new(vec![traj]);
        let grad = policy_gradient(&theta, &GaussianLinear, &batch, &[returns], &[]).unwrap();
        for (a, b) in grad.as_slice().iter().zip(expected.as_slice()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_baseline_equal_to_returns_cancels_gradient() {
        let theta = Matrix::zeros(2, 3);
        let traj = point_trajectory();
        let returns = discounted_returns(&traj.rewards, 0.99);
        let baselines = returns.clone();

        let batch = Batch::new(vec![traj]);
        let grad =
            policy_gradient(&theta, &GaussianLinear, &batch, &[returns], &baselines).unwrap();
        assert!(grad.norm() < 1e-12);
    }

    #[test]
    fn test_positive_advantage_raises_action_probability() {
        let theta = Matrix::zeros(2, 2);
        let mut traj = Trajectory::new();
        traj.push(vec![1.0], 1usize, 1.0);
        let batch = Batch::new(vec![traj]);

        let grad =
            policy_gradient(&theta, &CategoricalSoftmax, &batch, &[vec![1.0]], &[0.0]).unwrap();
        let mut updated = theta.clone();
        updated.add_scaled(&normalize_gradient(&grad), 0.5).unwrap();

        let before = CategoricalSoftmax.log_prob(&theta, &[1.0], &1).unwrap();
        let after = CategoricalSoftmax.log_prob(&updated, &[1.0], &1).unwrap();
        assert!(after > before);
    }

    #[test]
    fn test_normalized_gradient_has_unit_norm() {
        let grad = Matrix::from_vec(2, 2, vec![30.0, -40.0, 0.0, 0.0]).unwrap();
        assert!((normalize_gradient(&grad).norm() - 1.0).abs() < 1e-9);

        let zero = normalize_gradient(&Matrix::zeros(2, 2));
        assert!(zero.is_finite());
        assert_eq!(zero.norm(), 0.0);
    }

    #[test]
    fn test_mismatched_returns_rejected() {
        let batch = Batch::new(vec![point_trajectory()]);
        let theta = Matrix::zeros(2, 3);
        assert!(policy_gradient(&theta, &GaussianLinear, &batch, &[], &[]).is_err());
        assert!(policy_gradient(&theta, &GaussianLinear, &batch, &[vec![1.0]], &[]).is_err());
    }
}
