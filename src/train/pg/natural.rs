//! Natural policy gradient
//!
//! The empirical Fisher matrix is the mean outer product of the raw
//! (unweighted) score vectors over every step of the batch:
//! ```text
//! F = (1/N) Σ_i flat(∇ log π(a_i | s_i)) flat(∇ log π(a_i | s_i))ᵀ
//! ĝ = (F + reg·I)⁻¹ flat(g)
//! α = sqrt(2δ / (ĝᵀ F ĝ))
//! ```
//! With this α the quadratic KL approximation `α²/2 · ĝᵀFĝ` equals the
//! target step size δ.

use crate::{buffer::Batch, error::PgError, policy::Policy, utils::Matrix};

/// Default Tikhonov regularisation added to the Fisher diagonal
pub const DEFAULT_FISHER_REG: f64 = 1e-4;

/// Empirical Fisher information of θ over the batch
///
/// An empty batch yields the zero matrix.
pub fn fisher_matrix<P: Policy>(
    theta: &Matrix,
    policy: &P,
    batch: &Batch<P::Action>,
) -> Result<Matrix, PgError> {
    let d = theta.len();
    let mut fisher = Matrix::zeros(d, d);
    let mut n = 0usize;

    for (ob, action) in batch.steps() {
        let score = policy.grad_log_prob(theta, ob, action)?;
        fisher.add_scaled(&Matrix::outer(score.as_slice(), score.as_slice()), 1.0)?;
        n += 1;
    }

    if n > 0 {
        fisher.scale(1.0 / n as f64);
    }
    Ok(fisher)
}

/// `(F + reg·I)⁻¹ flat(grad)`, reshaped like `grad`
pub fn natural_gradient(fisher: &Matrix, grad: &Matrix, reg: f64) -> Result<Matrix, PgError> {
    let d = grad.len();
    if fisher.shape() != (d, d) {
        return Err(PgError::mismatch(
            format!("({d}, {d})"),
            format!("{:?}", fisher.shape()),
        ));
    }

    let mut regularized = fisher.clone();
    regularized.add_scaled(&Matrix::identity(d), reg)?;
    let inverse = regularized.inverse()?;

    let flat = inverse.mat_vec(grad.as_slice())?;
    Matrix::from_vec(grad.rows(), grad.cols(), flat)
}

/// Trust-region step size `sqrt(2δ / ĝᵀFĝ)`
///
/// Fails with [`PgError::DegenerateFisher`] when the quadratic form is not
/// strictly positive, instead of returning NaN or infinity.
pub fn step_size(
    fisher: &Matrix,
    natural_grad: &Matrix,
    natural_step_size: f64,
) -> Result<f64, PgError> {
    let d = natural_grad.len();
    if fisher.shape() != (d, d) {
        return Err(PgError::mismatch(
            format!("({d}, {d})"),
            format!("{:?}", fisher.shape()),
        ));
    }

    let quadratic_form = fisher.quadratic_form(natural_grad.as_slice())?;
    if !quadratic_form.is_finite() || quadratic_form <= 0.0 {
        return Err(PgError::DegenerateFisher { quadratic_form });
    }

    let alpha = (2.0 * natural_step_size / quadratic_form).sqrt();
    if !alpha.is_finite() {
        return Err(PgError::IllConditioned(format!("step size {alpha} is not finite")));
    }
    Ok(alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        buffer::Trajectory,
        policy::{CategoricalSoftmax, GaussianLinear},
    };

    fn batch() -> Batch<Vec<f64>> {
        let mut traj = Trajectory::new();
        traj.push(vec![0.5, -0.5], vec![0.1, 0.2], -1.0);
        traj.push(vec![0.4, -0.3], vec![-0.3, 0.0], -0.5);
        let mut other = Trajectory::new();
        other.push(vec![-0.9, 0.2], vec![0.7, -0.4], -0.9);
        Batch::new(vec![traj, other])
    }

    #[test]
    fn test_fisher_is_symmetric_psd_mean_of_outer_products() {
        let theta = Matrix::from_fn(2, 3, |i, j| 0.1 * (i as f64 - j as f64));
        let batch = batch();
        let fisher = fisher_matrix(&theta, &GaussianLinear, &batch).unwrap();
        assert_eq!(fisher.shape(), (6, 6));

        for i in 0..6 {
            assert!(fisher.get(i, i) >= 0.0);
            for j in 0..6 {
                assert!((fisher.get(i, j) - fisher.get(j, i)).abs() < 1e-12);
            }
        }

        // Single-entry check against the definition
        let scores: Vec<Matrix> = batch
            .steps()
            .map(|(ob, a)| GaussianLinear.grad_log_prob(&theta, ob, a).unwrap())
            .collect();
        let expected: f64 =
            scores.iter().map(|s| s.as_slice()[1] * s.as_slice()[4]).sum::<f64>() / 3.0;
        assert!((fisher.get(1, 4) - expected).abs() < 1e-12);

        let v = [1.0, -2.0, 0.5, 0.0, 3.0, -1.0];
        assert!(fisher.quadratic_form(&v).unwrap() >= -1e-12);
    }

    #[test]
    fn test_empty_batch_fisher_is_zero() {
        let empty: Batch<usize> = Batch::default();
        let fisher = fisher_matrix(&Matrix::zeros(2, 3), &CategoricalSoftmax, &empty).unwrap();
        assert_eq!(fisher.norm(), 0.0);
    }

    #[test]
    fn test_natural_gradient_on_scaled_identity() {
        let c = 4.0;
        let reg = DEFAULT_FISHER_REG;
        let fisher = Matrix::identity(4).scaled(c);
        let grad = Matrix::from_vec(2, 2, vec![1.0, -2.0, 0.5, 3.0]).unwrap();

        let nat = natural_gradient(&fisher, &grad, reg).unwrap();
        assert_eq!(nat.shape(), (2, 2));
        for (n, g) in nat.as_slice().iter().zip(grad.as_slice()) {
            assert!((n - g / (c + reg)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_trust_region_identity() {
        let c = 2.5;
        let k = 0.01;
        let fisher = Matrix::identity(6).scaled(c);
        let grad = Matrix::from_vec(2, 3, vec![0.3, -0.1, 0.7, 0.2, 0.0, -0.4]).unwrap();

        let nat = natural_gradient(&fisher, &grad, DEFAULT_FISHER_REG).unwrap();
        let alpha = step_size(&fisher, &nat, k).unwrap();
        let norm_sq = nat.norm().powi(2);
        assert!((alpha * alpha * c * norm_sq / 2.0 - k).abs() < 1e-12);
    }

    #[test]
    fn test_rank_deficient_fisher_is_regularized() {
        // One step gives a rank-one Fisher matrix
        let theta = Matrix::zeros(2, 2);
        let mut traj = Trajectory::new();
        traj.push(vec![1.0], 0usize, 1.0);
        let batch = Batch::new(vec![traj]);

        let fisher = fisher_matrix(&theta, &CategoricalSoftmax, &batch).unwrap();
        assert!(fisher.inverse().is_err());

        let grad = CategoricalSoftmax.grad_log_prob(&theta, &[1.0], &0).unwrap();
        let nat = natural_gradient(&fisher, &grad, DEFAULT_FISHER_REG).unwrap();
        assert!(nat.is_finite());
        assert!(step_size(&fisher, &nat, 0.01).unwrap().is_finite());
    }

    #[test]
    fn test_zero_quadratic_form_is_degenerate() {
        let fisher = Matrix::zeros(4, 4);
        let grad = Matrix::from_vec(2, 2, vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        let nat = natural_gradient(&fisher, &grad, DEFAULT_FISHER_REG).unwrap();

        let err = step_size(&fisher, &nat, 0.01).unwrap_err();
        assert!(matches!(err, PgError::DegenerateFisher { .. }));
    }

    #[test]
    fn test_fisher_shape_mismatch() {
        let grad = Matrix::zeros(2, 3);
        assert!(natural_gradient(&Matrix::identity(5), &grad, 1e-4).is_err());

        let err = step_size(&Matrix::identity(5), &grad, 0.01).unwrap_err();
        assert!(matches!(err, PgError::DimensionMismatch { .. }));
        assert!(step_size(&Matrix::zeros(6, 5), &grad, 0.01).is_err());
    }
}
