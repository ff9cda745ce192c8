//! Discounted returns and the per-timestep mean baseline
//!
//! Returns are computed per trajectory by the backward recursion
//! ```text
//! R[T-1] = r[T-1]
//! R[t]   = r[t] + γ · R[t+1]
//! ```
//! and then grouped by absolute timestep index into a [`ReturnTable`]. The
//! baseline at index `t` is the mean of every return recorded at `t`.

use crate::{buffer::Batch, error::PgError};

/// Discounted return at every timestep of one episode
pub fn discounted_returns(rewards: &[f64], discount: f64) -> Vec<f64> {
    let mut returns = vec![0.0; rewards.len()];
    let mut running = 0.0;
    for t in (0..rewards.len()).rev() {
        running = rewards[t] + discount * running;
        returns[t] = running;
    }
    returns
}

/// Returns grouped by timestep index across a batch
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnTable {
    by_timestep: Vec<Vec<f64>>,
}

impl ReturnTable {
    /// Empty table covering indices `[0, horizon)`
    pub fn new(horizon: usize) -> Self {
        Self { by_timestep: vec![Vec::new(); horizon] }
    }

    /// Number of timestep indices covered
    pub fn horizon(&self) -> usize {
        self.by_timestep.len()
    }

    /// Record one trajectory's returns, index by index
    pub fn record(&mut self, returns: &[f64]) -> Result<(), PgError> {
        if returns.len() > self.horizon() {
            return Err(PgError::HorizonExceeded {
                length: returns.len(),
                horizon: self.horizon(),
            });
        }
        for (slot, &r) in self.by_timestep.iter_mut().zip(returns) {
            slot.push(r);
        }
        Ok(())
    }

    /// Every return recorded at index `t`
    pub fn at(&self, t: usize) -> &[f64] {
        self.by_timestep.get(t).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Mean return per index; indices nobody reached stay at 0
    pub fn baselines(&self) -> Vec<f64> {
        self.by_timestep
            .iter()
            .map(|returns| {
                if returns.is_empty() {
                    0.0
                } else {
                    returns.iter().sum::<f64>() / returns.len() as f64
                }
            })
            .collect()
    }
}

/// Discounted returns of every trajectory in the batch plus their table
pub fn batch_returns<A>(
    batch: &Batch<A>,
    discount: f64,
    horizon: usize,
) -> Result<(Vec<Vec<f64>>, ReturnTable), PgError> {
    let mut table = ReturnTable::new(horizon);
    let mut all_returns = Vec::with_capacity(batch.num_episodes());
    for trajectory in &batch.trajectories {
        let returns = discounted_returns(&trajectory.rewards, discount);
        table.record(&returns)?;
        all_returns.push(returns);
    }
    Ok((all_returns, table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Trajectory;

    #[test]
    fn test_three_step_recursion() {
        let (r0, r1, r2, g) = (1.0, -2.0, 4.0, 0.9);
        let returns = discounted_returns(&[r0, r1, r2], g);
        let expected = [r0 + g * r1 + g * g * r2, r1 + g * r2, r2];
        for (a, b) in returns.iter().zip(&expected) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_undiscounted_and_myopic() {
        assert_eq!(discounted_returns(&[1.0, 1.0, 1.0], 1.0), vec![3.0, 2.0, 1.0]);
        assert_eq!(discounted_returns(&[1.0, 2.0, 3.0], 0.0), vec![1.0, 2.0, 3.0]);
        assert!(discounted_returns(&[], 0.99).is_empty());
    }

    #[test]
    fn test_baseline_is_mean_per_index() {
        let mut table = ReturnTable::new(4);
        table.record(&[3.0, 2.0, 1.0]).unwrap();
        table.record(&[5.0]).unwrap();

        assert_eq!(table.at(0), &[3.0, 5.0]);
        assert_eq!(table.baselines(), vec![4.0, 2.0, 1.0, 0.0]);
    }

    #[test]
    fn test_empty_table_baseline_is_zero() {
        let table = ReturnTable::new(5);
        assert_eq!(table.baselines(), vec![0.0; 5]);
        assert!(table.at(10).is_empty());
    }

    #[test]
    fn test_record_rejects_overlong_trajectory() {
        let mut table = ReturnTable::new(2);
        let err = table.record(&[1.0, 1.0, 1.0]).unwrap_err();
        assert_eq!(err, PgError::HorizonExceeded { length: 3, horizon: 2 });
    }

    #[test]
    fn test_batch_returns() {
        let mut a = Trajectory::new();
        a.push(vec![0.0], 0usize, 1.0);
        a.push(vec![0.0], 0usize, 1.0);
        let mut b = Trajectory::new();
        b.push(vec![0.0], 1usize, 3.0);

        let (returns, table) = batch_returns(&Batch::new(vec![a, b]), 0.5, 3).unwrap();
        assert_eq!(returns, vec![vec![1.5, 1.0], vec![3.0]]);
        assert_eq!(table.baselines(), vec![2.25, 1.0, 0.0]);
    }
}
