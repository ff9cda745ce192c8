//! Environment pool for parallel episode collection
//!
//! Trajectories within a batch share nothing but a read-only θ, so they can
//! be collected on several environments at once with Rayon. The timestep
//! budget is split evenly across workers, each worker runs whole episodes
//! with its own seeded RNG, and the per-worker batches are concatenated in
//! worker order. For a fixed set of seeds the merged batch is identical from
//! run to run, whatever the thread scheduling.
//!
//! # Example
//!
//! ```rust
//! use simplepg::{env::{point::Point, pool::EnvPool}, policy::GaussianLinear, utils::Matrix};
//!
//! let mut pool = EnvPool::new(|worker| Point::new(42 + worker as u64), 4);
//! let theta = Matrix::zeros(2, 3);
//! let batch = pool.collect_batch(&theta, &GaussianLinear, &[1, 2, 3, 4], 200).unwrap();
//! assert!(batch.num_timesteps() >= 200);
//! ```

use anyhow::{ensure, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::{
    buffer::{collect_batch, Batch},
    env::Environment,
    policy::Policy,
    utils::Matrix,
};

/// A pool of environments, one per rollout worker
pub struct EnvPool<E: Environment> {
    /// Vector of environment instances
    envs: Vec<E>,
}

impl<E: Environment> EnvPool<E> {
    /// Create a pool of `num_envs` environments
    ///
    /// `env_fn` receives the worker index, so each environment can be given
    /// its own seed.
    pub fn new<F>(env_fn: F, num_envs: usize) -> Self
    where
        F: Fn(usize) -> E,
    {
        Self { envs: (0..num_envs).map(env_fn).collect() }
    }

    /// Wrap a single environment
    pub fn single(env: E) -> Self {
        Self { envs: vec![env] }
    }

    /// Get the number of environments in the pool
    pub fn num_envs(&self) -> usize {
        self.envs.len()
    }

    /// First environment, used for sequential collection and space queries
    pub fn primary(&self) -> Option<&E> {
        self.envs.first()
    }

    /// Mutable access to the first environment
    pub fn primary_mut(&mut self) -> Option<&mut E> {
        self.envs.first_mut()
    }

    /// Timesteps each worker must collect so the total reaches `batch_size`
    pub fn worker_budget(&self, batch_size: usize) -> usize {
        batch_size.div_ceil(self.envs.len().max(1))
    }
}

impl<E: Environment + Send> EnvPool<E> {
    /// Collect a batch across all environments in parallel
    ///
    /// # Arguments
    ///
    /// * `theta` - Current policy parameters
    /// * `policy` - Policy family
    /// * `seeds` - One RNG seed per environment
    /// * `batch_size` - Total timestep budget
    pub fn collect_batch<P>(
        &mut self,
        theta: &Matrix,
        policy: &P,
        seeds: &[u64],
        batch_size: usize,
    ) -> Result<Batch<P::Action>>
    where
        P: Policy + Sync,
        E: Environment<Action = P::Action>,
    {
        ensure!(
            seeds.len() == self.envs.len(),
            "need one seed per environment: {} seeds for {} environments",
            seeds.len(),
            self.envs.len()
        );
        let budget = self.worker_budget(batch_size);

        let batches = self
            .envs
            .par_iter_mut()
            .zip(seeds.par_iter())
            .map(|(env, &seed)| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                collect_batch(theta, policy, env, &mut rng, budget, false)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Batch::concat(batches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        env::{cartpole::CartPole, point::Point},
        policy::{CategoricalSoftmax, GaussianLinear},
    };

    #[test]
    fn test_worker_budget_rounds_up() {
        let pool = EnvPool::new(|w| Point::new(w as u64), 3);
        assert_eq!(pool.worker_budget(100), 34);
        assert_eq!(pool.worker_budget(99), 33);
        assert_eq!(pool.num_envs(), 3);
    }

    #[test]
    fn test_parallel_batch_meets_budget() -> Result<()> {
        let mut pool = EnvPool::new(|w| CartPole::new(w as u64), 4);
        let theta = Matrix::zeros(2, 5);
        let batch = pool.collect_batch(&theta, &CategoricalSoftmax, &[10, 11, 12, 13], 400)?;
        assert!(batch.num_timesteps() >= 400);
        Ok(())
    }

    #[test]
    fn test_parallel_batch_is_reproducible() -> Result<()> {
        let theta = Matrix::from_fn(2, 3, |i, j| 0.05 * (i + j) as f64);
        let run = || -> Result<Batch<Vec<f64>>> {
            let mut pool = EnvPool::new(|w| Point::new(100 + w as u64), 3);
            pool.collect_batch(&theta, &GaussianLinear, &[7, 8, 9], 150)
        };
        assert_eq!(run()?, run()?);
        Ok(())
    }

    #[test]
    fn test_seed_count_must_match() {
        let mut pool = EnvPool::new(|w| Point::new(w as u64), 2);
        let theta = Matrix::zeros(2, 3);
        assert!(pool.collect_batch(&theta, &GaussianLinear, &[1], 10).is_err());
    }
}
