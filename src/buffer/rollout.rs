//! Sequential Monte-Carlo rollouts
//!
//! Episodes are always run to completion: a batch keeps collecting whole
//! episodes until its timestep budget is met, so the last episode may
//! overshoot the budget but is never split.

use anyhow::Result;
use rand::Rng;

use super::{Batch, Trajectory};
use crate::{env::Environment, policy::Policy, utils::Matrix};

/// Run one episode with actions drawn from `π_θ`
///
/// The episode ends when the environment reports `done`, or at the
/// environment's timestep limit if it fails to report it. `render` calls
/// [`Environment::render`] after every step.
pub fn collect_episode<P, E, R>(
    theta: &Matrix,
    policy: &P,
    env: &mut E,
    rng: &mut R,
    render: bool,
) -> Result<Trajectory<P::Action>>
where
    P: Policy,
    E: Environment<Action = P::Action>,
    R: Rng + ?Sized,
{
    let horizon = env.timestep_limit();
    let mut trajectory = Trajectory::new();
    let mut ob = env.reset()?;

    loop {
        let action = policy.sample_action(theta, &ob, rng)?;
        let result = env.step(&action)?;
        if render {
            env.render()?;
        }

        let done = result.done();
        let next_ob = result.observation;
        trajectory.push(std::mem::replace(&mut ob, next_ob), action, result.reward);

        if done {
            break;
        }
        if trajectory.len() >= horizon {
            tracing::warn!(horizon, "environment did not report done at its timestep limit");
            break;
        }
    }

    Ok(trajectory)
}

/// Collect whole episodes until at least `batch_size` timesteps are stored
///
/// Only the first episode is rendered when `render` is set.
pub fn collect_batch<P, E, R>(
    theta: &Matrix,
    policy: &P,
    env: &mut E,
    rng: &mut R,
    batch_size: usize,
    render: bool,
) -> Result<Batch<P::Action>>
where
    P: Policy,
    E: Environment<Action = P::Action>,
    R: Rng + ?Sized,
{
    let mut trajectories = Vec::new();
    let mut n_samples = 0;

    while n_samples < batch_size {
        let render_episode = render && n_samples == 0;
        let trajectory = collect_episode(theta, policy, env, rng, render_episode)?;
        n_samples += trajectory.len();
        tracing::debug!(
            episode = trajectories.len(),
            length = trajectory.len(),
            total_reward = trajectory.total_reward(),
            "episode collected"
        );
        trajectories.push(trajectory);
    }

    Ok(Batch::new(trajectories))
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::{
        env::{point::Point, SpaceInfo, StepInfo, StepResult},
        policy::{CategoricalSoftmax, GaussianLinear},
    };

    /// Episodes of fixed length; counts resets and renders
    struct Countdown {
        length: usize,
        limit: usize,
        truncates: bool,
        remaining: usize,
        resets: usize,
        renders: usize,
    }

    impl Countdown {
        fn new(length: usize, limit: usize) -> Self {
            Self { length, limit, truncates: false, remaining: 0, resets: 0, renders: 0 }
        }

        /// Ends episodes by truncation instead of termination
        fn truncating(length: usize, limit: usize) -> Self {
            Self { truncates: true, ..Self::new(length, limit) }
        }
    }

    impl Environment for Countdown {
        type Action = usize;

        fn reset(&mut self) -> Result<Vec<f64>> {
            self.remaining = self.length;
            self.resets += 1;
            Ok(vec![self.remaining as f64])
        }

        fn step(&mut self, _action: &usize) -> Result<StepResult> {
            self.remaining = self.remaining.saturating_sub(1);
            Ok(StepResult {
                observation: vec![self.remaining as f64],
                reward: 1.0,
                terminated: self.remaining == 0 && !self.truncates,
                truncated: self.remaining == 0 && self.truncates,
                info: StepInfo::default(),
            })
        }

        fn render(&mut self) -> Result<()> {
            self.renders += 1;
            Ok(())
        }

        fn observation_space(&self) -> SpaceInfo {
            SpaceInfo::continuous(1)
        }

        fn action_space(&self) -> SpaceInfo {
            SpaceInfo::discrete(2)
        }

        fn timestep_limit(&self) -> usize {
            self.limit
        }
    }

    #[test]
    fn test_episode_records_pre_step_observations() -> Result<()> {
        let mut env = Countdown::new(3, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let theta = Matrix::zeros(2, 2);
        let traj = collect_episode(&theta, &CategoricalSoftmax, &mut env, &mut rng, false)?;

        assert_eq!(traj.len(), 3);
        assert_eq!(traj.observations, vec![vec![3.0], vec![2.0], vec![1.0]]);
        Ok(())
    }

    #[test]
    fn test_batch_overshoots_but_never_splits() -> Result<()> {
        let mut env = Countdown::new(7, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let theta = Matrix::zeros(2, 2);
        let batch = collect_batch(&theta, &CategoricalSoftmax, &mut env, &mut rng, 20, false)?;

        assert_eq!(batch.num_episodes(), 3);
        assert_eq!(batch.num_timesteps(), 21);
        assert!(batch.trajectories.iter().all(|t| t.len() == 7));
        assert_eq!(env.resets, 3);
        Ok(())
    }

    #[test]
    fn test_only_first_episode_rendered() -> Result<()> {
        let mut env = Countdown::new(4, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let theta = Matrix::zeros(2, 2);
        collect_batch(&theta, &CategoricalSoftmax, &mut env, &mut rng, 12, true)?;
        assert_eq!(env.renders, 4);
        Ok(())
    }

    #[test]
    fn test_truncation_ends_episode() -> Result<()> {
        let mut env = Countdown::truncating(3, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let theta = Matrix::zeros(2, 2);
        let batch = collect_batch(&theta, &CategoricalSoftmax, &mut env, &mut rng, 6, false)?;
        assert_eq!(batch.num_episodes(), 2);
        assert!(batch.trajectories.iter().all(|t| t.len() == 3));
        Ok(())
    }

    #[test]
    fn test_horizon_caps_runaway_episode() -> Result<()> {
        let mut env = Countdown::new(100, 5);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let theta = Matrix::zeros(2, 2);
        let traj = collect_episode(&theta, &CategoricalSoftmax, &mut env, &mut rng, false)?;
        assert_eq!(traj.len(), 5);
        Ok(())
    }

    #[test]
    fn test_same_seed_same_batch() -> Result<()> {
        let theta = Matrix::from_fn(2, 3, |i, j| 0.1 * (i as f64) - 0.05 * (j as f64));
        let run = || -> Result<Batch<Vec<f64>>> {
            let mut env = Point::new(42);
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            collect_batch(&theta, &GaussianLinear, &mut env, &mut rng, 50, false)
        };
        assert_eq!(run()?, run()?);
        Ok(())
    }

    #[test]
    fn test_zero_budget_collects_nothing() -> Result<()> {
        let mut env = Countdown::new(3, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let theta = Matrix::zeros(2, 2);
        let batch = collect_batch(&theta, &CategoricalSoftmax, &mut env, &mut rng, 0, false)?;
        assert_eq!(batch.num_episodes(), 0);
        assert_eq!(env.resets, 0);
        Ok(())
    }
}
