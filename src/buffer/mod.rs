//! Trajectory storage
//!
//! A [`Trajectory`] is one complete episode of `(observation, action,
//! reward)` triples. A [`Batch`] is the set of trajectories collected in one
//! training iteration. Both are immutable once collected and are dropped at
//! the end of the iteration that produced them.

pub mod rollout;

pub use rollout::{collect_batch, collect_episode};

/// One episode from reset to termination
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory<A> {
    /// Observations seen before each action
    pub observations: Vec<Vec<f64>>,

    /// Actions taken
    pub actions: Vec<A>,

    /// Rewards received after each action
    pub rewards: Vec<f64>,
}

impl<A> Trajectory<A> {
    /// Empty trajectory
    pub fn new() -> Self {
        Self { observations: Vec::new(), actions: Vec::new(), rewards: Vec::new() }
    }

    /// Append one transition
    pub fn push(&mut self, observation: Vec<f64>, action: A, reward: f64) {
        self.observations.push(observation);
        self.actions.push(action);
        self.rewards.push(reward);
    }

    /// Number of timesteps
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Whether no step was recorded
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Undiscounted sum of rewards
    pub fn total_reward(&self) -> f64 {
        self.rewards.iter().sum()
    }

    /// `(observation, action)` pairs in time order
    pub fn steps(&self) -> impl Iterator<Item = (&[f64], &A)> {
        self.observations.iter().map(Vec::as_slice).zip(&self.actions)
    }
}

impl<A> Default for Trajectory<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Trajectories collected in one iteration
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<A> {
    /// Complete episodes in collection order
    pub trajectories: Vec<Trajectory<A>>,
}

impl<A> Batch<A> {
    /// Wrap already-collected trajectories
    pub fn new(trajectories: Vec<Trajectory<A>>) -> Self {
        Self { trajectories }
    }

    /// Total number of timesteps across all episodes
    pub fn num_timesteps(&self) -> usize {
        self.trajectories.iter().map(Trajectory::len).sum()
    }

    /// Number of episodes
    pub fn num_episodes(&self) -> usize {
        self.trajectories.len()
    }

    /// Mean undiscounted episode return, 0 for an empty batch
    pub fn average_return(&self) -> f64 {
        if self.trajectories.is_empty() {
            return 0.0;
        }
        self.trajectories.iter().map(Trajectory::total_reward).sum::<f64>()
            / self.trajectories.len() as f64
    }

    /// Every `(observation, action)` pair of the batch, episode by episode
    pub fn steps(&self) -> impl Iterator<Item = (&[f64], &A)> {
        self.trajectories.iter().flat_map(Trajectory::steps)
    }

    /// Concatenate batches in order
    pub fn concat(batches: impl IntoIterator<Item = Batch<A>>) -> Self {
        Self::new(batches.into_iter().flat_map(|b| b.trajectories).collect())
    }
}

impl<A> Default for Batch<A> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
