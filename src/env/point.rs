//! Point-v0 environment
//!
//! A point in the plane has to be steered to the origin:
//! - State: [x, y], sampled uniformly in [-1, 1]² with norm above 0.9
//! - Actions: real 2-vector, clipped to [-0.1, 0.1] per coordinate and added
//!   to the position
//! - Reward: negative distance to the origin
//! - Termination: both coordinates within 0.01 of the origin
//! - Horizon: 40 steps

use anyhow::{bail, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::env::{Environment, SpaceInfo, StepInfo, StepResult};

/// Registered identifier
pub const ID: &str = "Point-v0";

const MAX_ACTION: f64 = 0.1;
const GOAL_TOLERANCE: f64 = 0.01;
const MIN_START_NORM: f64 = 0.9;

/// Two-dimensional point mass
#[derive(Debug)]
pub struct Point {
    state: [f64; 2],
    steps: usize,
    max_steps: usize,
    rng: ChaCha8Rng,
}

impl Point {
    /// Create a new point environment seeded with `seed`
    pub fn new(seed: u64) -> Self {
        Self { state: [0.0; 2], steps: 0, max_steps: 40, rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    fn distance(&self) -> f64 {
        self.state.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}

impl Environment for Point {
    type Action = Vec<f64>;

    fn reset(&mut self) -> Result<Vec<f64>> {
        // Start far enough from the goal
        loop {
            self.state = [self.rng.gen_range(-1.0..1.0), self.rng.gen_range(-1.0..1.0)];
            if self.distance() > MIN_START_NORM {
                break;
            }
        }
        self.steps = 0;
        Ok(self.state.to_vec())
    }

    fn step(&mut self, action: &Vec<f64>) -> Result<StepResult> {
        if action.len() != 2 {
            bail!("Point action must have 2 components, got {}", action.len());
        }
        for (s, a) in self.state.iter_mut().zip(action) {
            *s += a.clamp(-MAX_ACTION, MAX_ACTION);
        }
        self.steps += 1;

        let distance = self.distance();
        let terminated = self.state.iter().all(|v| v.abs() < GOAL_TOLERANCE);
        let truncated = !terminated && self.steps >= self.max_steps;

        Ok(StepResult {
            observation: self.state.to_vec(),
            reward: -distance,
            terminated,
            truncated,
            info: StepInfo { distance: Some(distance) },
        })
    }

    fn render(&mut self) -> Result<()> {
        tracing::debug!(step = self.steps, x = self.state[0], y = self.state[1], "point");
        Ok(())
    }

    fn observation_space(&self) -> SpaceInfo {
        SpaceInfo::continuous(2)
    }

    fn action_space(&self) -> SpaceInfo {
        SpaceInfo::continuous(2)
    }

    fn timestep_limit(&self) -> usize {
        self.max_steps
    }
}
