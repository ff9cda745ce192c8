//! CartPole-v0 environment
//!
//! A classic reinforcement learning benchmark where a pole is balanced on a
//! cart. The goal is to prevent the pole from falling over by applying forces
//! to the cart.
//!
//! # Physics
//!
//! The cart-pole system follows these dynamics:
//! - State: [x, x_dot, theta, theta_dot] (cart position, cart velocity, pole
//!   angle, pole angular velocity)
//! - Actions: 0 (push left) or 1 (push right)
//! - Reward: +1 for every step taken, including the last one
//! - Termination: Pole angle > 12° or cart position > 2.4
//! - Horizon: 200 steps
//!
//! # Reference
//!
//! Based on OpenAI Gym CartPole-v0:
//! <https://github.com/openai/gym/blob/master/gym/envs/classic_control/cartpole.py>

use anyhow::{bail, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::env::{Environment, SpaceInfo, StepInfo, StepResult};

/// Registered identifier
pub const ID: &str = "CartPole-v0";

/// CartPole-v0 environment
///
/// A pole is attached to a cart moving along a frictionless track.
/// The goal is to balance the pole by applying forces to the cart.
#[derive(Debug)]
pub struct CartPole {
    // State variables
    x: f64,         // Cart position
    x_dot: f64,     // Cart velocity
    theta: f64,     // Pole angle (radians)
    theta_dot: f64, // Pole angular velocity

    // Episode tracking
    steps: usize,
    max_steps: usize,

    // Physics constants (matching Gym CartPole-v0)
    gravity: f64,
    mass_pole: f64,
    total_mass: f64,
    length: f64,           // Half-length of pole
    pole_mass_length: f64, // pole_mass * length
    force_mag: f64,
    tau: f64, // Time step

    // Thresholds
    theta_threshold: f64,
    x_threshold: f64,

    rng: ChaCha8Rng,
}

impl CartPole {
    /// Create a new CartPole environment seeded with `seed`
    ///
    /// Physics constants match OpenAI Gym:
    /// - gravity = 9.8 m/s²
    /// - cart mass = 1.0 kg
    /// - pole mass = 0.1 kg
    /// - pole half-length = 0.5 m
    /// - force magnitude = 10.0 N
    /// - timestep = 0.02 s
    pub fn new(seed: u64) -> Self {
        let mass_cart = 1.0;
        let mass_pole = 0.1;
        let length = 0.5;

        Self {
            x: 0.0,
            x_dot: 0.0,
            theta: 0.0,
            theta_dot: 0.0,
            steps: 0,
            max_steps: 200,
            gravity: 9.8,
            mass_pole,
            total_mass: mass_cart + mass_pole,
            length,
            pole_mass_length: mass_pole * length,
            force_mag: 10.0,
            tau: 0.02,
            theta_threshold: 12.0 * 2.0 * std::f64::consts::PI / 360.0, // ~0.2094 radians
            x_threshold: 2.4,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Perform one physics simulation step using Euler integration
    ///
    /// ```text
    /// temp = (force + pole_mass_length * theta_dot² * sin(theta)) / total_mass
    /// theta_acc = (g * sin(theta) - cos(theta) * temp) /
    ///             (length * (4/3 - mass_pole * cos²(theta) / total_mass))
    /// x_acc = temp - pole_mass_length * theta_acc * cos(theta) / total_mass
    /// ```
    fn physics_step(&mut self, action: usize) {
        let force = if action == 1 { self.force_mag } else { -self.force_mag };

        let cos_theta = self.theta.cos();
        let sin_theta = self.theta.sin();

        let temp = (force + self.pole_mass_length * self.theta_dot * self.theta_dot * sin_theta)
            / self.total_mass;
        let theta_acc = (self.gravity * sin_theta - cos_theta * temp)
            / (self.length
                * (4.0 / 3.0 - self.mass_pole * cos_theta * cos_theta / self.total_mass));
        let x_acc = temp - self.pole_mass_length * theta_acc * cos_theta / self.total_mass;

        self.x += self.tau * self.x_dot;
        self.x_dot += self.tau * x_acc;
        self.theta += self.tau * self.theta_dot;
        self.theta_dot += self.tau * theta_acc;
    }

    fn is_terminated(&self) -> bool {
        self.x.abs() > self.x_threshold || self.theta.abs() > self.theta_threshold
    }

    fn get_observation(&self) -> Vec<f64> {
        vec![self.x, self.x_dot, self.theta, self.theta_dot]
    }
}

impl Environment for CartPole {
    type Action = usize;

    fn reset(&mut self) -> Result<Vec<f64>> {
        self.x = self.rng.gen_range(-0.05..0.05);
        self.x_dot = self.rng.gen_range(-0.05..0.05);
        self.theta = self.rng.gen_range(-0.05..0.05);
        self.theta_dot = self.rng.gen_range(-0.05..0.05);
        self.steps = 0;
        Ok(self.get_observation())
    }

    fn step(&mut self, action: &usize) -> Result<StepResult> {
        if *action > 1 {
            bail!("CartPole action must be 0 or 1, got {action}");
        }
        self.physics_step(*action);
        self.steps += 1;

        let terminated = self.is_terminated();
        let truncated = !terminated && self.steps >= self.max_steps;

        Ok(StepResult {
            observation: self.get_observation(),
            reward: 1.0,
            terminated,
            truncated,
            info: StepInfo::default(),
        })
    }

    fn render(&mut self) -> Result<()> {
        tracing::debug!(
            step = self.steps,
            x = self.x,
            theta = self.theta,
            "cartpole"
        );
        Ok(())
    }

    fn observation_space(&self) -> SpaceInfo {
        SpaceInfo::continuous(4)
    }

    fn action_space(&self) -> SpaceInfo {
        SpaceInfo::discrete(2)
    }

    fn timestep_limit(&self) -> usize {
        self.max_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::SpaceType;

    #[test]
    fn test_cartpole_reset() {
        let mut env = CartPole::new(0);
        let obs = env.reset().unwrap();

        assert_eq!(obs.len(), 4, "Observation should have 4 elements");
        assert_eq!(env.steps, 0, "Steps should be reset to 0");
        for &val in &obs {
            assert!(val.abs() < 0.1, "Initial state should be small perturbation, got {}", val);
        }
    }

    #[test]
    fn test_cartpole_seeded_resets_match() {
        let mut a = CartPole::new(7);
        let mut b = CartPole::new(7);
        assert_eq!(a.reset().unwrap(), b.reset().unwrap());
        assert_eq!(a.step(&1).unwrap().observation, b.step(&1).unwrap().observation);
    }

    #[test]
    fn test_cartpole_termination() {
        let mut env = CartPole::new(0);
        env.reset().unwrap();
        env.x = 3.0;
        let result = env.step(&0).unwrap();
        assert!(result.terminated, "Episode should terminate when cart exceeds position threshold");
        assert_eq!(result.reward, 1.0);

        env.reset().unwrap();
        env.theta = 0.5;
        let result = env.step(&0).unwrap();
        assert!(result.terminated, "Episode should terminate when pole exceeds angle threshold");
    }

    #[test]
    fn test_cartpole_truncation() {
        let mut env = CartPole::new(0);
        env.reset().unwrap();
        env.steps = env.max_steps - 1;

        let result = env.step(&0).unwrap();
        assert!(result.truncated, "Episode should truncate at max steps");
        assert!(result.done());
    }

    #[test]
    fn test_cartpole_rejects_bad_action() {
        let mut env = CartPole::new(0);
        env.reset().unwrap();
        assert!(env.step(&2).is_err());
    }

    #[test]
    fn test_cartpole_spaces() {
        let env = CartPole::new(0);
        assert_eq!(env.observation_space().shape, vec![4]);
        assert!(matches!(env.action_space().dtype, SpaceType::Discrete(2)));
        assert_eq!(env.timestep_limit(), 200);
    }

    #[test]
    fn test_cartpole_episode_ends_within_horizon() {
        let mut env = CartPole::new(3);
        env.reset().unwrap();

        let mut steps = 0;
        for _ in 0..1000 {
            let result = env.step(&(steps % 2)).unwrap();
            steps += 1;
            if result.done() {
                break;
            }
        }
        assert!(steps <= 200, "Episode should not exceed the horizon");
    }
}
