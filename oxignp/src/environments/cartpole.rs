use crate::environments::{Environment, Step};

use rand::prelude::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;

use std::f64::consts::PI;

const GRAVITY: f64 = 9.8;
const MASS_CART: f64 = 1.0;
const MASS_POLE: f64 = 0.1;
const TOTAL_MASS: f64 = MASS_CART + MASS_POLE;
// Half of the pole's length.
const LENGTH: f64 = 0.5;
const POLE_MASS_LENGTH: f64 = MASS_POLE * LENGTH;
const FORCE_MAG: f64 = 10.0;
// Seconds between state updates.
const TAU: f64 = 0.02;

const THETA_THRESHOLD: f64 = 12.0 * 2.0 * PI / 360.0;
const X_THRESHOLD: f64 = 2.4;

/// The classic cart-pole balancing task.
///
/// A pole is hinged to a cart moving on a frictionless track; each step
/// pushes the cart left (action 0) or right (action 1) with a fixed force,
/// and the episode terminates once the cart leaves `±2.4` or the pole tips
/// beyond `±12°`. Every step up to and including the terminating one is
/// rewarded with 1. Actions outside `{0, 1}` are treated as 0.
///
/// # Examples
/// ```
/// use oxignp::environments::{CartPole, Environment};
///
/// let mut env = CartPole::new();
/// let observation = env.reset(Some(42));
/// assert_eq!(observation.len(), 4);
///
/// let step = env.step(1);
/// assert_eq!(step.reward, 1.0);
/// ```
pub struct CartPole {
    x: f64,
    x_dot: f64,
    theta: f64,
    theta_dot: f64,
    steps_beyond_terminated: Option<usize>,
    rng: StdRng,
}

impl CartPole {
    /// Creates a simulator with an unseeded episode source; pass a seed to
    /// [`reset`](Environment::reset) for reproducible episodes.
    pub fn new() -> CartPole {
        CartPole {
            x: 0.0,
            x_dot: 0.0,
            theta: 0.0,
            theta_dot: 0.0,
            steps_beyond_terminated: None,
            rng: StdRng::from_entropy(),
        }
    }

    fn observation(&self) -> Vec<f64> {
        vec![self.x, self.x_dot, self.theta, self.theta_dot]
    }
}

impl Default for CartPole {
    fn default() -> CartPole {
        CartPole::new()
    }
}

impl Environment for CartPole {
    fn reset(&mut self, seed: Option<u64>) -> Vec<f64> {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.x = self.rng.gen_range(-0.05..0.05);
        self.x_dot = self.rng.gen_range(-0.05..0.05);
        self.theta = self.rng.gen_range(-0.05..0.05);
        self.theta_dot = self.rng.gen_range(-0.05..0.05);
        self.steps_beyond_terminated = None;
        self.observation()
    }

    fn step(&mut self, action: i64) -> Step {
        let force = if action == 1 { FORCE_MAG } else { -FORCE_MAG };
        let cos_theta = self.theta.cos();
        let sin_theta = self.theta.sin();

        let temp =
            (force + POLE_MASS_LENGTH * self.theta_dot * self.theta_dot * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (LENGTH * (4.0 / 3.0 - MASS_POLE * cos_theta * cos_theta / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        self.x += TAU * self.x_dot;
        self.x_dot += TAU * x_acc;
        self.theta += TAU * self.theta_dot;
        self.theta_dot += TAU * theta_acc;

        let terminated = self.x < -X_THRESHOLD
            || self.x > X_THRESHOLD
            || self.theta < -THETA_THRESHOLD
            || self.theta > THETA_THRESHOLD;

        let reward = if !terminated {
            1.0
        } else {
            match self.steps_beyond_terminated {
                None => {
                    self.steps_beyond_terminated = Some(0);
                    1.0
                }
                Some(n) => {
                    self.steps_beyond_terminated = Some(n + 1);
                    0.0
                }
            }
        };

        Step {
            observation: self.observation(),
            reward,
            terminated,
            truncated: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_is_reproducible() {
        let mut a = CartPole::new();
        let mut b = CartPole::new();
        assert_eq!(a.reset(Some(99)), b.reset(Some(99)));
        for _ in 0..50 {
            assert_eq!(a.step(0), b.step(0));
        }
    }

    #[test]
    fn reset_state_is_bounded() {
        let mut env = CartPole::new();
        for seed in 0..50 {
            let obs = env.reset(Some(seed));
            assert!(obs.iter().all(|v| (-0.05..0.05).contains(v)));
        }
    }

    #[test]
    fn constant_push_terminates() {
        let mut env = CartPole::new();
        env.reset(Some(3));
        let mut steps = 0;
        loop {
            let step = env.step(1);
            steps += 1;
            if step.terminated {
                assert_eq!(step.reward, 1.0);
                break;
            }
            assert!(steps < 500, "constant push should tip the pole");
        }
        // Rewards stop accruing after the terminating step.
        assert_eq!(env.step(1).reward, 0.0);
        assert_eq!(env.step(1).reward, 0.0);
    }

    #[test]
    fn invalid_action_is_coerced_left() {
        let mut a = CartPole::new();
        let mut b = CartPole::new();
        a.reset(Some(5));
        b.reset(Some(5));
        for _ in 0..20 {
            assert_eq!(a.step(7).observation, b.step(0).observation);
        }
    }
}
