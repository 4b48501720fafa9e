//! Episodic environments a network can be evaluated against.
//!
//! The [`Environment`] trait is the only contract the fitness loop relies
//! on: reset to an initial observation, then step with discrete actions
//! until termination. A built-in [`CartPole`] simulator is provided; any
//! external reinforcement-learning environment can be adapted by
//! implementing the trait.

mod cartpole;

pub use cartpole::CartPole;

use serde::{Deserialize, Serialize};

/// The result of advancing an environment by one action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// The observation after the transition, indexable by feature number.
    pub observation: Vec<f64>,
    /// The reward collected by the transition.
    pub reward: f64,
    /// Whether the episode reached a terminal state.
    pub terminated: bool,
    /// Whether the episode was cut off externally. Informational only;
    /// the fitness loop keys off `terminated` and its own step cap.
    pub truncated: bool,
}

/// An episodic environment with a reset/step contract.
pub trait Environment {
    /// Starts a new episode and returns the initial observation.
    ///
    /// When `seed` is given, the episode's initial state is drawn
    /// reproducibly from it.
    fn reset(&mut self, seed: Option<u64>) -> Vec<f64>;

    /// Advances the episode by one action.
    fn step(&mut self, action: i64) -> Step;
}
