use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for population generation.
///
/// Evolution parameters (tournament size, elitism, mutation and crossover
/// chances) are not configuration: they are passed to the individual
/// operators each generation, so schedules can vary over a run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Size of the population.
    pub size: NonZeroUsize,
    /// Seed of the population's shared random number generator. Two
    /// populations built from the same seed and configuration, driven by
    /// the same operator calls, evolve identically.
    pub seed: u64,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration: a single-individual
    /// population seeded with 0.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to fill in unused values during
    /// configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use oxignp::PopulationConfig;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = PopulationConfig {
    ///     size: NonZeroUsize::new(100).unwrap(),
    ///     ..PopulationConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            // SAFETY: 1 is a valid NonZeroUsize. Replace this with
            // NonZeroUsize::new(1).unwrap() once const Option::unwrap
            // becomes stable.
            size: unsafe { NonZeroUsize::new_unchecked(1) },
            seed: 0,
        }
    }
}
