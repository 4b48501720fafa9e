//! A Population is a fixed-size collection of networks evolved by
//! fitness-proportional tournament selection, elitism, edge and boundary
//! mutation, crossover, and structural grow/shrink operators.
//!
//! All randomness flows through a single shared generator owned by the
//! population, so a seed and a sequence of operator calls fully determine
//! a run. One generation is driven externally, in this order: evaluate
//! fitness, select, cross over, grow/shrink, mutate edges, mutate
//! boundaries. Grow/shrink reads the used-flags that only a fitness
//! traversal refreshes, which is why it precedes edge mutation.

mod config;
mod errors;
mod log;

pub use config::PopulationConfig;
pub use errors::SelectionError;
pub use log::*;

use crate::environments::Environment;
use crate::genomics::{FeatureRangeError, GeneticConfig, Network, Node, NodeType};

use std::collections::HashSet;

use ahash::RandomState;
use rand::prelude::{Rng, SliceRandom};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

fn fresh_rng() -> StdRng {
    StdRng::from_entropy()
}

/// A population of networks.
///
/// Suports Serde for convenient population saving and loading. The shared
/// random generator is not serialized: a deserialized population receives
/// a fresh, entropy-seeded generator, so reproducibility does not extend
/// across a round-trip.
#[derive(Serialize, Deserialize)]
pub struct Population {
    individuals: Vec<Network>,
    #[serde(skip, default = "fresh_rng")]
    rng: StdRng,
    best_fit: f64,
    mean_fitness: f64,
    min_fitness: f64,
    indices_elite: HashSet<usize, RandomState>,
    population_config: PopulationConfig,
    genetic_config: GeneticConfig,
}

impl Population {
    /// Creates a new population using the passed configurations.
    ///
    /// These configurations shouldn't be modified once evolution
    /// begins, thus they are copied and kept by the population for
    /// the duration of its lifetime.
    ///
    /// Call [`initialize_boundaries`] before the first fitness
    /// evaluation.
    ///
    /// [`initialize_boundaries`]: Population::initialize_boundaries
    pub fn new(population_config: PopulationConfig, genetic_config: GeneticConfig) -> Population {
        let mut rng = StdRng::seed_from_u64(population_config.seed);
        let individuals = (0..population_config.size.get())
            .map(|_| Network::new(&genetic_config, &mut rng))
            .collect();
        Population {
            individuals,
            rng,
            best_fit: 0.0,
            mean_fitness: 0.0,
            min_fitness: 0.0,
            indices_elite: HashSet::default(),
            population_config,
            genetic_config,
        }
    }

    /// Sets the judgment-node boundaries of every individual from the
    /// per-feature ranges `min_f`/`max_f`. Fractal judgment nodes sample
    /// their production-rule parameters here.
    ///
    /// # Errors
    /// Returns an error if either slice is shorter than the number of
    /// judgment functions.
    pub fn initialize_boundaries(
        &mut self,
        min_f: &[f64],
        max_f: &[f64],
    ) -> Result<(), FeatureRangeError> {
        for network in &mut self.individuals {
            network.initialize_boundaries(min_f, max_f, &mut self.rng)?;
        }
        Ok(())
    }

    /// Evaluates every network in the population with the passed
    /// evaluator, which is expected to set each network's fitness.
    ///
    /// # Examples
    /// ```
    /// use oxignp::{Population, PopulationConfig};
    /// use oxignp::genomics::GeneticConfig;
    /// use std::num::NonZeroUsize;
    ///
    /// let mut population = Population::new(
    ///     PopulationConfig {
    ///         size: NonZeroUsize::new(10).unwrap(),
    ///         seed: 42,
    ///     },
    ///     GeneticConfig {
    ///         judgment_nodes: 2,
    ///         processing_nodes: 2,
    ///         ..GeneticConfig::zero()
    ///     },
    /// );
    ///
    /// // Score every network by its node count.
    /// population.evaluate_fitness(|network| {
    ///     let nodes = network.inner_nodes().len() as f64;
    ///     network.set_fitness(nodes);
    /// });
    /// assert!(population.individuals().all(|n| n.fitness() == 4.0));
    /// ```
    pub fn evaluate_fitness<E>(&mut self, mut evaluator: E)
    where
        E: FnMut(&mut Network),
    {
        for network in &mut self.individuals {
            evaluator(network);
        }
    }

    /// Evaluates every network as a classifier over the feature rows `x`
    /// and labels `y`. See [`Network::fit_accuracy`].
    pub fn evaluate_accuracy(&mut self, x: &[Vec<f64>], y: &[i64], d_max: usize) {
        for network in &mut self.individuals {
            network.fit_accuracy(x, y, d_max);
        }
    }

    /// Evaluates every network on one episode of `env`, each reset from
    /// the same `seed`. See [`Network::fit_environment`].
    pub fn evaluate_environment<E: Environment>(
        &mut self,
        env: &mut E,
        d_max: usize,
        max_steps: usize,
        max_consecutive_p: usize,
        worst_fitness: f64,
        seed: u64,
    ) {
        for network in &mut self.individuals {
            network.fit_environment(env, d_max, max_steps, max_consecutive_p, worst_fitness, seed);
        }
    }

    /// Evaluates every network on one episode of the built-in CartPole
    /// simulator. See [`Network::fit_cartpole`].
    pub fn evaluate_cartpole(
        &mut self,
        d_max: usize,
        penalty: f64,
        max_steps: usize,
        max_consecutive_p: usize,
    ) {
        for network in &mut self.individuals {
            network.fit_cartpole(d_max, penalty, max_steps, max_consecutive_p, &mut self.rng);
        }
    }

    /// Produces the next generation by `n`-way tournaments with `elite`
    /// protected slots.
    ///
    /// Each non-elite slot is filled by the fittest of `n` distinct
    /// individuals sampled without replacement (ties go to the lowest
    /// entrant id). The `elite` fittest individuals are then
    /// appended unchanged; their new positions are recorded and skipped
    /// by every mutation and crossover operator until the next selection.
    /// The population's best/mean/min fitness statistics are refreshed
    /// along the way.
    ///
    /// # Errors
    /// Returns an error if `n` is zero or exceeds the population size, or
    /// if `elite` exceeds the population size.
    pub fn tournament_selection(&mut self, n: usize, elite: usize) -> Result<(), SelectionError> {
        let ni = self.individuals.len();
        if n == 0 || n > ni {
            return Err(SelectionError::TournamentSize {
                requested: n,
                population: ni,
            });
        }
        if elite > ni {
            return Err(SelectionError::EliteSize {
                requested: elite,
                population: ni,
            });
        }

        let mut next = Vec::with_capacity(ni);
        self.mean_fitness = 0.0;
        self.min_fitness = f64::INFINITY;
        for _ in 0..ni - elite {
            // Ascending-id order, so ties go to the lowest entrant id.
            let mut entrants = rand::seq::index::sample(&mut self.rng, ni, n).into_vec();
            entrants.sort_unstable();
            let mut winner = entrants[0];
            for &entrant in &entrants {
                if self.individuals[entrant].fitness > self.individuals[winner].fitness {
                    winner = entrant;
                }
            }
            let winner = self.individuals[winner].clone();
            self.mean_fitness += winner.fitness;
            self.min_fitness = self.min_fitness.min(winner.fitness);
            next.push(winner);
        }

        self.set_elite(elite, &mut next);
        self.individuals = next;
        // Divided by the post-elite population size.
        self.mean_fitness /= ni as f64;
        Ok(())
    }

    /// Appends the `elite` fittest individuals of the outgoing generation
    /// to `next`, recording their new indices.
    fn set_elite(&mut self, elite: usize, next: &mut Vec<Network>) {
        self.indices_elite.clear();
        let mut pool = self.individuals.clone();
        for round in 0..elite {
            let mut best = 0;
            for i in 1..pool.len() {
                if pool[i].fitness > pool[best].fitness {
                    best = i;
                }
            }
            let champion = pool.remove(best);
            if round == 0 {
                self.best_fit = champion.fitness;
            }
            self.indices_elite.insert(next.len());
            next.push(champion);
        }
    }

    /// Mutates every edge of every non-elite individual: inner-node edges
    /// with probability `p_inner` each, the start edge with probability
    /// `p_start`.
    pub fn mutate_edges(&mut self, p_inner: f64, p_start: f64) {
        for (i, network) in self.individuals.iter_mut().enumerate() {
            if self.indices_elite.contains(&i) {
                continue;
            }
            let node_count = network.inner_nodes.len();
            for node in &mut network.inner_nodes {
                node.mutate_edges(p_inner, node_count, &mut self.rng);
            }
            network.start_node.mutate_edges(p_start, node_count, &mut self.rng);
        }
    }

    /// Applies `op` to every judgment node of every non-elite individual,
    /// passing the individual's inner-node count along.
    fn apply_boundary_mutation(&mut self, mut op: impl FnMut(&mut Node, usize, &mut StdRng)) {
        for (i, network) in self.individuals.iter_mut().enumerate() {
            if self.indices_elite.contains(&i) {
                continue;
            }
            let network_size = network.inner_nodes.len();
            for node in &mut network.inner_nodes {
                if node.node_type() == NodeType::Judgment {
                    op(node, network_size, &mut self.rng);
                }
            }
        }
    }

    /// Mutates each inner boundary of every non-elite individual with
    /// probability `p`, redrawing it uniformly between its neighbors.
    pub fn mutate_boundaries_uniform(&mut self, p: f64) {
        self.apply_boundary_mutation(|node, _, rng| node.mutate_boundaries_uniform(p, rng));
    }

    /// Mutates each inner boundary of every non-elite individual with
    /// probability `p` by a Gaussian perturbation of relative width
    /// `sigma`. See [`Node::mutate_boundaries_normal`].
    pub fn mutate_boundaries_normal(&mut self, p: f64, sigma: f64) {
        self.apply_boundary_mutation(|node, _, rng| node.mutate_boundaries_normal(p, sigma, rng));
    }

    /// As [`mutate_boundaries_normal`], with `sigma` shrunk by the
    /// logarithm of the individual's node count, so boundary steps get
    /// finer as networks grow.
    ///
    /// [`mutate_boundaries_normal`]: Population::mutate_boundaries_normal
    pub fn mutate_boundaries_network_size_sigma(&mut self, p: f64, sigma: f64) {
        self.apply_boundary_mutation(|node, network_size, rng| {
            node.mutate_boundaries_normal(p, sigma / (network_size as f64).ln(), rng)
        });
    }

    /// As [`mutate_boundaries_normal`], with `sigma` shrunk by the
    /// logarithm of each node's edge count, so finely partitioned nodes
    /// take finer boundary steps.
    ///
    /// [`mutate_boundaries_normal`]: Population::mutate_boundaries_normal
    pub fn mutate_boundaries_edge_size_sigma(&mut self, p: f64, sigma: f64) {
        self.apply_boundary_mutation(|node, _, rng| {
            let sigma = sigma / (node.edges().len() as f64).ln();
            node.mutate_boundaries_normal(p, sigma, rng)
        });
    }

    /// Mutates the production-rule parameters of every non-elite fractal
    /// individual with probability `p` each, rederiving boundaries from
    /// the per-feature ranges. See [`Node::mutate_boundaries_fractal`].
    ///
    /// # Errors
    /// Returns an error if either feature-range slice is shorter than the
    /// number of judgment functions.
    pub fn mutate_boundaries_fractal(
        &mut self,
        p: f64,
        min_f: &[f64],
        max_f: &[f64],
    ) -> Result<(), FeatureRangeError> {
        let required = self.genetic_config.judgment_functions.get();
        let provided = min_f.len().min(max_f.len());
        if provided < required {
            return Err(FeatureRangeError { required, provided });
        }
        self.apply_boundary_mutation(|node, _, rng| {
            let feature = node.function();
            node.mutate_boundaries_fractal(p, min_f[feature], max_f[feature], rng)
        });
        Ok(())
    }

    /// Recombines randomly paired non-elite individuals: aligned inner
    /// nodes are swapped whole with probability `p` each, excluding the
    /// last node of the smaller parent. If the parents differ in size,
    /// the smaller one's dangling edges are repaired afterwards.
    pub fn crossover(&mut self, p: f64) {
        let ni = self.individuals.len();
        let mut order: Vec<usize> = (0..ni).collect();
        order.shuffle(&mut self.rng);
        for pair in order.chunks_exact(2) {
            if self.indices_elite.contains(&pair[0]) || self.indices_elite.contains(&pair[1]) {
                continue;
            }
            let (lo, hi) = if pair[0] < pair[1] {
                (pair[0], pair[1])
            } else {
                (pair[1], pair[0])
            };
            let (head, tail) = self.individuals.split_at_mut(hi);
            let (a, b) = (&mut head[lo], &mut tail[0]);

            let m = a.inner_nodes.len().min(b.inner_nodes.len());
            for k in 0..m.saturating_sub(1) {
                if self.rng.gen::<f64>() < p {
                    std::mem::swap(&mut a.inner_nodes[k], &mut b.inner_nodes[k]);
                }
            }
            a.recount_node_types();
            b.recount_node_types();

            if a.inner_nodes.len() != b.inner_nodes.len() {
                let smaller = if a.inner_nodes.len() < b.inner_nodes.len() {
                    a
                } else {
                    b
                };
                smaller.repair_dangling_edges(&mut self.rng);
            }
        }
    }

    /// Applies the grow/shrink operator to every individual. Elites are
    /// not skipped here; their protection covers mutation and crossover
    /// only.
    ///
    /// # Errors
    /// Returns an error if either feature-range slice is shorter than the
    /// number of judgment functions.
    pub fn add_or_delete_nodes(
        &mut self,
        min_f: &[f64],
        max_f: &[f64],
    ) -> Result<(), FeatureRangeError> {
        for network in &mut self.individuals {
            network.add_or_delete_node(min_f, max_f, &mut self.rng)?;
        }
        Ok(())
    }

    /// Resets the population to a fresh randomized state built from the
    /// stored configurations and the original seed.
    pub fn reset(&mut self) {
        *self = Population::new(self.population_config.clone(), self.genetic_config.clone());
    }

    /// Returns the currently best-performing network.
    pub fn champion(&self) -> &Network {
        self.individuals
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
            .expect("empty population has no champion")
    }

    /// Returns an iterator over all current networks.
    pub fn individuals(&self) -> impl Iterator<Item = &Network> {
        self.individuals.iter()
    }

    /// Returns the highest fitness observed by the most recent selection.
    pub fn best_fit(&self) -> f64 {
        self.best_fit
    }

    /// Returns the mean fitness of the most recent selection's winners.
    pub fn mean_fitness(&self) -> f64 {
        self.mean_fitness
    }

    /// Returns the lowest winner fitness of the most recent selection.
    pub fn min_fitness(&self) -> f64 {
        self.min_fitness
    }

    /// Returns the positions of the individuals currently protected from
    /// mutation and crossover.
    pub fn elite_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices_elite.iter().copied()
    }
}
