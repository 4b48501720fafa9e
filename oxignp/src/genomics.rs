//! Networks are the individuals of evolution: directed graphs of judgment
//! and processing nodes that emit a sequence of discrete actions when
//! traversed. A network is evaluated by feeding it observations one at a
//! time; judgment nodes route execution by testing features against their
//! interval boundaries until a processing node is reached, which emits its
//! action and forwards through its single edge. Networks can be mutated
//! structurally (node addition and deletion with edge repair) and are
//! recombined by their owning [`Population`].
//!
//! [`Population`]: crate::populations::Population

mod config;
mod errors;
mod fractal;
mod nodes;

pub use config::GeneticConfig;
pub use errors::FeatureRangeError;
pub use fractal::{
    fractal_lengths, random_k_d_combination, random_parameter_cuts, sort_and_distance,
};
pub use nodes::{Node, NodeType};

use crate::environments::{CartPole, Environment};

use std::fmt;
use std::ops::Index;

use rand::prelude::Rng;
use serde::{Deserialize, Serialize};

/// The value returned by a decision step whose judgment chain exceeded the
/// depth cap. Fitness hooks translate it into a penalty; it is never a
/// valid action.
pub const INVALID_DECISION: i64 = i64::MIN;

/// A directed graph of decision nodes, traversable into action sequences.
///
/// The graph is stored as an arena: `inner_nodes[i].id() == i` at all
/// times, and edges are indices into the same array. The distinguished
/// start node sits outside the arena and marks the traversal entry point.
///
/// Suports Serde for convenient network saving and loading. Transient
/// traversal registers are not serialized.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Network {
    pub(crate) start_node: Node,
    pub(crate) inner_nodes: Vec<Node>,
    pub(crate) jn: usize,
    pub(crate) jnf: usize,
    pub(crate) pn: usize,
    pub(crate) pnf: usize,
    pub(crate) fractal_judgment: bool,
    pub(crate) fitness: f64,
    pub(crate) decisions: Vec<i64>,
    #[serde(skip)]
    pub(crate) current_node: usize,
    #[serde(skip)]
    pub(crate) n_consecutive_p: usize,
    #[serde(skip)]
    pub(crate) invalid: bool,
    #[serde(skip)]
    pub(crate) n_used_nodes: usize,
}

impl Network {
    /// Generates a network with randomized topology from the passed
    /// configuration: judgment nodes first, processing nodes after, the
    /// start node wired to a random inner node.
    ///
    /// Judgment-node boundaries are not set here; call
    /// [`initialize_boundaries`] (or let the owning population do it)
    /// before the first evaluation.
    ///
    /// [`initialize_boundaries`]: Network::initialize_boundaries
    ///
    /// # Panics
    /// Panics if the configuration yields fewer than 3 inner nodes.
    ///
    /// # Examples
    /// ```
    /// use oxignp::genomics::{GeneticConfig, Network, NodeType};
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     judgment_nodes: 2,
    ///     judgment_functions: NonZeroUsize::new(4).unwrap(),
    ///     processing_nodes: 3,
    ///     processing_functions: NonZeroUsize::new(2).unwrap(),
    ///     fractal_judgment: false,
    /// };
    /// let mut rng = StdRng::seed_from_u64(42);
    ///
    /// let network = Network::new(&config, &mut rng);
    ///
    /// assert_eq!(network.inner_nodes().len(), 5);
    /// assert_eq!(network.judgment_nodes(), 2);
    /// assert_eq!(network.processing_nodes(), 3);
    /// assert!(network.inner_nodes().iter().enumerate().all(|(i, n)| n.id() == i));
    /// ```
    pub fn new(config: &GeneticConfig, rng: &mut impl Rng) -> Network {
        let jn = config.judgment_nodes;
        let pn = config.processing_nodes;
        let jnf = config.judgment_functions.get();
        let pnf = config.processing_functions.get();
        let node_count = jn + pn;
        assert!(node_count >= 3, "a network requires at least 3 inner nodes");

        let mut start_node = Node::new(0, NodeType::Start, 0);
        start_node.randomize_edges(node_count, None, rng);

        let mut inner_nodes = Vec::with_capacity(node_count);
        for id in 0..jn {
            let mut node = Node::new(id, NodeType::Judgment, rng.gen_range(0..jnf));
            if config.fractal_judgment {
                let (k, d) = random_k_d_combination(node_count - 1, rng);
                node.k_d = Some((k, d));
                node.randomize_edges(node_count, Some(k.pow(d as u32)), rng);
            } else {
                node.randomize_edges(node_count, None, rng);
            }
            inner_nodes.push(node);
        }
        for id in jn..node_count {
            let mut node = Node::new(id, NodeType::Processing, rng.gen_range(0..pnf));
            node.randomize_edges(node_count, None, rng);
            inner_nodes.push(node);
        }

        Network {
            start_node,
            inner_nodes,
            jn,
            jnf,
            pn,
            pnf,
            fractal_judgment: config.fractal_judgment,
            fitness: 0.0,
            decisions: Vec::new(),
            current_node: 0,
            n_consecutive_p: 0,
            invalid: false,
            n_used_nodes: 0,
        }
    }

    /// Sets the interval boundaries of every judgment node from the
    /// per-feature ranges `min_f`/`max_f`, indexed by node function.
    ///
    /// Fractal judgment nodes draw fresh production-rule parameters from
    /// `rng` and derive their boundaries from the expanded rule; plain
    /// judgment nodes split their range into equal intervals.
    ///
    /// # Errors
    /// Returns an error if either slice is shorter than the number of
    /// judgment functions.
    pub fn initialize_boundaries(
        &mut self,
        min_f: &[f64],
        max_f: &[f64],
        rng: &mut impl Rng,
    ) -> Result<(), FeatureRangeError> {
        self.check_feature_ranges(min_f, max_f)?;
        for node in &mut self.inner_nodes {
            if node.node_type != NodeType::Judgment {
                continue;
            }
            let feature = node.function;
            match node.k_d {
                Some((k, d)) => {
                    let mut cuts = random_parameter_cuts(k - 1, rng);
                    cuts.sort_by(f64::total_cmp);
                    let lengths = fractal_lengths(d, &sort_and_distance(cuts.clone()));
                    node.production_rule = cuts;
                    node.set_boundaries(min_f[feature], max_f[feature], Some(&lengths));
                }
                None => node.set_boundaries(min_f[feature], max_f[feature], None),
            }
        }
        Ok(())
    }

    fn check_feature_ranges(&self, min_f: &[f64], max_f: &[f64]) -> Result<(), FeatureRangeError> {
        let provided = min_f.len().min(max_f.len());
        if provided < self.jnf {
            Err(FeatureRangeError {
                required: self.jnf,
                provided,
            })
        } else {
            Ok(())
        }
    }

    /// Rewinds the network to the start of a traversal: clears the
    /// recorded decisions and used-flags, and positions the cursor on the
    /// start node's successor.
    pub fn begin_traversal(&mut self) {
        self.decisions.clear();
        self.invalid = false;
        self.n_consecutive_p = 0;
        for node in &mut self.inner_nodes {
            node.used = false;
        }
        self.start_node.used = true;
        self.current_node = self.start_node.edges[0];
        self.inner_nodes[self.current_node].used = true;
    }

    /// Produces one decision from the observation and advances the cursor.
    ///
    /// Judgment nodes are followed until a processing node is reached,
    /// whose function is the decision; the cursor then moves through the
    /// processing node's single edge. If more than `d_max` judgments are
    /// chained the network is flagged invalid and [`INVALID_DECISION`] is
    /// returned.
    ///
    /// The observation may be anything indexable by feature number, e.g.
    /// a `Vec<f64>` or a slice.
    pub fn next_decision<O>(&mut self, observation: &O, d_max: usize) -> i64
    where
        O: Index<usize, Output = f64> + ?Sized,
    {
        let mut current = self.current_node;
        if self.inner_nodes[current].node_type == NodeType::Judgment {
            self.n_consecutive_p = 0;
            let mut judged = 0;
            while self.inner_nodes[current].node_type == NodeType::Judgment {
                let node = &self.inner_nodes[current];
                let slot = node.judge(observation[node.function]);
                current = node.edges[slot];
                self.inner_nodes[current].used = true;
                judged += 1;
                if judged >= d_max {
                    self.invalid = true;
                    self.current_node = current;
                    return INVALID_DECISION;
                }
            }
        }
        let decision = self.inner_nodes[current].function as i64;
        let successor = self.inner_nodes[current].edges[0];
        self.inner_nodes[successor].used = true;
        self.current_node = successor;
        self.n_consecutive_p += 1;
        decision
    }

    /// Traverses the network once per row of `x`, recording one decision
    /// each into [`decisions`](Network::decisions).
    ///
    /// Traversal does not stop early when a decision overruns `d_max`;
    /// the sentinel is recorded and [`invalid`](Network::invalid) is left
    /// set for the caller to inspect.
    pub fn traverse_path<O>(&mut self, x: &[O], d_max: usize)
    where
        O: Index<usize, Output = f64>,
    {
        self.begin_traversal();
        for row in x {
            let decision = self.next_decision(row, d_max);
            self.decisions.push(decision);
        }
    }

    /// Scores the network as a classifier: the fitness is the fraction of
    /// rows whose decision matches the label. A traversal overrunning
    /// `d_max` zeroes the fitness immediately.
    pub fn fit_accuracy<O>(&mut self, x: &[O], y: &[i64], d_max: usize)
    where
        O: Index<usize, Output = f64>,
    {
        self.begin_traversal();
        let mut correct = 0;
        for (row, label) in x.iter().zip(y) {
            let decision = self.next_decision(row, d_max);
            if self.invalid {
                self.fitness = 0.0;
                return;
            }
            if decision == *label {
                correct += 1;
            }
        }
        self.fitness = correct as f64 / y.len() as f64;
    }

    /// Scores the network on one episode of an environment: rewards are
    /// accumulated until termination or `max_steps`. Overrunning `d_max`
    /// or emitting more than `max_consecutive_p` processing decisions
    /// without an intervening judgment ends the episode with
    /// `worst_fitness`.
    ///
    /// The environment is reset with `seed`, so every individual of a
    /// generation can be scored on the same episode.
    pub fn fit_environment<E: Environment>(
        &mut self,
        env: &mut E,
        d_max: usize,
        max_steps: usize,
        max_consecutive_p: usize,
        worst_fitness: f64,
        seed: u64,
    ) {
        let mut observation = env.reset(Some(seed));
        self.begin_traversal();
        self.fitness = 0.0;
        let mut steps = 0;
        loop {
            let action = self.next_decision(&observation, d_max);
            if self.invalid || self.n_consecutive_p > max_consecutive_p {
                self.fitness = worst_fitness;
                return;
            }
            let step = env.step(action);
            self.fitness += step.reward;
            steps += 1;
            if step.terminated || steps >= max_steps {
                return;
            }
            observation = step.observation;
        }
    }

    /// Scores the network on one episode of the built-in [`CartPole`]
    /// simulator, 1 reward per surviving step. The episode opens with a
    /// push to the left; decisions take over from the first observation
    /// onwards. Overrunning `d_max` or `max_consecutive_p` stops the
    /// episode and divides the accumulated fitness by `penalty`.
    ///
    /// The simulator is seeded from `rng`, so population-level evaluation
    /// stays reproducible.
    pub fn fit_cartpole(
        &mut self,
        d_max: usize,
        penalty: f64,
        max_steps: usize,
        max_consecutive_p: usize,
        rng: &mut impl Rng,
    ) {
        let mut env = CartPole::new();
        env.reset(Some(rng.gen()));
        self.begin_traversal();
        self.fitness = 0.0;
        let mut steps = 0;
        let mut action = 0;
        loop {
            let step = env.step(action);
            self.fitness += step.reward;
            steps += 1;
            if step.terminated || steps >= max_steps {
                return;
            }
            action = self.next_decision(&step.observation, d_max);
            if self.invalid || self.n_consecutive_p > max_consecutive_p {
                self.fitness /= penalty;
                return;
            }
        }
    }

    /// Redraws every edge that points past the end of the inner-node
    /// array. Called on the smaller parent after crossover between
    /// networks of different sizes.
    pub fn repair_dangling_edges(&mut self, rng: &mut impl Rng) {
        let node_count = self.inner_nodes.len();
        for i in 0..node_count {
            for slot in 0..self.inner_nodes[i].edges.len() {
                if self.inner_nodes[i].edges[slot] >= node_count {
                    self.inner_nodes[i].redraw_edge(slot, node_count, rng);
                }
            }
        }
    }

    /// Recounts the nodes visited by the most recent traversal and returns
    /// the count.
    pub fn count_used_nodes(&mut self) -> usize {
        self.n_used_nodes = self.inner_nodes.iter().filter(|n| n.used).count();
        self.n_used_nodes
    }

    /// Grows or shrinks the network by at most one node, driven by a fair
    /// coin and the used-flags of the most recent traversal: a node is
    /// added only when every node was visited, and the first unvisited
    /// node is deleted only when more than one was idle. Networks never
    /// shrink below 3 inner nodes, the minimum the edge operators need.
    ///
    /// Deletion renumbers the remaining nodes and repairs every edge, so
    /// ids stay contiguous and all edges valid.
    ///
    /// # Errors
    /// Returns an error if either feature-range slice is shorter than the
    /// number of judgment functions.
    pub fn add_or_delete_node(
        &mut self,
        min_f: &[f64],
        max_f: &[f64],
        rng: &mut impl Rng,
    ) -> Result<(), FeatureRangeError> {
        self.check_feature_ranges(min_f, max_f)?;
        self.count_used_nodes();
        if rng.gen_bool(0.5) {
            if self.n_used_nodes >= self.inner_nodes.len() {
                self.add_random_node(min_f, max_f, rng);
            }
        } else if self.inner_nodes.len() - self.n_used_nodes > 1 && self.inner_nodes.len() > 3 {
            // Edge redraws need at least 3 nodes to terminate, so the
            // network never shrinks below that.
            self.delete_first_unused_node(rng);
        }
        Ok(())
    }

    fn add_random_node(&mut self, min_f: &[f64], max_f: &[f64], rng: &mut impl Rng) {
        let id = self.inner_nodes.len();
        let node_count = id + 1;
        let processing_chance = self.pnf as f64 / (self.pnf + self.jnf) as f64;
        if rng.gen::<f64>() < processing_chance {
            let mut node = Node::new(id, NodeType::Processing, rng.gen_range(0..self.pnf));
            node.randomize_edges(node_count, None, rng);
            self.inner_nodes.push(node);
            self.pn += 1;
        } else {
            let mut node = Node::new(id, NodeType::Judgment, rng.gen_range(0..self.jnf));
            let feature = node.function;
            if self.fractal_judgment {
                // (k, d) is drawn over the node count before the insertion.
                let (k, d) = random_k_d_combination(self.jn + self.pn, rng);
                node.k_d = Some((k, d));
                node.randomize_edges(node_count, Some(k.pow(d as u32)), rng);
                let mut cuts = random_parameter_cuts(k - 1, rng);
                cuts.sort_by(f64::total_cmp);
                let lengths = fractal_lengths(d, &sort_and_distance(cuts.clone()));
                node.production_rule = cuts;
                node.set_boundaries(min_f[feature], max_f[feature], Some(&lengths));
            } else {
                node.randomize_edges(node_count, None, rng);
                node.set_boundaries(min_f[feature], max_f[feature], None);
            }
            self.inner_nodes.push(node);
            self.jn += 1;
        }
    }

    /// Deletion happens in a fixed order: ids above the victim are
    /// decremented first, then every edge is shifted or redrawn, then the
    /// start edge is shifted, and only then is the node removed. Edges
    /// equal to the victim's id are redrawn over the post-removal range.
    fn delete_first_unused_node(&mut self, rng: &mut impl Rng) {
        let n = self
            .inner_nodes
            .iter()
            .position(|node| !node.used)
            .expect("at least one unused node");

        for node in &mut self.inner_nodes {
            if node.id > n {
                node.id -= 1;
            }
        }

        let node_count = self.inner_nodes.len();
        for i in 0..node_count {
            for slot in 0..self.inner_nodes[i].edges.len() {
                let edge = self.inner_nodes[i].edges[slot];
                if edge > n {
                    self.inner_nodes[i].edges[slot] = edge - 1;
                } else if edge == n {
                    self.inner_nodes[i].redraw_edge(slot, node_count - 1, rng);
                }
            }
        }

        // The start successor is always used, so its edge never equals n.
        if self.start_node.edges[0] > n {
            self.start_node.edges[0] -= 1;
        }

        match self.inner_nodes[n].node_type {
            NodeType::Judgment => self.jn -= 1,
            NodeType::Processing => self.pn -= 1,
            NodeType::Start => unreachable!("inner nodes are never start nodes"),
        }
        self.inner_nodes.remove(n);
    }

    pub(crate) fn recount_node_types(&mut self) {
        self.jn = self
            .inner_nodes
            .iter()
            .filter(|n| n.node_type == NodeType::Judgment)
            .count();
        self.pn = self
            .inner_nodes
            .iter()
            .filter(|n| n.node_type == NodeType::Processing)
            .count();
    }

    /// Returns the start node.
    pub fn start_node(&self) -> &Node {
        &self.start_node
    }

    /// Returns the inner nodes, ordered by id.
    pub fn inner_nodes(&self) -> &[Node] {
        &self.inner_nodes
    }

    /// Returns the current number of judgment nodes.
    pub fn judgment_nodes(&self) -> usize {
        self.jn
    }

    /// Returns the current number of processing nodes.
    pub fn processing_nodes(&self) -> usize {
        self.pn
    }

    /// Returns the number of judgment-node functions.
    pub fn judgment_functions(&self) -> usize {
        self.jnf
    }

    /// Returns the number of processing-node functions.
    pub fn processing_functions(&self) -> usize {
        self.pnf
    }

    /// Returns whether judgment nodes use fractal range partitioning.
    pub fn fractal_judgment(&self) -> bool {
        self.fractal_judgment
    }

    /// Returns the network's fitness value.
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Sets the network's fitness value. Intended for custom evaluators
    /// driven through [`Population::evaluate_fitness`].
    ///
    /// [`Population::evaluate_fitness`]: crate::populations::Population::evaluate_fitness
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    /// Returns the decisions recorded by the most recent
    /// [`traverse_path`](Network::traverse_path).
    pub fn decisions(&self) -> &[i64] {
        &self.decisions
    }

    /// Returns whether the most recent traversal overran the judgment
    /// depth cap.
    pub fn invalid(&self) -> bool {
        self.invalid
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Network[jn: {}, pn: {}, fitness: {:.3}]",
            self.jn, self.pn, self.fitness
        )?;
        writeln!(f, "\t{}", self.start_node)?;
        for node in &self.inner_nodes {
            writeln!(f, "\t{}", node)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::num::NonZeroUsize;

    fn config(jn: usize, pn: usize, fractal: bool) -> GeneticConfig {
        GeneticConfig {
            judgment_nodes: jn,
            judgment_functions: NonZeroUsize::new(4).unwrap(),
            processing_nodes: pn,
            processing_functions: NonZeroUsize::new(2).unwrap(),
            fractal_judgment: fractal,
        }
    }

    fn assert_well_formed(network: &Network) {
        assert_eq!(network.jn + network.pn, network.inner_nodes.len());
        assert_eq!(
            network.jn,
            network
                .inner_nodes
                .iter()
                .filter(|n| n.node_type == NodeType::Judgment)
                .count()
        );
        assert_eq!(network.start_node.edges.len(), 1);
        assert!(network.start_node.edges[0] < network.inner_nodes.len());
        assert_ne!(network.start_node.edges[0], network.start_node.id);
        for (i, node) in network.inner_nodes.iter().enumerate() {
            assert_eq!(node.id, i);
            for &edge in &node.edges {
                assert!(edge < network.inner_nodes.len());
                assert_ne!(edge, node.id);
            }
        }
    }

    /// start -> 1; node 0 judges feature 0 at 0.5; nodes 1 and 2 emit
    /// actions 0 and 1 and cycle back through each other and node 0.
    fn manual_network() -> Network {
        let mut start_node = Node::new(0, NodeType::Start, 0);
        start_node.edges = vec![1];
        let mut judgment = Node::new(0, NodeType::Judgment, 0);
        judgment.edges = vec![1, 2];
        judgment.boundaries = vec![0.0, 0.5, 1.0];
        let mut p0 = Node::new(1, NodeType::Processing, 0);
        p0.edges = vec![2];
        let mut p1 = Node::new(2, NodeType::Processing, 1);
        p1.edges = vec![0];
        Network {
            start_node,
            inner_nodes: vec![judgment, p0, p1],
            jn: 1,
            jnf: 1,
            pn: 2,
            pnf: 2,
            fractal_judgment: false,
            fitness: 0.0,
            decisions: Vec::new(),
            current_node: 0,
            n_consecutive_p: 0,
            invalid: false,
            n_used_nodes: 0,
        }
    }

    #[test]
    fn construction_is_well_formed() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            let network = Network::new(&config(3, 4, false), &mut rng);
            assert_well_formed(&network);
            for node in &network.inner_nodes {
                match node.node_type {
                    NodeType::Judgment => {
                        assert!(node.edges.len() >= 2 && node.edges.len() <= 6);
                        assert!(node.function < 4);
                    }
                    NodeType::Processing => {
                        assert_eq!(node.edges.len(), 1);
                        assert!(node.function < 2);
                    }
                    NodeType::Start => panic!("start node in the arena"),
                }
            }
        }
    }

    #[test]
    fn fractal_construction_matches_k_d() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut network = Network::new(&config(4, 4, true), &mut rng);
        network
            .initialize_boundaries(&[0.0; 4], &[1.0; 4], &mut rng)
            .unwrap();
        assert_well_formed(&network);
        for node in &network.inner_nodes {
            if node.node_type == NodeType::Judgment {
                let (k, d) = node.k_d.expect("fractal judgment nodes carry (k, d)");
                assert_eq!(node.edges.len(), k.pow(d as u32));
                assert_eq!(node.production_rule.len(), k + 1);
                assert_eq!(node.production_rule[0], 0.0);
                assert_eq!(*node.production_rule.last().unwrap(), 1.0);
                assert_eq!(node.boundaries.len(), node.edges.len() + 1);
            }
        }
    }

    #[test]
    fn boundaries_pin_to_feature_ranges() {
        let mut rng = StdRng::seed_from_u64(3);
        let min_f = [-2.0, -1.0, 0.0, 1.0];
        let max_f = [2.0, 3.0, 4.0, 5.0];
        let mut network = Network::new(&config(5, 3, false), &mut rng);
        network
            .initialize_boundaries(&min_f, &max_f, &mut rng)
            .unwrap();
        for node in &network.inner_nodes {
            if node.node_type == NodeType::Judgment {
                assert_eq!(node.boundaries[0], min_f[node.function]);
                let last = *node.boundaries.last().unwrap();
                assert!((last - max_f[node.function]).abs() < 1e-9);
                for w in node.boundaries.windows(2) {
                    assert!(w[0] <= w[1]);
                }
            }
        }
    }

    #[test]
    fn short_feature_ranges_are_rejected() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut network = Network::new(&config(2, 2, false), &mut rng);
        let err = network
            .initialize_boundaries(&[0.0, 1.0], &[1.0, 2.0], &mut rng)
            .unwrap_err();
        assert_eq!(err.required, 4);
        assert_eq!(err.provided, 2);
    }

    #[test]
    fn traversal_emits_expected_decisions() {
        let mut network = manual_network();
        let x = vec![vec![0.7], vec![0.2], vec![0.2]];
        network.traverse_path(&x, 5);
        // start -> p0 (emit 0) -> p1 (emit 1) -> judgment routes 0.2 to
        // p0 (emit 0).
        assert_eq!(network.decisions(), &[0, 1, 0]);
        assert!(!network.invalid());
        assert!(network.inner_nodes.iter().all(|n| n.used));
    }

    #[test]
    fn judgment_loop_overruns_depth_cap() {
        let mut network = manual_network();
        // Turn node 1 into a judgment node and wire nodes 0 and 1 into a
        // judgment-only cycle.
        network.inner_nodes[1].node_type = NodeType::Judgment;
        network.inner_nodes[1].function = 0;
        network.inner_nodes[1].edges = vec![0, 0];
        network.inner_nodes[1].boundaries = vec![0.0, 0.5, 1.0];
        network.start_node.edges = vec![0];
        network.inner_nodes[0].edges = vec![1, 1];

        let x = vec![vec![0.3]];
        network.traverse_path(&x, 10);
        assert!(network.invalid());
        assert_eq!(network.decisions(), &[INVALID_DECISION]);
    }

    #[test]
    fn accuracy_counts_matches() {
        let mut network = manual_network();
        let x = vec![vec![0.7], vec![0.2], vec![0.2]];
        network.fit_accuracy(&x, &[0, 1, 0], 5);
        assert_eq!(network.fitness(), 1.0);
        network.fit_accuracy(&x, &[0, 1, 1], 5);
        assert!((network.fitness() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn consecutive_processing_ends_episode() {
        let mut network = manual_network();
        // Remove the judgment from the cycle: p1 feeds back into p0, so
        // processing nodes alternate forever.
        network.inner_nodes[2].edges = vec![1];
        let mut env = CartPole::new();
        network.fit_environment(&mut env, 10, 500, 3, -1.0, 7);
        assert_eq!(network.fitness(), -1.0);
    }

    #[test]
    fn cartpole_fitness_is_reproducible() {
        let mut network = manual_network();
        let mut rng_a = StdRng::seed_from_u64(21);
        let mut rng_b = StdRng::seed_from_u64(21);
        network.fit_cartpole(10, 2.0, 100, 10, &mut rng_a);
        let first = network.fitness();
        network.fit_cartpole(10, 2.0, 100, 10, &mut rng_b);
        assert_eq!(network.fitness(), first);
        assert!(first <= 100.0);
        assert!(first > 0.0);
    }

    #[test]
    fn deleting_an_unused_node_renumbers_and_repairs() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut network = Network::new(&config(2, 3, false), &mut rng);
        for node in &mut network.inner_nodes {
            node.used = true;
        }
        network.inner_nodes[2].used = false;
        network.inner_nodes[4].used = false;
        network.count_used_nodes();

        network.delete_first_unused_node(&mut rng);

        assert_eq!(network.inner_nodes.len(), 4);
        assert_well_formed(&network);
    }

    #[test]
    fn adding_a_node_keeps_the_arena_dense() {
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..20 {
            let mut network = Network::new(&config(2, 2, false), &mut rng);
            network
                .initialize_boundaries(&[0.0; 4], &[1.0; 4], &mut rng)
                .unwrap();
            network.add_random_node(&[0.0; 4], &[1.0; 4], &mut rng);
            assert_eq!(network.inner_nodes.len(), 5);
            assert_well_formed(&network);
            let added = &network.inner_nodes[4];
            if added.node_type == NodeType::Judgment {
                assert_eq!(added.boundaries.len(), added.edges.len() + 1);
            }
        }
    }

    #[test]
    fn add_or_delete_leaves_full_networks_alone_on_delete() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut network = Network::new(&config(2, 2, false), &mut rng);
        network
            .initialize_boundaries(&[0.0; 4], &[1.0; 4], &mut rng)
            .unwrap();
        for node in &mut network.inner_nodes {
            node.used = true;
        }
        // All nodes used: the operator may add but never delete, so the
        // network either keeps or grows its size.
        for _ in 0..20 {
            let before = network.inner_nodes.len();
            for node in &mut network.inner_nodes {
                node.used = true;
            }
            network
                .add_or_delete_node(&[0.0; 4], &[1.0; 4], &mut rng)
                .unwrap();
            assert!(network.inner_nodes.len() >= before);
            assert_well_formed(&network);
        }
    }

    #[test]
    fn a_single_idle_node_is_never_deleted() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut network = Network::new(&config(2, 3, false), &mut rng);
        network
            .initialize_boundaries(&[0.0; 4], &[1.0; 4], &mut rng)
            .unwrap();
        for _ in 0..20 {
            for node in &mut network.inner_nodes {
                node.used = true;
            }
            network.inner_nodes[1].used = false;
            let before = network.inner_nodes.len();
            network
                .add_or_delete_node(&[0.0; 4], &[1.0; 4], &mut rng)
                .unwrap();
            // One idle node is below the deletion threshold, and a
            // partially idle network is below the addition one.
            assert_eq!(network.inner_nodes.len(), before);
        }
    }

    #[test]
    fn repair_redirects_dangling_edges() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut network = Network::new(&config(2, 3, false), &mut rng);
        network.inner_nodes[0].edges[0] = 17;
        network.inner_nodes[3].edges[0] = 5;
        network.repair_dangling_edges(&mut rng);
        assert_well_formed(&network);
    }

    #[test]
    fn same_seed_same_network() {
        let mut rng_a = StdRng::seed_from_u64(9);
        let mut rng_b = StdRng::seed_from_u64(9);
        let a = Network::new(&config(3, 3, true), &mut rng_a);
        let b = Network::new(&config(3, 3, true), &mut rng_b);
        assert_eq!(a, b);
    }
}
